use anyhow::*;
use log::*;
use poseval::export::DirectoryExporter;
use poseval::player::Player;
use poseval::read::{LandmarkSequence, RotationDataset};
use poseval::rig::Skeleton;
use poseval::schema;
use poseval::session::Session;
use poseval::synth::Synthesizer;
use poseval::unproject::Unprojector;
use slab_tree::*;
use structopt::StructOpt;

use std::fs;
use std::path::{Path, PathBuf};

mod descriptor;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "poseval",
    about = "plays back, reprojects and evaluates skeletal motion"
)]
struct Opt {
    /// Configuration file
    #[structopt(short, long, parse(from_os_str), default_value = "poseval.toml")]
    config: PathBuf,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(Debug, StructOpt)]
enum Command {
    /// Builds a clip from a rotation dataset and lists its tracks
    Clip {
        #[structopt(parse(from_os_str))]
        input: PathBuf,

        /// Fallback joint table for datasets without a name row
        #[structopt(short, long)]
        table: Option<String>,

        /// Print the whole clip as JSON
        #[structopt(long)]
        json: bool,
    },
    /// Prints landmarks unprojected into world space
    Landmarks {
        #[structopt(parse(from_os_str))]
        input: PathBuf,

        /// Only this landmark frame
        #[structopt(short, long)]
        frame: Option<usize>,
    },
    /// Measures how far a predicted motion is from the ground truth
    Evaluate {
        #[structopt(parse(from_os_str))]
        gt: PathBuf,

        #[structopt(parse(from_os_str))]
        pred: PathBuf,

        /// BVH skeleton both motions play on
        #[structopt(short, long, parse(from_os_str))]
        rig: Option<PathBuf>,

        /// Directory receiving the evaluation files
        #[structopt(short, long, parse(from_os_str), default_value = ".")]
        out: PathBuf,

        #[structopt(short, long)]
        table: Option<String>,
    },
    /// Prints the bone hierarchy of a BVH skeleton
    Rig {
        #[structopt(parse(from_os_str))]
        rig: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    info!("starting up");

    let opt = Opt::from_args();
    let config = descriptor::Config::load(&opt.config);
    debug!("{:?}", config);

    match opt.cmd {
        Command::Clip { input, table, json } => clip(&config, &input, table.as_deref(), json),
        Command::Landmarks { input, frame } => landmarks(&config, &input, frame),
        Command::Evaluate {
            gt,
            pred,
            rig,
            out,
            table,
        } => evaluate(&config, &gt, &pred, rig, &out, table.as_deref()),
        Command::Rig { rig } => hierarchy(&rig),
    }
}

fn load_skeleton(path: &Path) -> Result<Skeleton> {
    let data = fs::read(path).with_context(|| format!("failed to open {}", path.display()))?;
    Skeleton::from_bvh(&data).with_context(|| format!("failed to read skeleton {}", path.display()))
}

fn clip(config: &descriptor::Config, input: &Path, table: Option<&str>, json: bool) -> Result<()> {
    let text = fs::read_to_string(input).context("failed to open rotation dataset")?;
    let dataset = RotationDataset::from_json(&text)?;
    let tables = config.schema_tables();
    let fallback = tables.get(config.table_name(table))?;
    let resolved = schema::resolve(dataset, fallback)?;

    let name = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "sign_anim".to_string());
    let clip = Synthesizer::new(config.synthesis).synthesize(&name, &resolved.schema, &resolved.frames)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&clip)?);
        return Ok(());
    }
    println!(
        "{}: {} tracks, {} frames, {:.3}s ({:?} schema)",
        clip.name,
        clip.tracks.len(),
        resolved.frames.len(),
        clip.duration(),
        resolved.source
    );
    for (i, track) in clip.tracks.iter().enumerate() {
        println!("{:03}: {:<40} {:?}", i, track.name, track.kind());
    }
    Ok(())
}

fn landmarks(config: &descriptor::Config, input: &Path, frame: Option<usize>) -> Result<()> {
    let text = fs::read_to_string(input).context("failed to open landmarks")?;
    let landmarks = LandmarkSequence::from_json(&text)?;
    let unprojector = Unprojector::new(&config.unproject)?;

    let range = match frame {
        Some(i) if i < landmarks.len() => i..i + 1,
        Some(i) => bail!("landmark frame {} out of range ({} frames)", i, landmarks.len()),
        None => 0..landmarks.len(),
    };
    for i in range {
        println!("frame {}:", i);
        for (j, p) in unprojector.unproject_frame(&landmarks.frames[i]).iter().enumerate() {
            println!("  {:03}: {:>9.4} {:>9.4} {:>9.4}", j, p.x, p.y, p.z);
        }
    }
    Ok(())
}

fn evaluate(
    config: &descriptor::Config,
    gt: &Path,
    pred: &Path,
    rig: Option<PathBuf>,
    out: &Path,
    table: Option<&str>,
) -> Result<()> {
    let rig = rig
        .or_else(|| config.skeleton.clone())
        .context("missing skeleton rig path")?;
    let skeleton = load_skeleton(&rig)?;
    let fallback = config.schema_tables().get(config.table_name(table))?.clone();
    let unprojector = Unprojector::new(&config.unproject)?;

    let mut session = Session::new(
        Player::new(skeleton.clone()),
        Player::new(skeleton),
        fallback,
        unprojector,
    )
    .with_synthesis(config.synthesis)
    .with_evaluation(config.evaluation);

    let text = fs::read_to_string(gt).context("failed to open ground truth")?;
    session.load_ground_truth(&gt.to_string_lossy(), &text)?;
    let text = fs::read_to_string(pred).context("failed to open prediction")?;
    session.load_prediction(&pred.to_string_lossy(), &text)?;

    let mut exporter = DirectoryExporter::new(out);
    let report = session.evaluate(&mut exporter, None)?;

    for (i, name) in report.bones.iter().enumerate() {
        match report.mean_distance(i) {
            Some(d) => println!("{:03}: {:<32} {:>8.3} cm", i, name, d),
            None => println!("{:03}: {:<32} {:>8}", i, name, "-"),
        }
    }
    Ok(())
}

fn hierarchy(rig: &Path) -> Result<()> {
    let skeleton = load_skeleton(rig)?;
    let bones = skeleton.bones();
    let root = bones.first().context("skeleton has no bones")?;

    let mut tree = TreeBuilder::new()
        .with_root(root.name.clone())
        .with_capacity(bones.len())
        .build();
    let mut ids = vec![tree.root().map(|r| r.node_id()).context("empty tree")?];
    for bone in bones.iter().skip(1) {
        let parent = bone.parent.and_then(|p| ids.get(p)).copied();
        let id = match parent.and_then(|id| tree.get_mut(id)) {
            Some(mut node) => node.append(bone.name.clone()).node_id(),
            None => {
                warn!("bone {} doesn't have a parent, hanging it off the root", bone.name);
                ids[0]
            }
        };
        ids.push(id);
    }

    let mut s = String::new();
    tree.write_formatted(&mut s)?;
    println!("{}", s);
    Ok(())
}
