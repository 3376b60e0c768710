use poseval::evaluate::{self, CancelToken, EvaluationConfig, DISTANCES_FILE, POSITIONS_FILE};
use poseval::export::{DirectoryExporter, MemoryExporter, JSON_MIME};
use poseval::player::{PlaybackEngine, Player};
use poseval::read::RotationDataset;
use poseval::rig::Skeleton;
use poseval::schema::{self, FallbackTable, SchemaSource, SchemaTables, MIXAMO_52};
use poseval::session::Session;
use poseval::synth::Synthesizer;
use poseval::unproject::{UnprojectConfig, Unprojector};
use poseval::Error;

use std::fs;

const RIG: &str = "HIERARCHY
ROOT Hips
{
\tOFFSET 0.0 1.0 0.0
\tCHANNELS 6 Xposition Yposition Zposition Zrotation Xrotation Yrotation
\tJOINT Spine
\t{
\t\tOFFSET 0.0 0.5 0.0
\t\tCHANNELS 3 Zrotation Xrotation Yrotation
\t\tJOINT Head
\t\t{
\t\t\tOFFSET 0.0 0.5 0.0
\t\t\tCHANNELS 3 Zrotation Xrotation Yrotation
\t\t\tEnd Site
\t\t\t{
\t\t\t\tOFFSET 0.0 0.2 0.0
\t\t\t}
\t\t}
\t}
}
MOTION
Frames: 1
Frame Time: 0.032
0.0 1.0 0.0 0.0 0.0 0.0 0.0 0.0 0.0 0.0 0.0 0.0
";

const GROUND_TRUTH: &str = r#"[
    [0, 1, 0, 0, 0, 0, 1, 0, 0, 0, 1],
    [0, 1, 0, 0, 0, 0, 1, 0, 0, 0, 1],
    [0, 1, 0, 0, 0, 0, 1, 0, 0, 0, 1],
    ["Hips.position", "Hips.quaternion", "Spine.quaternion"]
]"#;

// Same motion, with the spine bent 90 degrees about Z.
const PREDICTION: &str = r#"[
    [0, 1, 0, 0, 0, 0, 1, 0, 0, 0.70710677, 0.70710677],
    [0, 1, 0, 0, 0, 0, 1, 0, 0, 0.70710677, 0.70710677],
    [0, 1, 0, 0, 0, 0, 1, 0, 0, 0.70710677, 0.70710677],
    ["Hips.position", "Hips.quaternion", "Spine.quaternion"]
]"#;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn session() -> Session {
    let skeleton = Skeleton::from_bvh(RIG.as_bytes()).unwrap();
    let fallback = SchemaTables::builtin().get(MIXAMO_52).unwrap().clone();
    Session::new(
        Player::new(skeleton.clone()),
        Player::new(skeleton),
        fallback,
        Unprojector::new(&UnprojectConfig::default()).unwrap(),
    )
}

#[test]
fn bent_spine_moves_the_head() {
    init();
    let mut session = session();
    session.load_ground_truth("gt.json", GROUND_TRUTH).unwrap();
    session.load_prediction("pred.json", PREDICTION).unwrap();

    let mut exporter = MemoryExporter::default();
    let report = session.evaluate(&mut exporter, None).unwrap();

    assert_eq!(report.bones, vec!["Hips", "Spine", "Head"]);
    assert_eq!(report.times.len(), 3);
    for bone in &["Hips", "Spine"] {
        let i = report.bone(bone).unwrap();
        assert!(report.distances[i].iter().all(|d| d.abs() < 1e-3), "{}", bone);
    }
    // the head swings from (0, 2, 0) to (-0.5, 1.5, 0)
    let head = report.bone("Head").unwrap();
    for d in &report.distances[head] {
        assert!((d - 70.7107).abs() < 1e-2, "{}", d);
    }
    let [gt_axes, pred_axes] = &report.positions[head];
    assert!((gt_axes[1][0] - 200.0).abs() < 1e-2);
    assert!((pred_axes[0][0] + 50.0).abs() < 1e-2);
    assert!((pred_axes[1][0] - 150.0).abs() < 1e-2);

    assert_eq!(exporter.files.len(), 2);
    let (distances, mime) = &exporter.files[DISTANCES_FILE];
    assert_eq!(mime, JSON_MIME);
    let distances: Vec<Vec<f32>> = serde_json::from_str(distances).unwrap();
    for (read, measured) in distances.iter().flatten().zip(report.distances.iter().flatten()) {
        assert!((read - measured).abs() < 1e-4);
    }
    let (positions, _) = &exporter.files[POSITIONS_FILE];
    let positions: serde_json::Value = serde_json::from_str(positions).unwrap();
    assert_eq!(positions.as_array().unwrap().len(), 3);
    assert_eq!(positions[0].as_array().unwrap().len(), 2);
    assert_eq!(positions[0][0].as_array().unwrap().len(), 3);
}

#[test]
fn evaluation_leaves_playback_where_it_was() {
    init();
    let mut session = session();
    session.load_ground_truth("gt.json", GROUND_TRUTH).unwrap();
    session.load_prediction("pred.json", PREDICTION).unwrap();
    session.tick(0.05);
    let before = session.ground_truth.time();

    session.evaluate(&mut MemoryExporter::default(), None).unwrap();
    assert_eq!(session.ground_truth.time(), before);
    assert_eq!(session.prediction.time(), before);
}

#[test]
fn cancelled_evaluation_exports_nothing() {
    init();
    let mut session = session();
    session.load_ground_truth("gt.json", GROUND_TRUTH).unwrap();
    session.load_prediction("pred.json", PREDICTION).unwrap();

    let cancel = CancelToken::new();
    cancel.cancel();
    let mut exporter = MemoryExporter::default();
    let err = session.evaluate(&mut exporter, Some(&cancel)).unwrap_err();
    assert!(matches!(err, Error::Cancelled));
    assert!(exporter.files.is_empty());
}

#[test]
fn rejected_file_keeps_previous_clip() {
    init();
    let mut session = session();
    session.load_ground_truth("gt.json", GROUND_TRUTH).unwrap();
    let err = session.load_ground_truth("gt.csv", PREDICTION).unwrap_err();
    assert!(matches!(err, Error::UnsupportedFileExtension(_)));

    let clip = session.ground_truth.clip().unwrap();
    let spine = clip.track("Spine.quaternion").unwrap();
    assert_eq!(spine.values.key(0).unwrap(), &[0.0, 0.0, 0.0, 1.0][..]);
}

#[test]
fn nameless_dataset_uses_fallback_table() {
    init();
    let table = FallbackTable::new("rig-3", vec!["Hips.position", "Hips.quaternion", "Spine.quaternion"]);
    let frames = vec![vec![0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]; 4];
    let resolved = schema::resolve(RotationDataset::from_frames(frames), &table).unwrap();
    assert_eq!(resolved.source, SchemaSource::Fallback("rig-3".to_string()));

    let clip = Synthesizer::default()
        .synthesize("anim", &resolved.schema, &resolved.frames)
        .unwrap();
    assert_eq!(clip.tracks.len(), 3);
    assert!((clip.duration() - 0.096).abs() < 1e-6);

    let mut player = Player::new(Skeleton::from_bvh(RIG.as_bytes()).unwrap());
    player.bind(clip);
    let head = player.bone("Head").unwrap();
    let p = player.bone_world_position(head).unwrap();
    assert!((p.y - 2.0).abs() < 1e-4);
}

#[test]
fn mismatched_rigs_are_refused() {
    init();
    let gt_rig = Skeleton::from_bvh(RIG.as_bytes()).unwrap();
    let pred_rig = Skeleton::new(gt_rig.bones()[..2].to_vec()).unwrap();
    let resolved = schema::resolve(
        RotationDataset::from_json(GROUND_TRUTH).unwrap(),
        &FallbackTable::new("none", Vec::<String>::new()),
    )
    .unwrap();
    let clip = Synthesizer::default()
        .synthesize("Test", &resolved.schema, &resolved.frames)
        .unwrap();

    let mut gt = Player::new(gt_rig);
    let mut pred = Player::new(pred_rig);
    gt.bind(clip.clone());
    pred.bind(clip);
    let err = evaluate::evaluate(&mut gt, &mut pred, &EvaluationConfig::default(), None).unwrap_err();
    assert!(matches!(err, Error::BoneCountMismatch { gt: 3, pred: 2 }));
}

#[test]
fn exports_into_directory() {
    init();
    let mut session = session();
    session.load_ground_truth("gt.json", GROUND_TRUTH).unwrap();
    session.load_prediction("pred.json", GROUND_TRUTH).unwrap();

    let dir = std::env::temp_dir().join(format!("poseval-pipeline-{}", std::process::id()));
    let mut exporter = DirectoryExporter::new(&dir);
    session.evaluate(&mut exporter, None).unwrap();

    let distances: Vec<Vec<f32>> =
        serde_json::from_str(&fs::read_to_string(dir.join(DISTANCES_FILE)).unwrap()).unwrap();
    assert_eq!(distances.len(), 3);
    assert!(distances.iter().flatten().all(|&d| d == 0.0));
    assert!(dir.join(POSITIONS_FILE).exists());
    fs::remove_dir_all(&dir).unwrap();
}
