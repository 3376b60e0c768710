//! Positional error between a ground-truth and a predicted motion.

use cgmath::MetricSpace;
use log::*;
use serde::{Deserialize, Serialize};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::export::{Exporter, JSON_MIME};
use crate::player::PlaybackEngine;
use crate::{Error, Result};

pub const DISTANCES_FILE: &str = "EvaluationDistances.json";
pub const POSITIONS_FILE: &str = "EvaluationPositions.json";

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Multiplier taking world units to report units (metres to
    /// centimetres by default).
    pub scale: f32,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self { scale: 100.0 }
    }
}

/// Cooperative cancellation, checked once per evaluated timestamp.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// `[source][axis][sample]`, source 0 being ground truth and 1 prediction.
pub type BonePositions = [[Vec<f32>; 3]; 2];

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    /// Bone names, in the order every other series is indexed by.
    pub bones: Vec<String>,
    /// Timestamps the skeletons were compared at.
    pub times: Vec<f32>,
    /// `[bone][sample]` distance between ground truth and prediction.
    pub distances: Vec<Vec<f32>>,
    pub positions: Vec<BonePositions>,
}

impl EvaluationReport {
    fn new(bones: Vec<String>) -> Self {
        let count = bones.len();
        Self {
            bones,
            times: vec![],
            distances: vec![vec![]; count],
            positions: vec![BonePositions::default(); count],
        }
    }

    pub fn bone(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|b| b == name)
    }

    pub fn mean_distance(&self, bone: usize) -> Option<f32> {
        let series = self.distances.get(bone)?;
        if series.is_empty() {
            return None;
        }
        Some(series.iter().sum::<f32>() / series.len() as f32)
    }

    pub fn distances_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.distances)?)
    }

    pub fn positions_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.positions)?)
    }

    /// Hands both series to `exporter` as `EvaluationDistances.json` and
    /// `EvaluationPositions.json`.
    pub fn export<E: Exporter + ?Sized>(&self, exporter: &mut E) -> Result<()> {
        let distances = self.distances_json()?;
        let positions = self.positions_json()?;
        exporter.export(DISTANCES_FILE, &distances, JSON_MIME)?;
        exporter.export(POSITIONS_FILE, &positions, JSON_MIME)
    }
}

fn check_loaded<P: PlaybackEngine + ?Sized>(player: &P, what: &str) -> Result<()> {
    match player.clip() {
        Some(clip) if !clip.is_empty() => Ok(()),
        _ => Err(Error::EvaluationPrecondition(format!(
            "the {} animation is not loaded",
            what
        ))),
    }
}

/// Samples both players at every key time of the ground-truth clip and
/// records, per bone, the distance between the two skeletons and each
/// skeleton's world position.
///
/// Both players are held for the whole sweep and are returned to the time
/// they were at before it, whether the sweep finishes or not.
pub fn evaluate<G, P>(
    gt: &mut G,
    pred: &mut P,
    config: &EvaluationConfig,
    cancel: Option<&CancelToken>,
) -> Result<EvaluationReport>
where
    G: PlaybackEngine + ?Sized,
    P: PlaybackEngine + ?Sized,
{
    check_loaded(gt, "ground truth")?;
    check_loaded(pred, "prediction")?;

    let count = gt.bone_count();
    if count != pred.bone_count() {
        return Err(Error::BoneCountMismatch {
            gt: count,
            pred: pred.bone_count(),
        });
    }
    let mut bones = Vec::with_capacity(count);
    for index in 0..count {
        let (a, b) = (gt.bone_name(index), pred.bone_name(index));
        if a != b {
            return Err(Error::BoneOrderMismatch {
                index,
                gt: a.unwrap_or_default().to_string(),
                pred: b.unwrap_or_default().to_string(),
            });
        }
        bones.push(a.unwrap_or_default().to_string());
    }

    let times: Vec<f32> = gt
        .clip()
        .and_then(|c| c.times())
        .map(<[f32]>::to_vec)
        .unwrap_or_default();
    let resume = (gt.time(), pred.time());
    let result = sweep(gt, pred, config, cancel, bones, &times);
    gt.seek(resume.0);
    pred.seek(resume.1);

    if let Ok(report) = &result {
        info!(
            "evaluated {} bones over {} timestamps",
            report.bones.len(),
            report.times.len()
        );
    }
    result
}

fn sweep<G, P>(
    gt: &mut G,
    pred: &mut P,
    config: &EvaluationConfig,
    cancel: Option<&CancelToken>,
    bones: Vec<String>,
    times: &[f32],
) -> Result<EvaluationReport>
where
    G: PlaybackEngine + ?Sized,
    P: PlaybackEngine + ?Sized,
{
    let scale = config.scale;
    let mut report = EvaluationReport::new(bones);
    for &time in times {
        if cancel.map(CancelToken::is_cancelled).unwrap_or(false) {
            warn!("evaluation cancelled at {:.3}s", time);
            return Err(Error::Cancelled);
        }
        gt.seek(time);
        pred.seek(time);
        for bone in 0..report.bones.len() {
            let missing = || Error::Skeleton(format!("no world position for bone #{}", bone));
            let a = gt.bone_world_position(bone).ok_or_else(missing)?;
            let b = pred.bone_world_position(bone).ok_or_else(missing)?;

            report.distances[bone].push(a.distance(b) * scale);
            let [gt_axes, pred_axes] = &mut report.positions[bone];
            for (axis, (x, y)) in [(a.x, b.x), (a.y, b.y), (a.z, b.z)].iter().enumerate() {
                gt_axes[axis].push(x * scale);
                pred_axes[axis].push(y * scale);
            }
        }
        report.times.push(time);
    }
    Ok(report)
}
