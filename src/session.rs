//! A headless viewer session: a ground-truth and a prediction skeleton
//! playing side by side, with the captured landmarks following playback.

use cgmath::Point3;
use log::*;

use crate::evaluate::{self, CancelToken, EvaluationConfig, EvaluationReport};
use crate::export::Exporter;
use crate::player::{PlaybackEngine, Player};
use crate::read::{check_extension, LandmarkSequence, RotationDataset};
use crate::schema::{self, FallbackTable};
use crate::synth::{SynthesisConfig, Synthesizer};
use crate::unproject::{LandmarkTracker, Unprojector};
use crate::{AnimationClip, Result};

const CLIP_NAME: &str = "Test";

pub struct Session {
    pub ground_truth: Player,
    pub prediction: Player,
    fallback: FallbackTable,
    synthesizer: Synthesizer,
    evaluation: EvaluationConfig,
    unprojector: Unprojector,
    landmarks: Option<LandmarkSequence>,
    tracker: LandmarkTracker,
}

impl Session {
    pub fn new(ground_truth: Player, prediction: Player, fallback: FallbackTable, unprojector: Unprojector) -> Self {
        Self {
            ground_truth,
            prediction,
            fallback,
            synthesizer: Synthesizer::default(),
            evaluation: EvaluationConfig::default(),
            unprojector,
            landmarks: None,
            tracker: LandmarkTracker::new(),
        }
    }

    pub fn with_synthesis(mut self, config: SynthesisConfig) -> Self {
        self.synthesizer = Synthesizer::new(config);
        self
    }

    pub fn with_evaluation(mut self, config: EvaluationConfig) -> Self {
        self.evaluation = config;
        self
    }

    fn clip_from(&self, file_name: &str, text: &str) -> Result<AnimationClip> {
        check_extension(file_name, "json")?;
        let dataset = RotationDataset::from_json(text)?;
        let resolved = schema::resolve(dataset, &self.fallback)?;
        self.synthesizer
            .synthesize(CLIP_NAME, &resolved.schema, &resolved.frames)
    }

    /// Plays the rotations in `text` on the ground-truth skeleton. Nothing
    /// changes if the file is rejected.
    pub fn load_ground_truth(&mut self, file_name: &str, text: &str) -> Result<()> {
        let clip = self.clip_from(file_name, text)?;
        info!("ground truth `{}`: {:.3}s", file_name, clip.duration());
        self.ground_truth.bind(clip);
        self.tracker.reset();
        Ok(())
    }

    pub fn load_prediction(&mut self, file_name: &str, text: &str) -> Result<()> {
        let clip = self.clip_from(file_name, text)?;
        info!("prediction `{}`: {:.3}s", file_name, clip.duration());
        self.prediction.bind(clip);
        Ok(())
    }

    pub fn load_landmarks(&mut self, file_name: &str, text: &str) -> Result<()> {
        check_extension(file_name, "json")?;
        let landmarks = LandmarkSequence::from_json(text)?;
        info!("landmarks `{}`: {} frames", file_name, landmarks.len());
        self.landmarks = Some(landmarks);
        self.tracker.reset();
        self.refresh_landmarks();
        Ok(())
    }

    /// Unbinds the ground truth. Playback is back at time 0, so the first
    /// landmark frame is shown.
    pub fn rest_ground_truth(&mut self) {
        self.ground_truth.stop();
        self.tracker.reset();
        if let Some(landmarks) = &self.landmarks {
            self.tracker.update(&self.unprojector, landmarks, 0.0, 0.0);
        }
    }

    pub fn rest_prediction(&mut self) {
        self.prediction.stop();
    }

    pub fn reset_animation(&mut self) {
        self.ground_truth.seek(0.0);
        self.prediction.seek(0.0);
        self.refresh_landmarks();
    }

    /// Advances both skeletons, then brings the landmarks in line with the
    /// ground-truth playback time.
    pub fn tick(&mut self, delta: f32) {
        self.ground_truth.advance(delta);
        self.prediction.advance(delta);
        self.refresh_landmarks();
    }

    fn refresh_landmarks(&mut self) {
        let landmarks = match &self.landmarks {
            Some(l) => l,
            None => return,
        };
        let duration = match self.ground_truth.clip() {
            Some(clip) => clip.duration(),
            None => return,
        };
        self.tracker.update(
            &self.unprojector,
            landmarks,
            self.ground_truth.time(),
            duration,
        );
    }

    /// World positions of the landmarks shown for the current frame.
    pub fn landmark_points(&self) -> &[Point3<f32>] {
        self.tracker.points()
    }

    pub fn landmark_frame(&self) -> Option<usize> {
        self.tracker.current()
    }

    /// Evaluates the prediction against the ground truth and exports both
    /// result files. Nothing is exported when evaluation fails.
    pub fn evaluate<E: Exporter + ?Sized>(
        &mut self,
        exporter: &mut E,
        cancel: Option<&CancelToken>,
    ) -> Result<EvaluationReport> {
        let report = evaluate::evaluate(
            &mut self.ground_truth,
            &mut self.prediction,
            &self.evaluation,
            cancel,
        )?;
        report.export(exporter)?;
        Ok(report)
    }
}
