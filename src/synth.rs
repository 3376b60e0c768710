//! Turns flat per-frame value buffers into one animation track per joint
//! channel.

use log::*;
use serde::Deserialize;

use crate::schema::{JointChannel, JointSchema};
use crate::{AnimationClip, AnimationTrack, ChannelKind, Error, Result, TrackValues};

/// Seconds between two consecutive frames of a rotation dataset.
pub const SAMPLE_PERIOD: f32 = 0.032;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    pub sample_period: f32,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            sample_period: SAMPLE_PERIOD,
        }
    }
}

impl SynthesisConfig {
    /// Key times must strictly increase, so the period has to be a finite,
    /// positive number of seconds.
    pub fn validate(&self) -> Result<()> {
        if self.sample_period.is_finite() && self.sample_period > 0.0 {
            Ok(())
        } else {
            Err(Error::SamplePeriod(self.sample_period))
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Synthesizer {
    config: SynthesisConfig,
}

impl Synthesizer {
    pub fn new(config: SynthesisConfig) -> Self {
        Self { config }
    }

    /// Builds a clip holding one track per schema channel, in schema order.
    ///
    /// Every frame must hold exactly `schema.width()` values. Channel `n`
    /// starts right after the values of channels `0..n`; key `k` of every
    /// track is stamped `k * sample_period`. A period that is not finite and
    /// positive is refused.
    pub fn synthesize(
        &self,
        name: &str,
        schema: &JointSchema,
        frames: &[Vec<f32>],
    ) -> Result<AnimationClip> {
        self.config.validate()?;
        if schema.is_empty() || frames.is_empty() {
            if !frames.is_empty() {
                warn!("`{}`: empty joint schema, {} frames ignored", name, frames.len());
            }
            return Ok(AnimationClip::new(name, vec![]));
        }

        let expected = schema.width();
        if let Some((frame, f)) = frames.iter().enumerate().find(|(_, f)| f.len() != expected) {
            return Err(Error::SchemaMismatch {
                frame,
                expected,
                found: f.len(),
            });
        }

        let period = self.config.sample_period;
        let times: Vec<f32> = (0..frames.len()).map(|k| k as f32 * period).collect();

        let mut offset = 0;
        let tracks = schema
            .channels()
            .iter()
            .map(|channel| {
                let track = channel_track(channel, offset, frames, times.clone());
                offset += channel.width();
                trace!("`{}`: {} ({} keys)", name, channel.name, frames.len());
                track
            })
            .collect();

        let clip = AnimationClip::new(name, tracks);
        info!(
            "synthesized `{}`: {} tracks, {:.3}s",
            name,
            clip.tracks.len(),
            clip.duration()
        );
        Ok(clip)
    }
}

fn channel_track(
    channel: &JointChannel,
    offset: usize,
    frames: &[Vec<f32>],
    times: Vec<f32>,
) -> AnimationTrack {
    let values = match channel.kind {
        ChannelKind::Rotation => TrackValues::Quaternion(
            frames
                .iter()
                .map(|f| [f[offset], f[offset + 1], f[offset + 2], f[offset + 3]])
                .collect(),
        ),
        ChannelKind::Position => TrackValues::Vector(
            frames
                .iter()
                .map(|f| [f[offset], f[offset + 1], f[offset + 2]])
                .collect(),
        ),
    };
    AnimationTrack::new(channel.name.clone(), times, values)
}

/// [`Synthesizer::synthesize`] with the default sample period.
pub fn synthesize(schema: &JointSchema, frames: &[Vec<f32>]) -> Result<AnimationClip> {
    Synthesizer::default().synthesize("sign_anim", schema, frames)
}
