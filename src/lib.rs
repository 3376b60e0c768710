//! Skeletal motion playback, landmark reprojection and pose-error evaluation.
//!
//! Raw rotation datasets are turned into [`AnimationClip`]s by the
//! [`schema`] and [`synth`] modules, played back on a [`rig::Skeleton`]
//! through a [`player::PlaybackEngine`], and compared against each other by
//! [`evaluate`].

use serde::Serialize;

pub mod error;
pub mod evaluate;
pub mod export;
pub mod player;
pub mod read;
pub mod rig;
mod sample;
pub mod schema;
pub mod session;
pub mod synth;
pub mod unproject;

pub use error::{Error, Result};
pub use sample::Sample;

/// How many raw values a joint channel occupies in a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    /// Quaternion, stored `x, y, z, w`.
    Rotation,
    /// Translation, stored `x, y, z`.
    Position,
}

impl ChannelKind {
    pub fn width(self) -> usize {
        match self {
            Self::Rotation => 4,
            Self::Position => 3,
        }
    }
}

#[derive(Debug, PartialEq, PartialOrd, Clone, Serialize)]
#[serde(untagged)]
pub enum TrackValues {
    Quaternion(Vec<[f32; 4]>),
    Vector(Vec<[f32; 3]>),
}

impl TrackValues {
    pub fn len(&self) -> usize {
        match self {
            Self::Quaternion(v) => v.len(),
            Self::Vector(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> ChannelKind {
        match self {
            Self::Quaternion(_) => ChannelKind::Rotation,
            Self::Vector(_) => ChannelKind::Position,
        }
    }

    /// Raw components of key `index`.
    pub fn key(&self, index: usize) -> Option<&[f32]> {
        match self {
            Self::Quaternion(v) => v.get(index).map(|k| &k[..]),
            Self::Vector(v) => v.get(index).map(|k| &k[..]),
        }
    }
}

#[derive(Debug, PartialEq, PartialOrd, Clone, Serialize)]
pub struct AnimationTrack {
    /// Binding path, e.g. `mixamorigHips.quaternion`.
    pub name: String,
    pub times: Vec<f32>,
    pub values: TrackValues,
}

impl AnimationTrack {
    pub fn new(name: impl Into<String>, times: Vec<f32>, values: TrackValues) -> Self {
        Self {
            name: name.into(),
            times,
            values,
        }
    }

    pub fn kind(&self) -> ChannelKind {
        self.values.kind()
    }

    pub fn last_time(&self) -> Option<f32> {
        self.times.last().copied()
    }
}

#[derive(Debug, Default, PartialEq, PartialOrd, Clone, Serialize)]
pub struct AnimationClip {
    pub name: String,
    pub tracks: Vec<AnimationTrack>,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>, tracks: Vec<AnimationTrack>) -> Self {
        Self {
            name: name.into(),
            tracks,
        }
    }

    /// Latest key time across all tracks; never stored.
    pub fn duration(&self) -> f32 {
        self.tracks
            .iter()
            .filter_map(AnimationTrack::last_time)
            .fold(0.0, f32::max)
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// The canonical timeline of the clip: the key times of its first track.
    pub fn times(&self) -> Option<&[f32]> {
        self.tracks.first().map(|t| &t.times[..])
    }

    pub fn track(&self, name: &str) -> Option<&AnimationTrack> {
        self.tracks.iter().find(|t| t.name == name)
    }
}
