//! Decoding of the JSON datasets fed to the pipeline.

use serde::Deserialize;

use std::path::Path;

use crate::{Error, Result};

pub mod binding;

pub use binding::{parse_binding, Binding};

/// One row of a rotation dataset.
///
/// A row is either a frame of raw channel values, or (only as the last row)
/// the joint-channel names the values are laid out by.
#[derive(Debug, Clone, PartialEq, PartialOrd, Deserialize)]
#[serde(untagged)]
pub enum Row {
    Values(Vec<f32>),
    Names(Vec<String>),
}

#[derive(Debug, Default, Clone, PartialEq, PartialOrd)]
pub struct RotationDataset {
    pub rows: Vec<Row>,
}

impl RotationDataset {
    pub fn from_json(text: &str) -> Result<Self> {
        let rows: Vec<Row> = serde_json::from_str(text).map_err(|e| {
            Error::MalformedDataset(format!(
                "expected an array of numeric rows with an optional trailing name row: {}",
                e
            ))
        })?;
        Ok(Self { rows })
    }

    pub fn from_frames(frames: Vec<Vec<f32>>) -> Self {
        Self {
            rows: frames.into_iter().map(Row::Values).collect(),
        }
    }

    /// Appends an explicit name row.
    pub fn with_names<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.rows
            .push(Row::Names(names.into_iter().map(Into::into).collect()));
        self
    }
}

/// Normalized 2D detections for one instant, stored `x0, y0, x1, y1, ...`.
#[derive(Debug, Default, Clone, PartialEq, PartialOrd, Deserialize)]
#[serde(transparent)]
pub struct LandmarkFrame(pub Vec<f32>);

impl LandmarkFrame {
    pub fn points(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.0.chunks_exact(2).map(|p| (p[0], p[1]))
    }

    pub fn len(&self) -> usize {
        self.0.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default, Clone, PartialEq, PartialOrd, Deserialize)]
#[serde(transparent)]
pub struct LandmarkSequence {
    pub frames: Vec<LandmarkFrame>,
}

impl LandmarkSequence {
    pub fn from_json(text: &str) -> Result<Self> {
        let seq: Self = serde_json::from_str(text)
            .map_err(|e| Error::MalformedDataset(format!("expected an array of landmark frames: {}", e)))?;
        if let Some(i) = seq.frames.iter().position(|f| f.0.len() % 2 != 0) {
            return Err(Error::MalformedDataset(format!(
                "landmark frame {} has an odd number of coordinates",
                i
            )));
        }
        Ok(seq)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&LandmarkFrame> {
        self.frames.get(index)
    }
}

/// Rejects files whose suffix is not `extension` (compared case-insensitively).
pub fn check_extension(file_name: &str, extension: &str) -> Result<()> {
    let matches = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(extension))
        .unwrap_or(false);
    if matches {
        Ok(())
    } else {
        Err(Error::UnsupportedFileExtension(file_name.to_string()))
    }
}
