//! Joint-channel schemas: which joint each run of frame values belongs to.

use lazy_static::lazy_static;
use log::*;
use serde::Deserialize;

use std::collections::HashMap;

use crate::read::{RotationDataset, Row};
use crate::{ChannelKind, Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JointChannel {
    pub name: String,
    pub kind: ChannelKind,
}

impl JointChannel {
    /// Channels whose name mentions `position` carry a translation, every
    /// other channel a quaternion.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let kind = if name.contains("position") {
            ChannelKind::Position
        } else {
            ChannelKind::Rotation
        };
        Self { name, kind }
    }

    pub fn width(&self) -> usize {
        self.kind.width()
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct JointSchema {
    channels: Vec<JointChannel>,
}

impl JointSchema {
    pub fn from_names<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            channels: names.into_iter().map(JointChannel::new).collect(),
        }
    }

    pub fn channels(&self) -> &[JointChannel] {
        &self.channels
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Number of raw values a frame laid out by this schema holds.
    pub fn width(&self) -> usize {
        self.channels.iter().map(JointChannel::width).sum()
    }
}

/// A named, versioned list of joint-channel names used when a dataset does
/// not carry its own. Every skeleton rig needs the table matching it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FallbackTable {
    pub version: String,
    pub names: Vec<String>,
}

impl FallbackTable {
    pub fn new<S: Into<String>>(version: impl Into<String>, names: impl IntoIterator<Item = S>) -> Self {
        Self {
            version: version.into(),
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn schema(&self) -> JointSchema {
        JointSchema::from_names(self.names.iter().cloned())
    }
}

pub const MIXAMO_52: &str = "mixamo-52";

const MIXAMO_52_BONES: [&str; 52] = [
    "mixamorigHips",
    "mixamorigSpine",
    "mixamorigSpine1",
    "mixamorigSpine2",
    "mixamorigNeck",
    "mixamorigHead",
    "mixamorigLeftShoulder",
    "mixamorigLeftArm",
    "mixamorigLeftForeArm",
    "mixamorigLeftHand",
    "mixamorigLeftHandThumb1",
    "mixamorigLeftHandThumb2",
    "mixamorigLeftHandThumb3",
    "mixamorigLeftHandIndex1",
    "mixamorigLeftHandIndex2",
    "mixamorigLeftHandIndex3",
    "mixamorigLeftHandMiddle1",
    "mixamorigLeftHandMiddle2",
    "mixamorigLeftHandMiddle3",
    "mixamorigLeftHandRing1",
    "mixamorigLeftHandRing2",
    "mixamorigLeftHandRing3",
    "mixamorigLeftHandPinky1",
    "mixamorigLeftHandPinky2",
    "mixamorigLeftHandPinky3",
    "mixamorigRightShoulder",
    "mixamorigRightArm",
    "mixamorigRightForeArm",
    "mixamorigRightHand",
    "mixamorigRightHandThumb1",
    "mixamorigRightHandThumb2",
    "mixamorigRightHandThumb3",
    "mixamorigRightHandIndex1",
    "mixamorigRightHandIndex2",
    "mixamorigRightHandIndex3",
    "mixamorigRightHandMiddle1",
    "mixamorigRightHandMiddle2",
    "mixamorigRightHandMiddle3",
    "mixamorigRightHandRing1",
    "mixamorigRightHandRing2",
    "mixamorigRightHandRing3",
    "mixamorigRightHandPinky1",
    "mixamorigRightHandPinky2",
    "mixamorigRightHandPinky3",
    "mixamorigLeftUpLeg",
    "mixamorigLeftLeg",
    "mixamorigLeftFoot",
    "mixamorigLeftToeBase",
    "mixamorigRightUpLeg",
    "mixamorigRightLeg",
    "mixamorigRightFoot",
    "mixamorigRightToeBase",
];

lazy_static! {
    static ref BUILTIN_TABLES: HashMap<String, FallbackTable> = {
        let mixamo = FallbackTable::new(
            MIXAMO_52,
            MIXAMO_52_BONES.iter().map(|b| format!("{}.quaternion", b)),
        );
        let mut tables = HashMap::new();
        tables.insert(mixamo.version.clone(), mixamo);
        tables
    };
}

/// Registry of fallback tables, keyed by version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaTables {
    tables: HashMap<String, FallbackTable>,
}

impl Default for SchemaTables {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SchemaTables {
    pub fn builtin() -> Self {
        Self {
            tables: BUILTIN_TABLES.clone(),
        }
    }

    pub fn empty() -> Self {
        Self {
            tables: HashMap::new(),
        }
    }

    /// Adds `table`, replacing any table with the same version.
    pub fn register(&mut self, table: FallbackTable) -> Option<FallbackTable> {
        self.tables.insert(table.version.clone(), table)
    }

    pub fn get(&self, version: &str) -> Result<&FallbackTable> {
        self.tables
            .get(version)
            .ok_or_else(|| Error::UnknownSchemaTable(version.to_string()))
    }

    pub fn versions(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    /// The dataset's trailing name row.
    Embedded,
    /// A fallback table, by version.
    Fallback(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub schema: JointSchema,
    pub frames: Vec<Vec<f32>>,
    pub source: SchemaSource,
}

/// Splits a dataset into its joint schema and value frames.
///
/// A trailing name row becomes the schema and is dropped from the frames;
/// when the last row holds values the `fallback` table is used instead.
pub fn resolve(dataset: RotationDataset, fallback: &FallbackTable) -> Result<Resolved> {
    let mut rows = dataset.rows;
    let (schema, source) = match rows.pop() {
        Some(Row::Names(names)) => (JointSchema::from_names(names), SchemaSource::Embedded),
        last => {
            rows.extend(last);
            warn!(
                "dataset carries no joint names, using fallback table `{}`",
                fallback.version
            );
            (
                fallback.schema(),
                SchemaSource::Fallback(fallback.version.clone()),
            )
        }
    };
    let frames = rows
        .into_iter()
        .enumerate()
        .map(|(i, row)| match row {
            Row::Values(values) => Ok(values),
            Row::Names(_) => Err(Error::MalformedDataset(format!(
                "row {} holds joint names but only the last row may",
                i
            ))),
        })
        .collect::<Result<Vec<_>>>()?;
    debug!(
        "resolved {} channels ({} values per frame) over {} frames",
        schema.len(),
        schema.width(),
        frames.len()
    );
    Ok(Resolved {
        schema,
        frames,
        source,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn channel_kinds() {
        let schema = JointSchema::from_names(vec!["hips.position", "hips.quaternion", "spine.quaternion"]);
        let kinds: Vec<_> = schema.channels().iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![ChannelKind::Position, ChannelKind::Rotation, ChannelKind::Rotation]
        );
        assert_eq!(schema.width(), 11);
    }

    #[test]
    fn builtin_mixamo_table() {
        let tables = SchemaTables::builtin();
        let table = tables.get(MIXAMO_52).unwrap();
        assert_eq!(table.names.len(), 52);
        assert_eq!(table.names[0], "mixamorigHips.quaternion");
        assert_eq!(table.schema().width(), 52 * 4);
        assert!(matches!(tables.get("rig-62"), Err(Error::UnknownSchemaTable(_))));
    }

    #[test]
    fn registered_table() {
        let mut tables = SchemaTables::empty();
        assert!(tables.register(FallbackTable::new("tiny", vec!["a.quaternion"])).is_none());
        assert!(tables.register(FallbackTable::new("tiny", vec!["b.quaternion"])).is_some());
        assert_eq!(tables.get("tiny").unwrap().names, vec!["b.quaternion"]);
        assert_eq!(tables.versions().collect::<Vec<_>>(), vec!["tiny"]);
    }

    #[test]
    fn embedded_names_win() {
        let fallback = FallbackTable::new("fallback", vec!["x.quaternion"]);
        let data = RotationDataset::from_frames(vec![vec![0., 0., 0., 1., 1., 2., 3.]])
            .with_names(vec!["hips.quaternion", "hips.position"]);
        let resolved = resolve(data, &fallback).unwrap();
        assert_eq!(resolved.source, SchemaSource::Embedded);
        assert_eq!(resolved.schema.len(), 2);
        assert_eq!(resolved.frames.len(), 1);
    }

    #[test]
    fn numeric_trailing_row_uses_fallback() {
        let fallback = FallbackTable::new("fallback", vec!["x.quaternion"]);
        let data = RotationDataset::from_frames(vec![vec![0., 0., 0., 1.], vec![1., 0., 0., 0.]]);
        let resolved = resolve(data, &fallback).unwrap();
        assert_eq!(resolved.source, SchemaSource::Fallback("fallback".to_string()));
        assert_eq!(resolved.schema, fallback.schema());
        // the trailing row stays a frame
        assert_eq!(resolved.frames, vec![vec![0., 0., 0., 1.], vec![1., 0., 0., 0.]]);
    }

    #[test]
    fn empty_dataset_uses_fallback() {
        let fallback = FallbackTable::new("fallback", vec!["x.quaternion"]);
        let resolved = resolve(RotationDataset::default(), &fallback).unwrap();
        assert!(resolved.frames.is_empty());
        assert_eq!(resolved.schema.len(), 1);
    }

    #[test]
    fn names_in_the_middle() {
        let fallback = FallbackTable::new("fallback", vec!["x.quaternion"]);
        let data = RotationDataset::from_frames(vec![vec![0., 0., 0., 1.]])
            .with_names(vec!["x.quaternion"])
            .with_names(vec!["y.quaternion"]);
        assert!(matches!(resolve(data, &fallback), Err(Error::MalformedDataset(_))));
    }
}
