//! Skeleton hierarchies and their forward kinematics.

use cgmath::{InnerSpace, Matrix4, Point3, Quaternion, SquareMatrix, Vector3};
use log::*;

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    pub name: String,
    pub parent: Option<usize>,
    /// Rest translation relative to the parent.
    pub offset: Vector3<f32>,
}

impl Bone {
    pub fn new(name: impl Into<String>, parent: Option<usize>, offset: Vector3<f32>) -> Self {
        Self {
            name: name.into(),
            parent,
            offset,
        }
    }
}

/// Local transform of one bone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalPose {
    pub translation: Vector3<f32>,
    pub rotation: Quaternion<f32>,
}

impl LocalPose {
    fn matrix(&self) -> Matrix4<f32> {
        let rotation = if self.rotation.magnitude2() > 0.0 {
            self.rotation.normalize()
        } else {
            Quaternion::new(1.0, 0.0, 0.0, 0.0)
        };
        Matrix4::from_translation(self.translation) * Matrix4::from(rotation)
    }
}

/// Bones ordered so that every parent precedes its children.
#[derive(Debug, Clone, PartialEq)]
pub struct Skeleton {
    bones: Vec<Bone>,
}

impl Skeleton {
    pub fn new(bones: Vec<Bone>) -> Result<Self> {
        for (i, bone) in bones.iter().enumerate() {
            if let Some(parent) = bone.parent {
                if parent >= i {
                    return Err(Error::Skeleton(format!(
                        "bone `{}` (#{}) comes before its parent #{}",
                        bone.name, i, parent
                    )));
                }
            }
        }
        Ok(Self { bones })
    }

    /// Reads the joint hierarchy of a BVH file. Motion data in the file is
    /// ignored. Bones keep the file's joint order, so parents are taken by
    /// index and repeated joint names are fine.
    pub fn from_bvh(data: &[u8]) -> Result<Self> {
        let bvh = bvh_anim::from_bytes(data).map_err(|e| Error::Skeleton(e.to_string()))?;
        let mut bones: Vec<Bone> = vec![];
        for joint in bvh.joints() {
            let name = joint.data().name().to_string();
            let offset = joint.data().offset();
            let parent = joint.data().parent_index();
            bones.push(Bone::new(name, parent, Vector3::new(offset.x, offset.y, offset.z)));
        }
        debug!("loaded skeleton with {} bones", bones.len());
        Self::new(bones)
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn bone_index(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|b| b.name == name)
    }

    pub fn rest_pose(&self) -> Vec<LocalPose> {
        self.bones
            .iter()
            .map(|b| LocalPose {
                translation: b.offset,
                rotation: Quaternion::new(1.0, 0.0, 0.0, 0.0),
            })
            .collect()
    }

    /// World matrices of every bone for `pose`, with `root` placing the
    /// whole skeleton.
    pub fn world_matrices(&self, pose: &[LocalPose], root: Matrix4<f32>) -> Vec<Matrix4<f32>> {
        let mut world: Vec<Matrix4<f32>> = Vec::with_capacity(self.bones.len());
        for (bone, local) in self.bones.iter().zip(pose) {
            let parent = match bone.parent {
                Some(p) => world[p],
                None => root,
            };
            world.push(parent * local.matrix());
        }
        world
    }
}

pub(crate) fn translation_of(m: &Matrix4<f32>) -> Point3<f32> {
    Point3::new(m.w.x, m.w.y, m.w.z)
}

pub(crate) fn identity() -> Matrix4<f32> {
    Matrix4::identity()
}
