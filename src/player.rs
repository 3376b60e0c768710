//! Clip playback on a skeleton.

use cgmath::{Matrix4, Point3, Vector3};
use log::*;

use crate::read::parse_binding;
use crate::rig::{self, LocalPose, Skeleton};
use crate::{AnimationClip, Sample};

/// What the evaluator and the landmark view need from an animation player.
pub trait PlaybackEngine {
    /// Replaces the bound clip and rewinds to its start.
    fn bind(&mut self, clip: AnimationClip);
    fn clip(&self) -> Option<&AnimationClip>;
    /// Jumps to an absolute time.
    fn seek(&mut self, time: f32);
    /// Moves playback forward by `delta` seconds.
    fn advance(&mut self, delta: f32);
    fn time(&self) -> f32;
    fn bone_count(&self) -> usize;
    fn bone_name(&self, index: usize) -> Option<&str>;
    fn bone_world_position(&self, index: usize) -> Option<Point3<f32>>;
    /// Drops the bound clip, back to rest pose.
    fn stop(&mut self);
}

#[derive(Debug, Clone, PartialEq)]
struct Bound {
    clip: AnimationClip,
    /// `(track, bone)` pairs.
    targets: Vec<(usize, usize)>,
}

/// A [`PlaybackEngine`] driving a [`Skeleton`] by forward kinematics.
///
/// Tracks bind to the bone named by the node part of their binding path.
/// Seeking clamps to the clip; advancing loops over it.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    skeleton: Skeleton,
    placement: Matrix4<f32>,
    bound: Option<Bound>,
    time: f32,
    pose: Vec<LocalPose>,
    world: Vec<Matrix4<f32>>,
}

impl Player {
    pub fn new(skeleton: Skeleton) -> Self {
        let pose = skeleton.rest_pose();
        let placement = rig::identity();
        let world = skeleton.world_matrices(&pose, placement);
        Self {
            skeleton,
            placement,
            bound: None,
            time: 0.0,
            pose,
            world,
        }
    }

    /// Places the skeleton root at `translation`, scaled by `scale`.
    pub fn with_placement(mut self, translation: Vector3<f32>, scale: f32) -> Self {
        self.placement = Matrix4::from_translation(translation) * Matrix4::from_scale(scale);
        self.refresh();
        self
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    /// Index of the bone called `name`.
    pub fn bone(&self, name: &str) -> Option<usize> {
        self.skeleton.bone_index(name)
    }

    fn refresh(&mut self) {
        self.pose = self.skeleton.rest_pose();
        if let Some(bound) = &self.bound {
            for &(track, bone) in &bound.targets {
                match bound.clip.tracks[track].sample(self.time) {
                    Some(Sample::Rotation(q)) => self.pose[bone].rotation = q,
                    Some(Sample::Position(v)) => self.pose[bone].translation = v,
                    None => (),
                }
            }
        }
        self.world = self.skeleton.world_matrices(&self.pose, self.placement);
    }

    fn duration(&self) -> f32 {
        self.bound.as_ref().map(|b| b.clip.duration()).unwrap_or(0.0)
    }
}

impl PlaybackEngine for Player {
    fn bind(&mut self, clip: AnimationClip) {
        let mut targets = vec![];
        for (index, track) in clip.tracks.iter().enumerate() {
            let binding = match parse_binding(&track.name) {
                Ok(b) => b,
                Err(e) => {
                    warn!("`{}`: {}, track skipped", clip.name, e);
                    continue;
                }
            };
            match self.skeleton.bone_index(binding.node) {
                Some(bone) => targets.push((index, bone)),
                None => warn!(
                    "`{}`: no bone named `{}` for track `{}`",
                    clip.name, binding.node, track.name
                ),
            }
        }
        debug!(
            "bound `{}`: {}/{} tracks",
            clip.name,
            targets.len(),
            clip.tracks.len()
        );
        self.bound = Some(Bound { clip, targets });
        self.time = 0.0;
        self.refresh();
    }

    fn clip(&self) -> Option<&AnimationClip> {
        self.bound.as_ref().map(|b| &b.clip)
    }

    fn seek(&mut self, time: f32) {
        self.time = time.max(0.0).min(self.duration());
        self.refresh();
    }

    fn advance(&mut self, delta: f32) {
        if self.bound.is_none() {
            return;
        }
        let duration = self.duration();
        self.time = if duration > 0.0 {
            (self.time + delta).rem_euclid(duration)
        } else {
            0.0
        };
        self.refresh();
    }

    fn time(&self) -> f32 {
        self.time
    }

    fn bone_count(&self) -> usize {
        self.skeleton.len()
    }

    fn bone_name(&self, index: usize) -> Option<&str> {
        self.skeleton.bones().get(index).map(|b| &b.name[..])
    }

    fn bone_world_position(&self, index: usize) -> Option<Point3<f32>> {
        self.world.get(index).map(rig::translation_of)
    }

    fn stop(&mut self) {
        self.bound = None;
        self.time = 0.0;
        self.refresh();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::rig::Bone;
    use crate::{AnimationTrack, TrackValues};

    fn arm() -> Skeleton {
        Skeleton::new(vec![
            Bone::new("Hips", None, Vector3::new(0.0, 1.0, 0.0)),
            Bone::new("Arm", Some(0), Vector3::new(1.0, 0.0, 0.0)),
            Bone::new("Hand", Some(1), Vector3::new(1.0, 0.0, 0.0)),
        ])
        .unwrap()
    }

    fn swing() -> AnimationClip {
        let half = std::f32::consts::FRAC_1_SQRT_2;
        AnimationClip::new(
            "swing",
            vec![
                AnimationTrack::new(
                    "Arm.quaternion",
                    vec![0.0, 1.0],
                    TrackValues::Quaternion(vec![[0., 0., 0., 1.], [0., 0., half, half]]),
                ),
                AnimationTrack::new(
                    "Hips.position",
                    vec![0.0, 1.0],
                    TrackValues::Vector(vec![[0., 1., 0.], [0., 2., 0.]]),
                ),
                AnimationTrack::new(
                    "Tail.quaternion",
                    vec![0.0, 1.0],
                    TrackValues::Quaternion(vec![[0., 0., 0., 1.]; 2]),
                ),
            ],
        )
    }

    fn close(a: Point3<f32>, b: Point3<f32>) -> bool {
        (a.x - b.x).abs() < 1e-5 && (a.y - b.y).abs() < 1e-5 && (a.z - b.z).abs() < 1e-5
    }

    #[test]
    fn seek_poses_the_skeleton() {
        let mut player = Player::new(arm());
        player.bind(swing());
        assert!(close(player.bone_world_position(2).unwrap(), Point3::new(2.0, 1.0, 0.0)));

        player.seek(1.0);
        assert!(close(player.bone_world_position(1).unwrap(), Point3::new(1.0, 2.0, 0.0)));
        assert!(close(player.bone_world_position(2).unwrap(), Point3::new(1.0, 3.0, 0.0)));
    }

    #[test]
    fn seek_clamps() {
        let mut player = Player::new(arm());
        player.bind(swing());
        player.seek(5.0);
        assert_eq!(player.time(), 1.0);
        player.seek(-1.0);
        assert_eq!(player.time(), 0.0);
    }

    #[test]
    fn advance_loops() {
        let mut player = Player::new(arm());
        player.advance(0.5);
        assert_eq!(player.time(), 0.0);

        player.bind(swing());
        player.advance(0.75);
        player.advance(0.5);
        assert!((player.time() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn stop_returns_to_rest() {
        let mut player = Player::new(arm());
        player.bind(swing());
        player.seek(1.0);
        player.stop();
        assert!(player.clip().is_none());
        assert!(close(player.bone_world_position(2).unwrap(), Point3::new(2.0, 1.0, 0.0)));
    }

    #[test]
    fn named_bones() {
        let player = Player::new(arm()).with_placement(Vector3::new(0.5, 0.0, 0.0), 2.0);
        assert_eq!(player.bone_count(), 3);
        assert_eq!(player.bone("Hand"), Some(2));
        assert_eq!(player.bone_name(1), Some("Arm"));
        assert_eq!(player.bone_name(3), None);
        assert!(close(player.bone_world_position(2).unwrap(), Point3::new(4.5, 2.0, 0.0)));
    }
}
