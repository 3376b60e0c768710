use cgmath::{InnerSpace, Quaternion, Vector3};

use super::*;

/// A track evaluated at one point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sample {
    Rotation(Quaternion<f32>),
    Position(Vector3<f32>),
}

fn quat([x, y, z, w]: [f32; 4]) -> Quaternion<f32> {
    Quaternion::new(w, x, y, z)
}

fn slerp(a: Quaternion<f32>, b: Quaternion<f32>, amount: f32) -> Quaternion<f32> {
    // take the short way around
    let b = if a.dot(b) < 0.0 { -b } else { b };
    a.slerp(b, amount)
}

impl AnimationTrack {
    /// Evaluates the track at `time`.
    ///
    /// Times before the first key or after the last one hold the nearest
    /// key. Key times return the stored key exactly; anything in between is
    /// slerped (rotations) or lerped (positions).
    pub fn sample(&self, time: f32) -> Option<Sample> {
        let count = self.times.len().min(self.values.len());
        if count == 0 {
            return None;
        }
        let times = &self.times[..count];
        let next = times.partition_point(|&t| t < time);
        let (a, b, amount) = if next == 0 {
            (0, 0, 0.0)
        } else if next == count {
            (count - 1, count - 1, 0.0)
        } else if times[next] == time {
            (next, next, 0.0)
        } else {
            let (t0, t1) = (times[next - 1], times[next]);
            (next - 1, next, (time - t0) / (t1 - t0))
        };

        let sample = match &self.values {
            TrackValues::Quaternion(keys) if a == b => Sample::Rotation(quat(keys[a])),
            TrackValues::Quaternion(keys) => {
                Sample::Rotation(slerp(quat(keys[a]), quat(keys[b]), amount))
            }
            TrackValues::Vector(keys) => {
                let (va, vb) = (Vector3::from(keys[a]), Vector3::from(keys[b]));
                if a == b {
                    Sample::Position(va)
                } else {
                    Sample::Position(va + (vb - va) * amount)
                }
            }
        };
        Some(sample)
    }
}
