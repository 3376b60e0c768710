//! Reprojection of normalized 2D landmarks into world space through the
//! camera the landmarks were captured with.

use cgmath::{perspective, Deg, Matrix4, Point3, SquareMatrix, Vector3, Vector4};
use log::*;
use serde::Deserialize;

use crate::read::{LandmarkFrame, LandmarkSequence};
use crate::{Error, Result};

/// Depth, in normalized device coordinates, given to every landmark. Lands
/// the points about where the skeletons stand.
pub const LANDMARK_DEPTH: f32 = 0.935;

/// Intrinsics and placement of the capture camera.
///
/// The defaults describe the 1280x720 virtual camera the reference dataset
/// was rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct CaptureCamera {
    /// Vertical field of view, in degrees.
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub up: [f32; 3],
}

impl Default for CaptureCamera {
    fn default() -> Self {
        Self {
            fov_y: 30.9375,
            aspect: 1280.0 / 720.0,
            near: 0.1,
            far: 1000.0,
            position: [0.05, 1.8, 3.1],
            target: [0.05, 1.28381, 0.172517],
            up: [0.0, 1.0, 0.0],
        }
    }
}

impl CaptureCamera {
    fn validate(&self) -> Result<()> {
        if !(self.fov_y > 0.0 && self.fov_y < 180.0) {
            return Err(Error::Camera(format!("fov {} is outside (0, 180)", self.fov_y)));
        }
        if !(self.aspect > 0.0) {
            return Err(Error::Camera(format!("aspect {} is not positive", self.aspect)));
        }
        if !(self.near > 0.0 && self.far > self.near) {
            return Err(Error::Camera(format!(
                "clip planes {}..{} are not ordered",
                self.near, self.far
            )));
        }
        if self.position == self.target {
            return Err(Error::Camera("camera looks at its own position".to_string()));
        }
        Ok(())
    }

    pub fn projection(&self) -> Result<Matrix4<f32>> {
        self.validate()?;
        Ok(perspective(Deg(self.fov_y), self.aspect, self.near, self.far))
    }

    pub fn view(&self) -> Result<Matrix4<f32>> {
        self.validate()?;
        Ok(Matrix4::look_at(
            Point3::from(self.position),
            Point3::from(self.target),
            Vector3::from(self.up),
        ))
    }
}

/// How normalized landmark coordinates map onto clip space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NdcConvention {
    /// Image rows grow downwards: `x' = 2x - 1`, `y' = 1 - 2y`.
    YDown,
    /// Image rows grow upwards: `x' = 2x - 1`, `y' = 2y - 1`.
    YUp,
}

impl Default for NdcConvention {
    fn default() -> Self {
        Self::YDown
    }
}

impl NdcConvention {
    pub fn to_ndc(self, (x, y): (f32, f32)) -> (f32, f32) {
        match self {
            Self::YDown => (2.0 * x - 1.0, 1.0 - 2.0 * y),
            Self::YUp => (2.0 * x - 1.0, 2.0 * y - 1.0),
        }
    }

    pub fn from_ndc(self, (x, y): (f32, f32)) -> (f32, f32) {
        match self {
            Self::YDown => ((x + 1.0) / 2.0, (1.0 - y) / 2.0),
            Self::YUp => ((x + 1.0) / 2.0, (y + 1.0) / 2.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct UnprojectConfig {
    pub camera: CaptureCamera,
    pub depth: f32,
    pub convention: NdcConvention,
}

impl Default for UnprojectConfig {
    fn default() -> Self {
        Self {
            camera: CaptureCamera::default(),
            depth: LANDMARK_DEPTH,
            convention: NdcConvention::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Unprojector {
    inverse_projection: Matrix4<f32>,
    inverse_view: Matrix4<f32>,
    depth: f32,
    convention: NdcConvention,
}

impl Unprojector {
    pub fn new(config: &UnprojectConfig) -> Result<Self> {
        let camera = &config.camera;
        Self::from_matrices(
            camera.projection()?,
            camera.view()?,
            config.depth,
            config.convention,
        )
    }

    pub fn from_matrices(
        projection: Matrix4<f32>,
        view: Matrix4<f32>,
        depth: f32,
        convention: NdcConvention,
    ) -> Result<Self> {
        let inverse_projection = projection
            .invert()
            .ok_or_else(|| Error::Camera("projection matrix is singular".to_string()))?;
        let inverse_view = view
            .invert()
            .ok_or_else(|| Error::Camera("view matrix is singular".to_string()))?;
        Ok(Self {
            inverse_projection,
            inverse_view,
            depth,
            convention,
        })
    }

    pub fn with_depth(self, depth: f32) -> Self {
        Self { depth, ..self }
    }

    pub fn depth(&self) -> f32 {
        self.depth
    }

    pub fn convention(&self) -> NdcConvention {
        self.convention
    }

    /// World-space point of a normalized `(x, y)` landmark at the fixed depth.
    pub fn unproject(&self, normalized: (f32, f32)) -> Point3<f32> {
        let (x, y) = self.convention.to_ndc(normalized);
        let view_space = self.inverse_projection * Vector4::new(x, y, self.depth, 1.0);
        let world = self.inverse_view * view_space;
        Point3::new(world.x / world.w, world.y / world.w, world.z / world.w)
    }

    pub fn unproject_frame(&self, frame: &LandmarkFrame) -> Vec<Point3<f32>> {
        frame.points().map(|p| self.unproject(p)).collect()
    }
}

/// Keeps the landmark points in step with animation playback.
///
/// Landmark frames are spread evenly over the clip duration, so the frame
/// shown at playback time `t` is `floor(t / duration * count)`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LandmarkTracker {
    current: Option<usize>,
    points: Vec<Point3<f32>>,
}

impl LandmarkTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame_index(time: f32, duration: f32, count: usize) -> Option<usize> {
        if count == 0 {
            return None;
        }
        if !(duration > 0.0) || !(time > 0.0) {
            return Some(0);
        }
        let index = (time / duration * count as f32).floor() as usize;
        Some(index.min(count - 1))
    }

    /// Refreshes the points for playback `time`. Returns whether the shown
    /// landmark frame changed; an unchanged frame is not recomputed.
    pub fn update(
        &mut self,
        unprojector: &Unprojector,
        landmarks: &LandmarkSequence,
        time: f32,
        duration: f32,
    ) -> bool {
        let index = match Self::frame_index(time, duration, landmarks.len()) {
            Some(i) => i,
            None => return false,
        };
        if self.current == Some(index) {
            return false;
        }
        let frame = match landmarks.get(index) {
            Some(f) => f,
            None => return false,
        };
        self.points = unprojector.unproject_frame(frame);
        self.current = Some(index);
        trace!("landmark frame {} ({} points)", index, self.points.len());
        true
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn points(&self) -> &[Point3<f32>] {
        &self.points
    }

    pub fn reset(&mut self) {
        self.current = None;
        self.points.clear();
    }
}
