use crate::captured_frame::CaptureError;
use crate::surface::interface::LiveSurface;
use image::RgbImage;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    Environment,
    User,
}

/// What to ask the camera for. Width and height are a preference, the
/// session reports what the device actually delivers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConstraints {
    pub facing: Facing,
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub device_index: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CameraAccessError {
    #[error("camera permission denied")]
    PermissionDenied,
    #[error("no camera device found")]
    NoDevice,
    #[error("camera error: {0}")]
    Other(String),
}

pub trait CameraSession: Send {
    /// Native resolution of the frames this session delivers.
    fn resolution(&self) -> (u32, u32);

    /// Starts pushing live frames to `surface`. Replaces any previous surface.
    fn attach(
        &mut self,
        surface: Arc<dyn LiveSurface + Send + Sync>,
    ) -> Result<(), CameraAccessError>;

    fn current_frame(&mut self) -> Result<RgbImage, CaptureError>;

    /// Stops every underlying track. Calling it twice is a no-op.
    fn stop(&mut self);
}

pub trait MediaSource: Send + Sync {
    fn request(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn CameraSession>, CameraAccessError>;
}
