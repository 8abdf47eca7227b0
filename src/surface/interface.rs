use crate::captured_frame::CapturedFrame;
use image::RgbImage;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub tone: Tone,
    pub text: String,
}

impl Status {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            tone: Tone::Info,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            tone: Tone::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            tone: Tone::Error,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Capture,
    Scan,
    Retry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlState {
    Hidden,
    Enabled,
    Disabled,
}

/// Target of the camera feed. Sessions call `present` from their own thread.
pub trait LiveSurface: Send + Sync {
    fn present(&self, frame: &RgbImage);
    fn set_visible(&self, visible: bool);
}

pub trait PreviewSurface: Send + Sync {
    /// `None` hides the preview.
    fn show(&self, frame: Option<&CapturedFrame>);
}

pub trait StatusSurface: Send + Sync {
    fn set_status(&self, status: &Status);
}

pub trait BusyIndicator: Send + Sync {
    fn set_busy(&self, busy: bool);
}

pub trait ControlPanel: Send + Sync {
    fn set_control(&self, control: Control, state: ControlState);
}

/// The named render targets the controller draws into.
#[derive(Clone)]
pub struct Surfaces {
    pub live: Arc<dyn LiveSurface + Send + Sync>,
    pub preview: Arc<dyn PreviewSurface + Send + Sync>,
    pub status: Arc<dyn StatusSurface + Send + Sync>,
    pub busy: Arc<dyn BusyIndicator + Send + Sync>,
    pub controls: Arc<dyn ControlPanel + Send + Sync>,
}

impl Surfaces {
    /// Uses one screen object for every handle.
    pub fn from_screen<S>(screen: Arc<S>) -> Self
    where
        S: LiveSurface + PreviewSurface + StatusSurface + BusyIndicator + ControlPanel + 'static,
    {
        Self {
            live: screen.clone(),
            preview: screen.clone(),
            status: screen.clone(),
            busy: screen.clone(),
            controls: screen,
        }
    }
}
