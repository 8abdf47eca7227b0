use crate::captured_frame::{CaptureError, CapturedFrame};
use crate::config::Config;
use crate::detection_service::interface::{DetectionError, DetectionResult, ServiceHealth};
use crate::media_source::interface::{CameraAccessError, StreamConstraints};
use crate::surface::interface::Status;

pub const PROMPT: &str = "Point the camera at a barcode";
pub const STARTING: &str = "Starting camera...";
pub const CAPTURED: &str = "Image captured! Press Scan to detect the barcode.";
pub const SCANNING: &str = "Scanning...";
pub const NO_IMAGE_CAPTURED: &str = "No image captured";
pub const CAMERA_UNAVAILABLE: &str = "Unable to access the camera. Please check permissions.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Camera,
    Previewing,
    Scanning,
    Result,
}

#[derive(Debug, Clone, PartialEq)]
pub enum State {
    Starting,
    CameraUnavailable {
        error: CameraAccessError,
    },
    Camera {
        status: Status,
        capturing: bool,
    },
    Previewing {
        frame: CapturedFrame,
        status: Status,
    },
    Scanning {
        frame: CapturedFrame,
    },
    Result {
        frame: CapturedFrame,
        outcome: DetectionResult,
    },
    Closed,
}

impl State {
    pub fn phase(&self) -> Phase {
        match self {
            State::Starting
            | State::CameraUnavailable { .. }
            | State::Camera { .. }
            | State::Closed => Phase::Camera,
            State::Previewing { .. } => Phase::Previewing,
            State::Scanning { .. } => Phase::Scanning,
            State::Result { .. } => Phase::Result,
        }
    }

    pub fn captured_frame(&self) -> Option<&CapturedFrame> {
        match self {
            State::Previewing { frame, .. }
            | State::Scanning { frame }
            | State::Result { frame, .. } => Some(frame),
            _ => None,
        }
    }

    pub fn status(&self) -> Status {
        match self {
            State::Starting => Status::info(STARTING),
            State::CameraUnavailable { error } => {
                Status::error(format!("{} ({})", CAMERA_UNAVAILABLE, error))
            }
            State::Camera { status, .. } | State::Previewing { status, .. } => status.clone(),
            State::Scanning { .. } => Status::info(SCANNING),
            State::Result { outcome, .. } => outcome_status(outcome),
            State::Closed => Status::info(""),
        }
    }
}

pub fn outcome_status(outcome: &DetectionResult) -> Status {
    match outcome {
        DetectionResult::Success { barcode } => {
            Status::success(format!("Barcode detected: {}", barcode))
        }
        DetectionResult::NotFound { message } => Status::info(message.clone()),
        DetectionResult::Failure { error } => Status::error(error.clone()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    Capture,
    Scan,
    Retry,
    Close,
}

#[derive(Debug)]
pub enum Event {
    Ui(UiEvent),
    CameraAcquireDone(Result<(u32, u32), CameraAccessError>),
    FrameCaptureDone(Result<CapturedFrame, CaptureError>),
    DetectDone(DetectionResult),
    HealthCheckDone(Result<ServiceHealth, DetectionError>),
    CameraReleased,
}

impl Event {
    /// Every effect answers with exactly one of these.
    pub fn is_effect_completion(&self) -> bool {
        !matches!(self, Event::Ui(_))
    }

    pub fn to_display_string(&self) -> String {
        match self {
            Event::FrameCaptureDone(Ok(frame)) => format!(
                "FrameCaptureDone(Ok({}x{}))",
                frame.width(),
                frame.height()
            ),
            event => format!("{:?}", event),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    AcquireCamera { constraints: StreamConstraints },
    CheckServiceHealth,
    CaptureFrame { quality: u8 },
    Detect { frame: CapturedFrame },
    ReleaseCamera,
}

impl Effect {
    pub fn to_display_string(&self) -> String {
        match self {
            Effect::Detect { frame } => {
                format!("Detect {{ {}x{} }}", frame.width(), frame.height())
            }
            effect => format!("{:?}", effect),
        }
    }
}

pub fn init(config: &Config) -> (State, Vec<Effect>) {
    (
        State::Starting,
        vec![
            Effect::AcquireCamera {
                constraints: config.stream_constraints(),
            },
            Effect::CheckServiceHealth,
        ],
    )
}

pub fn transition(config: &Config, state: State, event: Event) -> (State, Vec<Effect>) {
    match (state, event) {
        (State::Closed, _) => (State::Closed, vec![]),
        (_, Event::Ui(UiEvent::Close)) => (State::Closed, vec![Effect::ReleaseCamera]),

        // Camera acquisition
        (State::Starting, Event::CameraAcquireDone(Ok(_))) => (
            State::Camera {
                status: Status::info(PROMPT),
                capturing: false,
            },
            vec![],
        ),
        (State::Starting, Event::CameraAcquireDone(Err(error))) => {
            (State::CameraUnavailable { error }, vec![])
        }

        // Capture
        (State::Camera { status, capturing: false }, Event::Ui(UiEvent::Capture)) => (
            State::Camera {
                status,
                capturing: true,
            },
            vec![Effect::CaptureFrame {
                quality: config.jpeg_quality,
            }],
        ),
        (State::Camera { .. }, Event::FrameCaptureDone(Ok(frame))) => (
            State::Previewing {
                frame,
                status: Status::info(CAPTURED),
            },
            vec![],
        ),
        (State::Camera { .. }, Event::FrameCaptureDone(Err(error))) => (
            State::Camera {
                status: Status::error(format!("Capture failed: {}", error)),
                capturing: false,
            },
            vec![],
        ),

        // Scan
        (State::Camera { capturing, .. }, Event::Ui(UiEvent::Scan)) => (
            State::Camera {
                status: Status::error(NO_IMAGE_CAPTURED),
                capturing,
            },
            vec![],
        ),
        (State::Previewing { frame, .. }, Event::Ui(UiEvent::Scan))
        | (State::Result { frame, .. }, Event::Ui(UiEvent::Scan)) => (
            State::Scanning {
                frame: frame.clone(),
            },
            vec![Effect::Detect { frame }],
        ),
        (State::Scanning { frame }, Event::DetectDone(outcome)) => {
            (State::Result { frame, outcome }, vec![])
        }

        // Retry
        (State::Previewing { .. }, Event::Ui(UiEvent::Retry))
        | (State::Result { .. }, Event::Ui(UiEvent::Retry)) => (
            State::Camera {
                status: Status::info(PROMPT),
                capturing: false,
            },
            vec![],
        ),

        // Everything else, including presses on disabled controls and
        // health-check or release completions, leaves the state alone.
        (state, _) => (state, vec![]),
    }
}
