use crate::captured_frame::CapturedFrame;
use serde::Deserialize;

pub const NO_BARCODE_MESSAGE: &str = "No barcode detected";
pub const ANALYSIS_ERROR_MESSAGE: &str = "Error while analysing the image";
pub const CONNECTION_ERROR_MESSAGE: &str = "Could not connect to the server";

/// A well-formed answer from the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    Found { barcode: String },
    NotFound { message: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DetectionError {
    #[error("network error: {0}")]
    Network(String),
    #[error("service responded with status {status}")]
    Service { status: u16, message: Option<String> },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Outcome of one scan as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionResult {
    Success { barcode: String },
    NotFound { message: String },
    Failure { error: String },
}

impl From<Result<Detection, DetectionError>> for DetectionResult {
    fn from(result: Result<Detection, DetectionError>) -> Self {
        match result {
            Ok(Detection::Found { barcode }) => DetectionResult::Success { barcode },
            Ok(Detection::NotFound { message }) => DetectionResult::NotFound {
                message: message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| NO_BARCODE_MESSAGE.to_string()),
            },
            Err(DetectionError::Network(_)) => DetectionResult::Failure {
                error: CONNECTION_ERROR_MESSAGE.to_string(),
            },
            Err(DetectionError::Service { message, .. }) => DetectionResult::Failure {
                error: message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| ANALYSIS_ERROR_MESSAGE.to_string()),
            },
            Err(DetectionError::MalformedResponse(_)) => DetectionResult::Failure {
                error: ANALYSIS_ERROR_MESSAGE.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceHealth {
    #[serde(default)]
    pub status: Option<String>,
    pub model_loaded: bool,
    #[serde(default)]
    pub model_path: Option<String>,
}

pub trait DetectionService: Send + Sync {
    fn detect(&self, frame: &CapturedFrame) -> Result<Detection, DetectionError>;
    fn health(&self) -> Result<ServiceHealth, DetectionError>;
}
