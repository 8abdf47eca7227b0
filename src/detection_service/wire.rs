use crate::detection_service::interface::{Detection, DetectionError, ServiceHealth};
use serde::{Deserialize, Serialize};

pub const DETECT_PATH: &str = "/api/detect";
pub const HEALTH_PATH: &str = "/api/health";

#[derive(Debug, Serialize)]
pub struct DetectRequest<'a> {
    pub image: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct DetectResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    barcode: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Maps an HTTP status and body from `POST /api/detect` onto a detection.
pub fn interpret_detect(status: u16, body: &str) -> Result<Detection, DetectionError> {
    if !(200..300).contains(&status) {
        let message = serde_json::from_str::<DetectResponse>(body)
            .ok()
            .and_then(|response| response.error);
        return Err(DetectionError::Service { status, message });
    }

    let response: DetectResponse = serde_json::from_str(body)
        .map_err(|e| DetectionError::MalformedResponse(e.to_string()))?;

    if response.success.unwrap_or(false) {
        match response.barcode {
            Some(barcode) => Ok(Detection::Found { barcode }),
            None => Err(DetectionError::MalformedResponse(
                "success without barcode".to_string(),
            )),
        }
    } else {
        Ok(Detection::NotFound {
            message: response.message,
        })
    }
}

pub fn interpret_health(status: u16, body: &str) -> Result<ServiceHealth, DetectionError> {
    if !(200..300).contains(&status) {
        return Err(DetectionError::Service {
            status,
            message: None,
        });
    }
    serde_json::from_str(body).map_err(|e| DetectionError::MalformedResponse(e.to_string()))
}
