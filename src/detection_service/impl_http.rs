use crate::captured_frame::CapturedFrame;
use crate::detection_service::interface::{
    Detection, DetectionError, DetectionService, ServiceHealth,
};
use crate::detection_service::wire::{
    interpret_detect, interpret_health, DetectRequest, DETECT_PATH, HEALTH_PATH,
};
use crate::library::logger::interface::Logger;
use reqwest::blocking::Client;
use std::sync::Arc;
use std::time::Duration;

pub struct DetectionServiceHttp {
    base_url: String,
    client: Client,
    logger: Arc<dyn Logger + Send + Sync>,
}

impl DetectionServiceHttp {
    /// `timeout: None` waits for the service indefinitely.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Option<Duration>,
        logger: Arc<dyn Logger + Send + Sync>,
    ) -> Result<Self, DetectionError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DetectionError::Network(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into(),
            client,
            logger: logger.with_namespace("detection_service").with_namespace("http"),
        })
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

impl DetectionService for DetectionServiceHttp {
    fn detect(&self, frame: &CapturedFrame) -> Result<Detection, DetectionError> {
        let url = self.url_for(DETECT_PATH);
        let _ = self.logger.info(&format!(
            "POST {} ({}x{}, {} bytes)",
            url,
            frame.width(),
            frame.height(),
            frame.data_url().len()
        ));

        let response = self
            .client
            .post(&url)
            .json(&DetectRequest {
                image: frame.data_url(),
            })
            .send()
            .map_err(|e| DetectionError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| DetectionError::Network(e.to_string()))?;
        let _ = self.logger.info(&format!("{} responded {}", url, status));

        interpret_detect(status, &body)
    }

    fn health(&self) -> Result<ServiceHealth, DetectionError> {
        let url = self.url_for(HEALTH_PATH);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| DetectionError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| DetectionError::Network(e.to_string()))?;

        interpret_health(status, &body)
    }
}
