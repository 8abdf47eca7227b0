use crate::media_source::interface::{Facing, StreamConstraints};
use chrono::Offset;
use serde::Deserialize;
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = "barcode-capture";
pub const ENV_PREFIX: &str = "BARCODE_CAPTURE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraBackend {
    Fake,
    #[cfg(feature = "webcam")]
    Webcam,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionBackend {
    Http,
    Fake,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub service_base_url: String,
    pub request_timeout: Option<Duration>,
    pub camera_backend: CameraBackend,
    pub detection_backend: DetectionBackend,
    pub camera_index: Option<u32>,
    pub facing: Facing,
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub jpeg_quality: u8,
    pub live_frame_interval: Duration,
    pub logger_timezone: chrono::FixedOffset,
    pub fake_barcode: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_base_url: "http://127.0.0.1:5000".to_string(),
            request_timeout: None,
            camera_backend: CameraBackend::Fake,
            detection_backend: DetectionBackend::Http,
            camera_index: None,
            facing: Facing::Environment,
            ideal_width: 1280,
            ideal_height: 720,
            jpeg_quality: 90,
            live_frame_interval: Duration::from_millis(33),
            logger_timezone: chrono::Utc.fix(),
            fake_barcode: "012345678905".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Source(#[from] ::config::ConfigError),
    #[error("invalid utc offset: {0} hours")]
    UtcOffset(i32),
    #[error("jpeg quality must be between 1 and 100, got {0}")]
    JpegQuality(u8),
}

/// Optional overrides read from `barcode-capture.toml`.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    service_base_url: Option<String>,
    request_timeout_secs: Option<u64>,
    camera_backend: Option<CameraBackend>,
    detection_backend: Option<DetectionBackend>,
    camera_index: Option<u32>,
    facing: Option<Facing>,
    ideal_width: Option<u32>,
    ideal_height: Option<u32>,
    jpeg_quality: Option<u8>,
    live_frame_interval_ms: Option<u64>,
    logger_utc_offset_hours: Option<i32>,
    fake_barcode: Option<String>,
}

/// Values stay strings; numeric fields convert on deserialize.
fn environment() -> ::config::Environment {
    ::config::Environment::with_prefix(ENV_PREFIX)
}

impl Config {
    /// Defaults, then `barcode-capture.toml` if present, then
    /// `BARCODE_CAPTURE_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::with_name(CONFIG_FILE_NAME).required(false))
            .add_source(environment())
            .build()?;
        let file: FileConfig = settings.try_deserialize()?;
        Self::default().merge(file)
    }

    #[cfg(test)]
    pub fn from_env_vars(vars: ::config::Map<String, String>) -> Result<Self, ConfigError> {
        let settings = ::config::Config::builder()
            .add_source(environment().source(Some(vars)))
            .build()?;
        let file: FileConfig = settings.try_deserialize()?;
        Self::default().merge(file)
    }

    #[cfg(test)]
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from_str(source, ::config::FileFormat::Toml))
            .build()?;
        let file: FileConfig = settings.try_deserialize()?;
        Self::default().merge(file)
    }

    fn merge(mut self, file: FileConfig) -> Result<Self, ConfigError> {
        if let Some(url) = file.service_base_url {
            self.service_base_url = url;
        }
        if let Some(secs) = file.request_timeout_secs {
            self.request_timeout = Some(Duration::from_secs(secs));
        }
        if let Some(backend) = file.camera_backend {
            self.camera_backend = backend;
        }
        if let Some(backend) = file.detection_backend {
            self.detection_backend = backend;
        }
        if file.camera_index.is_some() {
            self.camera_index = file.camera_index;
        }
        if let Some(facing) = file.facing {
            self.facing = facing;
        }
        if let Some(width) = file.ideal_width {
            self.ideal_width = width;
        }
        if let Some(height) = file.ideal_height {
            self.ideal_height = height;
        }
        if let Some(quality) = file.jpeg_quality {
            if !(1..=100).contains(&quality) {
                return Err(ConfigError::JpegQuality(quality));
            }
            self.jpeg_quality = quality;
        }
        if let Some(ms) = file.live_frame_interval_ms {
            self.live_frame_interval = Duration::from_millis(ms);
        }
        if let Some(hours) = file.logger_utc_offset_hours {
            self.logger_timezone = hours
                .checked_mul(3600)
                .and_then(chrono::FixedOffset::east_opt)
                .ok_or(ConfigError::UtcOffset(hours))?;
        }
        if let Some(barcode) = file.fake_barcode {
            self.fake_barcode = barcode;
        }
        Ok(self)
    }

    pub fn stream_constraints(&self) -> StreamConstraints {
        StreamConstraints {
            facing: self.facing,
            ideal_width: self.ideal_width,
            ideal_height: self.ideal_height,
            device_index: self.camera_index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_local_service_at_720p() {
        let config = Config::default();

        assert_eq!(config.service_base_url, "http://127.0.0.1:5000");
        assert_eq!(config.request_timeout, None);
        assert_eq!(config.jpeg_quality, 90);
        assert_eq!(
            config.stream_constraints(),
            StreamConstraints {
                facing: Facing::Environment,
                ideal_width: 1280,
                ideal_height: 720,
                device_index: None,
            }
        );
    }

    #[test]
    fn toml_overrides_are_layered_on_defaults() {
        let config = Config::from_toml(
            r#"
            service_base_url = "http://scanner.local:8080"
            detection_backend = "fake"
            facing = "user"
            jpeg_quality = 75
            request_timeout_secs = 10
            logger_utc_offset_hours = -7
            "#,
        )
        .unwrap();

        assert_eq!(config.service_base_url, "http://scanner.local:8080");
        assert_eq!(config.detection_backend, DetectionBackend::Fake);
        assert_eq!(config.facing, Facing::User);
        assert_eq!(config.jpeg_quality, 75);
        assert_eq!(config.request_timeout, Some(Duration::from_secs(10)));
        assert_eq!(config.logger_timezone.local_minus_utc(), -7 * 3600);
        assert_eq!(config.ideal_width, 1280);
    }

    #[test]
    fn out_of_range_quality_is_rejected() {
        let result = Config::from_toml("jpeg_quality = 0");

        assert!(matches!(result, Err(ConfigError::JpegQuality(0))));
    }

    #[test]
    fn out_of_range_offset_is_rejected() {
        let result = Config::from_toml("logger_utc_offset_hours = 30");

        assert!(matches!(result, Err(ConfigError::UtcOffset(30))));
    }

    #[test]
    fn environment_keeps_barcode_digits_as_text() {
        let mut vars: ::config::Map<String, String> = ::config::Map::new();
        vars.insert(
            "BARCODE_CAPTURE_FAKE_BARCODE".to_string(),
            "012345678905".to_string(),
        );
        vars.insert("BARCODE_CAPTURE_JPEG_QUALITY".to_string(), "70".to_string());
        vars.insert(
            "BARCODE_CAPTURE_DETECTION_BACKEND".to_string(),
            "fake".to_string(),
        );

        let config = Config::from_env_vars(vars).unwrap();

        assert_eq!(config.fake_barcode, "012345678905");
        assert_eq!(config.jpeg_quality, 70);
        assert_eq!(config.detection_backend, DetectionBackend::Fake);
    }
}
