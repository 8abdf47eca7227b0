use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, RgbImage};
use std::fmt;

pub const DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("no camera session is active")]
    NoSession,
    #[error("camera has not delivered a frame yet")]
    NoLiveFrame,
    #[error("camera session was stopped")]
    SessionStopped,
    #[error("failed to encode frame: {0}")]
    Encode(#[from] image::ImageError),
    #[error("payload is not a jpeg data url")]
    InvalidDataUrl,
    #[error("payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// A still image frozen from the live feed, JPEG encoded and carried as a
/// data URL so it can go straight into the detection request.
#[derive(Clone, PartialEq)]
pub struct CapturedFrame {
    data_url: String,
    width: u32,
    height: u32,
    captured_at: DateTime<Utc>,
}

impl CapturedFrame {
    pub fn encode(frame: &RgbImage, quality: u8) -> Result<Self, CaptureError> {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Err(CaptureError::NoLiveFrame);
        }

        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, quality.clamp(1, 100)).encode_image(frame)?;

        let mut data_url = String::with_capacity(DATA_URL_PREFIX.len() + jpeg.len() * 4 / 3 + 4);
        data_url.push_str(DATA_URL_PREFIX);
        STANDARD.encode_string(&jpeg, &mut data_url);

        Ok(Self {
            data_url,
            width,
            height,
            captured_at: Utc::now(),
        })
    }

    pub fn data_url(&self) -> &str {
        &self.data_url
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn jpeg_bytes(&self) -> Result<Vec<u8>, CaptureError> {
        let payload = self
            .data_url
            .strip_prefix(DATA_URL_PREFIX)
            .ok_or(CaptureError::InvalidDataUrl)?;
        Ok(STANDARD.decode(payload)?)
    }

    pub fn decode(&self) -> Result<RgbImage, CaptureError> {
        let jpeg = self.jpeg_bytes()?;
        let image = image::load_from_memory_with_format(&jpeg, ImageFormat::Jpeg)?;
        Ok(image.to_rgb8())
    }
}

impl fmt::Debug for CapturedFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data_url.len())
            .field("captured_at", &self.captured_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]))
    }

    #[test]
    fn encode_produces_jpeg_data_url_at_native_resolution() {
        let frame = CapturedFrame::encode(&gradient(64, 48), 90).unwrap();

        assert!(frame.data_url().starts_with("data:image/jpeg;base64,"));
        assert_eq!((frame.width(), frame.height()), (64, 48));

        let jpeg = frame.jpeg_bytes().unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);

        let decoded = frame.decode().unwrap();
        assert_eq!(decoded.dimensions(), (64, 48));
    }

    #[test]
    fn empty_frame_is_rejected() {
        let result = CapturedFrame::encode(&RgbImage::new(0, 0), 90);

        assert!(matches!(result, Err(CaptureError::NoLiveFrame)));
    }

    #[test]
    fn lower_quality_gives_smaller_payload() {
        let image = gradient(128, 128);
        let high = CapturedFrame::encode(&image, 95).unwrap();
        let low = CapturedFrame::encode(&image, 10).unwrap();

        assert!(low.data_url().len() < high.data_url().len());
    }

    #[test]
    fn debug_output_elides_payload() {
        let frame = CapturedFrame::encode(&gradient(8, 8), 90).unwrap();
        let debug = format!("{:?}", frame);

        assert!(debug.contains("width: 8"));
        assert!(!debug.contains("base64"));
    }
}
