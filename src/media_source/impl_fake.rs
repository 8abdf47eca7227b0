use crate::captured_frame::CaptureError;
use crate::library::logger::interface::Logger;
use crate::media_source::interface::{
    CameraAccessError, CameraSession, MediaSource, StreamConstraints,
};
use crate::surface::interface::LiveSurface;
use image::{Rgb, RgbImage};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};

/// Counts shared between the fake source and the sessions it hands out.
#[derive(Debug, Default)]
pub struct CameraStats {
    pub requested: AtomicUsize,
    pub stopped: AtomicUsize,
}

impl CameraStats {
    pub fn requested(&self) -> usize {
        self.requested.load(Ordering::SeqCst)
    }

    pub fn stopped(&self) -> usize {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn active(&self) -> usize {
        self.requested().saturating_sub(self.stopped())
    }
}

/// Camera without hardware: every frame shows bars derived from `barcode`.
pub struct MediaSourceFake {
    logger: Arc<dyn Logger + Send + Sync>,
    barcode: String,
    failure: Option<CameraAccessError>,
    stats: Arc<CameraStats>,
    gate: Mutex<Option<Receiver<()>>>,
}

impl MediaSourceFake {
    pub fn new(logger: Arc<dyn Logger + Send + Sync>, barcode: impl Into<String>) -> Self {
        Self {
            logger: logger.with_namespace("media_source").with_namespace("fake"),
            barcode: barcode.into(),
            failure: None,
            stats: Arc::new(CameraStats::default()),
            gate: Mutex::new(None),
        }
    }

    pub fn failing_with(mut self, error: CameraAccessError) -> Self {
        self.failure = Some(error);
        self
    }

    /// Makes every `request` block until the returned sender fires once.
    pub fn hold_requests(&self) -> Sender<()> {
        let (tx, rx) = channel();
        *self.gate.lock().unwrap_or_else(PoisonError::into_inner) = Some(rx);
        tx
    }

    pub fn stats(&self) -> Arc<CameraStats> {
        Arc::clone(&self.stats)
    }
}

impl MediaSource for MediaSourceFake {
    fn request(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn CameraSession>, CameraAccessError> {
        let _ = self.logger.info(&format!(
            "Requesting {:?} camera at {}x{}",
            constraints.facing, constraints.ideal_width, constraints.ideal_height
        ));

        if let Some(gate) = self.gate.lock().unwrap_or_else(PoisonError::into_inner).as_ref() {
            let _ = gate.recv();
        }

        if let Some(error) = &self.failure {
            let _ = self.logger.error(&format!("Camera request failed: {}", error));
            return Err(error.clone());
        }

        self.stats.requested.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(CameraSessionFake {
            logger: self.logger.clone(),
            frame: synthetic_barcode(
                constraints.ideal_width,
                constraints.ideal_height,
                &self.barcode,
            ),
            surface: None,
            stopped: false,
            stats: Arc::clone(&self.stats),
        }))
    }
}

pub struct CameraSessionFake {
    logger: Arc<dyn Logger + Send + Sync>,
    frame: RgbImage,
    surface: Option<Arc<dyn LiveSurface + Send + Sync>>,
    stopped: bool,
    stats: Arc<CameraStats>,
}

impl CameraSession for CameraSessionFake {
    fn resolution(&self) -> (u32, u32) {
        self.frame.dimensions()
    }

    fn attach(
        &mut self,
        surface: Arc<dyn LiveSurface + Send + Sync>,
    ) -> Result<(), CameraAccessError> {
        if self.stopped {
            return Err(CameraAccessError::Other("session stopped".to_string()));
        }
        surface.present(&self.frame);
        self.surface = Some(surface);
        Ok(())
    }

    fn current_frame(&mut self) -> Result<RgbImage, CaptureError> {
        if self.stopped {
            return Err(CaptureError::SessionStopped);
        }
        Ok(self.frame.clone())
    }

    fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.surface = None;
        self.stats.stopped.fetch_add(1, Ordering::SeqCst);
        let _ = self.logger.info("Camera stopped");
    }
}

/// White frame with a band of vertical bars, four per digit, one bar for each
/// set bit of the digit.
pub fn synthetic_barcode(width: u32, height: u32, digits: &str) -> RgbImage {
    let mut image = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
    let digits: Vec<u32> = digits.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.is_empty() || width == 0 || height == 0 {
        return image;
    }

    let slot = width / (digits.len() as u32 * 2 + 2);
    let bar = (slot / 4).max(1);
    let (top, bottom) = (height / 4, height * 3 / 4);

    let mut x_offset = slot;
    for digit in digits {
        for bit in 0..4 {
            if (digit >> bit) & 1 == 1 {
                let x0 = x_offset + bit * bar;
                for x in x0..(x0 + bar).min(width) {
                    for y in top..bottom {
                        image.put_pixel(x, y, Rgb([0, 0, 0]));
                    }
                }
            }
        }
        x_offset += slot * 2;
    }

    image
}
