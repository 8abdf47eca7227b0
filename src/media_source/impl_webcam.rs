use crate::captured_frame::CaptureError;
use crate::library::logger::interface::Logger;
use crate::media_source::interface::{
    CameraAccessError, CameraSession, Facing, MediaSource, StreamConstraints,
};
use crate::surface::interface::LiveSurface;
use image::RgbImage;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    ApiBackend, CameraFormat, CameraIndex, CameraInfo, FrameFormat, RequestedFormat,
    RequestedFormatType, Resolution,
};
use nokhwa::{Camera, NokhwaError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

type SharedSurface = Arc<Mutex<Option<Arc<dyn LiveSurface + Send + Sync>>>>;

pub struct MediaSourceWebcam {
    logger: Arc<dyn Logger + Send + Sync>,
    frame_interval: Duration,
}

impl MediaSourceWebcam {
    pub fn new(logger: Arc<dyn Logger + Send + Sync>, frame_interval: Duration) -> Self {
        Self {
            logger: logger.with_namespace("media_source").with_namespace("webcam"),
            frame_interval,
        }
    }
}

impl MediaSource for MediaSourceWebcam {
    fn request(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn CameraSession>, CameraAccessError> {
        let devices = nokhwa::query(ApiBackend::Auto).map_err(access_error)?;
        if devices.is_empty() {
            return Err(CameraAccessError::NoDevice);
        }

        let index = match constraints.device_index {
            Some(index) => CameraIndex::Index(index),
            None => pick_by_facing(&devices, constraints.facing),
        };
        let _ = self.logger.info(&format!("Opening camera {}", index));

        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
            CameraFormat::new(
                Resolution::new(constraints.ideal_width, constraints.ideal_height),
                FrameFormat::MJPEG,
                30,
            ),
        ));

        let latest = Arc::new(Mutex::new(None));
        let surface: SharedSurface = Arc::new(Mutex::new(None));
        let running = Arc::new(AtomicBool::new(true));
        let (ready_tx, ready_rx) = mpsc::channel();

        // The device handle never leaves this thread.
        let handle = {
            let latest = Arc::clone(&latest);
            let surface = Arc::clone(&surface);
            let running = Arc::clone(&running);
            let logger = self.logger.clone();
            let frame_interval = self.frame_interval;
            std::thread::spawn(move || {
                let mut camera = match Camera::new(index, requested) {
                    Ok(camera) => camera,
                    Err(e) => {
                        let _ = ready_tx.send(Err(access_error(e)));
                        return;
                    }
                };
                if let Err(e) = camera.open_stream() {
                    let _ = ready_tx.send(Err(access_error(e)));
                    return;
                }
                let resolution = camera.resolution();
                let _ = ready_tx.send(Ok((resolution.width(), resolution.height())));

                while running.load(Ordering::Acquire) {
                    match read_frame(&mut camera) {
                        Ok(frame) => {
                            if let Some(surface) =
                                surface.lock().unwrap_or_else(PoisonError::into_inner).as_ref()
                            {
                                surface.present(&frame);
                            }
                            *latest.lock().unwrap_or_else(PoisonError::into_inner) = Some(frame);
                        }
                        Err(e) => {
                            let _ = logger.warn(&format!("Dropped frame: {}", e));
                        }
                    }
                    std::thread::sleep(frame_interval);
                }

                if let Err(e) = camera.stop_stream() {
                    let _ = logger.warn(&format!("Failed to stop stream: {}", e));
                }
            })
        };

        let resolution = ready_rx
            .recv()
            .map_err(|_| CameraAccessError::Other("capture thread exited".to_string()))??;
        let _ = self.logger.info(&format!(
            "Camera streaming at {}x{}",
            resolution.0, resolution.1
        ));

        Ok(Box::new(WebcamSession {
            logger: self.logger.clone(),
            resolution,
            latest,
            surface,
            running,
            handle: Some(handle),
        }))
    }
}

pub struct WebcamSession {
    logger: Arc<dyn Logger + Send + Sync>,
    resolution: (u32, u32),
    latest: Arc<Mutex<Option<RgbImage>>>,
    surface: SharedSurface,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl CameraSession for WebcamSession {
    fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    fn attach(
        &mut self,
        surface: Arc<dyn LiveSurface + Send + Sync>,
    ) -> Result<(), CameraAccessError> {
        *self.surface.lock().unwrap_or_else(PoisonError::into_inner) = Some(surface);
        Ok(())
    }

    fn current_frame(&mut self) -> Result<RgbImage, CaptureError> {
        if self.handle.is_none() {
            return Err(CaptureError::SessionStopped);
        }
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(CaptureError::NoLiveFrame)
    }

    fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        self.running.store(false, Ordering::Release);
        *self.surface.lock().unwrap_or_else(PoisonError::into_inner) = None;
        if handle.join().is_err() {
            let _ = self.logger.error("Capture thread panicked");
        }
        let _ = self.logger.info("Camera stopped");
    }
}

impl Drop for WebcamSession {
    fn drop(&mut self) {
        self.stop();
    }
}

fn read_frame(camera: &mut Camera) -> Result<RgbImage, NokhwaError> {
    let decoded = camera.frame()?.decode_image::<RgbFormat>()?;
    let (width, height) = (decoded.width(), decoded.height());
    RgbImage::from_raw(width, height, decoded.into_raw()).ok_or_else(|| {
        NokhwaError::ProcessFrameError {
            src: FrameFormat::RAWRGB,
            destination: "RgbImage".to_string(),
            error: "buffer size mismatch".to_string(),
        }
    })
}

fn pick_by_facing(devices: &[CameraInfo], facing: Facing) -> CameraIndex {
    let keywords: &[&str] = match facing {
        Facing::Environment => &["back", "rear", "environment"],
        Facing::User => &["front", "user", "facetime"],
    };
    devices
        .iter()
        .find(|info| {
            let name = info.human_name().to_lowercase();
            keywords.iter().any(|k| name.contains(k))
        })
        .or_else(|| devices.first())
        .map(|info| info.index().clone())
        .unwrap_or(CameraIndex::Index(0))
}

fn access_error(error: NokhwaError) -> CameraAccessError {
    let message = error.to_string();
    let lowered = message.to_lowercase();
    if lowered.contains("permission") || lowered.contains("denied") {
        CameraAccessError::PermissionDenied
    } else if lowered.contains("no such device") || lowered.contains("not found") {
        CameraAccessError::NoDevice
    } else {
        CameraAccessError::Other(message)
    }
}
