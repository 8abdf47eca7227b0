use crate::capture_flow::core::{Effect, Event};
use crate::captured_frame::{CaptureError, CapturedFrame};
use crate::detection_service::interface::{DetectionResult, DetectionService, ServiceHealth};
use crate::library::logger::interface::Logger;
use crate::media_source::interface::{
    CameraAccessError, CameraSession, MediaSource, StreamConstraints,
};
use crate::surface::interface::LiveSurface;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, PoisonError};

pub type SessionSlot = Arc<Mutex<Option<Box<dyn CameraSession>>>>;

#[derive(Clone)]
pub struct RunEffect {
    logger: Arc<dyn Logger + Send + Sync>,
    media_source: Arc<dyn MediaSource + Send + Sync>,
    detection_service: Arc<dyn DetectionService + Send + Sync>,
    live_surface: Arc<dyn LiveSurface + Send + Sync>,
    camera_session: SessionSlot,
    closed: Arc<AtomicBool>,
    event_sender: Sender<Event>,
}

impl RunEffect {
    pub fn new(
        logger: Arc<dyn Logger + Send + Sync>,
        media_source: Arc<dyn MediaSource + Send + Sync>,
        detection_service: Arc<dyn DetectionService + Send + Sync>,
        live_surface: Arc<dyn LiveSurface + Send + Sync>,
        event_sender: Sender<Event>,
    ) -> Self {
        Self {
            logger,
            media_source,
            detection_service,
            live_surface,
            camera_session: Arc::new(Mutex::new(None)),
            closed: Arc::new(AtomicBool::new(false)),
            event_sender,
        }
    }

    pub fn run_effect(&self, effect: Effect) {
        let _ = self
            .logger
            .info(&format!("Running effect: {}", effect.to_display_string()));

        match effect {
            Effect::AcquireCamera { constraints } => {
                let acquired = self.acquire_camera(&constraints);
                let _ = self.event_sender.send(Event::CameraAcquireDone(acquired));
            }
            Effect::CheckServiceHealth => {
                let health = self.detection_service.health();
                match &health {
                    Ok(health) => self.log_health(health),
                    Err(e) => {
                        let _ = self
                            .logger
                            .error(&format!("Service health check failed: {}", e));
                    }
                }
                let _ = self.event_sender.send(Event::HealthCheckDone(health));
            }
            Effect::CaptureFrame { quality } => {
                let captured = self.capture_frame(quality);
                if let Err(e) = &captured {
                    let _ = self.logger.error(&format!("Capture failed: {}", e));
                }
                let _ = self.event_sender.send(Event::FrameCaptureDone(captured));
            }
            Effect::Detect { frame } => {
                let detection = self.detection_service.detect(&frame);
                if let Err(e) = &detection {
                    let _ = self.logger.error(&format!("Detection failed: {}", e));
                }
                let _ = self
                    .event_sender
                    .send(Event::DetectDone(DetectionResult::from(detection)));
            }
            Effect::ReleaseCamera => {
                self.close();
                let _ = self.event_sender.send(Event::CameraReleased);
            }
        }
    }

    fn acquire_camera(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<(u32, u32), CameraAccessError> {
        // at most one session: drop whatever was held before
        self.release_camera();

        let mut session = self.media_source.request(constraints).map_err(|e| {
            let _ = self.logger.error(&format!("Error accessing camera: {}", e));
            e
        })?;
        if let Err(e) = session.attach(self.live_surface.clone()) {
            session.stop();
            return Err(e);
        }
        let resolution = session.resolution();

        {
            let mut slot = self
                .camera_session
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            // teardown may have run while the request was pending
            if self.closed.load(Ordering::SeqCst) {
                drop(slot);
                session.stop();
                let _ = self.logger.info("Camera acquired after close, stopping it");
                return Err(CameraAccessError::Other("capture flow closed".to_string()));
            }
            *slot = Some(session);
        }

        let _ = self.logger.info(&format!(
            "Camera initialized at {}x{}",
            resolution.0, resolution.1
        ));
        Ok(resolution)
    }

    fn capture_frame(&self, quality: u8) -> Result<CapturedFrame, CaptureError> {
        let image = {
            let mut slot = self
                .camera_session
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let session = slot.as_mut().ok_or(CaptureError::NoSession)?;
            session.current_frame()?
        };
        CapturedFrame::encode(&image, quality)
    }

    fn log_health(&self, health: &ServiceHealth) {
        let _ = self.logger.info(&format!(
            "Service health: status={} model_loaded={} model_path={}",
            health.status.as_deref().unwrap_or("unknown"),
            health.model_loaded,
            health.model_path.as_deref().unwrap_or("none"),
        ));
        if !health.model_loaded {
            let _ = self.logger.warn("Model not loaded on server");
        }
    }

    /// Releases the session and refuses any that is still being acquired.
    pub fn close(&self) -> bool {
        {
            let _slot = self
                .camera_session
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            self.closed.store(true, Ordering::SeqCst);
        }
        self.release_camera()
    }

    /// Stops and drops the held session. Returns whether one was held.
    fn release_camera(&self) -> bool {
        let session = self
            .camera_session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match session {
            Some(mut session) => {
                session.stop();
                true
            }
            None => false,
        }
    }

    pub fn has_camera_session(&self) -> bool {
        self.camera_session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}
