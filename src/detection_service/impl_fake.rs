use crate::captured_frame::CapturedFrame;
use crate::detection_service::interface::{
    Detection, DetectionError, DetectionService, ServiceHealth,
};
use crate::library::logger::interface::Logger;
use rand::Rng;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};

/// Stand-in for the remote service. Replays scripted responses in order and
/// falls back to random outcomes once the script runs out.
pub struct DetectionServiceFake {
    logger: Arc<dyn Logger + Send + Sync>,
    script: Mutex<VecDeque<Result<Detection, DetectionError>>>,
    health: Result<ServiceHealth, DetectionError>,
    gate: Mutex<Option<Receiver<()>>>,
    calls: AtomicUsize,
}

impl DetectionServiceFake {
    pub fn new(logger: Arc<dyn Logger + Send + Sync>) -> Self {
        Self {
            logger: logger.with_namespace("detection_service").with_namespace("fake"),
            script: Mutex::new(VecDeque::new()),
            health: Ok(ServiceHealth {
                status: Some("healthy".to_string()),
                model_loaded: true,
                model_path: None,
            }),
            gate: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn scripted(
        logger: Arc<dyn Logger + Send + Sync>,
        responses: Vec<Result<Detection, DetectionError>>,
    ) -> Self {
        let fake = Self::new(logger);
        *fake.script.lock().unwrap_or_else(PoisonError::into_inner) = responses.into();
        fake
    }

    pub fn with_health(mut self, health: Result<ServiceHealth, DetectionError>) -> Self {
        self.health = health;
        self
    }

    /// Makes every `detect` call block until the returned sender fires once.
    pub fn hold_responses(&self) -> Sender<()> {
        let (tx, rx) = channel();
        *self.gate.lock().unwrap_or_else(PoisonError::into_inner) = Some(rx);
        tx
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn random_detection() -> Detection {
        let mut rng = rand::rng();
        if rng.random_bool(0.7) {
            let barcode: String = (0..13)
                .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
                .collect();
            Detection::Found { barcode }
        } else {
            Detection::NotFound {
                message: Some("No barcode detected in image".to_string()),
            }
        }
    }
}

impl DetectionService for DetectionServiceFake {
    fn detect(&self, frame: &CapturedFrame) -> Result<Detection, DetectionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let _ = self.logger.info(&format!(
            "Detecting on {}x{} frame",
            frame.width(),
            frame.height()
        ));

        if let Some(gate) = self.gate.lock().unwrap_or_else(PoisonError::into_inner).as_ref() {
            let _ = gate.recv();
        }

        let scripted = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        scripted.unwrap_or_else(|| Ok(Self::random_detection()))
    }

    fn health(&self) -> Result<ServiceHealth, DetectionError> {
        self.health.clone()
    }
}
