use crate::capture_flow::core::{init, transition, Effect, Event, State, UiEvent};
use crate::capture_flow::render::Render;
use crate::capture_flow::run_effect::RunEffect;
use crate::config::Config;
use crate::detection_service::interface::DetectionService;
use crate::library::logger::interface::Logger;
use crate::media_source::interface::MediaSource;
use crate::surface::interface::Surfaces;
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Owns the camera session, the captured frame and the one outstanding
/// request. Events come in through a single channel and are applied in order.
pub struct CaptureFlow {
    config: Config,
    logger: Arc<dyn Logger + Send + Sync>,
    state: State,
    render: Render,
    run_effect: RunEffect,
    event_sender: Sender<Event>,
    event_receiver: Receiver<Event>,
    in_flight: usize,
}

impl CaptureFlow {
    pub fn new(
        config: Config,
        logger: Arc<dyn Logger + Send + Sync>,
        media_source: Arc<dyn MediaSource + Send + Sync>,
        detection_service: Arc<dyn DetectionService + Send + Sync>,
        surfaces: Surfaces,
    ) -> Self {
        let (event_sender, event_receiver) = channel();
        let logger = logger.with_namespace("capture_flow");
        let run_effect = RunEffect::new(
            logger.with_namespace("effect"),
            media_source,
            detection_service,
            surfaces.live.clone(),
            event_sender.clone(),
        );

        Self {
            config,
            logger,
            state: State::Starting,
            render: Render::new(surfaces),
            run_effect,
            event_sender,
            event_receiver,
            in_flight: 0,
        }
    }

    /// Handle for the UI to feed button presses into the controller.
    pub fn events(&self) -> Sender<Event> {
        self.event_sender.clone()
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn has_camera_session(&self) -> bool {
        self.run_effect.has_camera_session()
    }

    pub fn initialize(&mut self) {
        let (state, effects) = init(&self.config);
        self.state = state;
        self.render.render(&self.state);
        self.spawn_effects(effects);
    }

    pub fn capture_frame(&mut self) {
        self.dispatch(Event::Ui(UiEvent::Capture));
    }

    pub fn scan(&mut self) {
        self.dispatch(Event::Ui(UiEvent::Scan));
    }

    pub fn retry(&mut self) {
        self.dispatch(Event::Ui(UiEvent::Retry));
    }

    pub fn check_service_health(&mut self) {
        self.spawn_effects(vec![Effect::CheckServiceHealth]);
    }

    /// Releases the camera and closes the flow. Safe to call repeatedly.
    pub fn teardown(&mut self) {
        self.dispatch(Event::Ui(UiEvent::Close));
        self.run_effect.close();
    }

    /// Processes events until the flow is closed.
    pub fn run(&mut self) {
        while !matches!(self.state, State::Closed) {
            match self.event_receiver.recv() {
                Ok(event) => self.dispatch(event),
                Err(_) => break,
            }
        }
        let _ = self.logger.info("Capture flow closed");
    }

    /// Applies the next queued event, waiting at most `timeout` for one.
    pub fn process_next(&mut self, timeout: Duration) -> bool {
        match self.event_receiver.recv_timeout(timeout) {
            Ok(event) => {
                self.dispatch(event);
                true
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => false,
        }
    }

    /// Processes events until no effect is outstanding. Returns false if that
    /// did not happen within `timeout`.
    pub fn settle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.in_flight > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() || !self.process_next(remaining) {
                return self.in_flight == 0;
            }
        }
        true
    }

    fn dispatch(&mut self, event: Event) {
        if event.is_effect_completion() {
            self.in_flight = self.in_flight.saturating_sub(1);
        }

        let _ = self.logger.info(&format!(
            "\nold state:\n\t{:?}\n\nevent:\n\t{}",
            self.state.phase(),
            event.to_display_string(),
        ));

        let state = std::mem::replace(&mut self.state, State::Closed);
        let (new_state, effects) = transition(&self.config, state, event);
        self.state = new_state;

        let _ = self.logger.info(&format!(
            "\nnew state:\n\t{:?}\n\neffects:\n\t{:?}",
            self.state.phase(),
            effects
                .iter()
                .map(Effect::to_display_string)
                .collect::<Vec<_>>()
        ));

        self.render.render(&self.state);
        self.spawn_effects(effects);
    }

    fn spawn_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            self.in_flight += 1;
            // release has to be finished by the time teardown returns
            if matches!(effect, Effect::ReleaseCamera) {
                self.run_effect.run_effect(effect);
                continue;
            }
            let run_effect = self.run_effect.clone();
            std::thread::spawn(move || run_effect.run_effect(effect));
        }
    }
}

impl Drop for CaptureFlow {
    fn drop(&mut self) {
        self.run_effect.close();
    }
}
