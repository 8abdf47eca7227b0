use crate::capture_flow::core::{Event, UiEvent};
use crate::capture_flow::main::CaptureFlow;
use crate::config::{CameraBackend, Config, DetectionBackend};
use crate::detection_service::impl_fake::DetectionServiceFake;
use crate::detection_service::impl_http::DetectionServiceHttp;
use crate::detection_service::interface::DetectionService;
use crate::library::logger::impl_console::LoggerConsole;
use crate::library::logger::interface::Logger;
use crate::media_source::impl_fake::MediaSourceFake;
use crate::media_source::interface::MediaSource;
use crate::surface::impl_gui::GuiScreen;
use crate::surface::interface::Surfaces;
use std::sync::Arc;

mod capture_flow;
mod captured_frame;
mod config;
mod detection_service;
mod library;
mod media_source;
mod surface;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    let logger: Arc<dyn Logger + Send + Sync> = Arc::new(LoggerConsole::new(config.logger_timezone));

    let media_source: Arc<dyn MediaSource + Send + Sync> = match config.camera_backend {
        CameraBackend::Fake => Arc::new(MediaSourceFake::new(
            logger.clone(),
            config.fake_barcode.clone(),
        )),
        #[cfg(feature = "webcam")]
        CameraBackend::Webcam => Arc::new(media_source::impl_webcam::MediaSourceWebcam::new(
            logger.clone(),
            config.live_frame_interval,
        )),
    };

    let detection_service: Arc<dyn DetectionService + Send + Sync> =
        match config.detection_backend {
            DetectionBackend::Http => Arc::new(DetectionServiceHttp::new(
                &config.service_base_url,
                config.request_timeout,
                logger.clone(),
            )?),
            DetectionBackend::Fake => Arc::new(DetectionServiceFake::new(logger.clone())),
        };

    let _ = logger.info(&format!(
        "Starting with camera={:?} detection={:?} service={}",
        config.camera_backend, config.detection_backend, config.service_base_url
    ));

    let screen = Arc::new(GuiScreen::new());

    let mut flow = CaptureFlow::new(
        config,
        logger.clone(),
        media_source,
        detection_service,
        Surfaces::from_screen(screen.clone()),
    );
    let events = flow.events();

    let controller = std::thread::spawn(move || {
        flow.initialize();
        flow.run();
    });

    let gui_result = surface::impl_gui::run(screen, events.clone());

    let _ = events.send(Event::Ui(UiEvent::Close));
    controller
        .join()
        .map_err(|_| "capture flow thread panicked")?;

    gui_result?;

    Ok(())
}
