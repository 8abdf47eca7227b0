use crate::capture_flow::core::{Event, UiEvent};
use crate::captured_frame::CapturedFrame;
use crate::surface::interface::{
    BusyIndicator, Control, ControlPanel, ControlState, LiveSurface, PreviewSurface, Status,
    StatusSurface, Tone,
};
use eframe::egui;
use image::RgbImage;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

struct Picture {
    generation: u64,
    image: egui::ColorImage,
}

struct GuiModel {
    live_visible: bool,
    live: Option<Picture>,
    preview: Option<Picture>,
    preview_key: Option<(chrono::DateTime<chrono::Utc>, usize)>,
    status: Status,
    busy: bool,
    capture: ControlState,
    scan: ControlState,
    retry: ControlState,
    generation: u64,
}

impl Default for GuiModel {
    fn default() -> Self {
        Self {
            live_visible: true,
            live: None,
            preview: None,
            preview_key: None,
            status: Status::info(""),
            busy: false,
            capture: ControlState::Hidden,
            scan: ControlState::Hidden,
            retry: ControlState::Hidden,
            generation: 0,
        }
    }
}

/// Window-backed screen. Implements every render port; the controller writes
/// into the shared model and the egui thread draws it.
#[derive(Default)]
pub struct GuiScreen {
    model: Mutex<GuiModel>,
    context: Mutex<Option<egui::Context>>,
}

impl GuiScreen {
    pub fn new() -> Self {
        Self::default()
    }

    fn update(&self, f: impl FnOnce(&mut GuiModel)) {
        f(&mut self.model.lock().unwrap_or_else(PoisonError::into_inner));
        if let Some(context) = self
            .context
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            context.request_repaint();
        }
    }

    fn attach_context(&self, context: egui::Context) {
        *self.context.lock().unwrap_or_else(PoisonError::into_inner) = Some(context);
    }
}

fn to_color_image(frame: &RgbImage) -> egui::ColorImage {
    let size = [frame.width() as usize, frame.height() as usize];
    egui::ColorImage::from_rgb(size, frame.as_raw())
}

impl LiveSurface for GuiScreen {
    fn present(&self, frame: &RgbImage) {
        let image = to_color_image(frame);
        self.update(|model| {
            model.generation += 1;
            model.live = Some(Picture {
                generation: model.generation,
                image,
            });
        });
    }

    fn set_visible(&self, visible: bool) {
        self.update(|model| model.live_visible = visible);
    }
}

impl PreviewSurface for GuiScreen {
    fn show(&self, frame: Option<&CapturedFrame>) {
        let key = frame.map(|f| (f.captured_at(), f.data_url().len()));
        if self
            .model
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .preview_key
            == key
        {
            return;
        }

        let image = frame
            .and_then(|f| f.decode().ok())
            .map(|decoded| to_color_image(&decoded));
        self.update(|model| {
            model.preview_key = key;
            model.generation += 1;
            model.preview = image.map(|image| Picture {
                generation: model.generation,
                image,
            });
        });
    }
}

impl StatusSurface for GuiScreen {
    fn set_status(&self, status: &Status) {
        let status = status.clone();
        self.update(|model| model.status = status);
    }
}

impl BusyIndicator for GuiScreen {
    fn set_busy(&self, busy: bool) {
        self.update(|model| model.busy = busy);
    }
}

impl ControlPanel for GuiScreen {
    fn set_control(&self, control: Control, state: ControlState) {
        self.update(|model| match control {
            Control::Capture => model.capture = state,
            Control::Scan => model.scan = state,
            Control::Retry => model.retry = state,
        });
    }
}

#[derive(Default)]
struct Texture {
    generation: u64,
    handle: Option<egui::TextureHandle>,
}

impl Texture {
    fn sync(&mut self, ctx: &egui::Context, name: &str, picture: &Picture) -> &egui::TextureHandle {
        if let Some(handle) = self.handle.as_mut() {
            if self.generation != picture.generation {
                handle.set(picture.image.clone(), egui::TextureOptions::LINEAR);
            }
        }
        self.generation = picture.generation;
        self.handle.get_or_insert_with(|| {
            ctx.load_texture(name, picture.image.clone(), egui::TextureOptions::LINEAR)
        })
    }
}

struct CaptureWindow {
    screen: Arc<GuiScreen>,
    events: Sender<Event>,
    live_texture: Texture,
    preview_texture: Texture,
}

impl CaptureWindow {
    fn send(&self, event: UiEvent) {
        let _ = self.events.send(Event::Ui(event));
    }
}

fn draw_picture(ui: &mut egui::Ui, texture: &egui::TextureHandle) {
    let [width, height] = texture.size();
    let scale = (ui.available_width() / width.max(1) as f32).min(1.0);
    let size = egui::vec2(width as f32 * scale, height as f32 * scale);
    ui.add(egui::Image::new(egui::load::SizedTexture::new(
        texture.id(),
        size,
    )));
}

fn status_color(tone: Tone) -> egui::Color32 {
    match tone {
        Tone::Info => egui::Color32::from_rgb(60, 60, 60),
        Tone::Success => egui::Color32::from_rgb(30, 130, 60),
        Tone::Error => egui::Color32::from_rgb(190, 40, 40),
    }
}

fn control_button(ui: &mut egui::Ui, state: ControlState, label: &str) -> bool {
    match state {
        ControlState::Hidden => false,
        ControlState::Enabled => ui.add(egui::Button::new(label)).clicked(),
        ControlState::Disabled => ui.add_enabled(false, egui::Button::new(label)).clicked(),
    }
}

impl eframe::App for CaptureWindow {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut pressed = Vec::new();

        {
            let model = self
                .screen
                .model
                .lock()
                .unwrap_or_else(PoisonError::into_inner);

            egui::CentralPanel::default().show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.heading("Barcode scanner");
                    ui.add_space(8.0);

                    if let Some(picture) = model.preview.as_ref() {
                        let texture = self.preview_texture.sync(ctx, "preview", picture);
                        draw_picture(ui, texture);
                    } else if model.live_visible {
                        if let Some(picture) = model.live.as_ref() {
                            let texture = self.live_texture.sync(ctx, "live", picture);
                            draw_picture(ui, texture);
                        }
                    }

                    ui.add_space(8.0);
                    if model.busy {
                        ui.spinner();
                    }
                    ui.label(
                        egui::RichText::new(&model.status.text)
                            .color(status_color(model.status.tone))
                            .size(18.0),
                    );
                    ui.add_space(8.0);

                    ui.horizontal(|ui| {
                        if control_button(ui, model.capture, "Capture") {
                            pressed.push(UiEvent::Capture);
                        }
                        if control_button(ui, model.scan, "Scan") {
                            pressed.push(UiEvent::Scan);
                        }
                        if control_button(ui, model.retry, "Retry") {
                            pressed.push(UiEvent::Retry);
                        }
                    });
                });
            });
        }

        for event in pressed {
            self.send(event);
        }

        // keep the spinner and live feed moving without input
        ctx.request_repaint_after(Duration::from_millis(100));
    }
}

/// Opens the window on the calling thread and blocks until it is closed.
pub fn run(screen: Arc<GuiScreen>, events: Sender<Event>) -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([720.0, 640.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Barcode Capture",
        options,
        Box::new(move |cc| {
            screen.attach_context(cc.egui_ctx.clone());
            Box::new(CaptureWindow {
                screen,
                events,
                live_texture: Texture::default(),
                preview_texture: Texture::default(),
            })
        }),
    )
}
