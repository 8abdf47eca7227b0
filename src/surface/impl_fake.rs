use crate::captured_frame::CapturedFrame;
use crate::surface::interface::{
    BusyIndicator, Control, ControlPanel, ControlState, LiveSurface, PreviewSurface, Status,
    StatusSurface,
};
use image::RgbImage;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, Default)]
pub struct ScreenSnapshot {
    pub live_visible: bool,
    pub live_frames: usize,
    pub preview: Option<CapturedFrame>,
    pub status: Option<Status>,
    pub status_history: Vec<Status>,
    pub busy: bool,
    pub controls: HashMap<Control, ControlState>,
}

impl ScreenSnapshot {
    pub fn control(&self, control: Control) -> ControlState {
        self.controls
            .get(&control)
            .copied()
            .unwrap_or(ControlState::Hidden)
    }

    pub fn status_text(&self) -> &str {
        self.status.as_ref().map(|s| s.text.as_str()).unwrap_or("")
    }
}

#[derive(Debug, Default)]
pub struct ScreenFake {
    snapshot: Mutex<ScreenSnapshot>,
}

impl ScreenFake {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ScreenSnapshot {
        self.snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn update(&self, f: impl FnOnce(&mut ScreenSnapshot)) {
        f(&mut self.snapshot.lock().unwrap_or_else(PoisonError::into_inner));
    }
}

impl LiveSurface for ScreenFake {
    fn present(&self, _frame: &RgbImage) {
        self.update(|s| s.live_frames += 1);
    }

    fn set_visible(&self, visible: bool) {
        self.update(|s| s.live_visible = visible);
    }
}

impl PreviewSurface for ScreenFake {
    fn show(&self, frame: Option<&CapturedFrame>) {
        self.update(|s| s.preview = frame.cloned());
    }
}

impl StatusSurface for ScreenFake {
    fn set_status(&self, status: &Status) {
        self.update(|s| {
            if s.status.as_ref() != Some(status) {
                s.status_history.push(status.clone());
            }
            s.status = Some(status.clone());
        });
    }
}

impl BusyIndicator for ScreenFake {
    fn set_busy(&self, busy: bool) {
        self.update(|s| s.busy = busy);
    }
}

impl ControlPanel for ScreenFake {
    fn set_control(&self, control: Control, state: ControlState) {
        self.update(|s| {
            s.controls.insert(control, state);
        });
    }
}
