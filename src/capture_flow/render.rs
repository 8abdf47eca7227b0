use crate::capture_flow::core::State;
use crate::surface::interface::{Control, ControlState, Surfaces};

#[derive(Clone)]
pub struct Render {
    surfaces: Surfaces,
}

struct Layout {
    live: bool,
    busy: bool,
    capture: ControlState,
    scan: ControlState,
    retry: ControlState,
}

impl Render {
    pub fn new(surfaces: Surfaces) -> Self {
        Self { surfaces }
    }

    pub fn render(&self, state: &State) {
        let layout = match state {
            State::Starting | State::CameraUnavailable { .. } => Layout {
                live: true,
                busy: false,
                capture: ControlState::Disabled,
                scan: ControlState::Hidden,
                retry: ControlState::Hidden,
            },
            State::Camera { capturing, .. } => Layout {
                live: true,
                busy: false,
                capture: if *capturing {
                    ControlState::Disabled
                } else {
                    ControlState::Enabled
                },
                scan: ControlState::Hidden,
                retry: ControlState::Hidden,
            },
            State::Previewing { .. } | State::Result { .. } => Layout {
                live: false,
                busy: false,
                capture: ControlState::Hidden,
                scan: ControlState::Enabled,
                retry: ControlState::Enabled,
            },
            State::Scanning { .. } => Layout {
                live: false,
                busy: true,
                capture: ControlState::Hidden,
                scan: ControlState::Disabled,
                retry: ControlState::Disabled,
            },
            State::Closed => Layout {
                live: false,
                busy: false,
                capture: ControlState::Hidden,
                scan: ControlState::Hidden,
                retry: ControlState::Hidden,
            },
        };

        self.surfaces.live.set_visible(layout.live);
        self.surfaces.preview.show(state.captured_frame());
        self.surfaces.status.set_status(&state.status());
        self.surfaces.busy.set_busy(layout.busy);
        self.surfaces.controls.set_control(Control::Capture, layout.capture);
        self.surfaces.controls.set_control(Control::Scan, layout.scan);
        self.surfaces.controls.set_control(Control::Retry, layout.retry);
    }
}
