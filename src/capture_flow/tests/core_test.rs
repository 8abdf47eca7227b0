use crate::capture_flow::core::{
    init, transition, Effect, Event, Phase, State, UiEvent, CAPTURED, NO_IMAGE_CAPTURED, PROMPT,
};
use crate::capture_flow::tests::fixture::test_image;
use crate::captured_frame::{CaptureError, CapturedFrame};
use crate::config::Config;
use crate::detection_service::interface::{DetectionError, DetectionResult};
use crate::media_source::interface::CameraAccessError;
use crate::surface::interface::{Status, Tone};

fn frame() -> CapturedFrame {
    CapturedFrame::encode(&test_image(), 90).unwrap()
}

fn camera() -> State {
    State::Camera {
        status: Status::info(PROMPT),
        capturing: false,
    }
}

fn previewing(frame: CapturedFrame) -> State {
    State::Previewing {
        frame,
        status: Status::info(CAPTURED),
    }
}

#[test]
fn test_init() {
    let config = Config::default();
    let (state, effects) = init(&config);

    assert_eq!(state, State::Starting);
    assert_eq!(
        effects,
        vec![
            Effect::AcquireCamera {
                constraints: config.stream_constraints()
            },
            Effect::CheckServiceHealth,
        ]
    );
}

#[test]
fn test_camera_acquired_enters_camera_phase_with_prompt() {
    let config = Config::default();

    let (state, effects) = transition(
        &config,
        State::Starting,
        Event::CameraAcquireDone(Ok((1280, 720))),
    );

    assert_eq!(state, camera());
    assert_eq!(state.phase(), Phase::Camera);
    assert!(effects.is_empty());
}

#[test]
fn test_camera_failure_is_persistent() {
    let config = Config::default();

    let (state, effects) = transition(
        &config,
        State::Starting,
        Event::CameraAcquireDone(Err(CameraAccessError::PermissionDenied)),
    );

    assert_eq!(
        state,
        State::CameraUnavailable {
            error: CameraAccessError::PermissionDenied
        }
    );
    assert!(effects.is_empty());

    // none of the controls get it out of there
    for ui in [UiEvent::Capture, UiEvent::Scan, UiEvent::Retry] {
        let (next, effects) = transition(&config, state.clone(), Event::Ui(ui));
        assert_eq!(next, state);
        assert!(effects.is_empty());
    }

    let status = state.status();
    assert_eq!(status.tone, Tone::Error);
    assert!(status.text.contains("permission"));
}

#[test]
fn test_capture_flow() {
    let config = Config {
        jpeg_quality: 80,
        ..Config::default()
    };

    let (state, effects) = transition(&config, camera(), Event::Ui(UiEvent::Capture));

    assert_eq!(
        state,
        State::Camera {
            status: Status::info(PROMPT),
            capturing: true
        }
    );
    assert_eq!(effects, vec![Effect::CaptureFrame { quality: 80 }]);

    // a second press while the first capture is pending does nothing
    let (state, effects) = transition(&config, state, Event::Ui(UiEvent::Capture));
    assert!(effects.is_empty());

    let frame = frame();
    let (state, effects) = transition(&config, state, Event::FrameCaptureDone(Ok(frame.clone())));

    assert_eq!(state, previewing(frame.clone()));
    assert_eq!(state.phase(), Phase::Previewing);
    assert_eq!(state.captured_frame(), Some(&frame));
    assert!(effects.is_empty());
}

#[test]
fn test_capture_failure_stays_in_camera() {
    let config = Config::default();
    let (state, _) = transition(&config, camera(), Event::Ui(UiEvent::Capture));

    let (state, effects) = transition(
        &config,
        state,
        Event::FrameCaptureDone(Err(CaptureError::NoLiveFrame)),
    );

    match &state {
        State::Camera { status, capturing } => {
            assert_eq!(status.tone, Tone::Error);
            assert!(!capturing);
        }
        _ => panic!("Unexpected state"),
    }
    assert!(effects.is_empty());
}

#[test]
fn test_scan_without_frame_is_rejected_locally() {
    let config = Config::default();

    let (state, effects) = transition(&config, camera(), Event::Ui(UiEvent::Scan));

    assert!(effects.is_empty());
    assert_eq!(state.phase(), Phase::Camera);
    assert_eq!(state.captured_frame(), None);
    assert_eq!(state.status(), Status::error(NO_IMAGE_CAPTURED));
}

#[test]
fn test_scan_issues_one_detect_and_ignores_repeat_presses() {
    let config = Config::default();
    let frame = frame();

    let (state, effects) = transition(&config, previewing(frame.clone()), Event::Ui(UiEvent::Scan));

    assert_eq!(
        state,
        State::Scanning {
            frame: frame.clone()
        }
    );
    assert_eq!(
        effects,
        vec![Effect::Detect {
            frame: frame.clone()
        }]
    );

    for ui in [UiEvent::Scan, UiEvent::Retry, UiEvent::Capture] {
        let (next, effects) = transition(&config, state.clone(), Event::Ui(ui));
        assert_eq!(next, state);
        assert!(effects.is_empty());
    }
}

#[test]
fn test_detection_outcomes_land_in_result() {
    let config = Config::default();
    let frame = frame();

    let outcomes = [
        (
            DetectionResult::Success {
                barcode: "012345678905".to_string(),
            },
            Tone::Success,
            "Barcode detected: 012345678905",
        ),
        (
            DetectionResult::NotFound {
                message: "no code".to_string(),
            },
            Tone::Info,
            "no code",
        ),
        (
            DetectionResult::from(Err(DetectionError::Network("refused".to_string()))),
            Tone::Error,
            "Could not connect to the server",
        ),
    ];

    for (outcome, tone, text) in outcomes {
        let (state, effects) = transition(
            &config,
            State::Scanning {
                frame: frame.clone(),
            },
            Event::DetectDone(outcome.clone()),
        );

        assert_eq!(
            state,
            State::Result {
                frame: frame.clone(),
                outcome
            }
        );
        assert_eq!(state.phase(), Phase::Result);
        assert_eq!(state.status(), Status { tone, text: text.to_string() });
        assert!(effects.is_empty());
    }
}

#[test]
fn test_scan_again_from_result_reuses_frame() {
    let config = Config::default();
    let frame = frame();
    let state = State::Result {
        frame: frame.clone(),
        outcome: DetectionResult::Failure {
            error: "Could not connect to the server".to_string(),
        },
    };

    let (state, effects) = transition(&config, state, Event::Ui(UiEvent::Scan));

    assert_eq!(state.phase(), Phase::Scanning);
    assert_eq!(effects, vec![Effect::Detect { frame }]);
}

#[test]
fn test_retry_returns_to_camera_and_clears_frame() {
    let config = Config::default();
    let frame = frame();

    let from = [
        previewing(frame.clone()),
        State::Result {
            frame: frame.clone(),
            outcome: DetectionResult::NotFound {
                message: "no code".to_string(),
            },
        },
    ];

    for state in from {
        let (state, effects) = transition(&config, state, Event::Ui(UiEvent::Retry));

        assert_eq!(state, camera());
        assert_eq!(state.captured_frame(), None);
        assert!(effects.is_empty());
    }
}

#[test]
fn test_close_releases_camera_once() {
    let config = Config::default();

    let (state, effects) = transition(&config, camera(), Event::Ui(UiEvent::Close));
    assert_eq!(state, State::Closed);
    assert_eq!(effects, vec![Effect::ReleaseCamera]);

    let (state, effects) = transition(&config, state, Event::Ui(UiEvent::Close));
    assert_eq!(state, State::Closed);
    assert!(effects.is_empty());
}

#[test]
fn test_late_completions_after_close_are_ignored() {
    let config = Config::default();

    let (state, effects) = transition(
        &config,
        State::Closed,
        Event::DetectDone(DetectionResult::NotFound {
            message: "late".to_string(),
        }),
    );

    assert_eq!(state, State::Closed);
    assert!(effects.is_empty());
}

#[test]
fn test_health_check_completion_does_not_change_state() {
    let config = Config::default();

    let (state, effects) = transition(
        &config,
        State::Starting,
        Event::HealthCheckDone(Err(DetectionError::Network("down".to_string()))),
    );

    assert_eq!(state, State::Starting);
    assert!(effects.is_empty());
}

#[test]
fn test_effect_display_elides_frame_payload() {
    let effect = Effect::Detect { frame: frame() };

    assert_eq!(effect.to_display_string(), "Detect { 32x24 }");
}
