//! Top-level application loop.
//!
//! `App` owns the classifier, the controller and the action sink.  It turns
//! each incoming [`Frame`] into at most one dispatched [`Action`] and keeps
//! a one-line status text describing what the hand is doing.

use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

use hand_gesture::{Classification, GestureClassifier, GestureLabel};

use crate::action::Action;
use crate::config::AppConfig;
use crate::controller::Controller;
use crate::sink::ActionSink;
use crate::source::{recorded_instant, spawn_landmark_source, Frame, LandmarkSource};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("landmark source stopped before delivering any frame")]
    NoFrames,
}

// ════════════════════════════════════════════════════════════════════════════
// Status text
// ════════════════════════════════════════════════════════════════════════════

/// Banner shown for as long as a label is held.
fn banner(label: GestureLabel) -> Option<&'static str> {
    match label {
        GestureLabel::OpenPalm   => Some("PLAY/PAUSE"),
        GestureLabel::ClosedFist => Some("PAUSE (Toggle)"),
        GestureLabel::VolumeMode => Some("Volume Mode: Move Up/Down | Pinch to Mute"),
        GestureLabel::SeekMode   => Some("Seek Mode: Move Left/Right"),
        _                        => None,
    }
}

/// Flash shown on the frame an action fires.
fn flash(action: Action) -> Option<&'static str> {
    match action {
        Action::ToggleMute   => Some("MUTE TOGGLED"),
        Action::VolumeUp     => Some("VOL UP"),
        Action::VolumeDown   => Some("VOL DOWN"),
        Action::SeekForward  => Some("SEEK >>"),
        Action::SeekBackward => Some("SEEK <<"),
        Action::PlayPause    => None,
    }
}

/// `Mode: <LABEL>`, followed by the label's banner and the action flash.
pub fn status_line(label: GestureLabel, action: Option<Action>) -> String {
    let mut s = format!("Mode: {}", label);
    for part in [banner(label), action.and_then(flash)].into_iter().flatten() {
        s.push_str("  |  ");
        s.push_str(part);
    }
    s
}

// ════════════════════════════════════════════════════════════════════════════
// FrameRate
// ════════════════════════════════════════════════════════════════════════════

/// Frames per second, averaged over fixed windows.
#[derive(Debug, Clone)]
pub struct FrameRate {
    window:       Duration,
    window_start: Option<Instant>,
    frames:       u32,
    last:         Option<f64>,
}

impl FrameRate {
    pub fn new(window: Duration) -> Self {
        FrameRate { window, window_start: None, frames: 0, last: None }
    }

    /// Count one frame.  Returns the rate when a window closes.
    pub fn tick(&mut self, now: Instant) -> Option<f64> {
        let start = *self.window_start.get_or_insert(now);
        self.frames += 1;
        let elapsed = now.saturating_duration_since(start);
        if elapsed < self.window || elapsed.is_zero() {
            return None;
        }
        let fps = f64::from(self.frames) / elapsed.as_secs_f64();
        self.window_start = Some(now);
        self.frames = 0;
        self.last = Some(fps);
        Some(fps)
    }

    /// Rate of the last closed window.
    pub fn fps(&self) -> Option<f64> {
        self.last
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        FrameRate::new(Duration::from_secs(5))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// App
// ════════════════════════════════════════════════════════════════════════════

pub struct App {
    classifier: GestureClassifier,
    controller: Controller,
    sink:       Box<dyn ActionSink>,

    // ── bookkeeping ──────────────────────────────────────────────────────
    status:     String,
    frame_rate: FrameRate,
    frames:     u64,
    dispatched: u64,
    failures:   u64,
}

impl App {
    pub fn new(cfg: &AppConfig, sink: Box<dyn ActionSink>) -> Self {
        App {
            classifier: GestureClassifier::new(cfg.classifier),
            controller: Controller::new(cfg.controller),
            sink,
            status:     status_line(GestureLabel::None, None),
            frame_rate: FrameRate::default(),
            frames:     0,
            dispatched: 0,
            failures:   0,
        }
    }

    // ── process one Frame ────────────────────────────────────────────────

    /// Classify `frame`, advance the controller and dispatch the resulting
    /// action.  A failed dispatch is logged; controller state has already
    /// moved on either way.
    pub fn process(&mut self, frame: &Frame, now: Instant) -> Option<Action> {
        let classification = self
            .classifier
            .classify(frame.hand_landmarks(), frame.handedness);
        self.frames += 1;
        if let Some(fps) = self.frame_rate.tick(now) {
            debug!("frame rate: {:.1} fps", fps);
        }
        self.apply(&classification, now)
    }

    /// Same as [`process`](Self::process) for an already classified frame.
    pub fn apply(&mut self, classification: &Classification, now: Instant) -> Option<Action> {
        let action = self.controller.step(classification, now);

        if let Some(a) = action {
            match self.sink.dispatch(a) {
                Ok(())  => self.dispatched += 1,
                Err(e)  => {
                    self.failures += 1;
                    warn!("dispatch failed: {}", e);
                }
            }
        }

        let status = status_line(classification.label, action);
        if status != self.status {
            debug!(status = %status, "status");
            self.status = status;
        }
        action
    }

    // ── accessors ────────────────────────────────────────────────────────

    pub fn status(&self)     -> &str            { &self.status }
    pub fn controller(&self) -> &Controller     { &self.controller }
    pub fn sink(&self)       -> &dyn ActionSink { self.sink.as_ref() }
    pub fn frames(&self)     -> u64             { self.frames }
    pub fn dispatched(&self) -> u64             { self.dispatched }
    pub fn failures(&self)   -> u64             { self.failures }
    pub fn fps(&self)        -> Option<f64>     { self.frame_rate.fps() }
}

// ════════════════════════════════════════════════════════════════════════════
// run() — the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Drive `app` from `source` until the source ends.
///
/// Frames carrying a recorded `t` are timed on a clock anchored at the
/// first frame, so debounce and cooldown behave as they did when the
/// recording was made however fast it is replayed.  Frames without `t`
/// are stamped on arrival.
pub fn run(app: &mut App, source: Box<dyn LandmarkSource>) -> Result<(), AppError> {
    info!(sink = %app.sink().describe(), "gesture control started");

    let rx = spawn_landmark_source(source);
    let epoch = Instant::now();

    for frame in rx.iter() {
        let now = match frame.t.map(|t| (t, recorded_instant(epoch, t))) {
            Some((_, Some(at))) => at,
            Some((t, None))     => {
                warn!(t, "unusable frame timestamp, using arrival time");
                Instant::now()
            }
            None => Instant::now(),
        };
        app.process(&frame, now);
    }

    if app.frames() == 0 {
        return Err(AppError::NoFrames);
    }
    info!(
        frames = app.frames(),
        dispatched = app.dispatched(),
        failed = app.failures(),
        "landmark source finished"
    );
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ControlMode;
    use crate::sink::RecordingSink;
    use crate::source::ReplaySource;
    use hand_gesture::{Handedness, Landmark};
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    /// Right hand with the given fingers raised, in the mirrored pixel frame.
    fn hand(up: [bool; 5]) -> Vec<Landmark> {
        let mut pts: Vec<Landmark> = (0..21).map(|i| Landmark::new(i, 400, 420)).collect();
        // Thumb: IP at x=300, tip to its left when open (right hand).
        pts[3] = Landmark::new(3, 300, 300);
        pts[4] = Landmark::new(4, if up[0] { 260 } else { 340 }, 300);
        for (f, tip) in [8usize, 12, 16, 20].into_iter().enumerate() {
            let x = 380 + 80 * f as i32;
            pts[tip - 2] = Landmark::new(tip as u8 - 2, x, 300);
            pts[tip] = Landmark::new(tip as u8, x, if up[f + 1] { 240 } else { 360 });
        }
        pts
    }

    fn frame(up: [bool; 5]) -> Frame {
        Frame::hand(hand(up), Handedness::Right)
    }

    const PALM: [bool; 5] = [true; 5];
    const FIST: [bool; 5] = [false; 5];
    const VOLUME: [bool; 5] = [true, true, false, false, false];

    /// Sink sharing its log with the test.
    struct Shared(Arc<Mutex<RecordingSink>>);

    impl ActionSink for Shared {
        fn dispatch(&mut self, action: Action) -> Result<(), crate::sink::SinkError> {
            self.0.lock().unwrap().dispatch(action)
        }
        fn describe(&self) -> String {
            self.0.lock().unwrap().describe()
        }
    }

    fn make_app(fail: bool) -> (App, Arc<Mutex<RecordingSink>>) {
        let rec = Arc::new(Mutex::new(RecordingSink {
            fail,
            ..RecordingSink::new(ControlMode::Youtube)
        }));
        let app = App::new(&AppConfig::default(), Box::new(Shared(rec.clone())));
        (app, rec)
    }

    fn at(t0: Instant, secs: f64) -> Instant {
        t0 + Duration::from_secs_f64(secs)
    }

    #[test]
    fn palm_dispatches_play_pause_once() {
        let (mut app, rec) = make_app(false);
        let t0 = Instant::now();
        for i in 0..10 {
            app.process(&frame(PALM), at(t0, i as f64 * 0.033));
        }
        assert_eq!(rec.lock().unwrap().actions(), vec![Action::PlayPause]);
        assert_eq!(app.dispatched(), 1);
        assert_eq!(app.frames(), 10);
    }

    #[test]
    fn absent_hand_is_none_and_idle() {
        let (mut app, rec) = make_app(false);
        let t0 = Instant::now();
        assert_eq!(app.process(&Frame::absent(), t0), None);
        assert_eq!(app.status(), "Mode: NONE");
        assert!(rec.lock().unwrap().dispatched.is_empty());
    }

    #[test]
    fn status_follows_label_and_action() {
        let (mut app, _rec) = make_app(false);
        let t0 = Instant::now();
        app.process(&frame(FIST), t0);
        assert_eq!(app.status(), "Mode: CLOSED_FIST  |  PAUSE (Toggle)");
        app.process(&frame(VOLUME), at(t0, 0.1));
        assert_eq!(
            app.status(),
            "Mode: VOLUME_MODE  |  Volume Mode: Move Up/Down | Pinch to Mute"
        );
    }

    #[test]
    fn status_line_flashes_actions() {
        assert_eq!(
            status_line(GestureLabel::VolumeMode, Some(Action::ToggleMute)),
            "Mode: VOLUME_MODE  |  Volume Mode: Move Up/Down | Pinch to Mute  |  MUTE TOGGLED"
        );
        assert_eq!(status_line(GestureLabel::Unknown, None), "Mode: UNKNOWN");
    }

    #[test]
    fn sink_failure_does_not_stall_controller() {
        let (mut app, rec) = make_app(true);
        let t0 = Instant::now();
        assert_eq!(app.process(&frame(PALM), t0), Some(Action::PlayPause));
        // Still debounced: the failed toggle counts.
        assert_eq!(app.process(&frame(FIST), at(t0, 0.5)), None);
        assert_eq!(app.failures(), 1);
        assert_eq!(app.dispatched(), 0);
        assert_eq!(rec.lock().unwrap().actions(), vec![Action::PlayPause]);
        assert!(app.controller().state().last_toggle.is_some());
    }

    #[test]
    fn frame_rate_reports_per_window() {
        let mut fr = FrameRate::new(Duration::from_secs(1));
        let t0 = Instant::now();
        let mut reported = None;
        for i in 0..=30 {
            if let Some(fps) = fr.tick(at(t0, i as f64 / 30.0)) {
                reported = Some(fps);
            }
        }
        let fps = reported.unwrap();
        assert!((fps - 31.0).abs() < 0.5, "fps = {}", fps);
        assert_eq!(fr.fps(), Some(fps));
    }

    #[test]
    fn run_replays_recorded_timeline() {
        // Palm, fist 0.5 s later (debounced), palm again at 1.6 s (fires).
        let line = |up: [bool; 5], t: f64| {
            let f = Frame { t: Some(t), ..frame(up) };
            serde_json::to_string(&f).unwrap() + "\n"
        };
        let text = line(PALM, 0.0) + &line(FIST, 0.5) + &line(PALM, 1.6);
        let source = ReplaySource::new(Box::new(Cursor::new(text.into_bytes())));

        let (mut app, rec) = make_app(false);
        run(&mut app, Box::new(source)).unwrap();
        assert_eq!(
            rec.lock().unwrap().actions(),
            vec![Action::PlayPause, Action::PlayPause]
        );
        assert_eq!(app.frames(), 3);
    }

    #[test]
    fn bundled_session_replays_every_gesture() {
        let text = include_str!("../data/session.jsonl");
        let source = ReplaySource::new(Box::new(Cursor::new(text.as_bytes().to_vec())));

        let (mut app, rec) = make_app(false);
        run(&mut app, Box::new(source)).unwrap();
        assert_eq!(
            rec.lock().unwrap().actions(),
            vec![
                Action::PlayPause,
                Action::PlayPause,
                Action::VolumeUp,
                Action::VolumeUp,
                Action::VolumeUp,
                Action::ToggleMute,
                Action::SeekForward,
                Action::SeekForward,
            ]
        );
    }

    #[test]
    fn run_tolerates_unrepresentable_timestamp() {
        let source = ReplaySource::new(Box::new(Cursor::new(
            b"{\"present\":false,\"t\":1e19}\n".to_vec(),
        )));
        let (mut app, rec) = make_app(false);
        run(&mut app, Box::new(source)).unwrap();
        assert_eq!(app.frames(), 1);
        assert!(rec.lock().unwrap().dispatched.is_empty());
    }

    #[test]
    fn run_without_frames_is_an_error() {
        let source = ReplaySource::new(Box::new(Cursor::new(b"# empty\n".to_vec())));
        let (mut app, _rec) = make_app(false);
        assert!(matches!(run(&mut app, Box::new(source)), Err(AppError::NoFrames)));
    }
}
