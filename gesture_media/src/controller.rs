//! Frame-to-frame interaction state machine.
//!
//! [`Controller::step`] is called once per frame with that frame's
//! [`Classification`] and a monotonic timestamp, and returns at most one
//! [`Action`].
//!
//! | Label | Behaviour |
//! |---|---|
//! | `OpenPalm` / `ClosedFist` | `PlayPause` on the frame the label is entered, at most once per toggle debounce |
//! | `VolumeMode`, open pinch | vertical drag from an anchor: up → `VolumeUp`, down → `VolumeDown` |
//! | `VolumeMode`, closed pinch | `ToggleMute` once per pinch (latched) |
//! | `SeekMode` | horizontal drag from an anchor: right → `SeekForward`, left → `SeekBackward` |
//! | anything else | nothing |

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use hand_gesture::{Classification, GestureLabel, GestureMetadata};

use crate::action::Action;

// ════════════════════════════════════════════════════════════════════════════
// ControllerConfig
// ════════════════════════════════════════════════════════════════════════════

/// Timing and distance thresholds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Minimum seconds between two `PlayPause` dispatches.
    pub toggle_debounce_secs: f64,
    /// Minimum seconds between two drag steps (volume or seek).
    pub continuous_cooldown_secs: f64,
    /// Pinch distance (px) below which the thumb and index count as closed.
    pub mute_threshold_px: f32,
    /// Drag distance (px) from the anchor that commits one step.
    pub move_threshold_px: i32,
    /// Dispatch seek steps from `SeekMode`.
    pub enable_seek: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfig {
            toggle_debounce_secs:     1.0,
            continuous_cooldown_secs: 0.1,
            mute_threshold_px:        30.0,
            move_threshold_px:        20,
            enable_seek:              true,
        }
    }
}

/// Seconds → `Duration`, clamping negative and non-finite input to zero.
fn secs(s: f64) -> Duration {
    Duration::try_from_secs_f64(s).unwrap_or(Duration::ZERO)
}

// ════════════════════════════════════════════════════════════════════════════
// ControllerState
// ════════════════════════════════════════════════════════════════════════════

/// Everything the controller remembers between frames.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ControllerState {
    /// Label seen on the previous frame.
    pub last_label:      GestureLabel,
    /// When `PlayPause` last fired.
    pub last_toggle:     Option<Instant>,
    /// When a volume or seek step last fired.
    pub last_continuous: Option<Instant>,
    /// Committed y of the volume drag.
    pub volume_anchor:   Option<i32>,
    /// Committed x of the seek drag.
    pub seek_anchor:     Option<i32>,
    /// Set while a mute pinch is held closed.
    pub pinch_latched:   bool,
}

/// Direction of a committed drag step along one axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    Decrease,
    Increase,
}

// ════════════════════════════════════════════════════════════════════════════
// Controller
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct Controller {
    config:              ControllerConfig,
    toggle_debounce:     Duration,
    continuous_cooldown: Duration,
    state:               ControllerState,
}

impl Default for Controller {
    fn default() -> Self {
        Controller::new(ControllerConfig::default())
    }
}

impl Controller {
    pub fn new(config: ControllerConfig) -> Self {
        Controller {
            toggle_debounce:     secs(config.toggle_debounce_secs),
            continuous_cooldown: secs(config.continuous_cooldown_secs),
            config,
            state:               ControllerState::default(),
        }
    }

    pub fn config(&self) -> &ControllerConfig { &self.config }
    pub fn state(&self)  -> &ControllerState  { &self.state }

    /// Forget everything learned from previous frames.
    pub fn reset(&mut self) {
        self.state = ControllerState::default();
    }

    /// Advance one frame.
    ///
    /// State advances whether or not the caller manages to deliver the
    /// returned action.
    pub fn step(&mut self, frame: &Classification, now: Instant) -> Option<Action> {
        let label = frame.label;
        let prev  = std::mem::replace(&mut self.state.last_label, label);

        if label != prev {
            debug!(from = %prev, to = %label, "gesture changed");
        }

        // Anchors belong to one label; re-entering always re-anchors.
        if label != GestureLabel::VolumeMode {
            self.state.volume_anchor = None;
        }
        if label != GestureLabel::SeekMode {
            self.state.seek_anchor = None;
        }

        match label {
            GestureLabel::OpenPalm | GestureLabel::ClosedFist if label != prev => {
                self.toggle(now)
            }
            GestureLabel::VolumeMode => self.volume(&frame.metadata, now),
            GestureLabel::SeekMode if self.config.enable_seek => {
                self.seek(&frame.metadata, now)
            }
            _ => None,
        }
    }

    // ── toggle ────────────────────────────────────────────────────────────

    fn toggle(&mut self, now: Instant) -> Option<Action> {
        if let Some(last) = self.state.last_toggle {
            if now.saturating_duration_since(last) < self.toggle_debounce {
                trace!("play/pause suppressed by debounce");
                return None;
            }
        }
        self.state.last_toggle = Some(now);
        Some(Action::PlayPause)
    }

    // ── volume: pinch-to-mute + vertical drag ─────────────────────────────

    fn volume(&mut self, meta: &GestureMetadata, now: Instant) -> Option<Action> {
        // Missing or NaN distance reads as an open pinch.
        let pinched = meta
            .pinch_distance
            .is_some_and(|d| d < self.config.mute_threshold_px);

        if pinched {
            if self.state.pinch_latched {
                return None;
            }
            self.state.pinch_latched = true;
            return Some(Action::ToggleMute);
        }
        self.state.pinch_latched = false;

        let (_, y) = meta.pinch_coords?;
        let threshold = self.config.move_threshold_px;
        let ready = self.continuous_ready(now);
        // Screen y grows downward, so a smaller y is a raised hand.
        match drag(&mut self.state.volume_anchor, y, threshold, ready)? {
            Step::Decrease => self.commit(now, Action::VolumeUp),
            Step::Increase => self.commit(now, Action::VolumeDown),
        }
    }

    // ── seek: horizontal drag ─────────────────────────────────────────────

    fn seek(&mut self, meta: &GestureMetadata, now: Instant) -> Option<Action> {
        let (x, _) = meta.seek_coords?;
        let threshold = self.config.move_threshold_px;
        let ready = self.continuous_ready(now);
        match drag(&mut self.state.seek_anchor, x, threshold, ready)? {
            Step::Increase => self.commit(now, Action::SeekForward),
            Step::Decrease => self.commit(now, Action::SeekBackward),
        }
    }

    fn continuous_ready(&self, now: Instant) -> bool {
        match self.state.last_continuous {
            Some(last) => now.saturating_duration_since(last) >= self.continuous_cooldown,
            None       => true,
        }
    }

    fn commit(&mut self, now: Instant, action: Action) -> Option<Action> {
        self.state.last_continuous = Some(now);
        Some(action)
    }
}

/// One axis of a drag gesture.
///
/// An empty anchor is set to `pos` without stepping.  Otherwise a move of
/// more than `threshold` from the anchor commits a step and re-anchors at
/// `pos`, unless `ready` is false, in which case the anchor is left alone
/// so the move is re-evaluated next frame.
fn drag(anchor: &mut Option<i32>, pos: i32, threshold: i32, ready: bool) -> Option<Step> {
    let a = match *anchor {
        Some(a) => a,
        None => {
            *anchor = Some(pos);
            return None;
        }
    };
    let step = if pos < a.saturating_sub(threshold) {
        Step::Decrease
    } else if pos > a.saturating_add(threshold) {
        Step::Increase
    } else {
        return None;
    };
    if !ready {
        return None;
    }
    *anchor = Some(pos);
    Some(step)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use hand_gesture::FingerState;

    fn at(t0: Instant, secs: f64) -> Instant {
        t0 + Duration::from_secs_f64(secs)
    }

    fn label(l: GestureLabel) -> Classification {
        Classification { label: l, fingers: Some(FingerState::default()), ..Classification::default() }
    }

    fn pinch(distance: f32, y: i32) -> Classification {
        Classification {
            label: GestureLabel::VolumeMode,
            fingers: Some(FingerState([true, true, false, false, false])),
            metadata: GestureMetadata {
                pinch_distance: Some(distance),
                pinch_coords: Some((320, y)),
                ..GestureMetadata::default()
            },
        }
    }

    fn seek(x: i32) -> Classification {
        Classification {
            label: GestureLabel::SeekMode,
            fingers: Some(FingerState([false, true, true, false, false])),
            metadata: GestureMetadata { seek_coords: Some((x, 200)), ..GestureMetadata::default() },
        }
    }

    /// Feed `(time, frame)` pairs and collect every action.
    fn run(ctl: &mut Controller, t0: Instant, frames: &[(f64, Classification)]) -> Vec<(f64, Action)> {
        frames
            .iter()
            .filter_map(|(t, f)| ctl.step(f, at(t0, *t)).map(|a| (*t, a)))
            .collect()
    }

    // ── toggle ────────────────────────────────────────────────────────────

    #[test]
    fn held_palm_fires_once() {
        let mut ctl = Controller::default();
        let t0 = Instant::now();
        let palm = label(GestureLabel::OpenPalm);
        let out = run(&mut ctl, t0, &[(0.0, palm), (0.2, palm), (0.4, palm)]);
        assert_eq!(out, vec![(0.0, Action::PlayPause)]);
    }

    #[test]
    fn palm_to_fist_inside_debounce_fires_once() {
        let mut ctl = Controller::default();
        let t0 = Instant::now();
        let out = run(
            &mut ctl,
            t0,
            &[(0.0, label(GestureLabel::OpenPalm)), (0.1, label(GestureLabel::ClosedFist))],
        );
        assert_eq!(out, vec![(0.0, Action::PlayPause)]);
        assert_eq!(ctl.state().last_toggle, Some(t0));
    }

    #[test]
    fn palm_to_fist_after_debounce_fires_twice() {
        let mut ctl = Controller::default();
        let t0 = Instant::now();
        let out = run(
            &mut ctl,
            t0,
            &[(0.0, label(GestureLabel::OpenPalm)), (1.0, label(GestureLabel::ClosedFist))],
        );
        assert_eq!(out, vec![(0.0, Action::PlayPause), (1.0, Action::PlayPause)]);
    }

    #[test]
    fn suppressed_edge_is_not_replayed_while_held() {
        let mut ctl = Controller::default();
        let t0 = Instant::now();
        let palm = label(GestureLabel::OpenPalm);
        let fist = label(GestureLabel::ClosedFist);
        // The fist edge at 0.5 is swallowed by debounce; holding it past
        // the window does not fire late.
        let out = run(&mut ctl, t0, &[(0.0, palm), (0.5, fist), (1.5, fist), (2.0, fist)]);
        assert_eq!(out, vec![(0.0, Action::PlayPause)]);
    }

    #[test]
    fn release_and_reform_fires_again() {
        let mut ctl = Controller::default();
        let t0 = Instant::now();
        let palm = label(GestureLabel::OpenPalm);
        let none = Classification::none();
        let out = run(&mut ctl, t0, &[(0.0, palm), (0.5, none), (1.2, palm)]);
        assert_eq!(out, vec![(0.0, Action::PlayPause), (1.2, Action::PlayPause)]);
    }

    #[test]
    fn unknown_and_none_emit_nothing() {
        let mut ctl = Controller::default();
        let t0 = Instant::now();
        let out = run(
            &mut ctl,
            t0,
            &[(0.0, label(GestureLabel::Unknown)), (0.1, Classification::none())],
        );
        assert!(out.is_empty());
        assert_eq!(ctl.state().last_label, GestureLabel::None);
    }

    // ── volume drag ───────────────────────────────────────────────────────

    #[test]
    fn volume_drag_steps_and_reanchors() {
        let mut ctl = Controller::default();
        let t0 = Instant::now();
        let out = run(&mut ctl, t0, &[(0.0, pinch(80.0, 200)), (0.2, pinch(80.0, 175))]);
        assert_eq!(out, vec![(0.2, Action::VolumeUp)]);
        assert_eq!(ctl.state().volume_anchor, Some(175));

        assert_eq!(ctl.step(&pinch(80.0, 180), at(t0, 0.4)), None);
        assert_eq!(ctl.state().volume_anchor, Some(175));
    }

    #[test]
    fn volume_drag_down() {
        let mut ctl = Controller::default();
        let t0 = Instant::now();
        let out = run(
            &mut ctl,
            t0,
            &[(0.0, pinch(80.0, 200)), (0.2, pinch(80.0, 220)), (0.4, pinch(80.0, 221))],
        );
        // Exactly the threshold is not enough.
        assert_eq!(out, vec![(0.4, Action::VolumeDown)]);
    }

    #[test]
    fn continuous_drag_keeps_stepping() {
        let mut ctl = Controller::default();
        let t0 = Instant::now();
        let frames: Vec<(f64, Classification)> = (0..5)
            .map(|i| (i as f64 * 0.2, pinch(80.0, 300 - 30 * i)))
            .collect();
        let out = run(&mut ctl, t0, &frames);
        assert_eq!(out.len(), 4);
        assert!(out.iter().all(|(_, a)| *a == Action::VolumeUp));
    }

    #[test]
    fn continuous_cooldown_holds_anchor() {
        let mut ctl = Controller::default();
        let t0 = Instant::now();
        let out = run(
            &mut ctl,
            t0,
            &[
                (0.00, pinch(80.0, 200)),
                (0.10, pinch(80.0, 170)), // step
                (0.15, pinch(80.0, 140)), // too soon
                (0.25, pinch(80.0, 140)), // same move, now allowed
            ],
        );
        assert_eq!(out, vec![(0.10, Action::VolumeUp), (0.25, Action::VolumeUp)]);
        assert_eq!(ctl.state().volume_anchor, Some(140));
    }

    #[test]
    fn leaving_volume_mode_clears_anchor() {
        let mut ctl = Controller::default();
        let t0 = Instant::now();
        ctl.step(&pinch(80.0, 200), at(t0, 0.0));
        assert_eq!(ctl.state().volume_anchor, Some(200));
        ctl.step(&label(GestureLabel::Unknown), at(t0, 0.1));
        assert_eq!(ctl.state().volume_anchor, None);
        // Re-entering far from the old anchor re-anchors instead of stepping.
        assert_eq!(ctl.step(&pinch(80.0, 100), at(t0, 0.2)), None);
        assert_eq!(ctl.state().volume_anchor, Some(100));
    }

    // ── pinch latch ───────────────────────────────────────────────────────

    #[test]
    fn pinch_mutes_once_per_pinch() {
        let mut ctl = Controller::default();
        let t0 = Instant::now();
        let frames: Vec<(f64, Classification)> = [40.0, 25.0, 10.0, 35.0]
            .iter()
            .enumerate()
            .map(|(i, &d)| (i as f64 * 0.2, pinch(d, 200)))
            .collect();
        let out = run(&mut ctl, t0, &frames);
        assert_eq!(out, vec![(0.2, Action::ToggleMute)]);
        assert!(!ctl.state().pinch_latched);

        // Re-armed: the next pinch mutes again.
        assert_eq!(ctl.step(&pinch(12.0, 200), at(t0, 1.0)), Some(Action::ToggleMute));
    }

    #[test]
    fn pinched_frames_never_drag() {
        let mut ctl = Controller::default();
        let t0 = Instant::now();
        let out = run(
            &mut ctl,
            t0,
            &[(0.0, pinch(80.0, 200)), (0.2, pinch(10.0, 200)), (0.4, pinch(10.0, 100))],
        );
        assert_eq!(out, vec![(0.2, Action::ToggleMute)]);
        assert_eq!(ctl.state().volume_anchor, Some(200));
    }

    #[test]
    fn missing_pinch_metadata_is_harmless() {
        let mut ctl = Controller::default();
        let t0 = Instant::now();
        let bare = label(GestureLabel::VolumeMode);
        assert_eq!(ctl.step(&bare, at(t0, 0.0)), None);
        assert!(!ctl.state().pinch_latched);
        assert_eq!(ctl.state().volume_anchor, None);

        let mut nan = pinch(f32::NAN, 200);
        nan.metadata.pinch_coords = None;
        assert_eq!(ctl.step(&nan, at(t0, 0.1)), None);
    }

    // ── seek ──────────────────────────────────────────────────────────────

    #[test]
    fn seek_drag_both_directions() {
        let mut ctl = Controller::default();
        let t0 = Instant::now();
        let out = run(
            &mut ctl,
            t0,
            &[(0.0, seek(300)), (0.2, seek(330)), (0.4, seek(335)), (0.6, seek(300))],
        );
        assert_eq!(out, vec![(0.2, Action::SeekForward), (0.6, Action::SeekBackward)]);
    }

    #[test]
    fn missing_seek_metadata_is_harmless() {
        let mut ctl = Controller::default();
        let t0 = Instant::now();
        let bare = label(GestureLabel::SeekMode);

        // First frame without coordinates: nothing anchored.
        assert_eq!(ctl.step(&bare, at(t0, 0.0)), None);
        assert_eq!(ctl.state().seek_anchor, None);

        // Mid-drag gap keeps the anchor; the drag resumes afterwards.
        assert_eq!(ctl.step(&seek(300), at(t0, 0.2)), None);
        assert_eq!(ctl.step(&bare, at(t0, 0.4)), None);
        assert_eq!(ctl.state().seek_anchor, Some(300));
        assert_eq!(ctl.step(&seek(330), at(t0, 0.6)), Some(Action::SeekForward));
    }

    #[test]
    fn seek_can_be_disabled() {
        let mut ctl = Controller::new(ControllerConfig { enable_seek: false, ..ControllerConfig::default() });
        let t0 = Instant::now();
        let out = run(&mut ctl, t0, &[(0.0, seek(300)), (0.2, seek(400))]);
        assert!(out.is_empty());
    }

    #[test]
    fn reset_clears_state() {
        let mut ctl = Controller::default();
        let t0 = Instant::now();
        ctl.step(&label(GestureLabel::OpenPalm), t0);
        ctl.reset();
        assert_eq!(ctl.state(), &ControllerState::default());
    }

    #[test]
    fn negative_durations_clamp_to_zero() {
        assert_eq!(secs(-1.0), Duration::ZERO);
        assert_eq!(secs(f64::NAN), Duration::ZERO);
        assert_eq!(secs(0.5), Duration::from_millis(500));
    }
}
