//! # gesture_media
//!
//! Hands-free media control: per-frame hand skeletons come in, media key
//! presses go out.
//!
//! ## Gesture → Action mapping
//!
//! | Gesture | Action |
//! |---|---|
//! | Open palm (entered) | Play/pause, at most once per second |
//! | Closed fist (entered) | Play/pause, shares the palm's debounce |
//! | Thumb + index out, moved up / down | Volume up / down per 20 px step |
//! | Thumb + index pinched together | Toggle mute, once per pinch |
//! | Index + middle together, moved right / left | Seek forward / backward per 20 px step |
//!
//! ## Pipeline
//!
//! ```text
//! LandmarkSource ──Frame──▶ GestureClassifier ──Classification──▶ Controller ──Action──▶ ActionSink
//! ```
//!
//! Sources run on their own thread ([`source::spawn_landmark_source`]);
//! classification, control and dispatch run on the consuming thread in
//! [`app::App::process`].
//!
//! ## Feature flags
//!
//! * (default) — **Replay mode**: frames are read from a JSON-lines
//!   recording and actions are logged, not pressed.
//! * `keys` — presses real keys through `enigo`.
//! * `leap` — reads hands from a LeapMotion controller via LeapC.
//!
//! ## Key layouts
//!
//! | Action | `youtube` | `system` |
//! |---|---|---|
//! | PlayPause | `k` | media play/pause |
//! | VolumeUp / VolumeDown | `↑` / `↓` | media volume up / down |
//! | ToggleMute | `m` | media mute |
//! | SeekForward / SeekBackward | `l` / `j` | `→` / `←` |

pub mod action;
pub mod app;
pub mod config;
pub mod controller;
pub mod sink;
pub mod source;

pub use action::{key_for, Action, ControlMode, KeyStroke};
pub use app::{run, App, AppError};
pub use config::{AppConfig, ConfigError};
pub use controller::{Controller, ControllerConfig, ControllerState};
pub use sink::{open_sink, ActionSink, LogSink, RecordingSink, SinkError};
pub use source::{spawn_landmark_source, Frame, LandmarkSource, ReplaySource, SourceError};
