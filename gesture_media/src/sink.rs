//! Action sinks: where dispatched [`Action`]s end up.
//!
//! * [`KeySink`] presses real keys through `enigo` (`keys` feature).
//! * [`LogSink`] only logs the key it would have pressed (dry run).
//! * [`RecordingSink`] keeps everything in memory, for tests and embedding.
//!
//! [`open_sink`] picks one, falling back to [`LogSink`] when key injection
//! is unavailable.

use thiserror::Error;
use tracing::{info, warn};

use crate::action::{key_for, Action, ControlMode, KeyStroke};

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("key injection backend unavailable: {0}")]
    Backend(String),

    #[error("failed to press {key} for {action}: {reason}")]
    Press { action: Action, key: String, reason: String },
}

// ════════════════════════════════════════════════════════════════════════════
// ActionSink
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can carry out an [`Action`].
pub trait ActionSink {
    fn dispatch(&mut self, action: Action) -> Result<(), SinkError>;

    /// Short human-readable description for startup logs.
    fn describe(&self) -> String;
}

// ── dry run ───────────────────────────────────────────────────────────────

/// Logs each action and the key it maps to; presses nothing.
#[derive(Debug, Clone, Copy)]
pub struct LogSink {
    mode: ControlMode,
}

impl LogSink {
    pub fn new(mode: ControlMode) -> Self {
        LogSink { mode }
    }
}

impl ActionSink for LogSink {
    fn dispatch(&mut self, action: Action) -> Result<(), SinkError> {
        let key = key_for(self.mode, action);
        info!(mode = self.mode.as_str(), key = %key.name(), "action: {} (dry run)", action);
        Ok(())
    }

    fn describe(&self) -> String {
        format!("dry run ({} keys)", self.mode.as_str())
    }
}

// ── in-memory ─────────────────────────────────────────────────────────────

/// Records every dispatched action together with its key.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub mode:       ControlMode,
    pub dispatched: Vec<(Action, KeyStroke)>,
    /// When set, every dispatch fails after being recorded.
    pub fail:       bool,
}

impl RecordingSink {
    pub fn new(mode: ControlMode) -> Self {
        RecordingSink { mode, ..RecordingSink::default() }
    }

    pub fn actions(&self) -> Vec<Action> {
        self.dispatched.iter().map(|(a, _)| *a).collect()
    }
}

impl ActionSink for RecordingSink {
    fn dispatch(&mut self, action: Action) -> Result<(), SinkError> {
        let key = key_for(self.mode, action);
        self.dispatched.push((action, key));
        if self.fail {
            return Err(SinkError::Press {
                action,
                key: key.name(),
                reason: "recording sink set to fail".into(),
            });
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("in-memory ({} keys)", self.mode.as_str())
    }
}

// ── enigo backend ─────────────────────────────────────────────────────────

/// Presses the mapped key with `enigo`.
#[cfg(feature = "keys")]
pub struct KeySink {
    enigo: enigo::Enigo,
    mode:  ControlMode,
}

#[cfg(feature = "keys")]
impl KeySink {
    pub fn new(mode: ControlMode) -> Result<Self, SinkError> {
        let enigo = enigo::Enigo::new(&enigo::Settings::default())
            .map_err(|e| SinkError::Backend(e.to_string()))?;
        Ok(KeySink { enigo, mode })
    }

    fn enigo_key(key: KeyStroke) -> enigo::Key {
        use enigo::Key;
        match key {
            KeyStroke::Char(c)        => Key::Unicode(c),
            KeyStroke::Up             => Key::UpArrow,
            KeyStroke::Down           => Key::DownArrow,
            KeyStroke::Left           => Key::LeftArrow,
            KeyStroke::Right          => Key::RightArrow,
            KeyStroke::MediaPlayPause => Key::MediaPlayPause,
            KeyStroke::VolumeUp       => Key::VolumeUp,
            KeyStroke::VolumeDown     => Key::VolumeDown,
            KeyStroke::VolumeMute     => Key::VolumeMute,
        }
    }
}

#[cfg(feature = "keys")]
impl ActionSink for KeySink {
    fn dispatch(&mut self, action: Action) -> Result<(), SinkError> {
        use enigo::{Direction, Keyboard};

        let key = key_for(self.mode, action);
        self.enigo
            .key(Self::enigo_key(key), Direction::Click)
            .map_err(|e| SinkError::Press {
                action,
                key: key.name(),
                reason: e.to_string(),
            })?;
        info!(mode = self.mode.as_str(), key = %key.name(), "action: {}", action);
        Ok(())
    }

    fn describe(&self) -> String {
        format!("keyboard ({} keys)", self.mode.as_str())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// open_sink
// ════════════════════════════════════════════════════════════════════════════

/// Open the key-pressing sink, or a [`LogSink`] when `dry_run` is set or
/// key injection is not available.
pub fn open_sink(mode: ControlMode, dry_run: bool) -> Box<dyn ActionSink> {
    if dry_run {
        return Box::new(LogSink::new(mode));
    }

    #[cfg(feature = "keys")]
    {
        match KeySink::new(mode) {
            Ok(sink) => Box::new(sink),
            Err(e) => {
                warn!("{}, falling back to dry run", e);
                Box::new(LogSink::new(mode))
            }
        }
    }

    #[cfg(not(feature = "keys"))]
    {
        warn!("built without the `keys` feature: actions are logged, not pressed");
        Box::new(LogSink::new(mode))
    }
}
