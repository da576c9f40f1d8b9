//! Output commands and the key each one presses.
//!
//! The controller only ever talks in [`Action`]s.  Which physical key an
//! action becomes is a property of the sink's [`ControlMode`].

use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════════════════
// Action
// ════════════════════════════════════════════════════════════════════════════

/// A fire-and-forget media command.  Timing is already enforced by the
/// controller; sinks never debounce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    PlayPause,
    VolumeUp,
    VolumeDown,
    ToggleMute,
    SeekForward,
    SeekBackward,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::PlayPause    => "play/pause",
            Action::VolumeUp     => "volume up",
            Action::VolumeDown   => "volume down",
            Action::ToggleMute   => "toggle mute",
            Action::SeekForward  => "seek forward",
            Action::SeekBackward => "seek backward",
        }
    }

    pub fn all() -> [Action; 6] {
        [
            Action::PlayPause,
            Action::VolumeUp,
            Action::VolumeDown,
            Action::ToggleMute,
            Action::SeekForward,
            Action::SeekBackward,
        ]
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ControlMode + KeyStroke
// ════════════════════════════════════════════════════════════════════════════

/// Which key layout the sink drives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ControlMode {
    /// YouTube player shortcuts; the player window must have focus.
    #[default]
    Youtube,
    /// OS media keys.
    System,
}

impl ControlMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlMode::Youtube => "youtube",
            ControlMode::System  => "system",
        }
    }
}

/// A single key, independent of any injection backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyStroke {
    Char(char),
    Up,
    Down,
    Left,
    Right,
    MediaPlayPause,
    VolumeUp,
    VolumeDown,
    VolumeMute,
}

impl KeyStroke {
    /// Conventional key name, e.g. `"k"`, `"up"`, `"volumemute"`.
    pub fn name(&self) -> String {
        match self {
            KeyStroke::Char(c)        => c.to_string(),
            KeyStroke::Up             => "up".into(),
            KeyStroke::Down           => "down".into(),
            KeyStroke::Left           => "left".into(),
            KeyStroke::Right          => "right".into(),
            KeyStroke::MediaPlayPause => "playpause".into(),
            KeyStroke::VolumeUp       => "volumeup".into(),
            KeyStroke::VolumeDown     => "volumedown".into(),
            KeyStroke::VolumeMute     => "volumemute".into(),
        }
    }
}

/// The key `action` presses under `mode`.
///
/// | Action | youtube | system |
/// |---|---|---|
/// | PlayPause | `k` | `playpause` |
/// | VolumeUp | `↑` | `volumeup` |
/// | VolumeDown | `↓` | `volumedown` |
/// | ToggleMute | `m` | `volumemute` |
/// | SeekForward | `l` | `→` |
/// | SeekBackward | `j` | `←` |
pub fn key_for(mode: ControlMode, action: Action) -> KeyStroke {
    match (mode, action) {
        (ControlMode::Youtube, Action::PlayPause)    => KeyStroke::Char('k'),
        (ControlMode::Youtube, Action::VolumeUp)     => KeyStroke::Up,
        (ControlMode::Youtube, Action::VolumeDown)   => KeyStroke::Down,
        (ControlMode::Youtube, Action::ToggleMute)   => KeyStroke::Char('m'),
        (ControlMode::Youtube, Action::SeekForward)  => KeyStroke::Char('l'),
        (ControlMode::Youtube, Action::SeekBackward) => KeyStroke::Char('j'),

        (ControlMode::System, Action::PlayPause)     => KeyStroke::MediaPlayPause,
        (ControlMode::System, Action::VolumeUp)      => KeyStroke::VolumeUp,
        (ControlMode::System, Action::VolumeDown)    => KeyStroke::VolumeDown,
        (ControlMode::System, Action::ToggleMute)    => KeyStroke::VolumeMute,
        (ControlMode::System, Action::SeekForward)   => KeyStroke::Right,
        (ControlMode::System, Action::SeekBackward)  => KeyStroke::Left,
    }
}
