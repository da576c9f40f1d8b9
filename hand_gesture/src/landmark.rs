//! Hand skeleton input types.
//!
//! Landmark ids follow the MediaPipe hand layout:
//!
//! ```text
//!            8   12  16  20        tips
//!            7   11  15  19
//!        4   6   10  14  18        PIP / thumb tip
//!        3   5    9  13  17        MCP / thumb IP
//!        2
//!        1
//!             0                    wrist
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ════════════════════════════════════════════════════════════════════════════
// Anatomical ids
// ════════════════════════════════════════════════════════════════════════════

/// Number of landmarks in a complete hand skeleton.
pub const LANDMARK_COUNT: usize = 21;

pub const WRIST:      usize = 0;
pub const THUMB_IP:   usize = 3;
pub const THUMB_TIP:  usize = 4;
pub const INDEX_TIP:  usize = 8;
pub const MIDDLE_TIP: usize = 12;
pub const RING_TIP:   usize = 16;
pub const PINKY_TIP:  usize = 20;

/// Fingertip ids in [`FingerState`](crate::FingerState) order:
/// thumb, index, middle, ring, pinky.
pub const TIP_IDS: [usize; 5] = [THUMB_TIP, INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];

/// Largest coordinate magnitude a usable skeleton may carry, in pixels.
/// Far beyond any capture frame; anything bigger is tracker garbage.
pub const MAX_COORD: i32 = 1 << 20;

// ════════════════════════════════════════════════════════════════════════════
// Landmark
// ════════════════════════════════════════════════════════════════════════════

/// One tracked skeleton point in image pixel space.
///
/// Serialized as a compact `[id, x, y]` triple, the layout trackers
/// usually emit.  Fractional coordinates are rounded to the nearest pixel
/// on load.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(u8, f64, f64)", into = "(u8, i32, i32)")]
pub struct Landmark {
    pub id: u8,
    pub x:  i32,
    pub y:  i32,
}

impl Landmark {
    pub fn new(id: u8, x: i32, y: i32) -> Self {
        Landmark { id, x, y }
    }

    pub fn pos(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    /// Euclidean pixel distance to `other`.
    pub fn distance(&self, other: &Landmark) -> f32 {
        let dx = (i64::from(other.x) - i64::from(self.x)) as f64;
        let dy = (i64::from(other.y) - i64::from(self.y)) as f64;
        dx.hypot(dy) as f32
    }

    /// Integer midpoint, rounded toward negative infinity.
    pub fn midpoint(&self, other: &Landmark) -> (i32, i32) {
        let mid = |a: i32, b: i32| (i64::from(a) + i64::from(b)).div_euclid(2) as i32;
        (mid(self.x, other.x), mid(self.y, other.y))
    }

    /// Whether both coordinates lie within [`MAX_COORD`] of the origin.
    pub fn in_range(&self) -> bool {
        (-MAX_COORD..=MAX_COORD).contains(&self.x) && (-MAX_COORD..=MAX_COORD).contains(&self.y)
    }
}

impl From<(u8, i32, i32)> for Landmark {
    fn from((id, x, y): (u8, i32, i32)) -> Self {
        Landmark { id, x, y }
    }
}

impl From<(u8, f64, f64)> for Landmark {
    /// Rounds to the nearest pixel; `as` saturates, and NaN becomes 0.
    fn from((id, x, y): (u8, f64, f64)) -> Self {
        Landmark { id, x: x.round() as i32, y: y.round() as i32 }
    }
}

impl From<Landmark> for (u8, i32, i32) {
    fn from(l: Landmark) -> Self {
        (l.id, l.x, l.y)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Handedness
// ════════════════════════════════════════════════════════════════════════════

/// Which hand the tracker believes it is looking at.
///
/// The tracker runs on an already-mirrored frame, so `Left` means the hand
/// that appears as a left hand on screen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum Handedness {
    Left,
    Right,
    #[default]
    Unknown,
}

impl Handedness {
    /// Parse a tracker label.  Anything unrecognised is `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "left"  => Handedness::Left,
            "right" => Handedness::Right,
            _       => Handedness::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Handedness::Left    => "Left",
            Handedness::Right   => "Right",
            Handedness::Unknown => "Unknown",
        }
    }
}

impl From<String> for Handedness {
    fn from(s: String) -> Self {
        Handedness::from_label(&s)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LandmarkSet — a validated, complete skeleton
// ════════════════════════════════════════════════════════════════════════════

/// Why a landmark slice could not be accepted as a hand skeleton.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LandmarkError {
    #[error("expected {expected} landmarks, got {actual}")]
    WrongCount { expected: usize, actual: usize },

    #[error("landmark at position {position} has id {id}")]
    OutOfOrder { position: usize, id: u8 },

    #[error("landmark {id} at ({x}, {y}) is not a plausible pixel position")]
    OutOfRange { id: u8, x: i32, y: i32 },

    #[error("landmark {id} at ({x}, {y}) lies outside a {width}x{height} frame")]
    OutOfFrame { id: u8, x: i32, y: i32, width: u32, height: u32 },
}

/// Exactly [`LANDMARK_COUNT`] landmarks, position `i` holding id `i`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LandmarkSet {
    points: [Landmark; LANDMARK_COUNT],
}

impl LandmarkSet {
    /// Validate count, ordering and coordinate range.
    pub fn from_slice(points: &[Landmark]) -> Result<Self, LandmarkError> {
        let points: [Landmark; LANDMARK_COUNT] =
            points.try_into().map_err(|_| LandmarkError::WrongCount {
                expected: LANDMARK_COUNT,
                actual:   points.len(),
            })?;
        if let Some((position, l)) = points
            .iter()
            .enumerate()
            .find(|(i, l)| l.id as usize != *i)
        {
            return Err(LandmarkError::OutOfOrder { position, id: l.id });
        }
        if let Some(l) = points.iter().find(|l| !l.in_range()) {
            return Err(LandmarkError::OutOfRange { id: l.id, x: l.x, y: l.y });
        }
        Ok(LandmarkSet { points })
    }

    /// Reject any point outside `[0, width) × [0, height)`.
    pub fn check_bounds(&self, width: u32, height: u32) -> Result<(), LandmarkError> {
        let inside = |l: &Landmark| {
            l.x >= 0 && l.y >= 0 && (l.x as u32) < width && (l.y as u32) < height
        };
        match self.points.iter().find(|l| !inside(l)) {
            Some(l) => Err(LandmarkError::OutOfFrame {
                id: l.id, x: l.x, y: l.y, width, height,
            }),
            None => Ok(()),
        }
    }

    /// Landmark by anatomical id.  Ids ≥ 21 are a programming error.
    pub fn get(&self, id: usize) -> &Landmark {
        &self.points[id]
    }

    pub fn points(&self) -> &[Landmark] {
        &self.points
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
