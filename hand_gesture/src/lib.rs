//! # hand_gesture
//!
//! Rule-based gesture classification for a single tracked hand.
//!
//! Input is the 21-point hand skeleton produced by a landmark tracker
//! (MediaPipe layout, pixel coordinates, y growing downward) plus the
//! tracker's handedness guess.  Output is a [`Classification`]: one
//! [`GestureLabel`], the five-finger [`FingerState`], and the geometric
//! [`GestureMetadata`] that belongs to that label.
//!
//! Classification is a pure function of a single frame.  Anything that
//! needs memory across frames (edges, debouncing, drag anchors) lives in
//! the consumer.
//!
//! ## Gesture table
//!
//! | Label | Finger pattern | Metadata |
//! |---|---|---|
//! | `VolumeMode` | thumb + index up, middle down | `pinch_distance`, `pinch_coords` |
//! | `SeekMode` | index + middle up and touching, ring + pinky down | `seek_coords` |
//! | `OpenPalm` | all five up, or index + middle up but spread | — |
//! | `ClosedFist` | none up | — |
//! | `Unknown` | anything else, or a malformed landmark set | — |
//! | `None` | no hand in frame | — |
//!
//! ## Quick start
//!
//! ```rust
//! use hand_gesture::{classify, GestureLabel, Handedness};
//!
//! let c = classify(&[], Handedness::Right);
//! assert_eq!(c.label, GestureLabel::None);
//! assert!(c.fingers.is_none());
//! ```

pub mod classify;
pub mod landmark;

pub use classify::{
    classify, finger_state, thumb_open, Classification, ClassifierConfig, FingerState,
    GestureClassifier, GestureLabel, GestureMetadata, DEFAULT_SEEK_MERGE_PX,
};
pub use landmark::{
    Handedness, Landmark, LandmarkError, LandmarkSet, LANDMARK_COUNT, TIP_IDS, INDEX_TIP, MIDDLE_TIP,
    MAX_COORD, PINKY_TIP, RING_TIP, THUMB_IP, THUMB_TIP, WRIST,
};
