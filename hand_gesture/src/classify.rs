//! Single-frame gesture classification.
//!
//! The public interface is [`classify`] (default thresholds) or
//! [`GestureClassifier::classify`] (configured).  Both are total: every
//! input, including an empty or malformed landmark slice, yields a
//! [`Classification`].

use serde::{Deserialize, Serialize};

use crate::landmark::{
    Handedness, Landmark, LandmarkSet, INDEX_TIP, MIDDLE_TIP, THUMB_IP, THUMB_TIP, TIP_IDS,
};

/// Index/middle tips closer than this (pixels) count as "merged" → seek.
pub const DEFAULT_SEEK_MERGE_PX: f32 = 60.0;

// ════════════════════════════════════════════════════════════════════════════
// GestureLabel
// ════════════════════════════════════════════════════════════════════════════

/// The gesture recognised in one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GestureLabel {
    /// No hand in frame.
    #[default]
    None,
    /// A hand, but no recognised pose (or unusable landmarks).
    Unknown,
    OpenPalm,
    ClosedFist,
    /// Thumb and index out, middle curled.
    VolumeMode,
    /// Index and middle out and pressed together.
    SeekMode,
}

impl GestureLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            GestureLabel::None       => "NONE",
            GestureLabel::Unknown    => "UNKNOWN",
            GestureLabel::OpenPalm   => "OPEN_PALM",
            GestureLabel::ClosedFist => "CLOSED_FIST",
            GestureLabel::VolumeMode => "VOLUME_MODE",
            GestureLabel::SeekMode   => "SEEK_MODE",
        }
    }
}

impl std::fmt::Display for GestureLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// FingerState
// ════════════════════════════════════════════════════════════════════════════

/// Which fingers are extended: `[thumb, index, middle, ring, pinky]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FingerState(pub [bool; 5]);

impl FingerState {
    pub fn thumb(&self)  -> bool { self.0[0] }
    pub fn index(&self)  -> bool { self.0[1] }
    pub fn middle(&self) -> bool { self.0[2] }
    pub fn ring(&self)   -> bool { self.0[3] }
    pub fn pinky(&self)  -> bool { self.0[4] }

    /// Number of extended fingers.
    pub fn count(&self) -> usize {
        self.0.iter().filter(|&&up| up).count()
    }

    /// `[1, 1, 0, 0, 0]`-style view, handy for logs.
    pub fn bits(&self) -> [u8; 5] {
        self.0.map(u8::from)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GestureMetadata
// ════════════════════════════════════════════════════════════════════════════

/// Geometry attached to the current label.  `None` means "not applicable
/// this frame", never zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GestureMetadata {
    /// Thumb tip ↔ index tip distance in pixels (`VolumeMode`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinch_distance: Option<f32>,
    /// Midpoint between thumb tip and index tip (`VolumeMode`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinch_coords: Option<(i32, i32)>,
    /// Index tip position (`SeekMode`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seek_coords: Option<(i32, i32)>,
}

impl GestureMetadata {
    pub fn is_empty(&self) -> bool {
        self.pinch_distance.is_none() && self.pinch_coords.is_none() && self.seek_coords.is_none()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Classification
// ════════════════════════════════════════════════════════════════════════════

/// Result of classifying one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label:    GestureLabel,
    /// `None` when there was no usable hand.
    pub fingers:  Option<FingerState>,
    pub metadata: GestureMetadata,
}

impl Classification {
    /// No hand in frame.
    pub fn none() -> Self {
        Classification::default()
    }

    /// Hand reported but landmarks unusable.
    pub fn unknown() -> Self {
        Classification { label: GestureLabel::Unknown, ..Classification::default() }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Configuration
// ════════════════════════════════════════════════════════════════════════════

/// Classifier tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Index/middle tip distance below which two raised fingers are "merged".
    pub seek_merge_px: f32,
    /// Optional `(width, height)` of the capture frame.  When set, skeletons
    /// with any point outside it are treated as unusable.
    pub frame: Option<(u32, u32)>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig { seek_merge_px: DEFAULT_SEEK_MERGE_PX, frame: None }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GestureClassifier
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default)]
pub struct GestureClassifier {
    config: ClassifierConfig,
}

impl GestureClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        GestureClassifier { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify one frame.
    ///
    /// Empty input yields [`GestureLabel::None`]; a slice that is not a
    /// complete, ordered, in-frame skeleton yields [`GestureLabel::Unknown`].
    /// Coordinates beyond [`MAX_COORD`](crate::MAX_COORD) are rejected even
    /// without frame bounds.
    /// Both come back without a finger vector or metadata.
    pub fn classify(&self, landmarks: &[Landmark], handedness: Handedness) -> Classification {
        if landmarks.is_empty() {
            return Classification::none();
        }
        let set = match LandmarkSet::from_slice(landmarks) {
            Ok(set) => set,
            Err(_)  => return Classification::unknown(),
        };
        if let Some((w, h)) = self.config.frame {
            if set.check_bounds(w, h).is_err() {
                return Classification::unknown();
            }
        }

        let fingers = finger_state(&set, handedness);
        let (label, metadata) = self.label(&set, fingers);
        Classification { label, fingers: Some(fingers), metadata }
    }

    /// Narrow patterns first, broad finger counts last.
    fn label(&self, set: &LandmarkSet, f: FingerState) -> (GestureLabel, GestureMetadata) {
        let mut meta = GestureMetadata::default();

        if f.thumb() && f.index() && !f.middle() {
            let thumb = set.get(THUMB_TIP);
            let index = set.get(INDEX_TIP);
            meta.pinch_distance = Some(thumb.distance(index));
            meta.pinch_coords   = Some(thumb.midpoint(index));
            return (GestureLabel::VolumeMode, meta);
        }

        if f.index() && f.middle() && !f.ring() && !f.pinky() {
            let index  = set.get(INDEX_TIP);
            let middle = set.get(MIDDLE_TIP);
            if index.distance(middle) < self.config.seek_merge_px {
                meta.seek_coords = Some(index.pos());
                return (GestureLabel::SeekMode, meta);
            }
            // Spread "V" reads as an open hand.
            return (GestureLabel::OpenPalm, meta);
        }

        let label = match f.count() {
            5 => GestureLabel::OpenPalm,
            0 => GestureLabel::ClosedFist,
            _ => GestureLabel::Unknown,
        };
        (label, meta)
    }
}

/// Classify with default thresholds and no frame bounds.
pub fn classify(landmarks: &[Landmark], handedness: Handedness) -> Classification {
    GestureClassifier::default().classify(landmarks, handedness)
}

// ════════════════════════════════════════════════════════════════════════════
// Finger geometry
// ════════════════════════════════════════════════════════════════════════════

/// Thumb openness from the tip and IP joint x-coordinates.
///
/// The frame is mirrored before tracking, so a left hand has its thumb on
/// the right of the IP joint when open and a right hand on the left.
/// `Unknown` is treated as `Right`.
pub fn thumb_open(tip_x: i32, ip_x: i32, handedness: Handedness) -> bool {
    match handedness {
        Handedness::Left                        => tip_x > ip_x,
        Handedness::Right | Handedness::Unknown => tip_x < ip_x,
    }
}

/// Extended fingers of a validated skeleton.
pub fn finger_state(set: &LandmarkSet, handedness: Handedness) -> FingerState {
    let mut up = [false; 5];
    up[0] = thumb_open(set.get(THUMB_TIP).x, set.get(THUMB_IP).x, handedness);
    for (slot, &tip) in up.iter_mut().zip(TIP_IDS.iter()).skip(1) {
        // Pixel y grows downward: a raised tip sits above its PIP joint.
        *slot = set.get(tip).y < set.get(tip - 2).y;
    }
    FingerState(up)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
