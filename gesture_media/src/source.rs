//! Landmark sources: where per-frame hand skeletons come from.
//!
//! The public interface is [`Frame`] delivered over a bounded channel.
//! Consumers don't need to know whether frames came from a recording or
//! from live hardware.
//!
//! * [`ReplaySource`] reads JSON lines from a file or stdin (always
//!   available).
//! * [`LeapSource`] polls a LeapMotion controller (`leap` feature).

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use hand_gesture::{Handedness, Landmark};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read landmarks: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: {source}")]
    Json { line: usize, source: serde_json::Error },
}

// ════════════════════════════════════════════════════════════════════════════
// Frame
// ════════════════════════════════════════════════════════════════════════════

/// What the landmark tracker saw in one captured frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Frame {
    /// Whether a hand was detected at all.
    pub present:    bool,
    /// 21 points when `present`, empty otherwise.
    pub landmarks:  Vec<Landmark>,
    pub handedness: Handedness,
    /// Capture time in seconds from the start of a recording.  Live sources
    /// leave this empty and the consumer stamps frames on arrival.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t:          Option<f64>,
}

impl Frame {
    /// A frame with no hand in it.
    pub fn absent() -> Self {
        Frame::default()
    }

    pub fn hand(landmarks: Vec<Landmark>, handedness: Handedness) -> Self {
        Frame { present: true, landmarks, handedness, t: None }
    }

    /// Landmarks to classify: empty unless a hand is present.
    pub fn hand_landmarks(&self) -> &[Landmark] {
        if self.present { self.landmarks.as_slice() } else { &[] }
    }

    /// Flip x for a frame `width` pixels wide, as a horizontal mirror of
    /// the capture image would.
    pub fn mirror(&mut self, width: u32) {
        let max_x = i64::from(width) - 1;
        for l in &mut self.landmarks {
            let x = max_x - i64::from(l.x);
            l.x = x.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LandmarkSource trait
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver [`Frame`]s over a channel.
///
/// The channel holds a single frame.  Recorded sources block on a full
/// channel so nothing is skipped; live sources drop the frame instead so
/// the consumer always sees the freshest one.
pub trait LandmarkSource: Send + 'static {
    fn run(self: Box<Self>, tx: SyncSender<Frame>);
}

/// Spawn a landmark source on its own thread and return the receiving end.
pub fn spawn_landmark_source(source: Box<dyn LandmarkSource>) -> Receiver<Frame> {
    let (tx, rx) = mpsc::sync_channel(1);
    thread::spawn(move || source.run(tx));
    rx
}

/// `epoch` shifted by a recorded timestamp `t` seconds.  `None` when `t`
/// is negative, not finite, or too far out to represent.
pub fn recorded_instant(epoch: Instant, t: f64) -> Option<Instant> {
    Duration::try_from_secs_f64(t).ok().and_then(|d| epoch.checked_add(d))
}

// ════════════════════════════════════════════════════════════════════════════
// ReplaySource — JSON lines
// ════════════════════════════════════════════════════════════════════════════

/// Parse one JSON-lines record.
///
/// ```json
/// {"present": true, "handedness": "Right", "landmarks": [[0, 310, 400], ...], "t": 0.033}
/// ```
///
/// Coordinates are pixels; fractional values are rounded.
pub fn parse_frame(line: &str, line_no: usize) -> Result<Frame, SourceError> {
    serde_json::from_str(line).map_err(|source| SourceError::Json { line: line_no, source })
}

/// Replays recorded frames, one JSON object per line.  Blank lines and
/// lines starting with `#` are skipped; unparsable lines are logged and
/// skipped.
pub struct ReplaySource {
    reader:   Box<dyn BufRead + Send>,
    mirror:   Option<u32>,
    realtime: bool,
}

impl ReplaySource {
    pub fn new(reader: Box<dyn BufRead + Send>) -> Self {
        ReplaySource { reader, mirror: None, realtime: false }
    }

    /// Open `path`, or stdin when `path` is `-`.
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let reader: Box<dyn BufRead + Send> = if path == Path::new("-") {
            Box::new(BufReader::new(io::stdin()))
        } else {
            Box::new(BufReader::new(File::open(path)?))
        };
        Ok(ReplaySource::new(reader))
    }

    /// Mirror every frame horizontally for a capture `width` pixels wide.
    pub fn mirrored(mut self, width: u32) -> Self {
        self.mirror = Some(width);
        self
    }

    /// Sleep between frames so they arrive at their recorded `t`.
    pub fn realtime(mut self, on: bool) -> Self {
        self.realtime = on;
        self
    }

    /// Every parsable frame in order.
    pub fn frames(self) -> impl Iterator<Item = Frame> {
        let mirror = self.mirror;
        self.reader
            .lines()
            .enumerate()
            .filter_map(move |(i, line)| {
                let line = match line {
                    Ok(l) => l,
                    Err(e) => {
                        warn!("replay read error: {}", e);
                        return None;
                    }
                };
                let trimmed = line.trim();
                if trimmed.is_empty() || trimmed.starts_with('#') {
                    return None;
                }
                match parse_frame(trimmed, i + 1) {
                    Ok(mut f) => {
                        if let Some(w) = mirror {
                            f.mirror(w);
                        }
                        Some(f)
                    }
                    Err(e) => {
                        warn!("skipping frame: {}", e);
                        None
                    }
                }
            })
    }
}

impl LandmarkSource for ReplaySource {
    fn run(self: Box<Self>, tx: SyncSender<Frame>) {
        let realtime = self.realtime;
        let start = Instant::now();
        let mut sent = 0usize;

        for frame in self.frames() {
            if realtime {
                if let Some(due) = frame.t.and_then(|t| recorded_instant(start, t)) {
                    let now = Instant::now();
                    if due > now {
                        thread::sleep(due - now);
                    }
                }
            }
            if tx.send(frame).is_err() {
                debug!("replay consumer hung up");
                return;
            }
            sent += 1;
        }
        info!(frames = sent, "replay finished");
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LeapSource — real hardware (feature = "leap")
// ════════════════════════════════════════════════════════════════════════════

/// Landmark source backed by a LeapMotion controller.
///
/// Requires the `leap` feature flag and the LeapC shared library installed.
///
/// Leap joints are millimetres in device space (x to the user's right,
/// y up).  The interaction box x ∈ [-200, 200], y ∈ [100, 500] is scaled
/// onto a `width × height` pixel frame with y flipped, which yields the
/// same mirrored, y-down layout a selfie camera would after flipping.
#[cfg(feature = "leap")]
pub struct LeapSource {
    pub width:  u32,
    pub height: u32,
}

#[cfg(feature = "leap")]
impl LeapSource {
    const X_RANGE: (f32, f32) = (-200.0, 200.0);
    const Y_RANGE: (f32, f32) = (100.0, 500.0);

    fn project(&self, x: f32, y: f32) -> (i32, i32) {
        let u = (x - Self::X_RANGE.0) / (Self::X_RANGE.1 - Self::X_RANGE.0);
        let v = (Self::Y_RANGE.1 - y) / (Self::Y_RANGE.1 - Self::Y_RANGE.0);
        ((u * self.width as f32) as i32, (v * self.height as f32) as i32)
    }

    /// Map one Leap hand onto the 21-point layout: wrist from the palm,
    /// then per digit the base of the proximal, intermediate and distal
    /// bones and the distal tip.
    fn landmarks(&self, hand: &leaprs::Hand) -> Vec<Landmark> {
        let mut out = Vec::with_capacity(hand_gesture::LANDMARK_COUNT);
        let palm = hand.palm().position();
        let (x, y) = self.project(palm.x, palm.y);
        out.push(Landmark::new(0, x, y));

        for digit in hand.digits() {
            let joints = [
                digit.proximal().prev_joint(),
                digit.intermediate().prev_joint(),
                digit.distal().prev_joint(),
                digit.distal().next_joint(),
            ];
            for j in joints {
                let (x, y) = self.project(j.x, j.y);
                out.push(Landmark::new(out.len() as u8, x, y));
            }
        }
        out
    }
}

#[cfg(feature = "leap")]
impl LandmarkSource for LeapSource {
    fn run(self: Box<Self>, tx: SyncSender<Frame>) {
        use leaprs::*;
        use std::sync::mpsc::TrySendError;

        let mut connection = match Connection::create(ConnectionConfig::default()) {
            Ok(c)  => c,
            Err(e) => {
                tracing::error!("failed to create LeapC connection: {:?}", e);
                return;
            }
        };
        if let Err(e) = connection.open() {
            tracing::error!("failed to open LeapMotion device: {:?}", e);
            return;
        }
        info!("LeapMotion connected");

        loop {
            let msg = match connection.poll(100) {
                Ok(m)  => m,
                Err(_) => continue,
            };

            if let Event::Tracking(frame) = msg.event() {
                let hands: Vec<_> = frame.hands().collect();
                let out = match hands.first() {
                    None => Frame::absent(),
                    Some(hand) => {
                        let handedness = match hand.hand_type() {
                            HandType::Left  => Handedness::Left,
                            HandType::Right => Handedness::Right,
                        };
                        Frame::hand(self.landmarks(hand), handedness)
                    }
                };
                match tx.try_send(out) {
                    Ok(()) | Err(TrySendError::Full(_)) => {}
                    Err(TrySendError::Disconnected(_))  => return,
                }
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
