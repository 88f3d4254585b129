//! Body landmarks and per-frame landmark sets.
//!
//! A [`LandmarkFrame`] always exposes exactly [`LANDMARK_COUNT`] slots. A slot
//! is `None` when the estimator did not report that point; the validity gate
//! treats a missing point the same as an under-confident one.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Monotonic timestamp in nanoseconds since the stream started.
pub type TimestampNs = u64;

/// Number of landmarks produced by the pose estimator per frame.
pub const LANDMARK_COUNT: usize = 33;

/// Values per landmark in flat estimator output (`x, y, visibility`).
pub const FLAT_STRIDE: usize = 3;

pub const NOSE: usize = 0;
pub const LEFT_SHOULDER: usize = 11;
pub const RIGHT_SHOULDER: usize = 12;
pub const LEFT_ELBOW: usize = 13;
pub const RIGHT_ELBOW: usize = 14;
pub const LEFT_WRIST: usize = 15;
pub const RIGHT_WRIST: usize = 16;
pub const LEFT_HIP: usize = 23;
pub const RIGHT_HIP: usize = 24;
pub const LEFT_KNEE: usize = 25;
pub const RIGHT_KNEE: usize = 26;
pub const LEFT_ANKLE: usize = 27;
pub const RIGHT_ANKLE: usize = 28;

/// Human-readable name for the landmarks the counters use.
pub fn landmark_name(index: usize) -> &'static str {
    match index {
        NOSE => "nose",
        LEFT_SHOULDER => "left_shoulder",
        RIGHT_SHOULDER => "right_shoulder",
        LEFT_ELBOW => "left_elbow",
        RIGHT_ELBOW => "right_elbow",
        LEFT_WRIST => "left_wrist",
        RIGHT_WRIST => "right_wrist",
        LEFT_HIP => "left_hip",
        RIGHT_HIP => "right_hip",
        LEFT_KNEE => "left_knee",
        RIGHT_KNEE => "right_knee",
        LEFT_ANKLE => "left_ankle",
        RIGHT_ANKLE => "right_ankle",
        i if i < LANDMARK_COUNT => "other",
        _ => "invalid",
    }
}

/// A single tracked body point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPoint {
    /// Normalized X coordinate [0.0, 1.0].
    pub x: f64,
    /// Normalized Y coordinate [0.0, 1.0].
    pub y: f64,
    /// Confidence [0.0, 1.0] that the point is located and unoccluded.
    pub visibility: f64,
}

impl LandmarkPoint {
    pub fn new(x: f64, y: f64, visibility: f64) -> Self {
        Self { x, y, visibility }
    }

    /// Whether visibility is strictly above `threshold`.
    pub fn is_visible(&self, threshold: f64) -> bool {
        self.visibility > threshold
    }

    /// Position as an `(x, y)` pair. Depth is never used.
    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }
}

/// The full landmark set reported for one camera frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FrameRecord", into = "FrameRecord")]
pub struct LandmarkFrame {
    timestamp_ns: Option<TimestampNs>,
    points: Vec<Option<LandmarkPoint>>,
}

/// On-the-wire shape of a frame. Short landmark lists are padded with
/// missing points; longer ones are rejected.
#[derive(Serialize, Deserialize)]
struct FrameRecord {
    #[serde(rename = "t", default, skip_serializing_if = "Option::is_none")]
    timestamp_ns: Option<TimestampNs>,
    landmarks: Vec<Option<LandmarkPoint>>,
}

impl TryFrom<FrameRecord> for LandmarkFrame {
    type Error = ModelError;

    fn try_from(record: FrameRecord) -> Result<Self, Self::Error> {
        let frame = Self::new(record.landmarks)?;
        Ok(match record.timestamp_ns {
            Some(ns) => frame.with_timestamp(ns),
            None => frame,
        })
    }
}

impl From<LandmarkFrame> for FrameRecord {
    fn from(frame: LandmarkFrame) -> Self {
        Self {
            timestamp_ns: frame.timestamp_ns,
            landmarks: frame.points,
        }
    }
}

impl LandmarkFrame {
    /// A frame in which no landmark was detected.
    pub fn empty() -> Self {
        Self {
            timestamp_ns: None,
            points: vec![None; LANDMARK_COUNT],
        }
    }

    /// Build a frame from up to [`LANDMARK_COUNT`] slots, padding the rest
    /// as missing.
    pub fn new(mut points: Vec<Option<LandmarkPoint>>) -> Result<Self, ModelError> {
        if points.len() > LANDMARK_COUNT {
            return Err(ModelError::TooManyLandmarks {
                actual: points.len(),
                max: LANDMARK_COUNT,
            });
        }
        points.resize(LANDMARK_COUNT, None);
        Ok(Self {
            timestamp_ns: None,
            points,
        })
    }

    /// Build a frame from flat estimator output: `x, y, visibility` per
    /// landmark, 99 values in total.
    pub fn from_flat(data: &[f64]) -> Result<Self, ModelError> {
        let expected = LANDMARK_COUNT * FLAT_STRIDE;
        if data.len() != expected {
            return Err(ModelError::FlatLength {
                actual: data.len(),
                expected,
            });
        }

        let points = data
            .chunks_exact(FLAT_STRIDE)
            .map(|c| Some(LandmarkPoint::new(c[0], c[1], c[2])))
            .collect();

        Ok(Self {
            timestamp_ns: None,
            points,
        })
    }

    /// Attach a stream timestamp.
    pub fn with_timestamp(mut self, timestamp_ns: TimestampNs) -> Self {
        self.timestamp_ns = Some(timestamp_ns);
        self
    }

    /// Builder-style point assignment.
    pub fn with_point(mut self, index: usize, point: LandmarkPoint) -> Result<Self, ModelError> {
        self.set(index, Some(point))?;
        Ok(self)
    }

    /// Replace or clear the point at `index`.
    pub fn set(&mut self, index: usize, point: Option<LandmarkPoint>) -> Result<(), ModelError> {
        let slot = self
            .points
            .get_mut(index)
            .ok_or(ModelError::IndexOutOfRange { index })?;
        *slot = point;
        Ok(())
    }

    /// The point at `index`, or `None` when missing or out of range.
    pub fn get(&self, index: usize) -> Option<&LandmarkPoint> {
        self.points.get(index).and_then(Option::as_ref)
    }

    pub fn timestamp_ns(&self) -> Option<TimestampNs> {
        self.timestamp_ns
    }

    /// Iterate over all slots in index order.
    pub fn points(&self) -> impl Iterator<Item = Option<&LandmarkPoint>> {
        self.points.iter().map(Option::as_ref)
    }

    /// Number of points whose visibility is strictly above `threshold`.
    pub fn visible_count(&self, threshold: f64) -> usize {
        self.points()
            .flatten()
            .filter(|p| p.is_visible(threshold))
            .count()
    }
}

impl Default for LandmarkFrame {
    fn default() -> Self {
        Self::empty()
    }
}
