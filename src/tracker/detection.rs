//! Detection records exchanged with the person tracker and PPE classifier.

use std::fmt;

use crate::tracker::rect::Rect;

/// Frame counter value. The first frame of a stream is 1.
pub type FrameNumber = u64;

pub const HELMET: &str = "helmet";
pub const VEST: &str = "vest";
pub const GLOVES: &str = "gloves";
pub const GLASSES: &str = "glasses";
pub const PERSON: &str = "person";

/// Identifier assigned to a person by the external tracker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TrackId(pub u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TrackId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// A tracked person in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersonDetection {
    pub track_id: TrackId,
    /// Person box in frame coordinates
    pub bbox: Rect,
}

impl PersonDetection {
    pub fn new(track_id: u64, bbox: Rect) -> Self {
        Self {
            track_id: TrackId(track_id),
            bbox,
        }
    }
}

/// A PPE item found by the classifier.
///
/// The box is crop-local when returned by a classifier and frame-global once
/// the pipeline has translated it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PpeDetection {
    pub label: String,
    pub bbox: Rect,
}

impl PpeDetection {
    pub fn new(label: impl Into<String>, bbox: Rect) -> Self {
        Self {
            label: label.into(),
            bbox,
        }
    }

    /// Move the detection from crop-local into frame coordinates.
    pub fn to_global(&self, crop: &Rect) -> Self {
        Self {
            label: self.label.clone(),
            bbox: self.bbox.translate(crop.origin()),
        }
    }
}

/// Labels observed for one track in one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackEvidence {
    pub track_id: TrackId,
    pub labels: Vec<String>,
}

impl TrackEvidence {
    pub fn new<I, S>(track_id: u64, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            track_id: TrackId(track_id),
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_detections(track_id: TrackId, detections: &[PpeDetection]) -> Self {
        Self {
            track_id,
            labels: detections.iter().map(|d| d.label.clone()).collect(),
        }
    }
}
