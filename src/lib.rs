//! Per-person PPE completeness tracking.
//!
//! A [`TrackRegistry`] keeps one [`PpeTrack`] per person id reported by an
//! external tracker, unions the PPE labels seen for that person over a fixed
//! window of frames, and turns each full window into a verdict through the
//! [`CompletenessPolicy`]. Tracks that stop being reported are evicted after
//! `max_track_age` frames.
//!
//! [`PpePipeline`] drives the registry from any [`PersonTracker`] and
//! [`PpeClassifier`] implementation, one frame at a time.

pub mod config;
pub mod integration;
pub mod tracker;

pub use config::{ConfigError, FailurePolicy, PpeConfig};
pub use integration::{
    DetectionBuilder, FrameAnnotations, FrameOutcome, PersonTracker, PipelineError, PpeClassifier,
    PpePipeline, TrackAnnotation, label_color,
};
pub use tracker::{
    Color, CompletenessPolicy, DetectionError, EvictionPolicy, FrameNumber, FrameReport,
    PersonDetection, PpeDetection, PpeTrack, Rect, RegistryError, TrackEvidence, TrackId,
    TrackRegistry, TrackState, UpdateFault, WindowVerdict,
};
