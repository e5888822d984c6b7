//! Integration module for connecting person trackers and PPE classifiers
//! with the track registry.
//!
//! This module provides the collaborator traits, the per-frame pipeline and
//! the read-only annotation snapshot produced for each committed frame.

mod annotation;
mod builder;
mod detector;
mod pipeline;

pub use annotation::{FrameAnnotations, TrackAnnotation, label_color};
pub use builder::DetectionBuilder;
pub use detector::{PersonTracker, PpeClassifier};
pub use pipeline::{FrameOutcome, PipelineError, PpePipeline};
