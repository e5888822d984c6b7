mod completeness;
mod detection;
mod eviction;
mod ppe_track;
mod rect;
mod registry;
mod track_state;

pub use completeness::CompletenessPolicy;
pub use detection::{
    FrameNumber, GLASSES, GLOVES, HELMET, PERSON, PersonDetection, PpeDetection, TrackEvidence,
    TrackId, VEST,
};
pub use eviction::EvictionPolicy;
pub use ppe_track::{Color, PpeTrack, WindowProgress};
pub use rect::{DetectionError, Rect};
pub use registry::{FrameReport, RegistryError, TrackRegistry, UpdateFault, WindowVerdict};
pub use track_state::TrackState;
