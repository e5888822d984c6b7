//! Age-based removal of tracks the person tracker stopped reporting.

use crate::tracker::detection::FrameNumber;

/// Frame-count age limit for absent tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvictionPolicy {
    /// Frames a track may stay unseen before removal
    pub max_track_age: u64,
}

impl Default for EvictionPolicy {
    fn default() -> Self {
        Self { max_track_age: 30 }
    }
}

impl EvictionPolicy {
    pub fn new(max_track_age: u64) -> Self {
        Self { max_track_age }
    }

    /// Frames elapsed since `last_seen`, saturating at zero.
    #[inline]
    pub fn gap(last_seen: FrameNumber, current: FrameNumber) -> u64 {
        current.saturating_sub(last_seen)
    }

    /// A track is expired once its gap strictly exceeds `max_track_age`.
    #[inline]
    pub fn is_expired(&self, last_seen: FrameNumber, current: FrameNumber) -> bool {
        Self::gap(last_seen, current) > self.max_track_age
    }
}
