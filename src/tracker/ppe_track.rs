//! Per-person PPE evidence record.

use std::collections::HashSet;

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::tracker::completeness::CompletenessPolicy;
use crate::tracker::detection::{FrameNumber, TrackId};
use crate::tracker::track_state::TrackState;

/// RGB display colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub u8, pub u8, pub u8);

impl Color {
    pub const GREEN: Color = Color(0, 255, 0);
    pub const RED: Color = Color(255, 0, 0);
    pub const BLUE: Color = Color(0, 0, 255);
    pub const YELLOW: Color = Color(255, 255, 0);
    pub const CYAN: Color = Color(0, 255, 255);
    pub const WHITE: Color = Color(255, 255, 255);

    /// Random colour seeded by the track id, so a track keeps its colour
    /// across runs.
    pub fn for_track(track_id: TrackId) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(track_id.0);
        let mut rgb = [0u8; 3];
        rng.fill_bytes(&mut rgb);
        let [r, g, b] = rgb;
        Self(r, g, b)
    }
}

/// Outcome of feeding one frame of labels into a track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowProgress {
    /// The window is still filling
    Accumulating { frames_in_window: u32 },
    /// The window closed and produced a new verdict
    Evaluated {
        full_ppe: bool,
        /// Required labels that never showed up during the window
        missing: Vec<String>,
    },
}

/// PPE state for one tracked person.
///
/// Records are owned by the [`TrackRegistry`](crate::tracker::TrackRegistry);
/// outside the crate they are read-only.
#[derive(Debug, Clone)]
pub struct PpeTrack {
    track_id: TrackId,
    ppe_evidence: HashSet<String>,
    frames_in_window: u32,
    full_ppe: bool,
    first_seen_frame: FrameNumber,
    last_seen_frame: FrameNumber,
    color: Color,
}

impl PpeTrack {
    pub(crate) fn new(track_id: TrackId, frame: FrameNumber) -> Self {
        Self {
            track_id,
            ppe_evidence: HashSet::new(),
            frames_in_window: 0,
            full_ppe: false,
            first_seen_frame: frame,
            last_seen_frame: frame,
            color: Color::for_track(track_id),
        }
    }

    pub fn track_id(&self) -> TrackId {
        self.track_id
    }

    /// Distinct labels seen since the last window reset.
    pub fn ppe_evidence(&self) -> &HashSet<String> {
        &self.ppe_evidence
    }

    pub fn frames_in_window(&self) -> u32 {
        self.frames_in_window
    }

    /// Verdict from the most recently closed window.
    pub fn full_ppe(&self) -> bool {
        self.full_ppe
    }

    pub fn first_seen_frame(&self) -> FrameNumber {
        self.first_seen_frame
    }

    pub fn last_seen_frame(&self) -> FrameNumber {
        self.last_seen_frame
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// Frames since the track was created.
    pub fn age(&self, current: FrameNumber) -> u64 {
        current.saturating_sub(self.first_seen_frame)
    }

    /// Lifecycle phase as of `current`.
    pub fn state(&self, current: FrameNumber) -> TrackState {
        if self.last_seen_frame < current {
            TrackState::Stale
        } else if self.first_seen_frame == self.last_seen_frame {
            TrackState::Created
        } else {
            TrackState::Active
        }
    }

    pub(crate) fn mark_seen(&mut self, frame: FrameNumber) {
        self.last_seen_frame = self.last_seen_frame.max(frame);
    }

    /// Union `labels` into the window, then close the window if it is full.
    pub(crate) fn accumulate<'a, I>(
        &mut self,
        labels: I,
        window_size: u32,
        policy: &CompletenessPolicy,
    ) -> WindowProgress
    where
        I: IntoIterator<Item = &'a String>,
    {
        self.ppe_evidence.extend(labels.into_iter().cloned());
        self.frames_in_window += 1;

        if self.frames_in_window >= window_size {
            let missing = policy
                .missing(&self.ppe_evidence)
                .into_iter()
                .map(String::from)
                .collect();
            self.full_ppe = policy.is_complete(&self.ppe_evidence);
            self.ppe_evidence.clear();
            self.frames_in_window = 0;
            WindowProgress::Evaluated {
                full_ppe: self.full_ppe,
                missing,
            }
        } else {
            WindowProgress::Accumulating {
                frames_in_window: self.frames_in_window,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::detection::{GLASSES, GLOVES, HELMET, VEST};

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_new_track_defaults() {
        let track = PpeTrack::new(TrackId(7), 4);
        assert_eq!(track.track_id(), TrackId(7));
        assert!(track.ppe_evidence().is_empty());
        assert_eq!(track.frames_in_window(), 0);
        assert!(!track.full_ppe());
        assert_eq!(track.first_seen_frame(), 4);
        assert_eq!(track.last_seen_frame(), 4);
        assert_eq!(track.state(4), TrackState::Created);
    }

    #[test]
    fn test_state_transitions() {
        let mut track = PpeTrack::new(TrackId(1), 1);
        assert_eq!(track.state(2), TrackState::Stale);
        track.mark_seen(2);
        assert_eq!(track.state(2), TrackState::Active);
        assert_eq!(track.state(5), TrackState::Stale);
        track.mark_seen(5);
        assert_eq!(track.state(5), TrackState::Active);
    }

    #[test]
    fn test_mark_seen_never_decreases() {
        let mut track = PpeTrack::new(TrackId(1), 10);
        track.mark_seen(8);
        assert_eq!(track.last_seen_frame(), 10);
    }

    #[test]
    fn test_window_evaluates_and_resets() {
        let policy = CompletenessPolicy::default();
        let mut track = PpeTrack::new(TrackId(1), 1);

        let first = labels(&[HELMET, VEST]);
        assert_eq!(
            track.accumulate(&first, 3, &policy),
            WindowProgress::Accumulating { frames_in_window: 1 }
        );
        let second = labels(&[GLOVES, GLASSES]);
        track.accumulate(&second, 3, &policy);
        assert_eq!(track.ppe_evidence().len(), 4);

        let progress = track.accumulate(std::iter::empty(), 3, &policy);
        assert_eq!(
            progress,
            WindowProgress::Evaluated {
                full_ppe: true,
                missing: vec![]
            }
        );
        assert!(track.full_ppe());
        assert!(track.ppe_evidence().is_empty());
        assert_eq!(track.frames_in_window(), 0);
    }

    #[test]
    fn test_verdict_frozen_until_next_window() {
        let policy = CompletenessPolicy::default();
        let mut track = PpeTrack::new(TrackId(1), 1);
        let full = labels(&[HELMET, VEST, GLOVES]);
        track.accumulate(&full, 1, &policy);
        assert!(track.full_ppe());

        let partial = labels(&[HELMET]);
        track.accumulate(&partial, 2, &policy);
        assert!(track.full_ppe());
        let progress = track.accumulate(&partial, 2, &policy);
        assert!(!track.full_ppe());
        assert_eq!(
            progress,
            WindowProgress::Evaluated {
                full_ppe: false,
                missing: vec![GLOVES.to_string(), VEST.to_string()]
            }
        );
    }

    #[test]
    fn test_track_color_is_stable() {
        assert_eq!(Color::for_track(TrackId(3)), Color::for_track(TrackId(3)));
        assert_ne!(Color::for_track(TrackId(3)), Color::for_track(TrackId(4)));
    }
}
