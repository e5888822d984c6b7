//! Track registry: lifecycle, evidence accumulation and windowed verdicts.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use crate::config::{ConfigError, PpeConfig};
use crate::tracker::completeness::CompletenessPolicy;
use crate::tracker::detection::{FrameNumber, PersonDetection, TrackEvidence, TrackId};
use crate::tracker::eviction::EvictionPolicy;
use crate::tracker::ppe_track::{PpeTrack, WindowProgress};
use crate::tracker::rect::DetectionError;
use crate::tracker::track_state::TrackState;

/// Per-track problem found while applying a frame. The rest of the frame
/// is still committed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpdateFault {
    /// The person box is unusable, so no evidence is taken for the track
    #[error("track {track_id}: {source}")]
    MalformedBox {
        track_id: TrackId,
        #[source]
        source: DetectionError,
    },
    /// Evidence names a track that is not active in this frame
    #[error("evidence for track {0}, which is not active in this frame")]
    UnknownTrack(TrackId),
    /// The same id appeared twice in the active set or evidence list
    #[error("track {0} reported more than once in one frame")]
    DuplicateTrack(TrackId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("frame {current} does not follow frame {previous}")]
    NonMonotonicFrame {
        previous: FrameNumber,
        current: FrameNumber,
    },
}

/// Verdict produced when a track's window closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowVerdict {
    pub track_id: TrackId,
    pub full_ppe: bool,
    pub missing: Vec<String>,
}

/// What changed while committing one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub frame: FrameNumber,
    pub created: Vec<TrackId>,
    pub evicted: Vec<TrackId>,
    pub evaluated: Vec<WindowVerdict>,
    pub faults: Vec<UpdateFault>,
}

impl FrameReport {
    /// Lifecycle transitions committed by this frame: evictions first, then
    /// creations, each in the order they are listed in the report.
    pub fn transitions(&self) -> impl Iterator<Item = (TrackId, TrackState)> + '_ {
        let evicted = self.evicted.iter().map(|&id| (id, TrackState::Evicted));
        let created = self.created.iter().map(|&id| (id, TrackState::Created));
        evicted.chain(created)
    }
}

/// Owner of all per-person PPE state.
///
/// The registry is mutated only through [`TrackRegistry::update`], which
/// applies one frame as a unit: eviction, upsert, evidence accumulation and
/// window evaluation, in that order.
#[derive(Debug, Clone)]
pub struct TrackRegistry {
    tracks: HashMap<TrackId, PpeTrack>,
    window_size: u32,
    completeness: CompletenessPolicy,
    eviction: EvictionPolicy,
    last_frame: Option<FrameNumber>,
}

impl Default for TrackRegistry {
    fn default() -> Self {
        Self::from_checked(&PpeConfig::default())
    }
}

impl TrackRegistry {
    /// Build an empty registry. Fails on a zero window or an empty
    /// required set.
    pub fn new(config: &PpeConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_checked(config))
    }

    fn from_checked(config: &PpeConfig) -> Self {
        Self {
            tracks: HashMap::new(),
            window_size: config.window_size,
            completeness: config.completeness_policy(),
            eviction: config.eviction_policy(),
            last_frame: None,
        }
    }

    pub fn window_size(&self) -> u32 {
        self.window_size
    }

    pub fn completeness(&self) -> &CompletenessPolicy {
        &self.completeness
    }

    pub fn eviction(&self) -> EvictionPolicy {
        self.eviction
    }

    /// Last committed frame, if any.
    pub fn current_frame(&self) -> Option<FrameNumber> {
        self.last_frame
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn contains(&self, track_id: TrackId) -> bool {
        self.tracks.contains_key(&track_id)
    }

    pub fn get(&self, track_id: TrackId) -> Option<&PpeTrack> {
        self.tracks.get(&track_id)
    }

    /// Current verdict for a track, `None` if the id is not registered.
    pub fn verdict(&self, track_id: TrackId) -> Option<bool> {
        self.get(track_id).map(PpeTrack::full_ppe)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PpeTrack> {
        self.tracks.values()
    }

    /// Track ids in ascending order.
    pub fn track_ids(&self) -> Vec<TrackId> {
        let mut ids: Vec<_> = self.tracks.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Commit one frame.
    ///
    /// Person boxes are only checked for shape here; use
    /// [`update_within`](Self::update_within) to also check them against
    /// the frame size.
    pub fn update(
        &mut self,
        frame: FrameNumber,
        active: &[PersonDetection],
        evidence: &[TrackEvidence],
    ) -> Result<FrameReport, RegistryError> {
        self.apply(frame, None, active, evidence)
    }

    /// Commit one frame, treating person boxes that leave a
    /// `width` x `height` frame as malformed.
    pub fn update_within(
        &mut self,
        frame: FrameNumber,
        (width, height): (usize, usize),
        active: &[PersonDetection],
        evidence: &[TrackEvidence],
    ) -> Result<FrameReport, RegistryError> {
        self.apply(frame, Some((width, height)), active, evidence)
    }

    fn apply(
        &mut self,
        frame: FrameNumber,
        bounds: Option<(usize, usize)>,
        active: &[PersonDetection],
        evidence: &[TrackEvidence],
    ) -> Result<FrameReport, RegistryError> {
        if let Some(previous) = self.last_frame {
            if frame <= previous {
                return Err(RegistryError::NonMonotonicFrame {
                    previous,
                    current: frame,
                });
            }
        }

        let mut report = FrameReport {
            frame,
            ..Default::default()
        };

        // Active ids mapped to whether their box may carry evidence.
        let mut accepts_evidence: HashMap<TrackId, bool> = HashMap::with_capacity(active.len());
        let mut order = Vec::with_capacity(active.len());
        for person in active {
            if accepts_evidence.contains_key(&person.track_id) {
                report.faults.push(UpdateFault::DuplicateTrack(person.track_id));
                continue;
            }
            let checked = match bounds {
                Some((width, height)) => person.bbox.validate_within(width, height),
                None => person.bbox.validate_within(usize::MAX, usize::MAX),
            };
            if let Err(source) = checked {
                report.faults.push(UpdateFault::MalformedBox {
                    track_id: person.track_id,
                    source,
                });
            }
            accepts_evidence.insert(person.track_id, checked.is_ok());
            order.push(person.track_id);
        }

        report.evicted = self.evict_stale(frame, &accepts_evidence);

        for &track_id in &order {
            if self.upsert_on_detection(track_id, frame) {
                report.created.push(track_id);
            }
        }

        let mut evidenced = HashSet::with_capacity(evidence.len());
        for item in evidence {
            match accepts_evidence.get(&item.track_id).copied() {
                None => report.faults.push(UpdateFault::UnknownTrack(item.track_id)),
                Some(false) => {}
                Some(true) if !evidenced.insert(item.track_id) => {
                    report.faults.push(UpdateFault::DuplicateTrack(item.track_id));
                }
                Some(true) => match self.record_evidence(item.track_id, &item.labels) {
                    Some(verdict) => report.evaluated.push(verdict),
                    None if self.contains(item.track_id) => {}
                    None => report.faults.push(UpdateFault::UnknownTrack(item.track_id)),
                },
            }
        }

        // Active tracks without an evidence entry still count the frame.
        let silent = order
            .iter()
            .filter(|id| accepts_evidence[*id] && !evidenced.contains(*id));
        for &track_id in silent {
            if let Some(verdict) = self.record_evidence(track_id, &[]) {
                report.evaluated.push(verdict);
            }
        }

        for fault in &report.faults {
            warn!(frame, %fault, "discarded detection update");
        }

        self.last_frame = Some(frame);
        Ok(report)
    }

    /// Remove tracks absent from `active` whose age exceeds the limit.
    fn evict_stale(
        &mut self,
        frame: FrameNumber,
        active: &HashMap<TrackId, bool>,
    ) -> Vec<TrackId> {
        let eviction = self.eviction;
        let mut evicted = Vec::new();
        self.tracks.retain(|track_id, track| {
            let keep = active.contains_key(track_id)
                || !eviction.is_expired(track.last_seen_frame(), frame);
            if !keep {
                info!(
                    track_id = %track_id,
                    frame,
                    last_seen = track.last_seen_frame(),
                    "evicting stale track"
                );
                evicted.push(*track_id);
            }
            keep
        });
        evicted.sort_unstable();
        evicted
    }

    /// Create the track on first sight, otherwise refresh its last sighting.
    /// Returns `true` when a new record was created.
    fn upsert_on_detection(&mut self, track_id: TrackId, frame: FrameNumber) -> bool {
        match self.tracks.entry(track_id) {
            Entry::Occupied(mut entry) => {
                entry.get_mut().mark_seen(frame);
                false
            }
            Entry::Vacant(entry) => {
                debug!(track_id = %track_id, frame, "new track");
                entry.insert(PpeTrack::new(track_id, frame));
                true
            }
        }
    }

    /// Add one frame of labels to a track. Returns the verdict if this frame
    /// closed the track's window, `None` otherwise or if the id is unknown.
    fn record_evidence(&mut self, track_id: TrackId, labels: &[String]) -> Option<WindowVerdict> {
        let track = self.tracks.get_mut(&track_id)?;
        match track.accumulate(labels, self.window_size, &self.completeness) {
            WindowProgress::Accumulating { .. } => None,
            WindowProgress::Evaluated { full_ppe, missing } => {
                debug!(
                    track_id = %track_id,
                    full_ppe,
                    missing = ?missing,
                    "ppe window evaluated"
                );
                Some(WindowVerdict {
                    track_id,
                    full_ppe,
                    missing,
                })
            }
        }
    }
}
