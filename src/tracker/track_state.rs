/// Lifecycle phase of a tracked person.
///
/// `Created -> Active -> Stale -> Evicted`, where `Stale` falls back to
/// `Active` on reappearance and `Evicted` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackState {
    /// First seen in the current frame
    #[default]
    Created,
    /// Reported by the person tracker in the current frame
    Active,
    /// Missing from the current frame but still within the age limit
    Stale,
    /// Removed from the registry. Reported through
    /// [`FrameReport::transitions`](crate::tracker::FrameReport::transitions)
    Evicted,
}
