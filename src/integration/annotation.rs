//! Read-only per-frame snapshot handed to renderers.

use crate::tracker::{
    Color, FrameNumber, GLASSES, GLOVES, HELMET, PERSON, PpeDetection, PpeTrack, Rect, TrackId,
    VEST,
};

/// Display colour for a detection label.
pub fn label_color(label: &str) -> Color {
    match label {
        PERSON => Color::GREEN,
        HELMET => Color::BLUE,
        GLOVES => Color::RED,
        VEST => Color::YELLOW,
        GLASSES => Color::CYAN,
        _ => Color::WHITE,
    }
}

/// One tracked person as seen in a committed frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackAnnotation {
    pub track_id: TrackId,
    /// Person box in frame coordinates
    pub bbox: Rect,
    pub full_ppe: bool,
    /// Frames since the track was first seen
    pub age_frames: u64,
    pub color: Color,
    /// PPE items found this frame, in frame coordinates
    pub ppe: Vec<PpeDetection>,
}

impl TrackAnnotation {
    pub(crate) fn new(track: &PpeTrack, frame: FrameNumber, bbox: Rect, ppe: Vec<PpeDetection>) -> Self {
        Self {
            track_id: track.track_id(),
            bbox,
            full_ppe: track.full_ppe(),
            age_frames: track.age(frame),
            color: track.color(),
            ppe,
        }
    }

    pub fn status_text(&self) -> &'static str {
        if self.full_ppe { "FULL PPE" } else { "MISSING PPE" }
    }

    pub fn status_color(&self) -> Color {
        if self.full_ppe { Color::GREEN } else { Color::RED }
    }

    pub fn caption(&self) -> String {
        format!("ID: {} | Age: {}f", self.track_id, self.age_frames)
    }
}

/// Everything a renderer needs for one committed frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameAnnotations {
    pub frame: FrameNumber,
    pub tracks: Vec<TrackAnnotation>,
}

impl FrameAnnotations {
    pub fn get(&self, track_id: TrackId) -> Option<&TrackAnnotation> {
        self.tracks.iter().find(|t| t.track_id == track_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_colors() {
        assert_eq!(label_color(HELMET), Color::BLUE);
        assert_eq!(label_color(VEST), Color::YELLOW);
        assert_eq!(label_color("boots"), Color::WHITE);
    }

    #[test]
    fn test_status_and_caption() {
        let track = PpeTrack::new(TrackId(4), 3);
        let ann = TrackAnnotation::new(&track, 15, Rect::new(0, 0, 10, 10), vec![]);
        assert_eq!(ann.status_text(), "MISSING PPE");
        assert_eq!(ann.status_color(), Color::RED);
        assert_eq!(ann.caption(), "ID: 4 | Age: 12f");
        assert_eq!(ann.color, Color::for_track(TrackId(4)));
    }
}
