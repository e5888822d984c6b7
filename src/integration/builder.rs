//! Builder for creating PPE detections from float model output.

use crate::tracker::{PpeDetection, Rect};

/// Builder for creating [`PpeDetection`] objects from various box formats.
///
/// Models report boxes as floats; corners are truncated to integer pixel
/// coordinates when the detection is built.
#[derive(Debug, Clone, Default)]
pub struct DetectionBuilder {
    label: String,
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
}

impl DetectionBuilder {
    /// Create a new detection builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the class label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set the class label from a class index and the model's name table.
    ///
    /// Unknown indices produce an empty label, which never satisfies a
    /// required-equipment check.
    pub fn class_id(mut self, class_id: usize, names: &[&str]) -> Self {
        self.label = names.get(class_id).map(|s| s.to_string()).unwrap_or_default();
        self
    }

    /// Set bounding box in TLBR format (x1, y1, x2, y2).
    pub fn tlbr(mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        self.x1 = x1;
        self.y1 = y1;
        self.x2 = x2;
        self.y2 = y2;
        self
    }

    /// Set bounding box in XYWH format (center_x, center_y, width, height).
    pub fn xywh(mut self, cx: f32, cy: f32, w: f32, h: f32) -> Self {
        self.x1 = cx - w / 2.0;
        self.y1 = cy - h / 2.0;
        self.x2 = cx + w / 2.0;
        self.y2 = cy + h / 2.0;
        self
    }

    /// Set bounding box in TLWH format (left, top, width, height).
    pub fn tlwh(mut self, l: f32, t: f32, w: f32, h: f32) -> Self {
        self.x1 = l;
        self.y1 = t;
        self.x2 = l + w;
        self.y2 = t + h;
        self
    }

    /// Build the final `PpeDetection`.
    pub fn build(self) -> PpeDetection {
        PpeDetection::new(
            self.label,
            Rect::from_tlbr_f32(self.x1, self.y1, self.x2, self.y2),
        )
    }
}
