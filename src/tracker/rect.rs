/// Integer bounding box in TLBR format.
///
/// Coordinates follow image conventions: `x` grows to the right, `y` grows
/// downwards, and the bottom-right corner is exclusive, so a box covers the
/// pixel rows `y1..y2` and columns `x1..x2`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    /// Top-left x coordinate
    pub x1: i32,
    /// Top-left y coordinate
    pub y1: i32,
    /// Bottom-right x coordinate
    pub x2: i32,
    /// Bottom-right y coordinate
    pub y2: i32,
}

/// Reasons a detection box cannot be used for the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DetectionError {
    /// The box has zero or negative extent.
    #[error("degenerate box {0:?}")]
    Degenerate(Rect),
    /// The box reaches outside the frame.
    #[error("box {rect:?} lies outside a {width}x{height} frame")]
    OutOfBounds { rect: Rect, width: usize, height: usize },
}

impl Rect {
    /// Create a Rect from TLBR corners.
    #[inline]
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Create a Rect from floating point TLBR corners.
    ///
    /// Values are truncated towards zero, matching how detector output is
    /// usually cast to pixel indices.
    #[inline]
    pub fn from_tlbr_f32(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self::new(x1 as i32, y1 as i32, x2 as i32, y2 as i32)
    }

    /// Convert to TLBR format: (x1, y1, x2, y2).
    #[inline]
    pub fn to_tlbr(&self) -> [i32; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    #[inline]
    pub fn area(&self) -> i64 {
        i64::from(self.width().max(0)) * i64::from(self.height().max(0))
    }

    /// Top-left corner, i.e. the offset of a crop taken from this box.
    #[inline]
    pub fn origin(&self) -> (i32, i32) {
        (self.x1, self.y1)
    }

    /// Whether `x1 < x2` and `y1 < y2`.
    #[inline]
    pub fn is_well_formed(&self) -> bool {
        self.x1 < self.x2 && self.y1 < self.y2
    }

    /// Shift the box by `(dx, dy)`.
    ///
    /// Used to move crop-local boxes into frame-global coordinates:
    /// `global = crop_offset + local`. Coordinates clamp at the `i32` range.
    #[inline]
    pub fn translate(&self, (dx, dy): (i32, i32)) -> Self {
        Self {
            x1: self.x1.saturating_add(dx),
            y1: self.y1.saturating_add(dy),
            x2: self.x2.saturating_add(dx),
            y2: self.y2.saturating_add(dy),
        }
    }

    /// Check that the box is well formed, not negative, and fits inside a
    /// `width` x `height` frame.
    pub fn validate_within(&self, width: usize, height: usize) -> Result<(), DetectionError> {
        if !self.is_well_formed() {
            return Err(DetectionError::Degenerate(*self));
        }
        let fits = |lo: i32, hi: i32, limit: usize| {
            lo >= 0 && usize::try_from(hi).is_ok_and(|hi| hi <= limit)
        };
        if fits(self.x1, self.x2, width) && fits(self.y1, self.y2, height) {
            Ok(())
        } else {
            Err(DetectionError::OutOfBounds {
                rect: *self,
                width,
                height,
            })
        }
    }
}
