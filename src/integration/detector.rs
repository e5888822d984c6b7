//! Traits for the external person tracker and PPE classifier.

use ndarray::ArrayView3;

use crate::tracker::{PersonDetection, PpeDetection};

/// Person detector with tracking.
///
/// Implement this trait to connect any detection + tracking model (for
/// example a YOLO model driven through BoT-SORT) to the pipeline. The
/// implementation owns track id assignment; ids must stay stable for the
/// same person across frames.
///
/// # Example
///
/// ```ignore
/// use ndarray::ArrayView3;
/// use ppe_track::{PersonDetection, PersonTracker};
///
/// struct MyTracker {
///     // Your model here
/// }
///
/// impl PersonTracker for MyTracker {
///     type Error = std::io::Error;
///
///     fn track(&mut self, frame: ArrayView3<'_, u8>) -> Result<Vec<PersonDetection>, Self::Error> {
///         // Run detection + tracking and return the active persons
///         Ok(vec![])
///     }
/// }
/// ```
pub trait PersonTracker {
    /// Error type for tracking failures.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Return the persons visible in `frame`.
    ///
    /// # Arguments
    /// * `frame` - Image shaped `(height, width, channels)`
    fn track(&mut self, frame: ArrayView3<'_, u8>) -> Result<Vec<PersonDetection>, Self::Error>;
}

/// PPE item detector run on a single person crop.
pub trait PpeClassifier {
    /// Error type for classification failures.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Return the PPE items found in `crop`, with boxes relative to the
    /// crop's top-left corner.
    fn classify(&mut self, crop: ArrayView3<'_, u8>) -> Result<Vec<PpeDetection>, Self::Error>;
}

impl<T: PersonTracker + ?Sized> PersonTracker for &mut T {
    type Error = T::Error;

    fn track(&mut self, frame: ArrayView3<'_, u8>) -> Result<Vec<PersonDetection>, Self::Error> {
        (**self).track(frame)
    }
}

impl<C: PpeClassifier + ?Sized> PpeClassifier for &mut C {
    type Error = C::Error;

    fn classify(&mut self, crop: ArrayView3<'_, u8>) -> Result<Vec<PpeDetection>, Self::Error> {
        (**self).classify(crop)
    }
}
