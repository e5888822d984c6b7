//! PpePipeline for combining person tracking, PPE classification and the
//! track registry.

use std::collections::HashSet;

use ndarray::{ArrayBase, ArrayView3, Data, Ix3, s};
use tracing::warn;

use crate::config::{ConfigError, FailurePolicy, PpeConfig};
use crate::tracker::{
    FrameNumber, FrameReport, PersonDetection, PpeDetection, RegistryError, TrackEvidence,
    TrackId, TrackRegistry,
};

use super::annotation::{FrameAnnotations, TrackAnnotation};
use super::{PersonTracker, PpeClassifier};

/// Frame-level failure.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError<TE, CE> {
    /// The frame buffer cannot be processed; the stream ends here.
    #[error("unreadable frame {frame}: {reason}")]
    Frame { frame: FrameNumber, reason: String },
    #[error("person tracker failed on frame {frame}")]
    Tracker {
        frame: FrameNumber,
        #[source]
        source: TE,
    },
    #[error("ppe classifier failed on frame {frame} for track {track_id}")]
    Classifier {
        frame: FrameNumber,
        track_id: TrackId,
        #[source]
        source: CE,
    },
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Result of feeding one frame through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The frame was applied to the registry.
    Committed {
        annotations: FrameAnnotations,
        report: FrameReport,
    },
    /// A collaborator failed and the frame was dropped without touching the
    /// registry.
    Skipped { frame: FrameNumber, reason: String },
}

impl FrameOutcome {
    pub fn frame(&self) -> FrameNumber {
        match self {
            Self::Committed { annotations, .. } => annotations.frame,
            Self::Skipped { frame, .. } => *frame,
        }
    }

    pub fn annotations(&self) -> Option<&FrameAnnotations> {
        match self {
            Self::Committed { annotations, .. } => Some(annotations),
            Self::Skipped { .. } => None,
        }
    }

    pub fn report(&self) -> Option<&FrameReport> {
        match self {
            Self::Committed { report, .. } => Some(report),
            Self::Skipped { .. } => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }
}

type PipelineResult<T, C> =
    Result<FrameOutcome, PipelineError<<T as PersonTracker>::Error, <C as PpeClassifier>::Error>>;

/// A per-frame driver that bundles a person tracker, a PPE classifier and
/// the [`TrackRegistry`].
///
/// Collaborators run first; the registry is then updated in a single call,
/// so a frame is either committed as a whole or not at all.
pub struct PpePipeline<T: PersonTracker, C: PpeClassifier> {
    tracker: T,
    classifier: C,
    registry: TrackRegistry,
    failure_policy: FailurePolicy,
    frame: FrameNumber,
}

impl<T: PersonTracker, C: PpeClassifier> PpePipeline<T, C> {
    /// Create a new pipeline with the given collaborators and config.
    pub fn new(tracker: T, classifier: C, config: PpeConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            tracker,
            classifier,
            registry: TrackRegistry::new(&config)?,
            failure_policy: config.failure_policy,
            frame: 0,
        })
    }

    /// Create a new pipeline with default configuration.
    pub fn with_default_config(tracker: T, classifier: C) -> Self {
        Self {
            tracker,
            classifier,
            registry: TrackRegistry::default(),
            failure_policy: FailurePolicy::default(),
            frame: 0,
        }
    }

    /// Process a single frame shaped `(height, width, channels)`.
    ///
    /// Every call consumes a frame number, including skipped frames.
    pub fn process_frame(&mut self, image: ArrayView3<'_, u8>) -> PipelineResult<T, C> {
        self.frame += 1;
        let frame = self.frame;

        let (height, width, channels) = image.dim();
        if height == 0 || width == 0 || channels == 0 {
            return Err(PipelineError::Frame {
                frame,
                reason: format!("empty image {height}x{width}x{channels}"),
            });
        }

        let persons = match self.tracker.track(image.view()) {
            Ok(persons) => persons,
            Err(source) => return self.fail(PipelineError::Tracker { frame, source }),
        };

        let mut classified = HashSet::with_capacity(persons.len());
        let mut evidence = Vec::with_capacity(persons.len());
        let mut found = Vec::with_capacity(persons.len());
        for person in &persons {
            if !classified.insert(person.track_id)
                || person.bbox.validate_within(width, height).is_err()
            {
                continue;
            }
            let ppe = match self.classify_person(image, person) {
                Ok(ppe) => ppe,
                Err(source) => {
                    return self.fail(PipelineError::Classifier {
                        frame,
                        track_id: person.track_id,
                        source,
                    });
                }
            };
            evidence.push(TrackEvidence::from_detections(person.track_id, &ppe));
            found.push((person.track_id, ppe));
        }

        let report = self
            .registry
            .update_within(frame, (width, height), &persons, &evidence)?;

        Ok(FrameOutcome::Committed {
            annotations: self.annotate(frame, &persons, found),
            report,
        })
    }

    /// Feed every frame of `frames` through the pipeline, calling `on_frame`
    /// after each one.
    ///
    /// Stops at the end of the stream or at the first error. The pipeline
    /// is consumed, so registry state does not outlive the stream. Returns
    /// the number of frames processed.
    pub fn run<I, S, F>(
        mut self,
        frames: I,
        mut on_frame: F,
    ) -> Result<u64, PipelineError<T::Error, C::Error>>
    where
        I: IntoIterator<Item = ArrayBase<S, Ix3>>,
        S: Data<Elem = u8>,
        F: FnMut(&FrameOutcome),
    {
        let mut processed = 0;
        for image in frames {
            let outcome = self.process_frame(image.view())?;
            on_frame(&outcome);
            processed += 1;
        }
        Ok(processed)
    }

    /// Run the classifier on the person's crop and move its boxes into
    /// frame coordinates.
    fn classify_person(
        &mut self,
        image: ArrayView3<'_, u8>,
        person: &PersonDetection,
    ) -> Result<Vec<PpeDetection>, C::Error> {
        let bbox = person.bbox;
        // Bounds were checked by the caller, so the casts cannot wrap.
        let (x1, y1, x2, y2) = (
            bbox.x1 as usize,
            bbox.y1 as usize,
            bbox.x2 as usize,
            bbox.y2 as usize,
        );
        let crop = image.slice(s![y1..y2, x1..x2, ..]);
        let local = self.classifier.classify(crop)?;
        Ok(local.iter().map(|det| det.to_global(&bbox)).collect())
    }

    fn annotate(
        &self,
        frame: FrameNumber,
        persons: &[PersonDetection],
        mut found: Vec<(TrackId, Vec<PpeDetection>)>,
    ) -> FrameAnnotations {
        let mut seen = HashSet::with_capacity(persons.len());
        let tracks = persons
            .iter()
            .filter(|person| seen.insert(person.track_id))
            .filter_map(|person| {
                let track = self.registry.get(person.track_id)?;
                let ppe = found
                    .iter_mut()
                    .find(|(id, _)| *id == person.track_id)
                    .map(|(_, ppe)| std::mem::take(ppe))
                    .unwrap_or_default();
                Some(TrackAnnotation::new(track, frame, person.bbox, ppe))
            })
            .collect();
        FrameAnnotations { frame, tracks }
    }

    fn fail(&self, err: PipelineError<T::Error, C::Error>) -> PipelineResult<T, C> {
        match self.failure_policy {
            FailurePolicy::Abort => Err(err),
            FailurePolicy::SkipFrame => {
                let frame = self.frame;
                warn!(frame, error = %err, "skipping frame");
                Ok(FrameOutcome::Skipped {
                    frame,
                    reason: err.to_string(),
                })
            }
        }
    }

    /// Index of the most recently processed frame, 0 before the first one.
    pub fn frame_number(&self) -> FrameNumber {
        self.frame
    }

    /// Get a reference to the track registry.
    pub fn registry(&self) -> &TrackRegistry {
        &self.registry
    }

    /// Get a reference to the underlying person tracker.
    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    /// Get a mutable reference to the underlying person tracker.
    pub fn tracker_mut(&mut self) -> &mut T {
        &mut self.tracker
    }

    /// Get a reference to the underlying PPE classifier.
    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Get a mutable reference to the underlying PPE classifier.
    pub fn classifier_mut(&mut self) -> &mut C {
        &mut self.classifier
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::{GLOVES, HELMET, Rect, UpdateFault, VEST};
    use ndarray::Array3;
    use std::collections::VecDeque;
    use std::io;

    /// Replays one scripted person list per frame.
    struct ScriptedTracker {
        frames: VecDeque<io::Result<Vec<PersonDetection>>>,
    }

    impl PersonTracker for ScriptedTracker {
        type Error = io::Error;

        fn track(&mut self, _frame: ArrayView3<'_, u8>) -> io::Result<Vec<PersonDetection>> {
            self.frames.pop_front().unwrap_or_else(|| Ok(vec![]))
        }
    }

    /// Reports a helmet at the top of every crop and remembers crop sizes.
    #[derive(Default)]
    struct HelmetClassifier {
        crops: Vec<(usize, usize)>,
        fail: bool,
    }

    impl PpeClassifier for HelmetClassifier {
        type Error = io::Error;

        fn classify(&mut self, crop: ArrayView3<'_, u8>) -> io::Result<Vec<PpeDetection>> {
            if self.fail {
                return Err(io::Error::other("model crashed"));
            }
            let (h, w, _) = crop.dim();
            self.crops.push((h, w));
            Ok(vec![PpeDetection::new(HELMET, Rect::new(0, 0, w as i32, 10))])
        }
    }

    fn image() -> Array3<u8> {
        Array3::zeros((480, 640, 3))
    }

    fn tracker(frames: Vec<Vec<PersonDetection>>) -> ScriptedTracker {
        ScriptedTracker {
            frames: frames.into_iter().map(Ok).collect(),
        }
    }

    #[test]
    fn test_pipeline_commits_frame() {
        let person = PersonDetection::new(7, Rect::new(100, 50, 200, 350));
        let mut pipeline = PpePipeline::with_default_config(
            tracker(vec![vec![person]]),
            HelmetClassifier::default(),
        );

        let outcome = pipeline.process_frame(image().view()).unwrap();
        assert_eq!(outcome.frame(), 1);

        let annotations = outcome.annotations().unwrap();
        let track = annotations.get(TrackId(7)).unwrap();
        assert_eq!(track.bbox, person.bbox);
        assert_eq!(track.ppe, vec![PpeDetection::new(HELMET, Rect::new(100, 50, 200, 60))]);
        assert!(!track.full_ppe);
        assert_eq!(pipeline.classifier().crops, vec![(300, 100)]);
        assert_eq!(
            pipeline.registry().get(TrackId(7)).unwrap().frames_in_window(),
            1
        );
    }

    #[test]
    fn test_out_of_frame_person_is_not_classified() {
        let inside = PersonDetection::new(1, Rect::new(0, 0, 50, 50));
        let outside = PersonDetection::new(2, Rect::new(600, 0, 700, 50));
        let mut pipeline = PpePipeline::with_default_config(
            tracker(vec![vec![inside, outside]]),
            HelmetClassifier::default(),
        );

        let outcome = pipeline.process_frame(image().view()).unwrap();
        let report = outcome.report().unwrap();
        assert!(matches!(
            report.faults.as_slice(),
            [UpdateFault::MalformedBox { track_id: TrackId(2), .. }]
        ));
        assert_eq!(pipeline.classifier().crops.len(), 1);
        assert!(pipeline.registry().contains(TrackId(2)));
        assert_eq!(
            pipeline.registry().get(TrackId(2)).unwrap().frames_in_window(),
            0
        );
        assert!(outcome.annotations().unwrap().get(TrackId(2)).unwrap().ppe.is_empty());
    }

    #[test]
    fn test_classifier_failure_aborts_without_mutation() {
        let person = PersonDetection::new(1, Rect::new(0, 0, 50, 50));
        let classifier = HelmetClassifier {
            fail: true,
            ..Default::default()
        };
        let mut pipeline = PpePipeline::with_default_config(tracker(vec![vec![person]]), classifier);

        let err = pipeline.process_frame(image().view()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Classifier {
                frame: 1,
                track_id: TrackId(1),
                ..
            }
        ));
        assert!(pipeline.registry().is_empty());
        assert_eq!(pipeline.registry().current_frame(), None);
    }

    #[test]
    fn test_skip_frame_policy() {
        let person = PersonDetection::new(1, Rect::new(0, 0, 50, 50));
        let scripted = ScriptedTracker {
            frames: VecDeque::from(vec![
                Err(io::Error::other("tracker lost")),
                Ok(vec![person]),
            ]),
        };
        let config = PpeConfig::default().with_failure_policy(FailurePolicy::SkipFrame);
        let mut pipeline = PpePipeline::new(scripted, HelmetClassifier::default(), config).unwrap();

        let first = pipeline.process_frame(image().view()).unwrap();
        assert!(first.is_skipped());
        assert!(pipeline.registry().is_empty());

        let second = pipeline.process_frame(image().view()).unwrap();
        assert_eq!(second.frame(), 2);
        assert_eq!(
            pipeline.registry().get(TrackId(1)).unwrap().first_seen_frame(),
            2
        );
    }

    #[test]
    fn test_empty_image_is_terminal() {
        let mut pipeline =
            PpePipeline::with_default_config(tracker(vec![]), HelmetClassifier::default());
        let empty = Array3::<u8>::zeros((0, 640, 3));
        let err = pipeline.process_frame(empty.view()).unwrap_err();
        assert!(matches!(err, PipelineError::Frame { frame: 1, .. }));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = PpeConfig::default().with_window_size(0);
        let result = PpePipeline::new(tracker(vec![]), HelmetClassifier::default(), config);
        assert!(matches!(result, Err(ConfigError::ZeroWindow)));
    }

    #[test]
    fn test_run_counts_frames_and_reaches_verdict() {
        struct FullKit;

        impl PpeClassifier for FullKit {
            type Error = io::Error;

            fn classify(&mut self, _crop: ArrayView3<'_, u8>) -> io::Result<Vec<PpeDetection>> {
                Ok([HELMET, VEST, GLOVES]
                    .into_iter()
                    .map(|label| PpeDetection::new(label, Rect::new(0, 0, 5, 5)))
                    .collect())
            }
        }

        let person = PersonDetection::new(3, Rect::new(10, 10, 60, 110));
        let config = PpeConfig::default().with_window_size(2);
        let pipeline = PpePipeline::new(tracker(vec![vec![person]; 4]), FullKit, config).unwrap();

        let mut verdicts = Vec::new();
        let processed = pipeline
            .run((0..4).map(|_| image()), |outcome| {
                let ann = outcome.annotations().unwrap();
                verdicts.push(ann.get(TrackId(3)).unwrap().full_ppe);
            })
            .unwrap();

        assert_eq!(processed, 4);
        assert_eq!(verdicts, vec![false, true, true, true]);
    }
}
