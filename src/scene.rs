use chrono::{DateTime, Utc};

use crate::alert::{Alert, ThresholdAlert};
use crate::bbox::{BBox, Ltrb};
use crate::config::Config;
use crate::counter::{CrossingCounter, CrossingEvent, Direction};
use crate::error::Error;
use crate::journal::CountJournal;
use crate::matching::{GreedyMatcher, Matcher};
use crate::tracker::CentroidTracker;
use crate::{Frame, Track};

/// Result of feeding one frame to a scene.
#[derive(Debug, Clone, Default)]
pub struct SceneUpdate {
    pub tracks: Vec<Track>,
    pub events: Vec<CrossingEvent>,
    pub alerts: Vec<Alert>,
    pub retired: Vec<u32>,
}

/// One camera view: boxes go through the tracker, then every tracked
/// identity goes through the crossing counter.
#[derive(Debug)]
pub struct Scene<M = GreedyMatcher> {
    tracker: CentroidTracker<M>,
    counter: CrossingCounter,
    journal: CountJournal,
    alert: ThresholdAlert,
    forget_retired: bool,
    dims: Option<(u32, u32)>,
    frames: u64,
}

impl Scene<GreedyMatcher> {
    pub fn new(config: &Config) -> Result<Self, Error> {
        Self::with_matcher(config, GreedyMatcher)
    }
}

impl<M: Matcher> Scene<M> {
    /// Fails with `Error::InvalidConfig` when `config` does not validate.
    pub fn with_matcher(config: &Config, matcher: M) -> Result<Self, Error> {
        config.validate()?;

        Ok(Self {
            tracker: CentroidTracker::with_matcher(config.tracker.clone(), matcher),
            counter: CrossingCounter::new(config.counter.clone()),
            journal: CountJournal::new(),
            alert: ThresholdAlert::new(config.alert.clone()),
            forget_retired: config.counter.forget_retired,
            dims: None,
            frames: 0,
        })
    }

    pub fn process(&mut self, frame: &Frame) -> Result<SceneUpdate, Error> {
        self.dims = Some(frame.dims);
        self.step(&frame.boxes, frame.height(), frame.timestamp)
    }

    /// Advances the scene for a frame that could not be read, as if it
    /// had no boxes.
    pub fn skip(&mut self, timestamp: DateTime<Utc>) -> Result<SceneUpdate, Error> {
        let height = self.dims.map(|(_, h)| h).unwrap_or(0);
        self.step(&[], height, timestamp)
    }

    fn step(
        &mut self,
        boxes: &[BBox<Ltrb>],
        height: u32,
        timestamp: DateTime<Utc>,
    ) -> Result<SceneUpdate, Error> {
        let tracks = self.tracker.update(boxes)?;
        let retired = self.tracker.retired().to_vec();

        if self.forget_retired {
            for &id in &retired {
                self.counter.forget(id);
            }
        }

        let mut events = Vec::new();
        let mut alerts = Vec::new();

        for t in &tracks {
            let event = match self.counter.observe_at(t.id, t.centroid, height, timestamp) {
                Some(event) => event,
                None => continue,
            };

            let total = match event.kind {
                Direction::Down => self.counter.total_down(),
                Direction::Up => self.counter.total_up(),
            };
            self.journal.record(&event, total);

            if let Some(alert) = self.alert.check(&event, self.counter.inside()) {
                log::warn!(
                    "inside count {} reached threshold {}",
                    alert.inside,
                    alert.threshold
                );
                alerts.push(alert);
            }

            events.push(event);
        }

        self.frames += 1;

        Ok(SceneUpdate {
            tracks,
            events,
            alerts,
            retired,
        })
    }

    #[inline]
    pub fn tracker(&self) -> &CentroidTracker<M> {
        &self.tracker
    }

    #[inline]
    pub fn counter(&self) -> &CrossingCounter {
        &self.counter
    }

    #[inline]
    pub fn journal(&self) -> &CountJournal {
        &self.journal
    }

    #[inline]
    pub fn inside(&self) -> i64 {
        self.counter.inside()
    }

    #[inline]
    pub fn dims(&self) -> Option<(u32, u32)> {
        self.dims
    }

    /// Frames processed so far, skipped ones included.
    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn tracks(&self) -> Vec<Track> {
        self.tracker.tracks()
    }
}
