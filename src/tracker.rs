use std::collections::BTreeMap;

use crate::bbox::{BBox, Ltrb};
use crate::config::TrackerConfig;
use crate::error::Error;
use crate::matching::{GreedyMatcher, Matcher};
use crate::{math, Centroid, Track};

/// Keeps stable integer identities for boxes using only their centroids.
#[derive(Debug)]
pub struct CentroidTracker<M = GreedyMatcher> {
    next_id: u32,
    // id order is creation order
    objects: BTreeMap<u32, Track>,
    retired: Vec<u32>,
    matcher: M,
    config: TrackerConfig,
}

impl CentroidTracker<GreedyMatcher> {
    pub fn new(config: TrackerConfig) -> Self {
        Self::with_matcher(config, GreedyMatcher)
    }
}

impl Default for CentroidTracker<GreedyMatcher> {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

impl<M: Matcher> CentroidTracker<M> {
    pub fn with_matcher(config: TrackerConfig, matcher: M) -> Self {
        Self {
            next_id: 0,
            objects: BTreeMap::new(),
            retired: Vec::new(),
            matcher,
            config,
        }
    }

    #[inline]
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    fn register(&mut self, centroid: Centroid) -> Result<(), Error> {
        // ids are never reused
        let id = self.next_id;
        self.next_id = id.checked_add(1).ok_or(Error::IdsExhausted)?;

        log::debug!("register #{} at ({}, {})", id, centroid.x, centroid.y);

        self.objects.insert(
            id,
            Track {
                id,
                centroid,
                disappeared: 0,
            },
        );

        Ok(())
    }

    fn mark_missing(&mut self, id: u32) {
        let retire = match self.objects.get_mut(&id) {
            Some(t) => {
                t.disappeared += 1;
                t.disappeared > self.config.max_disappeared
            }
            None => false,
        };

        if retire {
            log::debug!("retire #{} after {} missed frames", id, self.config.max_disappeared + 1);

            self.objects.remove(&id);
            self.retired.push(id);
        }
    }

    /// Feeds the boxes of one frame and returns the tracked identities,
    /// ordered by creation.
    pub fn update(&mut self, boxes: &[BBox<Ltrb>]) -> Result<Vec<Track>, Error> {
        self.retired.clear();

        if boxes.is_empty() {
            let ids: Vec<u32> = self.objects.keys().copied().collect();
            for id in ids {
                self.mark_missing(id);
            }

            return Ok(self.tracks());
        }

        let inputs: Vec<Centroid> = boxes.iter().map(|b| b.centroid()).collect();

        if self.objects.is_empty() {
            for c in inputs {
                self.register(c)?;
            }

            return Ok(self.tracks());
        }

        let ids: Vec<u32> = self.objects.keys().copied().collect();
        let current: Vec<Centroid> = self.objects.values().map(|t| t.centroid).collect();

        let dist = math::distance_matrix(&current, &inputs);
        let pairs = self.matcher.assign(dist.view(), self.config.max_distance)?;

        let mut used_rows = vec![false; ids.len()];
        let mut used_cols = vec![false; inputs.len()];

        for (row, col) in pairs {
            if let Some(t) = self.objects.get_mut(&ids[row]) {
                t.centroid = inputs[col];
                t.disappeared = 0;
            }

            used_rows[row] = true;
            used_cols[col] = true;
        }

        // either identities went missing or new objects showed up, never both
        if ids.len() >= inputs.len() {
            for (row, id) in ids.into_iter().enumerate() {
                if !used_rows[row] {
                    self.mark_missing(id);
                }
            }
        } else {
            for (col, c) in inputs.into_iter().enumerate() {
                if !used_cols[col] {
                    self.register(c)?;
                }
            }
        }

        Ok(self.tracks())
    }

    pub fn tracks(&self) -> Vec<Track> {
        self.objects.values().copied().collect()
    }

    #[inline]
    pub fn get(&self, id: u32) -> Option<&Track> {
        self.objects.get(&id)
    }

    /// Ids dropped by the last `update`.
    #[inline]
    pub fn retired(&self) -> &[u32] {
        &self.retired
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
