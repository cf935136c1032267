use chrono::{DateTime, Utc};
use serde_derive::Serialize;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::circular_queue::CircularQueue;
use crate::config::CounterConfig;
use crate::math::RunningMean;
use crate::track::serialize_centroid;
use crate::Centroid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Towards the top of the frame (exit).
    Up,
    /// Towards the bottom of the frame (entry).
    Down,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossingEvent {
    pub id: u32,
    pub kind: Direction,
    #[serde(serialize_with = "serialize_centroid")]
    pub centroid: Centroid,
    pub timestamp: DateTime<Utc>,
}

/// Crossing state of one identity.
#[derive(Debug, Clone)]
pub struct TrackableObject {
    pub id: u32,
    recent: CircularQueue<Centroid>,
    mean_y: RunningMean<f64>,
    counted: bool,
}

impl TrackableObject {
    fn new(id: u32, centroid: Centroid, capacity: usize) -> Self {
        let mut obj = Self {
            id,
            recent: CircularQueue::with_capacity(capacity),
            mean_y: RunningMean::new(),
            counted: false,
        };
        obj.push(centroid);
        obj
    }

    fn push(&mut self, centroid: Centroid) {
        self.recent.push(centroid);
        self.mean_y.push(centroid.y as f64);
    }

    /// Vertical displacement of `centroid` from the mean of every position
    /// seen so far. Negative is upward.
    pub fn direction(&self, centroid: Centroid) -> Option<f64> {
        self.mean_y.mean().map(|mean| centroid.y as f64 - mean)
    }

    #[inline]
    pub fn counted(&self) -> bool {
        self.counted
    }

    /// Number of positions observed, including ones no longer in `history`.
    #[inline]
    pub fn observations(&self) -> usize {
        self.mean_y.count()
    }

    /// Most recent positions, oldest first.
    #[inline]
    pub fn history(&self) -> impl Iterator<Item = &Centroid> {
        self.recent.iter()
    }

    #[inline]
    pub fn last_centroid(&self) -> Option<&Centroid> {
        self.recent.latest()
    }
}

/// Counts identities crossing a horizontal reference line, once per identity.
#[derive(Debug)]
pub struct CrossingCounter {
    objects: HashMap<u32, TrackableObject>,
    total_up: u32,
    total_down: u32,
    config: CounterConfig,
}

impl Default for CrossingCounter {
    fn default() -> Self {
        Self::new(CounterConfig::default())
    }
}

impl CrossingCounter {
    pub fn new(config: CounterConfig) -> Self {
        Self {
            objects: HashMap::new(),
            total_up: 0,
            total_down: 0,
            config,
        }
    }

    #[inline]
    pub fn config(&self) -> &CounterConfig {
        &self.config
    }

    /// Pixel row of the reference line for a frame of the given height.
    #[inline]
    pub fn line_row(&self, frame_height: u32) -> i32 {
        (frame_height as f64 * self.config.line_position).floor() as i32
    }

    pub fn observe(
        &mut self,
        id: u32,
        centroid: Centroid,
        frame_height: u32,
    ) -> Option<CrossingEvent> {
        self.observe_at(id, centroid, frame_height, Utc::now())
    }

    pub fn observe_at(
        &mut self,
        id: u32,
        centroid: Centroid,
        frame_height: u32,
        timestamp: DateTime<Utc>,
    ) -> Option<CrossingEvent> {
        let line = self.line_row(frame_height);

        let obj = match self.objects.entry(id) {
            Entry::Vacant(e) => {
                e.insert(TrackableObject::new(
                    id,
                    centroid,
                    self.config.history_capacity,
                ));
                return None;
            }
            Entry::Occupied(e) => e.into_mut(),
        };

        let direction = obj.direction(centroid).unwrap_or(0.0);
        obj.push(centroid);

        if obj.counted {
            return None;
        }

        let kind = if direction < 0.0 && centroid.y < line {
            self.total_up += 1;
            Direction::Up
        } else if direction > 0.0 && centroid.y > line {
            self.total_down += 1;
            Direction::Down
        } else {
            return None;
        };

        obj.counted = true;

        log::info!(
            "#{} crossed {:?} at ({}, {}), up: {}, down: {}",
            id,
            kind,
            centroid.x,
            centroid.y,
            self.total_up,
            self.total_down
        );

        Some(CrossingEvent {
            id,
            kind,
            centroid,
            timestamp,
        })
    }

    #[inline]
    pub fn total_up(&self) -> u32 {
        self.total_up
    }

    #[inline]
    pub fn total_down(&self) -> u32 {
        self.total_down
    }

    /// Objects currently inside: entries minus exits.
    #[inline]
    pub fn inside(&self) -> i64 {
        self.total_down as i64 - self.total_up as i64
    }

    #[inline]
    pub fn get(&self, id: u32) -> Option<&TrackableObject> {
        self.objects.get(&id)
    }

    pub fn forget(&mut self, id: u32) -> Option<TrackableObject> {
        self.objects.remove(&id)
    }

    pub fn retain<F: FnMut(u32) -> bool>(&mut self, mut keep: F) {
        self.objects.retain(|&id, _| keep(id));
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

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: i32, y: i32) -> Centroid {
        Centroid::new(x, y)
    }

    #[test]
    fn first_sighting_never_counts() {
        let mut c = CrossingCounter::default();

        assert_eq!(c.observe(0, pt(20, 90), 100), None);
        assert_eq!(c.get(0).unwrap().observations(), 1);
        assert!(!c.get(0).unwrap().counted());
    }

    #[test]
    fn downward_crossing() {
        let mut c = CrossingCounter::default();
        c.observe(0, pt(20, 20), 100);

        let ev = c.observe(0, pt(22, 62), 100).unwrap();

        assert_eq!(ev.id, 0);
        assert_eq!(ev.kind, Direction::Down);
        assert_eq!(ev.centroid, pt(22, 62));
        assert_eq!((c.total_up(), c.total_down(), c.inside()), (0, 1, 1));
    }

    #[test]
    fn upward_crossing() {
        let mut c = CrossingCounter::default();
        c.observe(3, pt(50, 80), 100);

        assert_eq!(c.observe(3, pt(50, 60), 100), None);

        let ev = c.observe(3, pt(50, 40), 100).unwrap();
        assert_eq!(ev.kind, Direction::Up);
        assert_eq!((c.total_up(), c.total_down(), c.inside()), (1, 0, -1));
    }

    #[test]
    fn direction_uses_mean_of_all_prior_positions() {
        let mut c = CrossingCounter::default();

        // mean of prior y is 70, so stepping to 55 is still "up" even
        // though the previous frame was at 50
        c.observe(0, pt(0, 90), 100);
        c.observe(0, pt(0, 70), 100);
        c.observe(0, pt(0, 50), 100);
        assert_eq!(c.get(0).unwrap().direction(pt(0, 55)), Some(-15.0));

        let ev = c.observe(0, pt(0, 45), 100).unwrap();
        assert_eq!(ev.kind, Direction::Up);
    }

    #[test]
    fn counts_only_once() {
        let mut c = CrossingCounter::default();
        c.observe(0, pt(0, 10), 100);
        assert!(c.observe(0, pt(0, 80), 100).is_some());

        for y in [20, 90, 5, 95, 10, 99] {
            assert_eq!(c.observe(0, pt(0, y), 100), None);
        }

        assert_eq!((c.total_up(), c.total_down()), (0, 1));
        assert!(c.get(0).unwrap().counted());
    }

    #[test]
    fn on_the_line_is_not_a_crossing() {
        let mut c = CrossingCounter::default();
        c.observe(0, pt(0, 10), 100);

        assert_eq!(c.observe(0, pt(0, 50), 100), None);
        assert_eq!(c.observe(0, pt(0, 49), 100), None);
        assert!(c.observe(0, pt(0, 51), 100).is_some());
    }

    #[test]
    fn configurable_line() {
        let mut c = CrossingCounter::new(CounterConfig {
            line_position: 0.25,
            ..CounterConfig::default()
        });
        assert_eq!(c.line_row(100), 25);
        assert_eq!(c.line_row(101), 25);

        c.observe(0, pt(0, 10), 100);
        let ev = c.observe(0, pt(0, 30), 100).unwrap();
        assert_eq!(ev.kind, Direction::Down);
    }

    #[test]
    fn bounded_history_keeps_exact_mean() {
        let mut c = CrossingCounter::new(CounterConfig {
            history_capacity: 2,
            ..CounterConfig::default()
        });

        for y in [10, 20, 30, 40] {
            c.observe(0, pt(0, y), 1000);
        }

        let obj = c.get(0).unwrap();
        assert_eq!(obj.observations(), 4);
        assert_eq!(obj.history().map(|p| p.y).collect::<Vec<_>>(), vec![30, 40]);
        assert_eq!(obj.direction(pt(0, 25)), Some(0.0));
    }

    #[test]
    fn forget_and_retain() {
        let mut c = CrossingCounter::default();
        for id in 0..4 {
            c.observe(id, pt(0, 0), 100);
        }

        assert!(c.forget(1).is_some());
        assert!(c.forget(1).is_none());

        c.retain(|id| id != 3);
        let mut ids: Vec<u32> = (0..4).filter(|&id| c.get(id).is_some()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![0, 2]);
    }

    #[test]
    fn event_serializes_lowercase_kind() {
        let mut c = CrossingCounter::default();
        c.observe(7, pt(1, 1), 10);
        let ev = c.observe(7, pt(1, 9), 10).unwrap();

        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["kind"], "down");
        assert_eq!(json["id"], 7);
        assert_eq!(json["centroid"], serde_json::json!([1, 9]));
    }
}
