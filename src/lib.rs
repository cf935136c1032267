pub mod alert;
pub mod bbox;
pub mod config;
pub mod counter;
pub mod error;
pub mod frame;
pub mod journal;
pub mod matching;
pub mod math;
pub mod scene;
pub mod tracker;

mod circular_queue;
mod track;

pub use bbox::BBox;
pub use config::Config;
pub use counter::{CrossingEvent, Direction};
pub use frame::Frame;
pub use track::Track;

use alert::{AlertDispatcher, Notifier};
use error::Error;
use nalgebra as na;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::rc::Rc;

/// Integer pixel position of a box center.
pub type Centroid = na::Point2<i32>;

pub trait Counting {
    /// Feeds `frames` of source `src` in order and returns their crossings.
    ///
    /// An error stops the batch at the failing frame. Frames before it have
    /// already advanced the scene and their crossings are in its journal, but
    /// they are not returned.
    fn update(&mut self, frames: &[Frame], src: &str) -> Result<Vec<CrossingEvent>, Error>;
    fn tracks(&self, src: &str) -> Rc<[Track]>;
    fn inside(&self, src: &str) -> i64;
}

/// Counts line crossings for any number of named video sources, one scene
/// per source.
pub struct LineCounter {
    config: Config,
    scenes: HashMap<String, scene::Scene>,
    dispatcher: Option<AlertDispatcher>,
}

impl LineCounter {
    pub fn new(config: Config) -> Result<Self, Error> {
        config.validate()?;

        Ok(Self {
            config,
            scenes: HashMap::new(),
            dispatcher: None,
        })
    }

    /// Alerts raised by any scene are handed to `notifier` on a worker thread.
    pub fn with_notifier<N: Notifier>(config: Config, notifier: N) -> Result<Self, Error> {
        config.validate()?;
        let dispatcher = AlertDispatcher::spawn(notifier, config.alert.queue_capacity)?;

        Ok(Self {
            config,
            scenes: HashMap::new(),
            dispatcher: Some(dispatcher),
        })
    }

    #[inline]
    pub fn scene(&self, src: &str) -> Option<&scene::Scene> {
        self.scenes.get(src)
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.scenes.keys().map(String::as_str)
    }
}

impl Default for LineCounter {
    fn default() -> Self {
        Self {
            config: Config::default(),
            scenes: HashMap::new(),
            dispatcher: None,
        }
    }
}

impl crate::Counting for LineCounter {
    fn update(&mut self, frames: &[Frame], src: &str) -> Result<Vec<CrossingEvent>, Error> {
        let scene = match self.scenes.entry(src.to_string()) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => e.insert(scene::Scene::new(&self.config)?),
        };

        let mut events = Vec::new();

        for frame in frames {
            let update = scene.process(frame)?;

            if let Some(dispatcher) = &self.dispatcher {
                // delivery problems never cost the frame its events
                for alert in update.alerts {
                    match dispatcher.dispatch(alert) {
                        Ok(()) | Err(Error::AlertQueueFull) => {}
                        Err(err) => log::error!("alert not delivered: {}", err),
                    }
                }
            }

            events.extend(update.events);
        }

        Ok(events)
    }

    #[inline]
    fn tracks(&self, src: &str) -> Rc<[Track]> {
        if let Some(scene) = self.scenes.get(src) {
            return scene.tracks().into_boxed_slice().into();
        }

        Rc::new([])
    }

    #[inline]
    fn inside(&self, src: &str) -> i64 {
        self.scenes.get(src).map(|s| s.inside()).unwrap_or(0)
    }
}
