use serde_derive::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Frames an identity may go unmatched before it is retired.
    pub max_disappeared: u32,
    /// Matching radius in px.
    pub max_distance: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_disappeared: 40,
            max_distance: 50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterConfig {
    /// Reference line as a fraction of the frame height, 0.5 is the midline.
    pub line_position: f64,
    /// Recent centroids kept per object.
    pub history_capacity: usize,
    /// Drop an object's crossing state once the tracker retires its id.
    pub forget_retired: bool,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            line_position: 0.5,
            history_capacity: 32,
            forget_retired: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    pub enabled: bool,
    /// Inside count at which an alert is raised.
    pub threshold: i64,
    /// Pending alerts the dispatcher buffers before dropping new ones.
    pub queue_capacity: usize,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 10,
            queue_capacity: 16,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tracker: TrackerConfig,
    pub counter: CounterConfig,
    pub alert: AlertConfig,
}

impl Config {
    pub fn from_json(src: &str) -> Result<Self, Error> {
        let config: Config = serde_json::from_str(src)?;
        config.validate()?;

        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let src = std::fs::read_to_string(path)?;

        Self::from_json(&src)
    }

    pub fn validate(&self) -> Result<(), Error> {
        self.tracker.validate()?;
        self.counter.validate()?;
        self.alert.validate()
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), Error> {
        // NaN would disable gating, every comparison against it is false
        if !self.max_distance.is_finite() || self.max_distance < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "tracker.max_distance must be a non-negative number, got {}",
                self.max_distance
            )));
        }

        Ok(())
    }
}

impl CounterConfig {
    pub fn validate(&self) -> Result<(), Error> {
        let line = self.line_position;
        if !(line > 0.0 && line <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "counter.line_position must be in (0, 1], got {}",
                line
            )));
        }

        if self.history_capacity == 0 {
            return Err(Error::InvalidConfig(
                "counter.history_capacity must be at least 1".into(),
            ));
        }

        Ok(())
    }
}

impl AlertConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.queue_capacity == 0 {
            return Err(Error::InvalidConfig(
                "alert.queue_capacity must be at least 1".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config = Config::from_json(r#"{ "tracker": { "max_distance": 80 } }"#).unwrap();

        assert_eq!(config.tracker.max_distance, 80.0);
        assert_eq!(config.tracker.max_disappeared, 40);
        assert_eq!(config.counter, CounterConfig::default());
        assert_eq!(config.alert, AlertConfig::default());
    }

    #[test]
    fn empty_object_is_default() {
        assert_eq!(Config::from_json("{}").unwrap(), Config::default());
    }

    #[test]
    fn rejects_bad_line_position() {
        for bad in ["0", "-0.2", "1.5"] {
            let src = format!(r#"{{ "counter": {{ "line_position": {} }} }}"#, bad);

            assert!(matches!(
                Config::from_json(&src),
                Err(Error::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn rejects_negative_distance() {
        let err = Config::from_json(r#"{ "tracker": { "max_distance": -1 } }"#);
        assert!(matches!(err, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(Config::from_json("{"), Err(Error::Json(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = Config::from_file("/definitely/not/here/qcount.json");
        assert!(matches!(err, Err(Error::Io(_))));
    }

    #[test]
    fn nan_distance_is_rejected() {
        let tracker = TrackerConfig {
            max_distance: f64::NAN,
            ..TrackerConfig::default()
        };

        assert!(matches!(tracker.validate(), Err(Error::InvalidConfig(_))));
    }
}
