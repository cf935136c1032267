use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, Sender, TrySendError};
use serde_derive::Serialize;
use std::thread;

use crate::config::AlertConfig;
use crate::counter::{CrossingEvent, Direction};
use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub inside: i64,
    pub threshold: i64,
    pub timestamp: DateTime<Utc>,
}

/// Raises an alert when an entry brings the inside count to the threshold.
#[derive(Debug, Clone, Default)]
pub struct ThresholdAlert {
    config: AlertConfig,
}

impl ThresholdAlert {
    pub fn new(config: AlertConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn threshold(&self) -> i64 {
        self.config.threshold
    }

    /// `inside` must already include `event`.
    pub fn check(&self, event: &CrossingEvent, inside: i64) -> Option<Alert> {
        if !self.config.enabled || event.kind != Direction::Down {
            return None;
        }

        if inside < self.config.threshold {
            return None;
        }

        Some(Alert {
            inside,
            threshold: self.config.threshold,
            timestamp: event.timestamp,
        })
    }
}

/// Delivers alerts somewhere outside the process (mail, webhook, ...).
pub trait Notifier: Send + 'static {
    fn notify(&mut self, alert: &Alert) -> Result<(), Error>;
}

/// Writes alerts to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, alert: &Alert) -> Result<(), Error> {
        log::warn!(
            "inside count {} reached threshold {} at {}",
            alert.inside,
            alert.threshold,
            alert.timestamp.to_rfc3339()
        );

        Ok(())
    }
}

/// Runs a `Notifier` on its own thread so slow delivery never stalls the
/// frame loop.
pub struct AlertDispatcher {
    tx: Option<Sender<Alert>>,
    worker: Option<thread::JoinHandle<()>>,
}

impl AlertDispatcher {
    pub fn spawn<N: Notifier>(mut notifier: N, capacity: usize) -> Result<Self, Error> {
        let (tx, rx) = bounded::<Alert>(capacity.max(1));

        let worker = thread::Builder::new()
            .name("qcount-alerts".into())
            .spawn(move || {
                log::debug!("alert worker started");

                while let Ok(alert) = rx.recv() {
                    if let Err(err) = notifier.notify(&alert) {
                        log::error!("alert delivery failed: {}", err);
                    }
                }

                log::debug!("alert worker stopped");
            })?;

        Ok(Self {
            tx: Some(tx),
            worker: Some(worker),
        })
    }

    /// Queues an alert without blocking.
    pub fn dispatch(&self, alert: Alert) -> Result<(), Error> {
        let tx = self.tx.as_ref().ok_or(Error::AlertDispatcherClosed)?;

        match tx.try_send(alert) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(alert)) => {
                log::warn!("alert queue full, dropping alert at inside={}", alert.inside);
                Err(Error::AlertQueueFull)
            }
            Err(TrySendError::Disconnected(_)) => Err(Error::AlertDispatcherClosed),
        }
    }

    /// Delivers everything already queued, then stops the worker.
    pub fn shutdown(mut self) {
        self.close();
    }

    fn close(&mut self) {
        self.tx.take();

        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("alert worker panicked");
            }
        }
    }
}

impl Drop for AlertDispatcher {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Centroid;
    use crossbeam_channel::{unbounded, Receiver};

    struct Collect(Sender<Alert>);

    impl Notifier for Collect {
        fn notify(&mut self, alert: &Alert) -> Result<(), Error> {
            self.0
                .send(alert.clone())
                .map_err(|_| Error::AlertDispatcherClosed)
        }
    }

    /// Reports when it starts delivering, then waits for the gate to open.
    struct Gated {
        started: Sender<()>,
        gate: Receiver<()>,
        out: Sender<Alert>,
    }

    impl Notifier for Gated {
        fn notify(&mut self, alert: &Alert) -> Result<(), Error> {
            let _ = self.started.send(());
            let _ = self.gate.recv();

            self.out
                .send(alert.clone())
                .map_err(|_| Error::AlertDispatcherClosed)
        }
    }

    fn event(kind: Direction) -> CrossingEvent {
        CrossingEvent {
            id: 1,
            kind,
            centroid: Centroid::new(0, 0),
            timestamp: Utc::now(),
        }
    }

    fn config(threshold: i64) -> AlertConfig {
        AlertConfig {
            threshold,
            ..AlertConfig::default()
        }
    }

    #[test]
    fn fires_on_entry_at_threshold() {
        let t = ThresholdAlert::new(config(2));

        assert!(t.check(&event(Direction::Down), 1).is_none());

        let alert = t.check(&event(Direction::Down), 2).unwrap();
        assert_eq!((alert.inside, alert.threshold), (2, 2));
        assert!(t.check(&event(Direction::Down), 3).is_some());
    }

    #[test]
    fn exits_and_disabled_never_fire() {
        let t = ThresholdAlert::new(config(0));
        assert!(t.check(&event(Direction::Up), 5).is_none());

        let t = ThresholdAlert::new(AlertConfig {
            enabled: false,
            ..config(0)
        });
        assert!(t.check(&event(Direction::Down), 5).is_none());
    }

    #[test]
    fn dispatcher_delivers_in_order() {
        let (tx, rx) = unbounded();
        let dispatcher = AlertDispatcher::spawn(Collect(tx), 8).unwrap();
        let t = ThresholdAlert::new(config(1));

        for inside in 1..=3 {
            let alert = t.check(&event(Direction::Down), inside).unwrap();
            dispatcher.dispatch(alert).unwrap();
        }
        dispatcher.shutdown();

        let got: Vec<i64> = rx.try_iter().map(|a| a.inside).collect();
        assert_eq!(got, vec![1, 2, 3]);
    }

    #[test]
    fn log_notifier_accepts_alerts() {
        let dispatcher = AlertDispatcher::spawn(LogNotifier, 1).unwrap();
        let alert = ThresholdAlert::new(config(0))
            .check(&event(Direction::Down), 0)
            .unwrap();

        dispatcher.dispatch(alert).unwrap();
    }

    #[test]
    fn full_queue_is_reported_without_blocking() {
        let (started_tx, started_rx) = unbounded();
        let (gate_tx, gate_rx) = unbounded::<()>();
        let (out_tx, out_rx) = unbounded();

        let notifier = Gated {
            started: started_tx,
            gate: gate_rx,
            out: out_tx,
        };
        let dispatcher = AlertDispatcher::spawn(notifier, 1).unwrap();
        let t = ThresholdAlert::new(config(0));
        let alert = |inside| t.check(&event(Direction::Down), inside).unwrap();

        dispatcher.dispatch(alert(0)).unwrap();
        // worker now holds the first alert and waits on the gate
        started_rx.recv().unwrap();

        dispatcher.dispatch(alert(1)).unwrap();
        assert!(matches!(dispatcher.dispatch(alert(2)), Err(Error::AlertQueueFull)));
        assert!(matches!(dispatcher.dispatch(alert(3)), Err(Error::AlertQueueFull)));

        drop(gate_tx);
        dispatcher.shutdown();

        let got: Vec<i64> = out_rx.try_iter().map(|a| a.inside).collect();
        assert_eq!(got, vec![0, 1]);
    }
}
