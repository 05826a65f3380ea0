use crossbeam_channel::{Sender, TrySendError};

use crate::models::audio_models::LoudnessReading;
use crate::models::error::CaptureError;

/// Receives loudness readings from a capture session.
///
/// All methods are called from the session's delivery thread, never from
/// the device callback, in the order buffers arrived. Implementations that
/// touch UI state should still marshal to their own UI thread.
pub trait LevelObserver: Send + Sync {
    /// Called once per delivered buffer while monitoring.
    fn on_reading(&self, reading: LoudnessReading);

    /// Called when the running stream reports an error.
    fn on_error(&self, error: &CaptureError) {
        log::warn!("unhandled capture error: {}", error);
    }
}

impl<F> LevelObserver for F
where
    F: Fn(LoudnessReading) + Send + Sync,
{
    fn on_reading(&self, reading: LoudnessReading) {
        self(reading)
    }
}

/// Forwards readings into a channel so another thread can poll them.
///
/// Readings are dropped (not queued) when a bounded channel is full or the
/// receiver is gone; the delivery thread never waits on the consumer.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: Sender<LoudnessReading>,
}

impl ChannelObserver {
    pub fn new(tx: Sender<LoudnessReading>) -> Self {
        Self { tx }
    }
}

impl LevelObserver for ChannelObserver {
    fn on_reading(&self, reading: LoudnessReading) {
        match self.tx.try_send(reading) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => log::trace!("reading channel full, dropping {}", reading),
            Err(TrySendError::Disconnected(_)) => log::trace!("reading receiver gone"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;
    use parking_lot::Mutex;

    #[test]
    fn closures_are_observers() {
        let seen = Mutex::new(Vec::new());
        let observer = |r: LoudnessReading| seen.lock().push(r.value());

        observer.on_reading(LoudnessReading::new(12.0));
        observer.on_reading(LoudnessReading::new(34.0));

        assert_eq!(*seen.lock(), vec![12.0, 34.0]);
    }

    #[test]
    fn channel_observer_drops_when_full() {
        let (tx, rx) = bounded(1);
        let observer = ChannelObserver::new(tx);

        observer.on_reading(LoudnessReading::new(1.0));
        observer.on_reading(LoudnessReading::new(2.0));

        assert_eq!(rx.try_recv().unwrap().value(), 1.0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn channel_observer_survives_dropped_receiver() {
        let (tx, rx) = bounded(4);
        drop(rx);
        ChannelObserver::new(tx).on_reading(LoudnessReading::new(5.0));
    }
}
