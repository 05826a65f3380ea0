use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;

use crate::models::audio_models::{LoudnessReading, SessionDiagnostics};
use crate::models::error::CaptureError;
use crate::processing::smoother::LevelSmoother;
use crate::traits::level_observer::LevelObserver;

/// Message passed from the capture callback to the delivery thread.
#[derive(Debug)]
pub(crate) enum SessionEvent {
    Reading(LoudnessReading),
    Error(CaptureError),
}

/// Counters shared by the capture callback, the delivery thread and the
/// session.
#[derive(Debug, Default)]
pub(crate) struct SessionCounters {
    buffers_received: AtomicU64,
    malformed_buffers: AtomicU64,
    readings_delivered: AtomicU64,
    stream_errors: AtomicU64,
    last_reading_bits: AtomicU64,
}

impl SessionCounters {
    pub(crate) fn record_buffer(&self, malformed: bool) {
        self.buffers_received.fetch_add(1, Ordering::Relaxed);
        if malformed {
            self.malformed_buffers.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Zero the per-run counts. The last reading is kept so a display can
    /// hold its value across a restart.
    pub(crate) fn reset(&self) {
        self.buffers_received.store(0, Ordering::Relaxed);
        self.malformed_buffers.store(0, Ordering::Relaxed);
        self.readings_delivered.store(0, Ordering::Relaxed);
        self.stream_errors.store(0, Ordering::Relaxed);
    }

    fn record_delivery(&self, reading: LoudnessReading) {
        self.readings_delivered.fetch_add(1, Ordering::Relaxed);
        self.last_reading_bits
            .store(u64::from(reading.value().to_bits()), Ordering::Relaxed);
    }

    fn record_error(&self) {
        self.stream_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn last_reading(&self) -> LoudnessReading {
        let bits = self.last_reading_bits.load(Ordering::Relaxed) as u32;
        LoudnessReading::new(f32::from_bits(bits))
    }

    pub(crate) fn snapshot(&self) -> SessionDiagnostics {
        SessionDiagnostics {
            buffers_received: self.buffers_received.load(Ordering::Relaxed),
            malformed_buffers: self.malformed_buffers.load(Ordering::Relaxed),
            readings_delivered: self.readings_delivered.load(Ordering::Relaxed),
            stream_errors: self.stream_errors.load(Ordering::Relaxed),
        }
    }
}

/// Sending half of a running tap, guarded by the publish gate.
pub(crate) struct Publisher {
    tx: Sender<SessionEvent>,
    smoother: Option<LevelSmoother>,
}

impl Publisher {
    pub(crate) fn publish(&mut self, reading: LoudnessReading) {
        let reading = match self.smoother.as_mut() {
            Some(smoother) => smoother.apply(reading),
            None => reading,
        };
        // Unbounded: never blocks the capture thread.
        let _ = self.tx.send(SessionEvent::Reading(reading));
    }

    pub(crate) fn report(&mut self, error: CaptureError) {
        let _ = self.tx.send(SessionEvent::Error(error));
    }
}

/// Mutex-guarded slot holding the publisher of the running tap.
///
/// `Some` while monitoring. Emptying it drops the only sender, which lets
/// the delivery thread drain and exit.
pub(crate) type PublishGate = Arc<Mutex<Option<Publisher>>>;

/// Thread that hands queued events to the observer in arrival order.
pub(crate) struct DeliveryWorker {
    enabled: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl DeliveryWorker {
    /// Spawn the delivery thread and return it with an open gate feeding it.
    pub(crate) fn spawn(
        observer: Arc<dyn LevelObserver>,
        counters: Arc<SessionCounters>,
        smoothing: Option<f32>,
    ) -> Result<(Self, PublishGate), CaptureError> {
        let (tx, rx) = unbounded();
        let enabled = Arc::new(AtomicBool::new(true));

        let flag = Arc::clone(&enabled);
        let handle = thread::Builder::new()
            .name("level-delivery".into())
            .spawn(move || deliver_loop(rx, observer, counters, flag))
            .map_err(|e| CaptureError::Unknown(format!("failed to spawn delivery thread: {}", e)))?;

        let gate = Arc::new(Mutex::new(Some(Publisher {
            tx,
            smoother: smoothing.map(LevelSmoother::new),
        })));

        Ok((
            Self {
                enabled,
                handle: Some(handle),
            },
            gate,
        ))
    }

    /// Stop calling the observer and wait for the delivery thread to exit.
    ///
    /// The gate must already be closed, otherwise the thread never sees its
    /// channel disconnect. Events still queued are discarded. When called
    /// from the delivery thread itself (an observer stopping its own
    /// session) the thread is detached instead of joined.
    pub(crate) fn shutdown(mut self) {
        self.enabled.store(false, Ordering::SeqCst);
        let Some(handle) = self.handle.take() else {
            return;
        };
        if handle.thread().id() == thread::current().id() {
            log::debug!("delivery worker stopped from its own observer, detaching");
            return;
        }
        if handle.join().is_err() {
            log::error!("delivery thread panicked");
        }
    }
}

fn deliver_loop(
    rx: Receiver<SessionEvent>,
    observer: Arc<dyn LevelObserver>,
    counters: Arc<SessionCounters>,
    enabled: Arc<AtomicBool>,
) {
    let mut discarded = 0u64;
    for event in rx.iter() {
        if !enabled.load(Ordering::SeqCst) {
            discarded += 1;
            continue;
        }
        match event {
            SessionEvent::Reading(reading) => {
                observer.on_reading(reading);
                counters.record_delivery(reading);
            }
            SessionEvent::Error(error) => {
                counters.record_error();
                observer.on_error(&error);
            }
        }
    }
    if discarded > 0 {
        log::debug!("discarded {} events queued after stop", discarded);
    }
}
