use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::audio_models::{
    AudioBuffer, AudioSource, InputFormat, LoudnessReading, SessionDiagnostics,
};
use crate::models::config::MonitorConfiguration;
use crate::models::error::CaptureError;
use crate::models::state::CaptureState;
use crate::processing::level_estimator::LevelEstimator;
use crate::session::delivery::{DeliveryWorker, PublishGate, SessionCounters};
use crate::traits::capture_provider::{AudioBufferCallback, CaptureProvider, StreamErrorCallback};
use crate::traits::level_observer::LevelObserver;

/// Internal mutable session state, protected by `parking_lot::Mutex`.
struct SessionInner<P> {
    provider: P,
    state: CaptureState,
    format: Option<InputFormat>,
    gate: Option<PublishGate>,
    worker: Option<DeliveryWorker>,
}

/// Bridges an input device to a `LevelObserver`.
///
/// Data flow:
/// ```text
/// [CaptureProvider thread] → LevelEstimator → [publish gate] → channel
///                                                                  ↓
///                                         [level-delivery thread] → observer
/// ```
///
/// `start` and `stop` take `&self`, so the session can be shared behind an
/// `Arc` by a UI and driven from any thread. Once `stop` returns the
/// observer is not running and will not be called again.
pub struct CaptureSession<P: CaptureProvider> {
    inner: Mutex<SessionInner<P>>,
    estimator: LevelEstimator,
    config: MonitorConfiguration,
    counters: Arc<SessionCounters>,
}

impl<P: CaptureProvider> CaptureSession<P> {
    pub fn new(provider: P, config: MonitorConfiguration) -> Result<Self, CaptureError> {
        config.validate().map_err(CaptureError::ConfigurationFailed)?;
        Ok(Self::from_parts(provider, config))
    }

    pub fn with_defaults(provider: P) -> Self {
        Self::from_parts(provider, MonitorConfiguration::default())
    }

    fn from_parts(provider: P, config: MonitorConfiguration) -> Self {
        Self {
            inner: Mutex::new(SessionInner {
                provider,
                state: CaptureState::Idle,
                format: None,
                gate: None,
                worker: None,
            }),
            estimator: LevelEstimator::new(config.estimator),
            config,
            counters: Arc::new(SessionCounters::default()),
        }
    }

    pub fn state(&self) -> CaptureState {
        self.inner.lock().state
    }

    pub fn is_monitoring(&self) -> bool {
        self.state().is_monitoring()
    }

    pub fn config(&self) -> &MonitorConfiguration {
        &self.config
    }

    /// Native format of the running tap, `None` while idle.
    pub fn native_format(&self) -> Option<InputFormat> {
        self.inner.lock().format.clone()
    }

    /// Last reading handed to an observer, or zero before the first one.
    pub fn last_reading(&self) -> LoudnessReading {
        self.counters.last_reading()
    }

    /// Counters for the current run, or the most recent one while idle.
    /// Reset by every `start`.
    pub fn diagnostics(&self) -> SessionDiagnostics {
        self.counters.snapshot()
    }

    /// The backing input device, if it is currently present.
    pub fn available_audio_sources(&self) -> Vec<AudioSource> {
        let inner = self.inner.lock();
        if inner.provider.is_available() {
            vec![inner.provider.device_info()]
        } else {
            Vec::new()
        }
    }

    /// Start monitoring. Transitions: idle → monitoring.
    ///
    /// Fails with `AlreadyMonitoring` instead of installing a second tap, and
    /// with `DeviceUnavailable` for any failure to open or start the device.
    /// On failure the session stays idle and the observer is never called.
    pub fn start(&self, observer: Arc<dyn LevelObserver>) -> Result<(), CaptureError> {
        let mut inner = self.inner.lock();
        if inner.state.is_monitoring() {
            return Err(CaptureError::AlreadyMonitoring);
        }

        if !inner.provider.is_available() {
            return Err(CaptureError::DeviceUnavailable("no input device available".into()));
        }
        let format = inner.provider.native_format().map_err(device_unavailable)?;
        let device = inner.provider.device_info();

        self.counters.reset();

        let (worker, gate) =
            DeliveryWorker::spawn(observer, Arc::clone(&self.counters), self.config.smoothing)?;

        let on_buffer = self.buffer_callback(Arc::clone(&gate));
        let on_error = Self::error_callback(Arc::clone(&gate));

        if let Err(e) = inner
            .provider
            .start(self.config.buffer_frames, on_buffer, on_error)
        {
            gate.lock().take();
            worker.shutdown();
            log::warn!("failed to start capture on '{}': {}", device.name, e);
            return Err(device_unavailable(e));
        }

        log::info!(
            "monitoring '{}' ({}), {} frames per buffer",
            device.name,
            format,
            self.config.buffer_frames
        );

        inner.format = Some(format);
        inner.gate = Some(gate);
        inner.worker = Some(worker);
        inner.state = CaptureState::Monitoring;
        Ok(())
    }

    /// Stop monitoring. Transitions: monitoring → idle.
    ///
    /// Idempotent. Blocks until an observer call in progress has returned;
    /// readings still queued are discarded.
    pub fn stop(&self) -> Result<(), CaptureError> {
        let worker = {
            let mut inner = self.inner.lock();
            if inner.state.is_idle() {
                return Ok(());
            }

            // Close the gate first: a callback already past the estimator
            // either published before this point or finds the slot empty.
            if let Some(gate) = inner.gate.take() {
                gate.lock().take();
            }

            if let Err(e) = inner.provider.stop() {
                log::warn!("capture provider failed to stop cleanly: {}", e);
            }

            inner.state = CaptureState::Idle;
            inner.format = None;
            inner.worker.take()
        };

        // Joined outside the session lock so an observer may still query or
        // stop the session while we wait for it.
        if let Some(worker) = worker {
            worker.shutdown();
        }

        let diag = self.counters.snapshot();
        log::info!(
            "monitoring stopped after {} buffers ({} readings delivered, {} malformed)",
            diag.buffers_received,
            diag.readings_delivered,
            diag.malformed_buffers
        );
        Ok(())
    }

    fn buffer_callback(&self, gate: PublishGate) -> AudioBufferCallback {
        let estimator = self.estimator;
        let counters = Arc::clone(&self.counters);

        Arc::new(move |buffer: &AudioBuffer<'_>| {
            // Estimate outside the lock; the gate is only held for the send.
            let reading = estimator.estimate(buffer);

            if let Some(publisher) = gate.lock().as_mut() {
                counters.record_buffer(buffer.is_empty());
                publisher.publish(reading);
            }
        })
    }

    fn error_callback(gate: PublishGate) -> StreamErrorCallback {
        Arc::new(move |error: CaptureError| {
            log::error!("capture stream error: {}", error);
            if let Some(publisher) = gate.lock().as_mut() {
                publisher.report(error);
            }
        })
    }
}

/// Start failures are reported to the caller as one kind.
fn device_unavailable(error: CaptureError) -> CaptureError {
    match error {
        CaptureError::DeviceUnavailable(_) => error,
        other => CaptureError::DeviceUnavailable(other.to_string()),
    }
}

impl<P: CaptureProvider> Drop for CaptureSession<P> {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
