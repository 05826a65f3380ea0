//! # sound-level-core
//!
//! Platform-agnostic core of the sound level monitor.
//!
//! Turns every buffer an input device delivers into one loudness reading
//! (offset decibels, silence ≈ 0) and hands it to an observer on a separate
//! delivery thread. Device backends implement the `CaptureProvider` trait
//! and plug into the generic `CaptureSession`.
//!
//! ## Architecture
//!
//! ```text
//! sound-level-core (this crate)
//! ├── traits/       ← CaptureProvider, LevelObserver
//! ├── models/       ← CaptureError, CaptureState, MonitorConfiguration, AudioBuffer, LoudnessReading
//! ├── processing/   ← LevelEstimator, LevelSmoother
//! └── session/      ← CaptureSession, delivery worker
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::audio_models::{
    AudioBuffer, AudioSource, InputFormat, LoudnessReading, SessionDiagnostics,
};
pub use models::config::{EstimatorConfig, MonitorConfiguration};
pub use models::error::CaptureError;
pub use models::state::CaptureState;
pub use processing::level_estimator::LevelEstimator;
pub use processing::smoother::LevelSmoother;
pub use session::capture_session::CaptureSession;
pub use traits::capture_provider::{AudioBufferCallback, CaptureProvider, StreamErrorCallback};
pub use traits::level_observer::{ChannelObserver, LevelObserver};
