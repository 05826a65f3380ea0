//! # sound-level-cpal
//!
//! cpal backend for the sound level monitor.
//!
//! Provides:
//! - `CpalInputProvider`: microphone capture through the platform's default
//!   cpal host (ALSA/PulseAudio, CoreAudio, WASAPI)
//! - `DeviceEnumerator`: input device lookup by name
//!
//! ## Usage
//! ```ignore
//! use sound_level_core::{CaptureSession, LoudnessReading};
//! use sound_level_cpal::CpalInputProvider;
//! use std::sync::Arc;
//!
//! let session = CaptureSession::with_defaults(CpalInputProvider::default_device());
//! session.start(Arc::new(|r: LoudnessReading| println!("{r}")))?;
//! ```

pub mod cpal_input;
pub mod device_enumerator;

pub use cpal_input::CpalInputProvider;
pub use device_enumerator::DeviceEnumerator;
