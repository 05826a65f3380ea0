use std::sync::Arc;

use crate::models::audio_models::{AudioBuffer, AudioSource, InputFormat};
use crate::models::error::CaptureError;

/// Callback invoked with every buffer the device delivers.
///
/// Runs on the device's own capture thread. Keep the work minimal and never
/// block on anything the consumer might hold.
pub type AudioBufferCallback = Arc<dyn Fn(&AudioBuffer<'_>) + Send + Sync + 'static>;

/// Callback invoked when a running stream reports an error.
pub type StreamErrorCallback = Arc<dyn Fn(CaptureError) + Send + Sync + 'static>;

/// Interface for platform-specific audio input sources.
///
/// Implemented by:
/// - `CpalInputProvider` (`sound-level-cpal`)
pub trait CaptureProvider: Send {
    /// Whether an input device is currently present.
    fn is_available(&self) -> bool;

    /// The device's native format, queried before starting.
    fn native_format(&self) -> Result<InputFormat, CaptureError>;

    /// Register the buffer callback and start the hardware stream.
    ///
    /// `buffer_frames` is the requested buffer size; devices may deliver
    /// other sizes. Fails with `DeviceUnavailable` when the device cannot be
    /// opened or started.
    fn start(
        &mut self,
        buffer_frames: u32,
        on_buffer: AudioBufferCallback,
        on_error: StreamErrorCallback,
    ) -> Result<(), CaptureError>;

    /// Stop the stream and release the device.
    ///
    /// On return no `on_buffer` invocation is running and none will follow.
    /// Stopping a provider that is not running is a no-op.
    fn stop(&mut self) -> Result<(), CaptureError>;

    /// Information about the device backing this provider.
    fn device_info(&self) -> AudioSource;
}
