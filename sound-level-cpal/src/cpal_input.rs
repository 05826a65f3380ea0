//! cpal microphone capture provider.
//!
//! Opens an input device in its native format and delivers every buffer as
//! interleaved `f32` via the `AudioBufferCallback`.

use std::thread;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{BufferSize, FromSample, Sample, SampleFormat, SizedSample, StreamConfig};
use crossbeam_channel::{bounded, Sender};

use sound_level_core::models::audio_models::{AudioBuffer, AudioSource, InputFormat};
use sound_level_core::models::error::CaptureError;
use sound_level_core::traits::capture_provider::{
    AudioBufferCallback, CaptureProvider, StreamErrorCallback,
};

use crate::device_enumerator::DeviceEnumerator;

/// cpal microphone capture.
///
/// The `cpal::Stream` is not `Send` on every host, so it is built, played
/// and dropped on a dedicated `cpal-input` thread. `start` waits for that
/// thread to report whether the stream came up.
pub struct CpalInputProvider {
    device_name: Option<String>,
    stop_tx: Option<Sender<()>>,
    capture_handle: Option<thread::JoinHandle<()>>,
}

impl CpalInputProvider {
    /// Capture from the system default input device.
    pub fn default_device() -> Self {
        Self {
            device_name: None,
            stop_tx: None,
            capture_handle: None,
        }
    }

    /// Capture from the input device with this exact name.
    pub fn with_device(name: impl Into<String>) -> Self {
        Self {
            device_name: Some(name.into()),
            stop_tx: None,
            capture_handle: None,
        }
    }

    /// Capture from `name` when given, otherwise from the default device.
    pub fn from_name(name: Option<String>) -> Self {
        match name {
            Some(name) => Self::with_device(name),
            None => Self::default_device(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.capture_handle.is_some()
    }
}

impl CaptureProvider for CpalInputProvider {
    fn is_available(&self) -> bool {
        DeviceEnumerator::new()
            .find_input_device(self.device_name.as_deref())
            .is_ok()
    }

    fn native_format(&self) -> Result<InputFormat, CaptureError> {
        let device = DeviceEnumerator::new().find_input_device(self.device_name.as_deref())?;
        let supported = device.default_input_config().map_err(|e| {
            CaptureError::DeviceUnavailable(format!("failed to query input format: {}", e))
        })?;

        Ok(InputFormat {
            sample_rate: supported.sample_rate().0,
            channels: supported.channels(),
            sample_format: supported.sample_format().to_string(),
        })
    }

    fn start(
        &mut self,
        buffer_frames: u32,
        on_buffer: AudioBufferCallback,
        on_error: StreamErrorCallback,
    ) -> Result<(), CaptureError> {
        if self.capture_handle.is_some() {
            return Err(CaptureError::AlreadyMonitoring);
        }

        let (ready_tx, ready_rx) = bounded::<Result<(), CaptureError>>(1);
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let device_name = self.device_name.clone();

        let handle = thread::Builder::new()
            .name("cpal-input".into())
            .spawn(move || {
                let stream =
                    match open_stream(device_name.as_deref(), buffer_frames, on_buffer, on_error) {
                        Ok(stream) => stream,
                        Err(e) => {
                            let _ = ready_tx.send(Err(e));
                            return;
                        }
                    };

                if let Err(e) = stream.play() {
                    let _ = ready_tx.send(Err(CaptureError::DeviceUnavailable(format!(
                        "failed to start input stream: {}",
                        e
                    ))));
                    return;
                }
                let _ = ready_tx.send(Ok(()));

                // Park until stop() signals or the provider is dropped.
                let _ = stop_rx.recv();

                if let Err(e) = stream.pause() {
                    log::debug!("failed to pause input stream: {}", e);
                }
                drop(stream);
            })
            .map_err(|e| CaptureError::Unknown(format!("failed to spawn capture thread: {}", e)))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                self.stop_tx = Some(stop_tx);
                self.capture_handle = Some(handle);
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                let _ = handle.join();
                Err(CaptureError::Unknown(
                    "capture thread exited before reporting".into(),
                ))
            }
        }
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.capture_handle.take() {
            // The stream is dropped on that thread; once joined, cpal has
            // torn down its callback.
            handle
                .join()
                .map_err(|_| CaptureError::Unknown("capture thread panicked".into()))?;
        }
        Ok(())
    }

    fn device_info(&self) -> AudioSource {
        match &self.device_name {
            Some(name) => AudioSource {
                id: name.clone(),
                name: name.clone(),
                is_default: false,
            },
            None => {
                let name = DeviceEnumerator::new()
                    .find_input_device(None)
                    .ok()
                    .and_then(|d| d.name().ok())
                    .unwrap_or_else(|| "Default Microphone".into());
                AudioSource {
                    id: "default-input".into(),
                    name,
                    is_default: true,
                }
            }
        }
    }
}

impl Drop for CpalInputProvider {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Build an input stream in the device's native format.
///
/// Asks for `buffer_frames` per callback and falls back to the device's own
/// buffer size when the host rejects a fixed size.
fn open_stream(
    device_name: Option<&str>,
    buffer_frames: u32,
    on_buffer: AudioBufferCallback,
    on_error: StreamErrorCallback,
) -> Result<cpal::Stream, CaptureError> {
    let device = DeviceEnumerator::new().find_input_device(device_name)?;
    let supported = device.default_input_config().map_err(|e| {
        CaptureError::DeviceUnavailable(format!("failed to query input format: {}", e))
    })?;
    let sample_format = supported.sample_format();

    let mut config: StreamConfig = supported.config();
    config.buffer_size = BufferSize::Fixed(buffer_frames);

    match build_stream(&device, &config, sample_format, &on_buffer, &on_error) {
        Ok(stream) => Ok(stream),
        Err(e) => {
            log::warn!(
                "input device rejected {} frame buffers ({}), using its default size",
                buffer_frames,
                e
            );
            config.buffer_size = BufferSize::Default;
            build_stream(&device, &config, sample_format, &on_buffer, &on_error)
        }
    }
}

fn build_stream(
    device: &cpal::Device,
    config: &StreamConfig,
    sample_format: SampleFormat,
    on_buffer: &AudioBufferCallback,
    on_error: &StreamErrorCallback,
) -> Result<cpal::Stream, CaptureError> {
    match sample_format {
        SampleFormat::F32 => build_typed_stream::<f32>(device, config, on_buffer, on_error),
        SampleFormat::I16 => build_typed_stream::<i16>(device, config, on_buffer, on_error),
        SampleFormat::U16 => build_typed_stream::<u16>(device, config, on_buffer, on_error),
        SampleFormat::I32 => build_typed_stream::<i32>(device, config, on_buffer, on_error),
        other => Err(CaptureError::DeviceUnavailable(format!(
            "unsupported sample format: {}",
            other
        ))),
    }
}

fn build_typed_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    on_buffer: &AudioBufferCallback,
    on_error: &StreamErrorCallback,
) -> Result<cpal::Stream, CaptureError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let channels = config.channels;
    let sample_rate = config.sample_rate.0;
    let on_buffer = on_buffer.clone();
    let on_error = on_error.clone();

    // Reused across callbacks; grows to the largest buffer once.
    let mut scratch: Vec<f32> = Vec::new();

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                scratch.clear();
                scratch.extend(data.iter().map(|s| s.to_sample::<f32>()));
                on_buffer(&AudioBuffer::new(&scratch, channels, sample_rate));
            },
            move |err| on_error(CaptureError::StreamFailed(err.to_string())),
            None,
        )
        .map_err(|e| CaptureError::DeviceUnavailable(format!("failed to build input stream: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_device_reports_its_name() {
        let provider = CpalInputProvider::with_device("USB Mic");
        let info = provider.device_info();

        assert_eq!(info.name, "USB Mic");
        assert!(!info.is_default);
        assert!(!provider.is_running());
    }

    #[test]
    fn unknown_device_is_unavailable() {
        let mut provider = CpalInputProvider::with_device("no-such-device-7f3a");
        assert!(!provider.is_available());

        let err = provider
            .start(
                1024,
                std::sync::Arc::new(|_: &AudioBuffer<'_>| {}),
                std::sync::Arc::new(|_: CaptureError| {}),
            )
            .unwrap_err();

        assert!(err.is_device_unavailable(), "{err:?}");
        assert!(!provider.is_running());
    }

    #[test]
    fn stop_without_start_is_ok() {
        let mut provider = CpalInputProvider::default_device();
        assert!(provider.stop().is_ok());
    }
}
