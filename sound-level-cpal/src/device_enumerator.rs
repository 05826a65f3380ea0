//! Input device lookup via the cpal default host.

use cpal::traits::{DeviceTrait, HostTrait};

use sound_level_core::models::audio_models::AudioSource;
use sound_level_core::models::error::CaptureError;

/// Input device enumerator over the platform's default cpal host.
pub struct DeviceEnumerator {
    host: cpal::Host,
}

impl DeviceEnumerator {
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
        }
    }

    /// List input (microphone) devices by name.
    pub fn list_input_devices(&self) -> Result<Vec<AudioSource>, CaptureError> {
        let default_name = self
            .host
            .default_input_device()
            .and_then(|d| d.name().ok());

        let devices = self
            .host
            .input_devices()
            .map_err(|e| CaptureError::DeviceUnavailable(format!("failed to list input devices: {}", e)))?;

        let mut sources = Vec::new();
        for device in devices {
            let Ok(name) = device.name() else {
                continue;
            };
            sources.push(AudioSource {
                id: name.clone(),
                is_default: default_name.as_deref() == Some(name.as_str()),
                name,
            });
        }
        Ok(sources)
    }

    /// The default input device, or the first input device named `name`.
    pub fn find_input_device(&self, name: Option<&str>) -> Result<cpal::Device, CaptureError> {
        match name {
            Some(name) => self
                .host
                .input_devices()
                .map_err(|e| CaptureError::DeviceUnavailable(format!("failed to list input devices: {}", e)))?
                .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                .ok_or_else(|| CaptureError::DeviceUnavailable(format!("input device '{}' not found", name))),
            None => self
                .host
                .default_input_device()
                .ok_or_else(|| CaptureError::DeviceUnavailable("no default input device".into())),
        }
    }
}

impl Default for DeviceEnumerator {
    fn default() -> Self {
        Self::new()
    }
}
