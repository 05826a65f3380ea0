use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use sound_level_core::MonitorConfiguration;

/// Show the microphone loudness in the terminal.
#[derive(Debug, Parser)]
#[command(name = "sound-level-monitor", version, about)]
pub struct Args {
    /// JSON configuration file; flags below override its values.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Input device name (see --list-devices). Defaults to the system input.
    #[arg(long)]
    pub device: Option<String>,

    /// Frames per buffer requested from the device.
    #[arg(long)]
    pub buffer_frames: Option<u32>,

    /// Offset added to the dBFS level.
    #[arg(long, allow_negative_numbers = true)]
    pub offset_db: Option<f64>,

    /// Exponential smoothing factor in (0, 1].
    #[arg(long)]
    pub smoothing: Option<f32>,

    /// Stop after this many seconds instead of waiting for Ctrl+C.
    #[arg(long, value_parser = parse_duration)]
    pub duration: Option<Duration>,

    /// Print one JSON reading per line instead of a live meter.
    #[arg(long)]
    pub json: bool,

    /// Readings above this value are shown as loud.
    #[arg(long, default_value_t = 70.0)]
    pub loud_threshold: f32,

    /// List input devices and exit.
    #[arg(long)]
    pub list_devices: bool,
}

impl Args {
    /// Merge the optional config file with command-line overrides.
    pub fn configuration(&self) -> Result<MonitorConfiguration> {
        let base = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                MonitorConfiguration::from_json_str(&text)
                    .with_context(|| format!("invalid config {}", path.display()))?
            }
            None => MonitorConfiguration::default(),
        };
        self.apply_overrides(base)
    }

    fn apply_overrides(&self, mut config: MonitorConfiguration) -> Result<MonitorConfiguration> {
        if let Some(device) = &self.device {
            config.device_name = Some(device.clone());
        }
        if let Some(frames) = self.buffer_frames {
            config.buffer_frames = frames;
        }
        if let Some(offset) = self.offset_db {
            config.estimator.offset_db = offset;
        }
        if let Some(alpha) = self.smoothing {
            config.smoothing = Some(alpha);
        }
        config.validate().map_err(anyhow::Error::msg)?;
        Ok(config)
    }
}

/// Whole or fractional seconds, finite and not negative.
fn parse_duration(value: &str) -> Result<Duration, String> {
    let secs: f64 = value.parse().map_err(|e| format!("{}", e))?;
    Duration::try_from_secs_f64(secs).map_err(|e| format!("{}: {}", value, e))
}
