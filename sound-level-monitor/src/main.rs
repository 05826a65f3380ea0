mod cli;
mod display;

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::{bounded, RecvTimeoutError};

use sound_level_core::{CaptureSession, ChannelObserver, LoudnessReading};
use sound_level_cpal::{CpalInputProvider, DeviceEnumerator};

use cli::Args;

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.list_devices {
        return list_devices();
    }

    let config = args.configuration()?;
    let provider = CpalInputProvider::from_name(config.device_name.clone());
    let session = CaptureSession::new(provider, config)?;

    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let interrupted = Arc::clone(&interrupted);
        ctrlc::set_handler(move || interrupted.store(true, Ordering::SeqCst))
            .context("failed to install Ctrl+C handler")?;
    }

    // A few seconds of headroom; the meter only needs the latest value.
    let (tx, rx) = bounded::<LoudnessReading>(256);
    session
        .start(Arc::new(ChannelObserver::new(tx)))
        .context("could not start monitoring (is a microphone connected and allowed?)")?;

    if let Some(format) = session.native_format() {
        log::info!("input format: {}", format);
    }

    let deadline = args
        .duration
        .and_then(|duration| Instant::now().checked_add(duration));
    let mut stdout = io::stdout().lock();

    while !interrupted.load(Ordering::SeqCst) {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(reading) => {
                if args.json {
                    writeln!(stdout, "{}", serde_json::json!({ "db": reading }))?;
                } else {
                    write!(stdout, "\r{}", display::meter_line(reading, args.loud_threshold))?;
                    stdout.flush()?;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    session.stop()?;
    if !args.json {
        writeln!(stdout)?;
    }

    let diag = session.diagnostics();
    log::info!(
        "{} buffers, {} readings, {} malformed, {} stream errors",
        diag.buffers_received,
        diag.readings_delivered,
        diag.malformed_buffers,
        diag.stream_errors
    );
    Ok(())
}

fn list_devices() -> Result<()> {
    let devices = DeviceEnumerator::new().list_input_devices()?;
    if devices.is_empty() {
        println!("no input devices found");
    }
    for device in devices {
        let marker = if device.is_default { " [default]" } else { "" };
        println!("{}{}", device.name, marker);
    }
    Ok(())
}
