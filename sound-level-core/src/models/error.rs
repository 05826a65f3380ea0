use thiserror::Error;

/// Errors that can occur while monitoring the input level.
///
/// A buffer without usable channel data is not an error here: the
/// estimator recovers it locally and reports silence.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// The input device could not be opened or started (no hardware,
    /// permission denied, busy, unsupported sample format).
    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("session is already monitoring")]
    AlreadyMonitoring,

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    /// A running stream reported an error (e.g. the device was unplugged).
    #[error("stream failed: {0}")]
    StreamFailed(String),

    #[error("unknown error: {0}")]
    Unknown(String),
}

impl CaptureError {
    pub fn is_device_unavailable(&self) -> bool {
        matches!(self, Self::DeviceUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_reason() {
        let err = CaptureError::DeviceUnavailable("no default input device".into());
        assert_eq!(err.to_string(), "device unavailable: no default input device");
        assert!(err.is_device_unavailable());
        assert!(!CaptureError::AlreadyMonitoring.is_device_unavailable());
    }
}
