use serde::{Deserialize, Serialize};

use super::error::CaptureError;

/// Offset added to the dBFS level so that silence lands near zero.
pub const DEFAULT_OFFSET_DB: f64 = 100.0;

/// Floor added to the mean square before the logarithm.
pub const DEFAULT_EPSILON: f64 = f64::EPSILON;

/// Frames per buffer requested from the device.
pub const DEFAULT_BUFFER_FRAMES: u32 = 1024;

/// Calibration constants for the level estimator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    pub offset_db: f64,
    pub epsilon: f64,
}

impl EstimatorConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.offset_db.is_finite() {
            return Err(format!("offset must be finite, got {}", self.offset_db));
        }
        if !self.epsilon.is_finite() || self.epsilon <= 0.0 {
            return Err(format!("epsilon must be positive, got {}", self.epsilon));
        }
        Ok(())
    }
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            offset_db: DEFAULT_OFFSET_DB,
            epsilon: DEFAULT_EPSILON,
        }
    }
}

/// Configuration for a monitoring session.
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```json
/// { "buffer_frames": 512, "smoothing": 0.3 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfiguration {
    pub estimator: EstimatorConfig,

    /// Target frames per device buffer (default: 1024). The device may
    /// still deliver other sizes.
    pub buffer_frames: u32,

    /// Exponential smoothing factor in `(0, 1]`, or `None` to deliver raw
    /// readings.
    pub smoothing: Option<f32>,

    /// Specific input device name, or `None` for the system default.
    pub device_name: Option<String>,
}

impl MonitorConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        self.estimator.validate()?;
        if self.buffer_frames == 0 {
            return Err("buffer frames must be positive".into());
        }
        if let Some(alpha) = self.smoothing {
            if !(alpha > 0.0 && alpha <= 1.0) {
                return Err(format!("smoothing must be in (0, 1], got {alpha}"));
            }
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self, CaptureError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| CaptureError::ConfigurationFailed(format!("invalid json: {e}")))?;
        config.validate().map_err(CaptureError::ConfigurationFailed)?;
        Ok(config)
    }
}

impl Default for MonitorConfiguration {
    fn default() -> Self {
        Self {
            estimator: EstimatorConfig::default(),
            buffer_frames: DEFAULT_BUFFER_FRAMES,
            smoothing: None,
            device_name: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = MonitorConfiguration::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.buffer_frames, 1024);
        assert_eq!(config.estimator.offset_db, 100.0);
        assert_eq!(config.smoothing, None);
    }

    #[test]
    fn partial_json_takes_defaults() {
        let config =
            MonitorConfiguration::from_json_str(r#"{ "smoothing": 0.25, "estimator": { "offset_db": 90.0 } }"#)
                .unwrap();

        assert_eq!(config.smoothing, Some(0.25));
        assert_eq!(config.estimator.offset_db, 90.0);
        assert_eq!(config.estimator.epsilon, DEFAULT_EPSILON);
        assert_eq!(config.buffer_frames, DEFAULT_BUFFER_FRAMES);
        assert_eq!(config.device_name, None);
    }

    #[test]
    fn rejects_zero_buffer_frames() {
        let config = MonitorConfiguration {
            buffer_frames: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_smoothing() {
        for alpha in [0.0, -0.5, 1.5, f32::NAN] {
            let config = MonitorConfiguration {
                smoothing: Some(alpha),
                ..Default::default()
            };
            assert!(config.validate().is_err(), "alpha {alpha} accepted");
        }
    }

    #[test]
    fn rejects_non_positive_epsilon() {
        let estimator = EstimatorConfig {
            epsilon: 0.0,
            ..Default::default()
        };
        assert!(estimator.validate().is_err());
    }

    #[test]
    fn invalid_json_is_a_configuration_error() {
        let err = MonitorConfiguration::from_json_str("{ buffer_frames: }").unwrap_err();
        assert!(matches!(err, CaptureError::ConfigurationFailed(_)));

        let err = MonitorConfiguration::from_json_str(r#"{ "buffer_frames": 0 }"#).unwrap_err();
        assert!(matches!(err, CaptureError::ConfigurationFailed(_)));
    }
}
