use std::fmt;

/// Capture session state machine.
///
/// ```text
/// idle --start--> monitoring --stop--> idle
/// ```
///
/// A failed start leaves the session idle. No reading is produced while idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    Monitoring,
}

impl CaptureState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_monitoring(&self) -> bool {
        matches!(self, Self::Monitoring)
    }
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Monitoring => f.write_str("monitoring"),
        }
    }
}
