use core::fmt;

/// Failures the clock can run into, grouped by where they come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClockError {
    /// WiFi or NTP could not be reached within the retry budget.
    Connectivity(String),
    /// Drawing to the panel failed.
    Display(String),
    /// An offset pushed the instant outside what the calendar conversion handles.
    Format { epoch_seconds: i64, offset_hours: i32 },
    /// Build-time configuration is malformed.
    Config(String),
}

impl ClockError {
    pub fn connectivity(msg: impl Into<String>) -> Self {
        ClockError::Connectivity(msg.into())
    }

    pub fn display(msg: impl Into<String>) -> Self {
        ClockError::Display(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        ClockError::Config(msg.into())
    }
}

impl fmt::Display for ClockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClockError::Connectivity(msg) => write!(f, "connectivity: {}", msg),
            ClockError::Display(msg) => write!(f, "display: {}", msg),
            ClockError::Format {
                epoch_seconds,
                offset_hours,
            } => write!(
                f,
                "format: cannot convert {} with offset {}h",
                epoch_seconds, offset_hours
            ),
            ClockError::Config(msg) => write!(f, "config: {}", msg),
        }
    }
}

impl std::error::Error for ClockError {}
