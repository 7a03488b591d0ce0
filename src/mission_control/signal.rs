use crate::flight_control::FlightError;
use std::time::Duration;

/// How a stage wait ended.
#[derive(Debug)]
pub enum WaitExitSignal {
    /// The threshold was crossed. Polled waits carry the reading that crossed it.
    Crossed(Option<f64>),
    TimedOut,
    Cancelled,
    Failed(FlightError),
}

/// Reason a mission stopped before its last stage completed.
#[derive(Debug)]
pub enum MissionError {
    Flight { stage: &'static str, source: FlightError },
    TimedOut { stage: &'static str, timeout: Duration },
    Cancelled { stage: &'static str },
}

impl std::fmt::Display for MissionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissionError::Flight { stage, source } => write!(f, "stage '{stage}' failed: {source}"),
            MissionError::TimedOut { stage, timeout } => {
                write!(f, "stage '{stage}' timed out after {:.1}s", timeout.as_secs_f64())
            }
            MissionError::Cancelled { stage } => write!(f, "stage '{stage}' cancelled"),
        }
    }
}

impl std::error::Error for MissionError {}

impl MissionError {
    pub fn stage(&self) -> &'static str {
        match self {
            MissionError::Flight { stage, .. }
            | MissionError::TimedOut { stage, .. }
            | MissionError::Cancelled { stage } => stage,
        }
    }
}
