//! Error taxonomy for the orchestration core.
//!
//! Two layers of failure exist and must never be confused: faults a site
//! step recovers from on its own (converted into a failed [`StepOutcome`]),
//! and faults of the browser session itself, after which no step can
//! succeed.
//!
//! [`StepOutcome`]: crate::step::StepOutcome

use fantoccini::error::{CmdError, NewSessionError};
use thiserror::Error;

/// Fault raised inside one site step. Recovered at the step boundary,
/// except for the [`StepError::Session`] variant which aborts the run.
#[derive(Debug, Error)]
pub enum StepError {
    /// A wait condition did not hold within its bound.
    #[error("timed out after {ms}ms waiting for {condition}")]
    WaitTimeout { ms: u64, condition: String },

    /// An element was located but could not be acted on (stale, obscured,
    /// detached, or the page navigated underneath it).
    #[error("element interaction failed: {0}")]
    ElementInteraction(String),

    /// The session layer failed. This is the only variant allowed to
    /// escape a site step.
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// The browser session is unusable. Not recoverable by any step.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to start browser session: {0}")]
    Launch(String),

    #[error("browser session lost: {0}")]
    Lost(String),
}

/// Site definition files that cannot be loaded or parsed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read site definitions from {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid site definitions in {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

impl From<CmdError> for StepError {
    /// Splits WebDriver command failures along the recoverable line:
    /// transport-level loss means the session is gone, anything else is a
    /// per-step interaction failure.
    fn from(err: CmdError) -> Self {
        match err {
            CmdError::Failed(e) => StepError::Session(SessionError::Lost(e.to_string())),
            CmdError::Lost(e) => StepError::Session(SessionError::Lost(e.to_string())),
            other => StepError::ElementInteraction(other.to_string()),
        }
    }
}

impl From<NewSessionError> for SessionError {
    fn from(err: NewSessionError) -> Self {
        SessionError::Launch(err.to_string())
    }
}

impl StepError {
    /// True when the underlying session is gone and the run must abort.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StepError::Session(_))
    }
}
