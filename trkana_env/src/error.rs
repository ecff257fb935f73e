//! Error types for the trkana collaborator layer.

use crate::types::EventId;
use thiserror::Error;

/// Errors raised by the collaborators feeding the analysis core.
///
/// Track-level anomalies (unconverged fits, missing crossings, early tracks)
/// are never errors; they are classified by the core. Only violated
/// preconditions of the event source or the configuration end up here.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The event source produced an event that is internally inconsistent,
    /// e.g. a track pointing at a calorimeter cluster that does not exist.
    #[error("Malformed event ({event}): {reason}")]
    MalformedEvent { event: EventId, reason: String },

    /// A required configuration value is missing or not numeric.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Reading an event file or configuration file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An event record could not be decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AnalysisError {
    /// Creates a malformed event error.
    pub fn malformed(event: EventId, reason: impl Into<String>) -> Self {
        Self::MalformedEvent {
            event,
            reason: reason.into(),
        }
    }

    /// Creates a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}
