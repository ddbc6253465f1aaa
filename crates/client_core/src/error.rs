use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

/// Why an offered set of files was refused by the selection gate. The
/// message aggregates one reason per offending file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SelectionError {
    pub message: String,
}

impl SelectionError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failure of a call against the processing service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Non-2xx answer. `message` is already normalized over the `error` and
    /// `message` body keys, with the fixed unknown-error fallback.
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("failed to reach processing service: {0}")]
    Transport(String),
}

/// Why a submission attempt did not complete. The `Display` strings of the
/// precondition variants are exactly what the user sees.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("No file selected")]
    NoFileSelected,
    #[error("Please enter a valid encryption key")]
    BlankKey,
    #[error("Key must be between 16 and 32 characters long")]
    KeyLengthOutOfRange,
    #[error("a submission is already in progress")]
    AlreadyProcessing,
    #[error("workflow already completed; reset it before submitting again")]
    AlreadyCompleted,
    #[error(transparent)]
    Service(#[from] ServiceError),
}

#[derive(Debug, Error)]
#[error("invalid base64 image payload for record {id}: {source}")]
pub struct DecodeError {
    pub id: Uuid,
    #[source]
    pub source: base64::DecodeError,
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
