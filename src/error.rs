//! Error taxonomy for the OCR coordinator.
//!
//! Every failure the coordinator can surface is an `OcrError`. Entry points
//! turn it into a host error value (a synchronous throw or a rejected
//! promise) through `to_host_error`, which picks the host error class.

use crate::host::{ErrorClass, HostError};
use thiserror::Error;

/// Message used when a job finishes with neither a result nor an error.
pub const UNKNOWN_ERROR: &str = "Unknown error occurred";

/// Substrings that mark a message as a type mismatch on the host side.
const TYPE_ERROR_MARKERS: [&str; 2] = ["must be a Buffer", "argument type"];

#[derive(Debug, Error, Clone, PartialEq)]
pub enum OcrError {
    /// Wrong argument arity or type. Always synchronous.
    #[error("{0}")]
    ArgumentType(String),
    /// A batch entry point received an empty list.
    #[error("{0}")]
    EmptyInput(String),
    #[error("Invalid options")]
    InvalidOptions,
    /// Deep copy of host data could not be allocated.
    #[error("{0}")]
    Allocation(String),
    /// The background-work queue refused the job.
    #[error("{0}")]
    Dispatch(String),
    /// The image could not be interpreted.
    #[error("{0}")]
    Decode(String),
    /// The native engine reported a failure.
    #[error("{0}")]
    Recognition(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Unknown error occurred")]
    Unknown,
}

impl OcrError {
    pub fn argument_type(message: impl Into<String>) -> Self {
        Self::ArgumentType(message.into())
    }

    pub fn allocation(what: &str) -> Self {
        Self::Allocation(format!("Failed to allocate memory for {}", what))
    }

    /// Host error class this error surfaces as.
    pub fn class(&self) -> ErrorClass {
        match self {
            OcrError::ArgumentType(_) => ErrorClass::TypeError,
            OcrError::Decode(message) | OcrError::Recognition(message) => classify(message),
            _ => ErrorClass::Error,
        }
    }

    pub fn to_host_error(&self) -> HostError {
        HostError::new(self.class(), self.to_string())
    }
}

/// Pick the host error class for a free-form failure message.
pub fn classify(message: &str) -> ErrorClass {
    if TYPE_ERROR_MARKERS.iter().any(|marker| message.contains(marker)) {
        ErrorClass::TypeError
    } else {
        ErrorClass::Error
    }
}
