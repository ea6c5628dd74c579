//! Error types for Linkflow.
//!
//! All errors in Linkflow are represented by the `LinkflowError` enum,
//! which provides specific variants for different error categories.

use std::{io::ErrorKind, str::Utf8Error};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for all Linkflow operations.
///
/// Each variant represents a specific category of error that can occur
/// during linkage configuration, dispatch, or handler execution.
#[derive(Deserialize, Serialize, Error, Debug, Clone, PartialEq)]
pub enum LinkflowError {
    /// Engine-level errors (startup, shutdown, configuration).
    #[error("{0}")]
    Engine(String),

    /// Configuration parsing or validation errors.
    #[error("{0}")]
    Config(String),

    /// Data conversion errors (JSON, TOML, etc.).
    #[error("{0}")]
    Convert(String),

    /// Linkage definition errors (invalid or incomplete records).
    #[error("{0}")]
    Linkage(String),

    /// A linkage with the same id is already registered.
    #[error("duplicate linkage id: {0}")]
    DuplicateId(String),

    /// A source or target component could not be resolved at dispatch time.
    #[error("component not found: {0}")]
    ComponentNotFound(String),

    /// Parameter mapping resolution errors (bad path or failed expression).
    #[error("{0}")]
    Mapping(String),

    /// Custom handler execution errors.
    #[error("{0}")]
    Handler(String),

    /// Structured exception raised by the embedded script engine.
    #[error("ecode: {ecode}, message: {message}")]
    Exception {
        ecode: String,
        message: String,
    },

    /// An action type the executor does not implement.
    #[error("unknown action type: {0}")]
    UnknownAction(String),

    /// Action execution errors other than handler failures.
    #[error("{0}")]
    Action(String),

    /// Message queue errors.
    #[error("{0}")]
    Queue(String),

    /// Runtime execution errors.
    #[error("{0}")]
    Runtime(String),

    /// I/O operation errors.
    #[error("{0}")]
    IoError(String),
}

impl From<LinkflowError> for String {
    fn from(val: LinkflowError) -> Self {
        val.to_string()
    }
}

impl From<std::io::Error> for LinkflowError {
    fn from(error: std::io::Error) -> Self {
        LinkflowError::IoError(error.to_string())
    }
}

impl From<LinkflowError> for std::io::Error {
    fn from(val: LinkflowError) -> Self {
        #[allow(clippy::io_other_error)]
        std::io::Error::new(ErrorKind::Other, val.to_string())
    }
}

impl From<Utf8Error> for LinkflowError {
    fn from(_: Utf8Error) -> Self {
        LinkflowError::Runtime("Error with utf-8 string convert".to_string())
    }
}

impl From<serde_json::Error> for LinkflowError {
    fn from(error: serde_json::Error) -> Self {
        LinkflowError::Convert(error.to_string())
    }
}

impl From<jsonschema::ValidationError<'_>> for LinkflowError {
    fn from(error: jsonschema::ValidationError<'_>) -> Self {
        LinkflowError::Linkage(error.to_string())
    }
}
