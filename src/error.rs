//! Application-level error type returned by every CLI command handler.
//!
//! `AppError` serializes to `{ kind, message }` so `--json` callers can
//! match on a stable `kind` string.

use crate::gcode::EngineError;

/// Top-level error returned by command handlers.
///
/// Serialized with serde's adjacently-tagged representation:
/// `{ "kind": "<variant>", "message": "<human-readable text>" }`
#[derive(Debug, thiserror::Error, serde::Serialize)]
#[serde(tag = "kind", content = "message")]
pub enum AppError {
    /// An input file does not exist; carries the path.
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// A generic I/O error, stringified so it stays serializable.
    #[error("{0}")]
    Io(String),

    /// The engine config or the machine snapshot could not be loaded.
    #[error("{0}")]
    Config(String),

    /// The height map could not be loaded.
    #[error("{0}")]
    HeightMap(String),

    /// A command-line value was out of range or malformed.
    #[error("{0}")]
    InvalidArgument(String),

    /// A query found nothing (empty program, unknown figure or line).
    #[error("{0}")]
    NotFound(String),
}

impl From<EngineError> for AppError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Config(_) => Self::Config(e.to_string()),
            EngineError::HeightMap(_) => Self::HeightMap(e.to_string()),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
