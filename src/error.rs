//! Unified error types for the infergate public API.
//!
//! Every fallible public operation returns [`ModelResult`]. The taxonomy is
//! deliberately flat: each variant maps to one class of caller mistake or
//! one class of engine-side fault.
//!
//! # Error Hierarchy
//!
//! ```text
//! ModelError
//! ├── Configuration(String)       -- malformed/missing/contradictory parameters
//! ├── UnsupportedBackend(String)  -- unrecognized backend tag
//! ├── AlreadyLoaded(BackendKind)  -- second load attempt on a bound handle
//! ├── NotLoaded                   -- predict before any successful load
//! └── Engine(String)              -- fault reported by the external engine
//! ```
//!
//! `Configuration`, `UnsupportedBackend`, `AlreadyLoaded` and `NotLoaded` are
//! all detected before anything crosses the engine boundary. `Engine` wraps
//! the engine's diagnostic text verbatim; faults are never retried or
//! suppressed here.

use crate::backend::BackendKind;
use thiserror::Error;

/// The canonical error type for all infergate operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Malformed, missing or contradictory parameters, detected before any
    /// engine call.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A backend tag that is not one of the supported set.
    #[error("Unsupported backend: {0}")]
    UnsupportedBackend(String),

    /// A load attempt on a handle that is already bound to a backend.
    #[error("Model already loaded with {0} backend")]
    AlreadyLoaded(BackendKind),

    /// Predict called before any successful load.
    #[error("Model not loaded")]
    NotLoaded,

    /// A fault reported by the external engine, carrying its diagnostic
    /// text. Terminal for the call; never retried.
    #[error("Engine error: {0}")]
    Engine(String),
}

/// Result type alias for infergate operations.
pub type ModelResult<T> = Result<T, ModelError>;

impl ModelError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        ModelError::Configuration(msg.into())
    }

    /// Create an engine-fault error.
    pub fn engine(msg: impl Into<String>) -> Self {
        ModelError::Engine(msg.into())
    }

    /// Create an unsupported-backend error.
    pub fn unsupported_backend(tag: impl Into<String>) -> Self {
        ModelError::UnsupportedBackend(tag.into())
    }
}
