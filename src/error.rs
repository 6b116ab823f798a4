//! Custom error types for the debug module framework.
//!
//! This module defines the primary error type, `DebugModuleError`, used by the
//! registry and the binary. Using the `thiserror` crate, it provides a
//! centralized way to describe the failures that escape a scan or a lookup.
//!
//! ## Error Hierarchy
//!
//! - **`RootUnavailable`**: The modules root directory is missing or cannot be
//!   listed. This is the only scan-level fatal error; a refresh that hits it
//!   leaves the previous registry contents in place.
//! - **`UnknownModule`**: A lookup named a module that is not loaded.
//! - **`Io`**: Wraps standard `std::io::Error`.
//!
//! Per-module and per-dispatch failures are deliberately *not* represented
//! here. They are values: [`crate::modules::SkippedModule`] for the scan and
//! [`crate::modules::Envelope`] for dispatch.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias for results using the framework error type.
pub type AppResult<T> = std::result::Result<T, DebugModuleError>;

/// Errors that escape the framework to its host.
#[derive(Error, Debug)]
pub enum DebugModuleError {
    /// The modules root directory cannot be scanned.
    #[error("Modules root {path:?} is unavailable: {source}")]
    RootUnavailable {
        /// Root that was requested.
        path: PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: std::io::Error,
    },

    /// No module with this id is loaded.
    #[error("Unknown module: {0}")]
    UnknownModule(String),

    /// Generic I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
