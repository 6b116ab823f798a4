//! Core library for the debug_modules framework.
//!
//! This library discovers self-contained debug module directories, validates
//! their configuration, binds their Rhai action handlers and dispatches
//! `(module, action, payload)` requests to them, returning a normalized
//! result envelope. It is used by the `debug_modules` binary and can be
//! embedded by any host that routes frontend requests.

pub mod config;
pub mod error;
pub mod logging;
pub mod modules;
pub mod scripting;
pub mod serve;

pub use error::{AppResult, DebugModuleError};
