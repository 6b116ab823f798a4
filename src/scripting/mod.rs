//! Scripting backend for module handler files.
//!
//! Handler files are Rhai scripts. Rhai is embedded, needs no external
//! runtime, and exposes the compiled AST's function table, which is what the
//! `handle_{action}` naming convention is resolved against.
//!
//! # Architecture
//!
//! ```text
//! RhaiEngine (shared, operation-limited)
//!     └── HandlerScript (one compiled handlers.rhai)
//!             └── ScriptedHandler (one handle_{action} function)
//! ```

pub mod rhai_engine;
pub mod script_error;

pub use rhai_engine::{
    BoundHandlers, HandlerScript, RhaiEngine, ScriptedHandler, DEFAULT_MAX_OPERATIONS,
};
pub use script_error::ScriptError;
