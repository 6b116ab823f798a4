//! Action handler contract.
//!
//! Every action a module exposes is bound to an [`ActionHandler`]. Handlers
//! receive the caller's JSON payload untouched and return a JSON result that
//! the dispatcher normalizes into an [`Envelope`](super::Envelope).
//!
//! Two implementations exist:
//!
//! - [`ScriptedHandler`](crate::scripting::ScriptedHandler): a `handle_{action}`
//!   function from a module's `handlers.rhai`
//! - any `Fn(&Value) -> anyhow::Result<Value>` closure, registered natively
//!   through [`ModuleLoader::with_native_handler`](super::ModuleLoader::with_native_handler)

use serde_json::Value;
use std::sync::Arc;

/// Prefix a backend function name must carry to be bound as an action.
pub const HANDLER_PREFIX: &str = "handle_";

/// A callable bound to one module action.
pub trait ActionHandler: Send + Sync {
    /// Run the action.
    ///
    /// # Errors
    ///
    /// Any error is reported to the caller as `handler_error` with the
    /// error's message.
    fn call(&self, payload: &Value) -> anyhow::Result<Value>;
}

impl<F> ActionHandler for F
where
    F: Fn(&Value) -> anyhow::Result<Value> + Send + Sync,
{
    fn call(&self, payload: &Value) -> anyhow::Result<Value> {
        self(payload)
    }
}

/// Shared, type-erased handler.
pub type Handler = Arc<dyn ActionHandler>;

/// Wrap a closure as a shared [`Handler`].
pub fn native_handler<F>(f: F) -> Handler
where
    F: Fn(&Value) -> anyhow::Result<Value> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Extract `{action}` from a `handle_{action}` function name.
///
/// Returns `None` for names without the prefix or with an empty suffix.
pub fn action_name(function: &str) -> Option<&str> {
    function
        .strip_prefix(HANDLER_PREFIX)
        .filter(|action| !action.is_empty())
}
