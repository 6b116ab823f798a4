//! Routes `(module_id, action, payload)` requests to module handlers.
//!
//! Resolution happens against one registry snapshot per request:
//!
//! 1. the module must be loaded (`unknown_module`)
//! 2. and enabled (`module_disabled`)
//! 3. and bind the action (`unknown_action`)
//!
//! Only then is the handler called. Its result is normalized by
//! [`Envelope::from_handler_output`]; errors and panics become
//! `handler_error`, contract violations become `malformed_response`.

use super::envelope::{Envelope, FailureReason};
use super::registry::ModuleRegistry;
use serde_json::Value;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

/// Dispatches actions against a [`ModuleRegistry`].
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ModuleRegistry>,
}

impl Dispatcher {
    /// Create a dispatcher reading from `registry`.
    pub fn new(registry: Arc<ModuleRegistry>) -> Self {
        Self { registry }
    }

    /// Registry this dispatcher reads from.
    pub fn registry(&self) -> &Arc<ModuleRegistry> {
        &self.registry
    }

    /// Resolve and run `action` of `module_id` with `payload`.
    ///
    /// Never fails: every outcome is an [`Envelope`].
    pub fn dispatch(&self, module_id: &str, action: &str, payload: &Value) -> Envelope {
        let Some(module) = self.registry.get(module_id) else {
            debug!("Dispatch {}.{}: unknown module", module_id, action);
            return Envelope::failure(
                FailureReason::UnknownModule,
                format!("module '{}' is not loaded", module_id),
            );
        };

        if !module.enabled {
            debug!("Dispatch {}.{}: module disabled", module_id, action);
            return Envelope::failure(
                FailureReason::ModuleDisabled,
                format!("module '{}' is disabled", module_id),
            );
        }

        let Some(handler) = module.handler(action) else {
            debug!("Dispatch {}.{}: unknown action", module_id, action);
            return Envelope::failure(
                FailureReason::UnknownAction,
                format!("module '{}' has no action '{}'", module_id, action),
            );
        };

        debug!("Dispatch {}.{}", module_id, action);
        let outcome = catch_unwind(AssertUnwindSafe(|| handler.call(payload)));

        let output = match outcome {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                warn!("Handler {}.{} failed: {:#}", module_id, action, e);
                return Envelope::handler_error(module_id, action, format!("{:#}", e));
            }
            Err(panic) => {
                let raised = panic_message(panic.as_ref());
                warn!("Handler {}.{} panicked: {}", module_id, action, raised);
                return Envelope::handler_error(module_id, action, raised);
            }
        };

        match Envelope::from_handler_output(output) {
            Ok(envelope) => envelope,
            Err(violation) => {
                warn!(
                    "Handler {}.{} returned a malformed response: {}",
                    module_id, action, violation
                );
                Envelope::failure(
                    FailureReason::MalformedResponse,
                    format!("handler {}.{}: {}", module_id, action, violation),
                )
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(text) = panic.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = panic.downcast_ref::<String>() {
        text.clone()
    } else {
        "handler panicked".to_string()
    }
}
