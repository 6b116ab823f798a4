//! Rhai backend for module handler files.
//!
//! A module's `handlers.rhai` is compiled once per scan. Every public function
//! named `handle_{action}` with exactly one parameter becomes a
//! [`ScriptedHandler`] for action `{action}`:
//!
//! ```rhai
//! fn handle_ping(payload) {
//!     #{ success: true, data: "pong" }
//! }
//!
//! fn handle_lookup(payload) {
//!     if payload.id == () { throw "id is required"; }
//!     #{ success: true, data: payload.id * 2 }
//! }
//! ```
//!
//! Payloads cross the boundary through `rhai::serde`: JSON objects arrive as
//! object maps, arrays as arrays, `null` as `()`.
//!
//! # Safety Limits
//!
//! Every handler call runs with an operation budget (default 100,000). A
//! runaway loop terminates with a "Safety limit exceeded" runtime error which
//! the dispatcher reports as `handler_error`.

use super::script_error::{convert_rhai_error, ScriptError};
use crate::modules::handler::{action_name, ActionHandler, Handler};
use rhai::{CallFnOptions, Dynamic, Engine, FnAccess, Position, Scope, AST};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Default operation budget per handler call.
pub const DEFAULT_MAX_OPERATIONS: u64 = 100_000;

/// Log target for `print` and `debug` output from handler scripts.
pub const SCRIPT_LOG_TARGET: &str = "debug_modules::script";

// =============================================================================
// RhaiEngine
// =============================================================================

/// Shared Rhai engine used to compile and run module handler files.
///
/// Cloning is cheap; all clones share one configured `rhai::Engine`.
#[derive(Clone)]
pub struct RhaiEngine {
    engine: Arc<Engine>,
}

impl RhaiEngine {
    /// Create an engine with the default operation budget.
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_MAX_OPERATIONS)
    }

    /// Create an engine with a custom operation budget.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let engine = RhaiEngine::with_limit(10_000);
    /// ```
    pub fn with_limit(max_operations: u64) -> Self {
        let mut engine = Engine::new();

        engine.on_progress(move |count| {
            if count > max_operations {
                Some(format!("Safety limit exceeded: maximum {} operations", max_operations).into())
            } else {
                None
            }
        });

        engine.on_print(|text| info!(target: SCRIPT_LOG_TARGET, "{}", text));
        engine.on_debug(|text, source, pos: Position| {
            debug!(
                target: SCRIPT_LOG_TARGET,
                source = source.unwrap_or("<inline>"),
                line = pos.line(),
                "{}",
                text
            );
        });

        Self {
            engine: Arc::new(engine),
        }
    }

    /// Read and compile a handler file.
    ///
    /// # Errors
    ///
    /// Returns `SourceUnavailable` if the file cannot be read, otherwise the
    /// errors of [`RhaiEngine::compile`].
    pub fn compile_file(&self, path: &Path) -> Result<HandlerScript, ScriptError> {
        let source =
            std::fs::read_to_string(path).map_err(|e| ScriptError::SourceUnavailable {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        self.compile(&source, path)
    }

    /// Compile handler source and run its top-level statements once.
    ///
    /// `origin` labels errors and script log lines.
    ///
    /// # Errors
    ///
    /// Returns `CompilationError` for syntax errors and `RuntimeError` when
    /// the top-level statements fail.
    pub fn compile(&self, source: &str, origin: &Path) -> Result<HandlerScript, ScriptError> {
        let mut ast = self
            .engine
            .compile(source)
            .map_err(|e| convert_rhai_error(e.into()))?;
        ast.set_source(origin.display().to_string());

        let mut scope = Scope::new();
        self.engine
            .run_ast_with_scope(&mut scope, &ast)
            .map_err(convert_rhai_error)?;

        Ok(HandlerScript {
            engine: self.engine.clone(),
            ast: Arc::new(ast),
            scope: Arc::new(scope),
            path: origin.to_path_buf(),
        })
    }
}

impl Default for RhaiEngine {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// HandlerScript
// =============================================================================

/// A compiled handler file.
///
/// `scope` holds the variables left by the single load-time run of the
/// top-level statements; calls start from a copy of it.
pub struct HandlerScript {
    engine: Arc<Engine>,
    ast: Arc<AST>,
    scope: Arc<Scope<'static>>,
    path: PathBuf,
}

/// Handlers bound from a script, plus the `handle_*` functions that were passed over.
pub struct BoundHandlers {
    /// Action name to handler
    pub handlers: HashMap<String, Handler>,
    /// `handle_*` functions not bound, with the reason
    pub ignored: Vec<(String, &'static str)>,
}

impl HandlerScript {
    /// Path the script was compiled from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bind every public single-parameter `handle_{action}` function.
    ///
    /// Functions without the prefix are helpers and are skipped silently.
    pub fn bind_handlers(&self) -> BoundHandlers {
        let mut handlers: HashMap<String, Handler> = HashMap::new();
        let mut ignored = Vec::new();

        for func in self.ast.iter_functions() {
            let Some(action) = action_name(func.name) else {
                continue;
            };
            if matches!(func.access, FnAccess::Private) {
                ignored.push((func.name.to_string(), "private function"));
                continue;
            }
            if func.params.len() != 1 {
                ignored.push((func.name.to_string(), "expects exactly one payload parameter"));
                continue;
            }

            handlers.insert(
                action.to_string(),
                Arc::new(ScriptedHandler {
                    engine: self.engine.clone(),
                    ast: self.ast.clone(),
                    scope: self.scope.clone(),
                    function: func.name.to_string(),
                }),
            );
        }

        BoundHandlers { handlers, ignored }
    }
}

// =============================================================================
// ScriptedHandler
// =============================================================================

/// One `handle_{action}` function of a compiled handler file.
pub struct ScriptedHandler {
    engine: Arc<Engine>,
    ast: Arc<AST>,
    scope: Arc<Scope<'static>>,
    function: String,
}

impl ScriptedHandler {
    fn invoke(&self, payload: &Value) -> Result<Value, ScriptError> {
        let arg = rhai::serde::to_dynamic(payload)?;
        // Top-level statements already ran at load; only the function body counts.
        let options = CallFnOptions::new().eval_ast(false).rewind_scope(true);
        let mut scope = (*self.scope).clone();
        let result: Dynamic = self.engine.call_fn_with_options(
            options,
            &mut scope,
            &self.ast,
            self.function.as_str(),
            (arg,),
        )?;
        let value: Value = rhai::serde::from_dynamic(&result)?;
        Ok(value)
    }
}

impl ActionHandler for ScriptedHandler {
    fn call(&self, payload: &Value) -> anyhow::Result<Value> {
        Ok(self.invoke(payload)?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
