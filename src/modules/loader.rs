//! Module loader for discovering debug module directories.
//!
//! The `ModuleLoader` scans the immediate subdirectories of a root, validates
//! each one, compiles its `handlers.rhai` and binds the `handle_{action}`
//! functions it finds.
//!
//! # Directory Structure
//!
//! ```text
//! debug_modules/
//! ├── cache_debug/
//! │   ├── module.yaml
//! │   ├── interface.html
//! │   └── handlers.rhai
//! └── notes_debug/          # interface-only module
//!     ├── module.yaml
//!     └── interface.html
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use debug_modules::modules::ModuleLoader;
//!
//! let loader = ModuleLoader::new();
//! let report = loader.scan("./debug_modules")?;
//! for skipped in &report.skipped {
//!     eprintln!("skipped {}", skipped);
//! }
//! ```
//!
//! A candidate that fails never aborts the scan; it is recorded in
//! [`ScanReport::skipped`] and the next directory is tried. Only an
//! unreadable root is an error.

use super::descriptor::ModuleDescriptor;
use super::handler::Handler;
use super::validator::{validate_module_dir, SkippedModule};
use crate::error::{AppResult, DebugModuleError};
use crate::scripting::RhaiEngine;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of scanning one root directory.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Loaded modules: id -> descriptor
    pub modules: HashMap<String, Arc<ModuleDescriptor>>,
    /// Candidates that were not loaded
    pub skipped: Vec<SkippedModule>,
}

/// Loader for debug module directories.
pub struct ModuleLoader {
    engine: RhaiEngine,
    /// Natively registered handlers: module id -> action -> handler
    native: HashMap<String, HashMap<String, Handler>>,
}

impl Default for ModuleLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleLoader {
    /// Create a loader with the default script engine.
    pub fn new() -> Self {
        Self::with_engine(RhaiEngine::new())
    }

    /// Create a loader that compiles handler files with `engine`.
    pub fn with_engine(engine: RhaiEngine) -> Self {
        Self {
            engine,
            native: HashMap::new(),
        }
    }

    /// Bind a Rust handler to `action` of the module named `module_id`.
    ///
    /// Native handlers are merged into the module's table whenever a directory
    /// with that name is loaded, and take precedence over a script function
    /// bound to the same action.
    #[must_use]
    pub fn with_native_handler(
        mut self,
        module_id: impl Into<String>,
        action: impl Into<String>,
        handler: Handler,
    ) -> Self {
        self.native
            .entry(module_id.into())
            .or_default()
            .insert(action.into(), handler);
        self
    }

    /// Scan `root` and load every valid module directly beneath it.
    ///
    /// Subdirectories are visited in path order, so when two directories
    /// declare the same name the first one wins and the second is skipped.
    ///
    /// # Errors
    ///
    /// Returns `RootUnavailable` if `root` cannot be listed.
    pub fn scan<P: AsRef<Path>>(&self, root: P) -> AppResult<ScanReport> {
        let root = root.as_ref();
        let root_unavailable = |source| DebugModuleError::RootUnavailable {
            path: root.to_path_buf(),
            source,
        };

        let mut candidates: Vec<PathBuf> = Vec::new();
        for entry in std::fs::read_dir(root).map_err(root_unavailable)? {
            match entry {
                Ok(entry) if entry.path().is_dir() => candidates.push(entry.path()),
                Ok(_) => {}
                Err(e) => warn!("Failed to read entry in {:?}: {}", root, e),
            }
        }
        candidates.sort();

        let mut report = ScanReport::default();
        for candidate in candidates {
            match self.load_candidate(&candidate) {
                Ok(descriptor) => {
                    if let Some(existing) = report.modules.get(&descriptor.id) {
                        let skipped = SkippedModule::load(
                            &candidate,
                            format!(
                                "duplicate module id '{}' (already loaded from {})",
                                descriptor.id,
                                existing.source_path.display()
                            ),
                        );
                        warn!("Skipping debug module: {}", skipped);
                        report.skipped.push(skipped);
                        continue;
                    }

                    info!(
                        "Loaded debug module: {} ({} actions, {:?})",
                        descriptor.id,
                        descriptor.action_names().len(),
                        descriptor.source_path
                    );
                    report
                        .modules
                        .insert(descriptor.id.clone(), Arc::new(descriptor));
                }
                Err(skipped) => {
                    warn!("Skipping debug module: {}", skipped);
                    report.skipped.push(skipped);
                }
            }
        }

        Ok(report)
    }

    /// Validate one candidate and bind its handlers.
    fn load_candidate(&self, dir: &Path) -> Result<ModuleDescriptor, SkippedModule> {
        let descriptor = validate_module_dir(dir)?;

        let mut handlers = HashMap::new();
        if let Some(handler_path) = &descriptor.handler_path {
            let script = self
                .engine
                .compile_file(handler_path)
                .map_err(|e| SkippedModule::load(dir, e.to_string()))?;

            let bound = script.bind_handlers();
            for (function, why) in &bound.ignored {
                warn!(
                    "Ignoring {} in {:?}: {}",
                    function,
                    script.path(),
                    why
                );
            }
            handlers = bound.handlers;
        }

        if let Some(native) = self.native.get(&descriptor.id) {
            for (action, handler) in native {
                if handlers.insert(action.clone(), handler.clone()).is_some() {
                    debug!(
                        "Native handler overrides script for {}.{}",
                        descriptor.id, action
                    );
                }
            }
        }

        for declared in &descriptor.declared_actions {
            if !handlers.contains_key(declared) {
                warn!(
                    "Module {} declares action '{}' but defines no handle_{}",
                    descriptor.id, declared, declared
                );
            }
        }

        Ok(descriptor.with_handlers(handlers))
    }
}
