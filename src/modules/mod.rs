//! Debug module discovery, registry and dispatch.
//!
//! # Architecture
//!
//! ```text
//! ModuleRegistry (atomic snapshot of the loaded set)
//! ├── ModuleLoader - scans the root, one candidate per subdirectory
//! │   ├── validate_module_dir - module.yaml / interface.html / handlers.rhai
//! │   └── RhaiEngine - binds handle_{action} functions
//! └── Dispatcher - (module, action, payload) -> Envelope
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use debug_modules::modules::{Dispatcher, ModuleLoader, ModuleRegistry};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(ModuleRegistry::new("./debug_modules", ModuleLoader::new()));
//! registry.refresh()?;
//!
//! let dispatcher = Dispatcher::new(registry.clone());
//! let envelope = dispatcher.dispatch("cache", "flush", &serde_json::json!({}));
//! ```

pub mod descriptor;
pub mod dispatcher;
pub mod envelope;
pub mod handler;
pub mod loader;
pub mod registry;
pub mod validator;

pub use descriptor::{ModuleConfig, ModuleDescriptor, ModuleSummary};
pub use dispatcher::Dispatcher;
pub use envelope::{Envelope, FailureReason};
pub use handler::{native_handler, ActionHandler, Handler};
pub use loader::{ModuleLoader, ScanReport};
pub use registry::{ModuleRegistry, ModuleSet, RefreshReport, RegistryState};
pub use validator::{
    validate_module_dir, SkipKind, SkippedModule, CONFIG_FILE, HANDLER_FILE, INTERFACE_FILE,
};
