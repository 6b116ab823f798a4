//! Module configuration schema and the validated module descriptor.

use super::handler::Handler;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// Typed view of a module's `module.yaml`.
///
/// Only `name` is required. Unknown keys are tolerated so the frontend can keep
/// its own presentation hints next to the framework fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// Module name; becomes the registry id
    pub name: String,
    /// Human-readable name, defaults to `name`
    #[serde(default)]
    pub display_name: Option<String>,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Free-form version string
    #[serde(default)]
    pub version: String,
    /// Free-form author
    #[serde(default)]
    pub author: String,
    /// Whether the module accepts dispatch
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Actions the module declares; a non-empty list requires `handlers.rhai`
    #[serde(default)]
    pub actions: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

/// Validated record of one discovered module.
///
/// Built by the validator with no handlers, then completed by the loader via
/// [`ModuleDescriptor::with_handlers`]. Once published in a registry snapshot
/// it is never mutated.
#[derive(Clone)]
pub struct ModuleDescriptor {
    /// Registry id, equal to the configured `name`
    pub id: String,
    /// Human-readable name
    pub display_name: String,
    /// Free-form description
    pub description: String,
    /// Free-form version string
    pub version: String,
    /// Free-form author
    pub author: String,
    /// Disabled modules are loaded but refuse dispatch
    pub enabled: bool,
    /// Actions listed in the configuration
    pub declared_actions: Vec<String>,
    /// Absolute directory the module was loaded from
    pub source_path: PathBuf,
    /// Absolute path of the frontend fragment
    pub interface_path: PathBuf,
    /// Absolute path of the backend handler file, if present
    pub handler_path: Option<PathBuf>,
    handlers: HashMap<String, Handler>,
}

impl ModuleDescriptor {
    /// Build a handler-less descriptor from a parsed configuration.
    pub fn from_config(
        config: ModuleConfig,
        source_path: PathBuf,
        interface_path: PathBuf,
        handler_path: Option<PathBuf>,
    ) -> Self {
        let display_name = config
            .display_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| config.name.clone());

        Self {
            id: config.name,
            display_name,
            description: config.description,
            version: config.version,
            author: config.author,
            enabled: config.enabled,
            declared_actions: config.actions,
            source_path,
            interface_path,
            handler_path,
            handlers: HashMap::new(),
        }
    }

    /// Replace the handler table.
    #[must_use]
    pub fn with_handlers(mut self, handlers: HashMap<String, Handler>) -> Self {
        self.handlers = handlers;
        self
    }

    /// Look up the handler bound to `action`.
    pub fn handler(&self, action: &str) -> Option<&Handler> {
        self.handlers.get(action)
    }

    /// Whether `action` is bound.
    pub fn has_action(&self, action: &str) -> bool {
        self.handlers.contains_key(action)
    }

    /// Bound action names, sorted.
    pub fn action_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Presentation record for the frontend.
    pub fn summary(&self) -> ModuleSummary {
        ModuleSummary {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
            description: self.description.clone(),
            version: self.version.clone(),
            author: self.author.clone(),
            enabled: self.enabled,
            actions: self.action_names(),
            source_path: self.source_path.clone(),
        }
    }
}

impl fmt::Debug for ModuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDescriptor")
            .field("id", &self.id)
            .field("display_name", &self.display_name)
            .field("version", &self.version)
            .field("enabled", &self.enabled)
            .field("declared_actions", &self.declared_actions)
            .field("source_path", &self.source_path)
            .field("interface_path", &self.interface_path)
            .field("handler_path", &self.handler_path)
            .field("handlers", &self.action_names())
            .finish()
    }
}

/// Serializable module metadata handed to the frontend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSummary {
    /// Registry id
    pub id: String,
    /// Human-readable name
    pub display_name: String,
    /// Free-form description
    pub description: String,
    /// Free-form version string
    pub version: String,
    /// Free-form author
    pub author: String,
    /// Whether the module accepts dispatch
    pub enabled: bool,
    /// Bound action names, sorted
    pub actions: Vec<String>,
    /// Directory the module was loaded from
    pub source_path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::handler::native_handler;
    use serde_json::json;

    fn config(yaml: &str) -> ModuleConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_optional_fields_default() {
        let cfg = config("name: cache_inspector\n");
        assert_eq!(cfg.display_name, None);
        assert!(cfg.enabled);
        assert!(cfg.actions.is_empty());
        assert!(cfg.description.is_empty());
    }

    #[test]
    fn test_missing_name_is_an_error() {
        let result: Result<ModuleConfig, _> = serde_yaml::from_str("version: 1.0.0\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_display_name_falls_back_to_name() {
        let desc = ModuleDescriptor::from_config(
            config("name: ingest\ndisplay_name: ''\n"),
            PathBuf::from("/m/ingest"),
            PathBuf::from("/m/ingest/interface.html"),
            None,
        );
        assert_eq!(desc.id, "ingest");
        assert_eq!(desc.display_name, "ingest");
    }

    #[test]
    fn test_summary_lists_sorted_actions() {
        let mut handlers = HashMap::new();
        handlers.insert("reset".to_string(), native_handler(|_| Ok(json!({}))));
        handlers.insert("peek".to_string(), native_handler(|_| Ok(json!({}))));

        let desc = ModuleDescriptor::from_config(
            config("name: queue\nauthor: ops\nenabled: false\n"),
            PathBuf::from("/m/queue"),
            PathBuf::from("/m/queue/interface.html"),
            None,
        )
        .with_handlers(handlers);

        let summary = desc.summary();
        assert_eq!(summary.actions, vec!["peek", "reset"]);
        assert_eq!(summary.author, "ops");
        assert!(!summary.enabled);
        assert!(desc.has_action("peek"));
        assert!(desc.handler("missing").is_none());
    }
}
