//! Candidate directory validation.
//!
//! A directory is a debug module when it contains:
//!
//! ```text
//! <dir>/
//! ├── module.yaml      # required, needs a non-empty `name`
//! ├── interface.html   # required frontend fragment
//! └── handlers.rhai    # required only when `actions` is non-empty
//! ```
//!
//! Validation never fails loudly: every problem becomes a [`SkippedModule`]
//! with kind [`SkipKind::ValidationError`].

use super::descriptor::{ModuleConfig, ModuleDescriptor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Configuration file name.
pub const CONFIG_FILE: &str = "module.yaml";
/// Frontend fragment file name.
pub const INTERFACE_FILE: &str = "interface.html";
/// Backend handler file name.
pub const HANDLER_FILE: &str = "handlers.rhai";

/// Category of a scan diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipKind {
    /// Missing files, unparsable configuration, missing or mistyped fields
    ValidationError,
    /// Handler source failed to compile or run, or the id was already taken
    LoadError,
}

impl fmt::Display for SkipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipKind::ValidationError => f.write_str("validation_error"),
            SkipKind::LoadError => f.write_str("load_error"),
        }
    }
}

/// A candidate directory that was not loaded, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedModule {
    /// Candidate directory
    pub path: PathBuf,
    /// Failure category
    pub kind: SkipKind,
    /// Human-readable reason
    pub reason: String,
}

impl SkippedModule {
    /// Validation rejection.
    pub fn validation(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: SkipKind::ValidationError,
            reason: reason.into(),
        }
    }

    /// Load rejection.
    pub fn load(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: SkipKind::LoadError,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for SkippedModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.path.display(), self.kind, self.reason)
    }
}

/// Validate `dir` and build its handler-less descriptor.
///
/// # Errors
///
/// Returns a [`SkippedModule`] describing the first violated requirement.
pub fn validate_module_dir(dir: &Path) -> Result<ModuleDescriptor, SkippedModule> {
    let reject = |reason: String| SkippedModule::validation(dir, reason);

    let source_path = dir
        .canonicalize()
        .map_err(|e| reject(format!("cannot resolve directory: {}", e)))?;

    let config_path = source_path.join(CONFIG_FILE);
    if !config_path.is_file() {
        return Err(reject(format!("missing {}", CONFIG_FILE)));
    }

    let interface_path = source_path.join(INTERFACE_FILE);
    if !interface_path.is_file() {
        return Err(reject(format!("missing {}", INTERFACE_FILE)));
    }

    let raw = std::fs::read_to_string(&config_path)
        .map_err(|e| reject(format!("cannot read {}: {}", CONFIG_FILE, e)))?;
    let config: ModuleConfig = serde_yaml::from_str(&raw)
        .map_err(|e| reject(format!("invalid {}: {}", CONFIG_FILE, e)))?;

    if config.name.trim().is_empty() {
        return Err(reject(format!("{}: `name` must not be empty", CONFIG_FILE)));
    }
    if let Some(blank) = config.actions.iter().find(|a| a.trim().is_empty()) {
        return Err(reject(format!(
            "{}: action names must not be empty (found {:?})",
            CONFIG_FILE, blank
        )));
    }

    let handler_path = source_path.join(HANDLER_FILE);
    let handler_path = if handler_path.is_file() {
        Some(handler_path)
    } else if config.actions.is_empty() {
        None
    } else {
        return Err(reject(format!(
            "{} declares actions {:?} but {} is missing",
            CONFIG_FILE, config.actions, HANDLER_FILE
        )));
    };

    Ok(ModuleDescriptor::from_config(
        config,
        source_path,
        interface_path,
        handler_path,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn module_dir(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (name, contents) in files {
            fs::write(dir.path().join(name), contents).unwrap();
        }
        dir
    }

    #[test]
    fn test_valid_interface_only_module() {
        let dir = module_dir(&[
            (CONFIG_FILE, "name: notes\ndescription: Reading list\n"),
            (INTERFACE_FILE, "<div>notes</div>"),
        ]);
        let desc = validate_module_dir(dir.path()).unwrap();
        assert_eq!(desc.id, "notes");
        assert_eq!(desc.description, "Reading list");
        assert!(desc.handler_path.is_none());
        assert!(desc.source_path.is_absolute());
    }

    #[test]
    fn test_missing_config() {
        let dir = module_dir(&[(INTERFACE_FILE, "<div/>")]);
        let err = validate_module_dir(dir.path()).unwrap_err();
        assert_eq!(err.kind, SkipKind::ValidationError);
        assert!(err.reason.contains("missing module.yaml"));
    }

    #[test]
    fn test_missing_interface() {
        let dir = module_dir(&[(CONFIG_FILE, "name: notes\n")]);
        let err = validate_module_dir(dir.path()).unwrap_err();
        assert!(err.reason.contains(INTERFACE_FILE));
    }

    #[test]
    fn test_missing_name() {
        let dir = module_dir(&[
            (CONFIG_FILE, "display_name: Nameless\n"),
            (INTERFACE_FILE, "<div/>"),
        ]);
        let err = validate_module_dir(dir.path()).unwrap_err();
        assert!(err.reason.contains("name"), "{}", err.reason);
    }

    #[test]
    fn test_empty_name() {
        let dir = module_dir(&[(CONFIG_FILE, "name: '  '\n"), (INTERFACE_FILE, "<div/>")]);
        let err = validate_module_dir(dir.path()).unwrap_err();
        assert!(err.reason.contains("must not be empty"));
    }

    #[test]
    fn test_unparsable_config() {
        let dir = module_dir(&[
            (CONFIG_FILE, "name: [unterminated\n"),
            (INTERFACE_FILE, "<div/>"),
        ]);
        let err = validate_module_dir(dir.path()).unwrap_err();
        assert!(err.reason.starts_with("invalid module.yaml"));
    }

    #[test]
    fn test_mistyped_enabled() {
        let dir = module_dir(&[
            (CONFIG_FILE, "name: notes\nenabled: [1, 2]\n"),
            (INTERFACE_FILE, "<div/>"),
        ]);
        assert!(validate_module_dir(dir.path()).is_err());
    }

    #[test]
    fn test_declared_actions_require_handler_file() {
        let dir = module_dir(&[
            (CONFIG_FILE, "name: cache\nactions: [flush]\n"),
            (INTERFACE_FILE, "<div/>"),
        ]);
        let err = validate_module_dir(dir.path()).unwrap_err();
        assert!(err.reason.contains(HANDLER_FILE));
    }

    #[test]
    fn test_handler_file_is_picked_up() {
        let dir = module_dir(&[
            (CONFIG_FILE, "name: cache\nactions: [flush]\n"),
            (INTERFACE_FILE, "<div/>"),
            (HANDLER_FILE, "fn handle_flush(payload) { #{ success: true } }"),
        ]);
        let desc = validate_module_dir(dir.path()).unwrap();
        assert_eq!(desc.declared_actions, vec!["flush"]);
        assert!(desc.handler_path.unwrap().ends_with(HANDLER_FILE));
    }
}
