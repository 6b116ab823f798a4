//! Process-wide set of loaded debug modules.
//!
//! The registry owns the current [`ModuleSet`] behind an `ArcSwapOption`.
//! Readers take a snapshot with a single atomic load and keep using it for
//! the whole request; a refresh builds a complete new set off to the side and
//! publishes it with one store. Readers therefore see either the old set or
//! the new one, never a mix.
//!
//! ```text
//! Uninitialized --refresh ok--> Ready --refresh ok--> Ready
//!       |                          |
//!       +--refresh err--> (same)   +--refresh err--> Ready (previous set kept)
//! ```

use super::descriptor::{ModuleDescriptor, ModuleSummary};
use super::loader::{ModuleLoader, ScanReport};
use super::validator::SkippedModule;
use crate::error::{AppResult, DebugModuleError};
use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{error, info, warn};

/// Lifecycle state of a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryState {
    /// No scan has succeeded yet
    Uninitialized,
    /// A module set is published
    Ready,
}

/// Immutable result of one successful scan.
#[derive(Debug)]
pub struct ModuleSet {
    modules: HashMap<String, Arc<ModuleDescriptor>>,
    skipped: Vec<SkippedModule>,
    generation: u64,
    loaded_at: DateTime<Utc>,
}

impl ModuleSet {
    fn from_report(report: ScanReport, generation: u64) -> Self {
        Self {
            modules: report.modules,
            skipped: report.skipped,
            generation,
            loaded_at: Utc::now(),
        }
    }

    /// Look up a module by id.
    pub fn get(&self, id: &str) -> Option<&Arc<ModuleDescriptor>> {
        self.modules.get(id)
    }

    /// Loaded module ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.modules.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of loaded modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether no module loaded.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Candidates skipped by the scan that produced this set.
    pub fn skipped(&self) -> &[SkippedModule] {
        &self.skipped
    }

    /// 1 for the first published set, incremented on every refresh.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Response of a refresh, as reported to whoever triggered it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshReport {
    /// Number of modules published
    pub loaded: usize,
    /// Candidates that were not loaded
    pub skipped: Vec<SkippedModule>,
    /// Generation of the published set
    pub generation: u64,
    /// When the published set was built
    pub loaded_at: DateTime<Utc>,
}

/// Owner of the current module set.
pub struct ModuleRegistry {
    root: PathBuf,
    loader: ModuleLoader,
    current: ArcSwapOption<ModuleSet>,
    /// Serializes refreshes; readers never take it.
    refresh_lock: Mutex<()>,
}

impl ModuleRegistry {
    /// Create an uninitialized registry over `root`.
    pub fn new(root: impl Into<PathBuf>, loader: ModuleLoader) -> Self {
        Self {
            root: root.into(),
            loader,
            current: ArcSwapOption::empty(),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Root directory scanned on refresh.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RegistryState {
        if self.current.load().is_some() {
            RegistryState::Ready
        } else {
            RegistryState::Uninitialized
        }
    }

    /// Rescan the root and publish the result.
    ///
    /// On failure the previously published set, if any, stays in place.
    ///
    /// # Errors
    ///
    /// Returns `RootUnavailable` when the root cannot be listed.
    pub fn refresh(&self) -> AppResult<RefreshReport> {
        let _guard = self
            .refresh_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let report = match self.loader.scan(&self.root) {
            Ok(report) => report,
            Err(e) => {
                error!("Module refresh failed, keeping previous set: {}", e);
                return Err(e);
            }
        };

        let generation = self.snapshot().map_or(1, |set| set.generation + 1);
        let set = ModuleSet::from_report(report, generation);
        let summary = RefreshReport {
            loaded: set.len(),
            skipped: set.skipped.clone(),
            generation,
            loaded_at: set.loaded_at,
        };
        if set.is_empty() {
            warn!("No debug modules loaded from {}", self.root.display());
        }

        self.current.store(Some(Arc::new(set)));
        info!(
            "Published module set #{}: {} loaded, {} skipped",
            generation,
            summary.loaded,
            summary.skipped.len()
        );
        Ok(summary)
    }

    /// Current module set, if any.
    pub fn snapshot(&self) -> Option<Arc<ModuleSet>> {
        self.current.load_full()
    }

    /// Look up a module in the current set.
    pub fn get(&self, id: &str) -> Option<Arc<ModuleDescriptor>> {
        self.snapshot().and_then(|set| set.get(id).cloned())
    }

    /// Summaries of all loaded modules, sorted by id.
    pub fn list(&self) -> Vec<ModuleSummary> {
        let Some(set) = self.snapshot() else {
            return Vec::new();
        };
        let mut summaries: Vec<ModuleSummary> =
            set.modules.values().map(|module| module.summary()).collect();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        summaries
    }

    /// Diagnostics of the last successful scan.
    pub fn skipped(&self) -> Vec<SkippedModule> {
        self.snapshot()
            .map(|set| set.skipped.clone())
            .unwrap_or_default()
    }

    /// Read the frontend fragment of module `id`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownModule` if `id` is not loaded, or `Io` if the file
    /// can no longer be read.
    pub fn interface(&self, id: &str) -> AppResult<String> {
        let module = self
            .get(id)
            .ok_or_else(|| DebugModuleError::UnknownModule(id.to_string()))?;
        Ok(std::fs::read_to_string(&module.interface_path)?)
    }
}
