//! Snapshot store: the currently published model and its diagnostics.

use crate::config::GeneratorConfig;
use crate::diagnostic::Diagnostics;
use crate::error::Error;
use crate::model::FileId;
use crate::resolve::{ParseCache, Pipeline, PipelineState};
use crate::snapshot::ResolvedModel;
use crate::source::SourceProvider;
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Result of a reload that completed without a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// A new snapshot was published.
    Published {
        /// Version of the new snapshot.
        version: u64,
        /// Warnings carried by the snapshot.
        warnings: usize,
    },
    /// Error diagnostics blocked publication; the previous snapshot stays.
    Rejected {
        /// Number of error diagnostics.
        errors: usize,
    },
}

/// Holder of the published model.
///
/// Only one resolution run executes at a time. Readers take an
/// `Arc<ResolvedModel>` and keep it for as long as they like; publishing
/// swaps the pointer.
pub struct ModelStore {
    provider: Arc<dyn SourceProvider>,
    config: GeneratorConfig,
    /// Current snapshot version (cached).
    current_version: AtomicU64,
    /// Current snapshot.
    current: RwLock<Option<Arc<ResolvedModel>>>,
    /// Diagnostics of the last run.
    diagnostics: RwLock<Diagnostics>,
    /// Fatal error of the last run, rendered.
    last_error: RwLock<Option<String>>,
    state: RwLock<PipelineState>,
    /// Held for the whole run; owns the parse cache.
    run: Mutex<ParseCache>,
}

impl ModelStore {
    /// Create a store. Nothing is resolved until the first reload.
    pub fn new(provider: Arc<dyn SourceProvider>, config: GeneratorConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            provider,
            config,
            current_version: AtomicU64::new(0),
            current: RwLock::new(None),
            diagnostics: RwLock::new(Diagnostics::new()),
            last_error: RwLock::new(None),
            state: RwLock::new(PipelineState::Unloaded),
            run: Mutex::new(ParseCache::new()),
        })
    }

    /// Create a store and run the first resolution.
    pub fn open(provider: Arc<dyn SourceProvider>, config: GeneratorConfig) -> Result<Self, Error> {
        let store = Self::new(provider, config)?;
        store.reload()?;
        Ok(store)
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Version of the published snapshot, 0 before the first publication.
    pub fn current_version(&self) -> u64 {
        self.current_version.load(Ordering::SeqCst)
    }

    /// The published snapshot.
    pub fn current(&self) -> Option<Arc<ResolvedModel>> {
        self.current.read().clone()
    }

    /// Diagnostics of the last run. Empty after a fatal error.
    pub fn diagnostics(&self) -> Diagnostics {
        self.diagnostics.read().clone()
    }

    /// Fatal error of the last run, if it had one.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    /// State the last run ended in.
    pub fn state(&self) -> PipelineState {
        *self.state.read()
    }

    /// Re-read and re-resolve every file.
    pub fn reload(&self) -> Result<ReloadOutcome, Error> {
        self.run_once(None)
    }

    /// Re-resolve after a change to `changed`. Other cached files are reused
    /// without being read again.
    pub fn reload_changed(&self, changed: &BTreeSet<FileId>) -> Result<ReloadOutcome, Error> {
        self.run_once(Some(changed))
    }

    fn run_once(&self, changed: Option<&BTreeSet<FileId>>) -> Result<ReloadOutcome, Error> {
        let mut cache = self.run.lock();
        let version = self.current_version() + 1;
        let mut pipeline = Pipeline::new(&self.config);

        let result = pipeline.run(&*self.provider, &mut cache, changed, version);
        let resolution = match result {
            Ok(resolution) => resolution,
            Err(e) => {
                tracing::warn!(error = %e, "model resolution failed");
                // the run may have stopped before reading them
                if let Some(changed) = changed {
                    for file in changed {
                        cache.invalidate(file);
                    }
                }
                *self.diagnostics.write() = Diagnostics::new();
                *self.last_error.write() = Some(e.to_string());
                *self.state.write() = PipelineState::Failed;
                return Err(e);
            }
        };
        *self.last_error.write() = None;

        let outcome = match resolution.model {
            Some(model) => {
                let warnings = model.warnings().len();
                *self.current.write() = Some(Arc::new(model));
                self.current_version.store(version, Ordering::SeqCst);
                *self.state.write() = PipelineState::Published;
                tracing::info!(version, warnings, "model published");
                ReloadOutcome::Published { version, warnings }
            }
            None => {
                let errors = resolution.diagnostics.error_count();
                *self.state.write() = PipelineState::Failed;
                tracing::warn!(
                    errors,
                    serving = self.current_version(),
                    "model rejected, keeping previous snapshot"
                );
                ReloadOutcome::Rejected { errors }
            }
        };
        *self.diagnostics.write() = resolution.diagnostics;
        Ok(outcome)
    }
}

impl std::fmt::Debug for ModelStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelStore")
            .field("config", &self.config)
            .field("current_version", &self.current_version())
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySources;

    fn pays_id() -> FileId {
        FileId::new("App", "Model", "Pays")
    }

    fn sources() -> Arc<MemorySources> {
        Arc::new(
            MemorySources::new()
                .with_file(
                    FileId::new("App", "Domain", "Domains"),
                    r#"domain DO_CODE { length 3; map sql = "varchar"; map ts = "string"; }"#,
                )
                .with_file(pays_id(), "class Pays reference { field Code: DO_CODE primary; }"),
        )
    }

    #[test]
    fn test_open_publishes_first_version() {
        let store = ModelStore::open(sources(), GeneratorConfig::new("App")).unwrap();
        assert_eq!(store.current_version(), 1);
        assert_eq!(store.state(), PipelineState::Published);
        assert!(store.current().unwrap().class_by_name("Pays").is_some());
    }

    #[test]
    fn test_rejected_run_keeps_previous_snapshot() {
        let sources = sources();
        let store = ModelStore::open(sources.clone(), GeneratorConfig::new("App")).unwrap();
        let before = store.current().unwrap();

        sources.insert(pays_id(), "class Pays reference { field Code: DO_CODE; }");
        let outcome = store.reload().unwrap();

        assert_eq!(outcome, ReloadOutcome::Rejected { errors: 1 });
        assert_eq!(store.state(), PipelineState::Failed);
        assert_eq!(store.current_version(), 1);
        assert!(Arc::ptr_eq(&before, &store.current().unwrap()));
        assert!(store.diagnostics().has_errors());
    }

    #[test]
    fn test_clean_run_clears_diagnostics() {
        let sources = sources();
        let store = ModelStore::new(sources.clone(), GeneratorConfig::new("App")).unwrap();
        sources.insert(pays_id(), "class Pays reference { field Code: DO_CODE; }");
        assert!(matches!(store.reload().unwrap(), ReloadOutcome::Rejected { .. }));
        assert!(store.current().is_none());

        sources.insert(pays_id(), "class Pays reference { field Code: DO_CODE primary; }");
        let outcome = store.reload().unwrap();
        assert_eq!(outcome, ReloadOutcome::Published { version: 1, warnings: 0 });
        assert!(store.diagnostics().is_empty());
    }

    #[test]
    fn test_fatal_error_is_recorded() {
        let sources = sources();
        let store = ModelStore::open(sources.clone(), GeneratorConfig::new("App")).unwrap();
        sources.insert(pays_id(), "class Pays {");

        assert!(matches!(store.reload(), Err(Error::Parse { .. })));
        assert!(store.last_error().is_some());
        assert_eq!(store.current_version(), 1);

        sources.insert(pays_id(), "class Pays reference { field Code: DO_CODE primary; }");
        store.reload().unwrap();
        assert!(store.last_error().is_none());
        assert_eq!(store.current_version(), 2);
    }

    #[test]
    fn test_broken_file_stays_broken_across_partial_reloads() {
        let sources = sources();
        let store = ModelStore::open(sources.clone(), GeneratorConfig::new("App")).unwrap();
        let domains = FileId::new("App", "Domain", "Domains");

        sources.insert(pays_id(), "class Pays {");
        let changed: BTreeSet<FileId> = [pays_id()].into_iter().collect();
        assert!(matches!(store.reload_changed(&changed), Err(Error::Parse { .. })));
        assert!(store.diagnostics().is_empty());

        sources.insert(
            domains.clone(),
            r#"domain DO_CODE { length 2; map sql = "varchar"; map ts = "string"; }"#,
        );
        let changed: BTreeSet<FileId> = [domains].into_iter().collect();
        assert!(matches!(store.reload_changed(&changed), Err(Error::Parse { .. })));
        assert_eq!(store.current_version(), 1);
        assert_eq!(store.state(), PipelineState::Failed);
    }

    #[test]
    fn test_fatal_error_clears_previous_diagnostics() {
        let sources = sources();
        let store = ModelStore::open(sources.clone(), GeneratorConfig::new("App")).unwrap();
        sources.insert(pays_id(), "class Pays reference { field Code: DO_CODE; }");
        assert!(matches!(store.reload().unwrap(), ReloadOutcome::Rejected { .. }));
        assert!(store.diagnostics().has_errors());

        sources.insert(pays_id(), "class Pays {");
        assert!(store.reload().is_err());
        assert!(store.diagnostics().is_empty());
        assert!(store.last_error().is_some());
    }

    #[test]
    fn test_reload_changed_rereads_only_changed_files() {
        let sources = sources();
        let store = ModelStore::open(sources.clone(), GeneratorConfig::new("App")).unwrap();

        sources.insert(
            pays_id(),
            "class Pays reference { trigram PAY; field Code: DO_CODE primary; }",
        );
        let changed: BTreeSet<FileId> = [pays_id()].into_iter().collect();
        store.reload_changed(&changed).unwrap();

        let model = store.current().unwrap();
        let pays = model.class_by_name("Pays").unwrap();
        assert_eq!(pays.trigram.as_deref(), Some("PAY"));
        assert_eq!(model.version(), 2);
    }

    #[test]
    fn test_invalid_config_is_rejected_up_front() {
        assert!(matches!(
            ModelStore::new(sources(), GeneratorConfig::default()),
            Err(Error::MissingSetting { .. })
        ));
    }
}
