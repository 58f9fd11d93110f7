//! The resolution pipeline.
//!
//! A run goes through fixed stages, each consuming the complete output of
//! the previous one:
//!
//! ```text
//! Unloaded -> Loading -> SymbolsBound -> AliasesExpanded
//!          -> AssociationsBound -> Validated -> Published
//! ```
//!
//! Any stage may end the run in `Failed`. Fatal problems are returned as
//! [`Error`]; field-level problems are collected as diagnostics and keep the
//! run going so that one run reports every defect.

pub mod alias;
pub mod association;
mod graph;
pub mod loader;
pub mod symbols;

pub use graph::{ClassSpans, Graph};
pub use loader::{LoadedFile, ParseCache};
pub use symbols::SymbolTable;

use crate::config::GeneratorConfig;
use crate::diagnostic::Diagnostics;
use crate::error::Error;
use crate::model::FileId;
use crate::snapshot::ResolvedModel;
use crate::source::SourceProvider;
use crate::validate::{self, ValidationContext};
use serde::Serialize;
use std::collections::BTreeSet;

/// State of a resolution run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum PipelineState {
    #[default]
    Unloaded,
    Loading,
    SymbolsBound,
    AliasesExpanded,
    AssociationsBound,
    Validated,
    Published,
    Failed,
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Outcome of a run that did not hit a fatal error.
#[derive(Debug)]
pub struct Resolution {
    /// The validated model; `None` when error diagnostics block it.
    pub model: Option<ResolvedModel>,
    /// Every diagnostic of the run, in discovery order.
    pub diagnostics: Diagnostics,
}

impl Resolution {
    /// Whether the run produced a model.
    pub fn is_clean(&self) -> bool {
        self.model.is_some()
    }
}

/// One resolution run.
#[derive(Debug)]
pub struct Pipeline<'a> {
    config: &'a GeneratorConfig,
    state: PipelineState,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a GeneratorConfig) -> Self {
        Self {
            config,
            state: PipelineState::Unloaded,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    fn advance(&mut self, next: PipelineState) {
        tracing::debug!(from = %self.state, to = %next, "pipeline stage");
        self.state = next;
    }

    /// Resolve every file of `provider` into a model with the given version.
    ///
    /// With `changed`, cached files outside the set are reused without being
    /// read again.
    pub fn run(
        &mut self,
        provider: &dyn SourceProvider,
        cache: &mut ParseCache,
        changed: Option<&BTreeSet<FileId>>,
        version: u64,
    ) -> Result<Resolution, Error> {
        let result = self.run_stages(provider, cache, changed, version);
        match &result {
            Ok(resolution) if resolution.is_clean() => {}
            _ => self.advance(PipelineState::Failed),
        }
        result
    }

    fn run_stages(
        &mut self,
        provider: &dyn SourceProvider,
        cache: &mut ParseCache,
        changed: Option<&BTreeSet<FileId>>,
        version: u64,
    ) -> Result<Resolution, Error> {
        self.config.validate()?;
        let mut diagnostics = Diagnostics::new();

        self.advance(PipelineState::Loading);
        let files = loader::read_all(provider, self.config, cache, changed)?;
        let files = loader::order(files)?;

        let (table, mut graph) = symbols::bind(files, &mut diagnostics)?;
        self.advance(PipelineState::SymbolsBound);

        alias::expand(&table, &mut graph, self.config, &mut diagnostics);
        self.advance(PipelineState::AliasesExpanded);

        association::bind(&table, &mut graph, self.config, &mut diagnostics);
        self.advance(PipelineState::AssociationsBound);

        validate::validate(
            &ValidationContext::new(&table, &graph, self.config),
            &mut diagnostics,
        )?;

        if diagnostics.has_errors() {
            return Ok(Resolution {
                model: None,
                diagnostics,
            });
        }
        self.advance(PipelineState::Validated);

        let model = ResolvedModel::new(
            version,
            self.config.clone(),
            &table,
            graph,
            diagnostics.warnings().cloned().collect(),
        );
        Ok(Resolution {
            model: Some(model),
            diagnostics,
        })
    }
}

/// Resolve a model once, without caching.
pub fn resolve(provider: &dyn SourceProvider, config: &GeneratorConfig) -> Result<Resolution, Error> {
    let mut cache = ParseCache::new();
    Pipeline::new(config).run(provider, &mut cache, None, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySources;

    fn sources() -> MemorySources {
        MemorySources::new()
            .with_file(
                FileId::new("App", "Domain", "Domains"),
                r#"
                domain DO_ID { map sql = "int"; map ts = "number"; }
                domain DO_CODE { length 3; map sql = "varchar"; map ts = "string"; }
                "#,
            )
            .with_file(
                FileId::new("App", "Model", "Pays"),
                r#"
                uses App::Domain::Domains;
                class Pays reference { trigram PAY; field Code: DO_CODE primary; }
                "#,
            )
    }

    #[test]
    fn test_clean_run_reaches_validated() {
        let config = GeneratorConfig::new("App");
        let mut pipeline = Pipeline::new(&config);
        let resolution = pipeline.run(&sources(), &mut ParseCache::new(), None, 7).unwrap();

        assert!(resolution.is_clean());
        assert_eq!(pipeline.state(), PipelineState::Validated);
        assert_eq!(resolution.model.unwrap().version(), 7);
    }

    #[test]
    fn test_error_diagnostics_fail_the_run() {
        let sources = sources();
        sources.insert(
            FileId::new("App", "Model", "Societe"),
            "uses App::Model::Pays; class Societe { ref PaysCode -> Pays; }",
        );
        let config = GeneratorConfig::new("App");
        let mut pipeline = Pipeline::new(&config);
        let resolution = pipeline.run(&sources, &mut ParseCache::new(), None, 1).unwrap();

        assert!(!resolution.is_clean());
        assert!(resolution.diagnostics.has_errors());
        assert_eq!(pipeline.state(), PipelineState::Failed);
    }

    #[test]
    fn test_fatal_error_fails_the_run() {
        let config = GeneratorConfig::default();
        let mut pipeline = Pipeline::new(&config);
        let result = pipeline.run(&sources(), &mut ParseCache::new(), None, 1);

        assert!(matches!(result, Err(Error::MissingSetting { .. })));
        assert_eq!(pipeline.state(), PipelineState::Failed);
    }
}
