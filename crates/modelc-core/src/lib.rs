//! modelc core - schema resolution and validation.
//!
//! This crate turns a set of model files into one immutable
//! [`ResolvedModel`]: files are ordered by their `uses` dependencies,
//! classes are bound into a symbol table, aliases are expanded,
//! associations are bound to their target keys and the resulting graph is
//! validated. Emitters read the snapshot and project domains to their
//! target types on demand.
//!
//! ```no_run
//! use modelc_core::{DirectorySources, GeneratorConfig, ModelStore};
//! use std::sync::Arc;
//!
//! let sources = Arc::new(DirectorySources::new("model"));
//! let store = ModelStore::open(sources, GeneratorConfig::new("App")).unwrap();
//! let model = store.current().unwrap();
//! for class in model.classes() {
//!     println!("{}", class.name);
//! }
//! ```

pub mod config;
pub mod diagnostic;
pub mod error;
pub mod model;
pub mod projection;
pub mod reload;
pub mod resolve;
pub mod snapshot;
pub mod source;
pub mod store;
pub mod validate;

pub use config::GeneratorConfig;
pub use diagnostic::{Diagnostic, DiagnosticKind, Diagnostics, Severity, SourceLocation};
pub use error::Error;
pub use model::{
    AliasProperty, AssociationProperty, Class, ClassId, ClientType, CompositionProperty, Domain,
    EnumerationRow, FieldProperty, FileId, Multiplicity, Namespace, Property, Reference,
    Stereotype, Value,
};
pub use projection::{project, ProjectionError, Projector};
pub use reload::{ReloadWorker, ReloadWorkerConfig};
pub use resolve::{resolve, ParseCache, Pipeline, PipelineState, Resolution};
pub use snapshot::{ModelView, ResolvedModel};
pub use source::{DirectorySources, MemorySources, SourceProvider};
pub use store::{ModelStore, ReloadOutcome};
