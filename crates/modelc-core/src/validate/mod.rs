//! Structural checks of the fully resolved graph.
//!
//! Each check is a plain function over a [`ValidationContext`]. Checks only
//! report; none of them modifies the graph.

mod cycles;
mod keys;
mod properties;
mod rows;
mod stereotype;

pub use cycles::check_reference_cycles;
pub use keys::check_primary_keys;
pub use properties::check_properties;
pub use rows::check_rows;
pub use stereotype::check_unique_keys;

use crate::config::GeneratorConfig;
use crate::diagnostic::Diagnostics;
use crate::error::Error;
use crate::resolve::{Graph, SymbolTable};

/// Inputs shared by every check.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    pub table: &'a SymbolTable,
    pub graph: &'a Graph,
    pub config: &'a GeneratorConfig,
}

impl<'a> ValidationContext<'a> {
    pub fn new(table: &'a SymbolTable, graph: &'a Graph, config: &'a GeneratorConfig) -> Self {
        Self {
            table,
            graph,
            config,
        }
    }
}

/// Run every check.
///
/// Stereotype conformance problems are fatal; everything else is collected.
pub fn validate(ctx: &ValidationContext<'_>, diagnostics: &mut Diagnostics) -> Result<(), Error> {
    check_unique_keys(ctx)?;
    check_properties(ctx, diagnostics);
    check_primary_keys(ctx, diagnostics);
    check_reference_cycles(ctx, diagnostics);
    check_rows(ctx, diagnostics);
    tracing::debug!(
        errors = diagnostics.error_count(),
        warnings = diagnostics.warnings().count(),
        "graph validated"
    );
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::config::GeneratorConfig;
    use crate::diagnostic::Diagnostics;
    use crate::model::FileId;
    use crate::resolve::loader::LoadedFile;
    use crate::resolve::{alias, association, symbols, Graph, SymbolTable};
    use std::sync::Arc;

    /// Resolve one file up to (not including) validation.
    pub fn resolve(source: &str) -> (SymbolTable, Graph, GeneratorConfig) {
        let file = LoadedFile::parse(FileId::new("App", "Model", "M"), Arc::from(source)).unwrap();
        let config = GeneratorConfig::new("App");
        let mut diagnostics = Diagnostics::new();
        let (table, mut graph) = symbols::bind(vec![file], &mut diagnostics).unwrap();
        alias::expand(&table, &mut graph, &config, &mut diagnostics);
        association::bind(&table, &mut graph, &config, &mut diagnostics);
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        (table, graph, config)
    }
}
