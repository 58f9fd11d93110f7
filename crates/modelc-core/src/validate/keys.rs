//! Primary key completeness.

use super::ValidationContext;
use crate::diagnostic::{DiagnosticKind, Diagnostics};

/// Every concrete class stored in the database exposes exactly one primary
/// key, declared or inherited. A second key, or a redeclared inherited one,
/// is an error on any class.
pub fn check_primary_keys(ctx: &ValidationContext<'_>, diagnostics: &mut Diagnostics) {
    let graph = ctx.graph;
    for id in graph.ids() {
        let class = graph.class(id);
        let own: Vec<usize> = class
            .properties
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_primary_key())
            .map(|(i, _)| i)
            .collect();
        let inherited = graph.inherited_primary_key(id);

        if let Some(&second) = own.get(1) {
            diagnostics.push(graph.property_diagnostic(
                ctx.table,
                id,
                second,
                DiagnosticKind::DuplicatePrimaryKey,
                format!("class '{}' declares more than one primary key", class.name),
            ));
            continue;
        }

        match (own.first(), inherited) {
            (Some(&index), Some((owner, _))) => {
                diagnostics.push(graph.property_diagnostic(
                    ctx.table,
                    id,
                    index,
                    DiagnosticKind::DuplicatePrimaryKey,
                    format!(
                        "class '{}' redeclares the primary key inherited from '{}'",
                        class.name,
                        graph.class(owner).name
                    ),
                ));
            }
            (None, None) if !class.is_abstract && !class.database_only => {
                diagnostics.push(graph.diagnostic(
                    ctx.table,
                    id,
                    DiagnosticKind::MissingPrimaryKey,
                    graph.spans[id.index()].name,
                    format!("class '{}' has no primary key", class.name),
                ));
            }
            _ => {}
        }
    }
}
