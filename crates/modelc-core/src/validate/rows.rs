//! Shape of literal enumeration rows.

use super::ValidationContext;
use crate::diagnostic::{DiagnosticKind, Diagnostics};
use crate::model::{ClassId, Property};
use std::collections::HashSet;

/// Whether a row may omit a value for this property.
fn may_omit(ctx: &ValidationContext<'_>, property: &Property) -> bool {
    let generated_key =
        property.is_primary_key() && property.domain() == Some(ctx.config.identifier_domain.as_str());
    generated_key || property.default_value().is_some() || !property.is_persisted()
}

/// Every row gives a value to every persisted property, names only known
/// properties and has a distinct key.
pub fn check_rows(ctx: &ValidationContext<'_>, diagnostics: &mut Diagnostics) {
    let graph = ctx.graph;
    for id in graph.ids() {
        let class = graph.class(id);
        if class.rows.is_empty() {
            continue;
        }
        if !class.stereotype.has_rows() {
            diagnostics.push(graph.diagnostic(
                ctx.table,
                id,
                DiagnosticKind::UnexpectedRows,
                graph.spans[id.index()].rows[0],
                format!(
                    "class '{}' declares rows but is neither an enumeration nor a reference list",
                    class.name
                ),
            ));
            continue;
        }
        check_class_rows(ctx, id, diagnostics);
    }
}

fn check_class_rows(ctx: &ValidationContext<'_>, id: ClassId, diagnostics: &mut Diagnostics) {
    let graph = ctx.graph;
    let class = graph.class(id);
    let spans = &graph.spans[id.index()];
    let key = graph.row_key(id).map(|p| p.name().to_string());

    let mut names = HashSet::new();
    let mut keys = HashSet::new();
    for (row_index, row) in class.rows.iter().enumerate() {
        let row_span = spans.rows[row_index];

        if !names.insert(row.name.as_str()) {
            diagnostics.push(graph.diagnostic(
                ctx.table,
                id,
                DiagnosticKind::DuplicateEnumerationRow,
                row_span,
                format!("class '{}' declares row '{}' twice", class.name, row.name),
            ));
        }

        for property in class.properties.iter().filter(|p| !may_omit(ctx, p)) {
            if row.get(property.name()).is_none() {
                diagnostics.push(
                    graph
                        .diagnostic(
                            ctx.table,
                            id,
                            DiagnosticKind::MissingEnumerationValue,
                            row_span,
                            format!(
                                "row '{}' of class '{}' has no value for '{}'",
                                row.name,
                                class.name,
                                property.name()
                            ),
                        )
                        .with_field(property.name()),
                );
            }
        }

        for (value_index, (field, _)) in row.values.iter().enumerate() {
            if class.property(field).is_none() {
                diagnostics.push(
                    graph
                        .diagnostic(
                            ctx.table,
                            id,
                            DiagnosticKind::UnknownEnumerationField,
                            spans.row_values[row_index][value_index],
                            format!(
                                "row '{}' of class '{}' sets unknown property '{}'",
                                row.name, class.name, field
                            ),
                        )
                        .with_field(field),
                );
            }
        }

        let Some(key_value) = key.as_deref().and_then(|k| row.get(k)) else {
            continue;
        };
        let rendered = key_value.to_string();
        if !keys.insert(rendered.clone()) {
            diagnostics.push(graph.diagnostic(
                ctx.table,
                id,
                DiagnosticKind::DuplicateEnumerationRow,
                row_span,
                format!(
                    "row '{}' of class '{}' repeats key value {}",
                    row.name, class.name, rendered
                ),
            ));
        }
    }
}
