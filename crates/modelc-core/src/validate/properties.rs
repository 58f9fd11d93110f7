//! Property names, domains and class-level property references.

use super::ValidationContext;
use crate::diagnostic::{DiagnosticKind, Diagnostics};
use crate::model::{ClassId, Property};
use std::collections::HashSet;

/// Check property names after alias expansion, field domains, and the
/// label property and key of every class.
pub fn check_properties(ctx: &ValidationContext<'_>, diagnostics: &mut Diagnostics) {
    for id in ctx.graph.ids() {
        check_names(ctx, id, diagnostics);
        check_domains(ctx, id, diagnostics);
        check_class_references(ctx, id, diagnostics);
    }
}

fn check_names(ctx: &ValidationContext<'_>, id: ClassId, diagnostics: &mut Diagnostics) {
    let graph = ctx.graph;
    let class = graph.class(id);
    let mut seen = HashSet::new();
    for (index, property) in class.properties.iter().enumerate() {
        if !seen.insert(property.name()) {
            diagnostics.push(graph.property_diagnostic(
                ctx.table,
                id,
                index,
                DiagnosticKind::DuplicateProperty,
                format!("class '{}' has two properties named '{}'", class.name, property.name()),
            ));
        }
    }
}

/// Declared fields must use a known domain. A domain without a persisted
/// mapping only warns: projection fails later if the type is requested.
fn check_domains(ctx: &ValidationContext<'_>, id: ClassId, diagnostics: &mut Diagnostics) {
    let graph = ctx.graph;
    let class = graph.class(id);
    let target = ctx.config.persisted_target.as_str();

    for (index, property) in class.properties.iter().enumerate() {
        let Property::Field(field) = property else {
            continue;
        };
        let Some(domain) = ctx.table.domain(&field.domain) else {
            diagnostics.push(graph.property_diagnostic(
                ctx.table,
                id,
                index,
                DiagnosticKind::UnknownDomain,
                format!(
                    "field '{}.{}' uses undeclared domain '{}'",
                    class.name, field.name, field.domain
                ),
            ));
            continue;
        };

        let identity = field.primary_key && domain.name == ctx.config.identifier_domain;
        if !identity && !class.is_abstract && !domain.has_mapping(target) {
            diagnostics.push(graph.property_diagnostic(
                ctx.table,
                id,
                index,
                DiagnosticKind::UnmappedDomain,
                format!(
                    "domain '{}' of '{}.{}' has no '{}' mapping",
                    domain.name, class.name, field.name, target
                ),
            ));
        }
    }
}

fn check_class_references(ctx: &ValidationContext<'_>, id: ClassId, diagnostics: &mut Diagnostics) {
    let graph = ctx.graph;
    let class = graph.class(id);
    let spans = &graph.spans[id.index()];
    // an unknown row key is fatal and handled by the stereotype check
    let Some(name) = class.label_property.as_deref() else {
        return;
    };
    if class.property(name).is_none() {
        diagnostics.push(
            graph
                .diagnostic(
                    ctx.table,
                    id,
                    DiagnosticKind::UnknownProperty,
                    spans.label_property.unwrap_or(spans.name),
                    format!("label property '{}' of class '{}' is not a property", name, class.name),
                )
                .with_field(name),
        );
    }
}
