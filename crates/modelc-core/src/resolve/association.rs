//! Association binding.
//!
//! Every association, and every alias linked to another class, is bound to
//! the primary key of its target. The key supplies the domain, the column
//! name and the client-side type of the foreign key.

use super::graph::Graph;
use super::symbols::SymbolTable;
use crate::config::GeneratorConfig;
use crate::diagnostic::{DiagnosticKind, Diagnostics};
use crate::model::{naming, Class, ClassId, ClientType, Property, Reference};

/// What a foreign key inherits from its target's key.
#[derive(Debug, Clone, PartialEq)]
struct KeyBinding {
    domain: String,
    /// Key column, with the role suffix when a role is present.
    persisted_name: String,
    reference: Reference,
    accessor_name: String,
}

/// Client type of a foreign key to `target` keyed by `key`.
///
/// Reference lists keyed by anything but the generic identifier get a
/// distinguishing code type so that codes of different lists cannot be
/// mixed.
pub fn client_type(target: &Class, key: &Property, config: &GeneratorConfig) -> ClientType {
    let generic = key.domain() == Some(config.identifier_domain.as_str());
    if target.stereotype.has_rows() && !generic {
        ClientType::Code(format!("{}{}", target.name, key.name()))
    } else {
        ClientType::Scalar
    }
}

/// Accessor name: target abbreviation, key name and role.
pub fn accessor_name(target: &Class, key: &Property, role: Option<&str>) -> String {
    let mut name = naming::pascal_case(target.abbreviation());
    name.push_str(key.name());
    if let Some(role) = role {
        name.push_str(&naming::pascal_case(role));
    }
    name
}

/// Bind associations, compositions and linked aliases of every class.
pub fn bind(
    table: &SymbolTable,
    graph: &mut Graph,
    config: &GeneratorConfig,
    diagnostics: &mut Diagnostics,
) {
    let mut bound = 0;
    for id in graph.ids().collect::<Vec<_>>() {
        for index in 0..graph.class(id).properties.len() {
            let property = &graph.class(id).properties[index];
            let Some(target_name) = property
                .linked_class()
                .or(match property {
                    Property::Composition(c) => Some(c.target.as_str()),
                    _ => None,
                })
                .map(str::to_string)
            else {
                continue;
            };

            let Some(target) = lookup_target(table, graph, id, index, &target_name, diagnostics)
            else {
                continue;
            };
            if matches!(property, Property::Composition(_)) {
                continue;
            }

            let role = property.role().map(str::to_string);
            let Some(binding) =
                key_binding(table, graph, config, id, index, target, role.as_deref(), diagnostics)
            else {
                continue;
            };
            apply(&mut graph.classes[id.index()].properties[index], binding);
            bound += 1;
        }
    }
    tracing::debug!(bound, "associations bound");
}

/// Resolve a target class name, checking it is visible from the owner.
fn lookup_target(
    table: &SymbolTable,
    graph: &Graph,
    id: ClassId,
    index: usize,
    target_name: &str,
    diagnostics: &mut Diagnostics,
) -> Option<ClassId> {
    let owner = graph.class(id);
    let Some(target) = table.class_id(target_name) else {
        diagnostics.push(graph.property_diagnostic(
            table,
            id,
            index,
            DiagnosticKind::UnresolvedReference,
            format!(
                "property '{}.{}' references undeclared class '{}'",
                owner.name,
                owner.properties[index].name(),
                target_name
            ),
        ));
        return None;
    };

    let target_file = &graph.class(target).file;
    if !table.is_visible(&owner.file, target_file) {
        diagnostics.push(graph.property_diagnostic(
            table,
            id,
            index,
            DiagnosticKind::UndeclaredDependency,
            format!(
                "property '{}.{}' references '{}' from {} which its file does not use",
                owner.name,
                owner.properties[index].name(),
                target_name,
                target_file
            ),
        ));
    }
    Some(target)
}

#[allow(clippy::too_many_arguments)]
fn key_binding(
    table: &SymbolTable,
    graph: &Graph,
    config: &GeneratorConfig,
    id: ClassId,
    index: usize,
    target: ClassId,
    role: Option<&str>,
    diagnostics: &mut Diagnostics,
) -> Option<KeyBinding> {
    let target_class = graph.class(target);
    let property = &graph.class(id).properties[index];

    // A self-key alias links to the class it copied a key from.
    let key = match property {
        Property::Alias(alias) if alias.domain.is_some() => {
            target_class.property(&alias.source.property)
        }
        _ => graph.primary_key(target).map(|(_, key)| key),
    };
    let Some(key) = key else {
        diagnostics.push(graph.property_diagnostic(
            table,
            id,
            index,
            DiagnosticKind::UnresolvedReference,
            format!(
                "property '{}.{}' references '{}' which has no primary key",
                graph.class(id).name,
                property.name(),
                target_class.name
            ),
        ));
        return None;
    };

    let (Some(domain), Some(key_column)) = (key.domain(), key.persisted_name()) else {
        diagnostics.push(graph.property_diagnostic(
            table,
            id,
            index,
            DiagnosticKind::UnresolvedReference,
            format!(
                "property '{}.{}' references key '{}.{}' which has no column",
                graph.class(id).name,
                property.name(),
                target_class.name,
                key.name()
            ),
        ));
        return None;
    };

    let mut persisted_name = key_column.to_string();
    if let Some(role) = role {
        persisted_name.push('_');
        persisted_name.push_str(&naming::role_suffix(role));
    }

    Some(KeyBinding {
        domain: domain.to_string(),
        persisted_name,
        reference: Reference {
            class: target_class.name.clone(),
            key: key.name().to_string(),
            client_type: client_type(target_class, key, config),
        },
        accessor_name: accessor_name(target_class, key, role),
    })
}

fn apply(property: &mut Property, binding: KeyBinding) {
    match property {
        Property::Association(association) => {
            association.domain = Some(binding.domain);
            association.persisted_name = Some(binding.persisted_name);
            association.reference = Some(binding.reference);
            association.accessor_name = Some(binding.accessor_name);
        }
        Property::Alias(alias) => {
            if alias.domain.is_none() {
                alias.domain = Some(binding.domain);
                alias.persisted_name = Some(naming::affix_column(
                    &binding.persisted_name,
                    alias.prefix.as_deref(),
                    alias.suffix.as_deref(),
                ));
            }
            alias.reference = Some(binding.reference);
        }
        _ => {}
    }
}
