//! Symbol table: class and domain names of one run.

use super::graph::{ClassSpans, Graph, PendingAlias};
use super::loader::LoadedFile;
use crate::diagnostic::{DiagnosticKind, Diagnostics, SourceLocation};
use crate::error::Error;
use crate::model::{
    naming, AssociationProperty, Class, ClassId, CompositionProperty, Domain, EnumerationRow,
    FieldProperty, FileId, Property, Stereotype, Value,
};
use modelc_lang::{ClassDecl, PropertyDecl, Span};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

/// Names visible to resolution, built file by file in load order.
#[derive(Debug, Default)]
pub struct SymbolTable {
    files: Vec<LoadedFile>,
    file_index: HashMap<FileId, usize>,
    /// Per file: itself plus everything reachable through `uses`.
    visible: Vec<BTreeSet<FileId>>,
    by_name: HashMap<String, ClassId>,
    domains: BTreeMap<String, Arc<Domain>>,
}

impl SymbolTable {
    /// Files in load order.
    pub fn files(&self) -> &[LoadedFile] {
        &self.files
    }

    pub fn class_id(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    pub fn domain(&self, name: &str) -> Option<&Arc<Domain>> {
        self.domains.get(name)
    }

    pub fn domains(&self) -> &BTreeMap<String, Arc<Domain>> {
        &self.domains
    }

    pub fn class_count(&self) -> usize {
        self.by_name.len()
    }

    /// Whether `target` may be referenced from a class of file `from`.
    pub fn is_visible(&self, from: &FileId, target: &FileId) -> bool {
        self.file_index
            .get(from)
            .is_some_and(|&i| self.visible[i].contains(target))
    }

    /// Line and column of a span in a file.
    pub fn locate(&self, file: &FileId, span: Span) -> Option<SourceLocation> {
        let index = *self.file_index.get(file)?;
        Some(span.locate(&self.files[index].source).into())
    }
}

/// Register every domain and class of the ordered files.
///
/// Duplicate names are fatal. Parents are bound here; an unknown or
/// invisible parent is reported as a diagnostic.
pub fn bind(
    files: Vec<LoadedFile>,
    diagnostics: &mut Diagnostics,
) -> Result<(SymbolTable, Graph), Error> {
    let mut table = SymbolTable::default();
    let mut graph = Graph::default();
    let mut domain_files: HashMap<String, FileId> = HashMap::new();

    for (index, file) in files.iter().enumerate() {
        table.file_index.insert(file.id.clone(), index);

        let mut visible = BTreeSet::new();
        visible.insert(file.id.clone());
        for dependency in &file.uses {
            if let Some(&dep_index) = table.file_index.get(dependency) {
                visible.extend(table.visible[dep_index].iter().cloned());
            }
        }
        table.visible.push(visible);

        for decl in &file.ast.domains {
            let name = decl.name.value.clone();
            if let Some(first) = domain_files.get(&name) {
                return Err(Error::DuplicateDomain {
                    name,
                    first: first.clone(),
                    second: file.id.clone(),
                });
            }
            domain_files.insert(name.clone(), file.id.clone());
            table.domains.insert(name, Arc::new(Domain::from_decl(decl)));
        }

        for decl in &file.ast.classes {
            let name = &decl.name.value;
            if let Some(&existing) = table.by_name.get(name) {
                return Err(Error::DuplicateClass {
                    name: name.clone(),
                    first: graph.class(existing).file.clone(),
                    second: file.id.clone(),
                });
            }
            let id = ClassId(graph.classes.len());
            table.by_name.insert(name.clone(), id);
            lower_class(&mut graph, id, &file.id, decl);
        }
    }
    table.files = files;

    for id in graph.ids().collect::<Vec<_>>() {
        let parent = bind_parent(&table, &graph, id, diagnostics);
        graph.parents.push(parent);
    }

    tracing::debug!(
        files = table.files.len(),
        classes = table.class_count(),
        domains = table.domains.len(),
        "symbols bound"
    );
    Ok((table, graph))
}

fn bind_parent(
    table: &SymbolTable,
    graph: &Graph,
    id: ClassId,
    diagnostics: &mut Diagnostics,
) -> Option<ClassId> {
    let class = graph.class(id);
    let parent_name = class.parent.as_deref()?;
    let span = graph.spans[id.index()].extends.unwrap_or_default();

    let Some(parent) = table.class_id(parent_name) else {
        diagnostics.push(graph.diagnostic(
            table,
            id,
            DiagnosticKind::UnresolvedReference,
            span,
            format!("class '{}' extends undeclared class '{}'", class.name, parent_name),
        ));
        return None;
    };

    if !table.is_visible(&class.file, &graph.class(parent).file) {
        diagnostics.push(graph.diagnostic(
            table,
            id,
            DiagnosticKind::UndeclaredDependency,
            span,
            format!(
                "class '{}' extends '{}' from {} which its file does not use",
                class.name,
                parent_name,
                graph.class(parent).file
            ),
        ));
    }
    Some(parent)
}

/// Turn a class declaration into a class with its non-alias properties.
fn lower_class(graph: &mut Graph, id: ClassId, file: &FileId, decl: &ClassDecl) {
    let trigram = decl.trigram.as_ref().map(|t| t.value.clone());
    let mut properties = Vec::with_capacity(decl.properties.len());
    let mut spans = ClassSpans {
        name: decl.name.span,
        extends: decl.extends.as_ref().map(|e| e.span),
        label_property: decl.label_property.as_ref().map(|l| l.span),
        unique_key: decl.unique_key.as_ref().map(|k| k.span),
        ..ClassSpans::default()
    };

    for property in &decl.properties {
        let lowered = match property {
            PropertyDecl::Field(field) => Property::Field(FieldProperty {
                name: field.name.value.clone(),
                label: field.label.clone(),
                domain: field.domain.value.clone(),
                primary_key: field.primary_key,
                required: field.required,
                unique: field.unique,
                many: field.many,
                default: field.default.as_ref().map(|d| Value::from(&d.value)),
                persisted_name: field.column.clone().unwrap_or_else(|| {
                    naming::field_column(trigram.as_deref(), &field.name.value)
                }),
            }),
            PropertyDecl::Association(association) => {
                Property::Association(AssociationProperty {
                    name: association.name.value.clone(),
                    label: association.label.clone(),
                    target: association.target.value.clone(),
                    role: association.role.clone(),
                    required: association.required,
                    many: association.many,
                    domain: None,
                    persisted_name: None,
                    reference: None,
                    accessor_name: None,
                })
            }
            PropertyDecl::Composition(composition) => {
                Property::Composition(CompositionProperty {
                    name: composition.name.value.clone(),
                    label: composition.label.clone(),
                    target: composition.target.value.clone(),
                    multiplicity: composition.multiplicity.into(),
                })
            }
            PropertyDecl::Alias(alias) => {
                graph.pending_aliases.push(PendingAlias {
                    class: id,
                    position: properties.len(),
                    decl: alias.clone(),
                });
                continue;
            }
        };
        properties.push(lowered);
        spans.properties.push(property.span());
    }

    let mut rows = Vec::with_capacity(decl.rows.len());
    for row in &decl.rows {
        rows.push(EnumerationRow {
            name: row.name.value.clone(),
            values: row
                .values
                .iter()
                .map(|(field, value)| (field.value.clone(), Value::from(&value.value)))
                .collect(),
        });
        spans.rows.push(row.span);
        spans
            .row_values
            .push(row.values.iter().map(|(field, _)| field.span).collect());
    }

    graph.classes.push(Class {
        id,
        name: decl.name.value.clone(),
        file: file.clone(),
        namespace: file.namespace(),
        parent: decl.extends.as_ref().map(|e| e.value.clone()),
        stereotype: decl
            .stereotype
            .as_ref()
            .map(|s| Stereotype::from(s.value))
            .unwrap_or_default(),
        trigram,
        label_property: decl.label_property.as_ref().map(|l| l.value.clone()),
        unique_key: decl.unique_key.as_ref().map(|k| k.value.clone()),
        is_abstract: decl.is_abstract,
        database_only: decl.database_only,
        properties,
        rows,
    });
    graph.spans.push(spans);
}
