//! The immutable resolved model handed to emitters.

use crate::config::GeneratorConfig;
use crate::diagnostic::Diagnostic;
use crate::model::{Class, ClassId, Domain, EnumerationRow, FileId, Property, Stereotype};
use crate::projection::{self, ProjectionError, Projector};
use crate::resolve::{Graph, SymbolTable};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// A fully resolved and validated model.
///
/// Snapshots are never mutated once built. A reload builds a new one, so
/// readers holding an `Arc<ResolvedModel>` are not disturbed by it.
#[derive(Debug)]
pub struct ResolvedModel {
    version: u64,
    config: GeneratorConfig,
    files: Vec<FileId>,
    classes: Vec<Class>,
    by_name: HashMap<String, ClassId>,
    parents: Vec<Option<ClassId>>,
    domains: BTreeMap<String, Arc<Domain>>,
    warnings: Vec<Diagnostic>,
}

impl ResolvedModel {
    pub(crate) fn new(
        version: u64,
        config: GeneratorConfig,
        table: &SymbolTable,
        graph: Graph,
        warnings: Vec<Diagnostic>,
    ) -> Self {
        let by_name = graph
            .classes
            .iter()
            .map(|class| (class.name.clone(), class.id))
            .collect();
        Self {
            version,
            config,
            files: table.files().iter().map(|f| f.id.clone()).collect(),
            by_name,
            parents: graph.parents,
            classes: graph.classes,
            domains: table.domains().clone(),
            warnings,
        }
    }

    /// Version of this snapshot, increasing with every publication.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Application name (root namespace).
    pub fn app_name(&self) -> &str {
        self.config.app_name()
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Files in load order.
    pub fn files(&self) -> &[FileId] {
        &self.files
    }

    /// Classes in load order, then declaration order.
    pub fn classes(&self) -> &[Class] {
        &self.classes
    }

    pub fn class_by_name(&self, name: &str) -> Option<&Class> {
        self.by_name.get(name).map(|id| &self.classes[id.index()])
    }

    pub fn class(&self, id: ClassId) -> Option<&Class> {
        self.classes.get(id.index())
    }

    /// Parent class, if any.
    pub fn parent(&self, class: &Class) -> Option<&Class> {
        self.parents
            .get(class.id.index())
            .copied()
            .flatten()
            .map(|id| &self.classes[id.index()])
    }

    /// Primary key of a class, declared or inherited.
    pub fn primary_key<'a>(&'a self, class: &'a Class) -> Option<&'a Property> {
        let mut current = Some(class);
        let mut depth = 0;
        while let Some(class) = current {
            if let Some(key) = class.own_primary_key() {
                return Some(key);
            }
            depth += 1;
            if depth > self.classes.len() {
                return None;
            }
            current = self.parent(class);
        }
        None
    }

    fn rows_of(&self, name: &str, stereotype: Stereotype) -> &[EnumerationRow] {
        match self.class_by_name(name) {
            Some(class) if class.stereotype == stereotype => &class.rows,
            _ => &[],
        }
    }

    /// Rows of a fixed enumeration, in declaration order. Empty for any
    /// other class.
    pub fn fixed_enumeration_rows(&self, class: &str) -> &[EnumerationRow] {
        self.rows_of(class, Stereotype::Enumeration)
    }

    /// Rows of an administrable reference list, in declaration order.
    /// Empty for any other class.
    pub fn administrable_list_rows(&self, class: &str) -> &[EnumerationRow] {
        self.rows_of(class, Stereotype::Reference)
    }

    pub fn domain(&self, name: &str) -> Option<&Domain> {
        self.domains.get(name).map(Arc::as_ref)
    }

    /// Domains by name.
    pub fn domains(&self) -> impl Iterator<Item = &Domain> {
        self.domains.values().map(Arc::as_ref)
    }

    /// Declared type of a domain for a target.
    pub fn project(&self, domain: &str, target: &str) -> Result<String, ProjectionError> {
        let domain = self.domain(domain).ok_or_else(|| ProjectionError::UnknownDomain {
            domain: domain.to_string(),
        })?;
        projection::project(domain, target)
    }

    /// Type of a property for a target, applying key, text, reference and
    /// collection rules.
    pub fn project_property(
        &self,
        class: &str,
        property: &str,
        target: &str,
    ) -> Result<String, ProjectionError> {
        let unknown = || ProjectionError::UnknownProperty {
            class: class.to_string(),
            property: property.to_string(),
        };
        let owner = self.class_by_name(class).ok_or_else(unknown)?;
        let found = owner.property(property).ok_or_else(unknown)?;
        Projector::new(&self.domains, &self.config).project_property(owner, found, target)
    }

    /// Non-blocking diagnostics of the run that built this snapshot.
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    /// Serializable view of the snapshot.
    pub fn view(&self) -> ModelView<'_> {
        ModelView {
            version: self.version,
            app_name: self.app_name(),
            files: &self.files,
            domains: self.domains().collect(),
            classes: &self.classes,
            warnings: &self.warnings,
        }
    }
}

/// Serializable view of a [`ResolvedModel`].
#[derive(Debug, Serialize)]
pub struct ModelView<'a> {
    pub version: u64,
    pub app_name: &'a str,
    pub files: &'a [FileId],
    pub domains: Vec<&'a Domain>,
    pub classes: &'a [Class],
    pub warnings: &'a [Diagnostic],
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;
    use crate::resolve::resolve;
    use crate::source::MemorySources;

    fn model() -> ResolvedModel {
        let sources = MemorySources::new()
            .with_file(
                FileId::new("App", "Domain", "Domains"),
                r#"
                domain DO_ID { map sql = "int"; map ts = "number"; }
                domain DO_CODE { length 3; map sql = "varchar"; map ts = "string"; }
                domain DO_LIBELLE { length 100; map sql = "varchar"; map ts = "string"; }
                "#,
            )
            .with_file(
                FileId::new("App", "Model", "Statut"),
                r#"
                class Statut enum {
                    field Code: DO_CODE primary;
                    values { Ouvert { Code = "OUV" } Clos { Code = "CLO" } }
                }
                class Personne { abstract; field Id: DO_ID primary; }
                class Societe : Personne { field Nom: DO_LIBELLE; }
                "#,
            );
        resolve(&sources, &GeneratorConfig::new("App"))
            .unwrap()
            .model
            .unwrap()
    }

    #[test]
    fn test_row_accessors_follow_stereotype() {
        let model = model();
        let rows = model.fixed_enumeration_rows("Statut");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("Code"), Some(&Value::String("CLO".to_string())));
        assert!(model.administrable_list_rows("Statut").is_empty());
        assert!(model.fixed_enumeration_rows("Inconnu").is_empty());
    }

    #[test]
    fn test_inherited_primary_key() {
        let model = model();
        let societe = model.class_by_name("Societe").unwrap();
        assert_eq!(model.parent(societe).map(|c| c.name.as_str()), Some("Personne"));
        assert_eq!(model.primary_key(societe).map(|p| p.name()), Some("Id"));
    }

    #[test]
    fn test_project_lookups() {
        let model = model();
        assert_eq!(model.project("DO_CODE", "ts").unwrap(), "string");
        assert!(matches!(
            model.project("DO_NOPE", "ts"),
            Err(ProjectionError::UnknownDomain { .. })
        ));
        assert_eq!(model.project_property("Societe", "Nom", "sql").unwrap(), "varchar(100)");
        assert!(matches!(
            model.project_property("Societe", "Age", "sql"),
            Err(ProjectionError::UnknownProperty { .. })
        ));
    }

    #[test]
    fn test_view_serializes() {
        let model = model();
        let json = serde_json::to_value(model.view()).unwrap();
        assert_eq!(json["app_name"], "App");
        assert_eq!(json["classes"].as_array().unwrap().len(), 3);
        assert_eq!(json["files"][0]["kind"], "Domain");
    }
}
