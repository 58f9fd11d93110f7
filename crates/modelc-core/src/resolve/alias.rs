//! Alias expansion.
//!
//! An alias token is `Class_Field[_Prefix[_Suffix]]`. The first two parts
//! locate the source property; the optional parts rename the copy so that
//! one class can carry several aliases of the same field.

use super::graph::{Graph, PendingAlias};
use super::symbols::SymbolTable;
use crate::config::GeneratorConfig;
use crate::diagnostic::{DiagnosticKind, Diagnostics};
use crate::model::{naming, AliasProperty, ClassId, Property, PropertyRef};
use std::collections::HashMap;

/// Label marker replacing the copied label.
pub const OVERRIDE_MARKER: &str = "[Override]";

/// Parsed alias token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasToken<'a> {
    pub class: &'a str,
    pub field: &'a str,
    pub prefix: Option<&'a str>,
    pub suffix: Option<&'a str>,
}

impl<'a> AliasToken<'a> {
    /// Split a token into its parts. An empty third part means the token
    /// carries a suffix only.
    pub fn parse(token: &'a str) -> Option<Self> {
        let parts: Vec<&str> = token.split('_').collect();
        if !(2..=4).contains(&parts.len()) || parts[0].is_empty() || parts[1].is_empty() {
            return None;
        }
        let non_empty = |part: Option<&&'a str>| part.copied().filter(|p| !p.is_empty());
        Some(Self {
            class: parts[0],
            field: parts[1],
            prefix: non_empty(parts.get(2)),
            suffix: non_empty(parts.get(3)),
        })
    }

    /// Key of the source property in the alias index.
    pub fn key(&self) -> String {
        index_key(self.class, self.field)
    }
}

fn index_key(class: &str, field: &str) -> String {
    format!("{}_{}", class, field)
}

/// Index of properties that aliases may copy.
///
/// Aliases and free-form alias fields are not sources. Two classes producing
/// the same key are reported as conflicting; the first keeps the key.
fn build_index(
    table: &SymbolTable,
    graph: &Graph,
    config: &GeneratorConfig,
    diagnostics: &mut Diagnostics,
) -> HashMap<String, (ClassId, usize)> {
    let mut index: HashMap<String, (ClassId, usize)> = HashMap::new();
    for id in graph.ids() {
        let class = graph.class(id);
        for (position, property) in class.properties.iter().enumerate() {
            if property.is_alias()
                || !property.is_persisted()
                || property.domain() == Some(config.free_alias_domain.as_str())
            {
                continue;
            }
            let key = index_key(&class.name, property.name());
            match index.get(&key) {
                Some(&(other, _)) if other != id => {
                    diagnostics.push(graph.property_diagnostic(
                        table,
                        id,
                        position,
                        DiagnosticKind::ConflictingAlias,
                        format!(
                            "alias key '{}' is produced by both '{}' and '{}'",
                            key,
                            graph.class(other).name,
                            class.name
                        ),
                    ));
                }
                Some(_) => {}
                None => {
                    index.insert(key, (id, position));
                }
            }
        }
    }
    index
}

/// Expand every pending alias into a copy of its source property.
pub fn expand(
    table: &SymbolTable,
    graph: &mut Graph,
    config: &GeneratorConfig,
    diagnostics: &mut Diagnostics,
) {
    let index = build_index(table, graph, config, diagnostics);
    let pending = std::mem::take(&mut graph.pending_aliases);
    let total = pending.len();

    // Expansions shift later positions of the same class.
    let mut inserted: HashMap<ClassId, usize> = HashMap::new();
    let mut expanded = 0;
    for alias in pending {
        let Some(property) = expand_one(table, graph, &index, &alias, diagnostics) else {
            continue;
        };
        let offset = inserted.entry(alias.class).or_default();
        let position = alias.position + *offset;
        *offset += 1;

        graph.classes[alias.class.index()]
            .properties
            .insert(position, Property::Alias(property));
        graph.spans[alias.class.index()]
            .properties
            .insert(position, alias.decl.span);
        expanded += 1;
    }

    tracing::debug!(aliases = total, expanded, "aliases expanded");
}

fn expand_one(
    table: &SymbolTable,
    graph: &Graph,
    index: &HashMap<String, (ClassId, usize)>,
    alias: &PendingAlias,
    diagnostics: &mut Diagnostics,
) -> Option<AliasProperty> {
    let owner = graph.class(alias.class);
    let token_text = alias.decl.token.value.as_str();
    let span = alias.decl.token.span;

    let Some(token) = AliasToken::parse(token_text) else {
        diagnostics.push(
            graph
                .diagnostic(
                    table,
                    alias.class,
                    DiagnosticKind::BadAliasFormat,
                    span,
                    format!(
                        "alias '{}' must be Class_Field with an optional prefix and suffix",
                        token_text
                    ),
                )
                .with_field(token_text),
        );
        return None;
    };

    let Some(&(source_id, source_index)) = index.get(&token.key()) else {
        diagnostics.push(
            graph
                .diagnostic(
                    table,
                    alias.class,
                    DiagnosticKind::AliasTargetNotFound,
                    span,
                    format!("alias '{}' matches no property {}.{}", token_text, token.class, token.field),
                )
                .with_field(token_text),
        );
        return None;
    };

    let source_class = graph.class(source_id);
    let source = &source_class.properties[source_index];
    if !table.is_visible(&owner.file, &source_class.file) {
        diagnostics.push(
            graph
                .diagnostic(
                    table,
                    alias.class,
                    DiagnosticKind::UndeclaredDependency,
                    span,
                    format!(
                        "alias '{}' copies a property of '{}' from {} which its file does not use",
                        token_text, source_class.name, source_class.file
                    ),
                )
                .with_field(token_text),
        );
    }

    let label = match alias.decl.label.as_deref() {
        Some(label) if label.starts_with(OVERRIDE_MARKER) => {
            Some(label[OVERRIDE_MARKER.len()..].trim().to_string())
        }
        _ => source.label().map(str::to_string),
    };

    let keyed_by_source = source_class.stereotype.has_rows()
        && (source.is_primary_key() || source_class.unique_key.as_deref() == Some(source.name()));
    let linked_class = match source {
        Property::Association(association) => Some(association.target.clone()),
        Property::Field(_) if keyed_by_source => Some(source_class.name.clone()),
        _ => None,
    };

    // Association sources get their domain and column once bound.
    let (domain, persisted_name) = match source {
        Property::Field(field) => (
            Some(field.domain.clone()),
            Some(naming::affix_column(&field.persisted_name, token.prefix, token.suffix)),
        ),
        _ => (None, None),
    };

    Some(AliasProperty {
        name: format!(
            "{}{}{}",
            token.prefix.unwrap_or_default(),
            source.name(),
            token.suffix.unwrap_or_default()
        ),
        label,
        source: PropertyRef {
            class: source_class.name.clone(),
            property: source.name().to_string(),
        },
        prefix: token.prefix.map(str::to_string),
        suffix: token.suffix.map(str::to_string),
        domain,
        persisted_name,
        required: source.is_required(),
        many: source.is_many(),
        role: source.role().map(str::to_string),
        linked_class,
        reference: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FileId, Stereotype};
    use crate::resolve::loader::LoadedFile;
    use crate::resolve::symbols;
    use std::sync::Arc;

    fn expand_source(source: &str) -> (SymbolTable, Graph, Diagnostics) {
        let file = LoadedFile::parse(FileId::new("App", "Model", "M"), Arc::from(source)).unwrap();
        let mut diagnostics = Diagnostics::new();
        let (table, mut graph) = symbols::bind(vec![file], &mut diagnostics).unwrap();
        expand(&table, &mut graph, &GeneratorConfig::new("App"), &mut diagnostics);
        (table, graph, diagnostics)
    }

    fn alias<'a>(graph: &'a Graph, table: &SymbolTable, class: &str, name: &str) -> &'a AliasProperty {
        let id = table.class_id(class).unwrap();
        match graph.class(id).property(name) {
            Some(Property::Alias(alias)) => alias,
            other => panic!("expected alias {}, got {:?}", name, other),
        }
    }

    #[test]
    fn test_token_parse() {
        assert_eq!(
            AliasToken::parse("Foo_Bar_Baz_Qux"),
            Some(AliasToken {
                class: "Foo",
                field: "Bar",
                prefix: Some("Baz"),
                suffix: Some("Qux"),
            })
        );
        let suffix_only = AliasToken::parse("Foo_Bar__Qux").unwrap();
        assert_eq!(suffix_only.prefix, None);
        assert_eq!(suffix_only.suffix, Some("Qux"));

        assert!(AliasToken::parse("Foo").is_none());
        assert!(AliasToken::parse("A_B_C_D_E").is_none());
        assert!(AliasToken::parse("_Bar").is_none());
    }

    #[test]
    fn test_four_part_alias() {
        let (table, graph, diagnostics) = expand_source(
            r#"
            class Foo { trigram FOO; field Bar: DO_LIBELLE label "Barre"; }
            class Other { alias Foo_Bar_Baz_Qux; }
            "#,
        );
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);

        let alias = alias(&graph, &table, "Other", "BazBarQux");
        assert_eq!(alias.persisted_name.as_deref(), Some("BAZ_FOO_BAR_QUX"));
        assert_eq!(alias.domain.as_deref(), Some("DO_LIBELLE"));
        assert_eq!(alias.label.as_deref(), Some("Barre"));
        assert_eq!(alias.source.to_string(), "Foo.Bar");
    }

    #[test]
    fn test_affixes_do_not_change_source() {
        let (table, graph, _) = expand_source(
            r#"
            class Foo { field Bar: DO_LIBELLE; }
            class Other {
                alias Foo_Bar;
                alias Foo_Bar_Ancien;
                alias Foo_Bar__Fin;
                alias Foo_Bar_Debut_Fin;
            }
            "#,
        );
        let other = graph.class(table.class_id("Other").unwrap());
        let names: Vec<&str> = other.properties.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["Bar", "AncienBar", "BarFin", "DebutBarFin"]);
        for property in &other.properties {
            let Property::Alias(alias) = property else {
                panic!("expected alias");
            };
            assert_eq!(alias.source.class, "Foo");
            assert_eq!(alias.source.property, "Bar");
        }
    }

    #[test]
    fn test_override_label() {
        let (table, graph, _) = expand_source(
            r#"
            class Utilisateur { field Email: DO_EMAIL label "Email"; }
            class Societe {
                alias Utilisateur_Email label "[Override] Email de contact";
                alias Utilisateur_Email_Contact label "Ignored";
            }
            "#,
        );
        assert_eq!(
            alias(&graph, &table, "Societe", "Email").label.as_deref(),
            Some("Email de contact")
        );
        assert_eq!(
            alias(&graph, &table, "Societe", "ContactEmail").label.as_deref(),
            Some("Email")
        );
    }

    #[test]
    fn test_alias_keeps_declaration_position() {
        let (table, graph, _) = expand_source(
            r#"
            class Foo { field Bar: DO_LIBELLE; }
            class Other { field A: DO_ID primary; alias Foo_Bar; field B: DO_LIBELLE; }
            "#,
        );
        let id = table.class_id("Other").unwrap();
        let names: Vec<&str> = graph.class(id).properties.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["A", "Bar", "B"]);
        assert_eq!(graph.spans[id.index()].properties.len(), 3);
    }

    #[test]
    fn test_bad_format_and_missing_target() {
        let (_, _, diagnostics) = expand_source(
            r#"
            class Foo { field Bar: DO_LIBELLE; }
            class Other { alias Foo; alias Foo_Baz; }
            "#,
        );
        let bad = diagnostics.of_kind(DiagnosticKind::BadAliasFormat);
        assert_eq!(bad.len(), 1);
        assert_eq!(bad[0].field.as_deref(), Some("Foo"));
        assert_eq!(diagnostics.of_kind(DiagnosticKind::AliasTargetNotFound).len(), 1);
    }

    #[test]
    fn test_composition_is_not_a_source() {
        let (table, graph, diagnostics) = expand_source(
            r#"
            class Ligne { field Id: DO_ID primary; }
            class Facture { field Id: DO_ID primary; compose Lignes -> Ligne many; }
            class Other { alias Facture_Lignes; }
            "#,
        );
        assert_eq!(diagnostics.of_kind(DiagnosticKind::AliasTargetNotFound).len(), 1);
        let other = graph.class(table.class_id("Other").unwrap());
        assert!(other.property("Lignes").is_none());
    }

    #[test]
    fn test_conflicting_alias_names_both_classes() {
        let (_, _, diagnostics) = expand_source(
            r#"
            class Foo { field Bar_Baz: DO_LIBELLE; }
            class Foo_Bar { field Baz: DO_LIBELLE; }
            "#,
        );
        let conflicts = diagnostics.of_kind(DiagnosticKind::ConflictingAlias);
        assert_eq!(conflicts.len(), 1);
        assert!(conflicts[0].message.contains("'Foo'"));
        assert!(conflicts[0].message.contains("'Foo_Bar'"));
    }

    #[test]
    fn test_free_alias_domain_is_not_a_source() {
        let (_, _, diagnostics) = expand_source(
            r#"
            class Foo { field Bar: DO_ALIAS; }
            class Other { alias Foo_Bar; }
            "#,
        );
        assert_eq!(diagnostics.of_kind(DiagnosticKind::AliasTargetNotFound).len(), 1);
    }

    #[test]
    fn test_enumeration_key_links_to_source_class() {
        let (table, graph, _) = expand_source(
            r#"
            class Statut enum { field Code: DO_CODE primary; field Libelle: DO_LIBELLE; }
            class Commande { alias Statut_Code; alias Statut_Libelle; }
            "#,
        );
        assert_eq!(graph.class(table.class_id("Statut").unwrap()).stereotype, Stereotype::Enumeration);
        assert_eq!(
            alias(&graph, &table, "Commande", "Code").linked_class.as_deref(),
            Some("Statut")
        );
        assert_eq!(alias(&graph, &table, "Commande", "Libelle").linked_class, None);
    }

    #[test]
    fn test_association_source_defers_column() {
        let (table, graph, _) = expand_source(
            r#"
            class Pays reference { field Code: DO_CODE primary; }
            class Societe { ref PaysCode -> Pays role "Siege"; }
            class Filiale { alias Societe_PaysCode; }
            "#,
        );
        let alias = alias(&graph, &table, "Filiale", "PaysCode");
        assert_eq!(alias.linked_class.as_deref(), Some("Pays"));
        assert_eq!(alias.role.as_deref(), Some("Siege"));
        assert!(alias.persisted_name.is_none());
        assert!(alias.domain.is_none());
    }
}
