//! Projection of domains and properties onto target type strings.
//!
//! Projections are pure and lazy: a missing mapping is only an error when a
//! projection for that target is actually requested.

use crate::config::GeneratorConfig;
use crate::model::{Class, ClientType, Domain, Property};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Persisted types that are bounded by a length.
const VARIABLE_TEXT_TYPES: &[&str] = &["varchar", "nvarchar", "varchar2", "character varying"];

/// Persisted types holding structured data.
const STRUCTURED_TYPES: &[&str] = &["json", "jsonb"];

/// Projection errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectionError {
    /// The domain declares no type for the target.
    #[error("domain '{domain}' has no mapping for target '{target}'")]
    MissingTypeMapping {
        /// The domain name.
        domain: String,
        /// The requested target.
        target: String,
    },

    /// The property has no column.
    #[error("property '{class}.{property}' is not persisted")]
    NotPersisted {
        /// The class name.
        class: String,
        /// The property name.
        property: String,
    },

    /// The domain is not declared.
    #[error("unknown domain '{domain}'")]
    UnknownDomain {
        /// The domain name.
        domain: String,
    },

    /// The class or property is not part of the model.
    #[error("unknown property '{class}.{property}'")]
    UnknownProperty {
        /// The class name.
        class: String,
        /// The property name.
        property: String,
    },
}

/// Declared type of a domain for a target.
pub fn project(domain: &Domain, target: &str) -> Result<String, ProjectionError> {
    domain
        .mapping(target)
        .map(str::to_string)
        .ok_or_else(|| ProjectionError::MissingTypeMapping {
            domain: domain.name.clone(),
            target: target.to_string(),
        })
}

/// Whether a persisted type denotes structured data.
pub fn is_structured(persisted_type: &str) -> bool {
    STRUCTURED_TYPES
        .iter()
        .any(|t| t.eq_ignore_ascii_case(persisted_type.trim()))
}

fn is_variable_text(persisted_type: &str) -> bool {
    VARIABLE_TEXT_TYPES
        .iter()
        .any(|t| t.eq_ignore_ascii_case(persisted_type.trim()))
}

/// Context-sensitive projection of properties.
#[derive(Debug, Clone, Copy)]
pub struct Projector<'a> {
    domains: &'a BTreeMap<String, Arc<Domain>>,
    config: &'a GeneratorConfig,
}

impl<'a> Projector<'a> {
    pub fn new(domains: &'a BTreeMap<String, Arc<Domain>>, config: &'a GeneratorConfig) -> Self {
        Self { domains, config }
    }

    fn domain(&self, name: &str) -> Result<&'a Domain, ProjectionError> {
        self.domains
            .get(name)
            .map(Arc::as_ref)
            .ok_or_else(|| ProjectionError::UnknownDomain {
                domain: name.to_string(),
            })
    }

    /// Type of a property of `class` for `target`.
    pub fn project_property(
        &self,
        class: &Class,
        property: &Property,
        target: &str,
    ) -> Result<String, ProjectionError> {
        let persisted = target == self.config.persisted_target;
        let client = target == self.config.client_target;

        let Some(domain_name) = property.domain() else {
            return match property {
                Property::Composition(composition) if !persisted => {
                    Ok(self.collection(client, property, composition.target.clone()))
                }
                _ => Err(ProjectionError::NotPersisted {
                    class: class.name.clone(),
                    property: property.name().to_string(),
                }),
            };
        };
        let domain = self.domain(domain_name)?;

        if persisted {
            return self.persisted_type(property, domain);
        }

        if client {
            if let Some(ClientType::Code(code)) = property.reference().map(|r| &r.client_type) {
                return Ok(self.collection(true, property, code.clone()));
            }
            let structured = domain
                .mapping(&self.config.persisted_target)
                .is_some_and(is_structured);
            let ty = if structured {
                self.config.open_object_type.clone()
            } else {
                project(domain, target)?
            };
            return Ok(self.collection(true, property, ty));
        }

        project(domain, target)
    }

    fn persisted_type(&self, property: &Property, domain: &Domain) -> Result<String, ProjectionError> {
        if property.is_primary_key() && domain.name == self.config.identifier_domain {
            return Ok(self.config.identity_column_type.clone());
        }

        let base = project(domain, &self.config.persisted_target)?;
        if base.contains('(') {
            return Ok(base);
        }
        Ok(match (domain.length, domain.scale) {
            (None, _) if is_variable_text(&base) => "text".to_string(),
            (Some(length), Some(scale)) => format!("{}({}, {})", base, length, scale),
            (Some(length), None) => format!("{}({})", base, length),
            (None, _) => base,
        })
    }

    fn collection(&self, client: bool, property: &Property, ty: String) -> String {
        if client && property.is_many() {
            format!("{}[]", ty)
        } else {
            ty
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        AssociationProperty, ClassId, CompositionProperty, FieldProperty, FileId, Multiplicity,
        Reference, Stereotype,
    };

    fn domains() -> BTreeMap<String, Arc<Domain>> {
        [
            Domain::new("DO_ID").with_mapping("sql", "int").with_mapping("ts", "number"),
            Domain::new("DO_CODE")
                .with_length(3)
                .with_mapping("sql", "varchar")
                .with_mapping("ts", "string"),
            Domain::new("DO_TEXTE").with_mapping("sql", "varchar").with_mapping("ts", "string"),
            Domain::new("DO_MONTANT")
                .with_length(12)
                .with_scale(2)
                .with_mapping("sql", "decimal")
                .with_mapping("ts", "number"),
            Domain::new("DO_JSON").with_mapping("sql", "jsonb").with_mapping("ts", "string"),
            Domain::new("DO_SQL_ONLY").with_mapping("sql", "bytea"),
        ]
        .into_iter()
        .map(|d| (d.name.clone(), Arc::new(d)))
        .collect()
    }

    fn field(name: &str, domain: &str, primary_key: bool, many: bool) -> Property {
        Property::Field(FieldProperty {
            name: name.to_string(),
            label: None,
            domain: domain.to_string(),
            primary_key,
            required: false,
            unique: false,
            many,
            default: None,
            persisted_name: name.to_uppercase(),
        })
    }

    fn class() -> Class {
        Class {
            id: ClassId(0),
            name: "Societe".to_string(),
            file: FileId::new("App", "Model", "Societe"),
            namespace: FileId::new("App", "Model", "Societe").namespace(),
            parent: None,
            stereotype: Stereotype::None,
            trigram: None,
            label_property: None,
            unique_key: None,
            is_abstract: false,
            database_only: false,
            properties: Vec::new(),
            rows: Vec::new(),
        }
    }

    #[test]
    fn test_project_round_trip() {
        let domains = domains();
        let code = &domains["DO_CODE"];
        assert_eq!(project(code, "sql").unwrap(), "varchar");
        assert_eq!(project(code, "sql").unwrap(), code.mapping("sql").unwrap());
        assert_eq!(
            project(code, "cs"),
            Err(ProjectionError::MissingTypeMapping {
                domain: "DO_CODE".to_string(),
                target: "cs".to_string(),
            })
        );
    }

    #[test]
    fn test_persisted_rules() {
        let domains = domains();
        let config = GeneratorConfig::new("App");
        let projector = Projector::new(&domains, &config);
        let class = class();

        let cases = [
            (field("Id", "DO_ID", true, false), "serial"),
            (field("Ref", "DO_ID", false, false), "int"),
            (field("Code", "DO_CODE", false, false), "varchar(3)"),
            (field("Commentaire", "DO_TEXTE", false, false), "text"),
            (field("Montant", "DO_MONTANT", false, false), "decimal(12, 2)"),
        ];
        for (property, expected) in cases {
            assert_eq!(projector.project_property(&class, &property, "sql").unwrap(), expected);
        }
    }

    #[test]
    fn test_client_rules() {
        let domains = domains();
        let config = GeneratorConfig::new("App");
        let projector = Projector::new(&domains, &config);
        let class = class();

        assert_eq!(
            projector.project_property(&class, &field("Data", "DO_JSON", false, false), "ts").unwrap(),
            "Record<string, unknown>"
        );
        assert_eq!(
            projector.project_property(&class, &field("Tags", "DO_CODE", false, true), "ts").unwrap(),
            "string[]"
        );
        assert_eq!(
            projector.project_property(&class, &field("Blob", "DO_SQL_ONLY", false, false), "ts"),
            Err(ProjectionError::MissingTypeMapping {
                domain: "DO_SQL_ONLY".to_string(),
                target: "ts".to_string(),
            })
        );
    }

    #[test]
    fn test_code_type_for_reference_key() {
        let domains = domains();
        let config = GeneratorConfig::new("App");
        let projector = Projector::new(&domains, &config);
        let association = Property::Association(AssociationProperty {
            name: "PaysCode".to_string(),
            label: None,
            target: "Pays".to_string(),
            role: None,
            required: false,
            many: true,
            domain: Some("DO_CODE".to_string()),
            persisted_name: Some("PAY_CODE".to_string()),
            reference: Some(Reference {
                class: "Pays".to_string(),
                key: "Code".to_string(),
                client_type: ClientType::Code("PaysCode".to_string()),
            }),
            accessor_name: None,
        });
        assert_eq!(
            projector.project_property(&class(), &association, "ts").unwrap(),
            "PaysCode[]"
        );
        assert_eq!(
            projector.project_property(&class(), &association, "sql").unwrap(),
            "varchar(3)"
        );
    }

    #[test]
    fn test_composition() {
        let domains = domains();
        let config = GeneratorConfig::new("App");
        let projector = Projector::new(&domains, &config);
        let composition = Property::Composition(CompositionProperty {
            name: "Adresses".to_string(),
            label: None,
            target: "Adresse".to_string(),
            multiplicity: Multiplicity::Many,
        });
        assert!(matches!(
            projector.project_property(&class(), &composition, "sql"),
            Err(ProjectionError::NotPersisted { .. })
        ));
        assert_eq!(
            projector.project_property(&class(), &composition, "ts").unwrap(),
            "Adresse[]"
        );
    }

    #[test]
    fn test_unknown_domain() {
        let domains = domains();
        let config = GeneratorConfig::new("App");
        let projector = Projector::new(&domains, &config);
        assert!(matches!(
            projector.project_property(&class(), &field("X", "DO_NOPE", false, false), "sql"),
            Err(ProjectionError::UnknownDomain { .. })
        ));
    }
}
