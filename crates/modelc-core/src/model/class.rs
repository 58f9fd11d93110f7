//! Resolved classes.

use super::ids::{ClassId, FileId, Namespace};
use super::property::Property;
use super::row::EnumerationRow;
use modelc_lang::StereotypeKeyword;
use serde::Serialize;

/// Class stereotype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stereotype {
    /// No stereotype declared.
    #[default]
    None,
    Plain,
    /// Fixed enumeration: rows are baked into generated code.
    Enumeration,
    /// Administrable reference list: rows are seed data.
    Reference,
}

impl Stereotype {
    /// Whether classes of this stereotype carry literal rows.
    pub fn has_rows(self) -> bool {
        matches!(self, Stereotype::Enumeration | Stereotype::Reference)
    }
}

impl From<StereotypeKeyword> for Stereotype {
    fn from(keyword: StereotypeKeyword) -> Self {
        match keyword {
            StereotypeKeyword::Enum => Stereotype::Enumeration,
            StereotypeKeyword::Reference => Stereotype::Reference,
            StereotypeKeyword::Plain => Stereotype::Plain,
        }
    }
}

impl std::fmt::Display for Stereotype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stereotype::None => write!(f, "-"),
            Stereotype::Plain => write!(f, "plain"),
            Stereotype::Enumeration => write!(f, "enum"),
            Stereotype::Reference => write!(f, "reference"),
        }
    }
}

/// A class of the resolved model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Class {
    #[serde(skip)]
    pub id: ClassId,
    pub name: String,
    /// Owning file.
    pub file: FileId,
    pub namespace: Namespace,
    /// Parent class name (`extends`).
    pub parent: Option<String>,
    pub stereotype: Stereotype,
    pub trigram: Option<String>,
    pub label_property: Option<String>,
    /// Property keying rows, when declared explicitly.
    pub unique_key: Option<String>,
    pub is_abstract: bool,
    pub database_only: bool,
    /// Properties in declaration order, aliases expanded in place.
    pub properties: Vec<Property>,
    pub rows: Vec<EnumerationRow>,
}

impl Class {
    /// Property by name.
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name() == name)
    }

    /// Declared primary key (not inherited).
    pub fn own_primary_key(&self) -> Option<&Property> {
        self.properties.iter().find(|p| p.is_primary_key())
    }

    /// Properties that have a column.
    pub fn persisted_properties(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter().filter(|p| p.is_persisted())
    }

    /// Short name used in derived identifiers: trigram if present,
    /// otherwise the class name.
    pub fn abbreviation(&self) -> &str {
        self.trigram.as_deref().unwrap_or(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::property::FieldProperty;

    fn pays() -> Class {
        Class {
            id: ClassId(0),
            name: "Pays".to_string(),
            file: FileId::new("Referentiel", "Model", "Pays"),
            namespace: Namespace {
                module: "Referentiel".to_string(),
                kind: "Model".to_string(),
            },
            parent: None,
            stereotype: Stereotype::Reference,
            trigram: Some("PAY".to_string()),
            label_property: None,
            unique_key: None,
            is_abstract: false,
            database_only: false,
            properties: vec![Property::Field(FieldProperty {
                name: "Code".to_string(),
                label: None,
                domain: "DO_CODE".to_string(),
                primary_key: true,
                required: true,
                unique: false,
                many: false,
                default: None,
                persisted_name: "PAY_CODE".to_string(),
            })],
            rows: Vec::new(),
        }
    }

    #[test]
    fn test_class_lookups() {
        let class = pays();
        assert_eq!(class.own_primary_key().map(|p| p.name()), Some("Code"));
        assert!(class.property("Libelle").is_none());
        assert_eq!(class.abbreviation(), "PAY");
        assert_eq!(class.persisted_properties().count(), 1);
    }

    #[test]
    fn test_stereotype_from_keyword() {
        assert_eq!(Stereotype::from(StereotypeKeyword::Enum), Stereotype::Enumeration);
        assert!(Stereotype::Reference.has_rows());
        assert!(!Stereotype::Plain.has_rows());
        assert_eq!(Stereotype::Enumeration.to_string(), "enum");
    }
}
