//! Resolved properties.
//!
//! A class property is one of four variants. They share a capability
//! surface (name, label, domain, persisted name, reference linkage) so that
//! validators and projections do not need to match on the variant.

use super::row::Value;
use serde::Serialize;

/// Client-side type of a foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum ClientType {
    /// Distinguishing code type named after the target (`PaysCode`).
    Code(String),
    /// Standard scalar projection of the key's domain.
    Scalar,
}

/// Binding of a property to another class's key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    /// Target class name.
    pub class: String,
    /// Target key property name.
    pub key: String,
    /// Client-side type of the foreign key.
    pub client_type: ClientType,
}

/// Pointer to a property of a class, by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PropertyRef {
    pub class: String,
    pub property: String,
}

impl std::fmt::Display for PropertyRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.class, self.property)
    }
}

/// Multiplicity of a composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Multiplicity {
    One,
    Many,
}

impl From<modelc_lang::Multiplicity> for Multiplicity {
    fn from(m: modelc_lang::Multiplicity) -> Self {
        match m {
            modelc_lang::Multiplicity::One => Multiplicity::One,
            modelc_lang::Multiplicity::Many => Multiplicity::Many,
        }
    }
}

/// A regular field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldProperty {
    pub name: String,
    pub label: Option<String>,
    pub domain: String,
    pub primary_key: bool,
    pub required: bool,
    pub unique: bool,
    pub many: bool,
    pub default: Option<Value>,
    pub persisted_name: String,
}

/// An association to another class's primary key.
///
/// `domain`, `persisted_name`, `reference` and `accessor_name` are filled by
/// the association resolver.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssociationProperty {
    pub name: String,
    pub label: Option<String>,
    /// Target class name as declared.
    pub target: String,
    pub role: Option<String>,
    pub required: bool,
    pub many: bool,
    pub domain: Option<String>,
    pub persisted_name: Option<String>,
    pub reference: Option<Reference>,
    pub accessor_name: Option<String>,
}

/// A composition of another class. Carries no column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositionProperty {
    pub name: String,
    pub label: Option<String>,
    pub target: String,
    pub multiplicity: Multiplicity,
}

/// An alias expanded into a copy of its source property.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AliasProperty {
    /// `Prefix` + source name + `Suffix`.
    pub name: String,
    pub label: Option<String>,
    /// The property this alias copies.
    pub source: PropertyRef,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub domain: Option<String>,
    pub persisted_name: Option<String>,
    pub required: bool,
    pub many: bool,
    pub role: Option<String>,
    /// Class the alias's reference points at: the association target of an
    /// association source, or the source class itself for an enumeration
    /// key.
    pub linked_class: Option<String>,
    pub reference: Option<Reference>,
}

/// A resolved property.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Property {
    Field(FieldProperty),
    Association(AssociationProperty),
    Composition(CompositionProperty),
    Alias(AliasProperty),
}

impl Property {
    /// Property name.
    pub fn name(&self) -> &str {
        match self {
            Property::Field(p) => &p.name,
            Property::Association(p) => &p.name,
            Property::Composition(p) => &p.name,
            Property::Alias(p) => &p.name,
        }
    }

    /// Display label, if any.
    pub fn label(&self) -> Option<&str> {
        match self {
            Property::Field(p) => p.label.as_deref(),
            Property::Association(p) => p.label.as_deref(),
            Property::Composition(p) => p.label.as_deref(),
            Property::Alias(p) => p.label.as_deref(),
        }
    }

    /// Domain name. Compositions have none; associations get theirs when
    /// bound.
    pub fn domain(&self) -> Option<&str> {
        match self {
            Property::Field(p) => Some(&p.domain),
            Property::Association(p) => p.domain.as_deref(),
            Property::Composition(_) => None,
            Property::Alias(p) => p.domain.as_deref(),
        }
    }

    /// Persisted column name.
    pub fn persisted_name(&self) -> Option<&str> {
        match self {
            Property::Field(p) => Some(&p.persisted_name),
            Property::Association(p) => p.persisted_name.as_deref(),
            Property::Composition(_) => None,
            Property::Alias(p) => p.persisted_name.as_deref(),
        }
    }

    /// Key binding for foreign keys.
    pub fn reference(&self) -> Option<&Reference> {
        match self {
            Property::Association(p) => p.reference.as_ref(),
            Property::Alias(p) => p.reference.as_ref(),
            _ => None,
        }
    }

    /// Class this property links to through an association edge.
    pub fn linked_class(&self) -> Option<&str> {
        match self {
            Property::Association(p) => Some(&p.target),
            Property::Alias(p) => p.linked_class.as_deref(),
            _ => None,
        }
    }

    /// Role qualifier.
    pub fn role(&self) -> Option<&str> {
        match self {
            Property::Association(p) => p.role.as_deref(),
            Property::Alias(p) => p.role.as_deref(),
            _ => None,
        }
    }

    pub fn is_primary_key(&self) -> bool {
        matches!(self, Property::Field(p) if p.primary_key)
    }

    pub fn is_unique(&self) -> bool {
        matches!(self, Property::Field(p) if p.unique || p.primary_key)
    }

    pub fn is_required(&self) -> bool {
        match self {
            Property::Field(p) => p.required || p.primary_key,
            Property::Association(p) => p.required,
            Property::Composition(_) => false,
            Property::Alias(p) => p.required,
        }
    }

    /// Collection-valued property.
    pub fn is_many(&self) -> bool {
        match self {
            Property::Field(p) => p.many,
            Property::Association(p) => p.many,
            Property::Composition(p) => p.multiplicity == Multiplicity::Many,
            Property::Alias(p) => p.many,
        }
    }

    /// Whether the property has a column.
    pub fn is_persisted(&self) -> bool {
        !matches!(self, Property::Composition(_))
    }

    pub fn default_value(&self) -> Option<&Value> {
        match self {
            Property::Field(p) => p.default.as_ref(),
            _ => None,
        }
    }

    pub fn is_alias(&self) -> bool {
        matches!(self, Property::Alias(_))
    }
}
