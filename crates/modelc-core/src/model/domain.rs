//! Domain definitions: reusable type descriptors.

use modelc_lang::DomainDecl;
use serde::Serialize;
use std::collections::BTreeMap;

/// A named type descriptor shared by many properties.
///
/// The per-target mapping may be absent for some targets; absence is
/// reported when a projection for that target is requested, never filled
/// with a guess.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Domain {
    /// Domain name (unique within the model).
    pub name: String,
    /// Optional display label.
    pub label: Option<String>,
    /// Declared length bound.
    pub length: Option<u32>,
    /// Declared scale.
    pub scale: Option<u32>,
    /// Target name to type string.
    pub mappings: BTreeMap<String, String>,
}

impl Domain {
    /// Create a domain with no mappings.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            length: None,
            scale: None,
            mappings: BTreeMap::new(),
        }
    }

    /// Set the length bound.
    pub fn with_length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    /// Set the scale.
    pub fn with_scale(mut self, scale: u32) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Add a target mapping.
    pub fn with_mapping(mut self, target: impl Into<String>, ty: impl Into<String>) -> Self {
        self.mappings.insert(target.into(), ty.into());
        self
    }

    /// Declared type string for a target, if any.
    pub fn mapping(&self, target: &str) -> Option<&str> {
        self.mappings.get(target).map(String::as_str)
    }

    /// Check whether the domain declares a mapping for a target.
    pub fn has_mapping(&self, target: &str) -> bool {
        self.mappings.contains_key(target)
    }

    /// Build a domain from its raw declaration.
    pub fn from_decl(decl: &DomainDecl) -> Self {
        Self {
            name: decl.name.value.clone(),
            label: decl.label.clone(),
            length: decl.length,
            scale: decl.scale,
            mappings: decl
                .mappings
                .iter()
                .map(|(target, ty)| (target.value.clone(), ty.clone()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_builder() {
        let domain = Domain::new("DO_LIBELLE")
            .with_length(100)
            .with_mapping("sql", "varchar")
            .with_mapping("ts", "string");

        assert_eq!(domain.length, Some(100));
        assert_eq!(domain.mapping("sql"), Some("varchar"));
        assert!(domain.has_mapping("ts"));
        assert!(!domain.has_mapping("cs"));
    }

    #[test]
    fn test_domain_from_decl() {
        let file = modelc_lang::parse(
            r#"domain DO_MONTANT { length 12; scale 2; map sql = "decimal"; }"#,
        )
        .unwrap();
        let domain = Domain::from_decl(&file.domains[0]);
        assert_eq!(domain.name, "DO_MONTANT");
        assert_eq!(domain.scale, Some(2));
        assert_eq!(domain.mapping("sql"), Some("decimal"));
    }
}
