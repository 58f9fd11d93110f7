//! Identities of model files, namespaces and classes.

use modelc_lang::FileRef;
use serde::{Deserialize, Serialize};

/// Identity of a model file: module, kind and file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId {
    /// Module (top-level namespace segment).
    pub module: String,
    /// Kind of file within the module (e.g. `Model`, `Domain`).
    pub kind: String,
    /// File name.
    pub name: String,
}

impl FileId {
    /// Create a file identity.
    pub fn new(module: impl Into<String>, kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Namespace that classes declared in this file belong to.
    pub fn namespace(&self) -> Namespace {
        Namespace {
            module: self.module.clone(),
            kind: self.kind.clone(),
        }
    }
}

impl From<&FileRef> for FileId {
    fn from(file: &FileRef) -> Self {
        Self::new(&file.module, &file.kind, &file.name)
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.module, self.kind, self.name)
    }
}

/// Namespace of a class: module x kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Namespace {
    pub module: String,
    pub kind: String,
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.module, self.kind)
    }
}

/// Arena index of a class within one resolution run.
///
/// Ids follow load order and then declaration order, so they are stable
/// for identical inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassId(pub usize);

impl ClassId {
    /// Position in the class arena.
    pub fn index(self) -> usize {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_id_display_and_order() {
        let a = FileId::new("Referentiel", "Model", "Pays");
        let b = FileId::new("Referentiel", "Model", "Societe");
        assert_eq!(a.to_string(), "Referentiel/Model/Pays");
        assert!(a < b);
        assert_eq!(a.namespace().to_string(), "Referentiel.Model");
    }

    #[test]
    fn test_file_id_from_ref() {
        let file_ref = FileRef {
            module: "App".to_string(),
            kind: "Domain".to_string(),
            name: "Domains".to_string(),
        };
        assert_eq!(FileId::from(&file_ref), FileId::new("App", "Domain", "Domains"));
    }
}
