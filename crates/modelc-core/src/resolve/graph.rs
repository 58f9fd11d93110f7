//! The pre-publication class graph shared by resolver stages and
//! validators.

use super::symbols::SymbolTable;
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::model::{Class, ClassId, Property};
use modelc_lang::{AliasDecl, Span};
use std::collections::HashSet;

/// Source spans of one class, kept beside the class until diagnostics are
/// produced.
#[derive(Debug, Clone, Default)]
pub struct ClassSpans {
    pub name: Span,
    pub extends: Option<Span>,
    pub label_property: Option<Span>,
    pub unique_key: Option<Span>,
    /// One span per property, parallel to `Class::properties`.
    pub properties: Vec<Span>,
    /// One span per row, parallel to `Class::rows`.
    pub rows: Vec<Span>,
    /// Span of each row value, parallel to `EnumerationRow::values`.
    pub row_values: Vec<Vec<Span>>,
}

/// An alias declaration waiting for expansion.
#[derive(Debug, Clone)]
pub struct PendingAlias {
    pub class: ClassId,
    /// Index in the class's property list the expansion goes to.
    pub position: usize,
    pub decl: AliasDecl,
}

/// Class arena of one run.
#[derive(Debug, Default)]
pub struct Graph {
    pub classes: Vec<Class>,
    pub spans: Vec<ClassSpans>,
    /// Parent of each class, when it resolved.
    pub parents: Vec<Option<ClassId>>,
    pub(crate) pending_aliases: Vec<PendingAlias>,
}

impl Graph {
    pub fn class(&self, id: ClassId) -> &Class {
        &self.classes[id.index()]
    }

    pub fn ids(&self) -> impl Iterator<Item = ClassId> {
        (0..self.classes.len()).map(ClassId)
    }

    /// Primary key of a class, declared or inherited, with the class that
    /// declares it.
    pub fn primary_key(&self, id: ClassId) -> Option<(ClassId, &Property)> {
        let mut seen = HashSet::new();
        let mut current = Some(id);
        while let Some(class_id) = current {
            if !seen.insert(class_id) {
                return None;
            }
            if let Some(key) = self.class(class_id).own_primary_key() {
                return Some((class_id, key));
            }
            current = self.parents[class_id.index()];
        }
        None
    }

    /// Primary key inherited from the parent chain, ignoring the class's own.
    pub fn inherited_primary_key(&self, id: ClassId) -> Option<(ClassId, &Property)> {
        self.parents[id.index()].and_then(|parent| self.primary_key(parent))
    }

    /// Property that keys the rows of a class: the declared key, otherwise
    /// the primary key.
    pub fn row_key(&self, id: ClassId) -> Option<&Property> {
        let class = self.class(id);
        match &class.unique_key {
            Some(key) => class.property(key),
            None => self.primary_key(id).map(|(_, p)| p),
        }
    }

    /// Build a diagnostic attached to a class.
    pub fn diagnostic(
        &self,
        table: &SymbolTable,
        id: ClassId,
        kind: DiagnosticKind,
        span: Span,
        message: impl Into<String>,
    ) -> Diagnostic {
        let class = self.class(id);
        Diagnostic::new(kind, class.file.clone(), message)
            .with_class(&class.name)
            .with_location(table.locate(&class.file, span))
    }

    /// Build a diagnostic attached to a property of a class.
    pub fn property_diagnostic(
        &self,
        table: &SymbolTable,
        id: ClassId,
        index: usize,
        kind: DiagnosticKind,
        message: impl Into<String>,
    ) -> Diagnostic {
        let span = self.spans[id.index()].properties[index];
        let field = self.class(id).properties[index].name().to_string();
        self.diagnostic(table, id, kind, span, message).with_field(field)
    }
}
