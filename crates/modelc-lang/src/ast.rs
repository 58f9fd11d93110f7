//! Abstract syntax tree for model definition files.
//!
//! These are the raw declarations exactly as authored. Nothing here is
//! resolved: class, domain and alias references are plain names carrying the
//! span they were written at.

use crate::span::{Span, Spanned};

/// A parsed model file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelFile {
    /// Files this file depends on, in declaration order.
    pub uses: Vec<Spanned<FileRef>>,
    /// Domain declarations.
    pub domains: Vec<DomainDecl>,
    /// Class declarations.
    pub classes: Vec<ClassDecl>,
}

/// Reference to another model file (`module::kind::name`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileRef {
    pub module: String,
    pub kind: String,
    pub name: String,
}

/// A domain declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainDecl {
    pub name: Spanned<String>,
    pub label: Option<String>,
    pub length: Option<u32>,
    pub scale: Option<u32>,
    /// Target name to type string, in declaration order.
    pub mappings: Vec<(Spanned<String>, String)>,
    pub span: Span,
}

/// Stereotype keyword written after a class name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StereotypeKeyword {
    /// `enum`: fixed enumeration baked into generated code.
    Enum,
    /// `reference`: administrable reference list.
    Reference,
    /// `plain`.
    Plain,
}

/// A class declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: Spanned<String>,
    pub extends: Option<Spanned<String>>,
    pub stereotype: Option<Spanned<StereotypeKeyword>>,
    pub trigram: Option<Spanned<String>>,
    /// Property used as the display label of a row.
    pub label_property: Option<Spanned<String>>,
    /// Property keying enumeration rows.
    pub unique_key: Option<Spanned<String>>,
    pub is_abstract: bool,
    pub database_only: bool,
    pub properties: Vec<PropertyDecl>,
    pub rows: Vec<RowDecl>,
    pub span: Span,
}

impl ClassDecl {
    /// Create an empty declaration (used by the parser and tests).
    pub fn new(name: Spanned<String>) -> Self {
        let span = name.span;
        Self {
            name,
            extends: None,
            stereotype: None,
            trigram: None,
            label_property: None,
            unique_key: None,
            is_abstract: false,
            database_only: false,
            properties: Vec::new(),
            rows: Vec::new(),
            span,
        }
    }
}

/// A property declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyDecl {
    /// `field Name: DOMAIN ...;`
    Field(FieldDecl),
    /// `ref Name -> Target ...;`
    Association(AssociationDecl),
    /// `compose Name -> Target one|many ...;`
    Composition(CompositionDecl),
    /// `alias Class_Field[_Prefix[_Suffix]] ...;`
    Alias(AliasDecl),
}

impl PropertyDecl {
    /// Declared name (the alias token for aliases).
    pub fn name(&self) -> &Spanned<String> {
        match self {
            PropertyDecl::Field(f) => &f.name,
            PropertyDecl::Association(a) => &a.name,
            PropertyDecl::Composition(c) => &c.name,
            PropertyDecl::Alias(a) => &a.token,
        }
    }

    /// Span of the whole declaration.
    pub fn span(&self) -> Span {
        match self {
            PropertyDecl::Field(f) => f.span,
            PropertyDecl::Association(a) => a.span,
            PropertyDecl::Composition(c) => c.span,
            PropertyDecl::Alias(a) => a.span,
        }
    }
}

/// A regular field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: Spanned<String>,
    pub domain: Spanned<String>,
    pub primary_key: bool,
    pub required: bool,
    pub unique: bool,
    pub many: bool,
    pub default: Option<Spanned<Literal>>,
    pub label: Option<String>,
    /// Explicit persisted column name.
    pub column: Option<String>,
    pub span: Span,
}

/// An association to another class's primary key.
#[derive(Debug, Clone, PartialEq)]
pub struct AssociationDecl {
    pub name: Spanned<String>,
    pub target: Spanned<String>,
    pub role: Option<String>,
    pub required: bool,
    pub many: bool,
    pub label: Option<String>,
    pub span: Span,
}

/// Multiplicity of a composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Multiplicity {
    #[default]
    One,
    Many,
}

/// A composition of another class (no column).
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionDecl {
    pub name: Spanned<String>,
    pub target: Spanned<String>,
    pub multiplicity: Multiplicity,
    pub label: Option<String>,
    pub span: Span,
}

/// An alias of a property declared on another class.
#[derive(Debug, Clone, PartialEq)]
pub struct AliasDecl {
    /// Structured token `Class_Field[_Prefix[_Suffix]]`.
    pub token: Spanned<String>,
    pub label: Option<String>,
    pub span: Span,
}

/// One literal enumeration row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowDecl {
    pub name: Spanned<String>,
    pub values: Vec<(Spanned<String>, Spanned<Literal>)>,
    pub span: Span,
}

/// A literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Null => write!(f, "null"),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Int(i) => write!(f, "{}", i),
            Literal::Float(x) => write!(f, "{}", x),
            Literal::String(s) => write!(f, "\"{}\"", s),
        }
    }
}
