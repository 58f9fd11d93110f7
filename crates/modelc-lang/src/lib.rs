//! modelc model definition language
//!
//! This crate provides the lexer and parser for model definition files: the
//! raw, unresolved declarations of domains, classes, properties and
//! enumeration rows that `modelc-core` resolves into a schema graph.
//!
//! # Syntax
//!
//! ```text
//! uses Referentiel::Domain::Domains;
//!
//! domain DO_CODE {
//!     length 3;
//!     map sql = "varchar";
//!     map ts = "string";
//! }
//!
//! class Pays reference {
//!     trigram PAY;
//!     label Libelle;
//!     field Code: DO_CODE primary;
//!     field Libelle: DO_LIBELLE required;
//!     values {
//!         FR { Code = "FR", Libelle = "France" }
//!     }
//! }
//!
//! class Societe {
//!     field Id: DO_ID primary;
//!     ref PaysCode -> Pays role "Siege";
//!     compose Adresses -> Adresse many;
//!     alias Utilisateur_Email_Contact label "[Override] Email de contact";
//! }
//! ```
//!
//! # Usage
//!
//! ```rust
//! use modelc_lang::parse;
//!
//! let file = parse("class Pays { field Code: DO_CODE primary; }").unwrap();
//! assert_eq!(file.classes[0].name.value, "Pays");
//! ```

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod span;

pub use ast::{
    AliasDecl, AssociationDecl, ClassDecl, CompositionDecl, DomainDecl, FieldDecl, FileRef,
    Literal, ModelFile, Multiplicity, PropertyDecl, RowDecl, StereotypeKeyword,
};
pub use error::ParseError;
pub use span::{Location, Span, Spanned};

/// Parse the text of a model file into raw declarations.
///
/// # Example
///
/// ```rust
/// use modelc_lang::parse;
///
/// let file = parse("uses App::Domain::Domains;").unwrap();
/// assert_eq!(file.uses.len(), 1);
/// ```
pub fn parse(source: &str) -> Result<ModelFile, ParseError> {
    parser::parse(source)
}

/// Tokenize a source string (for debugging/testing).
///
/// # Example
///
/// ```rust
/// use modelc_lang::tokenize;
///
/// let tokens = tokenize("class Pays {}");
/// assert_eq!(tokens.len(), 4);
/// ```
pub fn tokenize(source: &str) -> Vec<lexer::SpannedToken> {
    lexer::tokenize(source)
}
