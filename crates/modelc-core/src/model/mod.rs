//! Resolved model types.
//!
//! These are the types emitters read. Unlike the raw declarations of
//! `modelc_lang::ast` they carry no source spans.

mod class;
mod domain;
mod ids;
pub mod naming;
mod property;
mod row;

pub use class::{Class, Stereotype};
pub use domain::Domain;
pub use ids::{ClassId, FileId, Namespace};
pub use property::{
    AliasProperty, AssociationProperty, ClientType, CompositionProperty, FieldProperty,
    Multiplicity, Property, PropertyRef, Reference,
};
pub use row::{EnumerationRow, Value};
