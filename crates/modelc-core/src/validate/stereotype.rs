//! Stereotype conformance.

use super::ValidationContext;
use crate::error::Error;

/// A declared row key must name a property flagged unique (or the primary
/// key). A key naming no property at all fails the same way.
pub fn check_unique_keys(ctx: &ValidationContext<'_>) -> Result<(), Error> {
    for id in ctx.graph.ids() {
        let class = ctx.graph.class(id);
        let Some(key) = class.unique_key.as_deref() else {
            continue;
        };
        if !class.property(key).is_some_and(|property| property.is_unique()) {
            return Err(Error::NoUniqueKey {
                class: class.name.clone(),
                key: key.to_string(),
                file: class.file.clone(),
            });
        }
    }
    Ok(())
}
