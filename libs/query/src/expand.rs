//! `expand` parameter: relation names to materialize with each row

use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::schema::EntitySchema;

/// Ordered set of relation names
pub type ExpandSet = BTreeSet<String>;

fn split(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// Parse and validate against the entity's relations.
///
/// All unknown names are reported together.
pub fn parse_expand(raw: &str, schema: &EntitySchema) -> Result<ExpandSet> {
    let requested = parse_expand_unvalidated(raw);

    let invalid: Vec<String> = requested
        .iter()
        .filter(|name| schema.relation(name).is_none())
        .cloned()
        .collect();

    if !invalid.is_empty() {
        return Err(Error::InvalidExpand {
            entity: schema.name.clone(),
            invalid,
            available: schema.relation_names(),
        });
    }

    Ok(requested)
}

/// Parse without registry lookups, for input that was validated upstream
pub fn parse_expand_unvalidated(raw: &str) -> ExpandSet {
    split(raw).map(str::to_string).collect()
}

/// Relations that must be joined: requested ∪ used by filter ∪ used by sort
pub fn required_relations(
    requested: &ExpandSet,
    used_in_filter: &ExpandSet,
    used_in_sort: &ExpandSet,
) -> ExpandSet {
    requested
        .iter()
        .chain(used_in_filter)
        .chain(used_in_sort)
        .cloned()
        .collect()
}
