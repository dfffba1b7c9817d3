//! Facets: grouped value counts and min/max ranges over the filtered set

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::schema::{EntitySchema, FieldDescriptor};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacetKind {
    Counts,
    Range,
}

/// A facet an entity computes alongside its list page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetDef {
    /// Key in the response
    pub name: String,
    /// Field path, possibly on a relation
    pub field: String,
    pub kind: FacetKind,
}

impl FacetDef {
    pub fn new(name: &str, field: &str, kind: FacetKind) -> Self {
        Self {
            name: name.to_string(),
            field: field.to_string(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetOption {
    pub value: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FacetRange {
    pub min: Option<Value>,
    pub max: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FacetResult {
    Counts(Vec<FacetOption>),
    Range(FacetRange),
}

/// Resolve a facet's field; ranges require an ordered kind
pub fn resolve_facet_field<'s>(schema: &'s EntitySchema, facet: &FacetDef) -> Result<&'s FieldDescriptor> {
    let field = schema
        .field(&facet.field)
        .ok_or_else(|| Error::InvalidFacet(facet.field.clone()))?;
    if facet.kind == FacetKind::Range && !field.kind.is_ordered() {
        return Err(Error::InvalidFacet(format!(
            "{} ({} fields have no range)",
            facet.field,
            field.kind.name()
        )));
    }
    Ok(field)
}

/// Count distinct non-null values, ordered by value ascending
pub fn count_values<'v, I>(values: I) -> Vec<FacetOption>
where
    I: IntoIterator<Item = Option<&'v Value>>,
{
    let mut counts: BTreeMap<&Value, i64> = BTreeMap::new();
    for value in values.into_iter().flatten() {
        *counts.entry(value).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(value, count)| FacetOption {
            value: value.to_string(),
            count,
        })
        .collect()
}

/// Min and max of the non-null values
pub fn value_range<'v, I>(values: I) -> FacetRange
where
    I: IntoIterator<Item = Option<&'v Value>>,
{
    let mut range = FacetRange::default();
    for value in values.into_iter().flatten() {
        if range.min.as_ref().map_or(true, |min| value < min) {
            range.min = Some(value.clone());
        }
        if range.max.as_ref().map_or(true, |max| value > max) {
            range.max = Some(value.clone());
        }
    }
    range
}
