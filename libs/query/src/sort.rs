//! Sort expressions: `field_asc,other_desc`

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::expand::ExpandSet;
use crate::schema::{ColumnRef, EntitySchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    pub fn sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    fn suffix(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql())
    }
}

/// One resolved ordering term
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOrder {
    pub field: String,
    pub column: ColumnRef,
    pub direction: SortDirection,
}

impl SortOrder {
    pub fn new(field: &str, column: ColumnRef, direction: SortDirection) -> Self {
        Self {
            field: field.to_string(),
            column,
            direction,
        }
    }

    /// Canonical allow-list token, e.g. `year_desc`
    pub fn token(&self) -> String {
        format!("{}_{}", self.field, self.direction.suffix())
    }
}

/// Canonical sort tokens accepted by an entity, matched case-insensitively
#[derive(Debug, Clone, Default)]
pub struct SortAllowList {
    orders: BTreeMap<String, SortOrder>,
}

impl SortAllowList {
    pub fn insert(&mut self, order: SortOrder) {
        self.orders.insert(order.token().to_ascii_lowercase(), order);
    }

    pub fn resolve(&self, token: &str) -> Option<&SortOrder> {
        self.orders.get(&token.to_ascii_lowercase())
    }

    pub fn tokens(&self) -> impl Iterator<Item = String> + '_ {
        self.orders.values().map(SortOrder::token)
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

/// Sort parse result with the relations the orders reference
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSort {
    pub orders: Vec<SortOrder>,
    pub used_expand: ExpandSet,
}

/// Join multi-valued sort parameters (`?sort=a_asc&sort=b_desc`) into one expression
pub fn join_sort_params(params: &[String]) -> String {
    params
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

fn collect_orders<F>(raw: &str, default: &[SortOrder], mut resolve: F) -> Result<Vec<SortOrder>>
where
    F: FnMut(&str) -> Result<SortOrder>,
{
    let mut orders: Vec<SortOrder> = Vec::new();

    // Aliases share a column, so duplicates are detected on the column
    for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let order = resolve(token)?;
        if let Some(existing) = orders.iter().find(|o| o.column == order.column) {
            if existing.direction != order.direction {
                return Err(Error::ConflictingSort {
                    field: order.field,
                    first: existing.direction,
                    second: order.direction,
                });
            }
            return Err(Error::DuplicateSort(order.field));
        }
        orders.push(order);
    }

    if orders.is_empty() {
        return Ok(default.to_vec());
    }
    Ok(orders)
}

/// Parse against an allow-list; a blank expression yields `default`.
pub fn parse_sort(raw: &str, allow_list: &SortAllowList, default: &[SortOrder]) -> Result<Vec<SortOrder>> {
    collect_orders(raw, default, |token| {
        allow_list
            .resolve(token)
            .cloned()
            .ok_or_else(|| Error::InvalidSort(token.to_string()))
    })
}

/// Parse against an entity schema.
///
/// Besides the allow-list, any dotted field registered on the schema can be
/// sorted by (`athlete.lastName_desc`) as long as its relation was expanded.
pub fn parse_sort_with_expand(
    raw: &str,
    schema: &EntitySchema,
    requested_expand: &ExpandSet,
) -> Result<ParsedSort> {
    let orders = collect_orders(raw, schema.default_sort(), |token| {
        if let Some(order) = schema.sort_allow_list().resolve(token) {
            return Ok(order.clone());
        }
        resolve_expanded(token, schema, requested_expand)
    })?;

    let used_expand = orders
        .iter()
        .filter_map(|o| o.column.relation.clone())
        .collect();

    Ok(ParsedSort {
        orders,
        used_expand,
    })
}

fn resolve_expanded(token: &str, schema: &EntitySchema, requested_expand: &ExpandSet) -> Result<SortOrder> {
    let invalid = || Error::InvalidSort(token.to_string());

    let (path, direction) = token.rsplit_once('_').ok_or_else(invalid)?;
    let Some((relation, _)) = path.split_once('.') else {
        return Err(invalid());
    };
    let direction = SortDirection::parse(direction).ok_or_else(invalid)?;

    if schema.relation(relation).is_none() {
        return Err(invalid());
    }
    if !requested_expand.contains(relation) {
        return Err(Error::UnexpandedSortField {
            field: path.to_string(),
            relation: relation.to_string(),
        });
    }

    let field = schema.field_ignore_case(path).ok_or_else(invalid)?;
    Ok(SortOrder::new(&field.name, field.column.clone(), direction))
}
