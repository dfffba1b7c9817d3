//! List query planning: parse, validate and compile every parameter of a
//! list request before any storage access.

use serde::{Deserialize, Serialize};

use crate::backend::CriteriaBackend;
use crate::compile::{compile_filter, compile_search};
use crate::error::Result;
use crate::expand::{parse_expand, required_relations, ExpandSet};
use crate::page::{OffsetPage, PageLimits};
use crate::parser::parse_filter;
use crate::schema::{ColumnRef, EntitySchema, RelationDef};
use crate::sort::{parse_sort_with_expand, SortDirection, SortOrder};

/// Raw list request parameters
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ListQuery {
    pub filter: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub expand: Option<String>,
    pub skip: Option<i64>,
    pub top: Option<i64>,
}

/// Everything a store needs to execute one list request
#[derive(Debug, Clone)]
pub struct QueryPlan<'s, P> {
    pub schema: &'s EntitySchema,
    /// Filter and search combined
    pub predicate: P,
    /// Relations to embed in the returned rows
    pub requested_expand: ExpandSet,
    /// Relations to join: requested, or referenced by filter, search or sort
    pub joins: Vec<&'s RelationDef>,
    /// Total ordering (primary key appended as tiebreaker)
    pub sort: Vec<SortOrder>,
    pub page: OffsetPage,
}

impl<P> QueryPlan<'_, P> {
    pub fn relations(&self) -> ExpandSet {
        self.joins.iter().map(|r| r.name.clone()).collect()
    }
}

fn with_tiebreaker(mut orders: Vec<SortOrder>, primary_key: &str) -> Vec<SortOrder> {
    let key = ColumnRef::root(primary_key);
    if !orders.iter().any(|o| o.column == key) {
        orders.push(SortOrder::new(primary_key, key, SortDirection::Asc));
    }
    orders
}

/// Plan a list request: expand, then filter and sort (both gated by the
/// expand set), then paging, then compilation of filter and search.
pub fn plan_list_query<'s, B: CriteriaBackend>(
    schema: &'s EntitySchema,
    query: &ListQuery,
    backend: &mut B,
    limits: &PageLimits,
) -> Result<QueryPlan<'s, B::Predicate>> {
    let requested_expand = parse_expand(query.expand.as_deref().unwrap_or_default(), schema)?;
    let parsed = parse_filter(query.filter.as_deref().unwrap_or_default(), &requested_expand)?;
    let sort = parse_sort_with_expand(
        query.sort.as_deref().unwrap_or_default(),
        schema,
        &requested_expand,
    )?;
    let page = OffsetPage::from_request(query.skip, query.top, limits)?;

    let filter = compile_filter(&parsed.expr, schema, backend)?;
    let search = compile_search(query.search.as_deref().unwrap_or_default(), schema, backend);

    let mut relations = required_relations(&requested_expand, &parsed.used_expand, &sort.used_expand);
    relations.extend(filter.relations);
    relations.extend(search.relations);

    let joins: Vec<&RelationDef> = relations
        .iter()
        .filter_map(|name| schema.relation(name))
        .collect();
    for relation in &joins {
        backend.join(relation);
    }

    let predicate = backend.and(filter.predicate, search.predicate);

    tracing::debug!(
        entity = %schema.name,
        relations = ?relations,
        skip = page.skip(),
        top = page.top(),
        "Planned list query"
    );

    Ok(QueryPlan {
        schema,
        predicate,
        requested_expand,
        joins,
        sort: with_tiebreaker(sort.orders, &schema.primary_key),
        page,
    })
}
