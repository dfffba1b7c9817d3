//! SQL statements for a planned list query
//!
//! Every statement shares the same FROM/JOIN clause and WHERE predicate, so
//! page, count and facet queries always see the same filtered set.

use bfg_query::facet::resolve_facet_field;
use serde::Serialize;
use bfg_query::{EntitySchema, FacetDef, FacetKind, FieldKind, QueryPlan, RelationDef, SortDirection, SortOrder};

use crate::db::sql::{column_sql, push_bind, relation_alias, BindValue, SqlPredicate, ROOT_ALIAS};
use crate::error::Result;

/// A rendered statement and its bind parameters (`$1` is index 0)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlStatement {
    pub sql: String,
    pub bind_params: Vec<BindValue>,
}

fn join_clause(relation: &RelationDef) -> String {
    let alias = relation_alias(&relation.name);
    format!(
        " {} {} {} ON {}.{} = {}.{}",
        relation.join.sql(),
        relation.table,
        alias,
        alias,
        relation.target_column,
        ROOT_ALIAS,
        relation.local_column
    )
}

fn from_clause(schema: &EntitySchema, joins: &[&RelationDef]) -> String {
    let mut sql = format!("FROM {} {}", schema.table, ROOT_ALIAS);
    for relation in joins {
        sql.push_str(&join_clause(relation));
    }
    sql
}

fn order_by_clause(sort: &[SortOrder]) -> String {
    let terms: Vec<String> = sort
        .iter()
        .map(|order| {
            let nulls = match order.direction {
                SortDirection::Asc => "NULLS LAST",
                SortDirection::Desc => "NULLS FIRST",
            };
            format!("{} {} {}", column_sql(&order.column), order.direction.sql(), nulls)
        })
        .collect();
    format!("ORDER BY {}", terms.join(", "))
}

/// Row projection: the root row as JSON, with requested relations embedded
/// under their relation name (null when the join found nothing).
fn row_projection(plan: &QueryPlan<'_, SqlPredicate>) -> String {
    let mut projection = format!("to_jsonb({})", ROOT_ALIAS);
    for relation in &plan.joins {
        if !plan.requested_expand.contains(&relation.name) {
            continue;
        }
        let alias = relation_alias(&relation.name);
        projection.push_str(&format!(
            " || jsonb_build_object('{}', CASE WHEN {}.{} IS NULL THEN NULL ELSE to_jsonb({}) END)",
            relation.name, alias, relation.target_column, alias
        ));
    }
    projection
}

/// `SELECT ... ORDER BY ... LIMIT ... OFFSET ...` for one page
pub fn build_page_query(plan: &QueryPlan<'_, SqlPredicate>, bind_params: &[BindValue]) -> SqlStatement {
    let mut bind_params = bind_params.to_vec();
    let limit_idx = push_bind(&mut bind_params, BindValue::Integer(plan.page.top()));
    let offset_idx = push_bind(&mut bind_params, BindValue::Integer(plan.page.skip()));

    let sql = format!(
        "SELECT {} AS item {} WHERE {} {} LIMIT ${} OFFSET ${}",
        row_projection(plan),
        from_clause(plan.schema, &plan.joins),
        plan.predicate,
        order_by_clause(&plan.sort),
        limit_idx,
        offset_idx
    );

    SqlStatement { sql, bind_params }
}

/// `SELECT COUNT(*)` over the filtered set, ignoring sort and paging
pub fn build_count_query(plan: &QueryPlan<'_, SqlPredicate>, bind_params: &[BindValue]) -> SqlStatement {
    let sql = format!(
        "SELECT COUNT(*) {} WHERE {}",
        from_clause(plan.schema, &plan.joins),
        plan.predicate
    );
    SqlStatement {
        sql,
        bind_params: bind_params.to_vec(),
    }
}

/// Facet query over the filtered set
///
/// Counts yield `(value text, count bigint)` rows ordered by value; ranges
/// yield a single `(min, max)` row cast to the field's kind.
pub fn build_facet_query(
    plan: &QueryPlan<'_, SqlPredicate>,
    bind_params: &[BindValue],
    facet: &FacetDef,
) -> Result<SqlStatement> {
    let field = resolve_facet_field(plan.schema, facet)?;

    let mut joins = plan.joins.clone();
    if let Some(relation) = field.relation().and_then(|name| plan.schema.relation(name)) {
        if !joins.iter().any(|j| j.name == relation.name) {
            joins.push(relation);
        }
    }

    let column = column_sql(&field.column);
    let from = from_clause(plan.schema, &joins);
    let predicate = plan.predicate.to_string();

    let sql = match facet.kind {
        FacetKind::Counts => format!(
            "SELECT {col}::text AS value, COUNT(*) AS count {from} WHERE {predicate} AND {col} IS NOT NULL GROUP BY {col} ORDER BY {col} ASC",
            col = column
        ),
        FacetKind::Range => {
            let cast = range_cast(&field.kind);
            format!(
                "SELECT MIN({col}){cast} AS min, MAX({col}){cast} AS max {from} WHERE {predicate}",
                col = column
            )
        }
    };

    Ok(SqlStatement {
        sql,
        bind_params: bind_params.to_vec(),
    })
}

fn range_cast(kind: &FieldKind) -> &'static str {
    match kind {
        FieldKind::Integer => "::bigint",
        FieldKind::Date => "::date",
        FieldKind::DateTime => "::timestamptz",
        _ => "",
    }
}
