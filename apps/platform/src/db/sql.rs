//! PostgreSQL criteria backend
//!
//! Renders compiled predicates as SQL fragments over `$n` bind parameters.
//! The root table is aliased `t`; every joined relation is aliased by its
//! relation name (quoted, since relation names are camelCase).

use std::fmt;

use bfg_query::{ColumnRef, CompareOp, CriteriaBackend, RelationDef, Value};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

pub const ROOT_ALIAS: &str = "t";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BindValue {
    Text(String),
    TextArray(Vec<String>),
    Uuid(Uuid),
    UuidArray(Vec<Uuid>),
    Integer(i64),
    IntegerArray(Vec<i64>),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    Boolean(bool),
}

impl From<&Value> for BindValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Text(v) => BindValue::Text(v.clone()),
            Value::Uuid(v) => BindValue::Uuid(*v),
            Value::Integer(v) => BindValue::Integer(*v),
            Value::Date(v) => BindValue::Date(*v),
            Value::DateTime(v) => BindValue::DateTime(*v),
            Value::Boolean(v) => BindValue::Boolean(*v),
        }
    }
}

/// Push a bind value and return its `$n` index
pub fn push_bind(bind_params: &mut Vec<BindValue>, value: BindValue) -> usize {
    bind_params.push(value);
    bind_params.len()
}

/// Typed array bind for `= ANY($n)`, when all values share one kind
fn array_bind(values: &[Value]) -> Option<BindValue> {
    match values.first()? {
        Value::Text(_) => values
            .iter()
            .map(|v| match v {
                Value::Text(s) => Some(s.clone()),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .map(BindValue::TextArray),
        Value::Uuid(_) => values
            .iter()
            .map(|v| match v {
                Value::Uuid(u) => Some(*u),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .map(BindValue::UuidArray),
        Value::Integer(_) => values
            .iter()
            .map(|v| match v {
                Value::Integer(i) => Some(*i),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .map(BindValue::IntegerArray),
        _ => None,
    }
}

/// Quoted alias of a relation
pub fn relation_alias(relation: &str) -> String {
    format!("\"{}\"", relation.replace('"', "\"\""))
}

/// Qualified column expression
pub fn column_sql(column: &ColumnRef) -> String {
    match &column.relation {
        Some(relation) => format!("{}.{}", relation_alias(relation), column.column),
        None => format!("{}.{}", ROOT_ALIAS, column.column),
    }
}

/// Escape LIKE wildcards so the needle matches literally
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Predicate produced by [`SqlBackend`], rendered through `Display`.
///
/// Connectives stay flat so a long `and` chain renders as one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlPredicate {
    True,
    Fragment(String),
    And(Vec<SqlPredicate>),
    Or(Vec<SqlPredicate>),
}

fn write_group(f: &mut fmt::Formatter<'_>, clauses: &[SqlPredicate], keyword: &str) -> fmt::Result {
    f.write_str("(")?;
    for (i, clause) in clauses.iter().enumerate() {
        if i > 0 {
            write!(f, " {keyword} ")?;
        }
        write!(f, "{clause}")?;
    }
    f.write_str(")")
}

impl fmt::Display for SqlPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlPredicate::True => f.write_str("TRUE"),
            SqlPredicate::Fragment(sql) => f.write_str(sql),
            SqlPredicate::And(clauses) => write_group(f, clauses, "AND"),
            SqlPredicate::Or(clauses) => write_group(f, clauses, "OR"),
        }
    }
}

/// Collects bind values and joins while a plan is compiled
#[derive(Debug, Default, Clone)]
pub struct SqlBackend {
    bind_params: Vec<BindValue>,
    joins: Vec<RelationDef>,
}

impl SqlBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind_params(&self) -> &[BindValue] {
        &self.bind_params
    }

    pub fn joins(&self) -> &[RelationDef] {
        &self.joins
    }

    fn bind(&mut self, value: BindValue) -> usize {
        push_bind(&mut self.bind_params, value)
    }
}

impl CriteriaBackend for SqlBackend {
    type Predicate = SqlPredicate;

    fn always_true(&mut self) -> SqlPredicate {
        SqlPredicate::True
    }

    fn and(&mut self, left: SqlPredicate, right: SqlPredicate) -> SqlPredicate {
        match (left, right) {
            (SqlPredicate::True, other) | (other, SqlPredicate::True) => other,
            (SqlPredicate::And(mut clauses), SqlPredicate::And(rest)) => {
                clauses.extend(rest);
                SqlPredicate::And(clauses)
            }
            (SqlPredicate::And(mut clauses), other) => {
                clauses.push(other);
                SqlPredicate::And(clauses)
            }
            (other, SqlPredicate::And(mut clauses)) => {
                clauses.insert(0, other);
                SqlPredicate::And(clauses)
            }
            (left, right) => SqlPredicate::And(vec![left, right]),
        }
    }

    fn or(&mut self, left: SqlPredicate, right: SqlPredicate) -> SqlPredicate {
        match (left, right) {
            (SqlPredicate::True, _) | (_, SqlPredicate::True) => SqlPredicate::True,
            (SqlPredicate::Or(mut clauses), SqlPredicate::Or(rest)) => {
                clauses.extend(rest);
                SqlPredicate::Or(clauses)
            }
            (SqlPredicate::Or(mut clauses), other) => {
                clauses.push(other);
                SqlPredicate::Or(clauses)
            }
            (other, SqlPredicate::Or(mut clauses)) => {
                clauses.insert(0, other);
                SqlPredicate::Or(clauses)
            }
            (left, right) => SqlPredicate::Or(vec![left, right]),
        }
    }

    fn compare(
        &mut self,
        column: &ColumnRef,
        op: CompareOp,
        value: &Value,
        case_insensitive: bool,
    ) -> SqlPredicate {
        let idx = self.bind(value.into());
        let column = column_sql(column);
        if case_insensitive {
            SqlPredicate::Fragment(format!("LOWER({}) {} ${}", column, op.sql(), idx))
        } else {
            SqlPredicate::Fragment(format!("{} {} ${}", column, op.sql(), idx))
        }
    }

    fn in_list(&mut self, column: &ColumnRef, values: &[Value], case_insensitive: bool) -> SqlPredicate {
        let column_expr = if case_insensitive {
            format!("LOWER({})", column_sql(column))
        } else {
            column_sql(column)
        };

        if let Some(array) = array_bind(values) {
            let idx = self.bind(array);
            return SqlPredicate::Fragment(format!("{} = ANY(${})", column_expr, idx));
        }

        let alternatives: Vec<String> = values
            .iter()
            .map(|value| {
                let idx = self.bind(value.into());
                format!("{} = ${}", column_expr, idx)
            })
            .collect();
        SqlPredicate::Fragment(format!("({})", alternatives.join(" OR ")))
    }

    fn range(&mut self, column: &ColumnRef, min: Option<&Value>, max: Option<&Value>) -> SqlPredicate {
        let column = column_sql(column);
        let mut parts = Vec::new();
        if let Some(min) = min {
            let idx = self.bind(min.into());
            parts.push(format!("{} >= ${}", column, idx));
        }
        if let Some(max) = max {
            let idx = self.bind(max.into());
            parts.push(format!("{} <= ${}", column, idx));
        }
        match parts.len() {
            0 => self.always_true(),
            1 => SqlPredicate::Fragment(parts.remove(0)),
            _ => SqlPredicate::Fragment(format!("({})", parts.join(" AND "))),
        }
    }

    fn contains(&mut self, column: &ColumnRef, needle: &str) -> SqlPredicate {
        let idx = self.bind(BindValue::Text(like_pattern(needle)));
        SqlPredicate::Fragment(format!("LOWER({}) LIKE ${}", column_sql(column), idx))
    }

    fn join(&mut self, relation: &RelationDef) {
        if !self.joins.iter().any(|j| j.name == relation.name) {
            self.joins.push(relation.clone());
        }
    }
}
