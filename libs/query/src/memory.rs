//! In-memory backend: evaluates compiled predicates over [`Record`]s.
//!
//! Used by tests and tools that run list queries without a database. Null
//! handling follows SQL: any comparison against a missing value is false.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;

use crate::ast::CompareOp;
use crate::backend::CriteriaBackend;
use crate::error::Result;
use crate::facet::{count_values, resolve_facet_field, value_range, FacetDef, FacetKind, FacetResult};
use crate::plan::QueryPlan;
use crate::schema::{ColumnRef, JoinKind, RelationDef};
use crate::sort::{SortDirection, SortOrder};
use crate::value::Value;

/// A row: column values plus related rows keyed by relation name
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Record {
    pub values: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub relations: BTreeMap<String, Record>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.values.insert(column.to_string(), value.into());
        self
    }

    pub fn with_relation(mut self, relation: &str, record: Record) -> Self {
        self.relations.insert(relation.to_string(), record);
        self
    }

    pub fn get(&self, column: &ColumnRef) -> Option<&Value> {
        match &column.relation {
            Some(relation) => self.relations.get(relation)?.values.get(&column.column),
            None => self.values.get(&column.column),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemoryPredicate {
    True,
    /// Flat: never directly contains another `And`
    And(Vec<MemoryPredicate>),
    /// Flat: never directly contains another `Or`
    Or(Vec<MemoryPredicate>),
    Compare {
        column: ColumnRef,
        op: CompareOp,
        value: Value,
        case_insensitive: bool,
    },
    In {
        column: ColumnRef,
        values: Vec<Value>,
        case_insensitive: bool,
    },
    Range {
        column: ColumnRef,
        min: Option<Value>,
        max: Option<Value>,
    },
    Contains {
        column: ColumnRef,
        needle: String,
    },
}

fn stored(record: &Record, column: &ColumnRef, case_insensitive: bool) -> Option<Value> {
    let value = record.get(column)?;
    Some(if case_insensitive {
        value.to_lowercase()
    } else {
        value.clone()
    })
}

impl MemoryPredicate {
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            MemoryPredicate::True => true,
            MemoryPredicate::And(clauses) => clauses.iter().all(|p| p.matches(record)),
            MemoryPredicate::Or(clauses) => clauses.iter().any(|p| p.matches(record)),
            MemoryPredicate::Compare {
                column,
                op,
                value,
                case_insensitive,
            } => {
                let Some(actual) = stored(record, column, *case_insensitive) else {
                    return false;
                };
                let Some(ordering) = actual.compare(value) else {
                    return false;
                };
                match op {
                    CompareOp::Eq => ordering == Ordering::Equal,
                    CompareOp::Ne => ordering != Ordering::Equal,
                    CompareOp::Gt => ordering == Ordering::Greater,
                    CompareOp::Ge => ordering != Ordering::Less,
                    CompareOp::Lt => ordering == Ordering::Less,
                    CompareOp::Le => ordering != Ordering::Greater,
                }
            }
            MemoryPredicate::In {
                column,
                values,
                case_insensitive,
            } => stored(record, column, *case_insensitive)
                .is_some_and(|actual| values.contains(&actual)),
            MemoryPredicate::Range { column, min, max } => {
                let Some(actual) = record.get(column) else {
                    return false;
                };
                let above = min
                    .as_ref()
                    .map_or(true, |min| actual.compare(min).is_some_and(|o| o != Ordering::Less));
                let below = max
                    .as_ref()
                    .map_or(true, |max| actual.compare(max).is_some_and(|o| o != Ordering::Greater));
                above && below
            }
            MemoryPredicate::Contains { column, needle } => match record.get(column) {
                Some(Value::Text(text)) => text.to_lowercase().contains(needle.as_str()),
                _ => false,
            },
        }
    }
}

/// [`CriteriaBackend`] producing [`MemoryPredicate`]s
#[derive(Debug, Default)]
pub struct MemoryBackend {
    joins: Vec<RelationDef>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn joins(&self) -> &[RelationDef] {
        &self.joins
    }
}

impl CriteriaBackend for MemoryBackend {
    type Predicate = MemoryPredicate;

    fn always_true(&mut self) -> MemoryPredicate {
        MemoryPredicate::True
    }

    fn and(&mut self, left: MemoryPredicate, right: MemoryPredicate) -> MemoryPredicate {
        match (left, right) {
            (MemoryPredicate::True, other) | (other, MemoryPredicate::True) => other,
            (MemoryPredicate::And(mut clauses), MemoryPredicate::And(rest)) => {
                clauses.extend(rest);
                MemoryPredicate::And(clauses)
            }
            (MemoryPredicate::And(mut clauses), other) => {
                clauses.push(other);
                MemoryPredicate::And(clauses)
            }
            (other, MemoryPredicate::And(mut clauses)) => {
                clauses.insert(0, other);
                MemoryPredicate::And(clauses)
            }
            (l, r) => MemoryPredicate::And(vec![l, r]),
        }
    }

    fn or(&mut self, left: MemoryPredicate, right: MemoryPredicate) -> MemoryPredicate {
        match (left, right) {
            (MemoryPredicate::True, _) | (_, MemoryPredicate::True) => MemoryPredicate::True,
            (MemoryPredicate::Or(mut clauses), MemoryPredicate::Or(rest)) => {
                clauses.extend(rest);
                MemoryPredicate::Or(clauses)
            }
            (MemoryPredicate::Or(mut clauses), other) => {
                clauses.push(other);
                MemoryPredicate::Or(clauses)
            }
            (other, MemoryPredicate::Or(mut clauses)) => {
                clauses.insert(0, other);
                MemoryPredicate::Or(clauses)
            }
            (l, r) => MemoryPredicate::Or(vec![l, r]),
        }
    }

    fn compare(
        &mut self,
        column: &ColumnRef,
        op: CompareOp,
        value: &Value,
        case_insensitive: bool,
    ) -> MemoryPredicate {
        MemoryPredicate::Compare {
            column: column.clone(),
            op,
            value: value.clone(),
            case_insensitive,
        }
    }

    fn in_list(&mut self, column: &ColumnRef, values: &[Value], case_insensitive: bool) -> MemoryPredicate {
        MemoryPredicate::In {
            column: column.clone(),
            values: values.to_vec(),
            case_insensitive,
        }
    }

    fn range(&mut self, column: &ColumnRef, min: Option<&Value>, max: Option<&Value>) -> MemoryPredicate {
        MemoryPredicate::Range {
            column: column.clone(),
            min: min.cloned(),
            max: max.cloned(),
        }
    }

    fn contains(&mut self, column: &ColumnRef, needle: &str) -> MemoryPredicate {
        MemoryPredicate::Contains {
            column: column.clone(),
            needle: needle.to_string(),
        }
    }

    fn join(&mut self, relation: &RelationDef) {
        if !self.joins.contains(relation) {
            self.joins.push(relation.clone());
        }
    }
}

/// Nulls sort last ascending and first descending, like PostgreSQL
fn compare_for_sort(a: &Record, b: &Record, orders: &[SortOrder]) -> Ordering {
    for order in orders {
        let ordering = match (a.get(&order.column), b.get(&order.column)) {
            (Some(x), Some(y)) => x.cmp(y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        let ordering = match order.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// A table of records queried through [`QueryPlan`]s
#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
    records: Vec<Record>,
}

impl MemoryTable {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn insert(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows surviving inner joins and the predicate
    fn filtered(&self, plan: &QueryPlan<'_, MemoryPredicate>) -> Vec<&Record> {
        self.records
            .iter()
            .filter(|record| {
                plan.joins
                    .iter()
                    .filter(|join| join.join == JoinKind::Inner)
                    .all(|join| record.relations.contains_key(&join.name))
                    && plan.predicate.matches(record)
            })
            .collect()
    }

    /// One page in plan order
    pub fn fetch(&self, plan: &QueryPlan<'_, MemoryPredicate>) -> Vec<&Record> {
        let mut rows = self.filtered(plan);
        rows.sort_by(|a, b| compare_for_sort(a, b, &plan.sort));
        rows.into_iter()
            .skip(usize::try_from(plan.page.skip()).unwrap_or(usize::MAX))
            .take(usize::try_from(plan.page.top()).unwrap_or(usize::MAX))
            .collect()
    }

    pub fn count(&self, plan: &QueryPlan<'_, MemoryPredicate>) -> i64 {
        self.filtered(plan).len() as i64
    }

    /// Facet over the filtered rows, ignoring sort and paging
    pub fn facet(&self, plan: &QueryPlan<'_, MemoryPredicate>, facet: &FacetDef) -> Result<FacetResult> {
        let field = resolve_facet_field(plan.schema, facet)?;
        let rows = self.filtered(plan);
        let values = rows.iter().map(|record| record.get(&field.column));
        Ok(match facet.kind {
            FacetKind::Counts => FacetResult::Counts(count_values(values)),
            FacetKind::Range => FacetResult::Range(value_range(values)),
        })
    }
}
