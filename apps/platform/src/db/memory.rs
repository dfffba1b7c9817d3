//! In-process list store backed by [`MemoryTable`]s
//!
//! Runs the same plans as the PostgreSQL store; used by tests and for
//! local experiments without a database.

use std::collections::HashMap;

use async_trait::async_trait;
use bfg_query::memory::{MemoryBackend, MemoryPredicate, MemoryTable, Record};
use bfg_query::{FacetDef, FacetResult, QueryPlan};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::entities::EntityKind;
use crate::services::ListStore;
use crate::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct MemoryListStore {
    tables: HashMap<String, MemoryTable>,
}

impl MemoryListStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the rows of `entity`
    pub fn with_table(mut self, entity: EntityKind, records: Vec<Record>) -> Self {
        self.tables
            .insert(entity.schema().name.clone(), MemoryTable::new(records));
        self
    }

    pub fn insert(&mut self, entity: EntityKind, record: Record) {
        self.tables
            .entry(entity.schema().name.clone())
            .or_default()
            .insert(record);
    }

    fn table(&self, plan: &QueryPlan<'_, MemoryPredicate>) -> Option<&MemoryTable> {
        self.tables.get(&plan.schema.name)
    }
}

/// Row as JSON; only requested relations are embedded, absent ones as null
fn record_json(record: &Record, plan: &QueryPlan<'_, MemoryPredicate>) -> Result<JsonValue> {
    let mut object = values_json(record)?;
    for relation in &plan.requested_expand {
        let embedded = match record.relations.get(relation) {
            Some(related) => JsonValue::Object(values_json(related)?),
            None => JsonValue::Null,
        };
        object.insert(relation.clone(), embedded);
    }
    Ok(JsonValue::Object(object))
}

fn values_json(record: &Record) -> Result<Map<String, JsonValue>> {
    record
        .values
        .iter()
        .map(|(column, value)| Ok((column.clone(), column_json(column, value)?)))
        .collect()
}

fn column_json<T: Serialize>(column: &str, value: &T) -> Result<JsonValue> {
    serde_json::to_value(value)
        .map_err(|e| Error::Internal(format!("Failed to serialize column '{column}': {e}")))
}

#[async_trait]
impl ListStore for MemoryListStore {
    type Predicate = MemoryPredicate;
    type Backend = MemoryBackend;

    async fn fetch_page(
        &self,
        plan: &QueryPlan<'_, MemoryPredicate>,
        _backend: &MemoryBackend,
    ) -> Result<Vec<JsonValue>> {
        let Some(table) = self.table(plan) else {
            return Ok(Vec::new());
        };
        table
            .fetch(plan)
            .into_iter()
            .map(|record| record_json(record, plan))
            .collect()
    }

    async fn count(&self, plan: &QueryPlan<'_, MemoryPredicate>, _backend: &MemoryBackend) -> Result<i64> {
        Ok(self.table(plan).map_or(0, |table| table.count(plan)))
    }

    async fn facet(
        &self,
        plan: &QueryPlan<'_, MemoryPredicate>,
        _backend: &MemoryBackend,
        facet: &FacetDef,
    ) -> Result<FacetResult> {
        let empty = MemoryTable::default();
        let table = self.table(plan).unwrap_or(&empty);
        Ok(table.facet(plan, facet)?)
    }
}
