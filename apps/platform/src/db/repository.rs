//! PostgreSQL list store

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use bfg_query::facet::resolve_facet_field;
use bfg_query::{FacetDef, FacetKind, FacetOption, FacetRange, FacetResult, FieldKind, QueryPlan, Value};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{PgPool, Row};

use crate::config::DatabaseConfig;
use crate::db::query_builder::{build_count_query, build_facet_query, build_page_query};
use crate::db::sql::{BindValue, SqlBackend, SqlPredicate};
use crate::services::ListStore;
use crate::{Error, Result};

/// Bind every parameter of a rendered statement, in `$n` order
macro_rules! bind_all {
    ($query:expr, $params:expr) => {{
        let mut query = $query;
        for value in $params {
            query = match value {
                BindValue::Text(v) => query.bind(v),
                BindValue::TextArray(vs) => query.bind(vs),
                BindValue::Uuid(v) => query.bind(v),
                BindValue::UuidArray(vs) => query.bind(vs),
                BindValue::Integer(v) => query.bind(v),
                BindValue::IntegerArray(vs) => query.bind(vs),
                BindValue::Date(v) => query.bind(v),
                BindValue::DateTime(v) => query.bind(v),
                BindValue::Boolean(v) => query.bind(v),
            };
        }
        query
    }};
}

/// Connection pool with the configured statement timeout applied to every
/// session
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    let options = PgConnectOptions::from_str(&config.url)
        .map_err(|e| Error::Config(format!("Invalid database url: {}", e)))?
        .options([("statement_timeout", config.statement_timeout_ms.to_string())]);

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect_with(options)
        .await?;

    tracing::info!(
        max_connections = config.max_connections,
        "Database connection pool created"
    );
    Ok(pool)
}

#[derive(Clone)]
pub struct PgListStore {
    pool: PgPool,
}

impl PgListStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn facet_range(&self, sql: &str, params: Vec<BindValue>, kind: &FieldKind) -> Result<FacetRange> {
        let row = bind_all!(sqlx::query(sql), params)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;

        let range = match kind {
            FieldKind::Integer => FacetRange {
                min: row.try_get::<Option<i64>, _>("min")?.map(Value::Integer),
                max: row.try_get::<Option<i64>, _>("max")?.map(Value::Integer),
            },
            FieldKind::Date => FacetRange {
                min: row.try_get::<Option<NaiveDate>, _>("min")?.map(Value::Date),
                max: row.try_get::<Option<NaiveDate>, _>("max")?.map(Value::Date),
            },
            FieldKind::DateTime => FacetRange {
                min: row.try_get::<Option<DateTime<Utc>>, _>("min")?.map(Value::DateTime),
                max: row.try_get::<Option<DateTime<Utc>>, _>("max")?.map(Value::DateTime),
            },
            other => {
                return Err(Error::Internal(format!(
                    "range facet over unordered kind {}",
                    other.name()
                )))
            }
        };
        Ok(range)
    }
}

#[async_trait]
impl ListStore for PgListStore {
    type Predicate = SqlPredicate;
    type Backend = SqlBackend;

    async fn fetch_page(
        &self,
        plan: &QueryPlan<'_, SqlPredicate>,
        backend: &SqlBackend,
    ) -> Result<Vec<JsonValue>> {
        let statement = build_page_query(plan, backend.bind_params());
        tracing::debug!(sql = %statement.sql, "Executing page query");

        let rows = bind_all!(sqlx::query(&statement.sql), statement.bind_params)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        let items = rows
            .iter()
            .map(|row| row.try_get::<JsonValue, _>("item"))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(items)
    }

    async fn count(&self, plan: &QueryPlan<'_, SqlPredicate>, backend: &SqlBackend) -> Result<i64> {
        let statement = build_count_query(plan, backend.bind_params());

        let total = bind_all!(sqlx::query_scalar::<_, i64>(&statement.sql), statement.bind_params)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(total)
    }

    async fn facet(
        &self,
        plan: &QueryPlan<'_, SqlPredicate>,
        backend: &SqlBackend,
        facet: &FacetDef,
    ) -> Result<FacetResult> {
        let statement = build_facet_query(plan, backend.bind_params(), facet)?;

        match facet.kind {
            FacetKind::Counts => {
                let rows = bind_all!(
                    sqlx::query_as::<_, (String, i64)>(&statement.sql),
                    statement.bind_params
                )
                .fetch_all(&self.pool)
                .await
                .map_err(Error::Database)?;

                Ok(FacetResult::Counts(
                    rows.into_iter()
                        .map(|(value, count)| FacetOption { value, count })
                        .collect(),
                ))
            }
            FacetKind::Range => {
                let field = resolve_facet_field(plan.schema, facet)?;
                let range = self
                    .facet_range(&statement.sql, statement.bind_params, &field.kind)
                    .await?;
                Ok(FacetResult::Range(range))
            }
        }
    }
}
