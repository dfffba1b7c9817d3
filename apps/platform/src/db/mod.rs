//! Database layer: SQL rendering and list stores

pub mod memory;
pub mod query_builder;
pub mod repository;
pub mod sql;

pub use memory::MemoryListStore;
pub use query_builder::SqlStatement;
pub use repository::{create_pool, PgListStore};
pub use sql::{BindValue, SqlBackend, SqlPredicate};

use bfg_query::{plan_list_query, ListQuery, PageLimits};
use serde::Serialize;

use crate::entities::EntityKind;
use crate::Result;

/// Every statement a list request would execute
#[derive(Debug, Clone, Serialize)]
pub struct Explain {
    pub page: SqlStatement,
    pub count: SqlStatement,
    pub facets: Vec<(String, SqlStatement)>,
}

/// Plan and render a list request without touching the database
pub fn explain(entity: EntityKind, query: &ListQuery, limits: &PageLimits) -> Result<Explain> {
    let schema = entity.schema();
    let mut backend = SqlBackend::new();
    let plan = plan_list_query(schema, query, &mut backend, limits)?;

    let facets = schema
        .facets()
        .iter()
        .map(|facet| {
            query_builder::build_facet_query(&plan, backend.bind_params(), facet)
                .map(|statement| (facet.name.clone(), statement))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Explain {
        page: query_builder::build_page_query(&plan, backend.bind_params()),
        count: query_builder::build_count_query(&plan, backend.bind_params()),
        facets,
    })
}
