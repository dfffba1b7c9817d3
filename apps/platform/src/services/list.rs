//! List service - generic list endpoint implementation
//!
//! Orchestrates a list request by:
//! - Planning the query (expand, filter, sort, paging) before touching storage
//! - Fetching one page, the total count and the entity's facets
//! - Assembling the response

use std::collections::BTreeMap;

use async_trait::async_trait;
use bfg_query::{
    plan_list_query, CriteriaBackend, FacetDef, FacetResult, ListQuery, PageLimits, PageLinks, QueryPlan,
};
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::config::QueryConfig;
use crate::entities::EntityKind;
use crate::Result;

/// Storage that executes planned list queries
///
/// A fresh `Backend` compiles each request; the store receives it back
/// alongside the plan so it can read whatever the compilation collected.
#[async_trait]
pub trait ListStore: Send + Sync {
    type Predicate: Clone + Send + Sync;
    type Backend: CriteriaBackend<Predicate = Self::Predicate> + Default + Send + Sync;

    /// Rows of one page, in plan order
    async fn fetch_page(
        &self,
        plan: &QueryPlan<'_, Self::Predicate>,
        backend: &Self::Backend,
    ) -> Result<Vec<JsonValue>>;

    /// Size of the filtered set, ignoring paging
    async fn count(&self, plan: &QueryPlan<'_, Self::Predicate>, backend: &Self::Backend) -> Result<i64>;

    async fn facet(
        &self,
        plan: &QueryPlan<'_, Self::Predicate>,
        backend: &Self::Backend,
        facet: &FacetDef,
    ) -> Result<FacetResult>;
}

/// One page of a list endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ListResult {
    pub items: Vec<JsonValue>,
    /// Matching rows across all pages
    pub total: i64,
    pub skip: i64,
    pub top: i64,
    /// Offsets of the neighbouring pages
    pub links: PageLinks,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub facets: BTreeMap<String, FacetResult>,
}

/// List service coordinating planning and storage
pub struct ListService<S> {
    store: S,
    limits: PageLimits,
    facets_enabled: bool,
}

impl<S: ListStore> ListService<S> {
    pub fn new(store: S, config: &QueryConfig) -> Self {
        Self {
            store,
            limits: config.limits(),
            facets_enabled: config.facets_enabled,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run a list request against `entity`
    ///
    /// Every parameter is validated before the first storage call; a
    /// rejected request never reaches the store.
    #[tracing::instrument(name = "list", skip_all, fields(entity = %entity))]
    pub async fn list(&self, entity: EntityKind, query: &ListQuery) -> Result<ListResult> {
        let schema = entity.schema();
        let mut backend = S::Backend::default();

        let plan = match plan_list_query(schema, query, &mut backend, &self.limits) {
            Ok(plan) => plan,
            Err(e) => {
                tracing::warn!(error = %e, "Rejected list request");
                return Err(e.into());
            }
        };

        let items = self.store.fetch_page(&plan, &backend).await?;
        let total = self.store.count(&plan, &backend).await?;

        let mut facets = BTreeMap::new();
        if self.facets_enabled {
            for facet in schema.facets() {
                let result = self.store.facet(&plan, &backend, facet).await?;
                facets.insert(facet.name.clone(), result);
            }
        }

        tracing::debug!(
            returned = items.len(),
            total,
            facets = facets.len(),
            "List request completed"
        );

        Ok(ListResult {
            items,
            total,
            skip: plan.page.skip(),
            top: plan.page.top(),
            links: plan.page.links(total),
            facets,
        })
    }
}
