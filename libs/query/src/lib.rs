//! List query engine - filter, sort, expand and facets for admin list endpoints
//!
//! Every list endpoint accepts the same textual parameters and compiles them
//! against a per-entity [`EntitySchema`]:
//!
//! ```text
//! filter / sort / expand / search strings
//!      |
//!   Lexer -> Tokens -> Parser -> FilterExpr      (expand-gated)
//!      |
//! Compiler (EntitySchema) -> CriteriaBackend predicate
//!      |
//! QueryPlan (joins, total sort, page) -> store -> rows + facets
//! ```
//!
//! Storage is abstracted behind [`CriteriaBackend`]; [`memory`] provides an
//! in-process implementation.

pub mod ast;
pub mod backend;
pub mod compile;
pub mod error;
pub mod expand;
pub mod facet;
pub mod lexer;
pub mod memory;
pub mod page;
pub mod parser;
pub mod plan;
pub mod schema;
pub mod sort;
pub mod token;
pub mod value;

// Re-export main types
pub use ast::{CompareOp, FilterExpr};
pub use backend::CriteriaBackend;
pub use compile::{compile_filter, compile_search, CompiledFilter};
pub use error::{Error, Result};
pub use expand::{parse_expand, parse_expand_unvalidated, required_relations, ExpandSet};
pub use facet::{FacetDef, FacetKind, FacetOption, FacetRange, FacetResult};
pub use lexer::tokenize;
pub use page::{OffsetPage, PageLimits, PageLinks};
pub use parser::{parse_filter, ParsedFilter};
pub use plan::{plan_list_query, ListQuery, QueryPlan};
pub use schema::{
    ColumnRef, EntitySchema, FieldDescriptor, FieldKind, JoinKind, Operator, OperatorSet, RelationDef,
};
pub use sort::{join_sort_params, parse_sort, parse_sort_with_expand, ParsedSort, SortDirection, SortOrder};
pub use value::Value;
