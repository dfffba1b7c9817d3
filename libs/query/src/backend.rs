//! Storage backend seam.
//!
//! The compiler turns a filter tree into calls on a [`CriteriaBackend`]; the
//! SQL backend renders fragments with bind parameters, the in-memory backend
//! builds an evaluable predicate.

use crate::ast::CompareOp;
use crate::schema::{ColumnRef, RelationDef};
use crate::value::Value;

pub trait CriteriaBackend {
    type Predicate: Clone;

    fn always_true(&mut self) -> Self::Predicate;

    fn and(&mut self, left: Self::Predicate, right: Self::Predicate) -> Self::Predicate;

    fn or(&mut self, left: Self::Predicate, right: Self::Predicate) -> Self::Predicate;

    /// `case_insensitive` compares the lower-cased stored value; the operand
    /// is already lower-cased.
    fn compare(
        &mut self,
        column: &ColumnRef,
        op: CompareOp,
        value: &Value,
        case_insensitive: bool,
    ) -> Self::Predicate;

    fn in_list(&mut self, column: &ColumnRef, values: &[Value], case_insensitive: bool) -> Self::Predicate;

    /// Inclusive bounds; at least one bound is present
    fn range(&mut self, column: &ColumnRef, min: Option<&Value>, max: Option<&Value>) -> Self::Predicate;

    /// Case-insensitive substring match; `needle` is lower-cased
    fn contains(&mut self, column: &ColumnRef, needle: &str) -> Self::Predicate;

    /// Register a relation join needed by the query
    fn join(&mut self, relation: &RelationDef);
}
