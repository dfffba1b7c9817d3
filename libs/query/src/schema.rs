//! Per-entity registries: filterable fields, relations, sort allow-list,
//! free-text search columns and facets.
//!
//! Schemas are built once (typically behind a `OnceLock`) and are read-only
//! afterwards.

use std::collections::BTreeMap;
use std::fmt;

use crate::ast::CompareOp;
use crate::facet::{FacetDef, FacetKind};
use crate::sort::{SortAllowList, SortDirection, SortOrder};

/// Declared value kind of a filterable field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Uuid,
    Integer,
    Date,
    DateTime,
    Boolean,
    /// Closed set of canonical values, matched case-insensitively
    Enum(&'static [&'static str]),
}

impl FieldKind {
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Text => "string",
            FieldKind::Uuid => "uuid",
            FieldKind::Integer => "integer",
            FieldKind::Date => "date",
            FieldKind::DateTime => "date-time",
            FieldKind::Boolean => "boolean",
            FieldKind::Enum(_) => "enum",
        }
    }

    pub fn is_ordered(&self) -> bool {
        matches!(self, FieldKind::Integer | FieldKind::Date | FieldKind::DateTime)
    }

    /// Operators a field of this kind accepts unless narrowed explicitly
    pub fn default_operators(&self) -> OperatorSet {
        match self {
            FieldKind::Text | FieldKind::Enum(_) => OperatorSet::EQUALITY.with(Operator::In),
            FieldKind::Uuid => OperatorSet::EQUALITY.with(Operator::In),
            FieldKind::Boolean => OperatorSet::EQUALITY,
            FieldKind::Integer => OperatorSet::ORDERED
                .with(Operator::Range)
                .with(Operator::In),
            FieldKind::Date | FieldKind::DateTime => OperatorSet::ORDERED.with(Operator::Range),
        }
    }
}

/// Filter operator as seen by the operator allow-list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Range,
    In,
}

impl Operator {
    fn bit(self) -> u8 {
        1 << (self as u8)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Gt => "gt",
            Operator::Ge => "ge",
            Operator::Lt => "lt",
            Operator::Le => "le",
            Operator::Range => "range",
            Operator::In => "in",
        }
    }
}

impl From<CompareOp> for Operator {
    fn from(op: CompareOp) -> Self {
        match op {
            CompareOp::Eq => Operator::Eq,
            CompareOp::Ne => Operator::Ne,
            CompareOp::Gt => Operator::Gt,
            CompareOp::Ge => Operator::Ge,
            CompareOp::Lt => Operator::Lt,
            CompareOp::Le => Operator::Le,
        }
    }
}

/// Small bit set of [`Operator`]s
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OperatorSet(u8);

impl OperatorSet {
    pub const EMPTY: OperatorSet = OperatorSet(0);
    pub const EQUALITY: OperatorSet = OperatorSet(0b0000_0011);
    pub const ORDERED: OperatorSet = OperatorSet(0b0011_1111);

    pub fn with(self, op: Operator) -> Self {
        OperatorSet(self.0 | op.bit())
    }

    pub fn without(self, op: Operator) -> Self {
        OperatorSet(self.0 & !op.bit())
    }

    pub fn contains(&self, op: Operator) -> bool {
        self.0 & op.bit() != 0
    }
}

/// Column reference, optionally on a joined relation
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColumnRef {
    pub relation: Option<String>,
    pub column: String,
}

impl ColumnRef {
    pub fn root(column: impl Into<String>) -> Self {
        Self {
            relation: None,
            column: column.into(),
        }
    }

    pub fn on(relation: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            relation: Some(relation.into()),
            column: column.into(),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.relation {
            Some(relation) => write!(f, "{}.{}", relation, self.column),
            None => f.write_str(&self.column),
        }
    }
}

/// A filterable, sortable or facetable field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub column: ColumnRef,
    pub kind: FieldKind,
    pub operators: OperatorSet,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, column: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            column: ColumnRef::root(column),
            kind,
            operators: kind.default_operators(),
        }
    }

    /// Move the column onto a relation
    pub fn on(mut self, relation: impl Into<String>) -> Self {
        self.column.relation = Some(relation.into());
        self
    }

    pub fn operators(mut self, operators: OperatorSet) -> Self {
        self.operators = operators;
        self
    }

    pub fn without(mut self, op: Operator) -> Self {
        self.operators = self.operators.without(op);
        self
    }

    pub fn supports(&self, op: Operator) -> bool {
        self.operators.contains(op)
    }

    pub fn relation(&self) -> Option<&str> {
        self.column.relation.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

impl JoinKind {
    pub fn sql(&self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
        }
    }
}

/// Expandable relation: `local_column` on the root references
/// `target_column` of `table`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDef {
    pub name: String,
    pub target: String,
    pub table: String,
    pub local_column: String,
    pub target_column: String,
    pub join: JoinKind,
}

impl RelationDef {
    pub fn left(
        name: impl Into<String>,
        target: impl Into<String>,
        table: impl Into<String>,
        local_column: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            table: table.into(),
            local_column: local_column.into(),
            target_column: "id".to_string(),
            join: JoinKind::Left,
        }
    }

    pub fn inner(mut self) -> Self {
        self.join = JoinKind::Inner;
        self
    }
}

/// Columns matched by the free-text `search` parameter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchColumns {
    /// Case-insensitive substring match
    pub text_columns: Vec<ColumnRef>,
    /// Equality match when a term parses as `YYYY-MM-DD`
    pub date_columns: Vec<ColumnRef>,
}

impl SearchColumns {
    pub fn is_empty(&self) -> bool {
        self.text_columns.is_empty() && self.date_columns.is_empty()
    }
}

/// Query registry of a single entity type
#[derive(Debug, Clone)]
pub struct EntitySchema {
    pub name: String,
    pub table: String,
    pub primary_key: String,
    fields: BTreeMap<String, FieldDescriptor>,
    relations: BTreeMap<String, RelationDef>,
    sort: SortAllowList,
    default_sort: Vec<SortOrder>,
    search: SearchColumns,
    facets: Vec<FacetDef>,
}

impl EntitySchema {
    pub fn builder(name: &str, table: &str) -> EntitySchemaBuilder {
        EntitySchemaBuilder::new(name, table)
    }

    /// Exact, case-sensitive field lookup
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name)
    }

    /// Case-insensitive lookup, used for sort tokens
    pub fn field_ignore_case(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields
            .values()
            .find(|f| f.name.eq_ignore_ascii_case(name))
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.values()
    }

    pub fn relation(&self, name: &str) -> Option<&RelationDef> {
        self.relations.get(name)
    }

    pub fn relations(&self) -> impl Iterator<Item = &RelationDef> {
        self.relations.values()
    }

    pub fn relation_names(&self) -> Vec<String> {
        self.relations.keys().cloned().collect()
    }

    pub fn sort_allow_list(&self) -> &SortAllowList {
        &self.sort
    }

    pub fn default_sort(&self) -> &[SortOrder] {
        &self.default_sort
    }

    pub fn search(&self) -> &SearchColumns {
        &self.search
    }

    pub fn facets(&self) -> &[FacetDef] {
        &self.facets
    }
}

/// Builder for [`EntitySchema`]
pub struct EntitySchemaBuilder {
    schema: EntitySchema,
}

impl EntitySchemaBuilder {
    fn new(name: &str, table: &str) -> Self {
        Self {
            schema: EntitySchema {
                name: name.to_string(),
                table: table.to_string(),
                primary_key: "id".to_string(),
                fields: BTreeMap::new(),
                relations: BTreeMap::new(),
                sort: SortAllowList::default(),
                default_sort: Vec::new(),
                search: SearchColumns::default(),
                facets: Vec::new(),
            },
        }
    }

    pub fn primary_key(mut self, column: &str) -> Self {
        self.schema.primary_key = column.to_string();
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.schema.fields.insert(field.name.clone(), field);
        self
    }

    /// Register `alias` as another name for an existing field
    pub fn alias(mut self, alias: &str, field: &str) -> Self {
        match self.schema.fields.get(field).cloned() {
            Some(mut descriptor) => {
                descriptor.name = alias.to_string();
                self.schema.fields.insert(alias.to_string(), descriptor);
            }
            None => debug_assert!(false, "alias '{alias}' refers to unknown field '{field}'"),
        }
        self
    }

    /// Drop an operator from a registered field
    pub fn narrow(mut self, field: &str, op: Operator) -> Self {
        match self.schema.fields.get_mut(field) {
            Some(descriptor) => descriptor.operators = descriptor.operators.without(op),
            None => debug_assert!(false, "narrowing unknown field '{field}'"),
        }
        self
    }

    pub fn relation(mut self, relation: RelationDef) -> Self {
        self.schema.relations.insert(relation.name.clone(), relation);
        self
    }

    fn sort_order(&self, field: &str, direction: SortDirection) -> Option<SortOrder> {
        let descriptor = self.schema.fields.get(field);
        debug_assert!(descriptor.is_some(), "unknown sort field '{field}'");
        descriptor.map(|d| SortOrder::new(&d.name, d.column.clone(), direction))
    }

    /// Allow `<field>_asc` and `<field>_desc` for each listed field
    pub fn sortable(mut self, fields: &[&str]) -> Self {
        for field in fields {
            for direction in [SortDirection::Asc, SortDirection::Desc] {
                if let Some(order) = self.sort_order(field, direction) {
                    self.schema.sort.insert(order);
                }
            }
        }
        self
    }

    pub fn default_sort(mut self, field: &str, direction: SortDirection) -> Self {
        if let Some(order) = self.sort_order(field, direction) {
            self.schema.default_sort.push(order);
        }
        self
    }

    pub fn search_text(mut self, column: ColumnRef) -> Self {
        self.schema.search.text_columns.push(column);
        self
    }

    pub fn search_date(mut self, column: ColumnRef) -> Self {
        self.schema.search.date_columns.push(column);
        self
    }

    pub fn facet_counts(mut self, name: &str, field: &str) -> Self {
        debug_assert!(self.schema.fields.contains_key(field), "unknown facet field '{field}'");
        self.schema.facets.push(FacetDef::new(name, field, FacetKind::Counts));
        self
    }

    pub fn facet_range(mut self, name: &str, field: &str) -> Self {
        debug_assert!(self.schema.fields.contains_key(field), "unknown facet field '{field}'");
        self.schema.facets.push(FacetDef::new(name, field, FacetKind::Range));
        self
    }

    pub fn build(self) -> EntitySchema {
        self.schema
    }
}
