//! Predicate compiler: filter trees and search terms to backend predicates

use crate::ast::{CompareOp, FilterExpr};
use crate::backend::CriteriaBackend;
use crate::error::{Error, Result};
use crate::expand::ExpandSet;
use crate::schema::{EntitySchema, FieldDescriptor, FieldKind, Operator};
use crate::value::{parse_literal, search_terms, try_parse_date, unquote, Value};

/// A compiled predicate with the relations its columns live on
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFilter<P> {
    pub predicate: P,
    pub relations: ExpandSet,
}

struct Compiler<'a, B: CriteriaBackend> {
    schema: &'a EntitySchema,
    backend: &'a mut B,
    relations: ExpandSet,
}

impl<'a, B: CriteriaBackend> Compiler<'a, B> {
    fn field(&mut self, name: &str, op: Operator) -> Result<&'a FieldDescriptor> {
        let schema = self.schema;
        let descriptor = schema
            .field(name)
            .ok_or_else(|| Error::UnsupportedField(name.to_string()))?;
        if !descriptor.supports(op) {
            return Err(Error::UnsupportedOperator {
                field: name.to_string(),
                operator: op.as_str().to_string(),
            });
        }
        if let Some(relation) = descriptor.relation() {
            self.relations.insert(relation.to_string());
        }
        Ok(descriptor)
    }

    fn operand(descriptor: &FieldDescriptor, raw: &str) -> Result<Value> {
        let value = parse_literal(&descriptor.name, &descriptor.kind, &unquote(raw))?;
        Ok(match descriptor.kind {
            FieldKind::Text => value.to_lowercase(),
            _ => value,
        })
    }

    fn bound(descriptor: &FieldDescriptor, raw: &str) -> Result<Option<Value>> {
        if unquote(raw).is_empty() {
            return Ok(None);
        }
        Self::operand(descriptor, raw).map(Some)
    }

    fn compile(&mut self, expr: &FilterExpr) -> Result<B::Predicate> {
        match expr {
            FilterExpr::MatchAll => Ok(self.backend.always_true()),
            FilterExpr::And(clauses) => {
                let mut predicate = self.backend.always_true();
                for clause in clauses {
                    let next = self.compile(clause)?;
                    predicate = self.backend.and(predicate, next);
                }
                Ok(predicate)
            }
            FilterExpr::Or(clauses) => {
                let mut clauses = clauses.iter();
                let Some(first) = clauses.next() else {
                    return Ok(self.backend.always_true());
                };
                let mut predicate = self.compile(first)?;
                for clause in clauses {
                    let next = self.compile(clause)?;
                    predicate = self.backend.or(predicate, next);
                }
                Ok(predicate)
            }
            FilterExpr::Comparison { field, op, value } => {
                let descriptor = self.field(field, (*op).into())?;
                let value = Self::operand(descriptor, value)?;
                let case_insensitive = descriptor.kind == FieldKind::Text;
                Ok(self
                    .backend
                    .compare(&descriptor.column, *op, &value, case_insensitive))
            }
            FilterExpr::Range { field, min, max } => {
                let descriptor = self.field(field, Operator::Range)?;
                let min = Self::bound(descriptor, min)?;
                let max = Self::bound(descriptor, max)?;
                if min.is_none() && max.is_none() {
                    return Ok(self.backend.always_true());
                }
                Ok(self
                    .backend
                    .range(&descriptor.column, min.as_ref(), max.as_ref()))
            }
            FilterExpr::In { field, values } => {
                let descriptor = self.field(field, Operator::In)?;
                let values = values
                    .iter()
                    .map(|raw| Self::operand(descriptor, raw))
                    .collect::<Result<Vec<_>>>()?;
                let case_insensitive = descriptor.kind == FieldKind::Text;
                Ok(self
                    .backend
                    .in_list(&descriptor.column, &values, case_insensitive))
            }
        }
    }
}

/// Compile a parsed filter against an entity schema.
///
/// Unknown fields, operators outside the field's set and unparseable values
/// are reported as distinct errors. A range with both bounds empty matches
/// everything.
pub fn compile_filter<B: CriteriaBackend>(
    expr: &FilterExpr,
    schema: &EntitySchema,
    backend: &mut B,
) -> Result<CompiledFilter<B::Predicate>> {
    let mut compiler = Compiler {
        schema,
        backend,
        relations: ExpandSet::new(),
    };
    let predicate = compiler.compile(expr)?;
    Ok(CompiledFilter {
        predicate,
        relations: compiler.relations,
    })
}

/// Compile free-text search: every term must match one of the entity's
/// search columns. Date-shaped terms also match the search date columns.
pub fn compile_search<B: CriteriaBackend>(
    raw: &str,
    schema: &EntitySchema,
    backend: &mut B,
) -> CompiledFilter<B::Predicate> {
    let columns = schema.search();
    let terms = search_terms(raw);
    let mut relations = ExpandSet::new();

    if terms.is_empty() || columns.is_empty() {
        return CompiledFilter {
            predicate: backend.always_true(),
            relations,
        };
    }

    let mut predicate: Option<B::Predicate> = None;
    for term in &terms {
        let needle = term.to_lowercase();
        let mut alternatives: Option<B::Predicate> = None;

        for column in &columns.text_columns {
            let p = backend.contains(column, &needle);
            alternatives = Some(match alternatives {
                Some(acc) => backend.or(acc, p),
                None => p,
            });
            relations.extend(column.relation.clone());
        }
        if let Some(date) = try_parse_date(term) {
            for column in &columns.date_columns {
                let p = backend.compare(column, CompareOp::Eq, &Value::Date(date), false);
                alternatives = Some(match alternatives {
                    Some(acc) => backend.or(acc, p),
                    None => p,
                });
                relations.extend(column.relation.clone());
            }
        }

        let Some(term_predicate) = alternatives else {
            continue;
        };
        predicate = Some(match predicate {
            Some(acc) => backend.and(acc, term_predicate),
            None => term_predicate,
        });
    }

    CompiledFilter {
        predicate: predicate.unwrap_or_else(|| backend.always_true()),
        relations,
    }
}
