//! Filter expression tree

use std::fmt;

/// Binary comparison operators of the filter language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CompareOp {
    pub fn parse(op: &str) -> Option<Self> {
        match op.to_ascii_lowercase().as_str() {
            "eq" => Some(CompareOp::Eq),
            "ne" => Some(CompareOp::Ne),
            "gt" => Some(CompareOp::Gt),
            "ge" => Some(CompareOp::Ge),
            "lt" => Some(CompareOp::Lt),
            "le" => Some(CompareOp::Le),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "eq",
            CompareOp::Ne => "ne",
            CompareOp::Gt => "gt",
            CompareOp::Ge => "ge",
            CompareOp::Lt => "lt",
            CompareOp::Le => "le",
        }
    }

    /// SQL spelling of the operator
    pub fn sql(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
        }
    }

    pub fn is_ordering(&self) -> bool {
        !matches!(self, CompareOp::Eq | CompareOp::Ne)
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed filter expression. Values are kept as the raw token text and only
/// interpreted when compiled against an entity schema.
///
/// Connectives are n-ary: a chain `a and b and c` is one `And` with three
/// clauses, so tree depth follows parenthesis nesting only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterExpr {
    MatchAll,
    /// At least two clauses, none of them `And` or `MatchAll`
    And(Vec<FilterExpr>),
    /// At least two clauses, none of them `Or` or `MatchAll`
    Or(Vec<FilterExpr>),
    Comparison {
        field: String,
        op: CompareOp,
        value: String,
    },
    /// Either bound may be empty (open interval)
    Range {
        field: String,
        min: String,
        max: String,
    },
    In {
        field: String,
        values: Vec<String>,
    },
}

impl FilterExpr {
    /// Conjunction; `MatchAll` is the identity and nested conjunctions are
    /// flattened.
    pub fn and(left: FilterExpr, right: FilterExpr) -> Self {
        match (left, right) {
            (FilterExpr::MatchAll, other) | (other, FilterExpr::MatchAll) => other,
            (FilterExpr::And(mut clauses), FilterExpr::And(rest)) => {
                clauses.extend(rest);
                FilterExpr::And(clauses)
            }
            (FilterExpr::And(mut clauses), other) => {
                clauses.push(other);
                FilterExpr::And(clauses)
            }
            (other, FilterExpr::And(mut clauses)) => {
                clauses.insert(0, other);
                FilterExpr::And(clauses)
            }
            (left, right) => FilterExpr::And(vec![left, right]),
        }
    }

    /// Disjunction; `MatchAll` absorbs and nested disjunctions are flattened.
    pub fn or(left: FilterExpr, right: FilterExpr) -> Self {
        match (left, right) {
            (FilterExpr::MatchAll, _) | (_, FilterExpr::MatchAll) => FilterExpr::MatchAll,
            (FilterExpr::Or(mut clauses), FilterExpr::Or(rest)) => {
                clauses.extend(rest);
                FilterExpr::Or(clauses)
            }
            (FilterExpr::Or(mut clauses), other) => {
                clauses.push(other);
                FilterExpr::Or(clauses)
            }
            (other, FilterExpr::Or(mut clauses)) => {
                clauses.insert(0, other);
                FilterExpr::Or(clauses)
            }
            (left, right) => FilterExpr::Or(vec![left, right]),
        }
    }

    pub fn is_match_all(&self) -> bool {
        matches!(self, FilterExpr::MatchAll)
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    write!(f, "'{}'", value.replace('\'', "\\'"))
}

fn write_clauses(
    f: &mut fmt::Formatter<'_>,
    clauses: &[FilterExpr],
    connective: &str,
) -> fmt::Result {
    f.write_str("(")?;
    for (i, clause) in clauses.iter().enumerate() {
        if i > 0 {
            write!(f, " {connective} ")?;
        }
        write!(f, "{clause}")?;
    }
    f.write_str(")")
}

impl fmt::Display for FilterExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // The blank filter
            FilterExpr::MatchAll => Ok(()),
            FilterExpr::And(clauses) => write_clauses(f, clauses, "and"),
            FilterExpr::Or(clauses) => write_clauses(f, clauses, "or"),
            FilterExpr::Comparison { field, op, value } => {
                write!(f, "{field} {op} ")?;
                write_quoted(f, value)
            }
            FilterExpr::Range { field, min, max } => {
                write!(f, "{field} range ")?;
                write_quoted(f, min)?;
                f.write_str(" to ")?;
                write_quoted(f, max)
            }
            FilterExpr::In { field, values } => {
                write!(f, "{field} in (")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write_quoted(f, value)?;
                }
                f.write_str(")")
            }
        }
    }
}
