//! Filter parser - converts token streams to filter expression trees
//!
//! Recursive descent parser. Precedence (lowest to highest):
//! 1. or
//! 2. and
//! 3. parenthesized group / comparison
//!
//! Comparisons on dotted fields (`athlete.dateOfBirth`) are only kept when
//! the relation was requested through expand; otherwise the clause is
//! replaced by an always-true expression.

use crate::ast::{CompareOp, FilterExpr};
use crate::error::{Error, Result};
use crate::expand::ExpandSet;
use crate::lexer::tokenize;
use crate::token::{Token, TokenType};

const MAX_GROUP_DEPTH: usize = 64;

/// Parse result: the expression plus the relations its kept clauses reference
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFilter {
    pub expr: FilterExpr,
    pub used_expand: ExpandSet,
}

impl ParsedFilter {
    pub fn match_all() -> Self {
        Self {
            expr: FilterExpr::MatchAll,
            used_expand: ExpandSet::new(),
        }
    }
}

/// Parser for filter token streams
pub struct Parser<'a> {
    tokens: Vec<Token>,
    current: usize,
    requested_expand: &'a ExpandSet,
    used_expand: ExpandSet,
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Create a parser over a token stream produced by [`tokenize`]
    pub fn new(mut tokens: Vec<Token>, requested_expand: &'a ExpandSet) -> Self {
        if !tokens.last().is_some_and(|t| t.is(TokenType::Eof)) {
            let end = tokens
                .last()
                .map(|t| t.position + t.value.chars().count())
                .unwrap_or(0);
            tokens.push(Token::eof(end));
        }
        Self {
            tokens,
            current: 0,
            requested_expand,
            used_expand: ExpandSet::new(),
            depth: 0,
        }
    }

    fn peek(&self) -> &Token {
        // The stream always ends with Eof and the cursor never moves past it
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !token.is(TokenType::Eof) {
            self.current += 1;
        }
        token
    }

    fn describe(token: &Token) -> String {
        match token.token_type {
            TokenType::Eof => "end of input".to_string(),
            _ => format!("'{}'", token.value),
        }
    }

    fn unexpected(&self, expected: &str) -> Error {
        let token = self.peek();
        Error::syntax(
            format!(
                "Expected {} but found {} at position {}",
                expected,
                Self::describe(token),
                token.position
            ),
            token.position,
        )
    }

    fn expect(&mut self, token_type: TokenType, expected: &str) -> Result<Token> {
        if self.peek().is(token_type) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(expected))
        }
    }

    /// Parse the whole stream; trailing tokens are rejected
    pub fn parse(mut self) -> Result<ParsedFilter> {
        let expr = self.parse_or_expression()?;

        let token = self.peek();
        if !token.is(TokenType::Eof) {
            return Err(Error::syntax(
                format!(
                    "Unexpected token {} at position {}",
                    Self::describe(token),
                    token.position
                ),
                token.position,
            ));
        }

        Ok(ParsedFilter {
            expr,
            used_expand: self.used_expand,
        })
    }

    fn parse_or_expression(&mut self) -> Result<FilterExpr> {
        let mut left = self.parse_and_expression()?;
        while self.peek().is(TokenType::Or) {
            self.advance();
            let right = self.parse_and_expression()?;
            left = FilterExpr::or(left, right);
        }
        Ok(left)
    }

    fn parse_and_expression(&mut self) -> Result<FilterExpr> {
        let mut left = self.parse_unary()?;
        while self.peek().is(TokenType::And) {
            self.advance();
            let right = self.parse_unary()?;
            left = FilterExpr::and(left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<FilterExpr> {
        if !self.peek().is(TokenType::LeftParen) {
            return self.parse_comparison();
        }

        let open = self.advance();
        self.depth += 1;
        if self.depth > MAX_GROUP_DEPTH {
            return Err(Error::syntax(
                format!(
                    "Expression too deeply nested (max depth: {}) at position {}",
                    MAX_GROUP_DEPTH, open.position
                ),
                open.position,
            ));
        }
        let inner = self.parse_or_expression()?;
        self.expect(TokenType::RightParen, "')'")?;
        self.depth -= 1;
        Ok(inner)
    }

    fn parse_comparison(&mut self) -> Result<FilterExpr> {
        let field = self.expect(TokenType::Field, "field name")?.value;

        let expr = if self.peek().is_word("range") {
            self.advance();
            self.parse_range(field.clone())?
        } else if self.peek().is(TokenType::ComparisonOp) {
            let op_token = self.advance();
            match CompareOp::parse(&op_token.value) {
                Some(op) => FilterExpr::Comparison {
                    field: field.clone(),
                    op,
                    value: self.parse_value()?,
                },
                None => self.parse_in(field.clone())?,
            }
        } else {
            return Err(self.unexpected(&format!("operator after '{field}'")));
        };

        if let Some((relation, _)) = field.split_once('.') {
            if !self.requested_expand.contains(relation) {
                tracing::debug!(
                    field = %field,
                    relation = %relation,
                    "Dropping filter clause on relation that was not expanded"
                );
                return Ok(FilterExpr::MatchAll);
            }
            self.used_expand.insert(relation.to_string());
        }

        Ok(expr)
    }

    /// A value is a quoted/bare literal or a bare identifier
    fn parse_value(&mut self) -> Result<String> {
        match self.peek().token_type {
            TokenType::Value | TokenType::Field => Ok(self.advance().value),
            _ => Err(self.unexpected("value")),
        }
    }

    fn ends_clause(token: &Token) -> bool {
        matches!(
            token.token_type,
            TokenType::Eof | TokenType::RightParen | TokenType::And | TokenType::Or
        )
    }

    fn parse_range(&mut self, field: String) -> Result<FilterExpr> {
        let min = if self.peek().is_word("to") {
            String::new()
        } else {
            self.parse_value()?
        };

        if !self.peek().is_word("to") {
            return Err(self.unexpected("'to' in range"));
        }
        self.advance();

        let max = if Self::ends_clause(self.peek()) {
            String::new()
        } else {
            self.parse_value()?
        };

        Ok(FilterExpr::Range { field, min, max })
    }

    fn parse_in(&mut self, field: String) -> Result<FilterExpr> {
        self.expect(TokenType::LeftParen, "'(' after in")?;

        let mut values = Vec::new();
        while matches!(self.peek().token_type, TokenType::Value | TokenType::Field) {
            values.push(self.advance().value);
        }
        if values.is_empty() {
            return Err(self.unexpected("at least one value in list"));
        }

        self.expect(TokenType::RightParen, "')' to close value list")?;
        Ok(FilterExpr::In { field, values })
    }
}

/// Tokenize and parse a raw filter string.
///
/// A blank filter matches everything and never reaches the lexer.
pub fn parse_filter(raw: &str, requested_expand: &ExpandSet) -> Result<ParsedFilter> {
    if raw.trim().is_empty() {
        return Ok(ParsedFilter::match_all());
    }
    let tokens = tokenize(raw)?;
    Parser::new(tokens, requested_expand).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> FilterExpr {
        parse_filter(raw, &ExpandSet::new()).unwrap().expr
    }

    fn expand(names: &[&str]) -> ExpandSet {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn or_binds_weaker_than_and() {
        let expr = parse("a eq '1' or b eq '2' and c eq '3'");
        assert_eq!(expr.to_string(), "(a eq '1' or (b eq '2' and c eq '3'))");
    }

    #[test]
    fn parentheses_override_precedence() {
        let expr = parse("(a eq '1' or b eq '2') and c eq '3'");
        assert_eq!(expr.to_string(), "((a eq '1' or b eq '2') and c eq '3')");
    }

    #[test]
    fn connective_chains_are_flat() {
        let expr = parse("a eq 1 and b eq 2 and c eq 3");
        assert_eq!(expr.to_string(), "(a eq '1' and b eq '2' and c eq '3')");
        assert!(matches!(expr, FilterExpr::And(ref clauses) if clauses.len() == 3));

        let grouped = parse("(a eq 1 or b eq 2) or (c eq 3 or d eq 4)");
        assert!(matches!(grouped, FilterExpr::Or(ref clauses) if clauses.len() == 4));
    }

    #[test]
    fn long_chains_parse_without_nesting() {
        let raw = vec!["year eq 2024"; 10_000].join(" and ");
        match parse(&raw) {
            FilterExpr::And(clauses) => assert_eq!(clauses.len(), 10_000),
            other => panic!("expected a conjunction, got {other:?}"),
        }
    }

    #[test]
    fn end_position_counts_chars_not_bytes() {
        // Streams without a trailing Eof get one after the last token
        let tokens = vec![Token::new(TokenType::Field, "\u{e9}t\u{e9}", 2)];
        let err = Parser::new(tokens, &ExpandSet::new()).parse().unwrap_err();
        assert_eq!(err.position(), Some(5));
        assert!(err.to_string().contains("end of input"));
    }

    #[test]
    fn bare_identifier_value() {
        let expr = parse("status eq ACTIVE");
        assert_eq!(
            expr,
            FilterExpr::Comparison {
                field: "status".into(),
                op: CompareOp::Eq,
                value: "ACTIVE".into()
            }
        );
    }

    #[test]
    fn range_with_open_bounds() {
        assert_eq!(
            parse("year range '' to 2024"),
            FilterExpr::Range {
                field: "year".into(),
                min: String::new(),
                max: "2024".into()
            }
        );
        assert_eq!(
            parse("year range 2020 to ''"),
            FilterExpr::Range {
                field: "year".into(),
                min: "2020".into(),
                max: String::new()
            }
        );
        assert_eq!(
            parse("year range to 2024 and a eq 1").to_string(),
            "(year range '' to '2024' and a eq '1')"
        );
        assert_eq!(
            parse("(year range 2020 to) or a eq 1").to_string(),
            "(year range '2020' to '' or a eq '1')"
        );
    }

    #[test]
    fn range_requires_to() {
        let err = parse_filter("year range 2020 2024", &ExpandSet::new()).unwrap_err();
        assert_eq!(err.position(), Some(16));
    }

    #[test]
    fn in_list_with_and_without_commas() {
        let with = parse("clubId in ('a', 'b', 'c')");
        let without = parse("clubId in ('a' 'b' 'c')");
        assert_eq!(with, without);
        assert_eq!(
            with,
            FilterExpr::In {
                field: "clubId".into(),
                values: vec!["a".into(), "b".into(), "c".into()]
            }
        );
    }

    #[test]
    fn in_requires_values() {
        let err = parse_filter("clubId in ()", &ExpandSet::new()).unwrap_err();
        assert!(matches!(err, Error::Syntax { position: 11, .. }));
    }

    #[test]
    fn blank_filter_matches_all() {
        let parsed = parse_filter("   ", &ExpandSet::new()).unwrap();
        assert_eq!(parsed, ParsedFilter::match_all());
    }

    #[test]
    fn trailing_tokens_are_rejected() {
        let err = parse_filter("a eq 1 b", &ExpandSet::new()).unwrap_err();
        assert_eq!(err.position(), Some(7));
        assert!(err.to_string().contains("Unexpected token 'b'"));
    }

    #[test]
    fn filter_ending_mid_expression() {
        let err = parse_filter("status eq", &ExpandSet::new()).unwrap_err();
        assert_eq!(err.position(), Some(9));
    }

    #[test]
    fn unclosed_group() {
        let err = parse_filter("(a eq 1 or b eq 2", &ExpandSet::new()).unwrap_err();
        assert!(err.to_string().contains("')'"));
        assert_eq!(err.position(), Some(17));
    }

    #[test]
    fn missing_operator() {
        let err = parse_filter("a 1", &ExpandSet::new()).unwrap_err();
        assert!(err.to_string().contains("operator after 'a'"));
    }

    #[test]
    fn unexpanded_relation_is_dropped() {
        let parsed =
            parse_filter("athlete.dateOfBirth ge 2000-01-01 and year eq 2024", &ExpandSet::new())
                .unwrap();
        assert_eq!(parsed.expr.to_string(), "year eq '2024'");
        assert!(parsed.used_expand.is_empty());
    }

    #[test]
    fn expanded_relation_is_recorded() {
        let requested = expand(&["athlete", "club"]);
        let parsed = parse_filter("athlete.dateOfBirth ge 2000-01-01", &requested).unwrap();
        assert_eq!(parsed.used_expand, expand(&["athlete"]));
        assert!(!parsed.expr.is_match_all());
    }

    #[test]
    fn deep_nesting_is_rejected() {
        let raw = format!("{}a eq 1{}", "(".repeat(100), ")".repeat(100));
        let err = parse_filter(&raw, &ExpandSet::new()).unwrap_err();
        assert!(err.to_string().contains("too deeply nested"));
    }

    #[test]
    fn parsing_is_deterministic() {
        let raw = "year range 2020 to 2024 or (status eq 'ACTIVE' and clubId in ('x'))";
        assert_eq!(parse(raw), parse(raw));
    }
}
