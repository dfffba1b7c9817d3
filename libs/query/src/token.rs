//! Token types for the filter lexer

/// Token types produced by the filter lexer
#[derive(Debug, PartialEq, Clone, Copy, Eq)]
pub enum TokenType {
    /// Field name, possibly a dotted relation path (`athlete.dateOfBirth`)
    Field,
    /// Quoted or bare value
    Value,
    /// One of `eq ne gt ge lt le in`
    ComparisonOp,
    And,
    Or,
    LeftParen,
    RightParen,
    Eof,
}

/// A token in a filter expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub token_type: TokenType,
    pub value: String,
    /// Zero-based character offset into the raw input
    pub position: usize,
}

impl Token {
    pub fn new(token_type: TokenType, value: impl Into<String>, position: usize) -> Self {
        Self {
            token_type,
            value: value.into(),
            position,
        }
    }

    pub fn eof(position: usize) -> Self {
        Self {
            token_type: TokenType::Eof,
            value: String::new(),
            position,
        }
    }

    pub fn is(&self, token_type: TokenType) -> bool {
        self.token_type == token_type
    }

    /// Bare identifier match, used for the contextual `range` / `to` words.
    pub fn is_word(&self, word: &str) -> bool {
        self.token_type == TokenType::Field && self.value.eq_ignore_ascii_case(word)
    }
}
