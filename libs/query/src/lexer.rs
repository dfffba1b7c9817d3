//! Filter lexer - tokenizes raw filter strings
//!
//! Produces a flat token stream (fields, values, comparison operators,
//! connectives, parentheses) terminated by an explicit `Eof` token.

use crate::error::{Error, Result};
use crate::token::{Token, TokenType};

const OPERATORS: [&str; 7] = ["eq", "ne", "gt", "ge", "lt", "le", "in"];

/// The filter lexer
pub struct Lexer {
    chars: Vec<char>,
    position: usize,
    current_char: Option<char>,
}

impl Lexer {
    /// Create a new lexer for the given input
    pub fn new(input: &str) -> Self {
        let chars: Vec<char> = input.chars().collect();
        let current_char = chars.first().copied();

        Self {
            chars,
            position: 0,
            current_char,
        }
    }

    fn advance(&mut self) {
        self.position += 1;
        self.current_char = self.chars.get(self.position).copied();
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.position + 1).copied()
    }

    /// Skip whitespace and value separators
    fn skip_separators(&mut self) {
        while let Some(c) = self.current_char {
            if c.is_whitespace() || c == ',' {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn is_identifier_start(c: char) -> bool {
        c.is_ascii_alphabetic() || c == '_'
    }

    fn is_identifier_part(c: char) -> bool {
        c.is_ascii_alphanumeric() || c == '_'
    }

    fn is_value_start(c: char) -> bool {
        c.is_ascii_digit() || matches!(c, '-' | '+' | '.')
    }

    fn is_value_part(c: char) -> bool {
        c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | ':' | '+' | '-')
    }

    /// Read an identifier with optional `.segment` relation parts
    fn read_identifier(&mut self) -> (String, bool) {
        let start = self.position;
        let mut dotted = false;

        loop {
            while let Some(c) = self.current_char {
                if Self::is_identifier_part(c) {
                    self.advance();
                } else {
                    break;
                }
            }
            match (self.current_char, self.peek()) {
                (Some('.'), Some(next)) if Self::is_identifier_start(next) => {
                    dotted = true;
                    self.advance();
                }
                _ => break,
            }
        }

        (self.chars[start..self.position].iter().collect(), dotted)
    }

    fn read_bare_value(&mut self) -> String {
        let start = self.position;
        while let Some(c) = self.current_char {
            if Self::is_value_part(c) {
                self.advance();
            } else {
                break;
            }
        }
        self.chars[start..self.position].iter().collect()
    }

    /// Read a single-quoted value; `\'` is an escaped quote, other escapes are kept verbatim
    fn read_quoted(&mut self) -> Result<String> {
        let start = self.position;
        self.advance(); // Skip opening quote

        let mut value = String::new();
        while let Some(c) = self.current_char {
            match c {
                '\\' if self.peek() == Some('\'') => {
                    value.push('\'');
                    self.advance();
                    self.advance();
                }
                '\\' => {
                    value.push('\\');
                    self.advance();
                    if let Some(escaped) = self.current_char {
                        value.push(escaped);
                        self.advance();
                    }
                }
                '\'' => {
                    self.advance(); // Skip closing quote
                    return Ok(value);
                }
                other => {
                    value.push(other);
                    self.advance();
                }
            }
        }

        Err(Error::syntax(
            format!("Unclosed quoted string starting at position {start}"),
            start,
        ))
    }

    fn next_token(&mut self) -> Result<Token> {
        self.skip_separators();

        let position = self.position;
        let Some(c) = self.current_char else {
            return Ok(Token::eof(self.chars.len()));
        };

        match c {
            '(' => {
                self.advance();
                Ok(Token::new(TokenType::LeftParen, "(", position))
            }
            ')' => {
                self.advance();
                Ok(Token::new(TokenType::RightParen, ")", position))
            }
            '\'' => {
                let value = self.read_quoted()?;
                Ok(Token::new(TokenType::Value, value, position))
            }
            c if Self::is_identifier_start(c) => {
                let (text, dotted) = self.read_identifier();
                if dotted {
                    return Ok(Token::new(TokenType::Field, text, position));
                }
                let lower = text.to_ascii_lowercase();
                let token_type = match lower.as_str() {
                    "and" => TokenType::And,
                    "or" => TokenType::Or,
                    op if OPERATORS.contains(&op) => TokenType::ComparisonOp,
                    _ => return Ok(Token::new(TokenType::Field, text, position)),
                };
                Ok(Token::new(token_type, lower, position))
            }
            c if Self::is_value_start(c) => {
                let value = self.read_bare_value();
                Ok(Token::new(TokenType::Value, value, position))
            }
            other => Err(Error::syntax(
                format!("Unexpected character '{other}' at position {position}"),
                position,
            )),
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.is(TokenType::Eof);
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }
}

/// Tokenize a raw filter string
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    Lexer::new(input).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types(input: &str) -> Vec<TokenType> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|t| t.token_type)
            .collect()
    }

    #[test]
    fn simple_comparison() {
        let tokens = tokenize("status eq 'Active'").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::new(TokenType::Field, "status", 0),
                Token::new(TokenType::ComparisonOp, "eq", 7),
                Token::new(TokenType::Value, "Active", 10),
                Token::eof(18),
            ]
        );
    }

    #[test]
    fn keywords_are_case_insensitive() {
        let tokens = tokenize("a EQ 1 AnD b Ne 2 OR c gt 3").unwrap();
        assert_eq!(tokens[1].value, "eq");
        assert_eq!(tokens[3].token_type, TokenType::And);
        assert_eq!(tokens[5].value, "ne");
        assert_eq!(tokens[7].token_type, TokenType::Or);
    }

    #[test]
    fn field_case_is_preserved() {
        let tokens = tokenize("accreditationNumber eq x").unwrap();
        assert_eq!(tokens[0].value, "accreditationNumber");
        assert_eq!(tokens[2].token_type, TokenType::Field);
    }

    #[test]
    fn iso_timestamp_is_one_value() {
        let tokens = tokenize("createdAt ge 2024-05-01T00:00:00Z").unwrap();
        assert_eq!(tokens[2].token_type, TokenType::Value);
        assert_eq!(tokens[2].value, "2024-05-01T00:00:00Z");
    }

    #[test]
    fn offset_timestamp_keeps_plus() {
        let tokens = tokenize("createdAt lt 2024-05-01T10:00:00+02:00").unwrap();
        assert_eq!(tokens[2].value, "2024-05-01T10:00:00+02:00");
    }

    #[test]
    fn dotted_field_is_single_token() {
        let tokens = tokenize("athlete.dateOfBirth ge 2000-01-01").unwrap();
        assert_eq!(tokens[0], Token::new(TokenType::Field, "athlete.dateOfBirth", 0));
    }

    #[test]
    fn dotted_reserved_word_stays_a_field() {
        let tokens = tokenize("club.in eq 1").unwrap();
        assert_eq!(tokens[0].token_type, TokenType::Field);
        assert_eq!(tokens[0].value, "club.in");
    }

    #[test]
    fn escaped_quote() {
        let tokens = tokenize(r"name eq 'O\'Brien'").unwrap();
        assert_eq!(tokens[2].value, "O'Brien");
    }

    #[test]
    fn other_escapes_are_kept() {
        let tokens = tokenize(r"name eq 'a\nb'").unwrap();
        assert_eq!(tokens[2].value, r"a\nb");
    }

    #[test]
    fn empty_quoted_value() {
        let tokens = tokenize("year range '' to 2024").unwrap();
        assert_eq!(tokens[2], Token::new(TokenType::Value, "", 11));
    }

    #[test]
    fn commas_separate_values() {
        assert_eq!(
            types("id in ('a', 'b',3)"),
            vec![
                TokenType::Field,
                TokenType::ComparisonOp,
                TokenType::LeftParen,
                TokenType::Value,
                TokenType::Value,
                TokenType::Value,
                TokenType::RightParen,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn unterminated_quote() {
        let err = tokenize("name eq 'abc").unwrap_err();
        assert_eq!(err.position(), Some(8));
        assert!(err.to_string().contains("Unclosed quoted string"));
    }

    #[test]
    fn unexpected_character() {
        let err = tokenize("year = 2024").unwrap_err();
        assert_eq!(err.position(), Some(5));
        assert!(err.to_string().contains("Unexpected character '='"));
    }

    #[test]
    fn empty_input_is_only_eof() {
        assert_eq!(tokenize("   ").unwrap(), vec![Token::eof(3)]);
    }

    #[test]
    fn positions_use_untrimmed_input() {
        let tokens = tokenize("  year eq 1").unwrap();
        assert_eq!(tokens[0].position, 2);
        assert_eq!(tokens[3].position, 11);
    }
}
