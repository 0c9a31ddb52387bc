use std::fmt;

use thiserror::Error;

use crate::ast::Pos;

/// Raised by the tokenizer; always names the offending position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("{0}: illegal character {1:?}")]
    IllegalCharacter(Pos, char),
    #[error("{0}: unexpected end of input in string literal")]
    UnterminatedString(Pos),
    #[error("{0}: unexpected end of input after '\\' in string literal")]
    UnterminatedEscape(Pos),
    #[error("{0}: unknown escape sequence (only 'n', '\\' and '\"' can follow after '\\')")]
    UnknownEscape(Pos),
}

impl LexError {
    pub fn pos(&self) -> Pos {
        match self {
            LexError::IllegalCharacter(pos, _)
            | LexError::UnterminatedString(pos)
            | LexError::UnterminatedEscape(pos)
            | LexError::UnknownEscape(pos) => *pos,
        }
    }
}

/// What the parser was looking for when it gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    String,
    OpenBrace,
    CloseBrace,
    Keyword(&'static str),
    Statement,
    /// The block would exceed the nesting limit.
    ShallowerBlock(usize),
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::String => f.write_str("string"),
            Expected::OpenBrace => f.write_str("'{'"),
            Expected::CloseBrace => f.write_str("'}'"),
            Expected::Keyword(k) => write!(f, "keyword '{k}'"),
            Expected::Statement => f.write_str("statement"),
            Expected::ShallowerBlock(limit) => {
                write!(f, "nesting too deep, at most {limit} levels")
            }
        }
    }
}

/// The first syntax error in the input. The parser never recovers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{pos}: {context}: {}", describe(.expected))]
pub struct ParseError {
    pub pos: Pos,
    pub context: &'static str,
    pub expected: Expected,
}

fn describe(expected: &Expected) -> String {
    match expected {
        Expected::ShallowerBlock(_) => expected.to_string(),
        _ => format!("{expected} expected"),
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("lex error: {0}")]
    Lex(#[from] LexError),
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid option {name}: {value} (allowed {min}..={max})")]
    InvalidOption {
        name: &'static str,
        value: i32,
        min: i32,
        max: i32,
    },
}

impl Error {
    /// Source position of a lex or parse failure.
    pub fn pos(&self) -> Option<Pos> {
        match self {
            Error::Lex(e) => Some(e.pos()),
            Error::Parse(e) => Some(e.pos),
            Error::Json(_) | Error::InvalidOption { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_names_context_and_expected_token() {
        let err = ParseError {
            pos: Pos::new(1, 12),
            context: "switch",
            expected: Expected::CloseBrace,
        };
        assert_eq!(err.to_string(), "1:12: switch: '}' expected");
    }

    #[test]
    fn nesting_errors_read_without_expected_suffix() {
        let err = ParseError {
            pos: Pos::new(1, 7),
            context: "while",
            expected: Expected::ShallowerBlock(64),
        };
        assert_eq!(
            err.to_string(),
            "1:7: while: nesting too deep, at most 64 levels"
        );
    }

    #[test]
    fn lex_errors_carry_line_and_column() {
        let err = LexError::UnknownEscape(Pos::new(3, 7));
        assert_eq!(err.pos(), Pos::new(3, 7));
        assert!(err.to_string().starts_with("3:7: unknown escape sequence"));

        let err: Error = LexError::IllegalCharacter(Pos::new(1, 2), '(').into();
        assert_eq!(err.to_string(), "lex error: 1:2: illegal character '('");
        assert_eq!(err.pos(), Some(Pos::new(1, 2)));
    }
}
