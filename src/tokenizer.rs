use std::fmt;

use winnow::combinator::alt;
use winnow::prelude::*;
use winnow::token::take_while;

use crate::ast::Pos;
use crate::error::LexError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Word,
    Str,
    OpenBrace,
    CloseBrace,
    Space,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Word => "identifier",
            TokenKind::Str => "string",
            TokenKind::OpenBrace => "'{'",
            TokenKind::CloseBrace => "'}'",
            TokenKind::Space => "white space",
            TokenKind::Eof => "end of input",
        };
        f.write_str(name)
    }
}

/// A lexical span of the source. `text` borrows the raw source, quotes and
/// escapes included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'s> {
    pub kind: TokenKind,
    pub text: &'s str,
    pub start: Pos,
    pub end: Pos,
}

/// Splits `src` into tokens. White space runs are kept as tokens; the list
/// always ends with a single `Eof` token positioned after the last character.
pub fn tokenize(src: &str) -> Result<Vec<Token<'_>>, LexError> {
    let mut input = src;
    let mut pos = Pos::START;
    let mut tokens = Vec::new();

    while let Some(c) = input.chars().next() {
        let start = pos;
        let (kind, text) = if c == '"' {
            (TokenKind::Str, string_literal(&mut input, start)?)
        } else {
            plain
                .parse_next(&mut input)
                .map_err(|_| LexError::IllegalCharacter(start, c))?
        };
        pos = start.advance_str(text);
        tokens.push(Token {
            kind,
            text,
            start,
            end: pos,
        });
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        text: "",
        start: pos,
        end: pos,
    });
    Ok(tokens)
}

fn plain<'s>(input: &mut &'s str) -> ModalResult<(TokenKind, &'s str)> {
    alt((
        take_while(1.., char::is_whitespace).map(|t| (TokenKind::Space, t)),
        take_while(1.., char::is_alphabetic).map(|t| (TokenKind::Word, t)),
        "{".map(|t| (TokenKind::OpenBrace, t)),
        "}".map(|t| (TokenKind::CloseBrace, t)),
    ))
    .parse_next(input)
}

/// Consumes a quoted string starting at the opening quote and returns it,
/// quotes included.
fn string_literal<'s>(input: &mut &'s str, start: Pos) -> Result<&'s str, LexError> {
    let src = *input;
    let mut chars = src.char_indices();
    let mut pos = start;
    if let Some((_, open)) = chars.next() {
        pos = pos.advance(open);
    }

    loop {
        match chars.next() {
            None => return Err(LexError::UnterminatedString(pos)),
            Some((i, '"')) => {
                let (literal, rest) = src.split_at(i + 1);
                *input = rest;
                return Ok(literal);
            }
            Some((_, '\\')) => {
                pos = pos.advance('\\');
                match chars.next() {
                    None => return Err(LexError::UnterminatedEscape(pos)),
                    Some((_, c @ ('n' | '\\' | '"'))) => pos = pos.advance(c),
                    Some(_) => return Err(LexError::UnknownEscape(pos)),
                }
            }
            Some((_, c)) => pos = pos.advance(c),
        }
    }
}

/// Decodes a quoted literal as produced by the tokenizer.
pub fn unquote(quoted: &str) -> String {
    let inner = quoted
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(quoted);

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Inverse of [`unquote`] for text without raw line breaks.
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
