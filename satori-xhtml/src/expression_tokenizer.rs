// MIT License
//
// Copyright (c) 2024 Jerome Johnson
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

//! Expression tokenization
//!
//! Splits an expression into literals, identifiers and punctuation. Tokens
//! borrow from the source and are produced lazily: [`Token::first`] reads
//! one token and [`Token::next`] continues from its tail.
//!
//! # Token Types
//!
//! - numbers: `42`, `0x2a`, `0o52`, `0b101010`, `4.2`, `4.2e1`, `.5`
//! - strings: `"a\"b"`, raw `` `a\b` ``, single characters `'a'`
//! - identifiers: `name`, `_private`, `true`, `nil`
//! - punctuation: `( ) [ ] .` and the operators
//!   `|| && == != < <= > >= + - * / % !`
//!
//! # Examples
//!
//! ```rust
//! use satori_xhtml::expression_tokenizer::{Token, TokenType};
//!
//! let token = Token::first("user.age >= 18").unwrap().unwrap();
//! assert_eq!(token.value, "user");
//! assert_eq!(token.token_type, TokenType::Ident);
//! let token = token.next().unwrap().unwrap();
//! assert_eq!(token.value, ".");
//! ```

use crate::error::ExprError;

pub type Result<T> = std::result::Result<T, ExprError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    Int,
    Float,
    /// A double-quoted string, still escaped
    String,
    /// A backtick string, taken verbatim
    RawString,
    /// A single-quoted character, still escaped
    Char,
    Ident,
    Punct,
}

#[derive(Debug, Clone, Copy)]
pub struct Token<'a> {
    pub token_type: TokenType,
    /// The token's source text including any quotes
    pub value: &'a str,
    /// The remaining text after this token
    pub tail: &'a str,
}

const OPERATORS: [&str; 19] = [
    "||", "&&", "==", "!=", "<=", ">=", "<", ">", "+", "-", "*", "/", "%", "!", "(", ")", "[", "]", ".",
];

fn find_end_of_quoted(src: &str, quote: char) -> Result<usize> {
    let mut escaped = false;
    for (i, c) in src.char_indices().skip(1) {
        match c {
            '\\' if quote != '`' => escaped = !escaped,
            c if c == quote && !escaped => return Ok(i + c.len_utf8()),
            _ => escaped = false,
        }
    }
    Err(ExprError::syntax("unterminated literal", src))
}

fn take_digits(src: &str, from: usize, radix: u32) -> usize {
    src[from..]
        .char_indices()
        .find(|(_, c)| !(c.is_digit(radix) || *c == '_'))
        .map_or(src.len(), |(i, _)| from + i)
}

fn find_end_of_number(src: &str) -> (usize, TokenType) {
    let bytes = src.as_bytes();
    if bytes.len() > 1 && bytes[0] == b'0' {
        let radix = match bytes[1] {
            b'x' | b'X' => Some(16),
            b'o' | b'O' => Some(8),
            b'b' | b'B' => Some(2),
            _ => None,
        };
        if let Some(radix) = radix {
            return (take_digits(src, 2, radix), TokenType::Int);
        }
    }

    let mut end = take_digits(src, 0, 10);
    let mut token_type = TokenType::Int;
    if bytes.get(end) == Some(&b'.') && bytes.get(end + 1).is_some_and(u8::is_ascii_digit) {
        end = take_digits(src, end + 1, 10);
        token_type = TokenType::Float;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        if bytes.get(exp).is_some_and(u8::is_ascii_digit) {
            end = take_digits(src, exp, 10);
            token_type = TokenType::Float;
        }
    }
    (end, token_type)
}

fn find_end_of_ident(src: &str) -> usize {
    src.char_indices()
        .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
        .map_or(src.len(), |(i, _)| i)
}

fn parse(src: &str) -> Result<Option<Token<'_>>> {
    let Some(first) = src.chars().next() else {
        return Ok(None);
    };
    let second_is_digit = src[first.len_utf8()..].starts_with(|c: char| c.is_ascii_digit());
    let (end, token_type) = match first {
        '"' => (find_end_of_quoted(src, '"')?, TokenType::String),
        '`' => (find_end_of_quoted(src, '`')?, TokenType::RawString),
        '\'' => (find_end_of_quoted(src, '\'')?, TokenType::Char),
        c if c.is_ascii_digit() || (c == '.' && second_is_digit) => find_end_of_number(src),
        c if c.is_alphabetic() || c == '_' => (find_end_of_ident(src), TokenType::Ident),
        _ => match OPERATORS.iter().find(|op| src.starts_with(*op)) {
            Some(op) => (op.len(), TokenType::Punct),
            None => return Err(ExprError::syntax(format!("unexpected character {:?}", first), src)),
        },
    };
    Ok(Some(Token {
        token_type,
        value: &src[..end],
        tail: src[end..].trim_start(),
    }))
}

impl<'a> Token<'a> {
    /// Parses the first token from a string
    pub fn first(src: &'a str) -> Result<Option<Self>> {
        parse(src.trim())
    }

    /// Parses the next token after this one
    pub fn next(&self) -> Result<Option<Self>> {
        parse(self.tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(src: &str) -> Vec<(TokenType, &str)> {
        let mut out = Vec::new();
        let mut token = Token::first(src).unwrap();
        while let Some(t) = token {
            out.push((t.token_type, t.value));
            token = t.next().unwrap();
        }
        out
    }

    #[test]
    fn numbers() {
        assert_eq!(
            tokens("1 0x1F 2.5 1e3 .5 3.x"),
            vec![
                (TokenType::Int, "1"),
                (TokenType::Int, "0x1F"),
                (TokenType::Float, "2.5"),
                (TokenType::Float, "1e3"),
                (TokenType::Float, ".5"),
                (TokenType::Int, "3"),
                (TokenType::Punct, "."),
                (TokenType::Ident, "x"),
            ]
        );
    }

    #[test]
    fn strings_and_operators() {
        assert_eq!(
            tokens(r#"a>="x\"y"||!`r\`"#),
            vec![
                (TokenType::Ident, "a"),
                (TokenType::Punct, ">="),
                (TokenType::String, r#""x\"y""#),
                (TokenType::Punct, "||"),
                (TokenType::Punct, "!"),
                (TokenType::RawString, r"`r\`"),
            ]
        );
    }

    #[test]
    fn unicode_identifiers() {
        assert_eq!(tokens("名字[0]"), vec![
            (TokenType::Ident, "名字"),
            (TokenType::Punct, "["),
            (TokenType::Int, "0"),
            (TokenType::Punct, "]"),
        ]);
    }

    #[test]
    fn errors() {
        assert!(Token::first("\"open").is_err());
        assert!(Token::first("#").is_err());
    }
}
