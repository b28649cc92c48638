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

//! Markup tokenization
//!
//! Splits source text into a flat run of text and tokens. Two token shapes
//! are recognised:
//!
//! - angle tags: `<name attrs>`, `</name>`, `<name attrs/>`, with `<>` and
//!   `</>` naming an anonymous `template` element
//! - curly directives (templated mode only): `{expr}`, `{@expr}`,
//!   `{#name extra}`, `{:name}`, `{/name}`
//!
//! Comments (`<!-- ... -->`) are dropped. Text runs are entity-decoded and
//! lose one line break of indentation on the sides that touch a tag.
//!
//! ```rust
//! use satori_xhtml::{tokenizer::{tokenize, Node, Position}, Options};
//!
//! let nodes = tokenize("<b>hi</b>", &Options::default());
//! assert_eq!(nodes.len(), 3);
//! assert!(matches!(&nodes[0], Node::Token(t) if t.position == Position::Open));
//! ```

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::{template::Options, text::unescape};

static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(<!--[\s\S]*?-->)|(<(/?)([^!\s>/]*)([^>]*?)\s*(/?)>)").unwrap()
});
static TEMPLATED_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(<!--[\s\S]*?-->)|(<(/?)([^!\s>/]*)([^>]*?)\s*(/?)>)|(\{([@:/#][^\s\}]*)?[\s\S]*?\})")
        .unwrap()
});
static TRIM_START: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[ \t]*\r?\n[ \t]*").unwrap());
static TRIM_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]*\r?\n[ \t]*$").unwrap());

/// Slot every block starts filling.
pub const DEFAULT_SLOT: &str = "default";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Angle,
    Curly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Open,
    Close,
    Empty,
    /// Switches the enclosing block to a new slot, e.g. `{:else}`
    Continue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub name: &'a str,
    pub position: Position,
    /// The whole match including delimiters
    pub source: &'a str,
    /// Attribute text for tags, the expression for directives
    pub extra: &'a str,
    /// Filled by the folder for open tokens
    pub children: IndexMap<&'a str, Vec<Node<'a>>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node<'a> {
    Text(String),
    Token(Token<'a>),
}

impl<'a> Token<'a> {
    fn new(kind: TokenKind, name: &'a str, position: Position, source: &'a str, extra: &'a str) -> Self {
        Token {
            kind,
            name,
            position,
            source,
            extra,
            children: IndexMap::new(),
        }
    }

    /// Children collected under `name`, empty when the slot never opened.
    pub fn slot(&self, name: &str) -> &[Node<'a>] {
        self.children.get(name).map(Vec::as_slice).unwrap_or_default()
    }
}

fn push_text(nodes: &mut Vec<Node<'_>>, content: &str, strip_start: bool, strip_end: bool) {
    let mut content = unescape(content);
    if strip_start {
        content = TRIM_START.replace(&content, "").into_owned();
    }
    if strip_end {
        content = TRIM_END.replace(&content, "").into_owned();
    }
    if !content.is_empty() {
        nodes.push(Node::Text(content));
    }
}

fn curly_token<'a>(source: &'a str, derivative: &'a str) -> Token<'a> {
    let body = &source[1..source.len() - 1];
    let Some(marker) = derivative.chars().next() else {
        return Token::new(TokenKind::Curly, "", Position::Empty, source, body);
    };
    let position = match marker {
        '#' => Position::Open,
        '/' => Position::Close,
        ':' => Position::Continue,
        _ => Position::Empty,
    };
    if position == Position::Empty {
        // `{@expr}` is an explicit interpolation
        return Token::new(TokenKind::Curly, "", position, source, &body[1..]);
    }
    Token::new(TokenKind::Curly, &derivative[1..], position, source, &body[derivative.len()..])
}

/// Splits `source` into text runs and tokens. Directives are only recognised
/// when `options.templated` is set.
pub fn tokenize<'a>(source: &'a str, options: &Options) -> Vec<Node<'a>> {
    let pattern = if options.templated { &*TEMPLATED_TAG } else { &*TAG };
    let mut nodes = Vec::new();
    let mut strip_start = true;
    let mut last = 0;

    for caps in pattern.captures_iter(source) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let curly = caps.get(7);
        let strip_end = curly.is_none();
        push_text(&mut nodes, &source[last..whole.start()], strip_start, strip_end);
        strip_start = strip_end;
        last = whole.end();

        if caps.get(1).is_some() {
            continue;
        }
        if let Some(curly) = curly {
            let derivative = caps.get(8).map_or("", |m| m.as_str());
            nodes.push(Node::Token(curly_token(curly.as_str(), derivative)));
            continue;
        }

        let group = |i: usize| caps.get(i).map_or("", |m| m.as_str());
        let name = match group(4) {
            "" => "template",
            name => name,
        };
        let position = if !group(3).is_empty() {
            Position::Close
        } else if !group(6).is_empty() {
            Position::Empty
        } else {
            Position::Open
        };
        nodes.push(Node::Token(Token::new(
            TokenKind::Angle,
            name,
            position,
            whole.as_str(),
            group(5),
        )));
    }

    push_text(&mut nodes, &source[last..], strip_start, true);
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn templated() -> Options {
        Options { templated: true }
    }

    fn describe(nodes: &[Node<'_>]) -> Vec<String> {
        nodes
            .iter()
            .map(|node| match node {
                Node::Text(text) => format!("text:{}", text),
                Node::Token(token) => format!("{:?}:{}:{}", token.position, token.name, token.extra),
            })
            .collect()
    }

    #[test]
    fn angle_tokens() {
        let nodes = tokenize(r#"<a href="x">go</a><br/><>t</><!-- c -->"#, &Options::default());
        assert_eq!(
            describe(&nodes),
            vec![
                r#"Open:a: href="x""#,
                "text:go",
                "Close:a:",
                "Empty:br:",
                "Open:template:",
                "text:t",
                "Close:template:",
            ]
        );
    }

    #[test]
    fn braces_are_text_in_plain_mode() {
        let nodes = tokenize("a {b} c", &Options::default());
        assert_eq!(describe(&nodes), vec!["text:a {b} c"]);
    }

    #[test]
    fn curly_tokens() {
        let nodes = tokenize("{#if ok}{x}{:else}{@y}{/if}", &templated());
        assert_eq!(
            describe(&nodes),
            vec!["Open:if: ok", "Empty::x", "Continue:else:", "Empty::y", "Close:if:"]
        );
    }

    #[test]
    fn trims_one_line_break_next_to_tags() {
        let nodes = tokenize("<p>\n  hello\n</p>\n", &Options::default());
        assert_eq!(describe(&nodes), vec!["Open:p:", "text:hello", "Close:p:"]);
    }

    #[test]
    fn keeps_whitespace_before_directives() {
        let nodes = tokenize("<p>a \n {x}</p>", &templated());
        assert_eq!(describe(&nodes), vec!["Open:p:", "text:a \n ", "Empty::x", "Close:p:"]);
    }

    #[test]
    fn text_is_unescaped() {
        let nodes = tokenize("&lt;t&gt;", &Options::default());
        assert_eq!(describe(&nodes), vec!["text:<t>"]);
    }
}
