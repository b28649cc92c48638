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

//! Token tree folding
//!
//! Turns the flat output of [`tokenize`](crate::tokenizer::tokenize) into a
//! tree. Open tokens collect what follows into named slots until their
//! matching close; a continuation token like `{:else}` switches the open
//! block to a fresh slot. Close tokens that don't match the innermost open
//! block are ignored, and blocks still open at the end are closed
//! implicitly. Blocks that would reach the [`MAX_DEPTH`] level are kept
//! as empty tokens, so every later walk over the tree stays shallow.

use indexmap::IndexMap;

use crate::tokenizer::{DEFAULT_SLOT, Node, Position, Token, TokenKind};

/// Deepest block nesting the folder builds.
pub const MAX_DEPTH: usize = 256;

struct Frame<'a> {
    token: Token<'a>,
    slot: &'a str,
}

impl<'a> Frame<'a> {
    fn open(mut token: Token<'a>) -> Self {
        token.children = IndexMap::from([(DEFAULT_SLOT, Vec::new())]);
        Frame {
            token,
            slot: DEFAULT_SLOT,
        }
    }

    fn push(&mut self, node: Node<'a>) {
        self.token.children.entry(self.slot).or_default().push(node);
    }
}

fn close_top<'a>(open_stack: &mut Vec<Frame<'a>>) {
    if open_stack.len() < 2 {
        return;
    }
    if let Some(frame) = open_stack.pop() {
        if let Some(parent) = open_stack.last_mut() {
            parent.push(Node::Token(frame.token));
        }
    }
}

/// Nests `nodes` and returns the top-level children in order.
pub fn fold(nodes: Vec<Node<'_>>) -> Vec<Node<'_>> {
    let root = Token {
        kind: TokenKind::Angle,
        name: "template",
        position: Position::Open,
        source: "",
        extra: "",
        children: IndexMap::new(),
    };
    let mut open_stack = vec![Frame::open(root)];

    for node in nodes {
        let token = match node {
            Node::Text(_) => {
                if let Some(top) = open_stack.last_mut() {
                    top.push(node);
                }
                continue;
            }
            Node::Token(token) => token,
        };
        match token.position {
            Position::Close => {
                let matches = open_stack.last().is_some_and(|top| top.token.name == token.name);
                if matches {
                    close_top(&mut open_stack);
                }
            }
            Position::Continue => {
                if let Some(top) = open_stack.last_mut() {
                    top.token.children.insert(token.name, Vec::new());
                    top.slot = token.name;
                }
            }
            Position::Open if open_stack.len() < MAX_DEPTH => open_stack.push(Frame::open(token)),
            Position::Open | Position::Empty => {
                if let Some(top) = open_stack.last_mut() {
                    top.push(Node::Token(token));
                }
            }
        }
    }

    while open_stack.len() > 1 {
        close_top(&mut open_stack);
    }
    open_stack
        .pop()
        .and_then(|mut root| root.token.children.shift_remove(DEFAULT_SLOT))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{template::Options, tokenizer::tokenize};

    fn shape(nodes: &[Node<'_>]) -> String {
        nodes
            .iter()
            .map(|node| match node {
                Node::Text(text) => text.clone(),
                Node::Token(token) if token.children.is_empty() => format!("[{}]", token.name),
                Node::Token(token) => {
                    let slots: Vec<String> = token
                        .children
                        .iter()
                        .map(|(slot, children)| format!("{}:{}", slot, shape(children)))
                        .collect();
                    format!("{}({})", token.name, slots.join("|"))
                }
            })
            .collect()
    }

    fn fold_src(src: &str) -> String {
        shape(&fold(tokenize(src, &Options { templated: true })))
    }

    #[test]
    fn nests_blocks_and_slots() {
        assert_eq!(
            fold_src("a<p>{#if x}b{:else}c<br/>{/if}</p>d"),
            "ap(default:if(default:b|else:c[br]))d"
        );
    }

    #[test]
    fn ignores_mismatched_close() {
        assert_eq!(fold_src("<p>a</q>b</p>c"), "p(default:ab)c");
    }

    #[test]
    fn closes_unterminated_blocks() {
        assert_eq!(fold_src("<p><b>x"), "p(default:b(default:x))");
    }

    #[test]
    fn stray_close_at_top_level() {
        assert_eq!(fold_src("a</p>b"), "ab");
    }

    fn depth(nodes: &[Node<'_>]) -> usize {
        nodes
            .iter()
            .map(|node| match node {
                Node::Text(_) => 0,
                Node::Token(token) => 1 + token.children.values().map(|c| depth(c)).max().unwrap_or(0),
            })
            .max()
            .unwrap_or(0)
    }

    #[test]
    fn deep_nesting_is_capped() {
        let src = format!("{}x", "<b>".repeat(MAX_DEPTH + 10));
        let nodes = fold(tokenize(&src, &Options::default()));
        assert_eq!(depth(&nodes), MAX_DEPTH);

        let src = format!("{}x{}", "<b>".repeat(3), "</b>".repeat(3));
        assert_eq!(depth(&fold(tokenize(&src, &Options::default()))), 3);
    }
}
