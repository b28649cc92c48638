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

//! CSS-like queries over element trees
//!
//! Supports type selectors and `*`, joined by the descendant (` `), child
//! (`>`), adjacent sibling (`+`) and general sibling (`~`) combinators, with
//! comma-separated alternatives. Child and descendant continuations are
//! both handed down to the next depth, while a group that starts with a
//! descendant combinator keeps searching below elements it fails to match.
//!
//! ```rust
//! use satori_xhtml::{parse, select};
//!
//! let tree = parse(r#"<root><a id="1"/><b><a id="2"/></b></root>"#);
//! let found = select(&tree, "b a");
//! assert_eq!(found.len(), 1);
//! assert_eq!(found[0].to_string(), r#"<a id="2"/>"#);
//! ```

use std::sync::LazyLock;

use regex::Regex;

use crate::{element::Element, template::parse};

static COMBINATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" *([ >+~]) *").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// ` `
    Descendant,
    /// `>`
    Child,
    /// `+`
    Adjacent,
    /// `~`
    Sibling,
}

impl Combinator {
    fn from_symbol(symbol: &str) -> Self {
        match symbol {
            ">" => Combinator::Child,
            "+" => Combinator::Adjacent,
            "~" => Combinator::Sibling,
            _ => Combinator::Descendant,
        }
    }
}

/// One segment of a group: a type name or `*`, and how it relates to the
/// segment before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub tag: String,
    pub combinator: Combinator,
}

fn parse_group(mut query: &str) -> Vec<Selector> {
    let mut group = Vec::new();
    let mut combinator = Combinator::Descendant;
    while let Some(caps) = COMBINATOR.captures(query) {
        let (Some(whole), Some(symbol)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        group.push(Selector {
            tag: query[..whole.start()].to_string(),
            combinator,
        });
        combinator = Combinator::from_symbol(symbol.as_str());
        query = &query[whole.end()..];
    }
    group.push(Selector {
        tag: query.to_string(),
        combinator,
    });
    group
}

/// Parses comma-separated alternatives into selector groups.
pub fn parse_selector(input: &str) -> Vec<Vec<Selector>> {
    input.split(',').map(|part| parse_group(part.trim())).collect()
}

fn select_level<'e, 'q>(source: &'e [Element], query: Vec<&'q [Selector]>, results: &mut Vec<&'e Element>) {
    if source.is_empty() || query.is_empty() {
        return;
    }
    let mut base = query;
    let mut adjacent: Vec<&'q [Selector]> = Vec::new();

    for element in source {
        let local: Vec<&'q [Selector]> = base.iter().copied().chain(adjacent.drain(..)).collect();
        let mut inner = Vec::new();
        let mut matched = false;

        for group in local {
            let Some((head, tail)) = group.split_first() else {
                continue;
            };
            if head.tag == element.tag() || head.tag == "*" {
                match tail.first().map(|next| next.combinator) {
                    None => matched = true,
                    Some(Combinator::Descendant | Combinator::Child) => inner.push(tail),
                    Some(Combinator::Adjacent) => adjacent.push(tail),
                    Some(Combinator::Sibling) => base.push(tail),
                }
            }
            if head.combinator == Combinator::Descendant {
                inner.push(group);
            }
        }

        if matched {
            results.push(element);
        }
        select_level(element.children(), inner, results);
    }
}

/// Matches parsed groups against `source` in document order.
pub fn select_groups<'e>(source: &'e [Element], groups: &[Vec<Selector>]) -> Vec<&'e Element> {
    let mut results = Vec::new();
    select_level(source, groups.iter().map(Vec::as_slice).collect(), &mut results);
    results
}

/// Matches `query` against `source` in document order.
pub fn select<'e>(source: &'e [Element], query: &str) -> Vec<&'e Element> {
    select_groups(source, &parse_selector(query))
}

/// Parses plain `markup` and returns copies of the elements `query` selects.
pub fn select_str(markup: &str, query: &str) -> Vec<Element> {
    let tree = parse(markup);
    select(&tree, query).into_iter().cloned().collect()
}

impl Element {
    /// Matches `query` against this element and its descendants.
    pub fn select(&self, query: &str) -> Vec<&Element> {
        select(std::slice::from_ref(self), query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    const FIXTURE: &str = r#"<root><a id="1"/><b><a id="2"/></b><c/><a id="3"/></root>"#;

    fn ids(query: &str) -> Vec<String> {
        select_str(FIXTURE, query)
            .iter()
            .map(|e| e.attr("id").map(Value::to_string).unwrap_or_default())
            .collect()
    }

    #[test]
    fn parses_groups() {
        assert_eq!(
            parse_selector("root > a, b"),
            vec![
                vec![
                    Selector { tag: "root".into(), combinator: Combinator::Descendant },
                    Selector { tag: "a".into(), combinator: Combinator::Child },
                ],
                vec![Selector { tag: "b".into(), combinator: Combinator::Descendant }],
            ]
        );
    }

    #[test]
    fn combinators() {
        assert_eq!(ids("a"), vec!["1", "2", "3"]);
        assert_eq!(ids("b a"), vec!["2"]);
        assert_eq!(ids("root > a"), vec!["1", "3"]);
        assert_eq!(ids("c + a"), vec!["3"]);
        assert_eq!(ids("b ~ a"), vec!["3"]);
        assert_eq!(ids("root * a"), vec!["2"]);
    }

    #[test]
    fn alternatives_stay_in_document_order() {
        assert_eq!(ids("c + a, b a"), vec!["2", "3"]);
        assert_eq!(ids("a, a"), vec!["1", "2", "3"]);
    }

    #[test]
    fn no_match() {
        assert!(ids("d").is_empty());
        assert!(select(&[], "a").is_empty());
    }

    #[test]
    fn element_select_includes_self() {
        let tree = parse(FIXTURE);
        assert_eq!(tree[0].select("root").len(), 1);
        assert_eq!(tree[0].select("b > a").len(), 1);
    }
}
