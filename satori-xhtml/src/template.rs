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

//! Template evaluation
//!
//! Walks a folded token tree and produces [`Element`]s. In templated mode
//! directives are evaluated against a [`Scope`]:
//!
//! - `{expr}` / `{@expr}` interpolates the value as text
//! - `{#if cond}...{:else}...{/if}` picks a slot by truthiness
//! - `{#each items as item}...{/each}` repeats the default slot per item
//! - `key={expr}` in a tag binds the attribute to the raw value
//!
//! Expressions that fail to evaluate produce an empty string, so data of
//! the wrong shape never aborts a render.
//!
//! # Examples
//!
//! ```rust
//! use satori_xhtml::{render, to_markup, Map, Value};
//!
//! let mut vars = Map::new();
//! vars.insert("items".into(), Value::from(vec![1, 2]));
//! let elements = render("{#each items as item}<b>{item}</b>{/each}", &vars);
//! assert_eq!(to_markup(&elements, false), "<b>1</b><b>2</b>");
//! ```

use std::{collections::HashMap, sync::LazyLock};

use regex::Regex;
use tracing::debug;

use crate::{
    element::{Element, make_elements},
    expression::{self, lookup_value},
    fold::fold,
    scope::Scope,
    text::unescape,
    tokenizer::{DEFAULT_SLOT, Node, Token, TokenKind, tokenize},
    value::{Map, Value},
};

static ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([^\s=]+)(?:="([^"]*)"|='([^']*)')?"#).unwrap());
static TEMPLATED_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([^\s=]+)(?:="([^"]*)"|='([^']*)'|=\{([^\}]+)\})?"#).unwrap());
static IDENTIFIER_PATH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.]*$").unwrap());
static EACH_SPLIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+as\s+").unwrap());

static PLAIN: LazyLock<Parser> = LazyLock::new(|| Parser::new(Options::default()));
static TEMPLATED: LazyLock<Parser> = LazyLock::new(|| Parser::new(Options { templated: true }));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    /// Recognise `{...}` directives and `key={expr}` attributes
    pub templated: bool,
}

/// A block directive such as `{#if}` or `{#each}`.
pub trait Directive: Send + Sync {
    /// Evaluates an open `token` and appends the produced elements to `out`.
    fn evaluate(&self, parser: &Parser, token: &Token<'_>, scope: &Scope<'_>, out: &mut Vec<Element>);
}

pub type DirectiveMap = HashMap<&'static str, &'static dyn Directive>;

/// Evaluates `expr`, mapping failures and null to the empty string.
pub fn evaluate(expr: &str, scope: &Scope<'_>) -> Value {
    match expression::evaluate(expr, scope) {
        Ok(Value::Null) => Value::from(""),
        Ok(value) => value,
        Err(err) => {
            debug!(%err, expr, "expression evaluated to empty");
            Value::from("")
        }
    }
}

/// Resolves a plain `a.b.c` path by direct lookup, anything else through
/// [`evaluate`]. Missing path segments yield the empty string.
pub fn interpolate(expr: &str, scope: &Scope<'_>) -> Value {
    let expr = expr.trim();
    if !IDENTIFIER_PATH.is_match(expr) {
        return evaluate(expr, scope);
    }
    let mut parts = expr.split('.');
    let mut value = match parts.next().and_then(|first| scope.get(first)) {
        Some(value) if !value.is_null() => value.clone(),
        _ => return Value::from(""),
    };
    for part in parts {
        value = match lookup_value(&value, part) {
            Some(next) if !next.is_null() => next,
            _ => return Value::from(""),
        };
    }
    value
}

/// Items a value yields under `{#each}`: list items, sorted map keys or
/// characters. `None` for anything else.
pub fn iterate(value: &Value) -> Option<Vec<Value>> {
    match value {
        Value::List(items) => Some(items.clone()),
        Value::Map(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            Some(keys.into_iter().map(|key| Value::from(key.as_str())).collect())
        }
        Value::String(s) => Some(s.chars().map(Value::from).collect()),
        _ => None,
    }
}

struct If;

impl Directive for If {
    fn evaluate(&self, parser: &Parser, token: &Token<'_>, scope: &Scope<'_>, out: &mut Vec<Element>) {
        let slot = if evaluate(token.extra, scope).is_truthy() {
            DEFAULT_SLOT
        } else {
            "else"
        };
        parser.evaluate_nodes(token.slot(slot), scope, out);
    }
}

struct Each;

impl Directive for Each {
    fn evaluate(&self, parser: &Parser, token: &Token<'_>, scope: &Scope<'_>, out: &mut Vec<Element>) {
        let mut parts = EACH_SPLIT.splitn(token.extra, 2);
        let (Some(expr), Some(ident)) = (parts.next(), parts.next()) else {
            debug!(source = token.source, "each without `as` binding");
            return;
        };
        let ident = ident.trim();
        let items = interpolate(expr, scope);
        let Some(items) = iterate(&items) else {
            debug!(source = token.source, kind = items.kind(), "each over a non-iterable value");
            return;
        };
        for item in &items {
            parser.evaluate_nodes(token.slot(DEFAULT_SLOT), &scope.child(ident, item), out);
        }
    }
}

const IF: If = If;
const EACH: Each = Each;

/// Adds the built-in `if` and `each` directives
pub fn add_builtins(map: &mut DirectiveMap) {
    map.insert("if", &IF);
    map.insert("each", &EACH);
}

/// Turns markup into elements with a fixed set of options and directives.
pub struct Parser {
    options: Options,
    directives: DirectiveMap,
}

impl Parser {
    pub fn new(options: Options) -> Self {
        let mut directives = DirectiveMap::new();
        add_builtins(&mut directives);
        Parser { options, directives }
    }

    pub fn with_directives(options: Options, directives: DirectiveMap) -> Self {
        Parser { options, directives }
    }

    pub fn parse(&self, src: &str) -> Vec<Element> {
        self.parse_with(src, &Map::new())
    }

    pub fn parse_with(&self, src: &str, vars: &Map) -> Vec<Element> {
        let nodes = fold(tokenize(src, &self.options));
        let mut out = Vec::new();
        self.evaluate_nodes(&nodes, &Scope::new(vars), &mut out);
        out
    }

    fn parse_attrs(&self, extra: &str, scope: &Scope<'_>) -> Map {
        let pattern = if self.options.templated { &*TEMPLATED_ATTR } else { &*ATTR };
        let mut attrs = Map::new();
        for caps in pattern.captures_iter(extra) {
            let key = caps.get(1).map_or("", |m| m.as_str());
            let value = if let Some(curly) = caps.get(4).filter(|_| self.options.templated) {
                interpolate(curly.as_str(), scope)
            } else if let Some(quoted) = caps.get(3).or_else(|| caps.get(2)) {
                Value::String(unescape(quoted.as_str()))
            } else if let Some(negated) = key.strip_prefix("no-") {
                attrs.insert(negated.to_string(), Value::Bool(false));
                continue;
            } else {
                Value::Bool(true)
            };
            attrs.insert(key.to_string(), value);
        }
        attrs
    }

    /// Evaluates a slot's nodes into `out`. Directives call this for the
    /// slots they select.
    pub fn evaluate_nodes(&self, nodes: &[Node<'_>], scope: &Scope<'_>, out: &mut Vec<Element>) {
        for node in nodes {
            let token = match node {
                Node::Text(text) => {
                    out.push(Element::text(text.as_str()));
                    continue;
                }
                Node::Token(token) => token,
            };
            if token.kind == TokenKind::Angle {
                let attrs = self.parse_attrs(token.extra, scope);
                let mut children = Vec::new();
                self.evaluate_nodes(token.slot(DEFAULT_SLOT), scope, &mut children);
                out.push(Element::new(token.name, attrs, children));
                continue;
            }
            if token.name.is_empty() {
                out.extend(make_elements(interpolate(token.extra, scope)));
                continue;
            }
            match self.directives.get(token.name) {
                Some(directive) => directive.evaluate(self, token, scope, out),
                None => debug!(name = token.name, source = token.source, "unknown directive"),
            }
        }
    }
}

/// Parses plain markup. Braces are literal text.
pub fn parse(src: &str) -> Vec<Element> {
    PLAIN.parse(src)
}

/// Parses a template, evaluating directives against `vars`.
pub fn render(src: &str, vars: &Map) -> Vec<Element> {
    TEMPLATED.parse_with(src, vars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::to_markup;

    fn vars(json: serde_json::Value) -> Map {
        match Value::from(json) {
            Value::Map(map) => map,
            _ => Map::new(),
        }
    }

    fn render_str(src: &str, json: serde_json::Value) -> String {
        to_markup(&render(src, &vars(json)), false)
    }

    #[test]
    fn plain_round_trip() {
        let elements = parse(r#"<x a="1" b='2' c no-d>&lt;t&gt;</x><!--ignored-->"#);
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].to_string(), r#"<x a="1" b="2" c no-d>&lt;t&gt;</x>"#);
        assert_eq!(elements[0].attr("d"), Some(&Value::Bool(false)));
    }

    #[test]
    fn plain_mode_keeps_braces() {
        assert_eq!(to_markup(&parse("<p>{x}</p>"), false), "<p>{x}</p>");
    }

    #[test]
    fn conditionals() {
        let src = "{#if ok}YES{:else}NO{/if}";
        assert_eq!(render_str(src, serde_json::json!({"ok": false})), "NO");
        assert_eq!(render_str(src, serde_json::json!({"ok": 1})), "YES");
        assert_eq!(render_str("{#if ok}YES{/if}", serde_json::json!({})), "");
    }

    #[test]
    fn iteration() {
        let src = "{#each items as item}{item}{/each}";
        assert_eq!(render_str(src, serde_json::json!({"items": [1, 2]})), "12");
        assert_eq!(render_str(src, serde_json::json!({"items": {"b": 1, "a": 2}})), "ab");
        assert_eq!(render_str(src, serde_json::json!({"items": "xy"})), "xy");
        assert_eq!(render_str(src, serde_json::json!({"items": 3})), "");
        assert_eq!(render_str("{#each items}{/each}", serde_json::json!({"items": [1]})), "");
    }

    #[test]
    fn loop_binding_does_not_leak() {
        let src = "{#each items as x}{x}{/each}{x}";
        assert_eq!(render_str(src, serde_json::json!({"items": [1, 2], "x": "!"})), "12!");
    }

    #[test]
    fn curly_attributes_keep_their_type() {
        let elements = render(
            r#"<at id={user.id} name="{user.name}" flag={user.flag}/>"#,
            &vars(serde_json::json!({"user": {"id": 7, "name": "n", "flag": true}})),
        );
        assert_eq!(elements[0].attr("id"), Some(&Value::Int(7)));
        assert_eq!(elements[0].attr("name"), Some(&Value::from("{user.name}")));
        assert_eq!(elements[0].attr("flag"), Some(&Value::Bool(true)));
        assert_eq!(elements[0].to_string(), r#"<at flag id="7" name="{user.name}"/>"#);
    }

    #[test]
    fn failed_expressions_render_empty() {
        assert_eq!(render_str("<p>{x / 0}|{missing.path}|{@ 1 + 1}</p>", serde_json::json!({"x": 1})), "<p>||2</p>");
    }

    #[test]
    fn interpolation_fast_path() {
        let map = vars(serde_json::json!({"a": {"b": {"c": "deep"}}, "n": null}));
        let scope = Scope::new(&map);
        assert_eq!(interpolate(" a.b.c ", &scope), Value::from("deep"));
        assert_eq!(interpolate("a.x.c", &scope), Value::from(""));
        assert_eq!(interpolate("n", &scope), Value::from(""));
        assert_eq!(interpolate("1.5", &scope), Value::Float(1.5));
    }

    struct Unless;

    impl Directive for Unless {
        fn evaluate(&self, parser: &Parser, token: &Token<'_>, scope: &Scope<'_>, out: &mut Vec<Element>) {
            if !evaluate(token.extra, scope).is_truthy() {
                parser.evaluate_nodes(token.slot(DEFAULT_SLOT), scope, out);
            }
        }
    }

    const UNLESS: Unless = Unless;

    #[test]
    fn custom_directives() {
        let mut directives = DirectiveMap::new();
        add_builtins(&mut directives);
        directives.insert("unless", &UNLESS);
        let parser = Parser::with_directives(Options { templated: true }, directives);
        let out = parser.parse_with("{#unless ok}no{/unless}{#what}x{/what}", &vars(serde_json::json!({"ok": false})));
        assert_eq!(to_markup(&out, false), "no");
    }
}
