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

//! Generic attributed tree
//!
//! [`Element`] is what template evaluation produces and what typed message
//! elements are built from. Text nodes have kind `text` and carry their
//! payload in the `text` attribute.

use std::fmt::{self, Display};

use crate::{
    text::{camel_case, escape, param_case},
    value::{Map, Value},
};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    kind: String,
    attrs: Map,
    children: Vec<Element>,
}

impl Element {
    /// Builds an element, normalizing its attributes.
    ///
    /// Keys are camel-cased and null values dropped. A `children` attribute
    /// is turned into child nodes with [`make_elements`]. For `text`
    /// elements, `content` is renamed to `text` and an attribute-less node
    /// gets an empty `text`.
    pub fn new(kind: impl Into<String>, attrs: Map, children: Vec<Element>) -> Self {
        let mut element = Element {
            kind: kind.into(),
            attrs: Map::with_capacity(attrs.len()),
            children: Vec::new(),
        };
        for (key, value) in attrs {
            if value.is_null() {
                continue;
            }
            if key == "children" {
                element.children.extend(make_elements(value));
                continue;
            }
            element.attrs.insert(camel_case(&key), value);
        }
        element.children.extend(children);

        if element.kind == "text" {
            if let Some(content) = element.attrs.shift_remove("content") {
                element.attrs.insert("text".into(), content);
            } else if element.attrs.is_empty() {
                element.attrs.insert("text".into(), Value::from(""));
            }
        }
        element
    }

    pub fn text(text: impl Into<String>) -> Self {
        let mut attrs = Map::with_capacity(1);
        attrs.insert("text".into(), Value::String(text.into()));
        Element::new("text", attrs, Vec::new())
    }

    pub fn tag(&self) -> &str {
        &self.kind
    }

    pub fn is_text(&self) -> bool {
        self.kind == "text"
    }

    pub fn attrs(&self) -> &Map {
        &self.attrs
    }

    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attrs.get(key)
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn push_child(&mut self, child: Element) {
        self.children.push(child);
    }

    fn attributes(&self) -> String {
        let mut keys: Vec<&String> = self.attrs.keys().collect();
        keys.sort();

        let mut out = String::new();
        for key in keys {
            let key_text = param_case(key);
            match &self.attrs[key.as_str()] {
                Value::Null => {}
                Value::Bool(true) => {
                    out.push(' ');
                    out.push_str(&key_text);
                }
                Value::Bool(false) => {
                    out.push_str(" no-");
                    out.push_str(&key_text);
                }
                value => {
                    out.push(' ');
                    out.push_str(&key_text);
                    out.push_str("=\"");
                    out.push_str(&escape(&value.to_string(), true));
                    out.push('"');
                }
            }
        }
        out
    }

    /// Serializes the subtree. In strip mode only text content is emitted,
    /// unescaped and without tags.
    pub fn to_markup(&self, strip: bool) -> String {
        if self.is_text() {
            let text = self.attrs.get("text").map(Value::to_string).unwrap_or_default();
            return if strip { text } else { escape(&text, false) };
        }

        let inner: String = self.children.iter().map(|child| child.to_markup(strip)).collect();
        if strip {
            return inner;
        }

        let attrs = self.attributes();
        if self.children.is_empty() {
            format!("<{}{}/>", self.kind, attrs)
        } else {
            format!("<{}{}>{}</{}>", self.kind, attrs, inner, self.kind)
        }
    }

    /// Concatenated text content of the subtree.
    pub fn strip(&self) -> String {
        self.to_markup(true)
    }
}

impl Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_markup(false))
    }
}

/// Turns a scalar into a text node. Null, empty strings and non-scalar
/// values produce nothing.
pub fn make_element(content: Value) -> Option<Element> {
    match content {
        Value::Bool(_) | Value::Int(_) | Value::Float(_) => Some(Element::text(content.to_string())),
        Value::String(s) if !s.is_empty() => Some(Element::text(s)),
        _ => None,
    }
}

/// Like [`make_element`] but a list expands element-wise.
pub fn make_elements(content: Value) -> Vec<Element> {
    match content {
        Value::Null => Vec::new(),
        Value::List(items) => items.into_iter().filter_map(make_element).collect(),
        other => make_element(other).into_iter().collect(),
    }
}

/// Serializes a sibling list.
pub fn to_markup(elements: &[Element], strip: bool) -> String {
    elements.iter().map(|element| element.to_markup(strip)).collect()
}
