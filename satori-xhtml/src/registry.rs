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

//! Typed element construction
//!
//! A [`Registry`] maps tag names to constructors that build a typed node
//! from an attribute map, usually through [`bind_attrs`](crate::bind::bind_attrs).
//! [`Registry::transform`] walks a generic [`Element`] tree and builds the
//! typed tree, appending children after their parent has been built.

use std::collections::HashMap;

use tracing::trace;

use crate::{
    element::Element,
    error::{BindError, RegistryError, TransformError},
    value::Map,
};

/// Operations a typed element tree offers back to the markup layer.
pub trait TypedElement: Sized {
    fn tag(&self) -> &str;

    fn push_child(&mut self, child: Self);

    /// Serializes the node; in strip mode only text content is kept.
    fn to_markup(&self, strip: bool) -> String;
}

pub type Constructor<T> = fn(&Map) -> Result<T, BindError>;

/// Builds nodes for tags nothing was registered for.
pub type Fallback<T> = fn(&str, &Map) -> Result<T, BindError>;

pub struct Registry<T> {
    constructors: HashMap<String, Constructor<T>>,
    fallback: Option<Fallback<T>>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Registry {
            constructors: HashMap::new(),
            fallback: None,
        }
    }
}

impl<T: TypedElement> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fallback(mut self, fallback: Fallback<T>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Registers `constructor` for `tag`. A tag can only be registered once.
    pub fn register(&mut self, tag: &str, constructor: Constructor<T>) -> Result<(), RegistryError> {
        if self.contains(tag) {
            return Err(RegistryError::AlreadyRegistered(tag.to_string()));
        }
        self.constructors.insert(tag.to_string(), constructor);
        Ok(())
    }

    /// Makes `alias` build the same node as the already registered `tag`.
    pub fn register_alias(&mut self, alias: &str, tag: &str) -> Result<(), RegistryError> {
        let constructor = *self
            .constructors
            .get(tag)
            .ok_or_else(|| RegistryError::UnknownTag(tag.to_string()))?;
        self.register(alias, constructor)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.constructors.contains_key(tag)
    }

    /// Builds a single node without its children.
    pub fn construct(&self, tag: &str, attrs: &Map) -> Result<T, TransformError> {
        let built = match (self.constructors.get(tag), self.fallback) {
            (Some(constructor), _) => constructor(attrs),
            (None, Some(fallback)) => {
                trace!(tag, "no constructor registered, using fallback");
                fallback(tag, attrs)
            }
            (None, None) => {
                return Err(TransformError::Unregistered { tag: tag.to_string() });
            }
        };
        built.map_err(|source| TransformError::Bind {
            tag: tag.to_string(),
            source,
        })
    }

    /// Builds the typed tree for `elements`.
    pub fn transform(&self, elements: &[Element]) -> Result<Vec<T>, TransformError> {
        elements
            .iter()
            .map(|element| {
                let mut node = self.construct(element.tag(), element.attrs())?;
                let children = self.transform(element.children()).map_err(|source| TransformError::Child {
                    tag: element.tag().to_string(),
                    source: Box::new(source),
                })?;
                for child in children {
                    node.push_child(child);
                }
                Ok(node)
            })
            .collect()
    }
}

/// Serializes a typed sibling list.
pub fn to_markup<T: TypedElement>(nodes: &[T], strip: bool) -> String {
    nodes.iter().map(|node| node.to_markup(strip)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{template::parse, value::Value};

    #[derive(Debug)]
    struct Node {
        tag: String,
        text: String,
        children: Vec<Node>,
    }

    impl TypedElement for Node {
        fn tag(&self) -> &str {
            &self.tag
        }

        fn push_child(&mut self, child: Self) {
            self.children.push(child);
        }

        fn to_markup(&self, strip: bool) -> String {
            let inner: String = self.children.iter().map(|c| c.to_markup(strip)).collect();
            if strip || self.tag == "text" {
                format!("{}{}", self.text, inner)
            } else {
                format!("[{}]{}[/{}]", self.tag, inner, self.tag)
            }
        }
    }

    fn text(attrs: &Map) -> Result<Node, BindError> {
        Ok(Node {
            tag: "text".into(),
            text: attrs.get("text").map(Value::to_string).unwrap_or_default(),
            children: Vec::new(),
        })
    }

    fn bold(_: &Map) -> Result<Node, BindError> {
        Ok(Node {
            tag: "b".into(),
            text: String::new(),
            children: Vec::new(),
        })
    }

    fn strict(_: &Map) -> Result<Node, BindError> {
        Err(BindError::Missing {
            field: "id",
            keys: vec!["id".into()],
        })
    }

    fn registry() -> Registry<Node> {
        let mut registry = Registry::new();
        registry.register("text", text).unwrap();
        registry.register("b", bold).unwrap();
        registry.register_alias("strong", "b").unwrap();
        registry.register("at", strict).unwrap();
        registry
    }

    #[test]
    fn transforms_nested_elements() {
        let nodes = registry().transform(&parse("a<b>x<strong>y</strong></b>")).unwrap();
        assert_eq!(to_markup(&nodes, false), "a[b]x[b]y[/b][/b]");
        assert_eq!(to_markup(&nodes, true), "axy");
    }

    #[test]
    fn refuses_duplicates_and_unknown_aliases() {
        let mut registry = registry();
        assert!(registry.contains("strong"));
        assert!(!registry.contains("em"));
        assert_eq!(registry.register("b", bold), Err(RegistryError::AlreadyRegistered("b".into())));
        assert_eq!(
            registry.register_alias("i", "em"),
            Err(RegistryError::UnknownTag("em".into()))
        );
    }

    #[test]
    fn reports_the_failing_tag() {
        let err = registry().transform(&parse("<b><at/></b>")).unwrap_err();
        match err {
            TransformError::Child { tag, source } => {
                assert_eq!(tag, "b");
                assert!(matches!(*source, TransformError::Bind { ref tag, .. } if tag == "at"));
            }
            other => panic!("unexpected error {other}"),
        }
        assert!(matches!(
            registry().transform(&parse("<video/>")),
            Err(TransformError::Unregistered { .. })
        ));
    }

    #[test]
    fn fallback_builds_unknown_tags() {
        fn extension(tag: &str, _: &Map) -> Result<Node, BindError> {
            Ok(Node {
                tag: tag.to_string(),
                text: String::new(),
                children: Vec::new(),
            })
        }
        let registry = registry().with_fallback(extension);
        let nodes = registry.transform(&parse("<video/>")).unwrap();
        assert_eq!(nodes[0].tag(), "video");
    }
}
