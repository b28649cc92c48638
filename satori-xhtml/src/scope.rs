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

//! Variable lookup for templated parsing.
//!
//! A scope is the caller's context map plus a chain of single loop
//! bindings. `each` pushes a child scope instead of copying the context,
//! so bindings made inside a loop never leak past it.

use crate::value::{Map, Value};

#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    vars: &'a Map,
    local: Option<(&'a str, &'a Value)>,
    parent: Option<&'a Scope<'a>>,
}

impl<'a> Scope<'a> {
    pub fn new(vars: &'a Map) -> Self {
        Scope {
            vars,
            local: None,
            parent: None,
        }
    }

    /// A scope where `name` resolves to `value` and everything else falls
    /// through to `self`.
    pub fn child<'b>(&'b self, name: &'b str, value: &'b Value) -> Scope<'b>
    where
        'a: 'b,
    {
        Scope {
            vars: self.vars,
            local: Some((name, value)),
            parent: Some(self),
        }
    }

    pub fn get(&self, name: &str) -> Option<&'a Value> {
        let mut scope = self;
        loop {
            match scope.local {
                Some((key, value)) if key == name => return Some(value),
                _ => {}
            }
            match scope.parent {
                Some(parent) => scope = parent,
                None => return scope.vars.get(name),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_shadows_and_falls_through() {
        let mut vars = Map::new();
        vars.insert("x".into(), Value::from(1));
        vars.insert("y".into(), Value::from(2));
        let root = Scope::new(&vars);
        let three = Value::from(3);
        let inner = root.child("x", &three);
        assert_eq!(inner.get("x"), Some(&Value::from(3)));
        assert_eq!(inner.get("y"), Some(&Value::from(2)));
        assert_eq!(root.get("x"), Some(&Value::from(1)));
        assert_eq!(inner.get("z"), None);
    }
}
