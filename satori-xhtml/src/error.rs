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

//! Error types
//!
//! Binding and typed-element construction report failures as values that
//! name the offending field or tag. Expression failures are only ever seen
//! by callers of [`crate::expression`]; the template layer turns them into
//! empty output.

use thiserror::Error;

/// Returns the first 32 characters of an expression for error context.
pub(crate) fn cap(src: &str) -> &str {
    const CAP_AT: usize = 32;

    match src.char_indices().nth(CAP_AT) {
        Some((end, _)) => &src[..end],
        None => src,
    }
}

/// A value that cannot become the requested Rust type.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("unsupported conversion: {from} -> {to}")]
    Unsupported { from: &'static str, to: &'static str },
    #[error("cannot parse {value:?} as {to}")]
    Parse { value: String, to: &'static str },
    #[error("{value} does not fit in {to}")]
    OutOfRange { value: String, to: &'static str },
    #[error("negative value {value} for {to}")]
    Negative { value: String, to: &'static str },
    #[error(transparent)]
    Record(Box<BindError>),
}

/// Failure to populate a record from an attribute map.
#[derive(Debug, Error)]
pub enum BindError {
    #[error("bind target is nil")]
    NilTarget,
    #[error("missing required attr for field {field} (keys: {})", .keys.join(","))]
    Missing { field: &'static str, keys: Vec<String> },
    #[error("field {field}: {source}")]
    Field {
        field: &'static str,
        #[source]
        source: ConvertError,
    },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExprError {
    #[error("{message} near \"{near}\"")]
    Syntax { message: String, near: String },
    #[error("unknown identifier: {0}")]
    UnknownIdentifier(String),
    #[error("function calls are not supported near \"{0}\"")]
    Call(String),
    #[error("unsupported operand {kind} for unary {op}")]
    Unary { op: &'static str, kind: &'static str },
    #[error("unsupported operands {left} {op} {right}")]
    Binary {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },
    #[error("division by zero")]
    DivisionByZero,
    #[error("{kind} has no member {name}")]
    Member { name: String, kind: &'static str },
    #[error("invalid index {index} into {kind}")]
    Index { index: String, kind: &'static str },
}

impl ExprError {
    pub(crate) fn syntax(message: impl Into<String>, near: &str) -> Self {
        ExprError::Syntax {
            message: message.into(),
            near: cap(near).to_string(),
        }
    }
}

/// Failure to turn an [`Element`](crate::Element) tree into typed nodes.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("cannot build <{tag}>: {source}")]
    Bind {
        tag: String,
        #[source]
        source: BindError,
    },
    #[error("no element registered for <{tag}>")]
    Unregistered { tag: String },
    #[error("in <{tag}>: {source}")]
    Child {
        tag: String,
        #[source]
        source: Box<TransformError>,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    #[error("tag <{0}> is already registered")]
    AlreadyRegistered(String),
    #[error("cannot alias unregistered tag <{0}>")]
    UnknownTag(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_field() {
        let err = BindError::Field {
            field: "id",
            source: ConvertError::Parse {
                value: "x".into(),
                to: "i64",
            },
        };
        assert_eq!(err.to_string(), r#"field id: cannot parse "x" as i64"#);

        let err = BindError::Missing {
            field: "id",
            keys: vec!["id".into(), "Id".into()],
        };
        assert_eq!(err.to_string(), "missing required attr for field id (keys: id,Id)");
    }

    #[test]
    fn cap_limits_context() {
        assert_eq!(cap("short"), "short");
        assert_eq!(cap(&"x".repeat(40)).len(), 32);
    }
}
