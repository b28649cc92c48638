//! Markup, templates and attribute binding for Satori message elements.
//!
//! Message content travels as an XHTML-like markup string. This crate parses
//! that markup into a generic [`Element`] tree, optionally evaluating a small
//! template language against a context, serializes trees back to markup,
//! queries them with CSS-like selectors and binds element attributes onto
//! typed records.
//!
//! ```rust
//! use satori_xhtml::{render, select, to_markup, Map, Value};
//!
//! let mut vars = Map::new();
//! vars.insert("user".into(), Value::from("42"));
//! let tree = render(r#"hi <at id={user}/>!"#, &vars);
//! assert_eq!(to_markup(&tree, false), r#"hi <at id="42"/>!"#);
//! assert_eq!(select(&tree, "at").len(), 1);
//! ```

extern crate self as satori_xhtml;

pub mod bind;
pub mod element;
pub mod error;
pub mod expression;
pub mod expression_tokenizer;
pub mod fold;
pub mod registry;
pub mod scope;
pub mod selector;
pub mod template;
pub mod text;
pub mod tokenizer;
pub mod value;

pub use bind::{Bind, FromValue, bind_attrs, unmarshal_attrs};
pub use element::{Element, make_element, make_elements, to_markup};
pub use error::{BindError, ConvertError, ExprError, RegistryError, TransformError};
pub use registry::{Registry, TypedElement};
pub use scope::Scope;
pub use selector::{select, select_str};
pub use template::{Options, Parser, parse, render};
pub use value::{Map, Record, ToValue, Value};

pub use satori_xhtml_macros::{Bind, Record};
