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

//! Attribute binding
//!
//! Populates typed records from untyped attribute maps. A record declares
//! its fields with `#[derive(Bind)]`; on first use the declaration is
//! turned into a [`BindingPlan`] that lists, per field, the keys to look up
//! in order and whether the field is required. Plans are cached for the
//! life of the process.
//!
//! Key resolution for a field, first present key wins:
//!
//! 1. `#[attr(name = "..")]`
//! 2. `#[serde(rename = "..")]`
//! 3. the field name, its lower-first variant and its camelCase variant
//!
//! Only `pub` fields are bound; the rest keep their default. A field is
//! required unless `#[attr(omitempty)]` or `#[serde(default)]`
//! is present; absent optional fields keep their default.
//!
//! ```rust
//! use satori_xhtml::{bind::bind_attrs, Bind, Map, Value};
//!
//! #[derive(Bind, Debug, Default)]
//! struct At {
//!     pub id: String,
//!     #[attr(omitempty)]
//!     pub name: Option<String>,
//! }
//!
//! let mut attrs = Map::new();
//! attrs.insert("id".into(), Value::Int(42));
//! let at: At = bind_attrs(&attrs).unwrap();
//! assert_eq!(at.id, "42");
//! assert_eq!(at.name, None);
//! ```

pub mod convert;

use std::{
    any::TypeId,
    collections::{HashMap, hash_map::Entry},
    sync::{Arc, OnceLock},
};

use parking_lot::RwLock;
use tracing::trace;

pub use convert::FromValue;

use crate::{
    error::{BindError, ConvertError},
    text::{camel_case, uncapitalize},
    value::{Map, Value},
};

/// Static description of one bindable field, emitted by `#[derive(Bind)]`.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Rust field name
    pub name: &'static str,
    /// `#[attr(name = "..")]`
    pub primary: Option<&'static str>,
    /// `#[serde(rename = "..")]`
    pub secondary: Option<&'static str>,
    pub optional: bool,
    pub ty: &'static str,
}

/// A record that can be populated from an attribute map.
///
/// Implemented by `#[derive(Bind)]`. The derive also implements
/// [`FromValue`] so bindable records nest inside each other.
pub trait Bind: Sized + 'static {
    const SHAPE: &'static str;
    const FIELDS: &'static [FieldSpec];

    /// Builds a new record. Field `i` of the plan is `FIELDS[i]`.
    fn from_plan(plan: &BindingPlan, attrs: &Map) -> Result<Self, BindError>;

    /// Overwrites the fields found in `attrs`. Nothing is written unless
    /// every field converts.
    fn merge_plan(&mut self, plan: &BindingPlan, attrs: &Map) -> Result<(), BindError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPlan {
    pub name: &'static str,
    pub keys: Vec<String>,
    pub ty: &'static str,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingPlan {
    pub shape: &'static str,
    pub fields: Vec<FieldPlan>,
}

fn push_unique(keys: &mut Vec<String>, key: &str) {
    if !key.is_empty() && !keys.iter().any(|k| k == key) {
        keys.push(key.to_string());
    }
}

impl BindingPlan {
    pub fn build(shape: &'static str, specs: &[FieldSpec]) -> Self {
        let fields = specs
            .iter()
            .map(|spec| {
                let mut keys = Vec::with_capacity(4);
                for key in [spec.primary, spec.secondary].into_iter().flatten() {
                    push_unique(&mut keys, key);
                }
                push_unique(&mut keys, spec.name);
                push_unique(&mut keys, &uncapitalize(spec.name));
                push_unique(&mut keys, &camel_case(spec.name));
                FieldPlan {
                    name: spec.name,
                    keys,
                    ty: spec.ty,
                    required: !spec.optional,
                }
            })
            .collect();
        BindingPlan { shape, fields }
    }

    fn find<'m>(&self, index: usize, attrs: &'m Map) -> Option<(&FieldPlan, Option<&'m Value>)> {
        let field = self.fields.get(index)?;
        Some((field, field.keys.iter().find_map(|key| attrs.get(key.as_str()))))
    }

    /// Converts field `index`, or `None` when none of its keys is present.
    pub fn optional<T: FromValue>(&self, index: usize, attrs: &Map) -> Result<Option<T>, BindError> {
        let Some((field, value)) = self.find(index, attrs) else {
            return Ok(None);
        };
        value
            .map(|value| {
                T::from_value(value).map_err(|source| BindError::Field {
                    field: field.name,
                    source,
                })
            })
            .transpose()
    }

    /// Converts field `index`, failing when none of its keys is present.
    pub fn require<T: FromValue>(&self, index: usize, attrs: &Map) -> Result<T, BindError> {
        match self.optional(index, attrs)? {
            Some(value) => Ok(value),
            None => {
                let field = self.fields.get(index);
                Err(BindError::Missing {
                    field: field.map_or("?", |f| f.name),
                    keys: field.map(|f| f.keys.clone()).unwrap_or_default(),
                })
            }
        }
    }
}

static PLANS: OnceLock<RwLock<HashMap<TypeId, Arc<BindingPlan>>>> = OnceLock::new();

fn plans() -> &'static RwLock<HashMap<TypeId, Arc<BindingPlan>>> {
    PLANS.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Returns the cached plan for `T`, building it on first use.
///
/// Concurrent first uses may each build a plan; the first one installed is
/// kept and the others are dropped.
pub fn plan_of<T: Bind>() -> Arc<BindingPlan> {
    let key = TypeId::of::<T>();
    if let Some(plan) = plans().read().get(&key) {
        return Arc::clone(plan);
    }

    let built = Arc::new(BindingPlan::build(T::SHAPE, T::FIELDS));
    trace!(shape = T::SHAPE, fields = built.fields.len(), "built binding plan");
    match plans().write().entry(key) {
        Entry::Occupied(entry) => {
            trace!(shape = T::SHAPE, "binding plan already installed, dropping ours");
            Arc::clone(entry.get())
        }
        Entry::Vacant(entry) => Arc::clone(entry.insert(built)),
    }
}

/// Builds a `T` from `attrs`.
pub fn bind_attrs<T: Bind>(attrs: &Map) -> Result<T, BindError> {
    T::from_plan(&plan_of::<T>(), attrs)
}

/// Binds `attrs` onto an existing record. A missing map binds like an empty
/// one; a missing target is an error.
pub fn unmarshal_attrs<T: Bind>(target: Option<&mut T>, attrs: Option<&Map>) -> Result<(), BindError> {
    let target = target.ok_or(BindError::NilTarget)?;
    let empty = Map::new();
    target.merge_plan(&plan_of::<T>(), attrs.unwrap_or(&empty))
}

/// Conversion used for nested records: maps bind recursively, null gives
/// the default record and record handles bind from their fields.
pub fn from_record_value<T: Bind + Default>(value: &Value) -> Result<T, ConvertError> {
    let bound = match value {
        Value::Map(map) => bind_attrs(map),
        Value::Null => return Ok(T::default()),
        Value::Record(record) => bind_attrs(&record.to_map()),
        other => {
            return Err(ConvertError::Unsupported {
                from: other.kind(),
                to: T::SHAPE,
            });
        }
    };
    bound.map_err(|err| ConvertError::Record(Box::new(err)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Manual {
        id: i64,
        title: String,
    }

    impl Bind for Manual {
        const SHAPE: &'static str = "Manual";
        const FIELDS: &'static [FieldSpec] = &[
            FieldSpec {
                name: "id",
                primary: Some("ID"),
                secondary: None,
                optional: false,
                ty: "i64",
            },
            FieldSpec {
                name: "title",
                primary: None,
                secondary: Some("heading"),
                optional: true,
                ty: "String",
            },
        ];

        fn from_plan(plan: &BindingPlan, attrs: &Map) -> Result<Self, BindError> {
            Ok(Manual {
                id: plan.require(0, attrs)?,
                title: plan.optional(1, attrs)?.unwrap_or_default(),
            })
        }

        fn merge_plan(&mut self, plan: &BindingPlan, attrs: &Map) -> Result<(), BindError> {
            let id = plan.require(0, attrs)?;
            let title = plan.optional(1, attrs)?;
            self.id = id;
            if let Some(title) = title {
                self.title = title;
            }
            Ok(())
        }
    }

    fn attrs(json: serde_json::Value) -> Map {
        match Value::from(json) {
            Value::Map(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn plan_keys_are_ordered_and_unique() {
        let plan = BindingPlan::build(
            "X",
            &[FieldSpec {
                name: "user_id",
                primary: Some("uid"),
                secondary: Some("uid"),
                optional: false,
                ty: "String",
            }],
        );
        assert_eq!(plan.fields[0].keys, vec!["uid", "user_id", "userId"]);
        assert!(plan.fields[0].required);
    }

    #[test]
    fn plan_is_cached() {
        let first = plan_of::<Manual>();
        let second = plan_of::<Manual>();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn binds_by_first_present_key() {
        let bound: Manual = bind_attrs(&attrs(serde_json::json!({"ID": "12", "id": 99, "heading": "h"}))).unwrap();
        assert_eq!(bound.id, 12);
        assert_eq!(bound.title, "h");
    }

    #[test]
    fn reports_missing_and_bad_fields() {
        let err = bind_attrs::<Manual>(&Map::new()).err().unwrap();
        assert!(matches!(err, BindError::Missing { field: "id", .. }));
        let err = bind_attrs::<Manual>(&attrs(serde_json::json!({"id": "bad-int"}))).err().unwrap();
        assert!(matches!(err, BindError::Field { field: "id", .. }));
    }

    #[test]
    fn unmarshal_keeps_absent_optional_fields() {
        let mut target = Manual {
            id: 1,
            title: "kept".into(),
        };
        unmarshal_attrs(Some(&mut target), Some(&attrs(serde_json::json!({"id": 2})))).unwrap();
        assert_eq!(target.id, 2);
        assert_eq!(target.title, "kept");

        assert!(matches!(
            unmarshal_attrs::<Manual>(None, Some(&Map::new())),
            Err(BindError::NilTarget)
        ));
        assert!(unmarshal_attrs(Some(&mut target), None).is_err());
    }

    #[test]
    fn failed_merge_writes_nothing() {
        let mut target = Manual {
            id: 1,
            title: "kept".into(),
        };
        let result = unmarshal_attrs(Some(&mut target), Some(&attrs(serde_json::json!({"id": "x", "title": "new"}))));
        assert!(result.is_err());
        assert_eq!(target.id, 1);
        assert_eq!(target.title, "kept");
    }

    #[test]
    fn nested_records_from_values() {
        let nested: Manual = from_record_value(&Value::from(serde_json::json!({"id": 3}))).unwrap();
        assert_eq!(nested.id, 3);
        assert!(matches!(
            from_record_value::<Manual>(&Value::Int(1)),
            Err(ConvertError::Unsupported { from: "int", to: "Manual" })
        ));
        let empty: Manual = from_record_value(&Value::Null).unwrap();
        assert_eq!((empty.id, empty.title.as_str()), (0, ""));
        assert!(matches!(
            from_record_value::<Manual>(&Value::from(serde_json::json!({}))),
            Err(ConvertError::Record(_))
        ));
    }

    struct Contended;

    impl Bind for Contended {
        const SHAPE: &'static str = "Contended";
        const FIELDS: &'static [FieldSpec] = &[];

        fn from_plan(_: &BindingPlan, _: &Map) -> Result<Self, BindError> {
            Ok(Contended)
        }

        fn merge_plan(&mut self, _: &BindingPlan, _: &Map) -> Result<(), BindError> {
            Ok(())
        }
    }

    #[test]
    fn concurrent_first_use_keeps_one_plan() {
        let barrier = &std::sync::Barrier::new(8);
        let plans: Vec<Arc<BindingPlan>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    s.spawn(move || {
                        barrier.wait();
                        plan_of::<Contended>()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        let cached = plan_of::<Contended>();
        assert!(plans.iter().all(|plan| Arc::ptr_eq(plan, &cached)));
        assert_eq!(cached.shape, "Contended");
    }
}
