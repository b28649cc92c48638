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

//! Value to Rust type conversions
//!
//! Null converts to the target's zero value. Numbers convert between each
//! other with range checks, floats truncating toward zero; numeric and
//! boolean strings are parsed. Anything else is an unsupported conversion
//! naming both sides.

use std::{
    any::type_name,
    collections::{BTreeMap, HashMap},
    hash::{BuildHasher, Hash},
};

use indexmap::IndexMap;

use crate::{
    error::ConvertError,
    value::{Map, Value},
};

/// Conversion from a dynamic [`Value`].
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, ConvertError>;
}

fn unsupported<T>(value: &Value) -> ConvertError {
    ConvertError::Unsupported {
        from: value.kind(),
        to: type_name::<T>(),
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        Ok(value.clone())
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        Ok(match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        match value {
            Value::Null => Ok(false),
            Value::Bool(b) => Ok(*b),
            Value::String(s) => parse_bool(s).ok_or_else(|| ConvertError::Parse {
                value: s.clone(),
                to: "bool",
            }),
            other => Err(unsupported::<bool>(other)),
        }
    }
}

fn float_to_wide(f: f64, to: &'static str) -> Result<i128, ConvertError> {
    if !f.is_finite() {
        return Err(ConvertError::OutOfRange {
            value: f.to_string(),
            to,
        });
    }
    Ok(f.trunc() as i128)
}

fn to_wide(value: &Value, to: &'static str) -> Result<i128, ConvertError> {
    match value {
        Value::Null => Ok(0),
        Value::Int(i) => Ok(i128::from(*i)),
        Value::Float(f) => float_to_wide(*f, to),
        Value::String(s) => s.parse().map_err(|_| ConvertError::Parse {
            value: s.clone(),
            to,
        }),
        other => Err(ConvertError::Unsupported {
            from: other.kind(),
            to,
        }),
    }
}

macro_rules! from_value_int {
    ($($t:ty),*) => {$(
        impl FromValue for $t {
            fn from_value(value: &Value) -> Result<Self, ConvertError> {
                let to = stringify!($t);
                if <$t>::MIN == 0 && matches!(value, Value::Float(f) if *f < 0.0) {
                    return Err(ConvertError::Negative { value: value.to_string(), to });
                }
                let wide = to_wide(value, to)?;
                if wide < 0 && <$t>::MIN == 0 {
                    return Err(ConvertError::Negative { value: wide.to_string(), to });
                }
                <$t>::try_from(wide).map_err(|_| ConvertError::OutOfRange { value: wide.to_string(), to })
            }
        }
    )*};
}

from_value_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        match value {
            Value::Null => Ok(0.0),
            Value::Int(i) => Ok(*i as f64),
            Value::Float(f) => Ok(*f),
            Value::String(s) => s.parse().map_err(|_| ConvertError::Parse {
                value: s.clone(),
                to: "f64",
            }),
            other => Err(unsupported::<f64>(other)),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        f64::from_value(value).map(|f| f as f32)
    }
}

impl FromValue for char {
    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        let parse_err = || ConvertError::Parse {
            value: value.to_string(),
            to: "char",
        };
        match value {
            Value::Null => Ok('\0'),
            Value::String(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(c),
                    _ => Err(parse_err()),
                }
            }
            Value::Int(i) => u32::try_from(*i).ok().and_then(char::from_u32).ok_or_else(parse_err),
            other => Err(unsupported::<char>(other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: FromValue> FromValue for Box<T> {
    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        T::from_value(value).map(Box::new)
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        match value {
            Value::Null => Ok(Vec::new()),
            Value::List(items) => items.iter().map(T::from_value).collect(),
            other => Err(unsupported::<Self>(other)),
        }
    }
}

fn convert_entries<K, V, C>(map: &Map) -> Result<C, ConvertError>
where
    K: FromValue,
    V: FromValue,
    C: FromIterator<(K, V)>,
{
    map.iter()
        .map(|(key, value)| -> Result<(K, V), ConvertError> {
            Ok((K::from_value(&Value::String(key.clone()))?, V::from_value(value)?))
        })
        .collect()
}

fn map_entries<K, V, C>(value: &Value) -> Result<C, ConvertError>
where
    K: FromValue,
    V: FromValue,
    C: FromIterator<(K, V)>,
{
    match value {
        Value::Null => Ok(std::iter::empty::<(K, V)>().collect()),
        Value::Map(map) => convert_entries(map),
        Value::Record(record) => convert_entries(&record.to_map()),
        other => Err(unsupported::<C>(other)),
    }
}

impl<K, V, S> FromValue for HashMap<K, V, S>
where
    K: FromValue + Eq + Hash,
    V: FromValue,
    S: BuildHasher + Default,
{
    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        map_entries(value)
    }
}

impl<K, V> FromValue for BTreeMap<K, V>
where
    K: FromValue + Ord,
    V: FromValue,
{
    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        map_entries(value)
    }
}

impl<K, V, S> FromValue for IndexMap<K, V, S>
where
    K: FromValue + Eq + Hash,
    V: FromValue,
    S: BuildHasher + Default,
{
    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        map_entries(value)
    }
}
