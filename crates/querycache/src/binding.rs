// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Bound query parameters.

use serde_json::{Number, Value};

/// A scalar value bound to a placeholder in a query.
///
/// Bindings take part in cache key derivation, so two queries that differ only
/// in a bound value address different cache entries.
#[derive(Clone, Debug, PartialEq)]
pub enum Binding {
    /// SQL `NULL`.
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A floating point number. Non-finite values are keyed as
    /// `{"float":"NaN"}`, `{"float":"inf"}` or `{"float":"-inf"}`.
    Float(f64),
    /// Text.
    Text(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
}

impl From<&Binding> for Value {
    fn from(binding: &Binding) -> Self {
        match binding {
            Binding::Null => Self::Null,
            Binding::Bool(b) => Self::Bool(*b),
            Binding::Int(n) => Self::from(*n),
            Binding::Float(f) => Number::from_f64(*f).map_or_else(|| non_finite(*f), Self::Number),
            Binding::Text(s) => Self::String(s.clone()),
            Binding::Bytes(bytes) => Self::Array(bytes.iter().map(|b| Self::from(*b)).collect()),
        }
    }
}

// Objects are never produced by any other binding, so these cannot collide.
fn non_finite(f: f64) -> Value {
    let tag = if f.is_nan() {
        "NaN"
    } else if f.is_sign_positive() {
        "inf"
    } else {
        "-inf"
    };
    serde_json::json!({ "float": tag })
}

macro_rules! int_binding {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Binding {
                fn from(value: $ty) -> Self {
                    Self::Int(i64::from(value))
                }
            }
        )*
    };
}

int_binding!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Binding {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f32> for Binding {
    fn from(value: f32) -> Self {
        Self::Float(f64::from(value))
    }
}

impl From<f64> for Binding {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Binding {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Binding {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<u8>> for Binding {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl<T> From<Option<T>> for Binding
where
    T: Into<Self>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
