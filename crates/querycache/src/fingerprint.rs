// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Deterministic cache keys for queries.
//!
//! A derived key has the form `{Connection}_{model}_{digest}` where `digest` is
//! the lower-case hex SHA-256 of the SQL text followed by the canonical JSON
//! encoding of the bindings. The connection name has its first character
//! upper-cased. The cache prefix is applied by [`cache_key`].

use std::borrow::Cow;

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::Binding;

/// Derives the cache key body for a query.
///
/// The result depends only on its inputs, so it is stable across calls and
/// processes.
///
/// # Examples
///
/// ```
/// use querycache::{Binding, fingerprint};
///
/// let key = fingerprint::derive_key("main", "Order", "SELECT * FROM orders WHERE id = ?", &[Binding::Int(42)]);
/// assert!(key.starts_with("Main_Order_"));
/// ```
#[must_use]
pub fn derive_key(connection: &str, model: &str, sql: &str, bindings: &[Binding]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(sql.as_bytes());
    hasher.update(canonical_bindings(bindings).as_bytes());
    format!("{}_{model}_{}", ucfirst(connection), hex::encode(hasher.finalize()))
}

/// Encodes bindings as a compact JSON array, for example `[42,"a",null]`.
#[must_use]
pub fn canonical_bindings(bindings: &[Binding]) -> String {
    Value::Array(bindings.iter().map(Value::from).collect()).to_string()
}

/// Joins a prefix and a key body: `{prefix}:{body}`.
#[must_use]
pub fn cache_key(prefix: &str, body: &str) -> String {
    format!("{prefix}:{body}")
}

/// Upper-cases the first character of `s` if it is an ASCII lower-case
/// letter. Other characters, including non-ASCII letters, are left alone.
#[must_use]
pub fn ucfirst(s: &str) -> Cow<'_, str> {
    match s.as_bytes().first() {
        Some(first) if first.is_ascii_lowercase() => {
            let mut owned = s.to_owned();
            owned[..1].make_ascii_uppercase();
            Cow::Owned(owned)
        }
        _ => Cow::Borrowed(s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQL: &str = "SELECT * FROM orders WHERE id = ?";

    fn sha256_hex(input: &str) -> String {
        hex::encode(Sha256::digest(input.as_bytes()))
    }

    #[test]
    fn order_scenario_key() {
        let key = cache_key("cacheable", &derive_key("main", "Order", SQL, &[Binding::Int(42)]));

        let expected = format!("cacheable:Main_Order_{}", sha256_hex("SELECT * FROM orders WHERE id = ?[42]"));
        assert_eq!(key, expected);
    }

    #[test]
    fn identical_inputs_give_identical_keys() {
        let a = derive_key("main", "Order", SQL, &[Binding::Int(42)]);
        let b = derive_key("main", "Order", SQL, &[Binding::Int(42)]);
        assert_eq!(a, b);
    }

    #[test]
    fn every_input_affects_the_key() {
        let base = derive_key("main", "Order", SQL, &[Binding::Int(42)]);

        assert_ne!(base, derive_key("replica", "Order", SQL, &[Binding::Int(42)]));
        assert_ne!(base, derive_key("main", "User", SQL, &[Binding::Int(42)]));
        assert_ne!(base, derive_key("main", "Order", "SELECT id FROM orders WHERE id = ?", &[Binding::Int(42)]));
        assert_ne!(base, derive_key("main", "Order", SQL, &[Binding::Int(43)]));
        assert_ne!(base, derive_key("main", "Order", SQL, &[Binding::Text("42".to_owned())]));
        assert_ne!(base, derive_key("main", "Order", SQL, &[]));
    }

    #[test]
    fn null_and_non_finite_floats_give_distinct_keys() {
        let keys = [
            derive_key("main", "Order", "SELECT ?", &[Binding::Null]),
            derive_key("main", "Order", "SELECT ?", &[Binding::Float(f64::NAN)]),
            derive_key("main", "Order", "SELECT ?", &[Binding::Float(f64::INFINITY)]),
            derive_key("main", "Order", "SELECT ?", &[Binding::Float(f64::NEG_INFINITY)]),
        ];

        for (i, a) in keys.iter().enumerate() {
            for b in &keys[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn non_ascii_connection_names_keep_their_case() {
        let key = derive_key("éclair", "Order", SQL, &[]);
        assert!(key.starts_with("éclair_Order_"), "got: {key}");
    }

    #[test]
    fn empty_bindings_encode_as_empty_array() {
        assert_eq!(canonical_bindings(&[]), "[]");
        let key = derive_key("main", "Order", "SELECT 1", &[]);
        assert!(key.ends_with(&sha256_hex("SELECT 1[]")));
    }

    #[test]
    fn bindings_encode_compactly() {
        let bindings = [Binding::Text("a".to_owned()), Binding::Null, Binding::Bool(false), Binding::Float(1.5)];
        assert_eq!(canonical_bindings(&bindings), r#"["a",null,false,1.5]"#);
    }

    #[test]
    fn digest_is_lower_case_hex() {
        let key = derive_key("main", "Order", SQL, &[]);
        let digest = key.rsplit('_').next().expect("key has a digest");

        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn ucfirst_only_touches_the_first_character() {
        assert_eq!(ucfirst("main"), "Main");
        assert_eq!(ucfirst("Main"), "Main");
        assert_eq!(ucfirst("mysql_read"), "Mysql_read");
        assert_eq!(ucfirst("éclair"), "éclair");
        assert_eq!(ucfirst("1st"), "1st");
        assert_eq!(ucfirst(""), "");
    }
}
