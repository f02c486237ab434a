// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Key pattern compilation for bulk deletion.

use querycache_store::{Error, Result};
use regex::Regex;

/// Compiles a wildcard key such as `cacheable:Main_*` into a regex.
///
/// `*` matches any sequence of characters; everything else is literal. The
/// pattern is not anchored, so it matches anywhere inside a key.
pub(crate) fn wildcard(key: &str) -> Result<Regex> {
    let body = key.split('*').map(regex::escape).collect::<Vec<_>>().join(".*");
    compile(&body)
}

/// Compiles a bare regex or a delimited one such as `/cacheable:\d/i`.
///
/// Delimited patterns may carry the trailing flags `i`, `m`, `s`, `x`, `u` and
/// `U`. Paired bracket delimiters (`(...)`, `{...}`, `[...]`, `<...>`) are
/// accepted as well.
pub(crate) fn regex(pattern: &str) -> Result<Regex> {
    match split_delimited(pattern) {
        Some((body, flags)) => {
            let inline = inline_flags(flags)?;
            compile(&format!("{inline}{body}"))
        }
        None => compile(pattern),
    }
}

fn split_delimited(pattern: &str) -> Option<(&str, &str)> {
    let open = pattern.chars().next()?;
    if open.is_alphanumeric() || open.is_whitespace() || open == '\\' {
        return None;
    }

    let close = match open {
        '(' => ')',
        '{' => '}',
        '[' => ']',
        '<' => '>',
        other => other,
    };

    let end = pattern.rfind(close)?;
    if end == 0 {
        return None;
    }

    let flags = &pattern[end + close.len_utf8()..];
    if !flags.chars().all(char::is_alphabetic) {
        return None;
    }

    Some((&pattern[open.len_utf8()..end], flags))
}

fn inline_flags(flags: &str) -> Result<String> {
    let mut inline = String::new();
    for flag in flags.chars() {
        match flag {
            'i' | 'm' | 's' | 'x' | 'U' => inline.push(flag),
            // Patterns are always Unicode-aware.
            'u' => {}
            other => {
                return Err(Error::invalid_pattern(format!("unsupported pattern flag '{other}'")));
            }
        }
    }

    if inline.is_empty() {
        Ok(inline)
    } else {
        Ok(format!("(?{inline})"))
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(Error::invalid_pattern)
}

#[cfg(test)]
mod tests {
    use querycache_store::ErrorKind;

    use super::*;

    #[test]
    fn wildcard_matches_any_sequence() {
        let re = wildcard("cacheable:Main_*").expect("valid wildcard");

        assert!(re.is_match("cacheable:Main_Order_abc"));
        assert!(re.is_match("cacheable:Main_"));
        assert!(!re.is_match("cacheable:Replica_Order"));
    }

    #[test]
    fn wildcard_treats_other_characters_literally() {
        let re = wildcard("a.b*").expect("valid wildcard");

        assert!(re.is_match("a.bc"));
        assert!(!re.is_match("axbc"));
    }

    #[test]
    fn wildcard_matches_inside_keys() {
        let re = wildcard("Main_*").expect("valid wildcard");

        assert!(re.is_match("cacheable:Main_Order_x"));
        assert!(re.is_match("tenant:cacheable:Main_Order_x"));
        assert!(!re.is_match("cacheable:Replica_Order_x"));
    }

    #[test]
    fn delimited_pattern_is_unwrapped() {
        let re = regex(r"/cacheable:\d/").expect("valid pattern");

        assert!(re.is_match("cacheable:1"));
        assert!(!re.is_match("other:1"));
    }

    #[test]
    fn delimited_pattern_flags_apply() {
        let re = regex("#^CACHEABLE:#i").expect("valid pattern");

        assert!(re.is_match("cacheable:1"));
    }

    #[test]
    fn bracket_delimiters_are_paired() {
        let re = regex(r"{^cacheable:\d+$}").expect("valid pattern");

        assert!(re.is_match("cacheable:12"));
        assert!(!re.is_match("cacheable:x"));
    }

    #[test]
    fn bare_patterns_are_used_as_is() {
        let re = regex(r"^cacheable:\d").expect("valid pattern");

        assert!(re.is_match("cacheable:1"));
        assert!(!re.is_match("xcacheable:1"));
    }

    #[test]
    fn unknown_flag_is_rejected() {
        let error = regex("/a/q").expect_err("flag q is unsupported");
        assert_eq!(error.kind(), ErrorKind::InvalidPattern);
    }

    #[test]
    fn malformed_regex_is_rejected() {
        let error = regex("/(unclosed/").expect_err("pattern does not compile");
        assert_eq!(error.kind(), ErrorKind::InvalidPattern);
    }
}
