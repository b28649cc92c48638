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

//! Entity escaping and case conversion
//!
//! The markup layer escapes only what its own grammar needs: `&`, `<`, `>`
//! and, inside quoted attribute values, `"`. Decoding is staged so that an
//! encoded ampersand can never start a second entity.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static DECIMAL_ENTITY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&#([0-9]+);").unwrap());
static HEX_ENTITY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&#x([0-9a-f]+);").unwrap());
static AMPERSAND: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&(amp|#38|#x26);").unwrap());
static CAMEL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[_-][a-z]").unwrap());
static PARAM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r".[A-Z]+").unwrap());
static SNAKE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r".[A-Z]").unwrap());

/// Escapes `text` for markup output. With `in_attr` set, double quotes are
/// escaped too so the result can sit inside `key="..."`.
pub fn escape(text: &str, in_attr: bool) -> String {
    let text = text
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");
    if in_attr {
        text.replace('"', "&quot;")
    } else {
        text
    }
}

fn code_point(code: Option<u32>) -> String {
    code.and_then(char::from_u32)
        .unwrap_or(char::REPLACEMENT_CHARACTER)
        .to_string()
}

/// Decodes the entities [`escape`] produces plus numeric character
/// references. Ampersand references are resolved last.
pub fn unescape(text: &str) -> String {
    let text = text
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"");
    let text = DECIMAL_ENTITY.replace_all(&text, |caps: &Captures| {
        if &caps[1] == "38" {
            caps[0].to_string()
        } else {
            code_point(caps[1].parse().ok())
        }
    });
    let text = HEX_ENTITY.replace_all(&text, |caps: &Captures| {
        if &caps[1] == "26" {
            caps[0].to_string()
        } else {
            code_point(u32::from_str_radix(&caps[1], 16).ok())
        }
    });
    AMPERSAND.replace_all(&text, "&").into_owned()
}

/// Lower-cases the first character.
pub fn uncapitalize(source: &str) -> String {
    let mut chars = source.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `data-id` / `data_id` -> `dataId`
pub fn camel_case(source: &str) -> String {
    CAMEL
        .replace_all(source, |caps: &Captures| caps[0][1..].to_uppercase())
        .into_owned()
}

fn split_boundary(mat: &str) -> (&str, &str) {
    let at = mat.chars().next().map_or(0, char::len_utf8);
    mat.split_at(at)
}

/// `fooBar` / `FooBar` / `foo_bar` -> `foo-bar`
pub fn param_case(source: &str) -> String {
    let source = uncapitalize(source).replace('_', "-");
    PARAM
        .replace_all(&source, |caps: &Captures| {
            let (head, tail) = split_boundary(&caps[0]);
            format!("{}-{}", head, tail.to_lowercase())
        })
        .into_owned()
}

/// `fooBar` / `FooBar` / `foo-bar` -> `foo_bar`
pub fn snake_case(source: &str) -> String {
    let source = uncapitalize(source).replace('-', "_");
    SNAKE
        .replace_all(&source, |caps: &Captures| {
            let (head, tail) = split_boundary(&caps[0]);
            format!("{}_{}", head, tail.to_lowercase())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_text_and_attr() {
        assert_eq!(escape(r#"<a&"b">"#, false), r#"&lt;a&amp;"b"&gt;"#);
        assert_eq!(escape(r#"<a&"b">"#, true), "&lt;a&amp;&quot;b&quot;&gt;");
    }

    #[test]
    fn unescape_entities() {
        assert_eq!(
            unescape("&lt;test&gt;&quot;u&amp;i&quot;&#65;&#x41;&#38;&#x26;&amp;"),
            "<test>\"u&i\"AA&&&"
        );
    }

    #[test]
    fn encoded_ampersand_does_not_start_an_entity() {
        assert_eq!(unescape("&amp;lt;"), "&lt;");
        assert_eq!(unescape("&#38;#65;"), "&#65;");
    }

    #[test]
    fn invalid_code_point_is_replaced() {
        assert_eq!(unescape("&#xd800;"), "\u{fffd}");
        assert_eq!(unescape("&#99999999999;"), "\u{fffd}");
    }

    #[test]
    fn cases() {
        assert_eq!(uncapitalize("Foo"), "foo");
        assert_eq!(uncapitalize(""), "");
        assert_eq!(camel_case("a_b-c"), "aBC");
        assert_eq!(camel_case("data-id"), "dataId");
        assert_eq!(param_case("FooBar"), "foo-bar");
        assert_eq!(param_case("foo_bar"), "foo-bar");
        assert_eq!(param_case("dataID"), "data-id");
        assert_eq!(snake_case("FooBar"), "foo_bar");
        assert_eq!(snake_case("foo-bar"), "foo_bar");
    }
}
