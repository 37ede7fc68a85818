//! Text-level HTML helpers
//!
//! Forms and links are located with regular expressions over the raw
//! response text, not with a DOM parser. Malformed nesting confuses these
//! scanners the same way it would confuse a person reading the source.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

/// One attribute: name, then an optional `=` with a double-quoted,
/// single-quoted or unquoted value. A `/` never belongs to a name, so the
/// self-closing slash in `<input checked/>` is skipped.
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)([^=/ \n\r\t]+)[ \n\r\t]*(?:=[ \n\r\t]*(?:"([^"]*)"|'([^']*)'|([^"'][^ \n\r\t>]*)))?"#,
    )
    .expect("attribute regex is valid")
});

/// Any start or end tag: `(/?)`, tag name, attribute text.
pub(crate) static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<(/?)([a-z0-9_\-]*)([^>]*?)>")
        .expect("tag regex is valid")
});

/// Decode named (`&amp;`, `&sum;`), decimal (`&#123;`) and hexadecimal
/// (`&#x20ac;`) character references.
#[must_use]
pub fn unescape_html(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

/// Parse the attribute text of a start tag
///
/// `text` is everything between the tag name and the closing `>`. Names are
/// lower-cased, bare names map to the empty string and values are
/// entity-decoded. Fragments that do not look like attributes are ignored.
///
/// # Examples
///
/// ```rust
/// use webprobe::html::parse_attrs;
///
/// let attrs = parse_attrs(r#"href='foo' id="bar" checked"#);
/// assert_eq!(attrs["href"], "foo");
/// assert_eq!(attrs["id"], "bar");
/// assert_eq!(attrs["checked"], "");
/// ```
#[must_use]
pub fn parse_attrs(text: &str) -> HashMap<String, String> {
    let mut attrs = HashMap::new();
    for caps in ATTR_RE.captures_iter(text) {
        let name = caps[1].to_lowercase();
        let body = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map_or("", |m| m.as_str());
        attrs.insert(name, unescape_html(body));
    }
    attrs
}

/// Collapse every run of whitespace to a single space
#[must_use]
pub fn normalize_whitespace(text: &str) -> String {
    static WS_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"[ \n\r\t]+")
            .expect("whitespace regex is valid")
    });
    WS_RE.replace_all(text, " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn attrs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_quote_styles_are_equivalent() {
        let expected = attrs(&[("href", "foo")]);
        assert_eq!(parse_attrs("href='foo'"), expected);
        assert_eq!(parse_attrs(r#"href="foo""#), expected);
        assert_eq!(parse_attrs("href=foo"), expected);
    }

    #[test]
    fn test_multiple_attributes() {
        let expected = attrs(&[("href", "foo"), ("id", "bar")]);
        assert_eq!(parse_attrs(r#"href="foo" id="bar""#), expected);
        assert_eq!(parse_attrs(r#"href='foo' id="bar" "#), expected);
        assert_eq!(parse_attrs("href='foo' id='bar' "), expected);
    }

    #[test]
    fn test_quoted_value_may_hold_other_quote() {
        let parsed = parse_attrs(r#"onclick="location.href='/x'" title='say "hi"'"#);
        assert_eq!(parsed["onclick"], "location.href='/x'");
        assert_eq!(parsed["title"], r#"say "hi""#);
    }

    #[test]
    fn test_bare_attribute_is_empty() {
        let parsed = parse_attrs(r#"type="checkbox" checked name="x""#);
        assert_eq!(parsed["checked"], "");
        assert_eq!(parsed["name"], "x");
    }

    #[test]
    fn test_self_closing_slash_is_not_part_of_a_name() {
        let parsed = parse_attrs("type=checkbox name=c checked/");
        assert_eq!(parsed["checked"], "");
        assert_eq!(parsed["name"], "c");
        assert!(!parsed.contains_key("checked/"));

        let parsed = parse_attrs(r#"name="c" checked /"#);
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn test_names_are_lowercased() {
        let parsed = parse_attrs(r#"NAME="Foo" Value="Bar""#);
        assert_eq!(parsed["name"], "Foo");
        assert_eq!(parsed["value"], "Bar");
    }

    #[test]
    fn test_entities_are_decoded() {
        assert_eq!(
            parse_attrs(r#"value="&lt;&gt;&amp;&quot;&#123;""#),
            attrs(&[("value", "<>&\"{")])
        );
        assert_eq!(
            parse_attrs(r#"value="&#x20ac;""#),
            attrs(&[("value", "\u{20ac}")])
        );
        assert_eq!(
            parse_attrs(r#"value="&sum;""#),
            attrs(&[("value", "\u{2211}")])
        );
    }

    #[test]
    fn test_explicit_empty_value_is_kept() {
        let parsed = parse_attrs(r#"value="""#);
        assert_eq!(parsed.get("value").map(String::as_str), Some(""));
        assert!(parse_attrs("selected").get("value").is_none());
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("a \n\t b\r\nc"), "a b c");
    }

    proptest! {
        #[test]
        fn prop_quote_styles_agree(value in "[a-zA-Z0-9/_.-]{1,20}") {
            let single = parse_attrs(&format!("href='{value}'"));
            let double = parse_attrs(&format!("href=\"{value}\""));
            prop_assert_eq!(&single, &double);
            prop_assert_eq!(single.get("href"), Some(&value));
        }

        #[test]
        fn prop_never_panics(text in ".{0,200}") {
            let _ = parse_attrs(&text);
        }
    }
}
