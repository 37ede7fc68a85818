//! Finding links and link-like buttons in a page
//!
//! Candidates are `<a ...>...</a>` elements with an `href`, or
//! `<button ...>...</button>` elements whose `onclick` sets
//! `location.href='...'`. Anything inside a `<script>` block is ignored,
//! as are fragment-only and `javascript:` targets. The remaining
//! candidates are filtered by up to four [`Pattern`]s, all of which must
//! match.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Result, WebProbeError};
use crate::html::parse_attrs;
use crate::pattern::{make_pattern, Matcher, Pattern};

static ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<a\s+(.*?)>(.*?)</a>").expect("anchor regex is valid")
});

static BUTTON_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<button\s+(.*?)>(.*?)</button>")
        .expect("button regex is valid")
});

static SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script.*?>.*?</script>").expect("script regex is valid")
});

static LOCATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"location\.href='(.*?)'").expect("location regex is valid")
});

/// Which kind of element to look for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clickable {
    /// `<a href="...">`
    Link,
    /// `<button onclick="location.href='...'">`
    Button,
}

impl Clickable {
    fn tag_re(self) -> &'static Regex {
        match self {
            Self::Link => &ANCHOR_RE,
            Self::Button => &BUTTON_RE,
        }
    }

    /// Attribute holding the navigation target
    #[must_use]
    pub const fn target_attr(self) -> &'static str {
        match self {
            Self::Link => "href",
            Self::Button => "onclick",
        }
    }

    fn extract(self, raw: &str) -> Option<String> {
        match self {
            Self::Link => Some(raw.to_string()),
            Self::Button => LOCATION_RE
                .captures(raw)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string()),
        }
    }
}

/// Criteria for [`find_element`]
///
/// # Examples
///
/// ```rust
/// use webprobe::links::{find_element, Clickable, ElementQuery};
///
/// let body = r#"<a href="/one">Click me!</a> <a id="two" href="/two">Click me!</a>"#;
///
/// let found = find_element(body, Clickable::Link, &ElementQuery::from("Click").index(1)).unwrap();
/// assert_eq!(found.uri, "/two");
///
/// let found = find_element(body, Clickable::Link, &ElementQuery::new().id("two")).unwrap();
/// assert_eq!(found.uri, "/two");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ElementQuery {
    description: Option<Pattern>,
    id: Option<Pattern>,
    href: Option<Pattern>,
    html: Option<Pattern>,
    index: Option<usize>,
    verbose: bool,
}

impl ElementQuery {
    /// Match every candidate
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pattern for the element content (inner HTML)
    #[must_use]
    pub fn description(mut self, pattern: impl Into<Pattern>) -> Self {
        self.description = Some(pattern.into());
        self
    }

    /// Pattern for the `id` attribute (`""` when absent)
    #[must_use]
    pub fn id(mut self, pattern: impl Into<Pattern>) -> Self {
        self.id = Some(pattern.into());
        self
    }

    /// Pattern for the navigation target as written
    #[must_use]
    pub fn href(mut self, pattern: impl Into<Pattern>) -> Self {
        self.href = Some(pattern.into());
        self
    }

    /// Pattern for the whole element, tags included
    #[must_use]
    pub fn html(mut self, pattern: impl Into<Pattern>) -> Self {
        self.html = Some(pattern.into());
        self
    }

    /// Pick the `index`-th match instead of requiring exactly one
    #[must_use]
    pub const fn index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Log the verdict on every candidate at debug level
    #[must_use]
    pub const fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

impl From<&str> for ElementQuery {
    fn from(description: &str) -> Self {
        Self::new().description(description)
    }
}

impl From<String> for ElementQuery {
    fn from(description: String) -> Self {
        Self::new().description(description)
    }
}

impl From<Regex> for ElementQuery {
    fn from(description: Regex) -> Self {
        Self::new().description(description)
    }
}

/// The element chosen by [`find_element`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundElement {
    /// Whole element, tags included
    pub html: String,
    /// Inner HTML
    pub content: String,
    /// Start tag attributes
    pub attrs: HashMap<String, String>,
    /// Navigation target as written in the page
    pub uri: String,
}

struct Filters {
    content: Option<Matcher>,
    id: Option<Matcher>,
    href: Option<Matcher>,
    html: Option<Matcher>,
}

impl Filters {
    fn compile(query: &ElementQuery) -> Result<Self> {
        Ok(Self {
            content: make_pattern(query.description.clone())?,
            id: make_pattern(query.id.clone())?,
            href: make_pattern(query.href.clone())?,
            html: make_pattern(query.html.clone())?,
        })
    }

    fn rejection(&self, found: &FoundElement) -> Option<&'static str> {
        let fails = |m: &Option<Matcher>, s: &str| m.as_ref().is_some_and(|m| !m(s));
        if fails(&self.content, &found.content) {
            Some("doesn't match description")
        } else if fails(&self.id, found.attrs.get("id").map_or("", String::as_str)) {
            Some("doesn't match id")
        } else if fails(&self.href, &found.uri) {
            Some("doesn't match href")
        } else if fails(&self.html, &found.html) {
            Some("doesn't match html")
        } else {
            None
        }
    }
}

fn note(verbose: bool, element: &str, verdict: &str) {
    if verbose {
        tracing::debug!(element, verdict, "scanning element");
    } else {
        tracing::trace!(element, verdict, "scanning element");
    }
}

/// Find exactly one navigable element in `body`
///
/// # Errors
///
/// - [`WebProbeError::InvalidPattern`] when a query pattern is invalid;
/// - [`WebProbeError::NoMatchingElement`] when nothing matches;
/// - [`WebProbeError::AmbiguousMatch`] when several match and no index
///   was given;
/// - [`WebProbeError::IndexOutOfRange`] when the index is past the
///   matches.
pub fn find_element(body: &str, kind: Clickable, query: &ElementQuery) -> Result<FoundElement> {
    let filters = Filters::compile(query)?;
    let scripts: Vec<(usize, usize)> = SCRIPT_RE
        .find_iter(body)
        .map(|m| (m.start(), m.end()))
        .collect();
    let target_attr = kind.target_attr();

    let mut found = Vec::new();
    let mut total = 0;
    for caps in kind.tag_re().captures_iter(body) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if scripts
            .iter()
            .any(|&(start, end)| whole.start() > start && whole.end() < end)
        {
            continue;
        }
        let html = whole.as_str();
        let attrs = parse_attrs(&caps[1]);

        let Some(raw) = attrs.get(target_attr).filter(|v| !v.is_empty()) else {
            note(query.verbose, html, "skipped: no target attribute");
            continue;
        };
        let Some(uri) = kind.extract(raw) else {
            note(query.verbose, html, "skipped: no location.href in onclick");
            continue;
        };
        if uri.starts_with('#') {
            note(query.verbose, html, "skipped: only internal fragment href");
            continue;
        }
        if uri.starts_with("javascript:") {
            note(query.verbose, html, "skipped: cannot follow javascript:");
            continue;
        }
        total += 1;

        let element = FoundElement {
            html: html.to_string(),
            content: caps[2].to_string(),
            attrs,
            uri,
        };
        if let Some(reason) = filters.rejection(&element) {
            note(query.verbose, html, reason);
            continue;
        }
        note(query.verbose, html, "accepted");
        found.push(element);
    }

    match (query.index, found.len()) {
        (_, 0) => Err(WebProbeError::NoMatchingElement { total }),
        (None, 1) => Ok(found.swap_remove(0)),
        (None, _) => Err(WebProbeError::AmbiguousMatch {
            matches: found.into_iter().map(|f| f.html).collect(),
        }),
        (Some(index), matched) if index >= matched => Err(WebProbeError::IndexOutOfRange {
            matched,
            total,
            index,
        }),
        (Some(index), _) => Ok(found.swap_remove(index)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"
        <a href="/first">Click me!</a>
        <a href="#top">Click me!</a>
        <a href="javascript:void(0)">Click me!</a>
        <a href="">Click me!</a>
        <a id="second_id" href="/second">Click me!</a>
        <script>
            var link = '<a href="/hidden">Click me!</a>';
        </script>
    "##;

    #[test]
    fn test_ambiguous_without_index() {
        let err = find_element(PAGE, Clickable::Link, &"Click me!".into()).unwrap_err();
        match err {
            WebProbeError::AmbiguousMatch { matches } => {
                assert_eq!(matches.len(), 2);
                assert!(matches[0].contains("/first"));
                assert!(matches[1].contains("/second"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_index_selects_distinct_elements() {
        let q = ElementQuery::from("Click me!");
        let first = find_element(PAGE, Clickable::Link, &q.clone().index(0)).unwrap();
        let second = find_element(PAGE, Clickable::Link, &q.clone().index(1)).unwrap();
        assert_eq!(first.uri, "/first");
        assert_eq!(second.uri, "/second");
        let err = find_element(PAGE, Clickable::Link, &q.index(2)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Only 2 (out of 2) elements match; index 2 out of range"
        );
    }

    #[test]
    fn test_script_content_is_never_matched() {
        let err =
            find_element(PAGE, Clickable::Link, &ElementQuery::new().href("hidden")).unwrap_err();
        assert!(matches!(err, WebProbeError::NoMatchingElement { total: 2 }));
    }

    #[test]
    fn test_fragment_and_javascript_targets_are_skipped() {
        for target in ["top", "javascript", "^$"] {
            let err =
                find_element(PAGE, Clickable::Link, &ElementQuery::new().href(target)).unwrap_err();
            assert!(matches!(err, WebProbeError::NoMatchingElement { total: 2 }));
        }
        let all = find_element(PAGE, Clickable::Link, &ElementQuery::new().index(0)).unwrap();
        assert_eq!(all.uri, "/first");
    }

    #[test]
    fn test_filters_are_anded() {
        let q = ElementQuery::from("Click").id("second").href("^/second$");
        let found = find_element(PAGE, Clickable::Link, &q).unwrap();
        assert_eq!(found.uri, "/second");

        let q = ElementQuery::from("Click").id("second").href("first");
        assert!(find_element(PAGE, Clickable::Link, &q).is_err());
    }

    #[test]
    fn test_html_pattern_sees_whole_tag() {
        let q = ElementQuery::new().html(r#"id="second_id""#);
        let found = find_element(PAGE, Clickable::Link, &q).unwrap();
        assert_eq!(found.uri, "/second");
    }

    #[test]
    fn test_predicate_pattern() {
        let q = ElementQuery::new().href(Pattern::predicate(|h| h.ends_with("first")));
        let found = find_element(PAGE, Clickable::Link, &q).unwrap();
        assert_eq!(found.uri, "/first");
    }

    #[test]
    fn test_buttons_use_onclick_location() {
        let body = r#"
            <button id="b1" onclick="location.href='/one'">Go</button>
            <button id="b2" onclick="alert('x')">Go</button>
            <button id="b3" onclick="doit(); location.href='/three'">Go</button>
        "#;
        let err = find_element(body, Clickable::Button, &"Go".into()).unwrap_err();
        assert!(matches!(err, WebProbeError::AmbiguousMatch { ref matches } if matches.len() == 2));
        let found = find_element(body, Clickable::Button, &ElementQuery::new().id("b3")).unwrap();
        assert_eq!(found.uri, "/three");
    }

    #[test]
    fn test_invalid_pattern() {
        let err = find_element(PAGE, Clickable::Link, &ElementQuery::from("(")).unwrap_err();
        assert!(matches!(err, WebProbeError::InvalidPattern(_)));
    }
}
