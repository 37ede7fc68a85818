//! Match patterns for link and button lookup
//!
//! A pattern is a regular expression given as text, bytes or a compiled
//! [`Regex`], or an arbitrary predicate. All of them normalise to a
//! [`Matcher`].

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::error::{Result, WebProbeError};

/// Compiled match predicate
pub type Matcher = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Something that can be turned into a [`Matcher`]
#[derive(Clone)]
pub enum Pattern {
    /// Regular expression source, searched anywhere in the candidate
    Text(String),
    /// UTF-8 encoded regular expression source
    Bytes(Vec<u8>),
    /// Pre-compiled regular expression
    Regex(Regex),
    /// Arbitrary predicate
    Predicate(Matcher),
}

impl Pattern {
    /// Wrap a predicate
    #[must_use]
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(f))
    }

    /// Compile into a matcher
    ///
    /// # Errors
    ///
    /// Returns [`WebProbeError::InvalidPattern`] for invalid UTF-8 or an
    /// invalid regular expression.
    pub fn compile(self) -> Result<Matcher> {
        match self {
            Self::Predicate(f) => Ok(f),
            Self::Regex(re) => Ok(Arc::new(move |s: &str| re.is_match(s))),
            Self::Text(source) => Self::Regex(compile_regex(&source)?).compile(),
            Self::Bytes(bytes) => {
                let source = String::from_utf8(bytes)
                    .map_err(|err| WebProbeError::InvalidPattern(err.to_string()))?;
                Self::Text(source).compile()
            }
        }
    }
}

fn compile_regex(source: &str) -> Result<Regex> {
    Regex::new(source).map_err(|err| WebProbeError::InvalidPattern(err.to_string()))
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Self::Bytes(b) => f.debug_tuple("Bytes").field(b).finish(),
            Self::Regex(re) => f.debug_tuple("Regex").field(&re.as_str()).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl From<&str> for Pattern {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Pattern {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&[u8]> for Pattern {
    fn from(b: &[u8]) -> Self {
        Self::Bytes(b.to_vec())
    }
}

impl From<Vec<u8>> for Pattern {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

impl From<Regex> for Pattern {
    fn from(re: Regex) -> Self {
        Self::Regex(re)
    }
}

/// Normalise an optional pattern
///
/// `None` stays `None`, which callers treat as "matches everything".
///
/// # Errors
///
/// Propagates [`Pattern::compile`] failures.
///
/// # Examples
///
/// ```rust
/// use webprobe::pattern::{make_pattern, Pattern};
///
/// let m = make_pattern(Some(Pattern::from("ba+r"))).unwrap().unwrap();
/// assert!(m("foo baaar"));
/// assert!(make_pattern(None).unwrap().is_none());
/// ```
pub fn make_pattern(pattern: Option<Pattern>) -> Result<Option<Matcher>> {
    pattern.map(Pattern::compile).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_is_none() {
        assert!(make_pattern(None).unwrap().is_none());
    }

    #[test]
    fn test_text_is_searched_not_anchored() {
        let m = Pattern::from("Click").compile().unwrap();
        assert!(m("Please Click me!"));
        assert!(!m("click"));
    }

    #[test]
    fn test_bytes_are_decoded() {
        let m = Pattern::from(&b"f.o"[..]).compile().unwrap();
        assert!(m("xfoo"));
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        let err = Pattern::Bytes(vec![0xff, 0xfe]).compile().err().unwrap();
        assert!(matches!(err, WebProbeError::InvalidPattern(_)));
    }

    #[test]
    fn test_invalid_regex_is_rejected() {
        let err = Pattern::from("(unclosed").compile().err().unwrap();
        assert!(matches!(err, WebProbeError::InvalidPattern(_)));
    }

    #[test]
    fn test_compiled_regex() {
        let re = Regex::new(r"^id_\w+$").unwrap();
        let m = Pattern::from(re).compile().unwrap();
        assert!(m("id_baz"));
        assert!(!m("fake_baz"));
    }

    #[test]
    fn test_predicate_is_used_unchanged() {
        let m = Pattern::predicate(|s| s.len() == 3).compile().unwrap();
        assert!(m("abc"));
        assert!(!m("abcd"));
    }
}
