//! Response status expectations

use http::StatusCode;
use regex::RegexBuilder;

use crate::error::{Result, WebProbeError};

/// Which response statuses a request accepts
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExpectedStatus {
    /// 2xx or 3xx
    #[default]
    Default,
    /// Anything
    Any,
    /// Exactly this code
    Code(u16),
    /// Any of these codes
    OneOf(Vec<u16>),
    /// Shell-style pattern over the status line, e.g. `"3*"` or `"404 *"`
    Glob(String),
}

impl From<u16> for ExpectedStatus {
    fn from(code: u16) -> Self {
        Self::Code(code)
    }
}

impl From<StatusCode> for ExpectedStatus {
    fn from(code: StatusCode) -> Self {
        Self::Code(code.as_u16())
    }
}

impl From<Vec<u16>> for ExpectedStatus {
    fn from(codes: Vec<u16>) -> Self {
        Self::OneOf(codes)
    }
}

impl From<&[u16]> for ExpectedStatus {
    fn from(codes: &[u16]) -> Self {
        Self::OneOf(codes.to_vec())
    }
}

impl<const N: usize> From<[u16; N]> for ExpectedStatus {
    fn from(codes: [u16; N]) -> Self {
        Self::OneOf(codes.to_vec())
    }
}

impl From<&str> for ExpectedStatus {
    fn from(pattern: &str) -> Self {
        if pattern == "*" {
            Self::Any
        } else if let Ok(code) = pattern.parse() {
            Self::Code(code)
        } else {
            Self::Glob(pattern.to_string())
        }
    }
}

/// `"404 Not Found"`
#[must_use]
pub fn status_line(status: StatusCode) -> String {
    format!(
        "{} {}",
        status.as_str(),
        status.canonical_reason().unwrap_or("Unknown")
    )
}

fn glob_matches(pattern: &str, text: &str) -> bool {
    let mut source = String::from("^");
    for c in pattern.chars() {
        match c {
            '*' => source.push_str(".*"),
            '?' => source.push('.'),
            c => source.push_str(&regex::escape(&c.to_string())),
        }
    }
    source.push('$');
    RegexBuilder::new(&source)
        .case_insensitive(true)
        .build()
        .is_ok_and(|re| re.is_match(text))
}

impl ExpectedStatus {
    /// Check a response status
    ///
    /// `url` and `body` only feed the error message.
    ///
    /// # Errors
    ///
    /// [`WebProbeError::App`] when the status is not accepted.
    pub fn check(&self, status: StatusCode, url: &str, body: &str) -> Result<()> {
        let line = status_line(status);
        let code = status.as_u16();
        let failure = match self {
            Self::Any => None,
            Self::Default => (!(200..400).contains(&code))
                .then(|| format!("{line} (not 200 OK or 3xx redirect for {url})\n{body}")),
            Self::Code(expected) => (*expected != code).then(|| format!("{line} (not {expected})")),
            Self::OneOf(codes) => (!codes.contains(&code)).then(|| {
                let codes: Vec<String> = codes.iter().map(ToString::to_string).collect();
                format!("{line} (not one of {} for {url})\n{body}", codes.join(", "))
            }),
            Self::Glob(pattern) => {
                (!glob_matches(pattern, &line)).then(|| format!("{line} (not {pattern})"))
            }
        };
        failure.map_or(Ok(()), |msg| Err(WebProbeError::App(msg)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(expected: impl Into<ExpectedStatus>, code: u16) -> Result<()> {
        let status = StatusCode::from_u16(code).unwrap();
        expected.into().check(status, "http://localhost/", "")
    }

    #[test]
    fn test_default_accepts_2xx_and_3xx() {
        assert!(ExpectedStatus::Default.check(StatusCode::OK, "", "").is_ok());
        assert!(ExpectedStatus::Default.check(StatusCode::FOUND, "", "").is_ok());
        let err = ExpectedStatus::Default
            .check(StatusCode::NOT_FOUND, "http://localhost/x", "gone")
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("Bad response: 404 Not Found (not 200 OK or 3xx redirect"));
        assert!(msg.contains("gone"));
    }

    #[test]
    fn test_exact_and_list() {
        assert!(check(404_u16, 404).is_ok());
        assert!(check(404_u16, 200).is_err());
        assert!(check([200_u16, 201], 201).is_ok());
        assert!(check(vec![200_u16, 201], 500).is_err());
    }

    #[test]
    fn test_patterns() {
        assert!(check("*", 500).is_ok());
        assert!(check("3*", 302).is_ok());
        assert!(check("3*", 200).is_err());
        assert!(check("404 not found", 404).is_ok());
        assert!(check("404", 404).is_ok());
    }
}
