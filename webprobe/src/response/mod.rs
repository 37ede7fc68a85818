//! Responses returned by the test client
//!
//! A [`TestResponse`] holds the fully collected body, so it can be inspected
//! any number of times. Forms are parsed on first access and cached; links
//! and buttons are looked up on demand and followed through the same
//! application.

use std::fmt;
use std::sync::LazyLock;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, LOCATION};
use http::{HeaderMap, Method, StatusCode};
use regex::Regex;
use serde::de::DeserializeOwned;
use url::Url;

use crate::app::{status_line, Origin, Params, TestApp};
use crate::error::{Result, WebProbeError};
use crate::forms::{Form, Forms};
use crate::html::normalize_whitespace;
use crate::links::{find_element, Clickable, ElementQuery};

static FORM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<form(?:\s[^>]*)?>.*?</form\s*>")
        .expect("form regex is valid")
});

/// A response from the application under test
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    request_url: Url,
    method: Method,
    app: TestApp,
    forms: Option<Forms>,
}

impl TestResponse {
    pub(crate) fn new(
        status: StatusCode,
        headers: HeaderMap,
        body: Bytes,
        request_url: Url,
        method: Method,
        app: TestApp,
    ) -> Self {
        Self {
            status,
            headers,
            body,
            request_url,
            method,
            app,
            forms: None,
        }
    }

    /// Response status
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Response status as a number
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Response headers
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A header value, if present and valid text
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Media type without parameters, e.g. `text/html`
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|ct| ct.split(';').next())
            .map(str::trim)
    }

    /// `charset` parameter of the content type
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())?
            .split(';')
            .skip(1)
            .filter_map(|param| param.split_once('='))
            .find(|(key, _)| key.trim().eq_ignore_ascii_case("charset"))
            .map(|(_, value)| value.trim().trim_matches('"'))
    }

    /// Raw body
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body decoded as UTF-8, invalid sequences replaced
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body with every run of whitespace collapsed to one space
    #[must_use]
    pub fn normal_body(&self) -> String {
        normalize_whitespace(&self.text())
    }

    /// Whether the body contains `needle`, as written or with whitespace
    /// normalized
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.text().contains(needle) || self.normal_body().contains(needle)
    }

    /// Require every string of `present` and none of `absent` in the body
    ///
    /// # Errors
    ///
    /// [`WebProbeError::Content`] naming the first offending string.
    pub fn mustcontain(&self, present: &[&str], absent: &[&str]) -> Result<()> {
        if let Some(missing) = present.iter().find(|s| !self.contains(s)) {
            tracing::debug!(response = %self, "body is missing a required string");
            return Err(WebProbeError::Content(format!(
                "Body does not contain string {missing:?}"
            )));
        }
        if let Some(bad) = absent.iter().find(|s| self.contains(s)) {
            tracing::debug!(response = %self, "body contains a forbidden string");
            return Err(WebProbeError::Content(format!(
                "Body contains bad string {bad:?}"
            )));
        }
        Ok(())
    }

    /// Deserialize a JSON body
    ///
    /// # Errors
    ///
    /// [`WebProbeError::TypeMismatch`] unless the content type is
    /// `application/json`, then [`WebProbeError::Json`] for invalid JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        match self.content_type() {
            Some("application/json") => Ok(serde_json::from_slice(&self.body)?),
            other => Err(WebProbeError::TypeMismatch {
                expected: "application/json response".into(),
                actual: other.unwrap_or("no content type").to_string(),
            }),
        }
    }

    /// URL of the request that produced this response
    #[must_use]
    pub const fn request_url(&self) -> &Url {
        &self.request_url
    }

    /// Method of the request that produced this response
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// The application this response came from
    #[must_use]
    pub const fn app(&self) -> &TestApp {
        &self.app
    }

    fn origin(&self) -> Origin {
        Origin::new(self.app.clone(), self.request_url.clone())
    }

    fn parse_forms(&self) -> Result<Forms> {
        let text = self.text();
        let forms = FORM_RE
            .find_iter(&text)
            .map(|m| Form::parse(m.as_str()).map(|form| form.with_origin(self.origin())))
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!(url = %self.request_url, forms = forms.len(), "parsed forms");
        Ok(Forms::new(forms))
    }

    /// Every form in the page, by position and by id
    ///
    /// Parsed on first access; later calls return the same forms with
    /// whatever values were set on them.
    ///
    /// # Errors
    ///
    /// Form parse errors.
    pub fn forms(&mut self) -> Result<&mut Forms> {
        let forms = match self.forms.take() {
            Some(forms) => forms,
            None => self.parse_forms()?,
        };
        Ok(self.forms.insert(forms))
    }

    /// The only form in the page
    ///
    /// # Errors
    ///
    /// [`WebProbeError::NoForms`] or [`WebProbeError::MultipleForms`], or a
    /// form parse error.
    pub fn form(&mut self) -> Result<&mut Form> {
        self.forms()?.single_mut()
    }

    /// Follow the link matching `query`
    ///
    /// See [`crate::links`] for how candidates are found and filtered.
    ///
    /// # Errors
    ///
    /// Lookup errors from [`find_element`], then request errors.
    pub async fn click(&self, query: impl Into<ElementQuery>) -> Result<Self> {
        let found = find_element(&self.text(), Clickable::Link, &query.into())?;
        self.goto(&found.uri, "get", None).await
    }

    /// Follow the `<button onclick="location.href='...'">` matching `query`
    ///
    /// # Errors
    ///
    /// Lookup errors from [`find_element`], then request errors.
    pub async fn clickbutton(&self, query: impl Into<ElementQuery>) -> Result<Self> {
        let found = find_element(&self.text(), Clickable::Button, &query.into())?;
        self.goto(&found.uri, "get", None).await
    }

    /// Follow a redirect
    ///
    /// # Errors
    ///
    /// [`WebProbeError::NotRedirect`] unless the status is 3xx,
    /// [`WebProbeError::MissingHeader`] without a `Location` header.
    pub async fn follow(&self) -> Result<Self> {
        if !self.status.is_redirection() {
            return Err(WebProbeError::NotRedirect(self.status_code()));
        }
        let location = self
            .headers
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(WebProbeError::MissingHeader("Location"))?;
        self.goto(location, "get", None).await
    }

    /// Request `href` relative to this response's URL
    ///
    /// Scheme, host and fragment of `href` are ignored. `method` is `"get"`
    /// or `"post"`.
    ///
    /// # Errors
    ///
    /// [`WebProbeError::InvalidMethod`] for other methods, then request
    /// errors.
    pub async fn goto(&self, href: &str, method: &str, params: Option<Params>) -> Result<Self> {
        self.origin().goto(href, method, params, None).await
    }
}

impl fmt::Debug for TestResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestResponse")
            .field("status", &self.status)
            .field("request_url", &self.request_url.as_str())
            .field("content_type", &self.content_type())
            .field("body_len", &self.body.len())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for TestResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Response: {}", status_line(self.status))?;
        let mut headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .filter(|(name, _)| name.as_str() != "content-length")
            .map(|(name, value)| (name.as_str(), value.to_str().unwrap_or("<binary>")))
            .collect();
        headers.sort_unstable();
        for (name, value) in headers {
            writeln!(f, "{name}: {value}")?;
        }
        let text = self.text();
        let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
        f.write_str(&lines.join("\n"))
    }
}
