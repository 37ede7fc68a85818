//! In-process test client
//!
//! [`TestApp`] wraps the application under test and builds requests
//! against it. Requests never touch the network: they go straight through
//! a [`Transport`], which for an [`axum::Router`] is a `oneshot` call.
//!
//! # Example
//!
//! ```rust
//! use axum::{routing::get, Router};
//! use webprobe::app::TestApp;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> webprobe::error::Result<()> {
//! let app = TestApp::new(Router::new().route("/", get(|| async { "hello" })));
//!
//! let response = app.get("/").send().await?;
//! assert_eq!(response.text(), "hello");
//!
//! // Request builders can also be awaited directly
//! let response = app.get("/missing").expect_status(404_u16).await?;
//! assert_eq!(response.status_code(), 404);
//! # Ok(())
//! # }
//! ```

mod encoding;
mod status;
mod transport;

use std::fmt;
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;

use axum::body::Body;
use axum::Router;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE, HOST};
use http::{Method, Request};
use http_body_util::BodyExt;
use serde::Serialize;
use url::Url;

pub use encoding::{encode_multipart, parse_query, urlencode, FORM_URLENCODED};
pub use status::{status_line, ExpectedStatus};
pub use transport::{ServiceTransport, Transport};

#[cfg(test)]
pub use transport::MockTransport;

use crate::config::TestAppConfig;
use crate::error::{Result, WebProbeError};
use crate::forms::{SubmitValue, Upload, UploadField};
use crate::response::TestResponse;

/// Request parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Params {
    /// Ordered name/value pairs; encoded as a query string or body
    Pairs(Vec<(String, SubmitValue)>),
    /// Already encoded text, used verbatim
    Raw(String),
}

impl Params {
    const fn is_empty(&self) -> bool {
        match self {
            Self::Pairs(pairs) => pairs.is_empty(),
            Self::Raw(raw) => raw.is_empty(),
        }
    }

    fn has_files(&self) -> bool {
        match self {
            Self::Pairs(pairs) => pairs.iter().any(|(_, v)| matches!(v, SubmitValue::File(_))),
            Self::Raw(_) => false,
        }
    }

    fn encoded(&self) -> String {
        match self {
            Self::Pairs(pairs) => urlencode(pairs),
            Self::Raw(raw) => raw.clone(),
        }
    }

    fn into_pairs(self) -> Vec<(String, SubmitValue)> {
        match self {
            Self::Pairs(pairs) => pairs,
            Self::Raw(raw) => parse_query(&raw),
        }
    }
}

impl From<Vec<(String, SubmitValue)>> for Params {
    fn from(pairs: Vec<(String, SubmitValue)>) -> Self {
        Self::Pairs(pairs)
    }
}

impl From<Vec<(String, String)>> for Params {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self::Pairs(
            pairs
                .into_iter()
                .map(|(n, v)| (n, SubmitValue::Text(v)))
                .collect(),
        )
    }
}

impl From<&[(&str, &str)]> for Params {
    fn from(pairs: &[(&str, &str)]) -> Self {
        Self::Pairs(
            pairs
                .iter()
                .map(|(n, v)| ((*n).to_string(), SubmitValue::from(*v)))
                .collect(),
        )
    }
}

impl<const N: usize> From<[(&str, &str); N]> for Params {
    fn from(pairs: [(&str, &str); N]) -> Self {
        Self::from(&pairs[..])
    }
}

impl From<Vec<(&str, &str)>> for Params {
    fn from(pairs: Vec<(&str, &str)>) -> Self {
        Self::from(pairs.as_slice())
    }
}

impl From<&str> for Params {
    fn from(raw: &str) -> Self {
        Self::Raw(raw.to_string())
    }
}

impl From<String> for Params {
    fn from(raw: String) -> Self {
        Self::Raw(raw)
    }
}

/// Handle on the application under test
///
/// Cheap to clone; clones share the transport and configuration.
#[derive(Clone)]
pub struct TestApp {
    transport: Arc<dyn Transport>,
    config: Arc<TestAppConfig>,
}

impl fmt::Debug for TestApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestApp")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TestApp {
    /// Test an axum router with the default configuration
    #[must_use]
    pub fn new(router: Router) -> Self {
        Self::with_config(router, TestAppConfig::default())
    }

    /// Test an axum router
    #[must_use]
    pub fn with_config(router: Router, config: TestAppConfig) -> Self {
        Self::from_transport(Arc::new(router), config)
    }

    /// Test anything implementing [`Transport`]
    #[must_use]
    pub fn from_transport(transport: Arc<dyn Transport>, config: TestAppConfig) -> Self {
        Self {
            transport,
            config: Arc::new(config),
        }
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &TestAppConfig {
        &self.config
    }

    /// Start a request with any method
    pub fn request(&self, method: Method, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(self.clone(), method, url.into())
    }

    /// Start a GET request; params go into the query string
    pub fn get(&self, url: impl Into<String>) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    /// Start a POST request; params go into the body
    pub fn post(&self, url: impl Into<String>) -> RequestBuilder {
        self.request(Method::POST, url)
    }

    /// Start a PUT request
    pub fn put(&self, url: impl Into<String>) -> RequestBuilder {
        self.request(Method::PUT, url)
    }

    /// Start a PATCH request
    pub fn patch(&self, url: impl Into<String>) -> RequestBuilder {
        self.request(Method::PATCH, url)
    }

    /// Start a DELETE request
    pub fn delete(&self, url: impl Into<String>) -> RequestBuilder {
        self.request(Method::DELETE, url)
    }

    /// Start an OPTIONS request
    pub fn options(&self, url: impl Into<String>) -> RequestBuilder {
        self.request(Method::OPTIONS, url)
    }

    /// Start a HEAD request
    pub fn head(&self, url: impl Into<String>) -> RequestBuilder {
        self.request(Method::HEAD, url)
    }

    fn json_request<T: Serialize + ?Sized>(
        &self,
        method: Method,
        url: impl Into<String>,
        body: &T,
    ) -> RequestBuilder {
        let builder = self.request(method, url).content_type("application/json");
        let json = match serde_json::to_string(body) {
            Ok(json) => json,
            Err(err) => return builder.fail(err.into()),
        };
        builder.params(Params::Raw(json))
    }

    /// POST `body` serialized as JSON
    pub fn post_json<T: Serialize + ?Sized>(
        &self,
        url: impl Into<String>,
        body: &T,
    ) -> RequestBuilder {
        self.json_request(Method::POST, url, body)
    }

    /// PUT `body` serialized as JSON
    pub fn put_json<T: Serialize + ?Sized>(
        &self,
        url: impl Into<String>,
        body: &T,
    ) -> RequestBuilder {
        self.json_request(Method::PUT, url, body)
    }

    /// PATCH `body` serialized as JSON
    pub fn patch_json<T: Serialize + ?Sized>(
        &self,
        url: impl Into<String>,
        body: &T,
    ) -> RequestBuilder {
        self.json_request(Method::PATCH, url, body)
    }

    /// DELETE with `body` serialized as JSON
    pub fn delete_json<T: Serialize + ?Sized>(
        &self,
        url: impl Into<String>,
        body: &T,
    ) -> RequestBuilder {
        self.json_request(Method::DELETE, url, body)
    }
}

/// A request being prepared
///
/// Send it with [`RequestBuilder::send`] or by awaiting it.
#[must_use = "requests do nothing until sent"]
#[derive(Debug)]
pub struct RequestBuilder {
    app: TestApp,
    method: Method,
    url: String,
    params: Option<Params>,
    headers: Vec<(String, String)>,
    content_type: Option<String>,
    uploads: Vec<UploadField>,
    status: ExpectedStatus,
    expect_errors: bool,
    pending: Option<WebProbeError>,
}

impl RequestBuilder {
    fn new(app: TestApp, method: Method, url: String) -> Self {
        Self {
            app,
            method,
            url,
            params: None,
            headers: Vec::new(),
            content_type: None,
            uploads: Vec::new(),
            status: ExpectedStatus::Default,
            expect_errors: false,
            pending: None,
        }
    }

    fn fail(mut self, err: WebProbeError) -> Self {
        self.pending.get_or_insert(err);
        self
    }

    /// Query string (GET, HEAD, OPTIONS) or body (other methods)
    pub fn params(mut self, params: impl Into<Params>) -> Self {
        self.params = Some(params.into());
        self
    }

    /// Add a request header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the body content type
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Attach a file; the body becomes multipart
    pub fn upload_file(mut self, name: impl Into<String>, upload: Upload) -> Self {
        self.uploads.push(UploadField::new(name, upload));
        self
    }

    /// Accept these statuses instead of 2xx/3xx
    pub fn expect_status(mut self, status: impl Into<ExpectedStatus>) -> Self {
        self.status = status.into();
        self
    }

    /// Accept any status
    pub const fn expect_errors(mut self) -> Self {
        self.expect_errors = true;
        self
    }

    fn encode_body(&mut self) -> Result<(Option<String>, Vec<u8>)> {
        let config = self.app.config.as_ref();
        let params = self.params.take();
        let multipart_requested = self
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().starts_with("multipart"));
        let needs_multipart = multipart_requested
            || !self.uploads.is_empty()
            || params.as_ref().is_some_and(Params::has_files);

        if needs_multipart {
            let pairs = params.map(Params::into_pairs).unwrap_or_default();
            let (content_type, body) = encode_multipart(&pairs, &self.uploads, config)?;
            return Ok((Some(content_type), body));
        }

        match params {
            Some(Params::Pairs(pairs)) => {
                let body = urlencode(&pairs);
                let content_type = self
                    .content_type
                    .take()
                    .or_else(|| (!body.is_empty()).then(|| FORM_URLENCODED.to_string()));
                Ok((content_type, body.into_bytes()))
            }
            Some(Params::Raw(raw)) => Ok((self.content_type.take(), raw.into_bytes())),
            None => Ok((self.content_type.take(), Vec::new())),
        }
    }

    /// Dispatch the request and check the response status
    ///
    /// # Errors
    ///
    /// Encoding errors, [`WebProbeError::Dispatch`] when the application
    /// fails, and [`WebProbeError::App`] when the status is not accepted.
    pub async fn send(mut self) -> Result<TestResponse> {
        if let Some(err) = self.pending.take() {
            return Err(err);
        }

        let mut url = self.app.config.base_url()?.join(&self.url)?;
        url.set_fragment(None);

        if self.method == Method::DELETE && self.params.as_ref().is_some_and(|p| !p.is_empty()) {
            tracing::warn!(
                url = %url,
                "DELETE request with a body; most servers ignore it"
            );
        }

        let carries_query = matches!(self.method, Method::GET | Method::HEAD | Method::OPTIONS);
        let (content_type, body) = if carries_query {
            if let Some(params) = self.params.take() {
                append_query(&mut url, &params.encoded());
            }
            (self.content_type.take(), Vec::new())
        } else {
            self.encode_body()?
        };

        let mut builder = Request::builder()
            .method(self.method.clone())
            .uri(path_and_query(&url))
            .header(HOST, host_header(&url));
        for (name, value) in &self.app.config.extra_headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(content_type) = &content_type {
            builder = builder.header(CONTENT_TYPE, content_type.as_str());
        }
        if !body.is_empty() {
            builder = builder.header(CONTENT_LENGTH, body.len());
        }
        let request = builder.body(Body::from(body))?;

        tracing::debug!(method = %self.method, url = %url, "dispatching request");
        let response = self.app.transport.dispatch(request).await?;
        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|err| WebProbeError::Dispatch(err.to_string()))?
            .to_bytes();
        tracing::debug!(
            method = %self.method,
            url = %url,
            status = parts.status.as_u16(),
            bytes = body.len(),
            "received response"
        );

        let response = TestResponse::new(
            parts.status,
            parts.headers,
            body,
            url,
            self.method,
            self.app,
        );
        if !self.expect_errors {
            self.status.check(
                response.status(),
                response.request_url().as_str(),
                &response.text(),
            )?;
        }
        Ok(response)
    }
}

impl IntoFuture for RequestBuilder {
    type Output = Result<TestResponse>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.send())
    }
}

fn append_query(url: &mut Url, encoded: &str) {
    if encoded.is_empty() {
        return;
    }
    let query = match url.query() {
        Some(existing) if !existing.is_empty() => format!("{existing}&{encoded}"),
        _ => encoded.to_string(),
    };
    url.set_query(Some(&query));
}

fn path_and_query(url: &Url) -> String {
    let path = url.path();
    url.query()
        .map_or_else(|| path.to_string(), |query| format!("{path}?{query}"))
}

fn host_header(url: &Url) -> String {
    let host = url.host_str().unwrap_or("localhost");
    url.port()
        .map_or_else(|| host.to_string(), |port| format!("{host}:{port}"))
}

/// Where a page came from, for resolving and following its links and forms
#[derive(Clone, Debug)]
pub(crate) struct Origin {
    app: TestApp,
    url: Url,
}

impl Origin {
    pub(crate) const fn new(app: TestApp, url: Url) -> Self {
        Self { app, url }
    }

    /// Resolve `href` against the page URL, ignoring its scheme, host and
    /// fragment
    pub(crate) fn resolve(&self, href: &str) -> Result<Url> {
        let target = self.url.join(href)?;
        let mut url = self.url.clone();
        url.set_path(target.path());
        url.set_query(target.query());
        url.set_fragment(None);
        Ok(url)
    }

    /// Request `href` with GET or POST
    pub(crate) async fn goto(
        &self,
        href: &str,
        method: &str,
        params: Option<Params>,
        content_type: Option<String>,
    ) -> Result<TestResponse> {
        let method = match method.to_ascii_lowercase().as_str() {
            "get" => Method::GET,
            "post" => Method::POST,
            _ => return Err(WebProbeError::InvalidMethod(method.to_string())),
        };
        let url = self.resolve(href)?;
        tracing::debug!(%method, url = %url, "following link");

        let mut request = self.app.request(method, url.as_str());
        if let Some(params) = params {
            request = request.params(params);
        }
        if let Some(content_type) = content_type {
            request = request.content_type(content_type);
        }
        request.send().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{Response, StatusCode};
    use mockall::predicate::function;

    fn mock_app(mock: MockTransport) -> TestApp {
        TestApp::from_transport(Arc::new(mock), TestAppConfig::default())
    }

    #[tokio::test]
    async fn test_get_params_go_to_query_and_fragment_is_dropped() {
        let mut mock = MockTransport::new();
        mock.expect_dispatch()
            .with(function(|req: &Request<Body>| {
                req.method() == Method::GET
                    && req.uri() == "/search?q=1&page=2"
                    && req.headers()[HOST] == "localhost"
            }))
            .times(1)
            .returning(|_| Ok(Response::new(Body::from("ok"))));

        let response = mock_app(mock)
            .get("/search?q=1#top")
            .params([("page", "2")])
            .send()
            .await
            .unwrap();
        assert_eq!(response.text(), "ok");
        assert_eq!(
            response.request_url().as_str(),
            "http://localhost/search?q=1&page=2"
        );
    }

    #[tokio::test]
    async fn test_post_params_go_to_body() {
        let mut mock = MockTransport::new();
        mock.expect_dispatch()
            .with(function(|req: &Request<Body>| {
                req.method() == Method::POST
                    && req.uri() == "/save"
                    && req.headers()[CONTENT_TYPE] == FORM_URLENCODED
                    && req.headers()[CONTENT_LENGTH] == "7"
            }))
            .times(1)
            .returning(|_| Ok(Response::new(Body::empty())));

        mock_app(mock)
            .post("/save")
            .params([("a", "1"), ("b", "2")])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_unexpected_status_is_an_app_error() {
        let mut mock = MockTransport::new();
        mock.expect_dispatch().times(2).returning(|_| {
            let mut response = Response::new(Body::from("nope"));
            *response.status_mut() = StatusCode::NOT_FOUND;
            Ok(response)
        });
        let app = mock_app(mock);

        match app.get("/x").await.unwrap_err() {
            WebProbeError::App(msg) => assert!(msg.contains("404 Not Found")),
            other => panic!("unexpected error: {other}"),
        }

        let response = app.get("/x").expect_errors().await.unwrap();
        assert_eq!(response.status_code(), 404);
    }

    #[tokio::test]
    async fn test_transport_errors_propagate() {
        let mut mock = MockTransport::new();
        mock.expect_dispatch()
            .returning(|_| Err(WebProbeError::Dispatch("down".into())));
        let err = mock_app(mock).get("/").await.unwrap_err();
        assert!(matches!(err, WebProbeError::Dispatch(_)));
    }

    #[tokio::test]
    async fn test_extra_headers_are_sent() {
        let mut mock = MockTransport::new();
        mock.expect_dispatch()
            .with(function(|req: &Request<Body>| {
                req.headers()["x-suite"] == "forms" && req.headers()["x-one"] == "1"
            }))
            .times(1)
            .returning(|_| Ok(Response::new(Body::empty())));
        let app = TestApp::from_transport(
            Arc::new(mock),
            TestAppConfig::default().extra_header("x-suite", "forms"),
        );
        app.get("/").header("x-one", "1").await.unwrap();
    }

    #[tokio::test]
    async fn test_goto_rejects_other_methods() {
        let page = Url::parse("http://localhost/a/b").unwrap();
        let origin = Origin::new(mock_app(MockTransport::new()), page);
        let err = origin.goto("/x", "put", None, None).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"Only "get" or "post" are allowed for method (you gave "put")"#
        );
    }

    #[test]
    fn test_resolve_strips_scheme_host_and_fragment() {
        let page = Url::parse("http://localhost/dir/page?x=1").unwrap();
        let origin = Origin::new(mock_app(MockTransport::new()), page);
        let resolve = |href: &str| origin.resolve(href).unwrap().to_string();

        assert_eq!(resolve("other#frag"), "http://localhost/dir/other");
        assert_eq!(
            resolve("https://elsewhere.test/abs?q=2"),
            "http://localhost/abs?q=2"
        );
        assert_eq!(resolve(""), "http://localhost/dir/page?x=1");
    }

    #[test]
    fn test_params_conversions() {
        assert_eq!(Params::from("a=1").encoded(), "a=1");
        assert_eq!(Params::from([("a", "1"), ("a", "2")]).encoded(), "a=1&a=2");
        assert!(Params::from(Vec::<(String, String)>::new()).is_empty());
    }
}
