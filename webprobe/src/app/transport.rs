//! Request dispatch to the application under test

use std::convert::Infallible;
use std::fmt::Display;

use async_trait::async_trait;
use axum::body::{Body, HttpBody};
use axum::{BoxError, Router};
use bytes::Bytes;
use http::{Request, Response};
use tower::{Service, ServiceExt};

use crate::error::{Result, WebProbeError};

/// Something that turns a request into a response without a socket
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Run one request through the application
    ///
    /// # Errors
    ///
    /// [`WebProbeError::Dispatch`] when the application fails to produce a
    /// response.
    async fn dispatch(&self, request: Request<Body>) -> Result<Response<Body>>;
}

#[async_trait]
impl Transport for Router {
    async fn dispatch(&self, request: Request<Body>) -> Result<Response<Body>> {
        let result: std::result::Result<Response<Body>, Infallible> =
            self.clone().oneshot(request).await;
        match result {
            Ok(response) => Ok(response),
            Err(never) => match never {},
        }
    }
}

/// Adapter for any cloneable tower service
///
/// # Examples
///
/// ```rust
/// use std::convert::Infallible;
/// use axum::body::Body;
/// use http::{Request, Response};
/// use webprobe::app::{ServiceTransport, TestApp};
///
/// let svc = tower::service_fn(|_req: Request<Body>| async {
///     Ok::<_, Infallible>(Response::new(Body::from("pong")))
/// });
/// let app = TestApp::from_transport(
///     std::sync::Arc::new(ServiceTransport::new(svc)),
///     Default::default(),
/// );
/// # let _ = app;
/// ```
#[derive(Debug, Clone)]
pub struct ServiceTransport<S> {
    service: S,
}

impl<S> ServiceTransport<S> {
    /// Wrap a service
    #[must_use]
    pub const fn new(service: S) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S, B> Transport for ServiceTransport<S>
where
    S: Service<Request<Body>, Response = Response<B>> + Clone + Send + Sync + 'static,
    S::Future: Send,
    S::Error: Display,
    B: HttpBody<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    async fn dispatch(&self, request: Request<Body>) -> Result<Response<Body>> {
        let response = self
            .service
            .clone()
            .oneshot(request)
            .await
            .map_err(|err| WebProbeError::Dispatch(err.to_string()))?;
        Ok(response.map(Body::new))
    }
}
