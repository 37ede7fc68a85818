//! webprobe: an in-process HTTP test client for axum applications
//!
//! Requests are dispatched straight into a [`Router`](axum::Router) through
//! tower, without a socket. Responses keep their body around so pages can be
//! inspected, their forms filled in and submitted, and their links and
//! buttons followed, all through the same application.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use axum::response::Html;
//! use axum::routing::{get, post};
//! use axum::Router;
//! use webprobe::prelude::*;
//!
//! # async fn example() -> webprobe::error::Result<()> {
//! let router = Router::new()
//!     .route(
//!         "/",
//!         get(|| async {
//!             Html(r#"<form method="POST" action="/greet">
//!                 <input name="who" value="world">
//!                 <input type="submit" name="go" value="Greet">
//!             </form>"#)
//!         }),
//!     )
//!     .route("/greet", post(|body: String| async move { body }));
//!
//! let app = TestApp::new(router);
//! let mut page = app.get("/").await?;
//! let form = page.form()?;
//! form.set("who", "Rust")?;
//! let res = form.submit(Some("go"), None).await?;
//! res.mustcontain(&["who=Rust", "go=Greet"], &[])?;
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`forms`] - form model, field state and submission
//! - [`links`] - finding links and buttons in a page
//! - [`app`] - the client, request building and body encoding
//! - [`response`] - responses and navigation from them
//! - [`testing`] - an echo application and assertion helpers

pub mod app;
pub mod config;
pub mod error;
pub mod forms;
pub mod html;
pub mod links;
pub mod observability;
pub mod pattern;
pub mod response;
pub mod testing;

pub mod prelude {
    //! Convenience re-exports for common types
    //!
    //! # Examples
    //!
    //! ```rust
    //! use webprobe::prelude::*;
    //! ```

    pub use crate::app::{ExpectedStatus, Params, RequestBuilder, TestApp};
    pub use crate::config::TestAppConfig;
    pub use crate::error::{Result, WebProbeError};
    pub use crate::forms::{
        Field, FieldKind, Form, FormKey, Forms, SelectOption, SubmitValue, Upload, Value,
    };
    pub use crate::links::ElementQuery;
    pub use crate::pattern::Pattern;
    pub use crate::response::TestResponse;
}
