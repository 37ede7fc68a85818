//! Helpers for testing code that drives a [`TestApp`](crate::app::TestApp)
//!
//! - [`debug_app`] - a router that echoes every request back as text
//! - status, header and redirect assertions on [`TestResponse`](crate::response::TestResponse)
//!
//! # Example
//!
//! ```rust,no_run
//! use webprobe::prelude::*;
//! use webprobe::testing::{assert_status, debug_app};
//!
//! # async fn example() -> webprobe::error::Result<()> {
//! let app = TestApp::new(debug_app());
//! let res = app.get("/echo?status=201").await?;
//! assert_status(&res, 201);
//! assert!(res.contains("REQUEST_METHOD: GET"));
//! # Ok(())
//! # }
//! ```

pub mod assertions;
pub mod debug_app;

pub use assertions::*;
pub use debug_app::debug_app;
