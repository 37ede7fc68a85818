//! Assertion helpers for [`TestResponse`]
//!
//! These panic with a message that includes the response, which is usually
//! what a failing test wants to show.

use http::StatusCode;

use crate::response::TestResponse;

/// Assert the response status
///
/// # Panics
///
/// Panics if the status differs.
///
/// # Example
///
/// ```rust,no_run
/// use webprobe::prelude::*;
/// use webprobe::testing::{assert_status, debug_app};
///
/// # async fn example() -> webprobe::error::Result<()> {
/// let app = TestApp::new(debug_app());
/// let res = app.get("/?status=404").expect_errors().await?;
/// assert_status(&res, 404);
/// # Ok(())
/// # }
/// ```
pub fn assert_status(response: &TestResponse, expected: u16) {
    assert_eq!(
        response.status_code(),
        expected,
        "Expected status {expected}, got {}\n{response}",
        response.status_code()
    );
}

/// Assert that a header is present with exactly this value
///
/// # Panics
///
/// Panics if the header is missing or has a different value.
pub fn assert_header(response: &TestResponse, name: &str, expected: &str) {
    let actual = response
        .header(name)
        .unwrap_or_else(|| panic!("{name} header not found\n{response}"));
    assert_eq!(
        actual, expected,
        "Expected {name} to be {expected}, got {actual}"
    );
}

/// Assert a 3xx response whose `Location` ends with `expected_path`
///
/// `Location` may be absolute, so only the tail is compared.
///
/// # Panics
///
/// Panics if the response is not a redirect or points elsewhere.
pub fn assert_redirect(response: &TestResponse, expected_path: &str) {
    let status = response.status();
    assert!(
        status.is_redirection() && status != StatusCode::NOT_MODIFIED,
        "Expected a redirect, got {status}\n{response}"
    );
    let location = response
        .header("Location")
        .unwrap_or_else(|| panic!("Location header not found\n{response}"));
    assert!(
        location.ends_with(expected_path),
        "Expected redirect to {expected_path}, got {location}"
    );
}
