//! An application that only describes the request it received

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tracing::debug;

/// Router answering every path with a plain-text dump of the request
///
/// Query parameters steer the reply:
///
/// | parameter        | effect                                   |
/// |------------------|------------------------------------------|
/// | `error`          | respond `500` with a short message       |
/// | `status=404`     | respond with that status (default `200`) |
/// | `header-Name=v`  | add response header `Name: v`            |
///
/// The dump lists `REQUEST_METHOD`, `PATH_INFO`, `QUERY_STRING` and one
/// `HTTP_*` line per request header, sorted, followed by the body after a
/// `-- Body ----------` marker when it is not empty.
#[must_use]
pub fn debug_app() -> Router {
    Router::new().fallback(echo)
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    let query = uri.query().unwrap_or_default();
    let params: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect();
    debug!(%method, %uri, params = params.len(), "debug app request");

    if params.iter().any(|(name, _)| name == "error") {
        return (StatusCode::INTERNAL_SERVER_ERROR, "Exception requested").into_response();
    }

    let status = params
        .iter()
        .find(|(name, _)| name == "status")
        .and_then(|(_, value)| value.split_whitespace().next()?.parse::<u16>().ok())
        .and_then(|code| StatusCode::from_u16(code).ok())
        .unwrap_or(StatusCode::OK);

    let mut lines = vec![
        format!("PATH_INFO: {}", uri.path()),
        format!("QUERY_STRING: {query}"),
        format!("REQUEST_METHOD: {method}"),
    ];
    for (name, value) in &headers {
        let key = format!("HTTP_{}", name.as_str().to_uppercase().replace('-', "_"));
        lines.push(format!("{key}: {}", String::from_utf8_lossy(value.as_bytes())));
    }
    lines.sort();

    let mut text = lines.join("\n");
    text.push('\n');
    if !body.is_empty() {
        text.push_str("-- Body ----------\n");
        text.push_str(&String::from_utf8_lossy(&body));
    }

    let mut response = Response::new(Body::from(text));
    *response.status_mut() = status;
    let reply = response.headers_mut();
    reply.insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("text/plain"),
    );
    for (name, value) in &params {
        let Some(name) = name.strip_prefix("header-") else {
            continue;
        };
        match (
            header::HeaderName::from_bytes(name.as_bytes()),
            header::HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                reply.append(name, value);
            }
            _ => debug!(header = name, "skipping invalid header request"),
        }
    }
    response
}
