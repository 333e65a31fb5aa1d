//! Response middleware.

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::error::PAYLOAD_TOO_LARGE;

/// Largest framework error body read back for rewriting.
const MAX_ERROR_BODY_BYTES: usize = 16 * 1024;

/// Wrap error responses that did not come from a handler in `{"error": ...}`.
///
/// Extractor rejections, unmatched methods and the body-limit layer answer
/// with plain text; handler errors are already JSON and pass through.
pub async fn json_error_envelope(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) || is_json(&response) {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let message = if status == StatusCode::PAYLOAD_TOO_LARGE {
        PAYLOAD_TOO_LARGE.to_string()
    } else {
        match axum::body::to_bytes(body, MAX_ERROR_BODY_BYTES).await {
            Ok(bytes) if !bytes.iter().all(u8::is_ascii_whitespace) => {
                String::from_utf8_lossy(&bytes).trim().to_string()
            }
            _ => status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string(),
        }
    };

    debug!(
        subsystem = "api",
        component = "middleware",
        status = status.as_u16(),
        error = %message,
        "Wrapped framework error response"
    );

    let body = serde_json::json!({ "error": message }).to_string();
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    Response::from_parts(parts, Body::from(body))
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"))
}
