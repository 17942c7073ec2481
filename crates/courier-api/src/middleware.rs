//! Middleware: raw body capture and security headers.

use axum::{
    body::{Body, Bytes},
    extract::Request,
    middleware::Next,
    response::Response,
};
use courier_common::error::CourierError;
use http_body_util::LengthLimitError;

/// The request body exactly as it arrived on the wire.
///
/// Signature verification must run over these bytes, never over a
/// re-serialisation of the parsed JSON.
#[derive(Debug, Clone)]
pub struct RawBody(pub Bytes);

/// Buffer the body once and make it available to later stages.
///
/// The bytes are stored as a [`RawBody`] request extension and also put back
/// as the request body, so a handler can read either form. Size is bounded by
/// the `RequestBodyLimitLayer` wrapped around the router. A body without
/// `Content-Length` only hits that limit while streaming, so the read error is
/// mapped back to `413` here.
pub async fn capture_raw_body(request: Request, next: Next) -> Result<Response, CourierError> {
    let (mut parts, body) = request.into_parts();

    let bytes = axum::body::to_bytes(body, usize::MAX).await.map_err(|e| {
        if exceeds_length_limit(&e) {
            tracing::warn!("Interaction body exceeded the size limit");
            CourierError::PayloadTooLarge
        } else {
            tracing::warn!("Failed to read interaction body: {e}");
            CourierError::malformed("could not read request body")
        }
    })?;

    parts.extensions.insert(RawBody(bytes.clone()));
    let request = Request::from_parts(parts, Body::from(bytes));

    Ok(next.run(request).await)
}

fn exceeds_length_limit(err: &(dyn std::error::Error + 'static)) -> bool {
    std::iter::successors(Some(err), |e| e.source()).any(|e| e.is::<LengthLimitError>())
}

// ── Security headers ──────────────────────────────────────────────────────────

/// Add security headers to every HTTP response.
///
/// Headers applied:
/// - `X-Content-Type-Options: nosniff`
/// - `X-Frame-Options: DENY`
/// - `Referrer-Policy: no-referrer`
/// - `Cache-Control: no-store`
pub async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let h = response.headers_mut();

    macro_rules! set {
        ($name:expr, $val:expr) => {
            if let Ok(v) = $val.parse::<axum::http::HeaderValue>() {
                h.insert($name, v);
            }
        };
    }

    set!(
        axum::http::header::HeaderName::from_static("x-content-type-options"),
        "nosniff"
    );
    set!(
        axum::http::header::HeaderName::from_static("x-frame-options"),
        "DENY"
    );
    set!(
        axum::http::header::HeaderName::from_static("referrer-policy"),
        "no-referrer"
    );
    set!(axum::http::header::CACHE_CONTROL, "no-store");

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    use http_body_util::{BodyExt, Full, Limited};

    #[tokio::test]
    async fn length_limit_is_found_through_wrapping() {
        let limited = Limited::new(Full::new(Bytes::from_static(&[0u8; 16])), 4);
        let err = limited.collect().await.expect_err("body is over the limit");
        let outer = axum::Error::new(axum::Error::new(err));
        assert!(exceeds_length_limit(&outer));
    }

    #[test]
    fn other_read_errors_are_not_length_limits() {
        let err = axum::Error::new(std::io::Error::other("connection reset"));
        assert!(!exceeds_length_limit(&err));
    }
}
