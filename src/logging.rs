//! Middleware for logging requests and responses.

use axum::{
    body::Body,
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::Error;

/// The largest request body, in bytes, that is read. Matches axum's default body limit.
pub const REQUEST_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If the body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and the full body is logged at the `debug` level.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_text = match read_body_text(body, REQUEST_BODY_LIMIT).await {
        Ok(text) => text,
        Err(error) => {
            tracing::warn!(
                "Could not read request body for {} {}: {error}",
                parts.method,
                parts.uri
            );
            return Error::InvalidRequest(format!(
                "the request body could not be read or is larger than {REQUEST_BODY_LIMIT} bytes"
            ))
            .into_response();
        }
    };
    log_request(&parts, &body_text);

    let request = Request::from_parts(parts, body_text.into());
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_text = match read_body_text(body, usize::MAX).await {
        Ok(text) => text,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    log_response(&parts, &body_text);

    Response::from_parts(parts, body_text.into())
}

async fn read_body_text(body: Body, limit: usize) -> Result<String, axum::Error> {
    let body_bytes = axum::body::to_bytes(body, limit).await?;

    Ok(String::from_utf8_lossy(&body_bytes).to_string())
}

/// The number of bytes of a request or response body to log at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Cut `body` to at most `limit` bytes without splitting a character.
fn truncate(body: &str, limit: usize) -> &str {
    if body.len() <= limit {
        return body;
    }

    let mut end = limit;
    while !body.is_char_boundary(end) {
        end -= 1;
    }

    &body[..end]
}

fn log_request(parts: &axum::http::request::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Received request: {} {}\nbody: {}...",
            parts.method,
            parts.uri,
            truncate(body, LOG_BODY_LENGTH_LIMIT)
        );
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!(
            "Received request: {} {}\nbody: {body:?}",
            parts.method,
            parts.uri
        );
    }
}

fn log_response(parts: &axum::http::response::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Sending response: {}\nbody: {}...",
            parts.status,
            truncate(body, LOG_BODY_LENGTH_LIMIT)
        );
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Sending response: {}\nbody: {body:?}", parts.status);
    }
}

#[cfg(test)]
mod tests {
    use axum::{Router, http::StatusCode, middleware, routing::post};
    use axum_test::TestServer;

    use crate::{ErrorKind, ErrorResponse};

    use super::{REQUEST_BODY_LIMIT, logging_middleware, truncate};

    #[test]
    fn truncate_leaves_short_text() {
        assert_eq!(truncate("coffee", 64), "coffee");
    }

    #[test]
    fn truncate_does_not_split_characters() {
        // "€" is three bytes long.
        assert_eq!(truncate("€€", 4), "€");
    }

    #[tokio::test]
    async fn passes_body_through() {
        let app = Router::new()
            .route("/echo", post(|body: String| async move { body }))
            .layer(middleware::from_fn(logging_middleware));
        let server = TestServer::try_new(app).expect("Could not create test server.");

        let body = "a".repeat(200);
        let response = server.post("/echo").text(&body).await;

        response.assert_status_ok();
        response.assert_text(body);
    }

    #[tokio::test]
    async fn oversized_request_is_rejected_before_handler() {
        let app = Router::new()
            .route("/echo", post(|body: String| async move { body }))
            .layer(middleware::from_fn(logging_middleware));
        let server = TestServer::try_new(app).expect("Could not create test server.");

        let response = server
            .post("/echo")
            .text("a".repeat(REQUEST_BODY_LIMIT + 1))
            .expect_failure()
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<ErrorResponse>().error, ErrorKind::Validation);
    }
}
