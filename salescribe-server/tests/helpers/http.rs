//! HTTP request builders and response readers

use axum::body::Body;
use axum::http::{header, Request, Response};
use http_body_util::BodyExt;
use salescribe_server::api::SCOPE_HEADER;

pub const MULTIPART_BOUNDARY: &str = "salescribe-test-boundary";

/// POST request carrying `content` as the `file` part of a multipart form
pub fn multipart_request(
    uri: &str,
    filename: &str,
    content: &[u8],
    scope: Option<&str>,
) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", MULTIPART_BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: text/csv\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", MULTIPART_BOUNDARY).as_bytes());

    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY),
        );
    if let Some(scope) = scope {
        builder = builder.header(SCOPE_HEADER, scope);
    }
    builder.body(Body::from(body)).unwrap()
}

/// Collect a response body and parse it as JSON
pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
