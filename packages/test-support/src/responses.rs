//! Driving an app under test and asserting the guard response contracts.
//!
//! Guard middleware fails with `Err(actix_web::Error)`, which
//! `actix_web::test::call_service` treats as a panic. `send` renders such
//! errors the way the server would so tests see the wire response.

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{header, StatusCode};
use actix_web::{Error, HttpResponse};
use serde_json::Value;

/// Call `app` and return the response as a client would receive it.
pub async fn send<S, R, B>(app: &S, req: R) -> HttpResponse
where
    S: Service<R, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody + 'static,
{
    match app.call(req).await {
        Ok(res) => res.into_parts().1.map_into_boxed_body(),
        Err(err) => err.error_response(),
    }
}

/// Read a JSON response body.
pub async fn body_json(resp: HttpResponse) -> Value {
    let body = actix_web::body::to_bytes(resp.into_body())
        .await
        .expect("read response body");
    serde_json::from_slice(&body).expect("body should be JSON")
}

/// 401 with an empty body and a `Bearer` challenge, nothing else.
pub async fn assert_unauthorized(resp: HttpResponse) {
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        resp.headers()
            .get(header::WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok()),
        Some("Bearer")
    );
    let body = actix_web::body::to_bytes(resp.into_body())
        .await
        .expect("read response body");
    assert!(body.is_empty(), "401 body should be empty, got {body:?}");
}

/// 429 with `{"error": ...}` naming `category` and `limit`, and a
/// positive `Retry-After`. Returns the error message.
pub async fn assert_throttled(resp: HttpResponse, category: &str, limit: u32) -> String {
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

    let retry_after: u64 = resp
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .expect("Retry-After header with whole seconds");
    assert!(retry_after >= 1);

    let body = body_json(resp).await;
    let message = body["error"]
        .as_str()
        .expect("error field should be a string")
        .to_string();
    assert_eq!(body.as_object().map(|o| o.len()), Some(1), "body: {body}");
    assert!(
        message.starts_with(&format!("Too many {category} attempts. Maximum {limit} requests per ")),
        "unexpected message: {message}"
    );
    message
}
