//! Problem Details assertions that do not depend on backend types.

use actix_web::http::{header, StatusCode};
use actix_web::HttpResponse;
use serde::Deserialize;

/// Mirror of the backend's problem details body.
#[derive(Debug, Deserialize)]
struct ProblemDetailsLike {
    #[serde(rename = "type")]
    type_: String,
    title: String,
    status: u16,
    detail: String,
    code: String,
}

/// Assert that a response is `application/problem+json` with the given
/// status and code, and optionally that `detail` contains a substring.
pub async fn assert_problem_details(
    resp: HttpResponse,
    expected_code: &str,
    expected_status: StatusCode,
    expected_detail_contains: Option<&str>,
) {
    assert_eq!(resp.status(), expected_status);
    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(
        content_type.starts_with("application/problem+json"),
        "unexpected content type: {content_type}"
    );

    let body = actix_web::body::to_bytes(resp.into_body())
        .await
        .expect("read response body");
    let problem: ProblemDetailsLike =
        serde_json::from_slice(&body).expect("body should be problem details JSON");

    assert_eq!(problem.code, expected_code);
    assert_eq!(problem.status, expected_status.as_u16());
    assert!(problem.type_.ends_with(expected_code), "type: {}", problem.type_);
    assert!(!problem.title.is_empty());

    if let Some(expected_detail) = expected_detail_contains {
        assert!(
            problem.detail.contains(expected_detail),
            "Expected detail to contain '{}', but got '{}'",
            expected_detail,
            problem.detail
        );
    }
}
