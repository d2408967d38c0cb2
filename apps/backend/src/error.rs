use std::time::Duration;

use actix_web::error::ResponseError;
use actix_web::http::{header, StatusCode};
use actix_web::HttpResponse;
use serde::Serialize;
use thiserror::Error;

pub use crate::errors::ErrorCode;
use crate::rate_limit::Category;

#[derive(Serialize)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub type_: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    pub code: String,
}

/// Body of a 429 response.
#[derive(Serialize)]
pub struct ThrottledBody {
    pub error: String,
}

#[derive(Error, Debug)]
pub enum AppError {
    /// Missing, malformed, forged or expired credential. Deliberately carries
    /// no detail so callers cannot tell the cases apart.
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Too many {category} attempts")]
    Throttled {
        category: Category,
        limit: u32,
        window: Duration,
        retry_after: Duration,
    },
    #[error("Forbidden: {detail}")]
    Forbidden { detail: String },
    #[error("Bad request: {detail}")]
    BadRequest { code: ErrorCode, detail: String },
    #[error("Conflict: {detail}")]
    Conflict { code: ErrorCode, detail: String },
    #[error("Internal error: {detail}")]
    Internal { detail: String },
    #[error("Configuration error: {detail}")]
    Config { detail: String },
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Unauthorized => ErrorCode::Unauthorized,
            AppError::Throttled { .. } => ErrorCode::RateLimited,
            AppError::Forbidden { .. } => ErrorCode::Forbidden,
            AppError::BadRequest { code, .. } => *code,
            AppError::Conflict { code, .. } => *code,
            AppError::Internal { .. } => ErrorCode::Internal,
            AppError::Config { .. } => ErrorCode::ConfigError,
        }
    }

    fn detail(&self) -> String {
        match self {
            AppError::Unauthorized => "Authentication required".to_string(),
            AppError::Throttled {
                category,
                limit,
                window,
                ..
            } => format!(
                "Too many {category} attempts. Maximum {limit} requests per {}. Please try again later.",
                describe_window(*window)
            ),
            AppError::Forbidden { detail } => detail.clone(),
            AppError::BadRequest { detail, .. } => detail.clone(),
            AppError::Conflict { detail, .. } => detail.clone(),
            AppError::Internal { detail } => detail.clone(),
            AppError::Config { detail } => detail.clone(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Throttled { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Config { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn unauthorized() -> Self {
        Self::Unauthorized
    }

    pub fn throttled(category: Category, limit: u32, window: Duration, retry_after: Duration) -> Self {
        Self::Throttled {
            category,
            limit,
            window,
            retry_after,
        }
    }

    pub fn forbidden(detail: impl Into<String>) -> Self {
        Self::Forbidden {
            detail: detail.into(),
        }
    }

    pub fn bad_request(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            detail: detail.into(),
        }
    }

    pub fn conflict(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::Conflict {
            code,
            detail: detail.into(),
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal {
            detail: detail.into(),
        }
    }

    pub fn config(detail: impl Into<String>) -> Self {
        Self::Config {
            detail: detail.into(),
        }
    }

    fn humanize_code(code: &str) -> String {
        code.split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    None => String::new(),
                    Some(first) => first
                        .to_uppercase()
                        .chain(chars.flat_map(char::to_lowercase))
                        .collect(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// "minute" for 60s, "30 seconds", "2 hours", falling back to milliseconds.
fn describe_window(window: Duration) -> String {
    let millis = window.as_millis();
    let plural = |n: u128, unit: &str| {
        if n == 1 {
            unit.to_string()
        } else {
            format!("{n} {unit}s")
        }
    };
    if millis % 3_600_000 == 0 {
        plural(millis / 3_600_000, "hour")
    } else if millis % 60_000 == 0 {
        plural(millis / 60_000, "minute")
    } else if millis % 1_000 == 0 {
        plural(millis / 1_000, "second")
    } else {
        plural(millis, "millisecond")
    }
}

/// Whole seconds for a `Retry-After` header, rounded up and never zero.
pub fn retry_after_secs(retry_after: Duration) -> u64 {
    let secs = retry_after.as_secs();
    let rounded = if retry_after.subsec_nanos() > 0 { secs + 1 } else { secs };
    rounded.max(1)
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.status()
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status();
        match self {
            AppError::Unauthorized => HttpResponse::build(status)
                .insert_header((header::WWW_AUTHENTICATE, "Bearer"))
                .finish(),
            AppError::Throttled { retry_after, .. } => HttpResponse::build(status)
                .insert_header((header::RETRY_AFTER, retry_after_secs(*retry_after).to_string()))
                .json(ThrottledBody {
                    error: self.detail(),
                }),
            _ => {
                let code = self.code();
                let problem_details = ProblemDetails {
                    type_: format!("https://storefront.local/errors/{code}"),
                    title: Self::humanize_code(code.as_str()),
                    status: status.as_u16(),
                    detail: self.detail(),
                    code: code.as_str().to_string(),
                };

                HttpResponse::build(status)
                    .content_type("application/problem+json")
                    .json(problem_details)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use actix_web::body::to_bytes;
    use serde_json::Value;

    use super::*;

    #[test]
    fn describes_common_windows() {
        assert_eq!(describe_window(Duration::from_secs(60)), "minute");
        assert_eq!(describe_window(Duration::from_secs(120)), "2 minutes");
        assert_eq!(describe_window(Duration::from_secs(3600)), "hour");
        assert_eq!(describe_window(Duration::from_secs(30)), "30 seconds");
        assert_eq!(describe_window(Duration::from_millis(1500)), "1500 milliseconds");
    }

    #[test]
    fn retry_after_rounds_up_and_never_reaches_zero() {
        assert_eq!(retry_after_secs(Duration::from_millis(1)), 1);
        assert_eq!(retry_after_secs(Duration::ZERO), 1);
        assert_eq!(retry_after_secs(Duration::from_millis(59_001)), 60);
        assert_eq!(retry_after_secs(Duration::from_secs(12)), 12);
    }

    #[actix_web::test]
    async fn unauthorized_has_empty_body_and_challenge() {
        let resp = AppError::unauthorized().error_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            resp.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
        let body = to_bytes(resp.into_body()).await.unwrap();
        assert!(body.is_empty());
    }

    #[actix_web::test]
    async fn throttled_names_category_and_limit() {
        let err = AppError::throttled(
            Category::Login,
            5,
            Duration::from_secs(60),
            Duration::from_millis(42_500),
        );
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(resp.headers().get(header::RETRY_AFTER).unwrap(), "43");

        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            json["error"],
            "Too many login attempts. Maximum 5 requests per minute. Please try again later."
        );
        assert_eq!(json.as_object().unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn other_errors_use_problem_details() {
        let resp = AppError::conflict(ErrorCode::EmailTaken, "Email already in use").error_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/problem+json"
        );

        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "EMAIL_TAKEN");
        assert_eq!(json["title"], "Email Taken");
        assert_eq!(json["status"], 409);
        assert_eq!(json["detail"], "Email already in use");
        assert_eq!(json["type"], "https://storefront.local/errors/EMAIL_TAKEN");
    }
}
