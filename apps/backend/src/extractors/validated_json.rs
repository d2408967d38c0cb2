use std::ops::Deref;

use actix_web::dev::Payload;
use actix_web::web::{Bytes, BytesMut};
use actix_web::{FromRequest, HttpRequest};
use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use serde_json::Error as JsonError;
use tracing::debug;

use crate::error::{AppError, ErrorCode};

/// JSON body extractor whose failures render as `BAD_REQUEST` problem
/// details instead of actix's plain-text 400.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<T> ValidatedJson<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for ValidatedJson<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> FromRequest for ValidatedJson<T>
where
    T: DeserializeOwned + 'static,
{
    type Error = AppError;
    type Future = std::pin::Pin<Box<dyn std::future::Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(_req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let mut payload = payload.take();

        Box::pin(async move {
            let mut body = BytesMut::new();
            while let Some(chunk) = payload.next().await {
                let chunk: Bytes = chunk.map_err(|e| {
                    debug!(error = %e, "Failed to read request body chunk");
                    AppError::bad_request(ErrorCode::BadRequest, "Failed to read request body")
                })?;
                body.extend_from_slice(&chunk);
            }

            serde_json::from_slice::<T>(&body)
                .map(ValidatedJson)
                .map_err(|e| {
                    debug!(body_size = body.len(), "JSON parsing failed");
                    AppError::bad_request(ErrorCode::BadRequest, classify_json_error(&e))
                })
        })
    }
}

/// Sanitized description of a JSON failure; never echoes body content.
fn classify_json_error(error: &JsonError) -> String {
    match error.classify() {
        serde_json::error::Category::Syntax => {
            format!("Invalid JSON at line {}", error.line())
        }
        serde_json::error::Category::Eof => "Invalid JSON: unexpected end of input".to_string(),
        serde_json::error::Category::Data => {
            "Invalid JSON: missing or wrong types for one or more fields".to_string()
        }
        serde_json::error::Category::Io => "Invalid JSON: I/O error while reading body".to_string(),
    }
}
