use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Serialize;
use tracing::info;

use crate::auth::claims::Role;
use crate::error::{AppError, ErrorCode};
use crate::extractors::CurrentUser;
use crate::logging::pii::Redacted;

/// Larger bodies are refused by the payload extractor with 413.
pub const MAX_UPLOAD_BYTES: usize = 2 * 1024 * 1024;

const ALLOWED_TYPES: [&str; 3] = ["image/png", "image/jpeg", "image/gif"];

#[derive(Debug, Serialize)]
struct UploadResponse {
    media_id: String,
    owner: String,
    content_type: String,
    size_bytes: usize,
}

/// Accept a raw image body from a SELLER. Storage is out of scope; the
/// response reports what would have been stored.
pub async fn upload(
    req: HttpRequest,
    user: CurrentUser,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    user.require_role(Role::Seller)?;

    if body.is_empty() {
        return Err(AppError::bad_request(
            ErrorCode::EmptyUpload,
            "Cannot upload empty file",
        ));
    }

    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_ascii_lowercase())
        .unwrap_or_default();
    if !ALLOWED_TYPES.contains(&content_type.as_str()) {
        return Err(AppError::bad_request(
            ErrorCode::UnsupportedMediaType,
            "Only PNG, JPEG and GIF images are accepted",
        ));
    }

    let media_id = uuid::Uuid::new_v4().to_string();
    info!(
        media_id = %media_id,
        owner = %user.user_id(),
        email = %Redacted(user.subject()),
        size_bytes = body.len(),
        "Media accepted"
    );

    Ok(HttpResponse::Created().json(UploadResponse {
        media_id,
        owner: user.user_id().to_string(),
        content_type,
        size_bytes: body.len(),
    }))
}
