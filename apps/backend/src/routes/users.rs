use actix_web::HttpResponse;
use serde::Serialize;

use crate::auth::claims::Role;
use crate::error::AppError;
use crate::extractors::CurrentUser;

#[derive(Debug, Serialize)]
struct MeResponse {
    user_id: String,
    subject: String,
    role: Option<Role>,
    expires_at: u64,
}

pub async fn me(user: CurrentUser) -> Result<HttpResponse, AppError> {
    let CurrentUser(claims) = user;
    Ok(HttpResponse::Ok().json(MeResponse {
        user_id: claims.user_id,
        subject: claims.subject,
        role: claims.role,
        expires_at: claims.expires_at,
    }))
}
