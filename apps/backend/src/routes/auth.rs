use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::claims::Role;
use crate::error::AppError;
use crate::extractors::ValidatedJson;
use crate::repos::users::User;
use crate::services::users::{authenticate, register as register_user, Registration};
use crate::state::app_state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    /// Milliseconds since epoch
    pub expires_at: u64,
    pub user: UserInfo,
}

/// Check credentials and issue a signed token carrying the user id, the
/// normalized email as subject, and the role.
pub async fn login(
    body: ValidatedJson<LoginRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let LoginRequest { email, password } = body.into_inner();
    let user = authenticate(app_state.users.as_ref(), &email, &password)?;
    let issued = app_state
        .tokens
        .issue(&user.id, &user.email, Some(user.role), std::time::SystemTime::now())?;

    Ok(HttpResponse::Ok().json(LoginResponse {
        token: issued.token,
        token_type: "Bearer",
        expires_at: issued.expires_at,
        user: user.into(),
    }))
}

pub async fn register(
    body: ValidatedJson<RegisterRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let RegisterRequest {
        name,
        email,
        password,
        role,
    } = body.into_inner();
    let user = register_user(
        app_state.users.as_ref(),
        Registration {
            name,
            email,
            password,
            role,
        },
    )?;

    Ok(HttpResponse::Created().json(UserInfo::from(user)))
}
