use tracing::info;
use unicode_normalization::UnicodeNormalization;

use crate::auth::claims::Role;
use crate::error::{AppError, ErrorCode};
use crate::logging::pii::Redacted;
use crate::logging::security;
use crate::repos::users::{NewUser, User, UserStore};
use crate::services::password::PasswordDigest;

const MIN_PASSWORD_LEN: usize = 8;

/// Registration input after JSON decoding.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
}

/// Normalize an email address for consistent storage and comparison.
///
/// Trims whitespace, applies Unicode NFKC normalization and lowercases, so
/// visually equivalent addresses map to the same credential subject.
pub fn normalize_email(email: &str) -> String {
    email.trim().nfkc().collect::<String>().to_lowercase()
}

fn validate(reg: &Registration, email: &str) -> Result<(), AppError> {
    if reg.name.trim().is_empty() {
        return Err(AppError::bad_request(ErrorCode::InvalidName, "Name cannot be empty"));
    }
    let valid_shape = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.'),
        None => false,
    };
    if !valid_shape || email.contains(':') || email.chars().any(char::is_whitespace) {
        return Err(AppError::bad_request(ErrorCode::InvalidEmail, "Email is not valid"));
    }
    if reg.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::bad_request(
            ErrorCode::InvalidPassword,
            format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    Ok(())
}

/// Create a user. Role defaults to CLIENT.
pub fn register(store: &dyn UserStore, reg: Registration) -> Result<User, AppError> {
    let email = normalize_email(&reg.email);
    validate(&reg, &email)?;

    let user = store.store(NewUser {
        name: reg.name.trim().to_string(),
        email,
        role: reg.role.unwrap_or(Role::Client),
        password: PasswordDigest::new(&reg.password),
    })?;

    info!(user_id = %user.id, email = %Redacted(&user.email), role = %user.role, "User registered");
    Ok(user)
}

/// Check an email/password pair. Unknown email and wrong password are
/// indistinguishable to the caller.
pub fn authenticate(store: &dyn UserStore, email: &str, password: &str) -> Result<User, AppError> {
    let email = normalize_email(email);
    match store.find_by_email(&email) {
        Some(user) if user.password.matches(password) => Ok(user),
        Some(_) => {
            security::login_failed("bad_password", &email);
            Err(AppError::unauthorized())
        }
        None => {
            security::login_failed("unknown_email", &email);
            Err(AppError::unauthorized())
        }
    }
}
