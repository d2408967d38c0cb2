use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpMessage, HttpRequest};
use futures_util::future::{ready, Ready};

use crate::auth::claims::{Claims, Role};
use crate::error::AppError;

/// Authenticated caller, taken from the claims `TokenAuth` stored in request
/// extensions. Handlers outside a `TokenAuth` scope get a 401.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub Claims);

impl CurrentUser {
    pub fn user_id(&self) -> &str {
        &self.0.user_id
    }

    pub fn subject(&self) -> &str {
        &self.0.subject
    }

    pub fn role(&self) -> Option<Role> {
        self.0.role
    }

    /// Fail with 403 unless the credential carries `role`.
    pub fn require_role(&self, role: Role) -> Result<(), AppError> {
        if self.0.role == Some(role) {
            Ok(())
        } else {
            Err(AppError::forbidden(format!("Requires role {role}")))
        }
    }
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Claims>()
                .cloned()
                .map(CurrentUser)
                .ok_or_else(AppError::unauthorized),
        )
    }
}

#[cfg(test)]
mod tests {
    use actix_web::test::TestRequest;

    use super::*;

    fn claims(role: Option<Role>) -> Claims {
        Claims {
            user_id: "42".to_string(),
            subject: "alice@example.com".to_string(),
            role,
            expires_at: 1,
        }
    }

    #[actix_web::test]
    async fn extracts_claims_from_extensions() {
        let req = TestRequest::default().to_http_request();
        req.extensions_mut().insert(claims(Some(Role::Seller)));

        let user = CurrentUser::extract(&req).await.unwrap();
        assert_eq!(user.user_id(), "42");
        assert_eq!(user.subject(), "alice@example.com");
        assert_eq!(user.role(), Some(Role::Seller));
    }

    #[actix_web::test]
    async fn missing_claims_is_unauthorized() {
        let req = TestRequest::default().to_http_request();
        assert!(matches!(
            CurrentUser::extract(&req).await,
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn require_role_checks_exact_role() {
        assert!(CurrentUser(claims(Some(Role::Seller)))
            .require_role(Role::Seller)
            .is_ok());
        assert!(matches!(
            CurrentUser(claims(Some(Role::Client))).require_role(Role::Seller),
            Err(AppError::Forbidden { .. })
        ));
        assert!(matches!(
            CurrentUser(claims(None)).require_role(Role::Seller),
            Err(AppError::Forbidden { .. })
        ));
    }
}
