//! Credential guard for protected scopes.
//!
//! Reads `Authorization: Bearer <token>`, verifies it with the shared
//! `TokenCodec` and stores the resulting `Claims` in request extensions.
//! Missing, malformed, forged and expired credentials all produce the same
//! bare 401.

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header;
use actix_web::{web, Error, HttpMessage};
use futures_util::future::{ready, LocalBoxFuture, Ready};

use crate::auth::token::Verification;
use crate::error::AppError;
use crate::state::app_state::AppState;

pub struct TokenAuth;

impl<S, B> Transform<S, ServiceRequest> for TokenAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = TokenAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TokenAuthMiddleware { service }))
    }
}

pub struct TokenAuthMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for TokenAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let Some(app_state) = req.app_data::<web::Data<AppState>>().cloned() else {
            return reject(AppError::internal("AppState not available"));
        };

        let Some(token) = bearer_token(req.headers().get(header::AUTHORIZATION)) else {
            return reject(AppError::unauthorized());
        };

        match app_state.tokens.verify_now(&token) {
            Verification::Valid(claims) => {
                req.extensions_mut().insert(claims);
                Box::pin(self.service.call(req))
            }
            Verification::Invalid => reject(AppError::unauthorized()),
        }
    }
}

pub(crate) fn reject<B: 'static>(
    err: AppError,
) -> LocalBoxFuture<'static, Result<ServiceResponse<B>, Error>> {
    Box::pin(ready(Err(err.into())))
}

/// Extract `<token>` from `Bearer <token>`.
fn bearer_token(value: Option<&header::HeaderValue>) -> Option<String> {
    let value = value?.to_str().ok()?;
    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) => Some(token.to_string()),
        _ => None,
    }
}
