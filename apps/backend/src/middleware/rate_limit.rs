//! Per-category admission guard.
//!
//! Wraps a route (outside `TokenAuth` where both apply) and consults the
//! shared `RateLimiter` before the inner service sees the request.

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::{web, Error};
use futures_util::future::{ready, LocalBoxFuture, Ready};

use super::token_auth::reject;
use crate::error::AppError;
use crate::logging::security;
use crate::rate_limit::{Admission, Category};
use crate::state::app_state::AppState;

const X_RATELIMIT_LIMIT: &str = "x-ratelimit-limit";
const X_RATELIMIT_REMAINING: &str = "x-ratelimit-remaining";

pub struct RateLimit {
    category: Category,
}

impl RateLimit {
    pub fn new(category: Category) -> Self {
        Self { category }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service,
            category: self.category,
        }))
    }
}

pub struct RateLimitMiddleware<S> {
    service: S,
    category: Category,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
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

        let category = self.category;
        let identity = app_state
            .client_identity
            .resolve(req.headers(), req.peer_addr());
        let policy = app_state.limiter.policy(category);

        match app_state.limiter.admit(&identity, category) {
            Admission::Throttled { limit, retry_after } => {
                security::rate_limit_hit(category, &identity, limit);
                reject(AppError::throttled(
                    category,
                    limit,
                    policy.window,
                    retry_after,
                ))
            }
            Admission::Allowed { remaining, .. } => {
                let fut = self.service.call(req);
                Box::pin(async move {
                    let mut res = fut.await?;
                    let headers = res.headers_mut();
                    headers.insert(
                        HeaderName::from_static(X_RATELIMIT_LIMIT),
                        HeaderValue::from(policy.limit),
                    );
                    headers.insert(
                        HeaderName::from_static(X_RATELIMIT_REMAINING),
                        HeaderValue::from(remaining),
                    );
                    Ok(res)
                })
            }
        }
    }
}
