#![allow(dead_code)]

// tests/common/mod.rs
use std::collections::HashMap;

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{test, web, App, Error, HttpResponse};
use serde_json::json;
use storefront::config::Settings;
use storefront::middleware::StructuredLogger;
use storefront::routes;
use storefront::state::app_state::AppState;
use storefront_test_support::{body_json, send};

pub const SECRET: &str = "integration-test-secret";
pub const PASSWORD: &str = "correct horse battery";

// Logging is auto-installed for every test binary
#[ctor::ctor]
fn init_logging() {
    storefront_test_support::logging::init();
}

/// State built through the same settings path as production.
///
/// Limits default high enough that setup traffic is never throttled; `vars`
/// are applied last and win.
pub fn state_with(vars: &[(&str, &str)]) -> AppState {
    let mut env: HashMap<String, String> = [
        ("STOREFRONT_TOKEN_SECRET", SECRET),
        ("RATE_LIMIT_LOGIN_MAX", "1000"),
        ("RATE_LIMIT_REGISTER_MAX", "1000"),
        ("RATE_LIMIT_UPLOAD_MAX", "1000"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (k, v) in vars {
        env.insert(k.to_string(), v.to_string());
    }

    let settings = Settings::from_lookup(|key| env.get(key).cloned()).expect("valid settings");
    AppState::from_settings(&settings).expect("valid state")
}

/// The production app shape around `state`.
pub async fn init_app(
    state: AppState,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error> {
    test::init_service(
        App::new()
            .wrap(StructuredLogger)
            .app_data(web::Data::new(state))
            .configure(routes::configure),
    )
    .await
}

pub async fn register<S, B>(app: &S, email: &str, role: Option<&str>) -> HttpResponse
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody + 'static,
{
    let mut body = json!({
        "name": "Test User",
        "email": email,
        "password": PASSWORD,
    });
    if let Some(role) = role {
        body["role"] = json!(role);
    }
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(body)
        .to_request();
    send(app, req).await
}

pub async fn login<S, B>(app: &S, email: &str, password: &str) -> HttpResponse
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody + 'static,
{
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": email, "password": password }))
        .to_request();
    send(app, req).await
}

/// Register `email` with `role` and return a fresh bearer token.
pub async fn token_for<S, B>(app: &S, email: &str, role: &str) -> String
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody + 'static,
{
    let resp = register(app, email, Some(role)).await;
    assert_eq!(resp.status().as_u16(), 201);

    let resp = login(app, email, PASSWORD).await;
    assert_eq!(resp.status().as_u16(), 200);
    body_json(resp).await["token"]
        .as_str()
        .expect("token should be a string")
        .to_string()
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}
