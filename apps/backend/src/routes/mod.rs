use actix_web::web;

use crate::middleware::{RateLimit, TokenAuth};
use crate::rate_limit::Category;

pub mod auth;
pub mod health;
pub mod media;
pub mod users;

/// Register every route with its guards.
///
/// The last `wrap` on a resource runs first, so `RateLimit` is registered
/// after `TokenAuth` to throttle before any credential work.
pub fn configure(cfg: &mut web::ServiceConfig) {
    // Health check routes: /health
    cfg.service(web::scope("/health").configure(health::configure_routes));

    cfg.service(
        web::scope("/api")
            .service(
                web::resource("/auth/login")
                    .wrap(RateLimit::new(Category::Login))
                    .route(web::post().to(auth::login)),
            )
            .service(
                web::resource("/auth/register")
                    .wrap(RateLimit::new(Category::Register))
                    .route(web::post().to(auth::register)),
            )
            .service(
                web::resource("/users/me")
                    .wrap(TokenAuth)
                    .route(web::get().to(users::me)),
            )
            .service(
                web::resource("/media/upload")
                    .app_data(web::PayloadConfig::new(media::MAX_UPLOAD_BYTES))
                    .wrap(TokenAuth)
                    .wrap(RateLimit::new(Category::Upload))
                    .route(web::post().to(media::upload)),
            ),
    );
}
