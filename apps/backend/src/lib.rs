#![deny(clippy::wildcard_imports)]
#![cfg_attr(test, allow(clippy::wildcard_imports))]

pub mod auth;
pub mod config;
pub mod error;
pub mod errors;
pub mod extractors;
pub mod logging;
pub mod middleware;
pub mod rate_limit;
pub mod repos;
pub mod routes;
pub mod services;
pub mod state;

// Re-exports for public API
pub use auth::{Claims, Role, TokenCodec, Verification};
pub use config::Settings;
pub use error::AppError;
pub use errors::ErrorCode;
pub use extractors::CurrentUser;
pub use middleware::{RateLimit, StructuredLogger, TokenAuth};
pub use rate_limit::{Admission, Category, ClientIdentity, RateLimiter};
pub use state::app_state::AppState;

// Auto-initialize logging for unit tests
#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    storefront_test_support::logging::init();
}
