use std::sync::Arc;

use crate::auth::token::TokenCodec;
use crate::config::Settings;
use crate::error::AppError;
use crate::rate_limit::{ClientIdentity, RateLimiter};
use crate::repos::users::{InMemoryUserStore, UserStore};

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub tokens: TokenCodec,
    /// Shared by every worker; counters must not be per-thread
    pub limiter: Arc<RateLimiter>,
    pub client_identity: ClientIdentity,
    pub users: Arc<dyn UserStore>,
}

impl AppState {
    pub fn new(
        tokens: TokenCodec,
        limiter: Arc<RateLimiter>,
        client_identity: ClientIdentity,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            tokens,
            limiter,
            client_identity,
            users,
        }
    }

    /// Build state from settings with an empty in-memory user store.
    pub fn from_settings(settings: &Settings) -> Result<Self, AppError> {
        Ok(Self::new(
            settings.token_codec()?,
            Arc::new(settings.rate_limiter()?),
            settings.client_identity,
            Arc::new(InMemoryUserStore::new()),
        ))
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("tokens", &self.tokens)
            .field("limiter_entries", &self.limiter.len())
            .field("client_identity", &self.client_identity)
            .finish_non_exhaustive()
    }
}
