pub mod rate_limit;
pub mod structured_logger;
pub mod token_auth;

pub use rate_limit::RateLimit;
pub use structured_logger::StructuredLogger;
pub use token_auth::TokenAuth;
