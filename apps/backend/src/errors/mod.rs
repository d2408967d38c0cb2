//! Error codes for the storefront API.

pub mod error_code;

pub use error_code::ErrorCode;
