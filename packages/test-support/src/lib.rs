//! Test support shared by the storefront unit and integration tests.
//!
//! Logging initialization, unique test data, and assertions for the
//! response contracts of the credential and rate limit guards.

pub mod logging;
pub mod problem_details;
pub mod responses;
pub mod unique;

pub use problem_details::assert_problem_details;
pub use responses::{assert_throttled, assert_unauthorized, body_json, send};
pub use unique::{unique_email, unique_str};
