//! Storage interfaces.

pub mod users;
