//! Per-client fixed-window request limiting.

pub mod client_identity;
pub mod limiter;
pub mod sweeper;

use std::fmt;
use std::time::Duration;

pub use client_identity::ClientIdentity;
pub use limiter::{Admission, RateLimiter};
pub use sweeper::{spawn_sweeper, watch_sweeper};

/// Endpoint category; each has its own counters and policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Login,
    Register,
    Upload,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Login, Category::Register, Category::Upload];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Login => "login",
            Category::Register => "register",
            Category::Upload => "upload",
        }
    }

    /// Built-in limit when no override is configured.
    pub fn default_limit(&self) -> u32 {
        match self {
            Category::Login => 5,
            Category::Register => 3,
            Category::Upload => 10,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Limit and window for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPolicy {
    pub limit: u32,
    pub window: Duration,
}

impl WindowPolicy {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self { limit, window }
    }
}

/// Default window shared by every category.
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(60_000);

/// Idle entries older than `multiplier × window` are evicted.
pub const DEFAULT_STALE_MULTIPLIER: u32 = 2;
