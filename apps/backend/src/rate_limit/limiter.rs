use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, info};

use super::{Category, WindowPolicy, DEFAULT_STALE_MULTIPLIER, DEFAULT_WINDOW};
use crate::error::AppError;

/// Result of one admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed {
        /// Requests counted in the current window, this one included
        count: u32,
        remaining: u32,
    },
    Throttled {
        limit: u32,
        /// Time until the current window closes
        retry_after: Duration,
    },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allowed { .. })
    }
}

#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

type EntryKey = (Category, String);

/// Fixed-window counters keyed by (category, client identity).
///
/// Windows are anchored to the first request seen after the previous window
/// elapsed, so a client can land up to `2 × limit` requests around a window
/// boundary.
#[derive(Debug)]
pub struct RateLimiter {
    policies: HashMap<Category, WindowPolicy>,
    stale_multiplier: u32,
    entries: DashMap<EntryKey, Arc<Mutex<Window>>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        let policies = Category::ALL
            .into_iter()
            .map(|c| (c, WindowPolicy::new(c.default_limit(), DEFAULT_WINDOW)))
            .collect();
        Self {
            policies,
            stale_multiplier: DEFAULT_STALE_MULTIPLIER,
            entries: DashMap::new(),
        }
    }
}

impl RateLimiter {
    /// Build a limiter. Categories missing from `policies` keep their defaults.
    pub fn new(
        policies: HashMap<Category, WindowPolicy>,
        stale_multiplier: u32,
    ) -> Result<Self, AppError> {
        if stale_multiplier == 0 {
            return Err(AppError::config("stale multiplier must be at least 1"));
        }
        if let Some((category, _)) = policies.iter().find(|(_, p)| p.window.is_zero()) {
            return Err(AppError::config(format!(
                "window for {category} must be greater than zero"
            )));
        }

        let mut limiter = Self::default();
        limiter.policies.extend(policies);
        limiter.stale_multiplier = stale_multiplier;
        Ok(limiter)
    }

    pub fn policy(&self, category: Category) -> WindowPolicy {
        self.policies
            .get(&category)
            .copied()
            .unwrap_or_else(|| WindowPolicy::new(category.default_limit(), DEFAULT_WINDOW))
    }

    pub fn admit(&self, identity: &str, category: Category) -> Admission {
        self.admit_at(identity, category, Instant::now())
    }

    /// Count one request from `identity` against `category` at `now`.
    pub fn admit_at(&self, identity: &str, category: Category, now: Instant) -> Admission {
        let policy = self.policy(category);

        // Get-or-create under the shard lock, then release it before taking
        // the entry lock so other identities never wait on this one.
        let entry = self
            .entries
            .entry((category, identity.to_string()))
            .or_insert_with(|| {
                Arc::new(Mutex::new(Window {
                    started: now,
                    count: 0,
                }))
            })
            .value()
            .clone();

        let mut window = entry.lock();
        let elapsed = now.saturating_duration_since(window.started);
        if elapsed > policy.window {
            window.count = 0;
            window.started = now;
        }

        if window.count >= policy.limit {
            let retry_after = policy
                .window
                .saturating_sub(now.saturating_duration_since(window.started));
            return Admission::Throttled {
                limit: policy.limit,
                retry_after,
            };
        }

        window.count += 1;
        debug!(
            category = %category,
            count = window.count,
            limit = policy.limit,
            "request admitted"
        );
        Admission::Allowed {
            count: window.count,
            remaining: policy.limit - window.count,
        }
    }

    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    /// Evict entries whose window started more than `stale_multiplier ×
    /// window` before `now`. Entries locked by an in-flight check are kept.
    pub fn sweep_at(&self, now: Instant) -> usize {
        let before = self.entries.len();

        self.entries.retain(|(category, _), entry| {
            let threshold = self
                .policy(*category)
                .window
                .checked_mul(self.stale_multiplier)
                .unwrap_or(Duration::MAX);
            match entry.try_lock() {
                Some(window) => now.saturating_duration_since(window.started) <= threshold,
                None => true,
            }
        });

        let remaining = self.entries.len();
        let removed = before.saturating_sub(remaining);
        if removed > 0 {
            info!(removed, remaining, "Cleaned up rate limit entries");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
