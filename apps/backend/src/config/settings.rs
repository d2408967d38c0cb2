//! Process configuration loaded from environment variables.
//!
//! Everything is read once at startup. Any invalid value is reported as
//! `AppError::Config` before the server binds, and a missing or empty token
//! secret is always fatal.

use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use crate::auth::token::TokenCodec;
use crate::error::AppError;
use crate::rate_limit::{
    Category, ClientIdentity, RateLimiter, WindowPolicy, DEFAULT_STALE_MULTIPLIER, DEFAULT_WINDOW,
};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TOKEN_TTL: Duration = Duration::from_millis(3_600_000);

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            other => Err(format!("unknown log format: {other} (expected json or pretty)")),
        }
    }
}

/// Resolved service configuration.
#[derive(Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub workers: usize,
    token_secret: Vec<u8>,
    pub token_ttl: Duration,
    pub rate_limits: HashMap<Category, WindowPolicy>,
    pub stale_multiplier: u32,
    pub sweep_interval: Duration,
    pub client_identity: ClientIdentity,
    pub log_format: LogFormat,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("workers", &self.workers)
            .field("token_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("rate_limits", &self.rate_limits)
            .field("stale_multiplier", &self.stale_multiplier)
            .field("sweep_interval", &self.sweep_interval)
            .field("client_identity", &self.client_identity)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let token_secret = get("STOREFRONT_TOKEN_SECRET")
            .ok_or_else(|| AppError::config("STOREFRONT_TOKEN_SECRET must be set"))?
            .into_bytes();

        let default_window = parse_or(&get, "RATE_LIMIT_WINDOW_MS", DEFAULT_WINDOW, parse_millis)?;
        let mut rate_limits = HashMap::new();
        for category in Category::ALL {
            let name = category.as_str().to_ascii_uppercase();
            let limit = parse_or(
                &get,
                &format!("RATE_LIMIT_{name}_MAX"),
                category.default_limit(),
                parse_number,
            )?;
            let window = parse_or(
                &get,
                &format!("RATE_LIMIT_{name}_WINDOW_MS"),
                default_window,
                parse_millis,
            )?;
            rate_limits.insert(category, WindowPolicy::new(limit, window));
        }

        let stale_multiplier = parse_or(
            &get,
            "RATE_LIMIT_STALE_MULTIPLIER",
            DEFAULT_STALE_MULTIPLIER,
            parse_number,
        )?;
        if stale_multiplier == 0 {
            return Err(AppError::config(
                "RATE_LIMIT_STALE_MULTIPLIER must be at least 1",
            ));
        }

        let shortest_window = rate_limits
            .values()
            .map(|p: &WindowPolicy| p.window)
            .min()
            .unwrap_or(default_window);

        Ok(Self {
            host: get("STOREFRONT_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or(&get, "STOREFRONT_PORT", DEFAULT_PORT, parse_number)?,
            workers: parse_or(
                &get,
                "STOREFRONT_WORKERS",
                num_cpus::get().min(8),
                parse_number,
            )?,
            token_secret,
            token_ttl: parse_or(&get, "STOREFRONT_TOKEN_TTL_MS", DEFAULT_TOKEN_TTL, parse_millis)?,
            rate_limits,
            stale_multiplier,
            sweep_interval: parse_or(
                &get,
                "RATE_LIMIT_SWEEP_INTERVAL_MS",
                shortest_window,
                parse_millis,
            )?,
            client_identity: parse_or(
                &get,
                "CLIENT_IDENTITY",
                ClientIdentity::default(),
                |v| v.parse(),
            )?,
            log_format: parse_or(&get, "LOG_FORMAT", LogFormat::default(), |v| v.parse())?,
        })
    }

    pub fn token_codec(&self) -> Result<TokenCodec, AppError> {
        TokenCodec::new(&self.token_secret, self.token_ttl)
    }

    pub fn rate_limiter(&self) -> Result<RateLimiter, AppError> {
        RateLimiter::new(self.rate_limits.clone(), self.stale_multiplier)
    }
}

fn parse_or<T, G, P, E>(get: &G, key: &str, default: T, parse: P) -> Result<T, AppError>
where
    G: Fn(&str) -> Option<String>,
    P: Fn(&str) -> Result<T, E>,
    E: Display,
{
    match get(key) {
        Some(raw) => parse(&raw).map_err(|e| AppError::config(format!("{key}: {e}"))),
        None => Ok(default),
    }
}

fn parse_number<T>(raw: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: Display,
{
    raw.parse::<T>().map_err(|e| format!("invalid number {raw:?}: {e}"))
}

fn parse_millis(raw: &str) -> Result<Duration, String> {
    let millis: u64 = parse_number(raw)?;
    if millis == 0 {
        return Err("duration must be greater than zero".to_string());
    }
    Ok(Duration::from_millis(millis))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, AppError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let s = settings(&[("STOREFRONT_TOKEN_SECRET", "s3cret")]).unwrap();

        assert_eq!(s.host, "0.0.0.0");
        assert_eq!(s.port, 8080);
        assert_eq!(s.token_ttl, Duration::from_millis(3_600_000));
        assert_eq!(s.stale_multiplier, 2);
        assert_eq!(s.client_identity, ClientIdentity::Forwarded);
        assert_eq!(s.log_format, LogFormat::Json);
        assert_eq!(
            s.rate_limits[&Category::Login],
            WindowPolicy::new(5, Duration::from_secs(60))
        );
        assert_eq!(s.rate_limits[&Category::Register].limit, 3);
        assert_eq!(s.rate_limits[&Category::Upload].limit, 10);
        assert_eq!(s.sweep_interval, Duration::from_secs(60));
    }

    #[test]
    fn missing_or_blank_secret_is_fatal() {
        assert!(matches!(settings(&[]), Err(AppError::Config { .. })));
        assert!(matches!(
            settings(&[("STOREFRONT_TOKEN_SECRET", "   ")]),
            Err(AppError::Config { .. })
        ));
    }

    #[test]
    fn per_category_overrides() {
        let s = settings(&[
            ("STOREFRONT_TOKEN_SECRET", "s3cret"),
            ("RATE_LIMIT_WINDOW_MS", "30000"),
            ("RATE_LIMIT_UPLOAD_MAX", "2"),
            ("RATE_LIMIT_REGISTER_WINDOW_MS", "3600000"),
            ("CLIENT_IDENTITY", "peer"),
            ("LOG_FORMAT", "pretty"),
        ])
        .unwrap();

        assert_eq!(
            s.rate_limits[&Category::Upload],
            WindowPolicy::new(2, Duration::from_secs(30))
        );
        assert_eq!(
            s.rate_limits[&Category::Register].window,
            Duration::from_secs(3600)
        );
        assert_eq!(s.sweep_interval, Duration::from_secs(30));
        assert_eq!(s.client_identity, ClientIdentity::Peer);
        assert_eq!(s.log_format, LogFormat::Pretty);
    }

    #[test]
    fn invalid_values_are_reported_with_their_key() {
        for (key, value) in [
            ("STOREFRONT_PORT", "eighty"),
            ("RATE_LIMIT_LOGIN_MAX", "-1"),
            ("RATE_LIMIT_WINDOW_MS", "0"),
            ("RATE_LIMIT_STALE_MULTIPLIER", "0"),
            ("CLIENT_IDENTITY", "cookie"),
        ] {
            let err = settings(&[("STOREFRONT_TOKEN_SECRET", "s3cret"), (key, value)])
                .expect_err("expected configuration error");
            assert!(
                err.to_string().contains(key),
                "error for {key} should name the key, got: {err}"
            );
        }
    }

    #[test]
    fn builds_codec_and_limiter() {
        let s = settings(&[
            ("STOREFRONT_TOKEN_SECRET", "s3cret"),
            ("RATE_LIMIT_LOGIN_MAX", "1"),
        ])
        .unwrap();

        let codec = s.token_codec().unwrap();
        assert_eq!(codec.ttl(), s.token_ttl);

        let limiter = s.rate_limiter().unwrap();
        assert!(limiter.admit("a", Category::Login).is_allowed());
        assert!(!limiter.admit("a", Category::Login).is_allowed());
    }

    #[test]
    fn debug_output_hides_secret() {
        let s = settings(&[("STOREFRONT_TOKEN_SECRET", "hunter2-secret")]).unwrap();
        assert!(!format!("{s:?}").contains("hunter2"));
    }
}
