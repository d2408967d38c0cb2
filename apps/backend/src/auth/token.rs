//! Stateless signed credentials.
//!
//! Wire layout (before the outer base64 envelope), field order v1:
//!
//! ```text
//! <user_id>:<email>:<role>:<expires_at_millis>:<signature>
//! ```
//!
//! `email` is the credential subject. `role` is empty when the credential
//! carries no role. `signature` is the URL-safe unpadded base64 HMAC-SHA256
//! of the first four fields joined by `:`. The joined string is itself
//! URL-safe unpadded base64 encoded.
//!
//! Exactly five fields are accepted. The order carries no on-wire tag, so
//! changing it, or adding a field, means a new order with a new arity and
//! rotating the secret.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::auth::claims::{Claims, Role};
use crate::error::{AppError, ErrorCode};
use crate::logging::security;

type HmacSha256 = Hmac<Sha256>;

/// Fields in a credential, signature included.
pub const FIELD_COUNT: usize = 5;
const DELIMITER: char = ':';

/// Outcome of verifying a credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Valid(Claims),
    Invalid,
}

impl Verification {
    pub fn claims(self) -> Option<Claims> {
        match self {
            Verification::Valid(claims) => Some(claims),
            Verification::Invalid => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Verification::Valid(_))
    }
}

/// A freshly issued credential.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    /// Milliseconds since epoch
    pub issued_at: u64,
    /// Milliseconds since epoch
    pub expires_at: u64,
}

/// Why a credential was rejected. Only ever logged; callers see `Invalid`.
#[derive(Debug, Error, PartialEq, Eq)]
enum Rejection {
    #[error("malformed")]
    Malformed,
    #[error("bad_signature")]
    BadSignature,
    #[error("expired")]
    Expired,
}

/// Issues and verifies credentials with a server-wide HMAC key.
#[derive(Clone)]
pub struct TokenCodec {
    mac: HmacSha256,
    ttl: Duration,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Build a codec. An empty secret is a configuration error.
    pub fn new(secret: impl AsRef<[u8]>, ttl: Duration) -> Result<Self, AppError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(AppError::config("token secret must not be empty"));
        }
        let mac = HmacSha256::new_from_slice(secret)
            .map_err(|e| AppError::config(format!("invalid token secret: {e}")))?;
        Ok(Self { mac, ttl })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a credential with the configured TTL.
    pub fn issue(
        &self,
        user_id: &str,
        subject: &str,
        role: Option<Role>,
        now: SystemTime,
    ) -> Result<IssuedToken, AppError> {
        self.issue_with_ttl(user_id, subject, role, self.ttl, now)
    }

    pub fn issue_with_ttl(
        &self,
        user_id: &str,
        subject: &str,
        role: Option<Role>,
        ttl: Duration,
        now: SystemTime,
    ) -> Result<IssuedToken, AppError> {
        check_field(user_id, "user id")?;
        check_field(subject, "subject")?;

        let issued_at = epoch_millis(now)
            .ok_or_else(|| AppError::internal("Failed to get current time"))?;
        let ttl_ms = u64::try_from(ttl.as_millis())
            .map_err(|_| AppError::internal("Token TTL out of range"))?;
        let expires_at = issued_at
            .checked_add(ttl_ms)
            .ok_or_else(|| AppError::internal("Token expiry out of range"))?;

        let role_field = role.map(|r| r.as_str()).unwrap_or("");
        let payload = format!("{user_id}:{subject}:{role_field}:{expires_at}");
        let signature = self.sign(&payload);
        let token = URL_SAFE_NO_PAD.encode(format!("{payload}:{signature}"));

        Ok(IssuedToken {
            token,
            issued_at,
            expires_at,
        })
    }

    /// Verify a credential against the system clock.
    pub fn verify_now(&self, token: &str) -> Verification {
        self.verify(token, SystemTime::now())
    }

    /// Decode, check signature, then expiry. Every failure is `Invalid`.
    pub fn verify(&self, token: &str, now: SystemTime) -> Verification {
        match self.decode(token, now) {
            Ok(claims) => Verification::Valid(claims),
            Err(reason) => {
                security::token_rejected(&reason.to_string());
                Verification::Invalid
            }
        }
    }

    pub fn subject(&self, token: &str, now: SystemTime) -> Option<String> {
        self.verify(token, now).claims().map(|c| c.subject)
    }

    pub fn user_id(&self, token: &str, now: SystemTime) -> Option<String> {
        self.verify(token, now).claims().map(|c| c.user_id)
    }

    pub fn role(&self, token: &str, now: SystemTime) -> Option<Role> {
        self.verify(token, now).claims().and_then(|c| c.role)
    }

    fn decode(&self, token: &str, now: SystemTime) -> Result<Claims, Rejection> {
        let raw = URL_SAFE_NO_PAD
            .decode(token.as_bytes())
            .map_err(|_| Rejection::Malformed)?;
        let decoded = String::from_utf8(raw).map_err(|_| Rejection::Malformed)?;

        let fields: Vec<&str> = decoded.split(DELIMITER).collect();
        let &[user_id, subject, role, expires_at, signature] = fields.as_slice() else {
            return Err(Rejection::Malformed);
        };
        if user_id.is_empty() || subject.is_empty() {
            return Err(Rejection::Malformed);
        }

        // Signature covers everything before the last delimiter.
        let payload_len = decoded.len() - signature.len() - 1;
        let expected = self.sign(&decoded[..payload_len]);
        if !bool::from(expected.as_bytes().ct_eq(signature.as_bytes())) {
            return Err(Rejection::BadSignature);
        }

        let expires_at: u64 = expires_at.parse().map_err(|_| Rejection::Malformed)?;
        let role = match role {
            "" => None,
            other => Some(other.parse::<Role>().map_err(|_| Rejection::Malformed)?),
        };

        let now_ms = epoch_millis(now).ok_or(Rejection::Expired)?;
        if now_ms > expires_at {
            return Err(Rejection::Expired);
        }

        Ok(Claims {
            user_id: user_id.to_string(),
            subject: subject.to_string(),
            role,
            expires_at,
        })
    }

    fn sign(&self, payload: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
    }
}

/// Identity fields are embedded verbatim, so they must be non-empty and free
/// of the delimiter.
fn check_field(value: &str, what: &str) -> Result<(), AppError> {
    if value.is_empty() {
        return Err(AppError::bad_request(
            ErrorCode::InvalidSubject,
            format!("Token {what} cannot be empty"),
        ));
    }
    if value.contains(DELIMITER) {
        return Err(AppError::bad_request(
            ErrorCode::InvalidSubject,
            format!("Token {what} cannot contain ':'"),
        ));
    }
    Ok(())
}

fn epoch_millis(at: SystemTime) -> Option<u64> {
    let elapsed = at.duration_since(UNIX_EPOCH).ok()?;
    u64::try_from(elapsed.as_millis()).ok()
}
