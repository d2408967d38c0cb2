use tracing::{debug, warn};

use crate::logging::pii::Redacted;
use crate::rate_limit::Category;

/// A credential failed verification. The reason stays in the logs; the
/// client only ever sees a bare 401.
pub fn token_rejected(reason: &str) {
    debug!(
        event = "SECURITY_TOKEN_REJECTED",
        reason, "Credential rejected"
    );
}

/// Log a security-relevant login failure event.
pub fn login_failed(reason: &str, email: &str) {
    warn!(
        event = "SECURITY_LOGIN_FAILED",
        email = %Redacted(email),
        reason,
        "Authentication failure"
    );
}

/// Log a security-relevant rate-limit event.
pub fn rate_limit_hit(category: Category, identity: &str, limit: u32) {
    warn!(
        event = "SECURITY_RATE_LIMIT_HIT",
        category = %category,
        client = %Redacted(identity),
        limit,
        "Rate limit exceeded"
    );
}
