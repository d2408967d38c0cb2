//! Every code that can appear in a problem-details body.
//!
//! Add new codes here; never pass ad-hoc strings as error codes.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Authentication & Authorization
    Unauthorized,
    Forbidden,
    RateLimited,

    // Request Validation
    /// Body could not be read or parsed
    BadRequest,
    /// Credential identity field is empty or contains the delimiter
    InvalidSubject,
    InvalidName,
    InvalidEmail,
    InvalidPassword,
    EmptyUpload,
    UnsupportedMediaType,

    // Conflicts
    EmailTaken,

    // System
    Internal,
    ConfigError,
}

impl ErrorCode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::RateLimited => "RATE_LIMITED",

            Self::BadRequest => "BAD_REQUEST",
            Self::InvalidSubject => "INVALID_SUBJECT",
            Self::InvalidName => "INVALID_NAME",
            Self::InvalidEmail => "INVALID_EMAIL",
            Self::InvalidPassword => "INVALID_PASSWORD",
            Self::EmptyUpload => "EMPTY_UPLOAD",
            Self::UnsupportedMediaType => "UNSUPPORTED_MEDIA_TYPE",

            Self::EmailTaken => "EMAIL_TAKEN",

            Self::Internal => "INTERNAL",
            Self::ConfigError => "CONFIG_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    const ALL: [ErrorCode; 13] = [
        ErrorCode::Unauthorized,
        ErrorCode::Forbidden,
        ErrorCode::RateLimited,
        ErrorCode::BadRequest,
        ErrorCode::InvalidSubject,
        ErrorCode::InvalidName,
        ErrorCode::InvalidEmail,
        ErrorCode::InvalidPassword,
        ErrorCode::EmptyUpload,
        ErrorCode::UnsupportedMediaType,
        ErrorCode::EmailTaken,
        ErrorCode::Internal,
        ErrorCode::ConfigError,
    ];

    #[test]
    fn codes_are_unique_screaming_snake_case() {
        let mut seen = HashSet::new();
        for code in ALL {
            let s = code.as_str();
            assert!(seen.insert(s), "duplicate code {s}");
            assert!(
                s.chars().all(|c| c.is_ascii_uppercase() || c == '_'),
                "{s} is not SCREAMING_SNAKE_CASE"
            );
            assert_eq!(code.to_string(), s);
        }
    }
}
