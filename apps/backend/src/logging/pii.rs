use std::fmt;
use std::net::IpAddr;

/// Masks a value before it reaches the logs.
///
/// - Emails keep the first character of the local part and the full domain.
/// - IPv4 addresses keep the first three octets; IPv6 the first three groups.
/// - Anything of 16 or more characters is treated as an opaque token.
/// - Shorter values pass through unchanged.
pub fn redact(input: &str) -> String {
    if let Some(at) = input.find('@') {
        let (local, domain) = input.split_at(at);
        return match local.chars().next() {
            Some(first) => format!("{first}***{domain}"),
            None => domain.to_string(),
        };
    }

    match input.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => {
            let [a, b, c, _] = v4.octets();
            return format!("{a}.{b}.{c}.x");
        }
        Ok(IpAddr::V6(v6)) => {
            let segments = v6.segments();
            return format!("{:x}:{:x}:{:x}::x", segments[0], segments[1], segments[2]);
        }
        Err(_) => {}
    }

    if input.chars().count() >= 16 {
        "[REDACTED_TOKEN]".to_string()
    } else {
        input.to_string()
    }
}

/// Redacts on display, so it can be dropped straight into a tracing field.
pub struct Redacted<'a>(pub &'a str);

impl fmt::Display for Redacted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&redact(self.0))
    }
}

impl fmt::Debug for Redacted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&redact(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_redaction() {
        assert_eq!(redact("user@example.com"), "u***@example.com");
        assert_eq!(redact("a@test.org"), "a***@test.org");
        assert_eq!(redact("@example.com"), "@example.com");
    }

    #[test]
    fn test_ip_redaction() {
        assert_eq!(redact("203.0.113.7"), "203.0.113.x");
        assert_eq!(redact("2001:db8:85a3::8a2e:370:7334"), "2001:db8:85a3::x");
    }

    #[test]
    fn test_token_redaction() {
        assert_eq!(
            redact("djE6YWxpY2VAZXhhbXBsZS5jb20"),
            "[REDACTED_TOKEN]"
        );
        assert_eq!(redact("unknown"), "unknown");
        assert_eq!(redact(""), "");
    }

    #[test]
    fn test_redacted_wrapper() {
        let redacted = Redacted("admin@test.org");
        assert_eq!(format!("{redacted}"), "a***@test.org");
        assert_eq!(format!("{redacted:?}"), "a***@test.org");
    }
}
