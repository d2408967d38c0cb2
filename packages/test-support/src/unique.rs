use ulid::Ulid;

/// `{prefix}-{ulid}`
pub fn unique_str(prefix: &str) -> String {
    format!("{}-{}", prefix, Ulid::new())
}

/// `{prefix}-{ulid}@example.test`, lowercase so it survives email
/// normalization unchanged.
pub fn unique_email(prefix: &str) -> String {
    format!("{}@example.test", unique_str(prefix)).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_str_has_prefix_and_differs() {
        let a = unique_str("user");
        let b = unique_str("user");
        assert_ne!(a, b);
        assert!(a.starts_with("user-"));
    }

    #[test]
    fn unique_email_is_normalized() {
        let email = unique_email("Seller");
        assert_eq!(email, email.to_lowercase());
        assert!(email.ends_with("@example.test"));
        assert!(email.starts_with("seller-"));
    }
}
