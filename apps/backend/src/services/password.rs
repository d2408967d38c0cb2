//! Salted password digests for the bundled user store.

use std::fmt;

use rand::RngCore;

const KDF_CONTEXT: &str = "storefront 2024 user password v1";
const SALT_LEN: usize = 16;

#[derive(Clone)]
pub struct PasswordDigest {
    salt: [u8; SALT_LEN],
    hash: blake3::Hash,
}

impl PasswordDigest {
    pub fn new(password: &str) -> Self {
        let mut salt = [0u8; SALT_LEN];
        rand::rng().fill_bytes(&mut salt);
        Self {
            hash: derive(&salt, password),
            salt,
        }
    }

    pub fn matches(&self, password: &str) -> bool {
        // blake3::Hash equality is constant time.
        derive(&self.salt, password) == self.hash
    }
}

fn derive(salt: &[u8], password: &str) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new_derive_key(KDF_CONTEXT);
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize()
}

impl fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordDigest(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_only_the_original_password() {
        let digest = PasswordDigest::new("correct horse battery");
        assert!(digest.matches("correct horse battery"));
        assert!(!digest.matches("correct horse"));
        assert!(!digest.matches(""));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let a = PasswordDigest::new("pw12345678");
        let b = PasswordDigest::new("pw12345678");
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn debug_does_not_leak() {
        let digest = PasswordDigest::new("pw12345678");
        assert_eq!(format!("{digest:?}"), "PasswordDigest(<redacted>)");
    }
}
