//! Credential verifier: Argon2id password hashing.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("password hashing failed: {0}")]
pub struct PasswordHashError(String);

/// Hash a password with a fresh random salt.
///
/// The result is a PHC string (`$argon2id$v=19$...$salt$hash`), so it carries
/// everything `verify_password` needs.
pub fn hash_password(plaintext: &str) -> Result<String, PasswordHashError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordHashError(e.to_string()))
}

/// Check a plaintext against a stored PHC hash.
///
/// A malformed stored hash verifies as `false`. The digest comparison inside
/// `argon2` is constant-time.
pub fn verify_password(plaintext: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn hash_embeds_algorithm_and_salt() {
        let hash = hash_password("hunter2").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        // algorithm, version, params, salt, digest
        assert_eq!(hash.split('$').filter(|s| !s.is_empty()).count(), 5);
    }

    #[test]
    fn same_password_hashes_differently() {
        assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
    }

    #[test]
    fn malformed_hash_is_a_plain_mismatch() {
        assert!(!verify_password("anything", ""));
        assert!(!verify_password("anything", "not-a-phc-string"));
        assert!(!verify_password("anything", "$argon2id$v=19$garbage"));
    }

    proptest! {
        // Argon2 is deliberately slow; a handful of cases is enough.
        #![proptest_config(ProptestConfig::with_cases(6))]

        #[test]
        fn verifies_own_hash_and_rejects_others(p in "\\PC{1,24}", q in "\\PC{1,24}") {
            prop_assume!(p != q);
            let hash = hash_password(&p).unwrap();
            prop_assert!(verify_password(&p, &hash));
            prop_assert!(!verify_password(&q, &hash));
        }
    }
}
