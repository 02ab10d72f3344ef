//! Argon2id password hashing.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::IdentityError;

/// Hashes and verifies passwords with fixed Argon2id parameters.
#[derive(Clone)]
pub struct PasswordHashing {
    argon2: Argon2<'static>,
}

impl PasswordHashing {
    /// # Errors
    /// [`IdentityError::Hashing`] if the cost parameters are out of range.
    pub fn new(memory_kib: u32, iterations: u32) -> Result<Self, IdentityError> {
        let params = Params::new(memory_kib, iterations, 1, None)
            .map_err(|e| IdentityError::Hashing(e.to_string()))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Returns a PHC string (`$argon2id$v=19$...`) with a fresh random salt.
    pub fn hash(&self, password: &str) -> Result<String, IdentityError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| IdentityError::Hashing(e.to_string()))
    }

    /// `true` if `password` matches `hash`. A malformed stored hash never
    /// matches.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            tracing::warn!("stored password hash is not a valid PHC string");
            return false;
        };
        self.argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

impl std::fmt::Debug for PasswordHashing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHashing").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> PasswordHashing {
        PasswordHashing::new(64, 1).unwrap()
    }

    #[test]
    fn test_verify_matching_password_succeeds() {
        let hashing = cheap();
        let hash = hashing.hash("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(hashing.verify("correct horse", &hash));
    }

    #[test]
    fn test_verify_wrong_password_fails() {
        let hashing = cheap();
        let hash = hashing.hash("correct horse").unwrap();
        assert!(!hashing.verify("battery staple", &hash));
    }

    #[test]
    fn test_verify_garbage_hash_fails() {
        assert!(!cheap().verify("anything", "not-a-hash"));
    }

    #[test]
    fn test_new_rejects_zero_iterations() {
        assert!(PasswordHashing::new(64, 0).is_err());
    }
}
