//! Argon2id password hashing and verification
//!
//! Digests are PHC strings, so the algorithm, cost parameters and salt travel
//! with the hash and verification needs nothing but the stored string.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PasswordError;

/// Plaintext used to build the digest burned by [`PasswordManager::verify_absent`]
const DUMMY_PASSWORD: &str = "chirpy-timing-equalizer";

/// Argon2id cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordCost {
    /// Memory size in KiB
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,
    /// Number of passes
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    /// Degree of parallelism
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

impl Default for PasswordCost {
    fn default() -> Self {
        Self {
            memory_kib: default_memory_kib(),
            iterations: default_iterations(),
            parallelism: default_parallelism(),
        }
    }
}

fn default_memory_kib() -> u32 {
    Params::DEFAULT_M_COST // 19 MiB
}

fn default_iterations() -> u32 {
    Params::DEFAULT_T_COST
}

fn default_parallelism() -> u32 {
    Params::DEFAULT_P_COST
}

/// Hashes and verifies passwords with a fixed Argon2id cost
#[derive(Clone)]
pub struct PasswordManager {
    argon2: Argon2<'static>,
    dummy_digest: String,
}

impl PasswordManager {
    /// Create a password manager with the given cost parameters
    pub fn new(cost: PasswordCost) -> Result<Self, PasswordError> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|e| PasswordError::Hashing(e.to_string()))?;

        let mut manager = Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            dummy_digest: String::new(),
        };
        manager.dummy_digest = manager.hash(DUMMY_PASSWORD)?;
        Ok(manager)
    }

    /// Hash a plaintext password with a fresh random salt
    pub fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::Hashing(e.to_string()))
    }

    /// Verify a plaintext password against a stored digest.
    ///
    /// The salt and cost embedded in `digest` are used, not the manager's
    /// own, so digests survive a cost change. Output comparison is constant
    /// time. `InvalidDigest` depends only on the stored string, never on the
    /// candidate password.
    pub fn verify(&self, plaintext: &str, digest: &str) -> Result<(), PasswordError> {
        let parsed = PasswordHash::new(digest).map_err(|_| PasswordError::InvalidDigest)?;
        if parsed.salt.is_none() || parsed.hash.is_none() {
            return Err(PasswordError::InvalidDigest);
        }

        match self.argon2.verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(()),
            Err(argon2::password_hash::Error::Password) => Err(PasswordError::PasswordMismatch),
            Err(e) => {
                debug!("Rejecting stored digest: {}", e);
                Err(PasswordError::InvalidDigest)
            }
        }
    }

    /// Spend one verification on an internal digest and report a mismatch.
    ///
    /// Used when the account being authenticated does not exist, so the
    /// response time matches a wrong password for an existing account.
    pub fn verify_absent(&self, plaintext: &str) -> Result<(), PasswordError> {
        let _ = self.verify(plaintext, &self.dummy_digest);
        Err(PasswordError::PasswordMismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_manager() -> PasswordManager {
        PasswordManager::new(PasswordCost {
            memory_kib: 256,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let manager = test_manager();
        let hash = manager.hash("correctPassword123!").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert_eq!(manager.verify("correctPassword123!", &hash), Ok(()));
    }

    #[test]
    fn test_same_password_gets_distinct_salts() {
        let manager = test_manager();
        let first = manager.hash("correctPassword123!").unwrap();
        let second = manager.hash("correctPassword123!").unwrap();

        assert_ne!(first, second);
        assert_eq!(manager.verify("correctPassword123!", &first), Ok(()));
        assert_eq!(manager.verify("correctPassword123!", &second), Ok(()));
    }

    #[test]
    fn test_wrong_password_is_mismatch() {
        let manager = test_manager();
        let hash1 = manager.hash("correctPassword123!").unwrap();
        let hash2 = manager.hash("anotherPassword456!").unwrap();

        assert_eq!(
            manager.verify("wrongPassword", &hash1),
            Err(PasswordError::PasswordMismatch)
        );
        assert_eq!(
            manager.verify("correctPassword123!", &hash2),
            Err(PasswordError::PasswordMismatch)
        );
        assert_eq!(
            manager.verify("", &hash1),
            Err(PasswordError::PasswordMismatch)
        );
    }

    #[test]
    fn test_empty_password() {
        let manager = test_manager();
        let hash = manager.hash("").unwrap();
        assert_eq!(manager.verify("", &hash), Ok(()));
    }

    #[test]
    fn test_special_characters() {
        let manager = test_manager();
        let passwords = [
            "!@#$%^&*()",
            "password with spaces",
            "password\nwith\nnewlines",
            "password\twith\ttabs",
            "\u{0}\u{1}\u{7f} control bytes",
            "password with unicode: \u{1F680}\u{1F389}",
            "this is a moderately long password that should still work correctly",
        ];

        for password in passwords {
            let hash = manager.hash(password).unwrap();
            assert_eq!(manager.verify(password, &hash), Ok(()), "{:?}", password);
        }
    }

    #[test]
    fn test_invalid_digest() {
        let manager = test_manager();
        let hash = manager.hash("correctPassword123!").unwrap();
        let truncated = &hash[..hash.rfind('$').unwrap()];

        for digest in [
            "invalidhash",
            "",
            truncated,
            "$2b$12$abcdefghijklmnopqrstuu5Wf0Zx6Q0lQXW4c9oJ9j8D1bqZ0rN2K",
            "$scrypt$ln=16,r=8,p=1$aM15713r3Xsvxbi31lqr1Q$nFNh2CVHVjNldFVKDHDlm4CbdRSCdEBsjjJxD+iCs5E",
        ] {
            assert_eq!(
                manager.verify("correctPassword123!", digest),
                Err(PasswordError::InvalidDigest),
                "{:?}",
                digest
            );
        }
    }

    #[test]
    fn test_verify_uses_embedded_cost() {
        let weak = test_manager();
        let stronger = PasswordManager::new(PasswordCost {
            memory_kib: 512,
            iterations: 2,
            parallelism: 1,
        })
        .unwrap();

        let hash = weak.hash("correctPassword123!").unwrap();
        assert_eq!(stronger.verify("correctPassword123!", &hash), Ok(()));
    }

    #[test]
    fn test_verify_absent_always_mismatches() {
        let manager = test_manager();
        assert_eq!(
            manager.verify_absent(DUMMY_PASSWORD),
            Err(PasswordError::PasswordMismatch)
        );
    }

    #[test]
    fn test_invalid_cost_is_rejected() {
        let result = PasswordManager::new(PasswordCost {
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        });
        assert!(matches!(result, Err(PasswordError::Hashing(_))));
    }

    #[test]
    fn test_default_cost() {
        let cost = PasswordCost::default();
        assert_eq!(cost.memory_kib, 19 * 1024);
        assert_eq!(cost.iterations, 2);
        assert_eq!(cost.parallelism, 1);
    }
}
