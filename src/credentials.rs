use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString};
use std::sync::Arc;

// 1. CredentialHasher Contract

/// CredentialHasher
///
/// Defines the abstract contract for password hashing and verification,
/// keeping the concrete algorithm out of the signup/signin handlers. The
/// production implementation is Argon2id; tests may substitute a cheap
/// mock to keep the suite fast.
pub trait CredentialHasher: Send + Sync {
    /// Hashes a plaintext password into a PHC-format string suitable for
    /// storage alongside the user record.
    fn hash(&self, password: &str) -> Result<String, String>;

    /// Verifies a plaintext password against a stored PHC string.
    /// A malformed stored hash verifies as false rather than erroring.
    fn verify(&self, password: &str, stored: &str) -> bool;
}

// 2. The Real Implementation (Argon2id)

/// Argon2Hasher
///
/// Argon2id with the crate's default parameters and a fresh random salt
/// per hash. The resulting PHC string embeds algorithm, parameters and
/// salt, so verification needs no extra state.
#[derive(Clone, Default)]
pub struct Argon2Hasher;

impl Argon2Hasher {
    pub fn new() -> Self {
        Self
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, String> {
        let mut salt_bytes = [0u8; 16];
        getrandom::getrandom(&mut salt_bytes).map_err(|e| e.to_string())?;
        let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| e.to_string())?;

        let argon2 = Argon2::default();
        let phc = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| e.to_string())?
            .to_string();
        Ok(phc)
    }

    fn verify(&self, password: &str, stored: &str) -> bool {
        match PasswordHash::new(stored) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

// 3. The Mock Implementation (For Tests)

/// MockHasher
///
/// A transparent "hash" used in tests where Argon2's work factor would
/// dominate the runtime. Never used outside test setup.
#[derive(Clone, Default)]
pub struct MockHasher;

impl MockHasher {
    pub fn new() -> Self {
        Self
    }
}

impl CredentialHasher for MockHasher {
    fn hash(&self, password: &str) -> Result<String, String> {
        Ok(format!("plain:{password}"))
    }

    fn verify(&self, password: &str, stored: &str) -> bool {
        stored
            .strip_prefix("plain:")
            .is_some_and(|p| p == password)
    }
}

/// HasherState
///
/// The concrete type used to share the credential hasher across the
/// application state.
pub type HasherState = Arc<dyn CredentialHasher>;
