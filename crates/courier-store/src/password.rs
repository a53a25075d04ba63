use anyhow::anyhow;
use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::{SaltString, rand_core::OsRng},
};

use crate::error::{Result, StoreError};

/// Argon2 iteration cost used when none is configured.
pub const DEFAULT_WORK_FACTOR: u32 = 2;

fn hasher(work_factor: u32) -> Result<Argon2<'static>> {
    let params = Params::new(Params::DEFAULT_M_COST, work_factor, Params::DEFAULT_P_COST, None)
        .map_err(|e| StoreError::Storage(anyhow!("bad hashing params: {e}")))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a plaintext password with Argon2id at the given work factor.
/// The salt is random per call; the PHC output embeds salt and params, so
/// verification later recovers the cost this hash was created with.
pub fn hash(password: &str, work_factor: u32) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = hasher(work_factor)?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| StoreError::Storage(anyhow!("password hashing failed: {e}")))?
        .to_string();
    Ok(hash)
}

/// Verify a plaintext password against a stored PHC hash. The digest
/// comparison inside `verify_password` is constant-time.
pub fn verify(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let hash = hash("secret1", 1).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify("secret1", &hash));
    }

    #[test]
    fn wrong_password_rejected() {
        let hash = hash("secret1", 1).unwrap();
        assert!(!verify("wrong", &hash));
    }

    #[test]
    fn salts_differ_between_hashes() {
        let a = hash("secret1", 1).unwrap();
        let b = hash("secret1", 1).unwrap();
        assert_ne!(a, b);
        assert!(verify("secret1", &a));
        assert!(verify("secret1", &b));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify("secret1", "not-a-phc-string"));
    }
}
