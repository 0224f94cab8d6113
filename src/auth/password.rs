//! Password hashing.
//!
//! bcrypt with a per-record random salt. Hashes written by other bcrypt
//! implementations (`$2a$`, `$2b$`, `$2y$`) verify as well.

use anyhow::Result;

/// Lowest and highest cost bcrypt accepts.
pub const MIN_COST: u32 = 4;
pub const MAX_COST: u32 = 31;

pub fn hash_password(plain: &str, cost: u32) -> Result<String> {
    Ok(bcrypt::hash(plain, cost)?)
}

/// Compare `plain` against a stored hash. A malformed stored hash never matches.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    match bcrypt::verify(plain, hash) {
        Ok(matches) => matches,
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash could not be parsed");
            false
        }
    }
}
