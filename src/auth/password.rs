//! Salted, adaptive password hashing (bcrypt).

use super::error::AccountError;

/// Work factor used for every stored password hash.
pub const DEFAULT_PASSWORD_COST: u32 = 10;

/// Lowest cost bcrypt accepts. Only tests should go this low.
pub const MIN_PASSWORD_COST: u32 = 4;

/// bcrypt only reads the first 72 bytes of its input; longer passwords are refused.
pub const MAX_PASSWORD_LENGTH: usize = 72;

/// Stateless bcrypt wrapper. The salt is random per call and embedded in the output.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            cost: DEFAULT_PASSWORD_COST,
        }
    }
}

impl PasswordHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hasher with an explicit cost, clamped to bcrypt's valid range.
    pub fn with_cost(cost: u32) -> Self {
        Self {
            cost: cost.clamp(MIN_PASSWORD_COST, 31),
        }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    pub fn hash(&self, plaintext: &str) -> Result<String, AccountError> {
        if plaintext.len() > MAX_PASSWORD_LENGTH {
            return Err(AccountError::Validation(format!(
                "Password must be at most {MAX_PASSWORD_LENGTH} bytes"
            )));
        }
        bcrypt::hash(plaintext, self.cost).map_err(|e| AccountError::Hashing(e.to_string()))
    }

    /// Check `plaintext` against a stored hash.
    ///
    /// A wrong password is `Ok(false)`; only a malformed hash is an error.
    /// Input longer than [`MAX_PASSWORD_LENGTH`] never matches.
    pub fn verify(&self, plaintext: &str, hashed: &str) -> Result<bool, AccountError> {
        if plaintext.len() > MAX_PASSWORD_LENGTH {
            return Ok(false);
        }
        bcrypt::verify(plaintext, hashed).map_err(|e| AccountError::Hashing(e.to_string()))
    }
}
