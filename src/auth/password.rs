use crate::error::AppError;

/// Lowest work factor bcrypt accepts. Fast enough for tests, too weak for
/// stored credentials.
pub const MIN_COST: u32 = 4;

/// Salted, slow one-way hashing of user passwords (bcrypt).
///
/// The cost is configurable so tests can trade strength for speed; production
/// code uses [`PasswordHasher::default`].
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        bcrypt::hash(password, self.cost)
            .map_err(|e| AppError::InternalServerError(format!("Failed to hash password: {}", e)))
    }

    /// Checks `password` against a stored digest.
    ///
    /// A digest that is not valid bcrypt is reported as an error rather than
    /// a mismatch.
    pub fn verify(&self, password: &str, digest: &str) -> Result<bool, AppError> {
        bcrypt::verify(password, digest).map_err(|e| {
            AppError::InternalServerError(format!("Failed to verify password: {}", e))
        })
    }
}
