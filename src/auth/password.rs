/// Password Hashing and Verification
///
/// Handles password hashing with bcrypt and the password strength policy.

use bcrypt::{hash, verify};

use crate::error::AuthError;

const MIN_PASSWORD_LENGTH: usize = 8;

/// One-way salted password hashing with a configurable bcrypt cost
#[derive(Debug, Clone, Copy)]
pub struct CredentialVerifier {
    cost: u32,
}

impl CredentialVerifier {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Hash a password using bcrypt
    ///
    /// # Errors
    /// Returns error if bcrypt hashing fails
    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        hash(password, self.cost)
            .map_err(|e| AuthError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// Verify a password against its hash
    ///
    /// bcrypt compares digests in constant time. A malformed stored hash is
    /// reported as a plain mismatch.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        match verify(password, hash) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash could not be parsed");
                false
            }
        }
    }
}

impl Default for CredentialVerifier {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

/// Password strength requirements:
/// - Minimum 8 characters
/// - At least one digit
/// - At least one lowercase letter
/// - At least one uppercase letter
pub fn meets_policy(password: &str) -> bool {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return false;
    }

    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_lowercase = password.chars().any(|c| c.is_ascii_lowercase());
    let has_uppercase = password.chars().any(|c| c.is_ascii_uppercase());

    has_digit && has_lowercase && has_uppercase
}
