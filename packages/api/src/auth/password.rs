//! Credential records for [`super::LocalAuth`] email accounts.
//!
//! Sign-up turns the chosen password into a salted Argon2id PHC string, and
//! that string is the only form of the password an account keeps. Sign-in
//! checks a candidate against it: a mismatch is [`AuthError::WrongPassword`],
//! which the shell shows as the provider's message, while a record that no
//! longer parses is a [`AuthError::Hashing`] failure.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use super::AuthError;

/// The stored form of a new account's password.
pub fn seal_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|record| record.to_string())
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Accept `password` only if it produced `record`.
pub fn check_password(password: &str, record: &str) -> Result<(), AuthError> {
    let record = PasswordHash::new(record).map_err(|e| AuthError::Hashing(e.to_string()))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &record)
        .map_err(|_| AuthError::WrongPassword)
}
