use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use crate::error::StoreError;

// Argon2id, stored as PHC strings. The salt and parameters
// travel with the hash, which is also how a stored hash is
// told apart from a raw password someone just typed.

const ARGON2_IDENTS: [&'static str; 3] = ["argon2id", "argon2i", "argon2d"];

pub fn hash_password(password: &str) -> Result<String, StoreError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| StoreError::Internal(format!("Password hashing failed - {}", e)))
}

// Anything that doesn't parse as a hash doesn't verify.
pub fn verify_password(password: &str, hash: &str) -> bool {
  let parsed_hash = match PasswordHash::new(hash) {
    Ok(h) => h,
    Err(_) => return false
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .is_ok()
}

// The only check deciding whether a value still needs hashing.
pub fn is_password_hash(value: &str) -> bool {
  match PasswordHash::new(value) {
    Ok(h) => h.hash.is_some() && ARGON2_IDENTS.contains(&h.algorithm.as_str()),
    Err(_) => false
  }
}
