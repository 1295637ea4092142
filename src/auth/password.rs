use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::config::SecurityConfig;
use crate::database::models::User;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("bcrypt failure: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),

    #[error("password worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Hash on the blocking pool; bcrypt is deliberately slow.
pub async fn hash_password(password: &str, cost: u32) -> Result<String, PasswordError> {
    let password = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
    Ok(hashed)
}

pub async fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let password = password.to_owned();
    let hash = hash.to_owned();
    let valid = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??;
    Ok(valid)
}

fn is_bcrypt_hash(stored: &str) -> bool {
    stored.starts_with("$2")
}

fn equal(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Check a login attempt against a stored row.
///
/// Rows written before hashing was introduced hold the password itself, so
/// anything that is not a bcrypt hash is compared against the stored value
/// and the plaintext mirror.
pub async fn check_credentials(user: &User, password: &str) -> Result<bool, PasswordError> {
    if is_bcrypt_hash(&user.password) {
        return verify_password(password, &user.password).await;
    }

    let mirrored = user.password_plain.as_deref().is_some_and(|plain| equal(plain, password));
    Ok(equal(&user.password, password) || mirrored)
}

/// Value to store in `password_plain` alongside a fresh hash.
pub fn plaintext_mirror(password: &str, security: &SecurityConfig) -> Option<String> {
    security.retain_plaintext_passwords.then(|| password.to_owned())
}
