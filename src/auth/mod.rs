pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::database::models::User;

pub use password::{check_credentials, hash_password, plaintext_mirror, verify_password, PasswordError};

/// Session token payload issued by login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub name: String,
    pub is_admin: bool,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn for_user(user: &User, expiry_hours: u64) -> Result<Self, JwtError> {
        let now = Utc::now();
        let exp = i64::try_from(expiry_hours)
            .ok()
            .and_then(Duration::try_hours)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                JwtError::TokenGeneration(format!("token lifetime of {} hours is out of range", expiry_hours))
            })?
            .timestamp();

        Ok(Self {
            sub: user.id,
            name: user.name.clone(),
            is_admin: user.is_admin,
            exp,
            iat: now.timestamp(),
        })
    }
}

#[derive(Debug)]
pub enum JwtError {
    TokenGeneration(String),
    InvalidToken(String),
    InvalidSecret,
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::TokenGeneration(msg) => write!(f, "JWT generation error: {}", msg),
            JwtError::InvalidToken(msg) => write!(f, "Invalid JWT: {}", msg),
            JwtError::InvalidSecret => write!(f, "Invalid JWT secret"),
        }
    }
}

impl std::error::Error for JwtError {}

pub fn generate_jwt(claims: &Claims, security: &SecurityConfig) -> Result<String, JwtError> {
    if security.jwt_secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(security.jwt_secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

pub fn decode_jwt(token: &str, security: &SecurityConfig) -> Result<Claims, JwtError> {
    if security.jwt_secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(security.jwt_secret.as_bytes());
    decode::<Claims>(token, &decoding_key, &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| JwtError::InvalidToken(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn user(is_admin: bool) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            name: "dad".to_string(),
            nickname: None,
            password: String::new(),
            password_plain: None,
            avatar: None,
            avatar_type: None,
            avatar_url: None,
            bio: None,
            age: None,
            gender: None,
            is_admin,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn token_round_trips_identity() {
        let config = AppConfig::test_default();
        let user = user(true);
        let token = generate_jwt(&Claims::for_user(&user, 1).unwrap(), &config.security).unwrap();
        let claims = decode_jwt(&token, &config.security).unwrap();
        assert_eq!(claims.sub, user.id);
        assert!(claims.is_admin);
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let config = AppConfig::test_default();
        let token = generate_jwt(&Claims::for_user(&user(false), 1).unwrap(), &config.security).unwrap();

        let mut other = config.security.clone();
        other.jwt_secret = "another-secret".to_string();
        assert!(matches!(decode_jwt(&token, &other), Err(JwtError::InvalidToken(_))));
    }

    #[test]
    fn absurd_lifetime_is_an_error_not_a_panic() {
        assert!(matches!(
            Claims::for_user(&user(false), u64::MAX),
            Err(JwtError::TokenGeneration(_))
        ));
        assert!(matches!(
            Claims::for_user(&user(false), i64::MAX as u64),
            Err(JwtError::TokenGeneration(_))
        ));
    }
}
