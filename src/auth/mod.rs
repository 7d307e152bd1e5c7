//! Token issuing and validation using the jsonwebtoken crate.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Student,
    Admin,
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserType::Student => f.write_str("student"),
            UserType::Admin => f.write_str("admin"),
        }
    }
}

/// Claims carried by every access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub user_id: i64,
    pub username: String,
    pub user_type: UserType,
    pub iat: u64,
    pub exp: u64,
}

/// Issues and validates signed, expiring bearer tokens. Cheap to clone; held
/// in application state.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    expiry_minutes: i64,
}

impl TokenService {
    pub fn new(secret: &str, expiry_minutes: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 60; // seconds of clock-skew tolerance

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            expiry_minutes,
        }
    }

    /// Sign a new access token for the given principal.
    pub fn issue(&self, user_id: i64, username: &str, user_type: UserType) -> AppResult<String> {
        let now = Utc::now();
        let expires = now + Duration::minutes(self.expiry_minutes);

        let claims = Claims {
            user_id,
            username: username.to_string(),
            user_type,
            iat: now.timestamp() as u64,
            exp: expires.timestamp() as u64,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Decode and validate a token, returning its claims.
    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::Unauthenticated("Token has expired".to_string())
                }
                _ => AppError::Unauthenticated("Invalid or expired token".to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_and_verify_roundtrip() {
        let tokens = TokenService::new("test-secret-key", 60);

        let token = tokens.issue(7, "STU001", UserType::Student).unwrap();
        let claims = tokens.verify(&token).unwrap();

        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.username, "STU001");
        assert_eq!(claims.user_type, UserType::Student);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn expired_token_rejected() {
        // Negative expiry puts `exp` in the past, beyond the leeway window.
        let tokens = TokenService::new("test-secret-key", -10);

        let token = tokens.issue(7, "STU001", UserType::Student).unwrap();
        let result = tokens.verify(&token);

        assert!(matches!(result, Err(AppError::Unauthenticated(msg)) if msg.contains("expired")));
    }

    #[test]
    fn token_signed_with_other_secret_rejected() {
        let issuer = TokenService::new("secret-one", 60);
        let verifier = TokenService::new("secret-two", 60);

        let token = issuer.issue(1, "admin1", UserType::Admin).unwrap();

        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn garbage_token_rejected() {
        let tokens = TokenService::new("test-secret-key", 60);

        assert!(tokens.verify("not-a-token").is_err());
    }
}
