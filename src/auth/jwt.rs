//! JWT Token Handler
//! Mission: Generate and validate bearer tokens

use crate::auth::models::{Claims, User};
use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;
use uuid::Uuid;

/// JWT Handler for token operations
pub struct JwtHandler {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration_hours: i64,
}

impl JwtHandler {
    pub fn new(secret: &str, expiration_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiration_hours,
        }
    }

    /// Generate a token for a user. Returns the token and its lifetime in seconds.
    pub fn generate_token(&self, user: &User) -> Result<(String, usize)> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(chrono::Duration::hours(self.expiration_hours))
            .context("Invalid timestamp")?
            .timestamp() as usize;

        let issued_at = now.timestamp() as usize;
        let expires_in = expiration.saturating_sub(issued_at);

        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role,
            jti: Uuid::new_v4().to_string(),
            iat: issued_at,
            exp: expiration,
        };

        debug!(
            "Generating JWT for user {} ({}), expires in {}h",
            user.email, user.id, self.expiration_hours
        );

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .context("Failed to generate JWT")?;

        Ok((token, expires_in))
    }

    /// Validate signature and expiry, then extract claims.
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        // No leeway: revocation rows are pruned as soon as `exp` passes
        let mut validation = Validation::default();
        validation.leeway = 0;

        let decoded = decode::<Claims>(token, &self.decoding_key, &validation)
            .context("Invalid or expired token")?;

        debug!("Validated JWT for user {}", decoded.claims.email);

        Ok(decoded.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::UserRole;

    fn create_test_user(role: UserRole) -> User {
        User {
            id: 42,
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            password_hash: "hash".to_string(),
            role,
            created_at: Utc::now().to_rfc3339(),
            updated_at: Utc::now().to_rfc3339(),
        }
    }

    #[test]
    fn test_jwt_generation_and_validation() {
        let handler = JwtHandler::new("test-secret-key-12345", 24);
        let user = create_test_user(UserRole::Student);

        let (token, expires_in) = handler.generate_token(&user).unwrap();
        assert!(!token.is_empty());
        assert_eq!(expires_in, 24 * 3600);

        let claims = handler.validate_token(&token).unwrap();
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.user_id(), Some(42));
        assert_eq!(claims.role, UserRole::Student);
        assert!(claims.exp > Utc::now().timestamp() as usize);
    }

    #[test]
    fn test_each_token_gets_unique_jti() {
        let handler = JwtHandler::new("test-secret-key-12345", 24);
        let user = create_test_user(UserRole::Admin);

        let (a, _) = handler.generate_token(&user).unwrap();
        let (b, _) = handler.generate_token(&user).unwrap();

        let ca = handler.validate_token(&a).unwrap();
        let cb = handler.validate_token(&b).unwrap();
        assert_ne!(ca.jti, cb.jti);
    }

    #[test]
    fn test_invalid_token_rejected() {
        let handler = JwtHandler::new("test-secret-key-12345", 24);
        assert!(handler.validate_token("invalid.token.here").is_err());
    }

    #[test]
    fn test_different_secrets_reject() {
        let handler1 = JwtHandler::new("secret1", 24);
        let handler2 = JwtHandler::new("secret2", 24);
        let user = create_test_user(UserRole::Reviewer);

        let (token, _) = handler1.generate_token(&user).unwrap();
        assert!(handler2.validate_token(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let handler = JwtHandler::new("test-secret-key-12345", -1);
        let user = create_test_user(UserRole::Student);

        let (token, expires_in) = handler.generate_token(&user).unwrap();
        assert_eq!(expires_in, 0);
        assert!(handler.validate_token(&token).is_err());
    }

    #[test]
    fn test_token_rejected_seconds_after_expiry() {
        let handler = JwtHandler::new("test-secret-key-12345", 24);
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: "42".to_string(),
            email: "test@example.com".to_string(),
            role: UserRole::Student,
            jti: Uuid::new_v4().to_string(),
            iat: now - 120,
            exp: now - 5,
        };
        let token = encode(&Header::default(), &claims, &handler.encoding_key).unwrap();

        assert!(handler.validate_token(&token).is_err());
    }
}
