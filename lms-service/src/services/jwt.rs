use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::JwtConfig;
use service_core::error::AppError;

/// JWT service for session token generation and validation.
///
/// Tokens are HS256-signed with the shared secret from config. The payload
/// is deliberately minimal - `(user_id, role_id)` only. Capabilities are
/// never cached in the token; every authenticated request re-resolves them,
/// so permission changes apply on the very next request without re-login.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_minutes: i64,
}

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id).
    pub sub: i64,
    /// Role id at the time of issuance. Informational only; authorization
    /// re-reads the user's current role.
    pub role_id: i64,
    /// Expiration time (Unix timestamp). Enforced lazily at verification.
    pub exp: i64,
    /// Issued at (Unix timestamp).
    pub iat: i64,
}

impl JwtService {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            expiry_minutes: config.expiry_minutes,
        }
    }

    /// Mint a token binding `(user_id, role_id)`.
    pub fn generate_token(&self, user_id: i64, role_id: i64) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            role_id,
            exp: (now + Duration::minutes(self.expiry_minutes)).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(AppError::from)
    }

    /// Stateless signature + expiry check. Missing, malformed, expired, and
    /// tampered tokens all surface as `Unauthorized`.
    pub fn validate_token(&self, token: &str) -> Result<Claims, AppError> {
        let validation = Validation::new(Algorithm::HS256);
        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn test_service(expiry_minutes: i64) -> JwtService {
        JwtService::new(&JwtConfig {
            secret: "unit-test-secret-at-least-32-bytes!".to_string(),
            expiry_minutes,
        })
    }

    #[test]
    fn test_token_round_trip() {
        let service = test_service(60);
        let token = service.generate_token(42, 3).unwrap();
        let claims = service.validate_token(&token).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role_id, 3);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_expired_token_is_unauthorized() {
        // Negative expiry puts exp far enough in the past to beat the
        // default validation leeway.
        let service = test_service(-10);
        let token = service.generate_token(42, 3).unwrap();
        let err = service.validate_token(&token).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let signer = test_service(60);
        let verifier = JwtService::new(&JwtConfig {
            secret: "a-completely-different-signing-secret".to_string(),
            expiry_minutes: 60,
        });
        let token = signer.generate_token(42, 3).unwrap();
        assert!(verifier.validate_token(&token).is_err());
    }

    #[test]
    fn test_malformed_token_is_rejected() {
        let service = test_service(60);
        assert!(service.validate_token("not-a-jwt").is_err());
        assert!(service.validate_token("").is_err());
    }
}
