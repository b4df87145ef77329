use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::JwtConfig;
use crate::models::User;

/// JWT service for token generation and validation. HS256 with a shared
/// secret; every issued token also gets a server-side mirror row for
/// revocation, so cryptographic validity alone is never sufficient.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expiry_minutes: i64,
}

/// Claims carried by access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject (username)
    pub sub: String,
    pub user_id: i64,
    pub name: String,
    pub email: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

impl JwtService {
    pub fn new(config: &JwtConfig) -> Result<Self, anyhow::Error> {
        if config.secret.len() < 16 {
            return Err(anyhow::anyhow!(
                "JWT secret must be at least 16 bytes, got {}",
                config.secret.len()
            ));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            access_token_expiry_minutes: config.access_token_expiry_minutes,
        })
    }

    /// Generate an access token for a user; returns the token and its expiry.
    pub fn generate_access_token(
        &self,
        user: &User,
    ) -> Result<(String, DateTime<Utc>), anyhow::Error> {
        let now = Utc::now();
        let expire = now + Duration::minutes(self.access_token_expiry_minutes);

        let claims = AccessTokenClaims {
            sub: user.username.clone(),
            user_id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            exp: expire.timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode access token: {}", e))?;

        Ok((token, expire))
    }

    /// Validate signature and expiry, returning the claims.
    pub fn validate_access_token(&self, token: &str) -> Result<AccessTokenClaims, anyhow::Error> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<AccessTokenClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| anyhow::anyhow!("Invalid access token: {}", e))?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service(minutes: i64) -> JwtService {
        JwtService::new(&JwtConfig {
            secret: "unit-test-secret-0123456789".to_string(),
            access_token_expiry_minutes: minutes,
        })
        .expect("Failed to create JWT service")
    }

    fn test_user() -> User {
        User {
            id: 7,
            name: "Ana".to_string(),
            username: "ana".to_string(),
            password: "hash".to_string(),
            email: "ana@example.com".to_string(),
            status: true,
            deleted: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_connection: None,
        }
    }

    #[test]
    fn token_round_trip() {
        let jwt = test_service(15);
        let (token, expire) = jwt.generate_access_token(&test_user()).unwrap();

        let claims = jwt.validate_access_token(&token).unwrap();
        assert_eq!(claims.sub, "ana");
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.exp, expire.timestamp());
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let jwt = test_service(15);
        let other = JwtService::new(&JwtConfig {
            secret: "a-completely-different-secret".to_string(),
            access_token_expiry_minutes: 15,
        })
        .unwrap();

        let (token, _) = other.generate_access_token(&test_user()).unwrap();
        assert!(jwt.validate_access_token(&token).is_err());
    }

    #[test]
    fn rejects_expired_token() {
        // Issued already expired; validation leeway is 60s by default.
        let jwt = test_service(-5);
        let (token, _) = jwt.generate_access_token(&test_user()).unwrap();
        assert!(jwt.validate_access_token(&token).is_err());
    }

    #[test]
    fn rejects_short_secret() {
        let result = JwtService::new(&JwtConfig {
            secret: "short".to_string(),
            access_token_expiry_minutes: 15,
        });
        assert!(result.is_err());
    }
}
