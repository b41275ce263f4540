use crate::core::errors::AkahidegnError;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub const ANONYMOUS_ROLE: &str = "ANONYMOUS";

const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(24 * 3600);

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,  // User ID
    pub role: String, // Always ANONYMOUS for now
    pub exp: usize,   // Expiration timestamp
}

pub struct JwtService {
    secret: String,
    ttl: Duration,
}

impl JwtService {
    pub fn new(secret: String) -> Self {
        JwtService {
            secret,
            ttl: DEFAULT_TOKEN_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn generate_token(&self, user_id: &str, role: &str) -> Result<String, AkahidegnError> {
        let expiration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| (d + self.ttl).as_secs() as usize)
            .map_err(|e| AkahidegnError::InternalServerError(format!("Time error: {}", e)))?;

        let claims = Claims {
            sub: user_id.to_string(),
            role: role.to_string(),
            exp: expiration,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AkahidegnError::InternalServerError(format!("JWT encoding error: {}", e)))
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, AkahidegnError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| AkahidegnError::Unauthenticated(format!("Invalid token: {}", e)))?;

        if token_data.claims.sub.is_empty() {
            return Err(AkahidegnError::Unauthenticated("Token has no subject".to_string()));
        }
        Ok(token_data.claims)
    }
}
