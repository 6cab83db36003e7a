use chrono::{DateTime, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

use crate::config::TokenConfig;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,
    #[error("Token signature is invalid")]
    InvalidSignature,
    #[error("Token encoding failed: {0}")]
    Encoding(String),
}

/// Claims carried by a session token: identity and expiry, nothing else.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies HS256 session tokens.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: chrono::Duration,
}

impl TokenService {
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(&config.secret),
            decoding_key: DecodingKey::from_secret(&config.secret),
            ttl: config.ttl,
        }
    }

    pub fn issue(&self, user_id: i64) -> Result<IssuedToken, TokenError> {
        // `exp` has whole-second precision; report the same instant we encode.
        let exp = (Utc::now() + self.ttl).timestamp();
        let expires_at = DateTime::from_timestamp(exp, 0)
            .ok_or_else(|| TokenError::Encoding(format!("expiry {} out of range", exp)))?;
        let claims = Claims {
            sub: user_id.to_string(),
            exp,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Returns the user id bound to a token that is correctly signed and not yet expired.
    pub fn verify(&self, token: &str) -> Result<i64, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        // jsonwebtoken still accepts a token during its `exp` second
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::InvalidSignature,
            }
        })?;

        if !is_live(data.claims.exp, Utc::now()) {
            return Err(TokenError::Expired);
        }

        data.claims
            .sub
            .parse()
            .map_err(|_| TokenError::InvalidSignature)
    }
}

/// A token expiring at `exp` is valid only while `now < exp`.
fn is_live(exp: i64, now: DateTime<Utc>) -> bool {
    now.timestamp() < exp
}
