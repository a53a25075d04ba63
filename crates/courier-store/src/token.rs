use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use courier_types::api::Claims;

use crate::AuthConfig;
use crate::error::{Result, StoreError};

/// Stateless session tokens: an HS256 JWT carrying the username as the
/// subject claim. No server-side session table and no revocation path.
#[derive(Clone)]
pub struct SessionIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Option<Duration>,
}

impl SessionIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.signing_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.signing_secret.as_bytes()),
            ttl: config.token_ttl,
        }
    }

    /// Mint a token asserting `username`. An expiry claim is attached only
    /// when a TTL is configured.
    pub fn issue(&self, username: &str) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: username.to_string(),
            iat: now.timestamp() as usize,
            exp: self.ttl.map(|ttl| (now + ttl).timestamp() as usize),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| StoreError::Storage(anyhow::anyhow!("token encoding failed: {e}")))
    }

    /// Recover the claims from a presented token. Every decode failure,
    /// bad signature and expired claim included, collapses to `Auth`.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        if self.ttl.is_none() {
            validation.required_spec_claims.remove("exp");
            validation.validate_exp = false;
        }

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|_| StoreError::Auth)
    }
}
