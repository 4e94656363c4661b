//! Session-token issuance and verification.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use oxgate_core::{Email, Role, UserId};

/// Claims carried by a session token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject: the authenticated user's id.
    pub sub: UserId,
    /// The user's email at issuance time.
    pub email: Email,
    /// The user's global role at issuance time.
    pub role: Role,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Issuer.
    pub iss: String,
}

/// Mints and verifies signed session tokens.
///
/// Tokens are self-contained HS256 JWTs with a fixed 24-hour validity
/// window. Verification checks signature, expiry, and issuer.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
}

impl TokenService {
    /// Validity window of every issued token.
    pub const VALIDITY: Duration = Duration::hours(24);

    /// Create a token service from the signing secret and issuer.
    #[must_use]
    pub fn new(secret: &SecretString, issuer: String) -> Self {
        let secret_bytes = secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret_bytes),
            decoding_key: DecodingKey::from_secret(secret_bytes),
            issuer,
        }
    }

    /// Issue a session token for a verified identity.
    ///
    /// # Errors
    ///
    /// Fails only if signing itself fails, which indicates a broken
    /// signing-key configuration rather than a per-request condition.
    pub fn issue(
        &self,
        user_id: UserId,
        email: Email,
        role: Role,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            email,
            role,
            exp: (now + Self::VALIDITY).timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
    }

    /// Verify a session token and return its claims.
    ///
    /// # Errors
    ///
    /// Fails if the token is malformed, carries a bad signature, has
    /// expired, or names a different issuer.
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);

        decode::<Claims>(token, &self.decoding_key, &validation).map(|data| data.claims)
    }
}
