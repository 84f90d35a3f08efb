use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::{auth::AuthUser, models::Role};

/// Default validity window of an issued credential.
pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 7;

/// Claims
///
/// The fixed payload of every credential. Decoding rejects tokens missing
/// any of these fields or carrying an unknown role, so a verified token
/// always yields a complete record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the user id.
    pub sub: Uuid,
    pub role: Role,
    /// Issued At (iat), seconds since the epoch.
    pub iat: i64,
    /// Expiration Time (exp), seconds since the epoch.
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token signing secret is not configured")]
    MissingSecret,
    #[error("failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// TokenCodec
///
/// Issues and verifies HS256-signed, time-limited credentials with a
/// process-wide secret. Stateless: nothing about issued tokens is stored,
/// so a token stays valid until it expires.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

/// TokenState
///
/// Shared, read-only handle to the codec held in the application state.
pub type TokenState = Arc<TokenCodec>;

impl TokenCodec {
    /// Builds a codec from the signing secret. A blank secret is refused;
    /// callers treat that as a fatal startup condition.
    pub fn new(secret: &str, ttl: Duration) -> Result<Self, TokenError> {
        if secret.trim().is_empty() {
            return Err(TokenError::MissingSecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is exact: no clock-skew allowance.
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        })
    }

    /// The validity window applied by [`TokenCodec::sign`].
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues a credential for the subject with the configured validity window.
    pub fn sign(&self, subject_id: Uuid, role: Role) -> Result<String, TokenError> {
        self.issue(subject_id, role, self.ttl)
    }

    /// Issues a credential expiring `ttl` after now. The expiry is encoded as
    /// an absolute timestamp.
    pub fn issue(&self, subject_id: Uuid, role: Role, ttl: Duration) -> Result<String, TokenError> {
        let issued_at = Utc::now().timestamp();
        let claims = Claims {
            sub: subject_id,
            role,
            iat: issued_at,
            exp: issued_at + ttl.num_seconds(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Decodes and checks a credential, returning the full claim set.
    ///
    /// Malformed encoding, a signature mismatch and expiry all collapse to
    /// `None`; callers cannot and should not tell them apart.
    pub fn decode_claims(&self, token: &str) -> Option<Claims> {
        match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                tracing::debug!(reason = ?e.kind(), "credential rejected");
                None
            }
        }
    }

    /// Verifies a credential and yields the subject it was issued to.
    pub fn verify(&self, token: &str) -> Option<AuthUser> {
        self.decode_claims(token).map(|claims| AuthUser {
            id: claims.sub,
            role: claims.role,
        })
    }
}
