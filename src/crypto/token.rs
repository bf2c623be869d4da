//! Compact HS256 session tokens.
//!
//! Format: `base64url(header).base64url(payload).base64url(hmac_sha256)`,
//! i.e. a JWT restricted to one algorithm and one payload shape.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::models::session::SessionClaims;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "HS256";
const TOKEN_TYPE: &str = "JWT";

/// Why a token could not be produced or accepted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The signing secret is missing or unusable.
    #[error("session secret misconfigured: {0}")]
    Config(String),

    /// The token is not `header.payload.signature` with the expected shapes.
    #[error("token is malformed")]
    Malformed,

    /// The signature does not match header and payload.
    #[error("token signature is invalid")]
    InvalidSignature,

    /// The token's expiry is not in the future.
    #[error("token has expired")]
    Expired,

    /// Claims could not be serialized.
    #[error("token encoding failed: {0}")]
    Encoding(String),
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct Header {
    alg: String,
    typ: String,
}

/// Signs and verifies session tokens with a process-wide secret.
pub struct TokenCodec {
    secret: Zeroizing<Vec<u8>>,
}

impl TokenCodec {
    /// Creates a codec for `secret`. Fails when the secret is empty.
    pub fn new(secret: &[u8]) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::Config("SESSION_SECRET must not be empty".to_string()));
        }

        Ok(Self {
            secret: Zeroizing::new(secret.to_vec()),
        })
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        HmacSha256::new_from_slice(&self.secret).map_err(|e| TokenError::Config(e.to_string()))
    }

    /// Encodes and signs `claims`.
    pub fn sign(&self, claims: &SessionClaims) -> Result<String, TokenError> {
        let header = Header {
            alg: ALGORITHM.to_string(),
            typ: TOKEN_TYPE.to_string(),
        };
        let header_json =
            sonic_rs::to_string(&header).map_err(|e| TokenError::Encoding(e.to_string()))?;
        let payload_json =
            sonic_rs::to_string(claims).map_err(|e| TokenError::Encoding(e.to_string()))?;

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header_json.as_bytes()),
            URL_SAFE_NO_PAD.encode(payload_json.as_bytes())
        );

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();

        Ok(format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(signature)))
    }

    /// Checks the signature and expiry of `token` as of `now`.
    ///
    /// The payload is only parsed once the signature has been accepted.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, TokenError> {
        let mut segments = token.split('.');
        let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(TokenError::Malformed);
        };

        let header_bytes = URL_SAFE_NO_PAD
            .decode(header_b64)
            .map_err(|_| TokenError::Malformed)?;
        let header: Header =
            sonic_rs::from_slice(&header_bytes).map_err(|_| TokenError::Malformed)?;
        if header.alg != ALGORITHM || header.typ != TOKEN_TYPE {
            return Err(TokenError::Malformed);
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| TokenError::Malformed)?;

        let signing_input_len = header_b64.len() + 1 + payload_b64.len();
        let mut mac = self.mac()?;
        mac.update(token[..signing_input_len].as_bytes());
        let expected = mac.finalize().into_bytes();

        if !bool::from(expected.as_slice().ct_eq(&signature)) {
            return Err(TokenError::InvalidSignature);
        }

        let payload_bytes = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| TokenError::Malformed)?;
        let claims: SessionClaims =
            sonic_rs::from_slice(&payload_bytes).map_err(|_| TokenError::Malformed)?;

        if claims.expires_at <= claims.issued_at {
            return Err(TokenError::Malformed);
        }

        if claims.is_expired(now) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}
