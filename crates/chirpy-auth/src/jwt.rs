//! JWT access token management

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::AccessTokenError;

/// Issuer written into every access token.
///
/// Verification does not compare it: any token signed with the configured
/// key is accepted whatever its issuer value.
pub const ISSUER: &str = "chirpy";

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Issuer
    pub iss: String,
    /// Subject (user ID)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// JWT manager for access token generation and validation
#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl JwtManager {
    /// Create a new JWT manager signing with `secret` (HS256)
    pub fn new(secret: &[u8], lifetime: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // `exp` is compared below with `<=`; the library only rejects `<`
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            lifetime,
        }
    }

    /// Issue an access token for a user with the configured lifetime
    pub fn issue(&self, user_id: Uuid) -> Result<String, AccessTokenError> {
        self.issue_with_lifetime(user_id, self.lifetime)
    }

    /// Issue an access token with an explicit lifetime.
    ///
    /// Zero and negative lifetimes are accepted and produce a token that is
    /// already expired. A lifetime past the representable date range is a
    /// signing error.
    pub fn issue_with_lifetime(
        &self,
        user_id: Uuid,
        lifetime: Duration,
    ) -> Result<String, AccessTokenError> {
        let now = Utc::now();
        let exp = now
            .checked_add_signed(lifetime)
            .ok_or_else(|| AccessTokenError::Signing("token lifetime out of range".to_string()))?;

        let claims = Claims {
            iss: ISSUER.to_string(),
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        debug!("Issuing access token for user: {}", user_id);

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AccessTokenError::Signing(e.to_string()))
    }

    /// Validate an access token and return the user it was issued to
    pub fn verify(&self, token: &str) -> Result<Uuid, AccessTokenError> {
        let claims = self.decode_claims(token)?;
        Uuid::parse_str(&claims.sub).map_err(|_| AccessTokenError::Malformed)
    }

    /// Validate an access token and return its claims
    pub fn decode_claims(&self, token: &str) -> Result<Claims, AccessTokenError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| classify(e, token))?;

        if token_data.claims.exp <= Utc::now().timestamp() {
            return Err(AccessTokenError::Expired);
        }

        Ok(token_data.claims)
    }
}

fn classify(err: jsonwebtoken::errors::Error, token: &str) -> AccessTokenError {
    match err.kind() {
        ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidAlgorithmName
        | ErrorKind::InvalidKeyFormat => AccessTokenError::BadSignature,
        ErrorKind::ExpiredSignature => AccessTokenError::Expired,
        // Headers naming an algorithm the library cannot represent (`none`)
        // fail to deserialize before the algorithm is compared
        _ => match header_algorithm(token) {
            Some(alg) if alg != "HS256" => AccessTokenError::BadSignature,
            _ => AccessTokenError::Malformed,
        },
    }
}

/// The raw `alg` field of a token header, if the header is a JSON object
fn header_algorithm(token: &str) -> Option<String> {
    let header = token.split('.').next()?;
    let bytes = URL_SAFE_NO_PAD.decode(header).ok()?;
    let value: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    value.get("alg")?.as_str().map(str::to_string)
}
