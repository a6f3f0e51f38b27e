//! HS256 token issuing and verification.
//!
//! Tokens carry `userId`, optional `email`, `iat` and `exp`, plus any extra
//! claims the issuer adds. Verification checks the signature and, when
//! present, the expiry with no leeway.

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde_json::{Map, Value};

use portico_config::JwtConfig;
use portico_core::UserPrincipal;

use crate::claims::Claims;
use crate::verifier::{CredentialError, CredentialVerifier};

#[derive(Debug, thiserror::Error)]
#[error("failed to sign token: {0}")]
pub struct TokenError(#[from] jsonwebtoken::errors::Error);

/// Signs arbitrary claims with the shared secret.
pub fn encode_claims(claims: &Claims, secret: &str) -> Result<String, TokenError> {
    Ok(encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

/// Issues an access token valid for `jwt_config.expires_in` seconds.
///
/// # Example
///
/// ```ignore
/// let token = create_access_token("7f1c…", Some("a@example.com"), Map::new(), &jwt_config)?;
/// ```
pub fn create_access_token(
    user_id: &str,
    email: Option<&str>,
    extra: Map<String, Value>,
    jwt_config: &JwtConfig,
) -> Result<String, TokenError> {
    let now = u64::try_from(Utc::now().timestamp()).unwrap_or_default();

    let claims = Claims {
        user_id: Some(user_id.to_string()),
        email: email.map(str::to_string),
        iat: Some(now),
        exp: Some(now.saturating_add(jwt_config.expires_in)),
        extra,
    };

    encode_claims(&claims, &jwt_config.secret)
}

/// [`CredentialVerifier`] for HS256 tokens signed with a shared secret.
#[derive(Clone)]
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    #[must_use]
    pub fn new(jwt_config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        // `exp` is checked when present but not demanded.
        validation.required_spec_claims.clear();
        validation.validate_aud = false;

        Self {
            key: DecodingKey::from_secret(jwt_config.secret.as_bytes()),
            validation,
        }
    }
}

impl CredentialVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Result<UserPrincipal, CredentialError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|err| {
            match err.kind() {
                JwtErrorKind::ExpiredSignature => CredentialError::Expired,
                JwtErrorKind::InvalidEcdsaKey
                | JwtErrorKind::InvalidRsaKey(_)
                | JwtErrorKind::RsaFailedSigning
                | JwtErrorKind::InvalidKeyFormat
                | JwtErrorKind::Crypto(_) => CredentialError::Unexpected(err.to_string()),
                _ => CredentialError::Invalid,
            }
        })?;

        data.claims
            .into_principal()
            .ok_or(CredentialError::MissingSubject)
    }
}
