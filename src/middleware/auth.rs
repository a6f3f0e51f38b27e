use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use portico_auth::{CredentialError, CredentialVerifier};
use portico_core::{AppError, RequestContext, UserPrincipal};
use tracing::{debug, error, warn};

use crate::state::AppState;

pub const MISSING_HEADER_MESSAGE: &str = "Authorization header is required";
pub const MISSING_TOKEN_MESSAGE: &str = "Token is required";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Reject requests without a valid credential.
    Required,
    /// Let requests without a credential through anonymously. A credential
    /// that is present must still be valid.
    Optional,
}

fn absent(mode: AuthMode, message: &str) -> Result<Option<UserPrincipal>, AppError> {
    match mode {
        AuthMode::Required => Err(AppError::authentication(message)),
        AuthMode::Optional => Ok(None),
    }
}

/// Extracts the bearer credential and verifies it.
///
/// The `Bearer ` prefix is optional; a bare token is accepted as well.
/// A lone `Bearer` without the space is taken as the token itself.
pub fn resolve_principal(
    mode: AuthMode,
    verifier: &dyn CredentialVerifier,
    headers: &HeaderMap,
) -> Result<Option<UserPrincipal>, AppError> {
    let raw = match headers.get(header::AUTHORIZATION) {
        Some(value) if !value.is_empty() => value,
        _ => return absent(mode, MISSING_HEADER_MESSAGE),
    };

    let raw = raw
        .to_str()
        .map_err(|_| CredentialError::Invalid.into_app_error())?;

    let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
    if token.is_empty() {
        return absent(mode, MISSING_TOKEN_MESSAGE);
    }

    match verifier.verify(token) {
        Ok(principal) => {
            debug!(user_id = %principal.user_id, "Credential verified");
            Ok(Some(principal))
        }
        Err(err @ CredentialError::Unexpected(_)) => {
            error!(error = %err, "Credential verification error");
            Err(err.into_app_error())
        }
        Err(err) => {
            warn!(reason = %err, "JWT verification failed");
            Err(err.into_app_error())
        }
    }
}

async fn authenticate(
    mode: AuthMode,
    state: &AppState,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(principal) = resolve_principal(mode, state.verifier.as_ref(), request.headers())? {
        if let Some(context) = request.extensions_mut().get_mut::<RequestContext>() {
            context.set_principal(principal.clone());
        }
        request.extensions_mut().insert(principal);
    }

    Ok(next.run(request).await)
}

/// Route layer that rejects requests without a valid credential.
pub async fn require_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    authenticate(AuthMode::Required, &state, request, next).await
}

/// Route layer that attaches a principal when a valid credential is sent.
pub async fn optional_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    authenticate(AuthMode::Optional, &state, request, next).await
}

/// Extractor for the principal attached by [`require_auth`] or [`optional_auth`].
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserPrincipal);

impl AuthUser {
    pub fn user_id(&self) -> &str {
        &self.0.user_id
    }

    pub fn email(&self) -> Option<&str> {
        self.0.email.as_deref()
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<UserPrincipal>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| AppError::authentication("Authentication required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};
    use serde_json::Map;

    /// Accepts the token "good", reports "old" as expired and "broken" as a
    /// verifier failure.
    struct StubVerifier;

    impl CredentialVerifier for StubVerifier {
        fn verify(&self, token: &str) -> Result<UserPrincipal, CredentialError> {
            match token {
                "good" => Ok(UserPrincipal {
                    user_id: "user-1".to_string(),
                    email: Some("user@example.com".to_string()),
                    claims: Map::new(),
                }),
                "old" => Err(CredentialError::Expired),
                "anonymous" => Err(CredentialError::MissingSubject),
                "broken" => Err(CredentialError::Unexpected("key rejected".to_string())),
                _ => Err(CredentialError::Invalid),
            }
        }
    }

    fn headers(authorization: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static(authorization));
        headers
    }

    fn resolve(mode: AuthMode, headers: &HeaderMap) -> Result<Option<UserPrincipal>, AppError> {
        resolve_principal(mode, &StubVerifier, headers)
    }

    #[test]
    fn test_required_mode_rejects_missing_header() {
        let err = resolve(AuthMode::Required, &HeaderMap::new()).unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.message(), MISSING_HEADER_MESSAGE);

        let err = resolve(AuthMode::Required, &headers("")).unwrap_err();
        assert_eq!(err.message(), MISSING_HEADER_MESSAGE);
    }

    #[test]
    fn test_required_mode_rejects_empty_token() {
        let err = resolve(AuthMode::Required, &headers("Bearer ")).unwrap_err();
        assert_eq!(err.message(), MISSING_TOKEN_MESSAGE);
    }

    #[test]
    fn test_lone_bearer_is_treated_as_token() {
        let err = resolve(AuthMode::Required, &headers("Bearer")).unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.message(), "Invalid or expired token");
    }

    #[test]
    fn test_optional_mode_allows_missing_credential() {
        assert!(resolve(AuthMode::Optional, &HeaderMap::new()).unwrap().is_none());
        assert!(resolve(AuthMode::Optional, &headers("Bearer ")).unwrap().is_none());
    }

    #[test]
    fn test_optional_mode_still_rejects_bad_credential() {
        let err = resolve(AuthMode::Optional, &headers("Bearer forged")).unwrap_err();
        assert_eq!(err.message(), "Invalid or expired token");
    }

    #[test]
    fn test_bearer_prefix_is_optional() {
        let with_prefix = resolve(AuthMode::Required, &headers("Bearer good")).unwrap();
        let bare = resolve(AuthMode::Required, &headers("good")).unwrap();

        assert_eq!(with_prefix.unwrap().user_id, "user-1");
        assert_eq!(bare.unwrap().user_id, "user-1");
    }

    #[test]
    fn test_rejection_messages() {
        let expired = resolve(AuthMode::Required, &headers("Bearer old")).unwrap_err();
        assert_eq!(expired.message(), "Token has expired");

        let no_subject = resolve(AuthMode::Required, &headers("Bearer anonymous")).unwrap_err();
        assert_eq!(no_subject.message(), "Invalid token: userId is missing");
    }

    #[test]
    fn test_verifier_failure_is_internal() {
        let err = resolve(AuthMode::Required, &headers("Bearer broken")).unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.is_unexpected());
    }

    #[tokio::test]
    async fn test_auth_user_extractor() {
        let mut request = axum::http::Request::new(());
        let (mut parts, _) = axum::http::Request::new(()).into_parts();
        let err = AuthUser::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);

        request.extensions_mut().insert(UserPrincipal {
            user_id: "user-9".to_string(),
            email: None,
            claims: Map::new(),
        });
        let (mut parts, _) = request.into_parts();
        let user = AuthUser::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(user.user_id(), "user-9");
        assert!(user.email().is_none());
    }
}
