use portico_core::{AppError, UserPrincipal};

/// Why a presented credential was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    #[error("Token has expired")]
    Expired,

    #[error("Invalid or expired token")]
    Invalid,

    #[error("Invalid token: userId is missing")]
    MissingSubject,

    /// Verification itself broke, e.g. an unusable key.
    #[error("credential verification failed: {0}")]
    Unexpected(String),
}

impl CredentialError {
    /// Rejections become `Authentication` errors carrying this error's
    /// message; a broken verifier is an unexpected internal failure.
    ///
    /// A plain `?` would classify every variant as unexpected, so callers
    /// convert through here.
    #[must_use]
    pub fn into_app_error(self) -> AppError {
        match self {
            CredentialError::Unexpected(_) => AppError::unexpected(self),
            other => AppError::authentication(other.to_string()),
        }
    }
}

/// Turns a bearer credential into a principal.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<UserPrincipal, CredentialError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use portico_core::ErrorKind;

    #[test]
    fn test_credential_errors_map_to_authentication() {
        for (err, message) in [
            (CredentialError::Expired, "Token has expired"),
            (CredentialError::Invalid, "Invalid or expired token"),
            (CredentialError::MissingSubject, "Invalid token: userId is missing"),
        ] {
            let app = err.into_app_error();
            assert_eq!(app.kind(), ErrorKind::Authentication);
            assert_eq!(app.message(), message);
        }
    }

    #[test]
    fn test_unexpected_maps_to_internal() {
        let app = CredentialError::Unexpected("bad key".to_string()).into_app_error();
        assert_eq!(app.kind(), ErrorKind::Internal);
        assert!(app.is_unexpected());
    }
}
