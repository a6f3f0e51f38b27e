//! # Portico Auth
//!
//! Signed-credential handling for the gateway:
//!
//! - [`claims`]: the token payload
//! - [`jwt`]: HS256 token issuing and the [`JwtVerifier`]
//! - [`verifier`]: the [`CredentialVerifier`] seam used by the authentication stage
//!
//! # Example
//!
//! ```ignore
//! use portico_auth::{CredentialVerifier, JwtVerifier, create_access_token};
//!
//! let token = create_access_token("user-1", Some("a@example.com"), Default::default(), &jwt_config)?;
//! let principal = JwtVerifier::new(&jwt_config).verify(&token)?;
//! assert_eq!(principal.user_id, "user-1");
//! ```

pub mod claims;
pub mod jwt;
pub mod verifier;

pub use claims::Claims;
pub use jwt::{JwtVerifier, TokenError, create_access_token};
pub use verifier::{CredentialError, CredentialVerifier};
