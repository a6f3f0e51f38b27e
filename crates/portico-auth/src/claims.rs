use portico_core::UserPrincipal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Token payload.
///
/// `userId` is the subject. Any claim besides the ones named here is kept in
/// `extra` and handed to the principal untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    /// Converts into a principal, or `None` when the subject is missing or empty.
    #[must_use]
    pub fn into_principal(self) -> Option<UserPrincipal> {
        let user_id = self.user_id.filter(|id| !id.is_empty())?;

        let mut claims = self.extra;
        if let Some(iat) = self.iat {
            claims.insert("iat".to_string(), Value::from(iat));
        }
        if let Some(exp) = self.exp {
            claims.insert("exp".to_string(), Value::from(exp));
        }

        Some(UserPrincipal {
            user_id,
            email: self.email,
            claims,
        })
    }
}
