use serde::{Deserialize, Serialize};

use super::errors::AuthError;

/// Who the bearer claims to be; submitted at login and embedded in the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaim {
    pub email: String,
}

impl IdentityClaim {
    pub fn new(email: impl Into<String>) -> Result<Self, AuthError> {
        let claim = Self { email: email.into().trim().to_string() };
        claim.validate()?;
        Ok(claim)
    }

    /// Parse a login body, ignoring fields other than `email`.
    pub fn from_json(body: serde_json::Value) -> Result<Self, AuthError> {
        let raw: IdentityClaim = serde_json::from_value(body)
            .map_err(|e| AuthError::Validation(format!("identity claim: {e}")))?;
        Self::new(raw.email)
    }

    pub fn validate(&self) -> Result<(), AuthError> {
        let email = self.email.as_str();
        if email.is_empty() {
            return Err(AuthError::Validation("email required".into()));
        }
        if email.chars().any(char::is_whitespace) {
            return Err(AuthError::Validation("email must not contain whitespace".into()));
        }
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => Ok(()),
            _ => Err(AuthError::Validation("invalid email".into())),
        }
    }
}

/// JWT payload: the identity claim plus issue/expiry timestamps (unix seconds).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

impl SessionClaims {
    pub fn identity(&self) -> IdentityClaim {
        IdentityClaim { email: self.email.clone() }
    }
}

/// Signed token together with the claims it carries.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: SessionClaims,
}

/// Identity attached to a request after the session cookie verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub email: String,
    pub expires_at: i64,
}

impl From<SessionClaims> for AuthenticatedUser {
    fn from(c: SessionClaims) -> Self {
        Self { email: c.email, expires_at: c.exp }
    }
}
