use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header as JwtHeader, Validation};
use tracing::{debug, info, instrument};

use super::domain::{IdentityClaim, IssuedToken, SessionClaims};
use super::errors::AuthError;

/// Token service configuration
#[derive(Clone)]
pub struct TokenConfig {
    pub jwt_secret: String,
    pub ttl_secs: u64,
}

impl TokenConfig {
    pub fn new(jwt_secret: impl Into<String>, ttl_secs: u64) -> Self {
        Self { jwt_secret: jwt_secret.into(), ttl_secs }
    }
}

/// Issues and verifies HS256 session tokens. Holds only the read-only secret,
/// so one instance is shared by every request.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(cfg: TokenConfig) -> Result<Self, AuthError> {
        if cfg.jwt_secret.is_empty() {
            return Err(AuthError::TokenError("signing secret is empty".into()));
        }
        if cfg.ttl_secs == 0 {
            return Err(AuthError::TokenError("token ttl must be positive".into()));
        }
        let ttl = i64::try_from(cfg.ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| AuthError::TokenError(format!("token ttl of {}s is out of range", cfg.ttl_secs)))?;
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        Ok(Self {
            encoding: EncodingKey::from_secret(cfg.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.jwt_secret.as_bytes()),
            validation,
            ttl,
        })
    }

    pub fn ttl(&self) -> Duration { self.ttl }

    /// Issue a token for the claim, valid for the configured TTL from now.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{IdentityClaim, TokenConfig, TokenService};
    /// let svc = TokenService::new(TokenConfig::new("secret", 3600)).unwrap();
    /// let issued = svc.issue(&IdentityClaim::new("a@x.com").unwrap()).unwrap();
    /// let claims = svc.verify(&issued.token).unwrap();
    /// assert_eq!(claims.email, "a@x.com");
    /// assert_eq!(claims.exp - claims.iat, 3600);
    /// ```
    pub fn issue(&self, claim: &IdentityClaim) -> Result<IssuedToken, AuthError> {
        self.issue_at(claim, Utc::now())
    }

    #[instrument(skip(self, claim), fields(email = %claim.email))]
    pub fn issue_at(&self, claim: &IdentityClaim, now: DateTime<Utc>) -> Result<IssuedToken, AuthError> {
        claim.validate()?;
        let exp = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AuthError::TokenError("token expiry is out of range".into()))?;
        let claims = SessionClaims {
            email: claim.email.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };
        let token = encode(&JwtHeader::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::TokenError(e.to_string()))?;
        info!(exp = claims.exp, "session_token_issued");
        Ok(IssuedToken { token, claims })
    }

    /// Check signature and expiry. Every failure collapses to `InvalidToken`;
    /// the reason is only logged.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let data = decode::<SessionClaims>(token, &self.decoding, &self.validation).map_err(|e| {
            debug!(err = %e, "token verification failed");
            AuthError::InvalidToken
        })?;
        // valid strictly before exp
        if data.claims.exp <= Utc::now().timestamp() {
            debug!(exp = data.claims.exp, "token expired");
            return Err(AuthError::InvalidToken);
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn svc() -> TokenService {
        TokenService::new(TokenConfig::new("test-secret", 3600)).unwrap()
    }

    fn claim(email: &str) -> IdentityClaim {
        IdentityClaim::new(email).unwrap()
    }

    #[test]
    fn issue_then_verify_returns_same_identity() {
        let s = svc();
        for email in ["a@x.com", "someone.else@example.org"] {
            let issued = s.issue(&claim(email)).unwrap();
            let back = s.verify(&issued.token).unwrap();
            assert_eq!(back.identity(), claim(email));
            assert_eq!(back, issued.claims);
        }
    }

    #[test]
    fn token_does_not_contain_secret() {
        let issued = svc().issue(&claim("a@x.com")).unwrap();
        assert!(!issued.token.contains("test-secret"));
        assert_eq!(issued.token.split('.').count(), 3);
    }

    #[test]
    fn valid_until_ttl_elapses() {
        let s = svc();
        let ttl = s.ttl();
        let now = Utc::now();

        let fresh = s.issue_at(&claim("a@x.com"), now - ttl + Duration::seconds(30)).unwrap();
        assert!(s.verify(&fresh.token).is_ok());

        let at_boundary = s.issue_at(&claim("a@x.com"), now - ttl).unwrap();
        assert_eq!(s.verify(&at_boundary.token), Err(AuthError::InvalidToken));

        let stale = s.issue_at(&claim("a@x.com"), now - ttl - Duration::seconds(1)).unwrap();
        assert_eq!(s.verify(&stale.token), Err(AuthError::InvalidToken));
    }

    #[test]
    fn tampered_token_is_rejected() {
        let s = svc();
        let issued = s.issue(&claim("a@x.com")).unwrap();
        let mut parts: Vec<String> = issued.token.split('.').map(str::to_string).collect();
        // swap the payload for one claiming another identity
        let other = s.issue(&claim("b@x.com")).unwrap();
        parts[1] = other.token.split('.').nth(1).unwrap().to_string();
        let forged = parts.join(".");
        assert_eq!(s.verify(&forged), Err(AuthError::InvalidToken));
    }

    #[test]
    fn foreign_secret_is_rejected() {
        let other = TokenService::new(TokenConfig::new("another-secret", 3600)).unwrap();
        let issued = other.issue(&claim("a@x.com")).unwrap();
        assert_eq!(svc().verify(&issued.token), Err(AuthError::InvalidToken));
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(svc().verify("not-a-token"), Err(AuthError::InvalidToken));
        assert_eq!(svc().verify(""), Err(AuthError::InvalidToken));
    }

    #[test]
    fn empty_secret_is_refused() {
        assert!(TokenService::new(TokenConfig::new("", 3600)).is_err());
        assert!(TokenService::new(TokenConfig::new("s", 0)).is_err());
    }

    #[test]
    fn oversized_ttl_is_refused() {
        let err = TokenService::new(TokenConfig::new("s", 100_000_000_000_000_000)).err();
        assert!(matches!(err, Some(AuthError::TokenError(_))));
        assert!(TokenService::new(TokenConfig::new("s", u64::MAX)).is_err());
    }

    #[test]
    fn expiry_past_the_calendar_is_an_error() {
        let huge = TokenService::new(TokenConfig::new("s", 1_000_000_000_000_000)).unwrap();
        let res = huge.issue(&claim("a@x.com"));
        assert!(matches!(res, Err(AuthError::TokenError(_))));

        let res = svc().issue_at(&claim("a@x.com"), DateTime::<Utc>::MAX_UTC);
        assert!(matches!(res, Err(AuthError::TokenError(_))));
    }
}
