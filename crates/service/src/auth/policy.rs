use tracing::warn;

use super::domain::AuthenticatedUser;
use super::errors::AuthError;
use crate::store::Filter;

/// Which bookings a listing may return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingScope {
    /// Only bookings whose `email` equals the owner.
    Owner(String),
    /// No owner filter was requested.
    Unscoped,
}

impl BookingScope {
    pub fn filter(&self) -> Filter {
        match self {
            BookingScope::Owner(email) => Filter::all().with_eq("email", email.clone()),
            BookingScope::Unscoped => Filter::all(),
        }
    }
}

/// Restricts booking listings to the authenticated owner.
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnershipPolicy {
    strict: bool,
}

impl OwnershipPolicy {
    /// `strict` also rejects listings that name no owner at all.
    pub fn new(strict: bool) -> Self { Self { strict } }

    pub fn scope_bookings(&self, requested: Option<&str>, user: &AuthenticatedUser) -> Result<BookingScope, AuthError> {
        match requested {
            Some(email) if email == user.email => Ok(BookingScope::Owner(email.to_string())),
            Some(email) => {
                warn!(requested = %email, authenticated = %user.email, "booking listing for another identity");
                Err(AuthError::Forbidden)
            }
            None if self.strict => {
                warn!(authenticated = %user.email, "unscoped booking listing rejected");
                Err(AuthError::Forbidden)
            }
            None => Ok(BookingScope::Unscoped),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: &str) -> AuthenticatedUser {
        AuthenticatedUser { email: email.into(), expires_at: i64::MAX }
    }

    #[test]
    fn matching_identity_is_scoped_to_owner() {
        let scope = OwnershipPolicy::default().scope_bookings(Some("a@x.com"), &user("a@x.com")).unwrap();
        assert_eq!(scope, BookingScope::Owner("a@x.com".into()));
        assert_eq!(scope.filter(), Filter::all().with_eq("email", "a@x.com"));
    }

    #[test]
    fn mismatch_is_forbidden() {
        let p = OwnershipPolicy::default();
        assert_eq!(p.scope_bookings(Some("b@x.com"), &user("a@x.com")), Err(AuthError::Forbidden));
        // comparison is exact
        assert_eq!(p.scope_bookings(Some("A@x.com"), &user("a@x.com")), Err(AuthError::Forbidden));
        assert_eq!(p.scope_bookings(Some(""), &user("a@x.com")), Err(AuthError::Forbidden));
    }

    #[test]
    fn missing_email_depends_on_strictness() {
        assert_eq!(OwnershipPolicy::new(false).scope_bookings(None, &user("a@x.com")), Ok(BookingScope::Unscoped));
        assert_eq!(OwnershipPolicy::new(true).scope_bookings(None, &user("a@x.com")), Err(AuthError::Forbidden));
    }
}
