//! Auth module: identity claims, session tokens and the booking ownership rule.
//!
//! Framework independent; the HTTP layer only moves cookies in and out.

pub mod domain;
pub mod errors;
pub mod policy;
pub mod service;

pub use domain::{AuthenticatedUser, IdentityClaim, IssuedToken, SessionClaims};
pub use errors::AuthError;
pub use policy::{BookingScope, OwnershipPolicy};
pub use service::{TokenConfig, TokenService};
