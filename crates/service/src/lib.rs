//! Service layer for the car-workshop booking backend.
//! - `auth`: identity claims, session tokens and the booking ownership rule.
//! - `store`: document store abstraction with Postgres and in-memory backends.
//! - `services`: catalog and booking operations on top of the store.

pub mod errors;
pub mod auth;
pub mod store;
pub mod services;
#[cfg(test)]
pub mod test_support;
