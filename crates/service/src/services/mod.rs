//! Application services for the two collections.
//!
//! Both take the store as `Arc<dyn DocumentStore>` so the HTTP layer can swap
//! the Postgres backend for the in-memory one.

pub mod booking_service;
pub mod catalog_service;

pub use booking_service::BookingService;
pub use catalog_service::CatalogService;
