//! A walk-through of convention-driven mapping against an ephemeral database.
//!
//! - [`model`] - The person, contacts and phone number entities
//! - [`mapping`] - Their class maps, built on the read-only members convention
//! - [`scenario`] - Insert, fetch and positional update against a store
//! - [`lifecycle`] - Running work against a server that is always disposed
//! - [`telemetry`] - Log output for the binary

pub mod lifecycle;
pub mod mapping;
pub mod model;
pub mod scenario;
pub mod telemetry;

pub use mapping::class_maps;
pub use model::{Contacts, Entity, Person, PhoneNumber};
pub use scenario::{ScenarioReport, run};
