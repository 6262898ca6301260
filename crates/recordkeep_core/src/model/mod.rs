//! Record domain model.
//!
//! # Responsibility
//! - Define the open-schema record shape and its injected metadata.
//! - Provide item validation and payload coercion used on insertion.
//!
//! # Invariants
//! - Record metadata (`id`, `timestamp`) is set once and never changes.
//! - Payload fields never shadow metadata keys.

pub mod record;
