//! Record store use-case layer.
//!
//! # Responsibility
//! - Own the ordered record sequence and enforce its invariants.
//! - Bridge the sequence to a `KeyValueStore` for best-effort persistence.

pub mod record_store;
