//! Stateless helpers shared by record store callers.
//!
//! Nothing here depends on `RecordStore`; the timing helpers need a running
//! Tokio runtime.

pub mod date;
pub mod fixtures;
pub mod random;
pub mod timing;

pub use date::{format_date, format_date_in};
pub use fixtures::{generate_batch, generate_user, save_to_json};
pub use random::random_int;
pub use timing::{debounce, delay, Debounced};
