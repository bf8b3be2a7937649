//! Error types shared across the crate.
//!
//! Session-level failures are split by concern so handlers can map each family
//! onto the right user-visible outcome; everything else funnels into
//! [`AlmaError`].

mod types;

pub use types::{AlmaError, Result, ValidationError};
