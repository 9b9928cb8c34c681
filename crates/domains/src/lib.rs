//! # domains
//!
//! Entities, policy settings, error kinds and the port traits of the
//! question service. Nothing in this crate performs I/O.

pub mod errors;
pub mod models;
pub mod policy;
pub mod ports;

// Re-exporting for easier access in other crates
pub use errors::*;
pub use models::*;
pub use policy::*;
pub use ports::*;
