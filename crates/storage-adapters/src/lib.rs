//! # storage-adapters
//!
//! Implementations of the `domains` ports. The in-memory adapters are always
//! compiled and back the test suites; PostgreSQL lives behind `db-postgres`.

pub mod memory;
pub mod notify;

#[cfg(feature = "db-postgres")]
pub mod postgres;

pub use memory::{InMemoryBlockRepository, InMemoryQuestionRepository, InMemoryUserRepository};
pub use notify::{ChannelNotifier, LogNotifier};
