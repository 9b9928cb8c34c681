//! # services
//!
//! Business rules of the question service: the lifecycle engine and the
//! block, rate-limit and authorization policies it composes. Services only
//! talk to storage and notification transports through the ports in
//! `domains`.

pub mod anonymity;
pub mod blocks;
pub mod questions;
pub mod rate_limit;
pub mod rules;

pub use blocks::{BlockCheck, BlockService};
pub use questions::QuestionService;
pub use rate_limit::RateLimitPolicy;
