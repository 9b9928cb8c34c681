//! # Question Policy
//!
//! Tunables of the question engine. Passed into service constructors so tests
//! can run alternate policies; loaded from configuration in production.

use serde::{Deserialize, Serialize};

/// How a block record is matched when a question is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockScope {
    /// Any record naming a user as `user_to_block` blocks that user for
    /// everyone, whoever placed it.
    #[default]
    Global,
    /// Only a record between the sender and the recipient counts.
    Pairwise,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestionPolicy {
    /// Weekly allowance restored on reset.
    pub default_posts_limit: i32,
    /// Calendar days between `last_publish_at` and now before a reset.
    pub reset_window_days: i64,
    /// Maximum length of `replies_history`. Each edit pushes two entries.
    pub max_reply_history: usize,
    pub page_size: u32,
    pub max_content_length: usize,
    pub block_scope: BlockScope,
}

impl Default for QuestionPolicy {
    fn default() -> Self {
        Self {
            default_posts_limit: 30,
            reset_window_days: 7,
            max_reply_history: 6,
            page_size: 30,
            max_content_length: 250,
            block_scope: BlockScope::Global,
        }
    }
}
