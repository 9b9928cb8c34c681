//! # Core Traits (Ports)
//!
//! Any adapter must implement these traits to be wired into the services.
//! Adapters report failures as `anyhow::Error`; the services surface them as
//! [`DomainError::Dependency`](crate::errors::DomainError::Dependency).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{
    BlockRelationship, NewQuestionNotice, PageRequest, Question, QuestionId, ReplyHistoryEntry,
    User, UserId,
};

/// Persistence contract for questions.
///
/// Read-then-write sequences issued by the engine are not atomic; adapters
/// only need each individual call to be.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    async fn create(&self, question: Question) -> anyhow::Result<QuestionId>;
    async fn find_by_id(&self, id: QuestionId) -> anyhow::Result<Option<Question>>;

    /// Returns one page of the viewer's questions and the total match count.
    /// Items come without `replies_history`.
    async fn paginate(
        &self,
        viewer: UserId,
        request: PageRequest,
    ) -> anyhow::Result<(Vec<Question>, u64)>;

    async fn delete(&self, id: QuestionId) -> anyhow::Result<()>;
    async fn set_hidden(&self, id: QuestionId) -> anyhow::Result<()>;

    /// Sets the reply, `is_replied = true` and `replied_at`.
    async fn set_reply(
        &self,
        id: QuestionId,
        content: String,
        replied_at: DateTime<Utc>,
    ) -> anyhow::Result<()>;

    /// Appends both history entries and sets the new reply in one write.
    async fn edit_reply(
        &self,
        id: QuestionId,
        history: [ReplyHistoryEntry; 2],
        content: String,
        replied_at: DateTime<Utc>,
    ) -> anyhow::Result<()>;

    /// Resets reply, `is_replied`, `replied_at` and `replies_history`.
    async fn clear_reply(&self, id: QuestionId) -> anyhow::Result<()>;
}

/// Lookup and the few mutations the engine requests from user management.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> anyhow::Result<Option<User>>;
    async fn decrement_posts_limit(&self, id: UserId, new_value: i32) -> anyhow::Result<()>;
    async fn reset_posts_limit(&self, id: UserId, limit: i32) -> anyhow::Result<()>;
    async fn update_last_published_at(&self, id: UserId, at: DateTime<Utc>)
        -> anyhow::Result<()>;
}

/// Storage of block relationships.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait BlockRepository: Send + Sync {
    /// True if any record names `user` as `user_to_block`.
    async fn is_blocked(&self, user: UserId) -> anyhow::Result<bool>;
    async fn find_pair(
        &self,
        blocked_by: UserId,
        user_to_block: UserId,
    ) -> anyhow::Result<Option<BlockRelationship>>;
    async fn create(&self, block: BlockRelationship) -> anyhow::Result<()>;
    async fn delete(&self, blocked_by: UserId, user_to_block: UserId) -> anyhow::Result<bool>;
    /// Blocks placed by `blocked_by`, newest first.
    async fn list_by_blocker(&self, blocked_by: UserId) -> anyhow::Result<Vec<BlockRelationship>>;
}

/// Outbound "you received a question" channel (email queue, push, ...).
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_new_question(&self, notice: NewQuestionNotice) -> anyhow::Result<()>;
}

/// Time source, abstracted so resets and timestamps are testable.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
