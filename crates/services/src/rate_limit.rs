//! Per-user posting allowance.
//!
//! Non-PRO users spend one post per accepted question. The allowance is
//! restored once the previous publication is at least a full reset window
//! of calendar days old; the check runs after a creation, against the
//! snapshot read before it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use domains::{Clock, QuestionPolicy, Result, User, UserRepository};
use tracing::{debug, info};

pub struct RateLimitPolicy {
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
    default_posts_limit: i32,
    reset_window_days: i64,
}

impl RateLimitPolicy {
    pub fn new(
        users: Arc<dyn UserRepository>,
        clock: Arc<dyn Clock>,
        policy: &QuestionPolicy,
    ) -> Self {
        Self {
            users,
            clock,
            default_posts_limit: policy.default_posts_limit,
            reset_window_days: policy.reset_window_days,
        }
    }

    pub fn reached_limit(&self, user: &User) -> bool {
        !user.has_active_pro(self.clock.now()) && user.posts_limit <= 0
    }

    /// Spends one post. PRO users are not charged.
    pub async fn decrement(&self, user: &User) -> Result<()> {
        if user.has_active_pro(self.clock.now()) {
            debug!(user_id = %user.id, "PRO user, posts limit decrement unnecessary");
            return Ok(());
        }
        self.users
            .decrement_posts_limit(user.id, user.posts_limit - 1)
            .await?;
        Ok(())
    }

    /// Restores the default allowance when `last_publish_at` lies at least
    /// `reset_window_days` calendar days (UTC) in the past. Returns whether a
    /// reset happened.
    pub async fn maybe_reset(&self, user: &User) -> Result<bool> {
        let Some(last) = user.last_publish_at else {
            return Ok(false);
        };
        let days = calendar_days_between(last, self.clock.now());
        if days < self.reset_window_days {
            debug!(user_id = %user.id, days, "posts limit window still open");
            return Ok(false);
        }
        self.users
            .reset_posts_limit(user.id, self.default_posts_limit)
            .await?;
        info!(user_id = %user.id, days, limit = self.default_posts_limit, "posts limit reset");
        Ok(true)
    }
}

/// Whole UTC calendar days from `from` to `to`, ignoring time of day.
pub fn calendar_days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to.date_naive() - from.date_naive()).num_days()
}
