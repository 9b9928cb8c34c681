//! # PostgreSQL adapters
//!
//! Maps the relational model onto the `domains` entities. Reply history is a
//! JSONB array so an edit can append both entries and set the reply in a
//! single `UPDATE`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{
    BlockRelationship, BlockRepository, PageRequest, Question, QuestionFilter, QuestionId,
    QuestionRepository, ReplyHistoryEntry, SortOrder, User, UserId, UserRepository,
};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::types::{Json, Uuid};
use sqlx::Row;
use tracing::info;

/// Opens a pool and applies pending migrations.
pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!(max_connections, "postgres pool ready");
    Ok(pool)
}

const QUESTION_COLUMNS: &str = "id, content, send_to, sent_by, is_anonymous, \
     is_hidden_by_receiver, is_replied, reply, replies_history, created_at, replied_at";

/// Same as `QUESTION_COLUMNS` with an empty history, for listings.
const QUESTION_LIST_COLUMNS: &str = "id, content, send_to, sent_by, is_anonymous, \
     is_hidden_by_receiver, is_replied, reply, '[]'::jsonb AS replies_history, created_at, \
     replied_at";

fn question_from_row(row: &PgRow) -> anyhow::Result<Question> {
    Ok(Question {
        id: QuestionId(row.try_get::<Uuid, _>("id")?),
        content: row.try_get("content")?,
        send_to: UserId(row.try_get::<Uuid, _>("send_to")?),
        sent_by: UserId(row.try_get::<Uuid, _>("sent_by")?),
        is_anonymous: row.try_get("is_anonymous")?,
        is_hidden_by_receiver: row.try_get("is_hidden_by_receiver")?,
        is_replied: row.try_get("is_replied")?,
        reply: row.try_get("reply")?,
        replies_history: row
            .try_get::<Json<Vec<ReplyHistoryEntry>>, _>("replies_history")?
            .0,
        created_at: row.try_get("created_at")?,
        replied_at: row.try_get("replied_at")?,
    })
}

fn filter_clause(filter: QuestionFilter) -> &'static str {
    match filter {
        QuestionFilter::All => {
            "send_to = $1 AND is_replied = FALSE AND is_hidden_by_receiver = FALSE"
        }
        QuestionFilter::Sent => {
            "sent_by = $1 AND is_replied = FALSE AND is_hidden_by_receiver = FALSE"
        }
        QuestionFilter::Replied => {
            "send_to = $1 AND is_replied = TRUE AND is_hidden_by_receiver = FALSE"
        }
    }
}

pub struct PgQuestionRepository {
    pool: PgPool,
}

impl PgQuestionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuestionRepository for PgQuestionRepository {
    async fn create(&self, question: Question) -> anyhow::Result<QuestionId> {
        sqlx::query(
            "INSERT INTO questions (id, content, send_to, sent_by, is_anonymous, \
             is_hidden_by_receiver, is_replied, reply, replies_history, created_at, replied_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(question.id.0)
        .bind(&question.content)
        .bind(question.send_to.0)
        .bind(question.sent_by.0)
        .bind(question.is_anonymous)
        .bind(question.is_hidden_by_receiver)
        .bind(question.is_replied)
        .bind(&question.reply)
        .bind(Json(&question.replies_history))
        .bind(question.created_at)
        .bind(question.replied_at)
        .execute(&self.pool)
        .await?;
        Ok(question.id)
    }

    async fn find_by_id(&self, id: QuestionId) -> anyhow::Result<Option<Question>> {
        let row = sqlx::query(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions WHERE id = $1"
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(question_from_row).transpose()
    }

    async fn paginate(
        &self,
        viewer: UserId,
        request: PageRequest,
    ) -> anyhow::Result<(Vec<Question>, u64)> {
        let clause = filter_clause(request.filter);
        let direction = match request.sort {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };

        let rows = sqlx::query(&format!(
            "SELECT {QUESTION_LIST_COLUMNS} FROM questions WHERE {clause} \
             ORDER BY created_at {direction}, id {direction} LIMIT $2 OFFSET $3"
        ))
        .bind(viewer.0)
        .bind(i64::from(request.page_size))
        .bind(i64::try_from(request.offset())?)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM questions WHERE {clause}"
        ))
        .bind(viewer.0)
        .fetch_one(&self.pool)
        .await?;

        let items = rows
            .iter()
            .map(question_from_row)
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok((items, u64::try_from(total)?))
    }

    async fn delete(&self, id: QuestionId) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_hidden(&self, id: QuestionId) -> anyhow::Result<()> {
        sqlx::query("UPDATE questions SET is_hidden_by_receiver = TRUE WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_reply(
        &self,
        id: QuestionId,
        content: String,
        replied_at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE questions SET reply = $2, is_replied = TRUE, replied_at = $3 WHERE id = $1",
        )
        .bind(id.0)
        .bind(content)
        .bind(replied_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn edit_reply(
        &self,
        id: QuestionId,
        history: [ReplyHistoryEntry; 2],
        content: String,
        replied_at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE questions SET replies_history = replies_history || $2, reply = $3, \
             is_replied = TRUE, replied_at = $4 WHERE id = $1",
        )
        .bind(id.0)
        .bind(Json(history.to_vec()))
        .bind(content)
        .bind(replied_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn clear_reply(&self, id: QuestionId) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE questions SET reply = NULL, is_replied = FALSE, replied_at = NULL, \
             replies_history = '[]'::jsonb WHERE id = $1",
        )
        .bind(id.0)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: UserId) -> anyhow::Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, nick, name, avatar, email, is_pro, pro_expires_at, posts_limit, \
             is_shadow_banned, enable_email_notifications, last_publish_at \
             FROM users WHERE id = $1",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(User {
            id: UserId(row.try_get::<Uuid, _>("id")?),
            nick: row.try_get("nick")?,
            name: row.try_get("name")?,
            avatar: row.try_get("avatar")?,
            email: row.try_get("email")?,
            is_pro: row.try_get("is_pro")?,
            pro_expires_at: row.try_get("pro_expires_at")?,
            posts_limit: row.try_get("posts_limit")?,
            is_shadow_banned: row.try_get("is_shadow_banned")?,
            enable_email_notifications: row.try_get("enable_email_notifications")?,
            last_publish_at: row.try_get("last_publish_at")?,
        }))
    }

    async fn decrement_posts_limit(&self, id: UserId, new_value: i32) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET posts_limit = $2 WHERE id = $1")
            .bind(id.0)
            .bind(new_value)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn reset_posts_limit(&self, id: UserId, limit: i32) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET posts_limit = $2 WHERE id = $1")
            .bind(id.0)
            .bind(limit)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_last_published_at(
        &self,
        id: UserId,
        at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET last_publish_at = $2 WHERE id = $1")
            .bind(id.0)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

pub struct PgBlockRepository {
    pool: PgPool,
}

impl PgBlockRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn block_from_row(row: &PgRow) -> anyhow::Result<BlockRelationship> {
    Ok(BlockRelationship {
        id: row.try_get::<Uuid, _>("id")?.into(),
        user_to_block: UserId(row.try_get::<Uuid, _>("user_to_block")?),
        blocked_by: UserId(row.try_get::<Uuid, _>("blocked_by")?),
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl BlockRepository for PgBlockRepository {
    async fn is_blocked(&self, user: UserId) -> anyhow::Result<bool> {
        let blocked: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM blocks WHERE user_to_block = $1)")
                .bind(user.0)
                .fetch_one(&self.pool)
                .await?;
        Ok(blocked)
    }

    async fn find_pair(
        &self,
        blocked_by: UserId,
        user_to_block: UserId,
    ) -> anyhow::Result<Option<BlockRelationship>> {
        let row = sqlx::query(
            "SELECT id, user_to_block, blocked_by, created_at FROM blocks \
             WHERE blocked_by = $1 AND user_to_block = $2",
        )
        .bind(blocked_by.0)
        .bind(user_to_block.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(block_from_row).transpose()
    }

    async fn create(&self, block: BlockRelationship) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO blocks (id, user_to_block, blocked_by, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(block.id.0)
        .bind(block.user_to_block.0)
        .bind(block.blocked_by.0)
        .bind(block.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, blocked_by: UserId, user_to_block: UserId) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM blocks WHERE blocked_by = $1 AND user_to_block = $2")
            .bind(blocked_by.0)
            .bind(user_to_block.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_by_blocker(&self, blocked_by: UserId) -> anyhow::Result<Vec<BlockRelationship>> {
        let rows = sqlx::query(
            "SELECT id, user_to_block, blocked_by, created_at FROM blocks \
             WHERE blocked_by = $1 ORDER BY created_at DESC",
        )
        .bind(blocked_by.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(block_from_row).collect()
    }
}
