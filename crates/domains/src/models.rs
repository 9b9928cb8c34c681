//! # Domain Models
//!
//! These structs represent the core entities of the question service.
//! Identifiers are random UUID v4 values wrapped in newtypes; the nil UUID is
//! the "zero value" that callers may send when a field is missing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generates a fresh random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn nil() -> Self {
                Self(Uuid::nil())
            }

            pub fn is_nil(&self) -> bool {
                self.0.is_nil()
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

uuid_id!(
    /// Identity of a registered user, resolved by the auth layer.
    UserId
);
uuid_id!(
    /// Identity of a question, generated once at creation.
    QuestionId
);
uuid_id!(BlockId);
uuid_id!(ReplyEntryId);

/// A message from one user to another, optionally anonymous, optionally replied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: QuestionId,
    pub content: String,
    /// Recipient. Never changes after creation.
    pub send_to: UserId,
    /// Author. Never changes after creation and stays populated for
    /// authorization even when the question is anonymous.
    pub sent_by: UserId,
    pub is_anonymous: bool,
    /// Flips false -> true once; there is no unhide.
    pub is_hidden_by_receiver: bool,
    /// Always equal to `reply.is_some()`.
    pub is_replied: bool,
    pub reply: Option<String>,
    /// Superseded and replacement reply contents, oldest first.
    pub replies_history: Vec<ReplyHistoryEntry>,
    pub created_at: DateTime<Utc>,
    pub replied_at: Option<DateTime<Utc>>,
}

impl Question {
    pub fn new(
        content: String,
        send_to: UserId,
        sent_by: UserId,
        is_anonymous: bool,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: QuestionId::new(),
            content,
            send_to,
            sent_by,
            is_anonymous,
            is_hidden_by_receiver: false,
            is_replied: false,
            reply: None,
            replies_history: Vec::new(),
            created_at: now,
            replied_at: None,
        }
    }

    /// True for the author and the recipient.
    pub fn is_participant(&self, user: UserId) -> bool {
        user == self.send_to || user == self.sent_by
    }
}

/// One entry of a question's reply history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyHistoryEntry {
    pub id: ReplyEntryId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ReplyHistoryEntry {
    pub fn new(content: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: ReplyEntryId::new(),
            content: content.into(),
            created_at,
        }
    }
}

/// The subset of a user account the question service reads.
///
/// Owned by the user-management component; the engine only asks it to
/// decrement or reset `posts_limit` and to stamp `last_publish_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub nick: String,
    pub name: String,
    pub avatar: Option<String>,
    /// Used only to address notifications; never part of a profile.
    pub email: String,
    #[serde(rename = "isPRO")]
    pub is_pro: bool,
    pub pro_expires_at: Option<DateTime<Utc>>,
    pub posts_limit: i32,
    pub is_shadow_banned: bool,
    pub enable_email_notifications: bool,
    pub last_publish_at: Option<DateTime<Utc>>,
}

impl User {
    /// PRO counts only while the subscription has not expired.
    pub fn has_active_pro(&self, now: DateTime<Utc>) -> bool {
        self.is_pro && self.pro_expires_at.is_none_or(|expires| expires > now)
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            nick: self.nick.clone(),
            name: self.name.clone(),
            avatar: self.avatar.clone(),
        }
    }
}

/// Public-facing minimal profile. Never carries email or credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub nick: String,
    pub name: String,
    pub avatar: Option<String>,
}

/// "`blocked_by` blocked `user_to_block`".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRelationship {
    pub id: BlockId,
    pub user_to_block: UserId,
    pub blocked_by: UserId,
    pub created_at: DateTime<Utc>,
}

impl BlockRelationship {
    pub fn new(blocked_by: UserId, user_to_block: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: BlockId::new(),
            user_to_block,
            blocked_by,
            created_at: now,
        }
    }
}

/// Payload of `CreateQuestion`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQuestion {
    pub content: String,
    pub send_to: UserId,
    #[serde(default)]
    pub is_anonymous: bool,
}

/// Result of a creation that passed validation.
///
/// Both variants are a success for the caller; `Suppressed` is the
/// shadow-ban path where nothing was stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(QuestionId),
    Suppressed,
}

impl CreateOutcome {
    pub fn question_id(&self) -> Option<QuestionId> {
        match self {
            CreateOutcome::Created(id) => Some(*id),
            CreateOutcome::Suppressed => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Which slice of the viewer's questions a page shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionFilter {
    /// Received, not replied, not hidden.
    #[default]
    All,
    /// Authored, not replied, not hidden.
    Sent,
    /// Received and replied, not hidden.
    Replied,
}

/// Raw listing parameters as they arrive from the caller. Unset or zero
/// values fall back to page 1, ascending, `all`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub sort: Option<SortOrder>,
    pub filter: Option<QuestionFilter>,
}

/// Normalised listing request handed to the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-indexed.
    pub page: u32,
    pub page_size: u32,
    pub sort: SortOrder,
    pub filter: QuestionFilter,
}

impl PageRequest {
    pub fn from_query(query: PageQuery, page_size: u32) -> Self {
        Self {
            page: query.page.filter(|p| *p > 0).unwrap_or(1),
            page_size,
            sort: query.sort.unwrap_or_default(),
            filter: query.filter.unwrap_or_default(),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }
}

/// Externally visible projection of a question.
///
/// Anonymous questions keep only id, content, anonymity flag, creation time
/// and the reply fields; everything else is `None` and left out of the
/// serialized form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub id: QuestionId,
    pub content: String,
    pub is_anonymous: bool,
    pub created_at: DateTime<Utc>,
    pub reply: Option<String>,
    pub is_replied: bool,
    pub replied_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_by: Option<UserProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_to: Option<UserProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_hidden_by_receiver: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replies_history: Option<Vec<ReplyHistoryEntry>>,
}

/// One page of questions plus the total number of matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedQuestions {
    pub items: Vec<QuestionView>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

/// What the notification transport receives when a question lands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQuestionNotice {
    pub recipient_id: UserId,
    pub recipient_email: String,
    /// `None` for anonymous questions.
    pub sender: Option<UserProfile>,
    pub content: String,
    pub is_anonymous: bool,
}
