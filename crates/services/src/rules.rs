//! Authorization and validation predicates for questions.
//!
//! Each check is stateless and returns the classified rejection it stands
//! for. Operations in [`crate::questions`] chain them in a fixed order so
//! the reported error is deterministic when several rules fail at once.

use domains::{DomainError, Question, QuestionPolicy, Result, UserId};

/// Unwraps a repository lookup, rejecting absent or nil-id questions.
pub fn exists(question: Option<Question>) -> Result<Question> {
    match question {
        Some(q) if !q.id.is_nil() => Ok(q),
        _ => Err(DomainError::QuestionNotFound),
    }
}

/// Only the recipient and the author may see a question.
pub fn can_view(question: &Question, user: UserId) -> Result<()> {
    if question.is_participant(user) {
        Ok(())
    } else {
        Err(DomainError::Unauthorized)
    }
}

/// Only the recipient may reply, edit or remove a reply.
pub fn can_reply(question: &Question, user: UserId) -> Result<()> {
    if user == question.send_to {
        Ok(())
    } else {
        Err(DomainError::Forbidden)
    }
}

pub fn can_hide(question: &Question, user: UserId) -> Result<()> {
    if user == question.send_to {
        Ok(())
    } else {
        Err(DomainError::Forbidden)
    }
}

/// Only the author may delete.
pub fn can_delete(question: &Question, user: UserId) -> Result<()> {
    if user == question.sent_by {
        Ok(())
    } else {
        Err(DomainError::Forbidden)
    }
}

pub fn not_sending_to_self(send_to: UserId, sender: UserId) -> Result<()> {
    if send_to == sender {
        Err(DomainError::InvalidTarget)
    } else {
        Ok(())
    }
}

pub fn valid_target_id(send_to: UserId) -> Result<()> {
    if send_to.is_nil() {
        Err(DomainError::InvalidTarget)
    } else {
        Ok(())
    }
}

pub fn not_already_replied(question: &Question) -> Result<()> {
    if question.is_replied {
        Err(DomainError::AlreadyReplied)
    } else {
        Ok(())
    }
}

/// Edits and removals need an existing reply.
pub fn already_replied(question: &Question) -> Result<()> {
    if question.is_replied {
        Ok(())
    } else {
        Err(DomainError::NotRepliedYet)
    }
}

pub fn not_already_hidden(question: &Question) -> Result<()> {
    if question.is_hidden_by_receiver {
        Err(DomainError::AlreadyHidden)
    } else {
        Ok(())
    }
}

pub fn under_edit_limit(question: &Question, max_history: usize) -> Result<()> {
    if question.replies_history.len() >= max_history {
        Err(DomainError::EditLimitReached)
    } else {
        Ok(())
    }
}

/// Required, at most `policy.max_content_length` characters.
pub fn content_valid(content: &str, policy: &QuestionPolicy) -> Result<()> {
    if content.is_empty() {
        return Err(DomainError::Validation("content is required".into()));
    }
    let len = content.chars().count();
    if len > policy.max_content_length {
        return Err(DomainError::Validation(format!(
            "content must be at most {} characters, got {len}",
            policy.max_content_length
        )));
    }
    Ok(())
}
