//! # DomainError
//!
//! Centralized error handling for the question service.
//! Every rejection carries a stable reason code the boundary layer can
//! translate, and a coarse [`ErrorKind`] it can map to a status code.

use thiserror::Error;

/// Coarse classification of a [`DomainError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Unauthorized,
    Forbidden,
    Conflict,
    InvalidTarget,
    RateLimited,
    Blocked,
    Dependency,
}

/// The primary error type for all service operations.
#[derive(Error, Debug)]
pub enum DomainError {
    /// Malformed or missing field
    #[error("validation error: {0}")]
    Validation(String),

    #[error("question not found")]
    QuestionNotFound,

    /// Recipient or other referenced user is absent
    #[error("user not found")]
    UserNotFound,

    /// Viewer is not a party to the question
    #[error("unauthorized")]
    Unauthorized,

    /// Viewer is a party but lacks this capability
    #[error("forbidden")]
    Forbidden,

    #[error("question already replied")]
    AlreadyReplied,

    #[error("question has not been replied yet")]
    NotRepliedYet,

    #[error("question already hidden")]
    AlreadyHidden,

    #[error("reply edit limit reached")]
    EditLimitReached,

    /// Self-targeting or empty recipient
    #[error("invalid target")]
    InvalidTarget,

    #[error("posting limit reached")]
    RateLimited,

    /// The recipient is blocked
    #[error("receiver is blocked")]
    DidBlockedReceiver,

    /// The sender is blocked
    #[error("sender is blocked by receiver")]
    IsBlockedByReceiver,

    #[error("user already blocked")]
    AlreadyBlocked,

    #[error("block not found")]
    BlockNotFound,

    /// Repository or other collaborator failure, surfaced as-is
    #[error("dependency failure: {0}")]
    Dependency(#[from] anyhow::Error),
}

impl DomainError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::Validation(_) => ErrorKind::Validation,
            DomainError::QuestionNotFound
            | DomainError::UserNotFound
            | DomainError::BlockNotFound => ErrorKind::NotFound,
            DomainError::Unauthorized => ErrorKind::Unauthorized,
            DomainError::Forbidden => ErrorKind::Forbidden,
            DomainError::AlreadyReplied
            | DomainError::NotRepliedYet
            | DomainError::AlreadyHidden
            | DomainError::EditLimitReached
            | DomainError::AlreadyBlocked => ErrorKind::Conflict,
            DomainError::InvalidTarget => ErrorKind::InvalidTarget,
            DomainError::RateLimited => ErrorKind::RateLimited,
            DomainError::DidBlockedReceiver | DomainError::IsBlockedByReceiver => {
                ErrorKind::Blocked
            }
            DomainError::Dependency(_) => ErrorKind::Dependency,
        }
    }

    /// Stable, localizable identifier of the rejection.
    pub fn reason_code(&self) -> &'static str {
        match self {
            DomainError::Validation(_) => "validation.invalid",
            DomainError::QuestionNotFound => "question.not_found",
            DomainError::UserNotFound => "user.not_found",
            DomainError::Unauthorized => "question.unauthorized",
            DomainError::Forbidden => "question.forbidden",
            DomainError::AlreadyReplied => "question.already_replied",
            DomainError::NotRepliedYet => "question.not_replied_yet",
            DomainError::AlreadyHidden => "question.already_hidden",
            DomainError::EditLimitReached => "question.edit_limit_reached",
            DomainError::InvalidTarget => "question.invalid_target",
            DomainError::RateLimited => "user.rate_limited",
            DomainError::DidBlockedReceiver => "block.receiver_blocked",
            DomainError::IsBlockedByReceiver => "block.sender_blocked",
            DomainError::AlreadyBlocked => "block.already_exists",
            DomainError::BlockNotFound => "block.not_found",
            DomainError::Dependency(_) => "internal.dependency",
        }
    }
}

/// A specialized Result type for question service logic.
pub type Result<T> = std::result::Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn conflicts_share_a_kind_but_not_a_code() {
        let errs = [
            DomainError::AlreadyReplied,
            DomainError::NotRepliedYet,
            DomainError::AlreadyHidden,
            DomainError::EditLimitReached,
        ];
        let codes: HashSet<_> = errs.iter().map(|e| e.reason_code()).collect();
        assert_eq!(codes.len(), errs.len());
        assert!(errs.iter().all(|e| e.kind() == ErrorKind::Conflict));
    }

    #[test]
    fn store_failures_become_dependency_errors() {
        let err: DomainError = anyhow::anyhow!("connection reset").into();
        assert_eq!(err.kind(), ErrorKind::Dependency);
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn both_block_directions_are_blocked_kind() {
        assert_eq!(DomainError::DidBlockedReceiver.kind(), ErrorKind::Blocked);
        assert_eq!(DomainError::IsBlockedByReceiver.kind(), ErrorKind::Blocked);
        assert_ne!(
            DomainError::DidBlockedReceiver.reason_code(),
            DomainError::IsBlockedByReceiver.reason_code()
        );
    }
}
