//! Block relationships: the predicate consulted on question creation and the
//! service users call to block and unblock each other.

use std::sync::Arc;

use domains::{
    BlockRelationship, BlockRepository, BlockScope, Clock, DomainError, Result, UserId,
    UserRepository,
};
use tracing::{info, instrument};

/// Answers "may `sender` send to `recipient`" from the block store.
pub struct BlockCheck {
    blocks: Arc<dyn BlockRepository>,
    scope: BlockScope,
}

impl BlockCheck {
    pub fn new(blocks: Arc<dyn BlockRepository>, scope: BlockScope) -> Self {
        Self { blocks, scope }
    }

    /// True if any block record names `user`, regardless of who placed it.
    pub async fn is_blocked(&self, user: UserId) -> Result<bool> {
        Ok(self.blocks.is_blocked(user).await?)
    }

    /// Fails `DidBlockedReceiver` when the recipient is blocked, then
    /// `IsBlockedByReceiver` when the sender is.
    pub async fn ensure_not_blocked(&self, sender: UserId, recipient: UserId) -> Result<()> {
        if self.recipient_blocked(sender, recipient).await? {
            return Err(DomainError::DidBlockedReceiver);
        }
        if self.sender_blocked(sender, recipient).await? {
            return Err(DomainError::IsBlockedByReceiver);
        }
        Ok(())
    }

    async fn recipient_blocked(&self, sender: UserId, recipient: UserId) -> Result<bool> {
        match self.scope {
            BlockScope::Global => self.is_blocked(recipient).await,
            BlockScope::Pairwise => Ok(self.blocks.find_pair(sender, recipient).await?.is_some()),
        }
    }

    async fn sender_blocked(&self, sender: UserId, recipient: UserId) -> Result<bool> {
        match self.scope {
            BlockScope::Global => self.is_blocked(sender).await,
            BlockScope::Pairwise => Ok(self.blocks.find_pair(recipient, sender).await?.is_some()),
        }
    }
}

/// Block management on behalf of an authenticated user.
pub struct BlockService {
    blocks: Arc<dyn BlockRepository>,
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
}

impl BlockService {
    pub fn new(
        blocks: Arc<dyn BlockRepository>,
        users: Arc<dyn UserRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            blocks,
            users,
            clock,
        }
    }

    #[instrument(skip(self))]
    pub async fn block(&self, blocker: UserId, target: UserId) -> Result<BlockRelationship> {
        if target.is_nil() || target == blocker {
            return Err(DomainError::InvalidTarget);
        }
        if self.users.find_by_id(target).await?.is_none() {
            return Err(DomainError::UserNotFound);
        }
        if self.blocks.find_pair(blocker, target).await?.is_some() {
            return Err(DomainError::AlreadyBlocked);
        }

        let block = BlockRelationship::new(blocker, target, self.clock.now());
        self.blocks.create(block.clone()).await?;
        info!(block_id = %block.id, "user blocked");
        Ok(block)
    }

    #[instrument(skip(self))]
    pub async fn unblock(&self, blocker: UserId, target: UserId) -> Result<()> {
        if !self.blocks.delete(blocker, target).await? {
            return Err(DomainError::BlockNotFound);
        }
        info!("user unblocked");
        Ok(())
    }

    pub async fn list_blocked(&self, blocker: UserId) -> Result<Vec<BlockRelationship>> {
        Ok(self.blocks.list_by_blocker(blocker).await?)
    }
}
