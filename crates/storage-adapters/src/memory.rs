//! # In-memory adapters
//!
//! `DashMap`-backed implementations of the repository ports. Each call is
//! atomic on its own entry; nothing spans calls, which matches what the
//! engine expects from a document store.
//!
//! Updates addressed to an id that no longer exists are no-ops, the same way
//! an unmatched `updateOne` behaves.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use domains::{
    BlockId, BlockRelationship, BlockRepository, PageRequest, Question, QuestionFilter,
    QuestionId, QuestionRepository, ReplyHistoryEntry, SortOrder, User, UserId, UserRepository,
};
use tracing::debug;

#[derive(Debug, Default)]
pub struct InMemoryQuestionRepository {
    questions: DashMap<QuestionId, Question>,
}

impl InMemoryQuestionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Snapshot of a stored question, history included.
    pub fn get(&self, id: QuestionId) -> Option<Question> {
        self.questions.get(&id).map(|q| q.clone())
    }

    fn update(&self, id: QuestionId, apply: impl FnOnce(&mut Question)) {
        match self.questions.get_mut(&id) {
            Some(mut entry) => apply(entry.value_mut()),
            None => debug!(question_id = %id, "update matched no question"),
        }
    }
}

fn matches_filter(question: &Question, viewer: UserId, filter: QuestionFilter) -> bool {
    if question.is_hidden_by_receiver {
        return false;
    }
    match filter {
        QuestionFilter::All => question.send_to == viewer && !question.is_replied,
        QuestionFilter::Sent => question.sent_by == viewer && !question.is_replied,
        QuestionFilter::Replied => question.send_to == viewer && question.is_replied,
    }
}

#[async_trait]
impl QuestionRepository for InMemoryQuestionRepository {
    async fn create(&self, question: Question) -> anyhow::Result<QuestionId> {
        let id = question.id;
        if self.questions.contains_key(&id) {
            anyhow::bail!("duplicate question id {id}");
        }
        self.questions.insert(id, question);
        Ok(id)
    }

    async fn find_by_id(&self, id: QuestionId) -> anyhow::Result<Option<Question>> {
        Ok(self.get(id))
    }

    async fn paginate(
        &self,
        viewer: UserId,
        request: PageRequest,
    ) -> anyhow::Result<(Vec<Question>, u64)> {
        let mut matched: Vec<Question> = self
            .questions
            .iter()
            .filter(|entry| matches_filter(entry.value(), viewer, request.filter))
            .map(|entry| entry.value().clone())
            .collect();

        matched.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        if request.sort == SortOrder::Desc {
            matched.reverse();
        }

        let total = matched.len() as u64;
        let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let items = matched
            .into_iter()
            .skip(offset)
            .take(request.page_size as usize)
            .map(|mut q| {
                q.replies_history.clear();
                q
            })
            .collect();

        Ok((items, total))
    }

    async fn delete(&self, id: QuestionId) -> anyhow::Result<()> {
        self.questions.remove(&id);
        Ok(())
    }

    async fn set_hidden(&self, id: QuestionId) -> anyhow::Result<()> {
        self.update(id, |q| q.is_hidden_by_receiver = true);
        Ok(())
    }

    async fn set_reply(
        &self,
        id: QuestionId,
        content: String,
        replied_at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        self.update(id, |q| {
            q.reply = Some(content);
            q.is_replied = true;
            q.replied_at = Some(replied_at);
        });
        Ok(())
    }

    async fn edit_reply(
        &self,
        id: QuestionId,
        history: [ReplyHistoryEntry; 2],
        content: String,
        replied_at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        self.update(id, |q| {
            q.replies_history.extend(history);
            q.reply = Some(content);
            q.is_replied = true;
            q.replied_at = Some(replied_at);
        });
        Ok(())
    }

    async fn clear_reply(&self, id: QuestionId) -> anyhow::Result<()> {
        self.update(id, |q| {
            q.reply = None;
            q.is_replied = false;
            q.replied_at = None;
            q.replies_history.clear();
        });
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: DashMap<UserId, User>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, user: User) {
        self.users.insert(user.id, user);
    }

    pub fn get(&self, id: UserId) -> Option<User> {
        self.users.get(&id).map(|u| u.clone())
    }

    fn update(&self, id: UserId, apply: impl FnOnce(&mut User)) {
        match self.users.get_mut(&id) {
            Some(mut entry) => apply(entry.value_mut()),
            None => debug!(user_id = %id, "update matched no user"),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: UserId) -> anyhow::Result<Option<User>> {
        Ok(self.get(id))
    }

    async fn decrement_posts_limit(&self, id: UserId, new_value: i32) -> anyhow::Result<()> {
        self.update(id, |u| u.posts_limit = new_value);
        Ok(())
    }

    async fn reset_posts_limit(&self, id: UserId, limit: i32) -> anyhow::Result<()> {
        self.update(id, |u| u.posts_limit = limit);
        Ok(())
    }

    async fn update_last_published_at(
        &self,
        id: UserId,
        at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        self.update(id, |u| u.last_publish_at = Some(at));
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryBlockRepository {
    blocks: DashMap<BlockId, BlockRelationship>,
}

impl InMemoryBlockRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

#[async_trait]
impl BlockRepository for InMemoryBlockRepository {
    async fn is_blocked(&self, user: UserId) -> anyhow::Result<bool> {
        Ok(self.blocks.iter().any(|b| b.user_to_block == user))
    }

    async fn find_pair(
        &self,
        blocked_by: UserId,
        user_to_block: UserId,
    ) -> anyhow::Result<Option<BlockRelationship>> {
        Ok(self
            .blocks
            .iter()
            .find(|b| b.blocked_by == blocked_by && b.user_to_block == user_to_block)
            .map(|b| b.clone()))
    }

    async fn create(&self, block: BlockRelationship) -> anyhow::Result<()> {
        self.blocks.insert(block.id, block);
        Ok(())
    }

    async fn delete(&self, blocked_by: UserId, user_to_block: UserId) -> anyhow::Result<bool> {
        let before = self.blocks.len();
        self.blocks
            .retain(|_, b| !(b.blocked_by == blocked_by && b.user_to_block == user_to_block));
        Ok(self.blocks.len() < before)
    }

    async fn list_by_blocker(&self, blocked_by: UserId) -> anyhow::Result<Vec<BlockRelationship>> {
        let mut blocks: Vec<_> = self
            .blocks
            .iter()
            .filter(|b| b.blocked_by == blocked_by)
            .map(|b| b.clone())
            .collect();
        blocks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn question(to: UserId, from: UserId, at: DateTime<Utc>) -> Question {
        Question::new(format!("q@{at}"), to, from, false, at)
    }

    fn request(page: u32, sort: SortOrder, filter: QuestionFilter) -> PageRequest {
        PageRequest {
            page,
            page_size: 2,
            sort,
            filter,
        }
    }

    #[tokio::test]
    async fn paginates_in_creation_order() {
        let repo = InMemoryQuestionRepository::new();
        let (me, other) = (UserId::new(), UserId::new());
        let start = Utc::now();
        for i in 0..5 {
            repo.create(question(me, other, start + Duration::minutes(i)))
                .await
                .unwrap();
        }

        let (first, total) = repo
            .paginate(me, request(1, SortOrder::Asc, QuestionFilter::All))
            .await
            .unwrap();
        assert_eq!(total, 5);
        assert_eq!(first.len(), 2);
        assert!(first[0].created_at < first[1].created_at);

        let (last, _) = repo
            .paginate(me, request(3, SortOrder::Asc, QuestionFilter::All))
            .await
            .unwrap();
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].created_at, start + Duration::minutes(4));

        let (newest, _) = repo
            .paginate(me, request(1, SortOrder::Desc, QuestionFilter::All))
            .await
            .unwrap();
        assert_eq!(newest[0].created_at, start + Duration::minutes(4));
    }

    #[tokio::test]
    async fn filters_split_inbox_outbox_and_replied() {
        let repo = InMemoryQuestionRepository::new();
        let (me, other) = (UserId::new(), UserId::new());
        let now = Utc::now();

        let received = repo.create(question(me, other, now)).await.unwrap();
        let replied = repo.create(question(me, other, now)).await.unwrap();
        let hidden = repo.create(question(me, other, now)).await.unwrap();
        repo.create(question(other, me, now)).await.unwrap();

        repo.set_reply(replied, "yes".into(), now).await.unwrap();
        repo.set_hidden(hidden).await.unwrap();

        let ids = |items: Vec<Question>| items.into_iter().map(|q| q.id).collect::<Vec<_>>();
        let page = |filter| request(1, SortOrder::Asc, filter);

        let (all, _) = repo.paginate(me, page(QuestionFilter::All)).await.unwrap();
        assert_eq!(ids(all), vec![received]);

        let (sent, total) = repo.paginate(me, page(QuestionFilter::Sent)).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(sent[0].sent_by, me);

        let (done, _) = repo
            .paginate(me, page(QuestionFilter::Replied))
            .await
            .unwrap();
        assert_eq!(ids(done), vec![replied]);
    }

    #[tokio::test]
    async fn listing_omits_history_but_lookup_keeps_it() {
        let repo = InMemoryQuestionRepository::new();
        let (me, other) = (UserId::new(), UserId::new());
        let now = Utc::now();
        let id = repo.create(question(me, other, now)).await.unwrap();
        repo.set_reply(id, "a".into(), now).await.unwrap();
        repo.edit_reply(
            id,
            [
                ReplyHistoryEntry::new("a", now),
                ReplyHistoryEntry::new("b", now),
            ],
            "b".into(),
            now,
        )
        .await
        .unwrap();

        let (items, _) = repo
            .paginate(me, request(1, SortOrder::Asc, QuestionFilter::Replied))
            .await
            .unwrap();
        assert!(items[0].replies_history.is_empty());
        assert_eq!(repo.get(id).unwrap().replies_history.len(), 2);

        repo.clear_reply(id).await.unwrap();
        let cleared = repo.get(id).unwrap();
        assert!(cleared.reply.is_none());
        assert!(!cleared.is_replied);
        assert!(cleared.replied_at.is_none());
        assert!(cleared.replies_history.is_empty());
    }

    #[tokio::test]
    async fn block_lookups() {
        let repo = InMemoryBlockRepository::new();
        let (a, b, c) = (UserId::new(), UserId::new(), UserId::new());
        repo.create(BlockRelationship::new(a, b, Utc::now()))
            .await
            .unwrap();

        assert!(repo.is_blocked(b).await.unwrap());
        assert!(!repo.is_blocked(a).await.unwrap());
        assert!(repo.find_pair(a, b).await.unwrap().is_some());
        assert!(repo.find_pair(c, b).await.unwrap().is_none());
        assert_eq!(repo.list_by_blocker(a).await.unwrap().len(), 1);

        assert!(repo.delete(a, b).await.unwrap());
        assert!(!repo.delete(a, b).await.unwrap());
        assert!(!repo.is_blocked(b).await.unwrap());
    }
}
