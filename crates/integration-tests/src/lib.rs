//! Shared fixtures for the end-to-end suites: the services wired to the
//! in-memory adapters, a settable clock and an observable notifier.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use domains::{
    Clock, CreateOutcome, NewQuestion, NewQuestionNotice, Notifier, QuestionPolicy, Result, User,
    UserId,
};
use services::{BlockService, QuestionService};
use storage_adapters::{
    ChannelNotifier, InMemoryBlockRepository, InMemoryQuestionRepository, InMemoryUserRepository,
};
use tokio::sync::mpsc::UnboundedReceiver;

/// Clock the tests move by hand.
#[derive(Debug)]
pub struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self(Mutex::new(start))
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.0.lock().unwrap() = at;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.0.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

/// Notifier whose transport is always down.
#[derive(Debug, Default)]
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify_new_question(&self, _notice: NewQuestionNotice) -> anyhow::Result<()> {
        anyhow::bail!("smtp relay unreachable")
    }
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 2, 10, 0, 0).unwrap()
}

pub struct TestApp {
    pub questions: Arc<InMemoryQuestionRepository>,
    pub users: Arc<InMemoryUserRepository>,
    pub blocks: Arc<InMemoryBlockRepository>,
    pub clock: Arc<ManualClock>,
    pub notices: UnboundedReceiver<NewQuestionNotice>,
    pub service: QuestionService,
    pub block_service: BlockService,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_policy(QuestionPolicy::default())
    }

    pub fn with_policy(policy: QuestionPolicy) -> Self {
        let (notifier, notices) = ChannelNotifier::new();
        Self::build(policy, Arc::new(notifier), notices)
    }

    /// App whose notifications always fail to send.
    pub fn with_failing_notifier() -> Self {
        let (_, notices) = ChannelNotifier::new();
        Self::build(QuestionPolicy::default(), Arc::new(FailingNotifier), notices)
    }

    fn build(
        policy: QuestionPolicy,
        notifier: Arc<dyn Notifier>,
        notices: UnboundedReceiver<NewQuestionNotice>,
    ) -> Self {
        let questions = Arc::new(InMemoryQuestionRepository::new());
        let users = Arc::new(InMemoryUserRepository::new());
        let blocks = Arc::new(InMemoryBlockRepository::new());
        let clock = Arc::new(ManualClock::new(start_time()));

        let service = QuestionService::new(
            questions.clone(),
            users.clone(),
            blocks.clone(),
            notifier,
            clock.clone(),
            policy,
        );
        let block_service = BlockService::new(blocks.clone(), users.clone(), clock.clone());

        Self {
            questions,
            users,
            blocks,
            clock,
            notices,
            service,
            block_service,
        }
    }

    /// Registers a regular user with a full allowance, then applies `tweak`.
    pub fn add_user(&self, nick: &str, tweak: impl FnOnce(&mut User)) -> UserId {
        let mut user = User {
            id: UserId::new(),
            nick: nick.into(),
            name: nick.to_uppercase(),
            avatar: Some(format!("https://cdn.example.com/{nick}.png")),
            email: format!("{nick}@example.com"),
            is_pro: false,
            pro_expires_at: None,
            posts_limit: 30,
            is_shadow_banned: false,
            enable_email_notifications: false,
            last_publish_at: None,
        };
        tweak(&mut user);
        let id = user.id;
        self.users.insert(user);
        id
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn user(&self, id: UserId) -> User {
        self.users.get(id).expect("user registered by the test")
    }

    pub async fn send(&self, from: UserId, to: UserId, content: &str) -> Result<CreateOutcome> {
        self.send_with(from, to, content, false).await
    }

    pub async fn send_anonymous(
        &self,
        from: UserId,
        to: UserId,
        content: &str,
    ) -> Result<CreateOutcome> {
        self.send_with(from, to, content, true).await
    }

    async fn send_with(
        &self,
        from: UserId,
        to: UserId,
        content: &str,
        is_anonymous: bool,
    ) -> Result<CreateOutcome> {
        self.service
            .create_question(
                from,
                NewQuestion {
                    content: content.into(),
                    send_to: to,
                    is_anonymous,
                },
            )
            .await
    }

    /// Waits briefly for the next dispatched notification.
    pub async fn next_notice(&mut self) -> Option<NewQuestionNotice> {
        tokio::time::timeout(Duration::from_millis(500), self.notices.recv())
            .await
            .ok()
            .flatten()
    }

    /// True if nothing gets dispatched within a short grace period.
    pub async fn no_notice(&mut self) -> bool {
        tokio::time::timeout(Duration::from_millis(100), self.notices.recv())
            .await
            .is_err()
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
