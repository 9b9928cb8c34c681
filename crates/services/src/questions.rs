//! # Question Lifecycle
//!
//! Orchestrates creation, listing, reply, reply edit, reply removal, hide
//! and delete. Every operation runs its checks in a fixed order and then
//! issues a single repository mutation; nothing here holds state between
//! calls.

use std::collections::HashMap;
use std::sync::Arc;

use domains::{
    BlockRepository, Clock, CreateOutcome, DomainError, NewQuestion, NewQuestionNotice,
    Notifier, PageQuery, PageRequest, PaginatedQuestions, Question, QuestionId, QuestionPolicy,
    QuestionRepository, QuestionView, ReplyHistoryEntry, Result, User, UserId, UserProfile,
    UserRepository,
};
use tracing::{info, instrument, warn, Instrument};

use crate::anonymity::{map_anonymous_fields, Participants};
use crate::blocks::BlockCheck;
use crate::rate_limit::RateLimitPolicy;
use crate::rules;

pub struct QuestionService {
    questions: Arc<dyn QuestionRepository>,
    users: Arc<dyn UserRepository>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    blocks: BlockCheck,
    limits: RateLimitPolicy,
    policy: QuestionPolicy,
}

impl QuestionService {
    pub fn new(
        questions: Arc<dyn QuestionRepository>,
        users: Arc<dyn UserRepository>,
        blocks: Arc<dyn BlockRepository>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        policy: QuestionPolicy,
    ) -> Self {
        Self {
            blocks: BlockCheck::new(blocks, policy.block_scope),
            limits: RateLimitPolicy::new(Arc::clone(&users), Arc::clone(&clock), &policy),
            questions,
            users,
            notifier,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> &QuestionPolicy {
        &self.policy
    }

    /// Sends a question from `sender`.
    ///
    /// Once the rate limit has been checked, one post is spent whatever
    /// happens next. A shadow-banned sender gets `Suppressed`: nothing is
    /// stored and nobody is notified.
    #[instrument(skip(self, payload), fields(recipient = %payload.send_to))]
    pub async fn create_question(
        &self,
        sender: UserId,
        payload: NewQuestion,
    ) -> Result<CreateOutcome> {
        rules::valid_target_id(payload.send_to)?;
        rules::not_sending_to_self(payload.send_to, sender)?;
        rules::content_valid(&payload.content, &self.policy)?;

        self.blocks
            .ensure_not_blocked(sender, payload.send_to)
            .await?;

        let recipient = self.require_user(payload.send_to).await?;
        let author = self.require_user(sender).await?;

        if self.limits.reached_limit(&author) {
            return Err(DomainError::RateLimited);
        }
        self.limits.decrement(&author).await?;

        if author.is_shadow_banned {
            info!("sender is shadow-banned, question suppressed");
            return Ok(CreateOutcome::Suppressed);
        }

        let now = self.clock.now();
        let question = Question::new(
            payload.content,
            payload.send_to,
            sender,
            payload.is_anonymous,
            now,
        );
        let notice = recipient
            .enable_email_notifications
            .then(|| new_question_notice(&question, &recipient, &author));

        let id = self.questions.create(question).await?;
        info!(question_id = %id, "question created");

        if let Some(notice) = notice {
            self.dispatch_notice(notice);
        }

        self.users.update_last_published_at(sender, now).await?;
        self.limits.maybe_reset(&author).await?;

        Ok(CreateOutcome::Created(id))
    }

    #[instrument(skip(self))]
    pub async fn find_question_by_id(
        &self,
        id: QuestionId,
        viewer: UserId,
    ) -> Result<QuestionView> {
        let question = rules::exists(self.questions.find_by_id(id).await?)?;
        rules::can_view(&question, viewer)?;

        let participants = if question.is_anonymous {
            Participants::default()
        } else {
            Participants {
                author: self.profile(question.sent_by).await?,
                recipient: self.profile(question.send_to).await?,
            }
        };
        Ok(map_anonymous_fields(question, participants, true))
    }

    /// One page of the viewer's questions. Unset parameters default to page
    /// 1, ascending, `all`.
    #[instrument(skip(self))]
    pub async fn get_all_questions(
        &self,
        viewer: UserId,
        query: PageQuery,
    ) -> Result<PaginatedQuestions> {
        let request = PageRequest::from_query(query, self.policy.page_size);
        let (questions, total) = self.questions.paginate(viewer, request).await?;

        let mut profiles: HashMap<UserId, Option<UserProfile>> = HashMap::new();
        let mut items = Vec::with_capacity(questions.len());
        for question in questions {
            let participants = if question.is_anonymous {
                Participants::default()
            } else {
                Participants {
                    author: self.cached_profile(&mut profiles, question.sent_by).await?,
                    recipient: self.cached_profile(&mut profiles, question.send_to).await?,
                }
            };
            items.push(map_anonymous_fields(question, participants, false));
        }

        Ok(PaginatedQuestions {
            items,
            total,
            page: request.page,
            page_size: request.page_size,
        })
    }

    /// Hard delete by the author.
    #[instrument(skip(self))]
    pub async fn delete_question(&self, id: QuestionId, user: UserId) -> Result<()> {
        let question = rules::exists(self.questions.find_by_id(id).await?)?;
        rules::can_delete(&question, user)?;

        self.questions.delete(id).await?;
        info!("question deleted");
        Ok(())
    }

    /// Hides a received question. There is no way back.
    #[instrument(skip(self))]
    pub async fn hide_question(&self, id: QuestionId, user: UserId) -> Result<()> {
        let question = rules::exists(self.questions.find_by_id(id).await?)?;
        rules::can_hide(&question, user)?;
        rules::can_view(&question, user)?;
        rules::not_already_hidden(&question)?;

        self.questions.set_hidden(id).await?;
        info!("question hidden");
        Ok(())
    }

    #[instrument(skip(self, content))]
    pub async fn reply_question(&self, id: QuestionId, content: String, user: UserId) -> Result<()> {
        rules::content_valid(&content, &self.policy)?;
        let question = rules::exists(self.questions.find_by_id(id).await?)?;
        rules::can_view(&question, user)?;
        rules::not_already_replied(&question)?;
        rules::can_reply(&question, user)?;

        self.questions
            .set_reply(id, content, self.clock.now())
            .await?;
        info!("question replied");
        Ok(())
    }

    /// Replaces the reply, recording the previous and the new content in the
    /// history. Each edit uses two history slots.
    #[instrument(skip(self, content))]
    pub async fn edit_question_reply(
        &self,
        id: QuestionId,
        content: String,
        user: UserId,
    ) -> Result<()> {
        rules::content_valid(&content, &self.policy)?;
        let question = rules::exists(self.questions.find_by_id(id).await?)?;
        rules::can_view(&question, user)?;
        rules::can_reply(&question, user)?;
        rules::under_edit_limit(&question, self.policy.max_reply_history)?;
        rules::already_replied(&question)?;

        let now = self.clock.now();
        let previous = ReplyHistoryEntry::new(
            question.reply.unwrap_or_default(),
            question.replied_at.unwrap_or(now),
        );
        let next = ReplyHistoryEntry::new(content.clone(), now);

        self.questions
            .edit_reply(id, [previous, next], content, now)
            .await?;
        info!(
            history_len = question.replies_history.len() + 2,
            "question reply edited"
        );
        Ok(())
    }

    /// Clears the reply and its history. Either participant may do this.
    #[instrument(skip(self))]
    pub async fn remove_question_reply(&self, id: QuestionId, user: UserId) -> Result<()> {
        let question = rules::exists(self.questions.find_by_id(id).await?)?;
        rules::can_view(&question, user)?;
        rules::already_replied(&question)?;

        self.questions.clear_reply(id).await?;
        info!("question reply removed");
        Ok(())
    }

    async fn require_user(&self, id: UserId) -> Result<User> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or(DomainError::UserNotFound)
    }

    async fn profile(&self, id: UserId) -> Result<Option<UserProfile>> {
        let profile = self.users.find_by_id(id).await?.map(|u| u.profile());
        if profile.is_none() {
            warn!(user_id = %id, "profile missing for question participant");
        }
        Ok(profile)
    }

    async fn cached_profile(
        &self,
        cache: &mut HashMap<UserId, Option<UserProfile>>,
        id: UserId,
    ) -> Result<Option<UserProfile>> {
        if let Some(hit) = cache.get(&id) {
            return Ok(hit.clone());
        }
        let profile = self.profile(id).await?;
        cache.insert(id, profile.clone());
        Ok(profile)
    }

    /// Fire-and-forget: the request never waits on the transport and a
    /// failure only shows up in the logs.
    fn dispatch_notice(&self, notice: NewQuestionNotice) {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(
            async move {
                if let Err(err) = notifier.notify_new_question(notice).await {
                    warn!(error = %err, "new question notification failed");
                }
            }
            .in_current_span(),
        );
    }
}

fn new_question_notice(question: &Question, recipient: &User, author: &User) -> NewQuestionNotice {
    NewQuestionNotice {
        recipient_id: recipient.id,
        recipient_email: recipient.email.clone(),
        sender: (!question.is_anonymous).then(|| author.profile()),
        content: question.content.clone(),
        is_anonymous: question.is_anonymous,
    }
}
