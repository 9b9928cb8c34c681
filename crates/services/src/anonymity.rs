//! Output-boundary projection of questions.
//!
//! Only the views built here ever leave the service. The stored `sent_by`
//! keeps driving authorization; it is dropped from the view of an anonymous
//! question whoever is looking, the recipient included.

use domains::{Question, QuestionView, UserProfile};

/// Profiles resolved for a question's participants.
#[derive(Debug, Default, Clone)]
pub struct Participants {
    pub author: Option<UserProfile>,
    pub recipient: Option<UserProfile>,
}

/// Builds the externally visible view of `question`.
///
/// Anonymous questions keep `id`, `content`, `is_anonymous`, `created_at`
/// and the reply fields; profiles, hidden flag and history are stripped.
/// `with_history` is false for paginated listings.
pub fn map_anonymous_fields(
    question: Question,
    participants: Participants,
    with_history: bool,
) -> QuestionView {
    if question.is_anonymous {
        return QuestionView {
            id: question.id,
            content: question.content,
            is_anonymous: true,
            created_at: question.created_at,
            reply: question.reply,
            is_replied: question.is_replied,
            replied_at: question.replied_at,
            sent_by: None,
            send_to: None,
            is_hidden_by_receiver: None,
            replies_history: None,
        };
    }

    QuestionView {
        id: question.id,
        content: question.content,
        is_anonymous: false,
        created_at: question.created_at,
        reply: question.reply,
        is_replied: question.is_replied,
        replied_at: question.replied_at,
        sent_by: participants.author,
        send_to: participants.recipient,
        is_hidden_by_receiver: Some(question.is_hidden_by_receiver),
        replies_history: with_history.then_some(question.replies_history),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domains::UserId;

    fn profile(id: UserId, nick: &str) -> UserProfile {
        UserProfile {
            id,
            nick: nick.into(),
            name: nick.to_uppercase(),
            avatar: None,
        }
    }

    fn participants(q: &Question) -> Participants {
        Participants {
            author: Some(profile(q.sent_by, "author")),
            recipient: Some(profile(q.send_to, "recipient")),
        }
    }

    #[test]
    fn anonymous_view_never_names_the_author() {
        let q = Question::new("who?".into(), UserId::new(), UserId::new(), true, Utc::now());
        let parts = participants(&q);
        let view = map_anonymous_fields(q.clone(), parts, true);

        assert!(view.sent_by.is_none());
        assert!(view.send_to.is_none());
        assert!(view.replies_history.is_none());

        let json = serde_json::to_value(&view).unwrap();
        let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        for key in &keys {
            assert!(
                [
                    "id",
                    "content",
                    "isAnonymous",
                    "createdAt",
                    "reply",
                    "isReplied",
                    "repliedAt"
                ]
                .contains(&key.as_str()),
                "unexpected field {key}"
            );
        }
        assert!(!json.to_string().contains(&q.sent_by.to_string()));
    }

    #[test]
    fn named_view_carries_profiles() {
        let q = Question::new("hi".into(), UserId::new(), UserId::new(), false, Utc::now());
        let view = map_anonymous_fields(q.clone(), participants(&q), false);
        assert_eq!(view.sent_by.as_ref().map(|p| p.id), Some(q.sent_by));
        assert_eq!(view.send_to.as_ref().map(|p| p.id), Some(q.send_to));
        assert_eq!(view.is_hidden_by_receiver, Some(false));
        assert!(view.replies_history.is_none());

        let with_history = map_anonymous_fields(q, Participants::default(), true);
        assert_eq!(with_history.replies_history, Some(Vec::new()));
    }
}
