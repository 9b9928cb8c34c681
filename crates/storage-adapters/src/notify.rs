//! Notification transports.

use async_trait::async_trait;
use domains::{NewQuestionNotice, Notifier};
use tokio::sync::mpsc;
use tracing::info;

/// Writes a log line per notice. Stand-in until an email queue is wired.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_new_question(&self, notice: NewQuestionNotice) -> anyhow::Result<()> {
        info!(
            recipient_id = %notice.recipient_id,
            is_anonymous = notice.is_anonymous,
            "new question notification"
        );
        Ok(())
    }
}

/// Forwards notices into an mpsc channel, e.g. towards a queue publisher.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<NewQuestionNotice>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<NewQuestionNotice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn notify_new_question(&self, notice: NewQuestionNotice) -> anyhow::Result<()> {
        self.tx
            .send(notice)
            .map_err(|_| anyhow::anyhow!("notification channel closed"))
    }
}
