//! Maintenance assistant chat with an offline fallback.

use crate::error::{Error, Result};
use crate::models::{ChatMessage, ChatRole, ConversationId};
use crate::remote::{ChatMessageDto, RemoteGateway};
use crate::services::LocalStore;
use crate::util::now_millis;

/// Something that can answer the latest user message of a conversation
#[allow(async_fn_in_trait)]
pub trait ReplyBackend {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    async fn reply(&self, conversation: &ConversationId, history: &[ChatMessage]) -> Result<String>;
}

/// Replies produced by the backend assistant
#[derive(Debug, Clone)]
pub struct RemoteReplyBackend<G> {
    gateway: G,
}

impl<G> RemoteReplyBackend<G> {
    pub const fn new(gateway: G) -> Self {
        Self { gateway }
    }
}

impl<G: RemoteGateway> ReplyBackend for RemoteReplyBackend<G> {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn reply(&self, conversation: &ConversationId, history: &[ChatMessage]) -> Result<String> {
        let messages = history.iter().map(ChatMessageDto::from).collect::<Vec<_>>();
        self.gateway.chat_reply(conversation, &messages).await
    }
}

/// Canned answers picked by keyword, used when the backend is unreachable
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineReplyBackend;

const OFFLINE_RULES: &[(&[&str], &str)] = &[
    (
        &["warning light", "dashboard light", "check engine"],
        "A lit warning light needs attention. Red lights mean stop safely and switch off the engine; amber lights mean book a check soon. The Manual screen explains each light.",
    ),
    (
        &["oil"],
        "Most engines need an oil change every 10,000 to 15,000 km or once a year. Check the level monthly with the engine cold and the car on level ground.",
    ),
    (
        &["brake"],
        "Grinding or squealing brakes, a soft pedal or pulling to one side all need a prompt inspection. Brake fluid is usually replaced every two years.",
    ),
    (
        &["tire", "tyre"],
        "Check tyre pressure monthly and rotate the tyres roughly every 10,000 km. Replace them when the tread is below 3 mm.",
    ),
    (
        &["battery"],
        "Slow cranking or dim lights point to a weak battery. Most batteries last three to five years; a workshop can test it in a few minutes.",
    ),
    (
        &["coolant", "overheat"],
        "If the temperature gauge climbs, stop and let the engine cool before opening the coolant reservoir. Top up with the coolant type in your owner's manual.",
    ),
];

const OFFLINE_DEFAULT: &str = "I can't reach the assistant right now. Your message is saved; in the meantime check the Manual screen or your maintenance list.";

impl OfflineReplyBackend {
    fn answer(text: &str) -> &'static str {
        let text = text.to_lowercase();
        OFFLINE_RULES
            .iter()
            .find(|(keywords, _)| keywords.iter().any(|keyword| text.contains(keyword)))
            .map_or(OFFLINE_DEFAULT, |(_, answer)| answer)
    }
}

impl ReplyBackend for OfflineReplyBackend {
    fn name(&self) -> &'static str {
        "offline"
    }

    async fn reply(&self, _conversation: &ConversationId, history: &[ChatMessage]) -> Result<String> {
        let last = history
            .iter()
            .rev()
            .find(|message| message.role == ChatRole::User)
            .map_or("", |message| message.content.as_str());
        Ok(Self::answer(last).to_string())
    }
}

/// Tries `primary` and falls back to `secondary` on any error.
///
/// When both fail the secondary's error is returned.
#[derive(Debug, Clone)]
pub struct FallbackChain<P, S> {
    primary: P,
    secondary: S,
}

impl<P, S> FallbackChain<P, S> {
    pub const fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }
}

impl<P: ReplyBackend, S: ReplyBackend> ReplyBackend for FallbackChain<P, S> {
    fn name(&self) -> &'static str {
        self.primary.name()
    }

    async fn reply(&self, conversation: &ConversationId, history: &[ChatMessage]) -> Result<String> {
        match self.primary.reply(conversation, history).await {
            Ok(reply) => Ok(reply),
            Err(error) => {
                tracing::warn!(
                    "{} reply failed ({error}); falling back to {}",
                    self.primary.name(),
                    self.secondary.name()
                );
                self.secondary.reply(conversation, history).await
            }
        }
    }
}

/// Stores the conversation and asks the backend chain for replies
pub struct ChatService<B> {
    store: LocalStore,
    backend: B,
}

impl<B: ReplyBackend> ChatService<B> {
    pub const fn new(store: LocalStore, backend: B) -> Self {
        Self { store, backend }
    }

    /// Send `text` and return the assistant's reply.
    ///
    /// The user message is stored first and stays pending if no reply could
    /// be produced.
    pub async fn send(&self, conversation: &ConversationId, text: &str) -> Result<ChatMessage> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::InvalidInput("Message cannot be empty".into()));
        }

        let question = ChatMessage::from_user(*conversation, text, now_millis());
        self.store.append_message(&question).await?;

        let history = self.store.conversation(conversation).await?;
        self.answer(&question, &history).await
    }

    /// Ask again for every unanswered question of `conversation`, oldest
    /// first, and return how many got a reply.
    ///
    /// Stops at the first question that still gets none.
    pub async fn retry_pending(&self, conversation: &ConversationId) -> Result<usize> {
        let pending = self.store.pending_messages(conversation).await?;
        for question in &pending {
            let history = self.store.conversation(conversation).await?;
            let asked = history
                .iter()
                .position(|message| message.id == question.id)
                .map_or(history.len(), |index| index + 1);
            tracing::debug!("Retrying unanswered message {}", question.id);
            self.answer(question, &history[..asked]).await?;
        }
        Ok(pending.len())
    }

    async fn answer(&self, question: &ChatMessage, history: &[ChatMessage]) -> Result<ChatMessage> {
        let conversation = &question.conversation_id;
        let content = self.backend.reply(conversation, history).await?;

        // Replies sort after the question even within the same millisecond
        let sent_at = now_millis().max(question.sent_at + 1);
        let answer = ChatMessage::from_assistant(*conversation, content, sent_at);
        self.store.append_message(&answer).await?;
        self.store.mark_message_sent(&question.id).await?;
        Ok(answer)
    }

    /// Messages of the conversation in send order
    pub async fn history(&self, conversation: &ConversationId) -> Result<Vec<ChatMessage>> {
        self.store.conversation(conversation).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::fake::FakeGateway;
    use pretty_assertions::assert_eq;

    struct Failing(&'static str);

    impl ReplyBackend for Failing {
        fn name(&self) -> &'static str {
            self.0
        }

        async fn reply(&self, _: &ConversationId, _: &[ChatMessage]) -> Result<String> {
            Err(Error::InvalidInput(format!("{} is down", self.0)))
        }
    }

    fn history(text: &str) -> Vec<ChatMessage> {
        vec![ChatMessage::from_user(ConversationId::new(), text, 1)]
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn offline_backend_matches_keywords() {
        let backend = OfflineReplyBackend;
        let conversation = ConversationId::new();

        let reply = backend
            .reply(&conversation, &history("When should I change the OIL?"))
            .await
            .unwrap();
        assert!(reply.contains("oil change"));

        let reply = backend
            .reply(&conversation, &history("the check engine light is on, also oil?"))
            .await
            .unwrap();
        assert!(reply.contains("warning light"));

        let reply = backend
            .reply(&conversation, &history("hello"))
            .await
            .unwrap();
        assert_eq!(reply, OFFLINE_DEFAULT);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn fallback_uses_secondary_when_primary_fails() {
        let chain = FallbackChain::new(Failing("remote"), OfflineReplyBackend);
        let reply = chain
            .reply(&ConversationId::new(), &history("battery is dead"))
            .await
            .unwrap();
        assert!(reply.contains("battery"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn fallback_reports_secondary_error_when_both_fail() {
        let chain = FallbackChain::new(Failing("first"), Failing("second"));
        let error = chain
            .reply(&ConversationId::new(), &history("hi"))
            .await
            .unwrap_err();
        assert_eq!(error.user_message(), "second is down");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn send_stores_both_sides_and_clears_pending() {
        let store = LocalStore::open_in_memory().await.unwrap();
        let gateway = FakeGateway::new();
        gateway.state().reply = Some("Rotate every 10,000 km".to_string());
        let service = ChatService::new(
            store.clone(),
            FallbackChain::new(RemoteReplyBackend::new(gateway), OfflineReplyBackend),
        );
        let conversation = ConversationId::new();

        let answer = service.send(&conversation, "  tyre rotation?  ").await.unwrap();

        assert_eq!(answer.role, ChatRole::Assistant);
        assert_eq!(answer.content, "Rotate every 10,000 km (1 messages)");
        let messages = service.history(&conversation).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "tyre rotation?");
        assert!(store.pending_messages(&conversation).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_reply_leaves_user_message_pending() {
        let store = LocalStore::open_in_memory().await.unwrap();
        let service = ChatService::new(store.clone(), Failing("remote"));
        let conversation = ConversationId::new();

        assert!(service.send(&conversation, "anyone?").await.is_err());

        let pending = store.pending_messages(&conversation).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].content, "anyone?");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn retry_answers_questions_left_pending() {
        let store = LocalStore::open_in_memory().await.unwrap();
        let conversation = ConversationId::new();
        let down = ChatService::new(store.clone(), Failing("remote"));
        assert!(down.send(&conversation, "battery keeps dying").await.is_err());
        assert!(down.retry_pending(&conversation).await.is_err());
        assert_eq!(store.pending_messages(&conversation).await.unwrap().len(), 1);

        let up = ChatService::new(store.clone(), OfflineReplyBackend);
        assert_eq!(up.retry_pending(&conversation).await.unwrap(), 1);

        assert!(store.pending_messages(&conversation).await.unwrap().is_empty());
        let messages = up.history(&conversation).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].role, ChatRole::Assistant);
        assert!(messages[1].content.contains("battery"));
        assert_eq!(up.retry_pending(&conversation).await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn blank_message_is_rejected() {
        let store = LocalStore::open_in_memory().await.unwrap();
        let service = ChatService::new(store.clone(), OfflineReplyBackend);
        let conversation = ConversationId::new();
        assert!(matches!(
            service.send(&conversation, "   ").await,
            Err(Error::InvalidInput(_))
        ));
        assert!(store.conversation(&conversation).await.unwrap().is_empty());
    }
}
