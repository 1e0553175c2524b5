//! Assistant chat screen

use super::{Reducer, StateHolder};
use crate::chat::{ChatService, ReplyBackend};
use crate::models::{ChatMessage, ConversationId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatState {
    pub conversation: ConversationId,
    pub draft: String,
    pub messages: Vec<ChatMessage>,
    pub sending: bool,
    pub error: Option<String>,
}

impl ChatState {
    #[must_use]
    pub fn new(conversation: ConversationId) -> Self {
        Self {
            conversation,
            draft: String::new(),
            messages: Vec::new(),
            sending: false,
            error: None,
        }
    }

    /// Whether the send button is enabled
    #[must_use]
    pub fn can_send(&self) -> bool {
        !self.sending && !self.draft.trim().is_empty()
    }

    /// Whether a question is still waiting for its answer
    #[must_use]
    pub fn has_unanswered(&self) -> bool {
        self.messages.iter().any(|message| message.pending_create)
    }
}

#[derive(Debug)]
pub enum ChatEvent {
    DraftChanged(String),
    HistoryLoaded(Vec<ChatMessage>),
    HistoryFailed(String),
    SendStarted,
    Sent(Vec<ChatMessage>),
    SendFailed {
        message: String,
        history: Option<Vec<ChatMessage>>,
    },
    /// A retry of unanswered questions ended; the draft is left alone
    RetryFinished {
        error: Option<String>,
        history: Option<Vec<ChatMessage>>,
    },
}

pub struct ChatReducer;

impl Reducer for ChatReducer {
    type State = ChatState;
    type Event = ChatEvent;

    fn reduce(state: &ChatState, event: ChatEvent) -> ChatState {
        match event {
            ChatEvent::DraftChanged(draft) => ChatState {
                draft,
                error: None,
                ..state.clone()
            },
            ChatEvent::HistoryLoaded(messages) => ChatState {
                messages,
                ..state.clone()
            },
            ChatEvent::HistoryFailed(message) => ChatState {
                error: Some(message),
                ..state.clone()
            },
            ChatEvent::SendStarted => ChatState {
                sending: true,
                error: None,
                ..state.clone()
            },
            ChatEvent::Sent(messages) => ChatState {
                draft: String::new(),
                messages,
                sending: false,
                error: None,
                ..state.clone()
            },
            // The question is already stored, so the draft is cleared either way
            ChatEvent::SendFailed { message, history } => ChatState {
                draft: String::new(),
                messages: history.unwrap_or_else(|| state.messages.clone()),
                sending: false,
                error: Some(message),
                ..state.clone()
            },
            ChatEvent::RetryFinished { error, history } => ChatState {
                messages: history.unwrap_or_else(|| state.messages.clone()),
                sending: false,
                error,
                ..state.clone()
            },
        }
    }
}

/// One conversation with the assistant
pub struct ChatScreen<B> {
    service: ChatService<B>,
    holder: StateHolder<ChatReducer>,
}

impl<B: ReplyBackend> ChatScreen<B> {
    #[must_use]
    pub fn new(service: ChatService<B>, conversation: ConversationId) -> Self {
        Self {
            service,
            holder: StateHolder::new(ChatState::new(conversation)),
        }
    }

    pub fn holder(&self) -> &StateHolder<ChatReducer> {
        &self.holder
    }

    #[must_use]
    pub fn state(&self) -> ChatState {
        self.holder.state()
    }

    pub fn set_draft(&self, draft: impl Into<String>) {
        self.holder.dispatch(ChatEvent::DraftChanged(draft.into()));
    }

    pub async fn load(&self) {
        let conversation = self.holder.state().conversation;
        match self.service.history(&conversation).await {
            Ok(messages) => self.holder.dispatch(ChatEvent::HistoryLoaded(messages)),
            Err(error) => self
                .holder
                .dispatch(ChatEvent::HistoryFailed(error.user_message())),
        }
    }

    /// Send the draft. Does nothing while a send is in flight.
    pub async fn send(&self) {
        let Some(state) = self.start_sending() else {
            return;
        };

        let result = self.service.send(&state.conversation, &state.draft).await;
        let history = self.service.history(&state.conversation).await;
        let event = match (result, history) {
            (Ok(_), Ok(messages)) => ChatEvent::Sent(messages),
            (Ok(_), Err(error)) => ChatEvent::SendFailed {
                message: error.user_message(),
                history: None,
            },
            (Err(error), history) => ChatEvent::SendFailed {
                message: error.user_message(),
                history: history.ok(),
            },
        };
        self.holder.dispatch(event);
    }

    /// Ask again for questions that never got an answer. Does nothing while
    /// a send is in flight.
    pub async fn retry(&self) {
        let Some(state) = self.start_sending() else {
            return;
        };

        let result = self.service.retry_pending(&state.conversation).await;
        let history = self.service.history(&state.conversation).await;
        let error = match (&result, &history) {
            (Err(error), _) | (Ok(_), Err(error)) => Some(error.user_message()),
            (Ok(_), Ok(_)) => None,
        };
        self.holder.dispatch(ChatEvent::RetryFinished {
            error,
            history: history.ok(),
        });
    }

    fn start_sending(&self) -> Option<ChatState> {
        self.holder
            .dispatch_if(|state| !state.sending, ChatEvent::SendStarted)
    }
}
