use mcs_core::chat::{
    ChatService, FallbackChain, OfflineReplyBackend, RemoteReplyBackend, ReplyBackend,
};
use mcs_core::models::{ChatMessage, ChatRole, ConversationId};
use mcs_core::screens::ChatScreen;

use crate::commands::common::Context;
use crate::error::CliError;

/// Conversation used when `--conversation` is not given
pub const DEFAULT_CONVERSATION: &str = "00000000-0000-7000-8000-000000000001";

pub fn parse_conversation(raw: Option<&str>) -> Result<ConversationId, CliError> {
    let raw = raw.map_or(DEFAULT_CONVERSATION, str::trim);
    raw.parse::<ConversationId>()
        .map_err(|_| CliError::Rejected(format!("Invalid conversation ID: {raw}")))
}

pub fn format_message(message: &ChatMessage) -> String {
    let speaker = match message.role {
        ChatRole::User => "you",
        ChatRole::Assistant => "assistant",
    };
    let pending = if message.pending_create {
        " (unanswered)"
    } else {
        ""
    };
    format!("{speaker}{pending}: {}", message.content)
}

/// What a `chat` invocation asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatAction {
    Show,
    Clear,
    Retry,
    Send(String),
}

impl ChatAction {
    pub fn from_flags(message_parts: &[String], clear: bool, retry: bool) -> Self {
        if clear {
            Self::Clear
        } else if retry {
            Self::Retry
        } else if message_parts.is_empty() {
            Self::Show
        } else {
            Self::Send(message_parts.join(" "))
        }
    }
}

pub async fn run_chat(
    ctx: &Context,
    conversation: Option<&str>,
    action: ChatAction,
) -> Result<(), CliError> {
    let conversation = parse_conversation(conversation)?;

    match &action {
        ChatAction::Clear => {
            let removed = ctx.store.clear_conversation(&conversation).await?;
            println!("Removed {removed} message(s)");
            return Ok(());
        }
        ChatAction::Show => {
            let messages = ctx.store.conversation(&conversation).await?;
            if messages.is_empty() {
                println!("No messages yet.");
            }
            for message in &messages {
                println!("{}", format_message(message));
            }
            return Ok(());
        }
        ChatAction::Send(text) if text.trim().is_empty() => return Err(CliError::EmptyMessage),
        ChatAction::Send(_) | ChatAction::Retry => {}
    }

    let printed = match ctx.config.gateway()? {
        Some(gateway) => {
            let backend = FallbackChain::new(RemoteReplyBackend::new(gateway), OfflineReplyBackend);
            respond(ChatService::new(ctx.store.clone(), backend), conversation, action).await?
        }
        None => {
            let service = ChatService::new(ctx.store.clone(), OfflineReplyBackend);
            respond(service, conversation, action).await?
        }
    };
    if printed.is_empty() {
        println!("No unanswered messages.");
    }
    for message in &printed {
        println!("{}", format_message(message));
    }
    Ok(())
}

async fn respond<B: ReplyBackend>(
    service: ChatService<B>,
    conversation: ConversationId,
    action: ChatAction,
) -> Result<Vec<ChatMessage>, CliError> {
    match action {
        ChatAction::Send(text) => Ok(vec![converse(service, conversation, text).await?]),
        ChatAction::Retry => retry_unanswered(service, conversation).await,
        ChatAction::Show | ChatAction::Clear => Ok(Vec::new()),
    }
}

/// Send one message through the chat screen and return the reply.
pub async fn converse<B: ReplyBackend>(
    service: ChatService<B>,
    conversation: ConversationId,
    text: String,
) -> Result<ChatMessage, CliError> {
    let screen = ChatScreen::new(service, conversation);
    screen.load().await;
    screen.set_draft(text);
    screen.send().await;

    let state = screen.state();
    if let Some(error) = state.error {
        return Err(CliError::Rejected(error));
    }
    state
        .messages
        .into_iter()
        .rev()
        .find(|message| message.role == ChatRole::Assistant)
        .ok_or_else(|| CliError::Rejected("The assistant did not answer".to_string()))
}

/// Re-ask unanswered questions; returns the conversation from the first of
/// them on, or nothing when every question already has its answer.
pub async fn retry_unanswered<B: ReplyBackend>(
    service: ChatService<B>,
    conversation: ConversationId,
) -> Result<Vec<ChatMessage>, CliError> {
    let screen = ChatScreen::new(service, conversation);
    screen.load().await;
    let loaded = screen.state();
    if let Some(error) = loaded.error {
        return Err(CliError::Rejected(error));
    }
    let Some(first) = loaded.messages.iter().position(|message| message.pending_create) else {
        return Ok(Vec::new());
    };

    screen.retry().await;
    let state = screen.state();
    if let Some(error) = state.error {
        return Err(CliError::Rejected(error));
    }
    Ok(state.messages.into_iter().skip(first).collect())
}
