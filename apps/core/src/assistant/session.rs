//! Conversation orchestration: topic gating, backend calls and
//! write-through persistence of the history.

use chrono::Utc;
use tracing::{error, info, instrument};

use super::backend::{ChatBackend, HttpChatBackend};
use super::history::HistoryStore;
use super::render::{render_message, render_plain};
use crate::brain::classify;
use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::models::{Message, Sender};

/// Reply given instead of forwarding an off-topic question.
pub const OFF_TOPIC_WARNING: &str = "I'm your health assistant, so I can only help with \
health-related questions: symptoms, medications, lab results, nutrition, fitness or \
mental well-being. Could you rephrase your question around your health?";

/// Reply given when the chat backend fails.
pub const BACKEND_ERROR_MESSAGE: &str = "Sorry, something went wrong. Please try again.";

/// Hands out strictly increasing message ids.
///
/// Ids follow the wall clock in milliseconds when it moves forward and fall
/// back to `previous + 1` otherwise, so two messages created in the same
/// millisecond never share an id.
#[derive(Debug, Clone)]
pub struct MessageIdGenerator {
    last: i64,
}

impl MessageIdGenerator {
    /// Start above `last_id` (use 0 for an empty history).
    pub fn after(last_id: i64) -> Self {
        Self { last: last_id }
    }

    pub fn next_id(&mut self) -> i64 {
        let now = Utc::now().timestamp_millis();
        self.last = now.max(self.last.saturating_add(1));
        self.last
    }
}

/// HTML for one message. Only assistant replies are read as markdown.
pub fn render_chat_message(message: &Message) -> AppResult<String> {
    match message.sender {
        Sender::Assistant => render_message(&message.text),
        Sender::User => render_plain(&message.text),
    }
}

/// One user's conversation with the health assistant.
///
/// Holds the in-memory history and writes it through to the store after
/// every appended message.
pub struct ChatSession<B: ChatBackend> {
    store: HistoryStore,
    backend: B,
    messages: Vec<Message>,
    ids: MessageIdGenerator,
}

impl<B: ChatBackend> ChatSession<B> {
    /// Load the saved conversation and resume it.
    pub async fn open(store: HistoryStore, backend: B) -> AppResult<Self> {
        let messages = store.load().await?;
        let last_id = messages.iter().map(|m| m.id).max().unwrap_or(0);
        info!(messages = messages.len(), "Chat session opened");

        Ok(Self {
            store,
            backend,
            messages,
            ids: MessageIdGenerator::after(last_id),
        })
    }

    pub fn history(&self) -> &[Message] {
        &self.messages
    }

    /// Run one conversation turn and return the reply appended last.
    ///
    /// The user message is saved before anything else happens. Off-topic
    /// questions get [`OFF_TOPIC_WARNING`] without reaching the backend; a
    /// backend failure is logged and answered with [`BACKEND_ERROR_MESSAGE`].
    #[instrument(skip_all)]
    pub async fn send(&mut self, text: &str) -> AppResult<Message> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::Validation("message is empty".to_string()));
        }

        self.append(text.to_string(), Sender::User, false).await?;

        let verdict = classify(text);
        if !verdict.related {
            info!(reason = ?verdict.reason, "Off-topic question declined");
            return self
                .append(OFF_TOPIC_WARNING.to_string(), Sender::Assistant, true)
                .await;
        }

        let reply = match self.backend.send(text).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(error = %e, "Chat backend failed");
                BACKEND_ERROR_MESSAGE.to_string()
            }
        };
        self.append(reply, Sender::Assistant, false).await
    }

    /// Drop the whole conversation, in memory and on disk.
    pub async fn clear(&mut self) -> AppResult<()> {
        self.store.clear().await?;
        self.messages.clear();
        Ok(())
    }

    /// HTML for one message, see [`render_chat_message`].
    pub fn render(&self, message: &Message) -> AppResult<String> {
        render_chat_message(message)
    }

    async fn append(
        &mut self,
        text: String,
        sender: Sender,
        is_off_topic_warning: bool,
    ) -> AppResult<Message> {
        let message = Message {
            id: self.ids.next_id(),
            text,
            sender,
            is_off_topic_warning,
        };
        self.messages.push(message.clone());
        if let Err(e) = self.store.save(&self.messages).await {
            // Memory never holds a message the store does not.
            self.messages.pop();
            return Err(e);
        }
        Ok(message)
    }
}

impl ChatSession<HttpChatBackend> {
    /// Resume the conversation against the configured chat endpoint.
    ///
    /// `Ok(None)` when no endpoint is configured: the assistant is off but
    /// records, exports and the saved history stay available.
    pub async fn from_config(config: &AppConfig, store: HistoryStore) -> AppResult<Option<Self>> {
        if config.chat_url.is_none() {
            info!("No chat endpoint configured, assistant disabled");
            return Ok(None);
        }

        let backend = HttpChatBackend::from_config(config)?;
        info!(endpoint = %backend.endpoint(), "Chat assistant enabled");
        Self::open(store, backend).await.map(Some)
    }
}
