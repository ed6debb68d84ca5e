//! Persistent conversation history.
//!
//! The whole conversation is one JSON array stored in a single
//! `local_store` slot. Every save overwrites the slot.

use sqlx::sqlite::SqlitePool;
use tracing::{debug, info, warn};

use crate::database::local_store;
use crate::error::{AppError, AppResult};
use crate::models::Message;

/// Slot holding the assistant conversation.
pub const HISTORY_KEY: &str = "health_chat_history";

#[derive(Debug, Clone)]
pub struct HistoryStore {
    pool: SqlitePool,
}

impl HistoryStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Saved conversation in order; empty when nothing was saved yet.
    pub async fn load(&self) -> AppResult<Vec<Message>> {
        let Some(raw) = local_store::get_value(&self.pool, HISTORY_KEY).await? else {
            debug!("No saved conversation");
            return Ok(Vec::new());
        };

        let messages: Vec<Message> = serde_json::from_str(&raw).map_err(|e| {
            warn!(error = %e, "Saved conversation is corrupted");
            AppError::Validation(format!("corrupted chat history: {e}"))
        })?;

        debug!(count = messages.len(), "Conversation loaded");
        Ok(messages)
    }

    /// Overwrite the saved conversation.
    pub async fn save(&self, messages: &[Message]) -> AppResult<()> {
        let raw = serde_json::to_string(messages)?;
        local_store::put_value(&self.pool, HISTORY_KEY, &raw).await?;
        debug!(count = messages.len(), "Conversation saved");
        Ok(())
    }

    pub async fn clear(&self) -> AppResult<()> {
        local_store::remove_value(&self.pool, HISTORY_KEY).await?;
        info!("Conversation cleared");
        Ok(())
    }
}
