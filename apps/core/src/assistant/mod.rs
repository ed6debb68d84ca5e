//! Health chat assistant: backend client, conversation history, session
//! orchestration and reply rendering.

pub mod backend;
pub mod history;
pub mod render;
pub mod session;

pub use backend::{ChatBackend, HttpChatBackend};
pub use history::{HistoryStore, HISTORY_KEY};
pub use render::{parse_message, render_message};
pub use session::{
    render_chat_message, ChatSession, MessageIdGenerator, BACKEND_ERROR_MESSAGE,
    OFF_TOPIC_WARNING,
};
