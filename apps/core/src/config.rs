//! Runtime configuration read from the environment (optionally seeded from `.env`).

use std::env;
use std::path::PathBuf;
use url::Url;

use crate::error::AppError;
use crate::fs_manager::PortablePathManager;

pub const ENV_CHAT_URL: &str = "HEALTHDESK_CHAT_URL";
pub const ENV_CHAT_TOKEN: &str = "HEALTHDESK_CHAT_TOKEN";
pub const ENV_DATA_DIR: &str = "HEALTHDESK_DATA_DIR";
pub const ENV_STORAGE_PUBLIC_URL: &str = "HEALTHDESK_STORAGE_PUBLIC_URL";
pub const ENV_LOG_FORMAT: &str = "HEALTHDESK_LOG_FORMAT";

pub const DEFAULT_STORAGE_PUBLIC_URL: &str = "http://localhost:54321";

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Endpoint of the chat function. `None` disables the assistant.
    pub chat_url: Option<Url>,
    /// Bearer token sent to the chat endpoint.
    pub chat_token: Option<String>,
    pub data_dir: PathBuf,
    /// Base of the public URLs handed out for stored objects.
    pub storage_public_url: Url,
    pub json_logs: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let chat_url = match non_empty_var(ENV_CHAT_URL) {
            Some(raw) => Some(parse_url(ENV_CHAT_URL, &raw)?),
            None => None,
        };

        let storage_public_url = parse_url(
            ENV_STORAGE_PUBLIC_URL,
            &non_empty_var(ENV_STORAGE_PUBLIC_URL)
                .unwrap_or_else(|| DEFAULT_STORAGE_PUBLIC_URL.to_string()),
        )?;

        let data_dir = non_empty_var(ENV_DATA_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(PortablePathManager::default_data_dir);

        let json_logs = non_empty_var(ENV_LOG_FORMAT)
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        Ok(Self {
            chat_url,
            chat_token: non_empty_var(ENV_CHAT_TOKEN),
            data_dir,
            storage_public_url,
            json_logs,
        })
    }

    pub fn paths(&self) -> PortablePathManager {
        PortablePathManager::new(&self.data_dir)
    }

    /// The chat endpoint, or a configuration error naming the missing variable.
    pub fn require_chat_url(&self) -> Result<&Url, AppError> {
        self.chat_url
            .as_ref()
            .ok_or_else(|| AppError::Config(format!("{} is not set", ENV_CHAT_URL)))
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_url(name: &str, raw: &str) -> Result<Url, AppError> {
    let url = Url::parse(raw).map_err(|e| AppError::Config(format!("{}: {}", name, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(AppError::Config(format!(
            "{}: unsupported scheme '{}'",
            name, other
        ))),
    }
}
