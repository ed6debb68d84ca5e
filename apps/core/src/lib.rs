//! HealthDesk core: personal health records, uploaded documents, PDF
//! exports and a chat assistant that only answers health questions.

pub mod assistant;
pub mod brain;
pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod fs_manager;
pub mod listing;
pub mod models;
pub mod storage;

#[cfg(test)]
mod tests;
