//! Test Module
//!
//! Cross-module test suites for the HealthDesk core.
//!
//! ## Test Categories
//! - `brain_tests`: dictionary-wide classifier properties
//! - `database_tests`: CRUD for every record table, links, metric series
//! - `session_tests`: conversation turns against mock backends
//! - `storage_tests`: uploads, URL derivation, downloads and deletion
//! - `integration_tests`: full workflows across config, HTTP backend, storage and export

pub mod database_tests;
