//! Shared E2E test helpers.
//!
//! Provides a test configuration builder, a scripted mock shell channel,
//! a mock browser and a mock infrastructure that records every side
//! effect into one shared journal.

pub mod config;
pub mod journal;
pub mod mock_browser;
pub mod mock_infra;
pub mod mock_shell;
