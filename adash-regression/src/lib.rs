//! Altinity Dashboard regression suite library.
//!
//! This library exposes the suite internals for integration testing.
//! In production, `adash-regression` is used as a binary (main.rs).
//!
//! # Modules
//!
//! - [`cli`]: command-line flags applied over the loaded configuration
//! - [`logging`]: `tracing-subscriber` initialization
//! - [`error`]: binary-level error type and exit codes
//! - [`infra`]: host, VM shell and browser factories behind one trait
//! - [`context`]: per-scenario mutable state
//! - [`steps`]: the steps of the dashboard scenario
//! - [`suite`]: preflight, scenario construction and sequential execution
//! - [`output`]: text/JSON report rendering

pub mod cli;
pub mod context;
pub mod error;
pub mod infra;
pub mod logging;
pub mod output;
pub mod steps;
pub mod suite;
