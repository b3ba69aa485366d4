//! E2E integration tests for adash-regression.
//!
//! These tests run the full parameterized dashboard scenario against a
//! mock VM shell, mock host commands and a mock browser, validating step
//! ordering, guaranteed teardown, per-environment behavior and the UI flow.
//!
//! # Test Structure
//!
//! - `helpers/` -- Shared test utilities (config builder, mock shell, mock browser, mock infrastructure)
//! - `scenarios/` -- Test files organized by scenario
//!
//! # Running
//!
//! ```bash
//! cargo test -p adash-regression --test e2e
//! ```

mod helpers;
mod scenarios;
