//! E2E test scenarios.
//!
//! - `teardown_ordering`: releases run once, in reverse, whatever fails
//! - `environments`: per-distribution commands and suite-level isolation
//! - `ui_flow`: the dashboard click sequence and kubectl verification

mod teardown_ordering;
mod ui_flow;
