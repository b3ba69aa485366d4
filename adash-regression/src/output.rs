//! Report rendering for text vs JSON output
//!
//! The suite report flows through [`OutputWriter`], which picks the format
//! from `general.report_format`.

use std::io::Write;

use serde::Serialize;

use adash_core::report::SuiteReport;
use adash_core::scenario::ScenarioOutcome;

use crate::error::RegressionError;

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    /// Parse `general.report_format`; anything but `"json"` renders as text.
    pub fn from_config(value: &str) -> Self {
        match value {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Writes payloads in the selected format.
pub struct OutputWriter {
    format: ReportFormat,
}

impl OutputWriter {
    pub fn new(format: ReportFormat) -> Self {
        Self { format }
    }

    /// Render a payload to stdout.
    pub fn render<T: Render + Serialize>(&self, payload: &T) -> Result<(), RegressionError> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        self.render_to(payload, &mut handle)
    }

    /// Render a payload to `w`.
    ///
    /// For `Text` format, delegates to `Render::render_text()`.
    /// For `Json` format, serialises via `serde_json`.
    pub fn render_to<T: Render + Serialize>(
        &self,
        payload: &T,
        w: &mut dyn Write,
    ) -> Result<(), RegressionError> {
        match self.format {
            ReportFormat::Text => {
                payload.render_text(w)?;
            }
            ReportFormat::Json => {
                serde_json::to_writer_pretty(&mut *w, payload)?;
                writeln!(w)?;
            }
        }
        Ok(())
    }
}

/// Human-readable text rendering.
pub trait Render {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()>;
}

impl Render for SuiteReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "adash regression")?;
        for (key, value) in &self.attributes {
            writeln!(w, "  {key}: {value}")?;
        }
        writeln!(w)?;

        for outcome in &self.outcomes {
            render_outcome(outcome, w)?;
        }

        writeln!(
            w,
            "{} passed, {} failed, {} total",
            self.passed_count(),
            self.failed_count(),
            self.outcomes.len()
        )
    }
}

fn render_outcome(outcome: &ScenarioOutcome, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(
        w,
        "[{}] {} ({:.1}s)",
        outcome.status,
        outcome.scenario,
        outcome.duration.as_secs_f64()
    )?;
    for step in &outcome.steps {
        writeln!(
            w,
            "    {:<8} {:<26} {}",
            step.role.keyword(),
            step.name,
            step.status
        )?;
    }
    if let Some(failure) = &outcome.error {
        writeln!(
            w,
            "    cause: {} ({}): {}",
            failure.step, failure.kind, failure.message
        )?;
    }
    for teardown in &outcome.teardown_errors {
        writeln!(
            w,
            "    teardown error: {} ({}): {}",
            teardown.step, teardown.kind, teardown.message
        )?;
    }
    writeln!(w)
}
