//! Typst report generation.
//!
//! Reads a Typst template (the built-in default or a custom file), resolves
//! every `{{PLACEHOLDER}}` marker with tables from [`tables`], and writes the
//! final `.typ` file.

pub mod default_template;
pub mod tables;

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::alert::Alert;
use crate::domain::error::PortwatchError;
use crate::domain::metrics::PerformanceReport;
use crate::ports::report_port::ReportPort;

/// Context for resolving template placeholders.
pub struct ReportContext<'a> {
    pub report: &'a PerformanceReport,
    pub alerts: &'a [Alert],
}

/// Resolve all `{{PLACEHOLDER}}`s in the given template string and return
/// the final Typst markup.
pub fn resolve(template: &str, ctx: &ReportContext) -> String {
    let mut output = template.to_string();

    let period = format!(
        "*Period:* {} to {} ({} trading days)\n",
        ctx.report.start_date.format("%Y-%m-%d"),
        ctx.report.end_date.format("%Y-%m-%d"),
        ctx.report.trading_days()
    );
    output = output.replace("{{PERIOD}}", &period);

    output = output.replace(
        "{{METRICS_TABLE}}",
        &tables::render_metrics_table(ctx.report),
    );
    output = output.replace(
        "{{COMPOSITION_TABLE}}",
        &tables::render_composition_table(&ctx.report.weights),
    );
    output = output.replace(
        "{{LATEST_CHANGES}}",
        &tables::render_latest_changes(&ctx.report.latest),
    );

    let monthly = tables::compute_monthly_returns(&ctx.report.cumulative_returns);
    let monthly_typst = if monthly.is_empty() {
        "_Insufficient data for monthly returns._".to_string()
    } else {
        tables::format_returns_heatmap(&monthly)
    };
    output = output.replace("{{MONTHLY_RETURNS}}", &monthly_typst);

    output = output.replace("{{ALERTS_TABLE}}", &tables::render_alert_table(ctx.alerts));

    output
}

/// [`ReportPort`] that writes resolved Typst markup to disk.
#[derive(Debug, Default)]
pub struct TypstReportAdapter {
    template_path: Option<PathBuf>,
}

impl TypstReportAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom template file instead of the built-in one.
    pub fn with_template(path: impl AsRef<Path>) -> Self {
        Self {
            template_path: Some(path.as_ref().to_path_buf()),
        }
    }

    fn load_template(&self) -> Result<String, PortwatchError> {
        match &self.template_path {
            Some(path) => Ok(fs::read_to_string(path)?),
            None => Ok(default_template::template().to_string()),
        }
    }
}

impl ReportPort for TypstReportAdapter {
    fn write(
        &self,
        report: &PerformanceReport,
        alerts: &[Alert],
        output_path: &str,
    ) -> Result<(), PortwatchError> {
        let template = self.load_template()?;
        let content = resolve(&template, &ReportContext { report, alerts });
        fs::write(output_path, content)?;
        tracing::info!(path = %output_path, "report written");
        Ok(())
    }
}
