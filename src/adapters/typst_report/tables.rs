//! Table formatting for reports.
//!
//! Provides functions to generate Typst markup for:
//! - Key metrics table
//! - Portfolio composition table
//! - Latest per-ticker changes
//! - Monthly/yearly returns heatmap grid
//! - Alert table

use crate::domain::alert::{Alert, Severity};
use crate::domain::metrics::{DatedValue, LatestChange, PerformanceReport};
use chrono::Datelike;
use std::collections::BTreeMap;

pub struct MonthlyReturns {
    pub year: i32,
    pub month: u32,
    pub return_pct: f64,
}

/// Month-over-month returns from the cumulative-return path. Each month is
/// measured from the previous month's last level; the first month is
/// measured from the series start (`C[0] = 1`).
pub fn compute_monthly_returns(cumulative: &[DatedValue]) -> Vec<MonthlyReturns> {
    let Some(first) = cumulative.first() else {
        return Vec::new();
    };

    let mut month_end: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for point in cumulative {
        month_end.insert((point.date.year(), point.date.month()), point.value);
    }

    let mut prev = first.value;
    month_end
        .into_iter()
        .map(|((year, month), end)| {
            let return_pct = if prev > 0.0 { end / prev - 1.0 } else { 0.0 };
            prev = end;
            MonthlyReturns {
                year,
                month,
                return_pct,
            }
        })
        .collect()
}

pub fn format_returns_heatmap(returns: &[MonthlyReturns]) -> String {
    if returns.is_empty() {
        return "_No returns data available._\n".to_string();
    }

    let mut years: BTreeMap<i32, [Option<f64>; 12]> = BTreeMap::new();

    for r in returns {
        let entry = years.entry(r.year).or_insert([None; 12]);
        entry[(r.month - 1) as usize] = Some(r.return_pct);
    }

    let mut output = String::new();
    output.push_str("#table(\n");
    output.push_str("  columns: 14,\n");
    output.push_str("  [*Year*], [*Jan*], [*Feb*], [*Mar*], [*Apr*], [*May*], [*Jun*], ");
    output.push_str("[*Jul*], [*Aug*], [*Sep*], [*Oct*], [*Nov*], [*Dec*], [*YTD*],\n");

    for (year, monthly) in years.iter() {
        output.push_str(&format!("  [{}],", year));

        let mut ytd = 1.0_f64;
        for &opt_ret in monthly.iter() {
            if let Some(ret) = opt_ret {
                ytd *= 1.0 + ret;
                output.push_str(&format!(" {},", format_heatmap_cell(ret)));
            } else {
                output.push_str(" [-],");
            }
        }
        output.push_str(&format!(" {},\n", format_heatmap_cell(ytd - 1.0)));
    }

    output.push_str(")\n");
    output
}

/// Returns (fill_color, needs_white_text) for a given return value.
fn return_color(ret: f64) -> (&'static str, bool) {
    if ret >= 0.10 {
        ("rgb(\"#006400\")", true)
    } else if ret >= 0.02 {
        ("rgb(\"#90EE90\")", false)
    } else if ret > 0.0 {
        ("rgb(\"#E0FFE0\")", false)
    } else if ret == 0.0 {
        ("rgb(\"#FFFFFF\")", false)
    } else if ret > -0.02 {
        ("rgb(\"#FFE0E0\")", false)
    } else if ret > -0.10 {
        ("rgb(\"#FF4444\")", true)
    } else {
        ("rgb(\"#8B0000\")", true)
    }
}

fn format_pct(value: f64) -> String {
    format!("{:+.2}%", value * 100.0)
}

fn format_heatmap_cell(ret: f64) -> String {
    let (color, white_text) = return_color(ret);
    let formatted = format_pct(ret);
    if white_text {
        format!("table.cell(fill: {}, text(fill: white, [{}]))", color, formatted)
    } else {
        format!("table.cell(fill: {}, [{}])", color, formatted)
    }
}

pub fn render_metrics_table(report: &PerformanceReport) -> String {
    let rows = [
        ("Cumulative Return", format_pct(report.total_return)),
        (
            "Annualized Volatility",
            format!("{:.2}%", report.annualized_volatility * 100.0),
        ),
        ("Sharpe Ratio", format!("{:.2}", report.sharpe_ratio)),
        ("Sortino Ratio", format!("{:.2}", report.sortino_ratio)),
        ("Max Drawdown", format_pct(report.max_drawdown)),
        ("Trading Days", report.trading_days().to_string()),
    ];

    let mut out = String::from("#table(\n  columns: 2,\n  align: (left, right),\n");
    out.push_str("  [*Metric*], [*Value*],\n");
    for (label, value) in rows {
        out.push_str(&format!("  [{}], [{}],\n", label, value));
    }
    out.push_str(")\n");
    out
}

pub fn render_composition_table(weights: &[(String, f64)]) -> String {
    if weights.is_empty() {
        return "_No holdings._\n".to_string();
    }

    let mut out = String::from("#table(\n  columns: 2,\n  align: (left, right),\n");
    out.push_str("  [*Ticker*], [*% of Portfolio*],\n");
    for (ticker, weight) in weights {
        out.push_str(&format!("  [{}], [{:.2}%],\n", ticker, weight * 100.0));
    }
    out.push_str(")\n");
    out
}

pub fn render_latest_changes(latest: &[LatestChange]) -> String {
    if latest.is_empty() {
        return "_No recent prices._\n".to_string();
    }

    let mut out = String::from("#table(\n  columns: 4,\n  align: (left, left, right, right),\n");
    out.push_str("  [*Ticker*], [*Date*], [*Latest Price*], [*Change*],\n");
    for change in latest {
        let color = if change.change >= 0.0 { "green" } else { "red" };
        out.push_str(&format!(
            "  [{}], [{}], [{:.2}], text(fill: {}, [{}]),\n",
            change.ticker,
            change.date.format("%Y-%m-%d"),
            change.price,
            color,
            format_pct(change.change)
        ));
    }
    out.push_str(")\n");
    out
}

fn severity_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Info => "blue",
        Severity::Warning => "orange",
        Severity::Critical => "red",
    }
}

/// Typst treats these as markup inside content blocks.
fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '#' | '$' | '*' | '_' | '[' | ']' | '@' | '<' | '>' | '\\' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

pub fn render_alert_table(alerts: &[Alert]) -> String {
    if alerts.is_empty() {
        return "_No alerts triggered._\n".to_string();
    }

    let mut out = String::from("#table(\n  columns: 4,\n  align: (left, left, left, left),\n");
    out.push_str("  [*Severity*], [*Date*], [*Rule*], [*Message*],\n");
    for alert in alerts {
        out.push_str(&format!(
            "  text(fill: {}, [{}]), [{}], [{}], [{}],\n",
            severity_color(alert.severity),
            alert.severity,
            alert.date.format("%Y-%m-%d"),
            escape_markup(&alert.rule),
            escape_markup(&alert.message)
        ));
    }
    out.push_str(")\n");
    out
}
