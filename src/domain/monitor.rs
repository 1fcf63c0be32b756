//! One refresh cycle: load prices, compute metrics, evaluate alerts.
//!
//! Nothing here outlives a call to [`run_cycle`]; every cycle builds its own
//! price table, report and alert list from the configuration it is given.

use crate::domain::alert::{Alert, AlertRule, Severity};
use crate::domain::alert_eval::evaluate_with_diagnostics;
use crate::domain::error::{DataError, PortwatchError, RuleEvaluationError};
use crate::domain::metrics::{MetricsConfig, PerformanceReport};
use crate::domain::universe::{load_universe, SkippedTicker};
use crate::domain::weights::WeightVector;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;

pub const DEFAULT_INITIAL_VALUE: f64 = 100_000.0;
pub const DEFAULT_SINGLE_DAY_DROP_THRESHOLD: f64 = 0.05;

#[derive(Debug, Clone, PartialEq)]
pub struct AlertConfig {
    pub single_day_drop_threshold: f64,
    pub single_day_drop_severity: Severity,
    /// Floor alert is disabled when unset.
    pub portfolio_floor_value: Option<f64>,
    pub portfolio_floor_severity: Severity,
    /// Drop-from-start alert is disabled when unset.
    pub portfolio_drop_threshold: Option<f64>,
    pub portfolio_drop_severity: Severity,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            single_day_drop_threshold: DEFAULT_SINGLE_DAY_DROP_THRESHOLD,
            single_day_drop_severity: Severity::Warning,
            portfolio_floor_value: None,
            portfolio_floor_severity: Severity::Critical,
            portfolio_drop_threshold: None,
            portfolio_drop_severity: Severity::Critical,
        }
    }
}

impl AlertConfig {
    /// Built-in rules in evaluation order: single-day drop, then portfolio
    /// floor and portfolio drop when configured.
    pub fn builtin_rules(&self, initial_value: f64) -> Vec<AlertRule> {
        let mut rules = vec![AlertRule::single_day_drop(self.single_day_drop_threshold)
            .with_severity(self.single_day_drop_severity)];

        if let Some(floor) = self.portfolio_floor_value {
            rules.push(
                AlertRule::portfolio_floor(initial_value, floor)
                    .with_severity(self.portfolio_floor_severity),
            );
        }
        if let Some(threshold) = self.portfolio_drop_threshold {
            rules.push(
                AlertRule::portfolio_drop(threshold).with_severity(self.portfolio_drop_severity),
            );
        }
        rules
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub tickers: Vec<String>,
    /// Equal weights over the loaded tickers when `None`.
    pub weights: Option<WeightVector>,
    pub initial_value: f64,
    pub metrics: MetricsConfig,
    pub alerts: AlertConfig,
}

#[derive(Debug)]
pub struct CycleOutput {
    pub report: PerformanceReport,
    pub alerts: Vec<Alert>,
    pub rule_failures: Vec<RuleEvaluationError>,
    pub skipped: Vec<SkippedTicker>,
}

/// Runs DataSource -> metrics -> alerts. `custom_rules` run after the
/// built-in rules, in the order given.
pub fn run_cycle(
    data_port: &dyn DataPort,
    config: &MonitorConfig,
    custom_rules: Vec<AlertRule>,
) -> Result<CycleOutput, PortwatchError> {
    let universe = load_universe(data_port, &config.tickers, config.start_date, config.end_date)?;

    let weights = match &config.weights {
        Some(w) => restrict_weights(w, &universe.skipped)?,
        None => WeightVector::equal(&universe.table),
    };

    let report = PerformanceReport::compute(&universe.table, &weights, &config.metrics)?;
    tracing::info!(
        start = %report.start_date,
        end = %report.end_date,
        days = report.trading_days(),
        "metrics computed"
    );

    let mut rules = config.alerts.builtin_rules(config.initial_value);
    rules.extend(custom_rules);
    let evaluation = evaluate_with_diagnostics(&report, &rules);
    tracing::info!(
        alerts = evaluation.alerts.len(),
        failed_rules = evaluation.failures.len(),
        "alerts evaluated"
    );

    Ok(CycleOutput {
        report,
        alerts: evaluation.alerts,
        rule_failures: evaluation.failures,
        skipped: universe.skipped,
    })
}

/// Drops weights for tickers the data source could not serve. Weights for
/// tickers that were never requested are kept and rejected downstream.
fn restrict_weights(
    weights: &WeightVector,
    skipped: &[SkippedTicker],
) -> Result<WeightVector, DataError> {
    let mut restricted = WeightVector::new();
    for (ticker, weight) in weights.iter() {
        if skipped.iter().any(|s| s.ticker == ticker) {
            tracing::warn!(%ticker, "dropping weight for unavailable ticker");
        } else {
            restricted.set(ticker, weight)?;
        }
    }
    Ok(restricted)
}
