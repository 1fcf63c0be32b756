//! Alert evaluation engine.
//!
//! # Evaluation semantics
//!
//! - Rules run in the order given.
//! - A rule's triggers are ordered by date. The sort is stable, so triggers
//!   on the same date keep the order the rule produced them.
//! - A rule that fails or panics is logged and skipped; later rules still run.

use crate::domain::alert::{Alert, AlertRule};
use crate::domain::error::RuleEvaluationError;
use crate::domain::metrics::PerformanceReport;

/// Alerts plus the rules that failed while producing them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    pub alerts: Vec<Alert>,
    pub failures: Vec<RuleEvaluationError>,
}

pub fn evaluate(report: &PerformanceReport, rules: &[AlertRule]) -> Vec<Alert> {
    evaluate_with_diagnostics(report, rules).alerts
}

pub fn evaluate_with_diagnostics(report: &PerformanceReport, rules: &[AlertRule]) -> Evaluation {
    let mut evaluation = Evaluation::default();

    for rule in rules {
        let mut triggers = match rule.triggers(report) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(rule = %rule.name, error = %e.reason, "alert rule skipped");
                evaluation.failures.push(e);
                continue;
            }
        };
        triggers.sort_by_key(|t| t.date);

        tracing::debug!(rule = %rule.name, count = triggers.len(), "alert rule evaluated");

        evaluation
            .alerts
            .extend(triggers.into_iter().map(|trigger| Alert {
                rule: rule.name.clone(),
                severity: rule.severity,
                date: trigger.date,
                message: rule.render_message(&trigger),
                ticker: trigger.ticker,
                value: trigger.value,
            }));
    }

    evaluation
}
