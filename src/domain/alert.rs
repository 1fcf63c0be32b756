//! Alert rule model.
//!
//! Every rule, built-in or user-supplied, is an [`AlertRule`]: a name, a
//! severity, a message template and a [`RuleKind`] that turns a
//! [`PerformanceReport`] into zero or more [`Trigger`]s.
//!
//! Message templates understand these placeholders:
//! - `{rule}`: rule name
//! - `{ticker}`: ticker of the trigger, or `portfolio`
//! - `{date}`: trigger date, `YYYY-MM-DD`
//! - `{value}`: triggering value, 4 decimals
//! - `{pct}` / `{abs_pct}`: value as a percentage, 2 decimals

use crate::domain::error::RuleEvaluationError;
use crate::domain::metrics::PerformanceReport;
use chrono::NaiveDate;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unknown severity: {0} (expected info, warning or critical)")]
pub struct UnknownSeverity(pub String);

impl FromStr for Severity {
    type Err = UnknownSeverity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "warning" | "warn" => Ok(Severity::Warning),
            "critical" => Ok(Severity::Critical),
            other => Err(UnknownSeverity(other.to_string())),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
        };
        f.write_str(label)
    }
}

/// A (date, value) pair a rule fired on. `ticker` is `None` for
/// portfolio-level rules.
#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    pub date: NaiveDate,
    pub value: f64,
    pub ticker: Option<String>,
}

impl Trigger {
    pub fn portfolio(date: NaiveDate, value: f64) -> Self {
        Self {
            date,
            value,
            ticker: None,
        }
    }

    pub fn for_ticker(ticker: &str, date: NaiveDate, value: f64) -> Self {
        Self {
            date,
            value,
            ticker: Some(ticker.to_string()),
        }
    }
}

/// User-supplied rule logic. An `Err` carries the failure reason.
pub type CustomPredicate = Box<dyn Fn(&PerformanceReport) -> Result<Vec<Trigger>, String>>;

pub enum RuleKind {
    /// Fires per (ticker, date) when the daily return is `<= -threshold`.
    SingleDayDrop { threshold: f64 },
    /// Fires on every date the portfolio value `initial_value * C[t]` is below `floor`.
    PortfolioFloor { initial_value: f64, floor: f64 },
    /// Fires on every date the cumulative return `C[t] - 1` is `<= -threshold`.
    PortfolioDrop { threshold: f64 },
    Custom(CustomPredicate),
}

impl fmt::Debug for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleKind::SingleDayDrop { threshold } => f
                .debug_struct("SingleDayDrop")
                .field("threshold", threshold)
                .finish(),
            RuleKind::PortfolioFloor {
                initial_value,
                floor,
            } => f
                .debug_struct("PortfolioFloor")
                .field("initial_value", initial_value)
                .field("floor", floor)
                .finish(),
            RuleKind::PortfolioDrop { threshold } => f
                .debug_struct("PortfolioDrop")
                .field("threshold", threshold)
                .finish(),
            RuleKind::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[derive(Debug)]
pub struct AlertRule {
    pub name: String,
    pub severity: Severity,
    pub message_template: String,
    pub kind: RuleKind,
}

impl AlertRule {
    pub fn single_day_drop(threshold: f64) -> Self {
        Self {
            name: "single_day_drop".into(),
            severity: Severity::Warning,
            message_template: format!(
                "{{ticker}} dropped {{abs_pct}}% in a single day on {{date}}, exceeding the {:.2}% threshold",
                threshold * 100.0
            ),
            kind: RuleKind::SingleDayDrop { threshold },
        }
    }

    pub fn portfolio_floor(initial_value: f64, floor: f64) -> Self {
        Self {
            name: "portfolio_floor".into(),
            severity: Severity::Critical,
            message_template: format!(
                "Portfolio value {{value}} on {{date}} is below the floor of {:.2}",
                floor
            ),
            kind: RuleKind::PortfolioFloor {
                initial_value,
                floor,
            },
        }
    }

    pub fn portfolio_drop(threshold: f64) -> Self {
        Self {
            name: "portfolio_drop".into(),
            severity: Severity::Critical,
            message_template: format!(
                "Portfolio is down {{abs_pct}}% from its starting value on {{date}}, exceeding the {:.2}% threshold",
                threshold * 100.0
            ),
            kind: RuleKind::PortfolioDrop { threshold },
        }
    }

    pub fn custom<F>(name: &str, severity: Severity, message_template: &str, predicate: F) -> Self
    where
        F: Fn(&PerformanceReport) -> Result<Vec<Trigger>, String> + 'static,
    {
        Self {
            name: name.to_string(),
            severity,
            message_template: message_template.to_string(),
            kind: RuleKind::Custom(Box::new(predicate)),
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_message(mut self, template: &str) -> Self {
        self.message_template = template.to_string();
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Runs the rule against a report. Triggers come back in the order the
    /// rule kind produced them; the engine orders them by date.
    pub fn triggers(&self, report: &PerformanceReport) -> Result<Vec<Trigger>, RuleEvaluationError> {
        let fail = |reason: String| RuleEvaluationError::new(self.name.clone(), reason);

        match &self.kind {
            RuleKind::SingleDayDrop { threshold } => {
                let threshold = positive_fraction(*threshold).map_err(fail)?;
                Ok(report
                    .ticker_returns
                    .iter()
                    .flat_map(|tr| {
                        tr.returns
                            .iter()
                            .filter(move |r| r.value <= -threshold)
                            .map(move |r| Trigger::for_ticker(&tr.ticker, r.date, r.value))
                    })
                    .collect())
            }
            RuleKind::PortfolioFloor {
                initial_value,
                floor,
            } => {
                if !initial_value.is_finite() || *initial_value <= 0.0 {
                    return Err(fail(format!("initial value must be positive, got {initial_value}")));
                }
                if !floor.is_finite() {
                    return Err(fail(format!("floor must be finite, got {floor}")));
                }
                Ok(report
                    .portfolio_value(*initial_value)
                    .into_iter()
                    .filter(|v| v.value < *floor)
                    .map(|v| Trigger::portfolio(v.date, v.value))
                    .collect())
            }
            RuleKind::PortfolioDrop { threshold } => {
                let threshold = positive_fraction(*threshold).map_err(fail)?;
                Ok(report
                    .cumulative_returns
                    .iter()
                    .map(|c| (c.date, c.value - 1.0))
                    .filter(|&(_, change)| change <= -threshold)
                    .map(|(date, change)| Trigger::portfolio(date, change))
                    .collect())
            }
            RuleKind::Custom(predicate) => {
                panic::catch_unwind(AssertUnwindSafe(|| predicate(report)))
                    .map_err(|payload| fail(format!("panicked: {}", panic_message(&*payload))))?
                    .map_err(fail)
            }
        }
    }

    /// Fills placeholders in a single pass. Substituted text is never
    /// rescanned and unknown `{...}` tokens are kept verbatim.
    pub fn render_message(&self, trigger: &Trigger) -> String {
        let mut out = String::with_capacity(self.message_template.len());
        let mut rest = self.message_template.as_str();

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let tail = &rest[open..];
            let resolved = tail
                .find('}')
                .and_then(|close| Some((self.placeholder(&tail[1..close], trigger)?, close)));
            match resolved {
                Some((value, close)) => {
                    out.push_str(&value);
                    rest = &tail[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = &tail[1..];
                }
            }
        }
        out.push_str(rest);
        out
    }

    fn placeholder(&self, key: &str, trigger: &Trigger) -> Option<String> {
        let value = match key {
            "rule" => self.name.clone(),
            "ticker" => trigger.ticker.as_deref().unwrap_or("portfolio").to_string(),
            "date" => trigger.date.format("%Y-%m-%d").to_string(),
            "value" => format!("{:.4}", trigger.value),
            "abs_pct" => format!("{:.2}", trigger.value.abs() * 100.0),
            "pct" => format!("{:.2}", trigger.value * 100.0),
            _ => return None,
        };
        Some(value)
    }
}

fn positive_fraction(threshold: f64) -> Result<f64, String> {
    if threshold.is_finite() && threshold > 0.0 {
        Ok(threshold)
    } else {
        Err(format!("threshold must be a positive fraction, got {threshold}"))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "unknown panic"
    }
}

/// A triggered rule instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub rule: String,
    pub severity: Severity,
    pub date: NaiveDate,
    pub ticker: Option<String>,
    pub message: String,
    pub value: f64,
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} {}: {}", self.severity, self.date, self.rule, self.message)
    }
}
