//! Domain error types.

use chrono::NaiveDate;

/// Malformed or insufficient price/weight input. Fatal to a metrics run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DataError {
    #[error("price table is empty")]
    EmptyTable,

    #[error("ticker symbol is empty")]
    EmptyTicker,

    #[error("duplicate ticker: {0}")]
    DuplicateTicker(String),

    #[error("invalid price for {ticker} on {date}: {value}")]
    InvalidPrice {
        ticker: String,
        date: NaiveDate,
        value: f64,
    },

    #[error("duplicate date {date} for {ticker}")]
    DuplicateDate { ticker: String, date: NaiveDate },

    #[error("insufficient aligned dates: have {have}, need {need}")]
    InsufficientDates { have: usize, need: usize },

    #[error("weights sum to zero")]
    ZeroWeights,

    #[error("invalid weight for {ticker}: {value}")]
    InvalidWeight { ticker: String, value: f64 },

    #[error("weight given for unknown ticker: {0}")]
    UnknownTicker(String),

    #[error("annualization factor must be positive")]
    InvalidAnnualizationFactor,
}

/// Failure of a single alert rule. Caught per rule by the alert engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("rule {rule} failed: {reason}")]
pub struct RuleEvaluationError {
    pub rule: String,
    pub reason: String,
}

impl RuleEvaluationError {
    pub fn new(rule: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            reason: reason.into(),
        }
    }
}

/// Top-level error type for portwatch.
#[derive(Debug, thiserror::Error)]
pub enum PortwatchError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("no price data for any of: {tickers}")]
    NoData { tickers: String },

    #[error("unable to compute metrics for this selection: {0}")]
    Data(#[from] DataError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&PortwatchError> for std::process::ExitCode {
    fn from(err: &PortwatchError) -> Self {
        let code: u8 = match err {
            PortwatchError::Io(_) => 1,
            PortwatchError::ConfigParse { .. }
            | PortwatchError::ConfigMissing { .. }
            | PortwatchError::ConfigInvalid { .. } => 2,
            PortwatchError::DataSource { .. } => 3,
            PortwatchError::NoData { .. } | PortwatchError::Data(_) => 5,
        };
        std::process::ExitCode::from(code)
    }
}
