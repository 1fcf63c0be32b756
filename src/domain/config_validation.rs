//! Configuration validation.
//!
//! Validates every config field before any price data is read.

use crate::domain::alert::Severity;
use crate::domain::error::PortwatchError;
use crate::domain::universe::{parse_tickers, parse_weights};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_monitor_config(config: &dyn ConfigPort) -> Result<(), PortwatchError> {
    validate_tickers(config)?;
    validate_dates(config)?;
    validate_weights(config)?;
    validate_initial_value(config)?;
    validate_risk_free_rate(config)?;
    validate_annualization_factor(config)?;
    validate_alerts(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> PortwatchError {
    PortwatchError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// Reads a float, distinguishing "unset" from "set but not a number".
fn optional_number(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<f64>, PortwatchError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| invalid(section, key, format!("{:?} is not a number", s.trim()))),
    }
}

fn validate_tickers(config: &dyn ConfigPort) -> Result<(), PortwatchError> {
    match config.get_string("data", "tickers") {
        Some(s) if !s.trim().is_empty() => parse_tickers(&s)
            .map(|_| ())
            .map_err(|e| invalid("data", "tickers", e.to_string())),
        _ => Err(PortwatchError::ConfigMissing {
            section: "data".to_string(),
            key: "tickers".to_string(),
        }),
    }
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), PortwatchError> {
    let start_str = config.get_string("data", "start_date");
    let end_str = config.get_string("data", "end_date");

    let start_date = parse_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "end_date")?;

    if start_date >= end_date {
        return Err(invalid(
            "data",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok(())
}

pub fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, PortwatchError> {
    match value {
        None => Err(PortwatchError::ConfigMissing {
            section: "data".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            invalid(
                "data",
                field,
                format!("invalid {} format, expected YYYY-MM-DD", field),
            )
        }),
    }
}

fn validate_weights(config: &dyn ConfigPort) -> Result<(), PortwatchError> {
    let Some(raw) = config
        .get_string("portfolio", "weights")
        .filter(|s| !s.trim().is_empty())
    else {
        return Ok(());
    };
    let weights = parse_weights(&raw).map_err(|e| invalid("portfolio", "weights", e.to_string()))?;
    if weights.total() <= 0.0 {
        return Err(invalid(
            "portfolio",
            "weights",
            "at least one weight must be positive",
        ));
    }

    let listed = config
        .get_string("data", "tickers")
        .and_then(|raw| parse_tickers(&raw).ok())
        .unwrap_or_default();
    if let Some((ticker, _)) = weights.iter().find(|(t, _)| !listed.iter().any(|l| l == t)) {
        return Err(invalid(
            "portfolio",
            "weights",
            format!("weight given for {ticker}, which is not in [data] tickers"),
        ));
    }
    Ok(())
}

fn validate_initial_value(config: &dyn ConfigPort) -> Result<(), PortwatchError> {
    if let Some(value) = optional_number(config, "portfolio", "initial_value")? {
        if !(value > 0.0) || !value.is_finite() {
            return Err(invalid(
                "portfolio",
                "initial_value",
                "initial_value must be positive",
            ));
        }
    }
    Ok(())
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), PortwatchError> {
    if let Some(value) = optional_number(config, "metrics", "risk_free_rate")? {
        if !(0.0..1.0).contains(&value) {
            return Err(invalid(
                "metrics",
                "risk_free_rate",
                "risk_free_rate must be between 0 and 1",
            ));
        }
    }
    Ok(())
}

fn validate_annualization_factor(config: &dyn ConfigPort) -> Result<(), PortwatchError> {
    let Some(raw) = config.get_string("metrics", "annualization_factor") else {
        return Ok(());
    };
    match raw.trim().parse::<u32>() {
        Ok(v) if v > 0 => Ok(()),
        _ => Err(invalid(
            "metrics",
            "annualization_factor",
            "annualization_factor must be a positive integer",
        )),
    }
}

fn validate_threshold(config: &dyn ConfigPort, key: &str) -> Result<(), PortwatchError> {
    if let Some(value) = optional_number(config, "alerts", key)? {
        if !(value > 0.0 && value <= 1.0) {
            return Err(invalid(
                "alerts",
                key,
                format!("{key} must be a fraction in (0, 1]"),
            ));
        }
    }
    Ok(())
}

fn validate_severity(config: &dyn ConfigPort, key: &str) -> Result<(), PortwatchError> {
    if let Some(raw) = config.get_string("alerts", key) {
        raw.parse::<Severity>()
            .map_err(|e| invalid("alerts", key, e.to_string()))?;
    }
    Ok(())
}

fn validate_alerts(config: &dyn ConfigPort) -> Result<(), PortwatchError> {
    validate_threshold(config, "single_day_drop_threshold")?;
    validate_threshold(config, "portfolio_drop_threshold")?;

    if let Some(floor) = optional_number(config, "alerts", "portfolio_floor_value")? {
        if !(floor > 0.0) || !floor.is_finite() {
            return Err(invalid(
                "alerts",
                "portfolio_floor_value",
                "portfolio_floor_value must be positive",
            ));
        }
    }

    validate_severity(config, "single_day_drop_severity")?;
    validate_severity(config, "portfolio_floor_severity")?;
    validate_severity(config, "portfolio_drop_severity")?;
    Ok(())
}
