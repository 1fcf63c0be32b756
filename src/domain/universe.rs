//! Ticker universe: parsing ticker and weight lists from configuration and
//! loading a [`PriceTable`] through a [`DataPort`].
//!
//! Tickers the data source cannot serve are skipped with a warning so one
//! bad symbol does not abort the whole refresh.

use crate::domain::error::PortwatchError;
use crate::domain::price_table::PriceTable;
use crate::domain::weights::WeightVector;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in ticker list")]
    EmptyToken,

    #[error("malformed weight entry {0:?} (expected TICKER:WEIGHT)")]
    MalformedWeight(String),

    #[error("invalid weight for {ticker}: {reason}")]
    InvalidWeight { ticker: String, reason: String },
}

/// Splits a comma-separated ticker list, uppercasing and dropping repeats
/// while keeping first-seen order.
pub fn parse_tickers(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut tickers = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let ticker = trimmed.to_uppercase();
        if seen.insert(ticker.clone()) {
            tickers.push(ticker);
        }
    }

    Ok(tickers)
}

/// Parses `AAPL:60, MSFT:40` into a weight vector.
pub fn parse_weights(input: &str) -> Result<WeightVector, UniverseError> {
    let mut weights = WeightVector::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let (ticker, raw) = trimmed
            .split_once(':')
            .ok_or_else(|| UniverseError::MalformedWeight(trimmed.to_string()))?;
        let ticker = ticker.trim();
        if ticker.is_empty() {
            return Err(UniverseError::MalformedWeight(trimmed.to_string()));
        }
        let value: f64 = raw.trim().parse().map_err(|_| UniverseError::InvalidWeight {
            ticker: ticker.to_uppercase(),
            reason: format!("{:?} is not a number", raw.trim()),
        })?;
        weights
            .set(ticker, value)
            .map_err(|e| UniverseError::InvalidWeight {
                ticker: ticker.to_uppercase(),
                reason: e.to_string(),
            })?;
    }

    Ok(weights)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedTicker {
    pub ticker: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    FetchFailed(String),
    NoData,
}

pub struct LoadedUniverse {
    pub table: PriceTable,
    pub skipped: Vec<SkippedTicker>,
}

pub fn load_universe(
    data_port: &dyn DataPort,
    tickers: &[String],
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<LoadedUniverse, PortwatchError> {
    let mut table = PriceTable::new();
    let mut skipped = Vec::new();

    for ticker in tickers {
        let points = match data_port.fetch_prices(ticker, start_date, end_date) {
            Ok(points) => points,
            Err(e) => {
                tracing::warn!(%ticker, error = %e, "skipping ticker");
                skipped.push(SkippedTicker {
                    ticker: ticker.clone(),
                    reason: SkipReason::FetchFailed(e.to_string()),
                });
                continue;
            }
        };

        if points.is_empty() {
            tracing::warn!(%ticker, "skipping ticker (no data in range)");
            skipped.push(SkippedTicker {
                ticker: ticker.clone(),
                reason: SkipReason::NoData,
            });
            continue;
        }

        tracing::info!(%ticker, observations = points.len(), "loaded prices");
        table.insert(ticker, points)?;
    }

    if table.is_empty() {
        return Err(PortwatchError::NoData {
            tickers: tickers.join(","),
        });
    }

    if !skipped.is_empty() {
        let removed: Vec<&str> = skipped.iter().map(|s| s.ticker.as_str()).collect();
        tracing::warn!(
            removed = %removed.join(", "),
            "monitoring {} of {} tickers",
            table.len(),
            tickers.len()
        );
    }

    Ok(LoadedUniverse { table, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tickers_basic() {
        assert_eq!(
            parse_tickers("AAPL,MSFT,TSLA").unwrap(),
            vec!["AAPL", "MSFT", "TSLA"]
        );
    }

    #[test]
    fn parse_tickers_trims_and_uppercases() {
        assert_eq!(
            parse_tickers("  aapl , msft ,Tsla").unwrap(),
            vec!["AAPL", "MSFT", "TSLA"]
        );
    }

    #[test]
    fn parse_tickers_drops_repeats_keeping_first() {
        assert_eq!(
            parse_tickers("MSFT,aapl,msft,AAPL").unwrap(),
            vec!["MSFT", "AAPL"]
        );
    }

    #[test]
    fn parse_tickers_empty_token() {
        assert_eq!(parse_tickers("AAPL,,MSFT"), Err(UniverseError::EmptyToken));
    }

    #[test]
    fn parse_weights_basic() {
        let weights = parse_weights("aapl:60, MSFT : 40").unwrap();
        assert_eq!(weights.get("AAPL"), Some(60.0));
        assert_eq!(weights.get("MSFT"), Some(40.0));
    }

    #[test]
    fn parse_weights_missing_colon() {
        assert_eq!(
            parse_weights("AAPL 60"),
            Err(UniverseError::MalformedWeight("AAPL 60".into()))
        );
    }

    #[test]
    fn parse_weights_non_numeric() {
        assert!(matches!(
            parse_weights("AAPL:lots"),
            Err(UniverseError::InvalidWeight { ticker, .. }) if ticker == "AAPL"
        ));
    }

    #[test]
    fn parse_weights_negative() {
        assert!(matches!(
            parse_weights("AAPL:-1"),
            Err(UniverseError::InvalidWeight { .. })
        ));
    }
}
