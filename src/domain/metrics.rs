//! Performance metrics over an aligned price table.
//!
//! Conventions:
//! - Daily returns are simple returns, `p[t] / p[t-1] - 1`.
//! - The portfolio is fixed-weight and rebalanced daily: its return on each
//!   date is the weighted sum of ticker returns under the normalised weights.
//! - Cumulative return compounds, `C[0] = 1`, `C[t] = C[t-1] * (1 + r[t])`.
//! - Volatility is the sample (N-1) standard deviation scaled by the square
//!   root of the annualisation factor.
//! - Sharpe and Sortino are [`MetricValue::Undefined`] when the relevant
//!   deviation is zero, never 0 or NaN.

use crate::domain::error::DataError;
use crate::domain::price_table::PriceTable;
use crate::domain::weights::WeightVector;
use chrono::NaiveDate;
use std::fmt;

pub const DEFAULT_ANNUALIZATION_FACTOR: u32 = 252;

const MIN_ALIGNED_DATES: usize = 2;

/// A deviation at or below this fraction of the mean is rounding noise from
/// summing identical returns, not dispersion.
const RELATIVE_STDDEV_TOLERANCE: f64 = 1e-10;

/// A ratio that may be undefined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Defined(f64),
    Undefined,
}

impl MetricValue {
    /// `numerator / stddev`, undefined when `stddev` is zero relative to the
    /// mean of the sample it was taken from.
    fn ratio(numerator: f64, stddev: f64, sample_mean: f64) -> Self {
        if !stddev.is_finite() || stddev <= RELATIVE_STDDEV_TOLERANCE * sample_mean.abs() {
            return MetricValue::Undefined;
        }
        let value = numerator / stddev;
        if value.is_finite() {
            MetricValue::Defined(value)
        } else {
            MetricValue::Undefined
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            MetricValue::Defined(v) => Some(*v),
            MetricValue::Undefined => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, MetricValue::Defined(_))
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Defined(v) => match f.precision() {
                Some(p) => write!(f, "{:.*}", p, v),
                None => write!(f, "{}", v),
            },
            MetricValue::Undefined => f.write_str("N/A"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatedValue {
    pub date: NaiveDate,
    pub value: f64,
}

/// One return per aligned date after the first.
pub type ReturnSeries = Vec<DatedValue>;

#[derive(Debug, Clone, PartialEq)]
pub struct TickerReturns {
    pub ticker: String,
    pub returns: ReturnSeries,
}

/// Last aligned price of a ticker and its change from the previous date.
#[derive(Debug, Clone, PartialEq)]
pub struct LatestChange {
    pub ticker: String,
    pub date: NaiveDate,
    pub price: f64,
    pub change: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsConfig {
    /// Annualised risk-free rate as a fraction.
    pub risk_free_rate: f64,
    /// Trading periods per year.
    pub annualization_factor: u32,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.0,
            annualization_factor: DEFAULT_ANNUALIZATION_FACTOR,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceReport {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub ticker_returns: Vec<TickerReturns>,
    /// Normalised weights in ticker order; zero-weight tickers included.
    pub weights: Vec<(String, f64)>,
    pub portfolio_returns: ReturnSeries,
    /// One entry per aligned date, starting at 1.0.
    pub cumulative_returns: Vec<DatedValue>,
    /// One entry per aligned date, always <= 0.
    pub drawdowns: Vec<DatedValue>,
    pub total_return: f64,
    pub annualized_volatility: f64,
    pub sharpe_ratio: MetricValue,
    pub sortino_ratio: MetricValue,
    pub max_drawdown: f64,
    pub latest: Vec<LatestChange>,
}

impl PerformanceReport {
    pub fn compute(
        prices: &PriceTable,
        weights: &WeightVector,
        config: &MetricsConfig,
    ) -> Result<Self, DataError> {
        if config.annualization_factor == 0 {
            return Err(DataError::InvalidAnnualizationFactor);
        }

        let aligned = prices.align()?;
        if aligned.date_count() < MIN_ALIGNED_DATES {
            return Err(DataError::InsufficientDates {
                have: aligned.date_count(),
                need: MIN_ALIGNED_DATES,
            });
        }
        let normalized = weights.normalized_for(&aligned.tickers)?;
        let dates = &aligned.dates;

        let ticker_returns: Vec<TickerReturns> = aligned
            .tickers
            .iter()
            .zip(&aligned.prices)
            .map(|(ticker, series)| TickerReturns {
                ticker: ticker.clone(),
                returns: daily_returns(dates, series),
            })
            .collect();

        let portfolio_returns: ReturnSeries = (1..dates.len())
            .map(|t| DatedValue {
                date: dates[t],
                value: ticker_returns
                    .iter()
                    .zip(&normalized)
                    .filter(|(_, w)| **w > 0.0)
                    .map(|(tr, &w)| w * tr.returns[t - 1].value)
                    .sum(),
            })
            .collect();

        let cumulative_returns = compound(dates[0], &portfolio_returns);
        let (drawdowns, max_drawdown) = compute_drawdown(&cumulative_returns);
        let total_return = cumulative_returns
            .last()
            .map(|c| c.value - 1.0)
            .unwrap_or(0.0);

        let values: Vec<f64> = portfolio_returns.iter().map(|r| r.value).collect();
        let factor = config.annualization_factor as f64;
        let (annualized_volatility, sharpe_ratio, sortino_ratio) =
            compute_risk_adjusted(&values, config.risk_free_rate / factor, factor.sqrt());

        let last = dates.len() - 1;
        let latest = aligned
            .tickers
            .iter()
            .zip(&aligned.prices)
            .map(|(ticker, series)| LatestChange {
                ticker: ticker.clone(),
                date: dates[last],
                price: series[last],
                change: series[last] / series[last - 1] - 1.0,
            })
            .collect();

        Ok(PerformanceReport {
            start_date: dates[0],
            end_date: dates[last],
            weights: aligned.tickers.iter().cloned().zip(normalized).collect(),
            ticker_returns,
            portfolio_returns,
            cumulative_returns,
            drawdowns,
            total_return,
            annualized_volatility,
            sharpe_ratio,
            sortino_ratio,
            max_drawdown,
            latest,
        })
    }

    pub fn returns_for(&self, ticker: &str) -> Option<&[DatedValue]> {
        self.ticker_returns
            .iter()
            .find(|tr| tr.ticker == ticker)
            .map(|tr| tr.returns.as_slice())
    }

    /// Portfolio value path `initial_value * C[t]`.
    pub fn portfolio_value(&self, initial_value: f64) -> Vec<DatedValue> {
        self.cumulative_returns
            .iter()
            .map(|c| DatedValue {
                date: c.date,
                value: initial_value * c.value,
            })
            .collect()
    }

    pub fn trading_days(&self) -> usize {
        self.cumulative_returns.len()
    }
}

/// Convenience entry point taking the scalar parameters directly.
pub fn compute(
    prices: &PriceTable,
    weights: &WeightVector,
    risk_free_rate: f64,
    annualization_factor: u32,
) -> Result<PerformanceReport, DataError> {
    PerformanceReport::compute(
        prices,
        weights,
        &MetricsConfig {
            risk_free_rate,
            annualization_factor,
        },
    )
}

fn daily_returns(dates: &[NaiveDate], prices: &[f64]) -> ReturnSeries {
    prices
        .windows(2)
        .zip(&dates[1..])
        .map(|(w, &date)| DatedValue {
            date,
            value: w[1] / w[0] - 1.0,
        })
        .collect()
}

fn compound(start: NaiveDate, returns: &[DatedValue]) -> Vec<DatedValue> {
    let mut level = 1.0;
    let mut out = Vec::with_capacity(returns.len() + 1);
    out.push(DatedValue {
        date: start,
        value: level,
    });
    for r in returns {
        level *= 1.0 + r.value;
        out.push(DatedValue {
            date: r.date,
            value: level,
        });
    }
    out
}

fn compute_drawdown(cumulative: &[DatedValue]) -> (Vec<DatedValue>, f64) {
    let mut peak = f64::MIN;
    let mut max_dd = 0.0_f64;
    let series = cumulative
        .iter()
        .map(|c| {
            if c.value > peak {
                peak = c.value;
            }
            let dd = c.value / peak - 1.0;
            if dd < max_dd {
                max_dd = dd;
            }
            DatedValue {
                date: c.date,
                value: dd,
            }
        })
        .collect();
    (series, max_dd)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation; 0 for fewer than two values.
fn sample_stddev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Returns (annualised volatility, Sharpe, Sortino).
fn compute_risk_adjusted(
    returns: &[f64],
    daily_rf: f64,
    sqrt_factor: f64,
) -> (f64, MetricValue, MetricValue) {
    let stddev = sample_stddev(returns);
    let mean_return = mean(returns);
    let excess = mean_return - daily_rf;

    let sharpe = match MetricValue::ratio(excess, stddev, mean_return) {
        MetricValue::Defined(v) => MetricValue::Defined(v * sqrt_factor),
        MetricValue::Undefined => MetricValue::Undefined,
    };

    let downside: Vec<f64> = returns.iter().copied().filter(|&r| r < 0.0).collect();
    let sortino = if downside.len() < 2 {
        MetricValue::Undefined
    } else {
        match MetricValue::ratio(excess, sample_stddev(&downside), mean(&downside)) {
            MetricValue::Defined(v) => MetricValue::Defined(v * sqrt_factor),
            MetricValue::Undefined => MetricValue::Undefined,
        }
    };

    (stddev * sqrt_factor, sharpe, sortino)
}
