//! Price table and date alignment.
//!
//! A [`PriceTable`] holds raw adjusted-close series per ticker, in the order
//! tickers were inserted. [`PriceTable::align`] validates every observation
//! and intersects the per-ticker date indices: a date is kept only when every
//! ticker has a price on it. Nothing is forward-filled.

use crate::domain::error::DataError;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

/// A single adjusted-close observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, price: f64) -> Self {
        Self { date, price }
    }
}

/// Uppercases and trims a ticker symbol.
pub fn normalize_ticker(raw: &str) -> Result<String, DataError> {
    let ticker = raw.trim().to_uppercase();
    if ticker.is_empty() {
        return Err(DataError::EmptyTicker);
    }
    Ok(ticker)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceTable {
    series: Vec<(String, Vec<PricePoint>)>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a ticker's series. Tickers are case-insensitive; inserting the same
    /// symbol twice is an error.
    pub fn insert(&mut self, ticker: &str, points: Vec<PricePoint>) -> Result<(), DataError> {
        let ticker = normalize_ticker(ticker)?;
        if self.contains(&ticker) {
            return Err(DataError::DuplicateTicker(ticker));
        }
        self.series.push((ticker, points));
        Ok(())
    }

    pub fn with_series(mut self, ticker: &str, points: Vec<PricePoint>) -> Result<Self, DataError> {
        self.insert(ticker, points)?;
        Ok(self)
    }

    pub fn contains(&self, ticker: &str) -> bool {
        let ticker = ticker.trim().to_uppercase();
        self.series.iter().any(|(t, _)| *t == ticker)
    }

    pub fn get(&self, ticker: &str) -> Option<&[PricePoint]> {
        let ticker = ticker.trim().to_uppercase();
        self.series
            .iter()
            .find(|(t, _)| *t == ticker)
            .map(|(_, points)| points.as_slice())
    }

    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.series.iter().map(|(t, _)| t.as_str())
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Validates all observations and returns the prices restricted to the
    /// dates every ticker shares.
    pub fn align(&self) -> Result<AlignedPrices, DataError> {
        if self.series.is_empty() {
            return Err(DataError::EmptyTable);
        }

        let mut by_ticker: Vec<BTreeMap<NaiveDate, f64>> = Vec::with_capacity(self.series.len());
        for (ticker, points) in &self.series {
            let mut dated = BTreeMap::new();
            for point in points {
                if !point.price.is_finite() || point.price <= 0.0 {
                    return Err(DataError::InvalidPrice {
                        ticker: ticker.clone(),
                        date: point.date,
                        value: point.price,
                    });
                }
                if dated.insert(point.date, point.price).is_some() {
                    return Err(DataError::DuplicateDate {
                        ticker: ticker.clone(),
                        date: point.date,
                    });
                }
            }
            by_ticker.push(dated);
        }

        let mut shared: BTreeSet<NaiveDate> = by_ticker[0].keys().copied().collect();
        for dated in &by_ticker[1..] {
            shared.retain(|d| dated.contains_key(d));
        }
        let dates: Vec<NaiveDate> = shared.into_iter().collect();

        let prices = by_ticker
            .iter()
            .map(|dated| dates.iter().map(|d| dated[d]).collect())
            .collect();

        Ok(AlignedPrices {
            dates,
            tickers: self.series.iter().map(|(t, _)| t.clone()).collect(),
            prices,
        })
    }
}

/// Prices on the shared date index. `prices[i][t]` is ticker `i` on `dates[t]`.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedPrices {
    pub dates: Vec<NaiveDate>,
    pub tickers: Vec<String>,
    pub prices: Vec<Vec<f64>>,
}

impl AlignedPrices {
    pub fn date_count(&self) -> usize {
        self.dates.len()
    }

    pub fn ticker_index(&self, ticker: &str) -> Option<usize> {
        self.tickers.iter().position(|t| t == ticker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn series(values: &[(u32, f64)]) -> Vec<PricePoint> {
        values.iter().map(|&(day, p)| PricePoint::new(d(day), p)).collect()
    }

    #[test]
    fn insert_normalizes_ticker_case() {
        let table = PriceTable::new()
            .with_series(" aapl ", series(&[(1, 10.0)]))
            .unwrap();
        assert!(table.contains("AAPL"));
        assert!(table.contains("aapl"));
        assert_eq!(table.tickers().collect::<Vec<_>>(), vec!["AAPL"]);
    }

    #[test]
    fn insert_rejects_duplicate_ticker_ignoring_case() {
        let mut table = PriceTable::new();
        table.insert("msft", series(&[(1, 10.0)])).unwrap();
        let err = table.insert("MSFT", series(&[(1, 10.0)])).unwrap_err();
        assert_eq!(err, DataError::DuplicateTicker("MSFT".into()));
    }

    #[test]
    fn insert_rejects_blank_ticker() {
        let mut table = PriceTable::new();
        assert_eq!(
            table.insert("   ", series(&[(1, 10.0)])).unwrap_err(),
            DataError::EmptyTicker
        );
    }

    #[test]
    fn align_intersects_dates() {
        let table = PriceTable::new()
            .with_series("A", series(&[(1, 10.0), (2, 11.0), (3, 12.0), (4, 13.0)]))
            .unwrap()
            .with_series("B", series(&[(1, 20.0), (3, 21.0), (4, 22.0), (5, 23.0)]))
            .unwrap();

        let aligned = table.align().unwrap();
        assert_eq!(aligned.dates, vec![d(1), d(3), d(4)]);
        assert_eq!(aligned.prices[0], vec![10.0, 12.0, 13.0]);
        assert_eq!(aligned.prices[1], vec![20.0, 21.0, 22.0]);
    }

    #[test]
    fn align_sorts_unordered_input() {
        let table = PriceTable::new()
            .with_series("A", series(&[(3, 12.0), (1, 10.0), (2, 11.0)]))
            .unwrap();
        let aligned = table.align().unwrap();
        assert_eq!(aligned.dates, vec![d(1), d(2), d(3)]);
        assert_eq!(aligned.prices[0], vec![10.0, 11.0, 12.0]);
    }

    #[test]
    fn align_rejects_non_positive_price_even_on_dropped_date() {
        let table = PriceTable::new()
            .with_series("A", series(&[(1, 10.0), (2, 0.0)]))
            .unwrap()
            .with_series("B", series(&[(1, 10.0)]))
            .unwrap();
        assert!(matches!(
            table.align().unwrap_err(),
            DataError::InvalidPrice { ref ticker, value, .. } if ticker == "A" && value == 0.0
        ));
    }

    #[test]
    fn align_rejects_nan_price() {
        let table = PriceTable::new()
            .with_series("A", series(&[(1, f64::NAN)]))
            .unwrap();
        assert!(matches!(table.align().unwrap_err(), DataError::InvalidPrice { .. }));
    }

    #[test]
    fn align_rejects_duplicate_date() {
        let table = PriceTable::new()
            .with_series("A", series(&[(1, 10.0), (1, 11.0)]))
            .unwrap();
        assert_eq!(
            table.align().unwrap_err(),
            DataError::DuplicateDate {
                ticker: "A".into(),
                date: d(1)
            }
        );
    }

    #[test]
    fn align_empty_table_fails() {
        assert_eq!(PriceTable::new().align().unwrap_err(), DataError::EmptyTable);
    }

    #[test]
    fn align_disjoint_dates_yields_empty_index() {
        let table = PriceTable::new()
            .with_series("A", series(&[(1, 10.0)]))
            .unwrap()
            .with_series("B", series(&[(2, 10.0)]))
            .unwrap();
        assert!(table.align().unwrap().dates.is_empty());
    }
}
