#![allow(dead_code)]

use chrono::{Days, NaiveDate};
use portwatch::domain::error::PortwatchError;
use portwatch::domain::price_table::{PricePoint, PriceTable};
use portwatch::ports::data_port::DataPort;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PricePoint>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_prices(mut self, ticker: &str, points: Vec<PricePoint>) -> Self {
        self.data.insert(ticker.to_string(), points);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_prices(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PricePoint>, PortwatchError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(PortwatchError::DataSource {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(ticker)
            .map(|points| {
                points
                    .iter()
                    .filter(|p| p.date >= start_date && p.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_tickers(&self) -> Result<Vec<String>, PortwatchError> {
        let mut tickers: Vec<String> = self.data.keys().cloned().collect();
        tickers.sort();
        Ok(tickers)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Consecutive calendar days starting 2024-01-01, one per price.
pub fn make_series(prices: &[f64]) -> Vec<PricePoint> {
    let start = date(2024, 1, 1);
    prices
        .iter()
        .enumerate()
        .map(|(i, &price)| PricePoint::new(start + Days::new(i as u64), price))
        .collect()
}

pub fn make_table(series: &[(&str, &[f64])]) -> PriceTable {
    let mut table = PriceTable::new();
    for (ticker, prices) in series {
        table.insert(ticker, make_series(prices)).unwrap();
    }
    table
}

/// Writes `<dir>/<TICKER>.csv` in `date,close` form.
pub fn write_csv(dir: &Path, ticker: &str, points: &[PricePoint]) {
    let mut content = String::from("date,close\n");
    for p in points {
        content.push_str(&format!("{},{}\n", p.date.format("%Y-%m-%d"), p.price));
    }
    fs::write(dir.join(format!("{ticker}.csv")), content).unwrap();
}
