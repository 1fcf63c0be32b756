//! CSV file price adapter.
//!
//! One file per ticker, `<base>/<TICKER>.csv`, with a header row. The `date`
//! column is `YYYY-MM-DD`; the price comes from `adj_close` when present and
//! `close` otherwise. Header names are matched case-insensitively.

use crate::domain::error::PortwatchError;
use crate::domain::price_table::PricePoint;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker.to_uppercase()))
    }
}

fn source_error(reason: String) -> PortwatchError {
    PortwatchError::DataSource { reason }
}

fn column_index(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    names.iter().find_map(|name| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    })
}

impl DataPort for CsvAdapter {
    fn fetch_prices(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PricePoint>, PortwatchError> {
        let path = self.csv_path(ticker);
        let content = fs::read_to_string(&path)
            .map_err(|e| source_error(format!("failed to read {}: {}", path.display(), e)))?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| source_error(format!("CSV header error in {}: {}", path.display(), e)))?
            .clone();
        let date_col = column_index(&headers, &["date"])
            .ok_or_else(|| source_error(format!("missing date column in {}", path.display())))?;
        let price_col = column_index(&headers, &["adj_close", "adj close", "close"])
            .ok_or_else(|| source_error(format!("missing close column in {}", path.display())))?;

        let mut points = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| source_error(format!("CSV parse error: {}", e)))?;

            let date_str = record
                .get(date_col)
                .ok_or_else(|| source_error("missing date value".into()))?;
            let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
                .map_err(|e| source_error(format!("invalid date format {:?}: {}", date_str, e)))?;

            if date < start_date || date > end_date {
                continue;
            }

            let price: f64 = record
                .get(price_col)
                .ok_or_else(|| source_error("missing price value".into()))?
                .trim()
                .parse()
                .map_err(|e| source_error(format!("invalid price on {}: {}", date, e)))?;

            points.push(PricePoint::new(date, price));
        }

        points.sort_by_key(|p| p.date);
        Ok(points)
    }

    fn list_tickers(&self) -> Result<Vec<String>, PortwatchError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| {
            source_error(format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ))
        })?;

        let mut tickers = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| source_error(format!("directory entry error: {}", e)))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                tickers.push(stem.to_uppercase());
            }
        }

        tickers.sort();
        Ok(tickers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        fs::write(
            path.join("AAPL.csv"),
            "date,open,high,low,close,adj_close,volume\n\
             2024-01-17,110.0,120.0,105.0,115.0,114.5,55000\n\
             2024-01-15,100.0,110.0,90.0,105.0,104.5,50000\n\
             2024-01-16,105.0,115.0,100.0,110.0,109.5,60000\n",
        )
        .unwrap();
        fs::write(path.join("MSFT.csv"), "Date,Close\n2024-01-15,300.0\n").unwrap();
        fs::write(path.join("BAD.csv"), "date,close\n2024-01-15,abc\n").unwrap();
        fs::write(path.join("NODATE.csv"), "day,close\n2024-01-15,1.0\n").unwrap();
        fs::write(path.join("notes.txt"), "ignore me").unwrap();

        (dir, path)
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn fetch_prices_prefers_adj_close_and_sorts() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let points = adapter.fetch_prices("AAPL", d(1), d(31)).unwrap();

        assert_eq!(points.len(), 3);
        assert_eq!(points[0], PricePoint::new(d(15), 104.5));
        assert_eq!(points[2], PricePoint::new(d(17), 114.5));
    }

    #[test]
    fn fetch_prices_falls_back_to_close() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let points = adapter.fetch_prices("msft", d(1), d(31)).unwrap();
        assert_eq!(points, vec![PricePoint::new(d(15), 300.0)]);
    }

    #[test]
    fn fetch_prices_filters_by_date() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let points = adapter.fetch_prices("AAPL", d(16), d(16)).unwrap();
        assert_eq!(points, vec![PricePoint::new(d(16), 109.5)]);
    }

    #[test]
    fn fetch_prices_missing_file_is_error() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        assert!(matches!(
            adapter.fetch_prices("XYZ", d(1), d(31)),
            Err(PortwatchError::DataSource { .. })
        ));
    }

    #[test]
    fn fetch_prices_bad_value_is_error() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        assert!(adapter.fetch_prices("BAD", d(1), d(31)).is_err());
    }

    #[test]
    fn fetch_prices_missing_date_column_is_error() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        let err = adapter.fetch_prices("NODATE", d(1), d(31)).unwrap_err();
        assert!(err.to_string().contains("missing date column"));
    }

    #[test]
    fn list_tickers_returns_csv_stems() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        assert_eq!(
            adapter.list_tickers().unwrap(),
            vec!["AAPL", "BAD", "MSFT", "NODATE"]
        );
    }
}
