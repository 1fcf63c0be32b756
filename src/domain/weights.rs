//! Portfolio weight vector and normalisation.

use crate::domain::error::DataError;
use crate::domain::price_table::{normalize_ticker, PriceTable};

/// Raw, non-negative ticker weights. They need not sum to one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightVector {
    weights: Vec<(String, f64)>,
}

impl WeightVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Weight 1 for every ticker in the table.
    pub fn equal(table: &PriceTable) -> Self {
        Self {
            weights: table.tickers().map(|t| (t.to_string(), 1.0)).collect(),
        }
    }

    /// Sets a ticker's weight, replacing any earlier value.
    pub fn set(&mut self, ticker: &str, weight: f64) -> Result<(), DataError> {
        let ticker = normalize_ticker(ticker)?;
        if !weight.is_finite() || weight < 0.0 {
            return Err(DataError::InvalidWeight {
                ticker,
                value: weight,
            });
        }
        match self.weights.iter_mut().find(|(t, _)| *t == ticker) {
            Some(entry) => entry.1 = weight,
            None => self.weights.push((ticker, weight)),
        }
        Ok(())
    }

    pub fn with(mut self, ticker: &str, weight: f64) -> Result<Self, DataError> {
        self.set(ticker, weight)?;
        Ok(self)
    }

    pub fn get(&self, ticker: &str) -> Option<f64> {
        let ticker = ticker.trim().to_uppercase();
        self.weights
            .iter()
            .find(|(t, _)| *t == ticker)
            .map(|&(_, w)| w)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(t, w)| (t.as_str(), *w))
    }

    pub fn total(&self) -> f64 {
        self.weights.iter().map(|&(_, w)| w).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Normalised weights laid out in `tickers` order. Tickers without a weight
    /// get 0 and drop out of the aggregate.
    pub fn normalized_for(&self, tickers: &[String]) -> Result<Vec<f64>, DataError> {
        for (ticker, _) in &self.weights {
            if !tickers.iter().any(|t| t == ticker) {
                return Err(DataError::UnknownTicker(ticker.clone()));
            }
        }

        let max = self.weights.iter().map(|&(_, w)| w).fold(0.0, f64::max);
        if max <= 0.0 {
            return Err(DataError::ZeroWeights);
        }

        // Finite weights can still overflow when summed; rescale by the largest.
        let total = self.total();
        let (scale, total) = if total.is_finite() {
            (1.0, total)
        } else {
            (max, self.weights.iter().map(|&(_, w)| w / max).sum())
        };

        Ok(tickers
            .iter()
            .map(|t| self.get(t).unwrap_or(0.0) / scale / total)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tickers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn normalizes_to_unit_sum() {
        let weights = WeightVector::new()
            .with("A", 1.0)
            .unwrap()
            .with("B", 3.0)
            .unwrap();
        let normalized = weights.normalized_for(&tickers(&["A", "B"])).unwrap();
        assert_relative_eq!(normalized[0], 0.25);
        assert_relative_eq!(normalized[1], 0.75);
    }

    #[test]
    fn missing_ticker_gets_zero() {
        let weights = WeightVector::new().with("B", 2.0).unwrap();
        let normalized = weights.normalized_for(&tickers(&["A", "B"])).unwrap();
        assert_eq!(normalized, vec![0.0, 1.0]);
    }

    #[test]
    fn rejects_unknown_ticker() {
        let weights = WeightVector::new().with("ZZZ", 1.0).unwrap();
        assert_eq!(
            weights.normalized_for(&tickers(&["A"])).unwrap_err(),
            DataError::UnknownTicker("ZZZ".into())
        );
    }

    #[test]
    fn rejects_all_zero() {
        let weights = WeightVector::new()
            .with("A", 0.0)
            .unwrap()
            .with("B", 0.0)
            .unwrap();
        assert_eq!(
            weights.normalized_for(&tickers(&["A", "B"])).unwrap_err(),
            DataError::ZeroWeights
        );
    }

    #[test]
    fn empty_vector_is_zero_sum() {
        assert_eq!(
            WeightVector::new().normalized_for(&tickers(&["A"])).unwrap_err(),
            DataError::ZeroWeights
        );
    }

    #[test]
    fn rejects_negative_and_nan() {
        let mut weights = WeightVector::new();
        assert!(matches!(
            weights.set("A", -1.0).unwrap_err(),
            DataError::InvalidWeight { .. }
        ));
        assert!(matches!(
            weights.set("A", f64::NAN).unwrap_err(),
            DataError::InvalidWeight { .. }
        ));
    }

    #[test]
    fn set_replaces_and_normalizes_case() {
        let weights = WeightVector::new()
            .with("aapl", 1.0)
            .unwrap()
            .with("AAPL", 4.0)
            .unwrap();
        assert_eq!(weights.get("AAPL"), Some(4.0));
        assert_eq!(weights.iter().count(), 1);
    }

    #[test]
    fn get_accepts_any_case() {
        let weights = WeightVector::new().with("AAPL", 2.0).unwrap();
        assert_eq!(weights.get("aapl"), Some(2.0));
        assert_eq!(weights.get(" Aapl "), Some(2.0));
        assert_eq!(weights.get("msft"), None);
    }

    #[test]
    fn huge_weights_normalize_without_overflow() {
        let weights = WeightVector::new()
            .with("A", 1e308)
            .unwrap()
            .with("B", 1e308)
            .unwrap();
        assert!(weights.total().is_infinite());

        let normalized = weights.normalized_for(&tickers(&["A", "B"])).unwrap();
        assert_eq!(normalized, vec![0.5, 0.5]);
    }
}
