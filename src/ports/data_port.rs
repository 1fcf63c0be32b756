//! Price data access port.

use crate::domain::error::PortwatchError;
use crate::domain::price_table::PricePoint;
use chrono::NaiveDate;

pub trait DataPort {
    /// Adjusted-close observations for `ticker` within `[start_date, end_date]`,
    /// sorted by date. A source may return fewer dates than requested.
    fn fetch_prices(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PricePoint>, PortwatchError>;

    fn list_tickers(&self) -> Result<Vec<String>, PortwatchError>;
}
