//! Price data access port.

use crate::domain::error::VolgateError;
use crate::domain::price::PricePoint;
use chrono::NaiveDate;

pub trait DataPort {
    /// Daily closes for `symbol` within `[start_date, end_date]`, possibly
    /// with gaps and missing values. Order is not guaranteed.
    fn fetch_closes(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PricePoint>, VolgateError>;

    /// First date, last date and number of stored closes for `symbol`.
    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, VolgateError>;
}
