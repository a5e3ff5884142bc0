//! Bar series source port trait.

use crate::domain::error::TraderError;
use crate::domain::ohlcv::Bar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars in strictly ascending timestamp order, restricted to the
    /// inclusive date range when bounds are given.
    fn fetch_bars(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Bar>, TraderError>;
}
