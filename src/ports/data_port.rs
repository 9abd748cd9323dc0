//! Market data access port.

use crate::domain::error::MarketPulseError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

/// Source of daily bars. Implementations own any retry policy; callers see
/// either bars or a terminal error. `Provider` marks a failure worth retrying,
/// `DataUnavailable` one that is not.
pub trait DataPort: Send + Sync {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, MarketPulseError>;

    /// Market capitalisation, when the provider knows it.
    fn market_cap(&self, _symbol: &str) -> Result<Option<f64>, MarketPulseError> {
        Ok(None)
    }
}
