//! Configuration loading and validation.
//!
//! Reads the `[advisor]`, `[screener]` and `[data]` sections into typed
//! settings, failing before any computation when a value is out of range.

use crate::domain::advisor::RiskTolerance;
use crate::domain::error::MarketPulseError;
use crate::domain::screener::{FilterPreset, IndicatorCategory, ScreenerConfig};
use crate::ports::config_port::ConfigPort;
use std::path::PathBuf;

pub const DEFAULT_PORTFOLIO_VALUE: f64 = 10_000.0;
pub const DEFAULT_RETRY_ATTEMPTS: i64 = 3;
pub const DEFAULT_RETRY_DELAY_MS: i64 = 500;

#[derive(Debug, Clone, PartialEq)]
pub struct AdvisorSettings {
    pub risk_tolerance: RiskTolerance,
    pub portfolio_value: f64,
}

impl Default for AdvisorSettings {
    fn default() -> Self {
        Self {
            risk_tolerance: RiskTolerance::default(),
            portfolio_value: DEFAULT_PORTFOLIO_VALUE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScreenerSettings {
    pub config: ScreenerConfig,
    pub preset: Option<FilterPreset>,
    /// Universe override; `None` screens the default universe.
    pub symbols: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataSettings {
    pub dir: Option<PathBuf>,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> MarketPulseError {
    MarketPulseError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn non_empty(config: &dyn ConfigPort, section: &str, key: &str) -> Option<String> {
    config
        .get_string(section, key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn load_advisor_settings(config: &dyn ConfigPort) -> Result<AdvisorSettings, MarketPulseError> {
    let risk_tolerance = match non_empty(config, "advisor", "risk_tolerance") {
        Some(name) => name.parse().map_err(|_| {
            invalid(
                "advisor",
                "risk_tolerance",
                format!("expected conservative, moderate or aggressive, got '{name}'"),
            )
        })?,
        None => RiskTolerance::default(),
    };
    let settings = AdvisorSettings {
        risk_tolerance,
        portfolio_value: config.get_double("advisor", "portfolio_value", DEFAULT_PORTFOLIO_VALUE),
    };
    validate_portfolio_value(settings.portfolio_value)?;
    Ok(settings)
}

pub fn validate_portfolio_value(value: f64) -> Result<(), MarketPulseError> {
    if !(value.is_finite() && value > 0.0) {
        return Err(invalid(
            "advisor",
            "portfolio_value",
            "portfolio_value must be positive",
        ));
    }
    Ok(())
}

/// Starts from the preset (or the defaults) and applies any explicit keys on top.
pub fn load_screener_settings(
    config: &dyn ConfigPort,
) -> Result<ScreenerSettings, MarketPulseError> {
    let preset = match non_empty(config, "screener", "preset") {
        Some(name) => Some(
            name.parse::<FilterPreset>()
                .map_err(|_| invalid("screener", "preset", format!("unknown preset '{name}'")))?,
        ),
        None => None,
    };
    let base = preset.map(|p| p.config()).unwrap_or_default();

    let max_concurrency = config.get_int("screener", "max_concurrency", base.max_concurrency as i64);
    if max_concurrency < 1 {
        return Err(invalid(
            "screener",
            "max_concurrency",
            "max_concurrency must be at least 1",
        ));
    }
    let lookback_months = config.get_int("screener", "lookback_months", base.lookback_months as i64);
    if !(1..=i64::from(u32::MAX)).contains(&lookback_months) {
        return Err(invalid(
            "screener",
            "lookback_months",
            "lookback_months must be at least 1",
        ));
    }

    let mut indicator_weights = base.indicator_weights.clone();
    for (key, category) in [
        ("weight_trend", IndicatorCategory::Trend),
        ("weight_momentum", IndicatorCategory::Momentum),
        ("weight_volume", IndicatorCategory::Volume),
        ("weight_volatility", IndicatorCategory::Volatility),
    ] {
        let current = indicator_weights.get(&category).copied().unwrap_or(0.0);
        let weight = config.get_double("screener", key, current);
        if !(weight.is_finite() && weight >= 0.0) {
            return Err(invalid("screener", key, "weights must be non-negative"));
        }
        indicator_weights.insert(category, weight);
    }

    let screener = ScreenerConfig {
        min_price: config.get_double("screener", "min_price", base.min_price),
        max_price: config.get_double("screener", "max_price", base.max_price),
        min_volume: config.get_double("screener", "min_volume", base.min_volume),
        min_market_cap: config.get_double("screener", "min_market_cap", base.min_market_cap),
        indicator_weights,
        max_concurrency: max_concurrency as usize,
        lookback_months: lookback_months as u32,
    };

    if !(screener.min_price >= 0.0 && screener.min_price <= screener.max_price) {
        return Err(invalid(
            "screener",
            "min_price",
            "min_price must be non-negative and no greater than max_price",
        ));
    }
    if screener.min_volume < 0.0 {
        return Err(invalid("screener", "min_volume", "min_volume must be non-negative"));
    }
    if screener.min_market_cap < 0.0 {
        return Err(invalid(
            "screener",
            "min_market_cap",
            "min_market_cap must be non-negative",
        ));
    }

    let symbols = non_empty(config, "screener", "symbols").map(|list| parse_symbols(&list));
    if symbols.as_ref().is_some_and(Vec::is_empty) {
        return Err(invalid("screener", "symbols", "symbol list is empty"));
    }

    Ok(ScreenerSettings {
        config: screener,
        preset,
        symbols,
    })
}

/// Comma-separated, upper-cased, duplicates dropped in first-seen order.
pub fn parse_symbols(list: &str) -> Vec<String> {
    let mut symbols: Vec<String> = Vec::new();
    for symbol in list.split(',').map(|s| s.trim().to_uppercase()) {
        if !symbol.is_empty() && !symbols.contains(&symbol) {
            symbols.push(symbol);
        }
    }
    symbols
}

pub fn load_data_settings(config: &dyn ConfigPort) -> Result<DataSettings, MarketPulseError> {
    let retry_attempts = config.get_int("data", "retry_attempts", DEFAULT_RETRY_ATTEMPTS);
    if !(1..=i64::from(u32::MAX)).contains(&retry_attempts) {
        return Err(invalid(
            "data",
            "retry_attempts",
            "retry_attempts must be at least 1",
        ));
    }
    let retry_delay_ms = config.get_int("data", "retry_delay_ms", DEFAULT_RETRY_DELAY_MS);
    if retry_delay_ms < 0 {
        return Err(invalid(
            "data",
            "retry_delay_ms",
            "retry_delay_ms must be non-negative",
        ));
    }
    Ok(DataSettings {
        dir: non_empty(config, "data", "dir").map(PathBuf::from),
        retry_attempts: retry_attempts as u32,
        retry_delay_ms: retry_delay_ms as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn empty_config_yields_defaults() {
        let config = make_config("");
        assert_eq!(load_advisor_settings(&config).unwrap(), AdvisorSettings::default());

        let screener = load_screener_settings(&config).unwrap();
        assert_eq!(screener.config, ScreenerConfig::default());
        assert_eq!(screener.preset, None);
        assert_eq!(screener.symbols, None);

        let data = load_data_settings(&config).unwrap();
        assert_eq!(data.retry_attempts, 3);
        assert_eq!(data.retry_delay_ms, 500);
        assert_eq!(data.dir, None);
    }

    #[test]
    fn advisor_section_parses() {
        let config =
            make_config("[advisor]\nrisk_tolerance = Aggressive\nportfolio_value = 250000\n");
        let settings = load_advisor_settings(&config).unwrap();
        assert_eq!(settings.risk_tolerance, RiskTolerance::Aggressive);
        assert_eq!(settings.portfolio_value, 250_000.0);
    }

    #[test]
    fn unknown_risk_tolerance_fails() {
        let config = make_config("[advisor]\nrisk_tolerance = reckless\n");
        let err = load_advisor_settings(&config).unwrap_err();
        assert!(
            matches!(err, MarketPulseError::ConfigInvalid { key, .. } if key == "risk_tolerance")
        );
    }

    #[test]
    fn portfolio_value_must_be_positive() {
        let config = make_config("[advisor]\nportfolio_value = 0\n");
        let err = load_advisor_settings(&config).unwrap_err();
        assert!(
            matches!(err, MarketPulseError::ConfigInvalid { key, .. } if key == "portfolio_value")
        );
    }

    #[test]
    fn preset_then_explicit_override() {
        let config = make_config("[screener]\npreset = High Volume\nmin_price = 20\n");
        let settings = load_screener_settings(&config).unwrap();
        assert_eq!(settings.preset, Some(FilterPreset::HighVolume));
        assert_eq!(settings.config.min_price, 20.0);
        assert_eq!(settings.config.min_volume, 1_000_000.0);
    }

    #[test]
    fn unknown_preset_fails() {
        let config = make_config("[screener]\npreset = Meme Stocks\n");
        let err = load_screener_settings(&config).unwrap_err();
        assert!(matches!(err, MarketPulseError::ConfigInvalid { key, .. } if key == "preset"));
    }

    #[test]
    fn inverted_price_bounds_fail() {
        let config = make_config("[screener]\nmin_price = 500\nmax_price = 100\n");
        let err = load_screener_settings(&config).unwrap_err();
        assert!(matches!(err, MarketPulseError::ConfigInvalid { key, .. } if key == "min_price"));
    }

    #[test]
    fn zero_concurrency_fails() {
        let config = make_config("[screener]\nmax_concurrency = 0\n");
        let err = load_screener_settings(&config).unwrap_err();
        assert!(
            matches!(err, MarketPulseError::ConfigInvalid { key, .. } if key == "max_concurrency")
        );
    }

    #[test]
    fn negative_weight_fails() {
        let config = make_config("[screener]\nweight_volume = -0.2\n");
        let err = load_screener_settings(&config).unwrap_err();
        assert!(
            matches!(err, MarketPulseError::ConfigInvalid { key, .. } if key == "weight_volume")
        );
    }

    #[test]
    fn weights_are_carried() {
        let config = make_config("[screener]\nweight_trend = 0.5\n");
        let settings = load_screener_settings(&config).unwrap();
        assert_eq!(
            settings.config.indicator_weights[&IndicatorCategory::Trend],
            0.5
        );
        assert_eq!(
            settings.config.indicator_weights[&IndicatorCategory::Volume],
            0.2
        );
    }

    #[test]
    fn symbols_are_normalized() {
        let config = make_config("[screener]\nsymbols = aapl, MSFT,,aapl , nvda\n");
        let settings = load_screener_settings(&config).unwrap();
        assert_eq!(
            settings.symbols,
            Some(vec!["AAPL".to_string(), "MSFT".to_string(), "NVDA".to_string()])
        );
    }

    #[test]
    fn zero_retry_attempts_fail() {
        let config = make_config("[data]\nretry_attempts = 0\n");
        let err = load_data_settings(&config).unwrap_err();
        assert!(
            matches!(err, MarketPulseError::ConfigInvalid { key, .. } if key == "retry_attempts")
        );
    }

    #[test]
    fn data_dir_is_read() {
        let config = make_config("[data]\ndir = /var/lib/quotes\nretry_delay_ms = 0\n");
        let data = load_data_settings(&config).unwrap();
        assert_eq!(data.dir, Some(PathBuf::from("/var/lib/quotes")));
        assert_eq!(data.retry_delay_ms, 0);
    }
}
