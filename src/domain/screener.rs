//! Opportunity screening across a symbol universe.
//!
//! Each symbol is fetched, filtered, scored and banded independently on a
//! bounded worker pool. A symbol that fails is skipped and logged; the batch
//! always completes.

use crate::domain::error::MarketPulseError;
use crate::domain::indicator::atr::DEFAULT_PERIOD as ATR_PERIOD;
use crate::domain::indicator::rsi::{DEFAULT_PERIOD as RSI_PERIOD, OVERBOUGHT, OVERSOLD};
use crate::domain::indicator::{calculate_atr, calculate_macd_default, calculate_rsi};
use crate::domain::ohlcv::TimeSeries;
use crate::domain::pattern::momentum_over;
use crate::domain::stats::mean;
use crate::ports::data_port::DataPort;
use chrono::{Months, NaiveDate};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

pub const MIN_SCREEN_BARS: usize = 50;
pub const DEFAULT_QUICK_SCREEN_LIMIT: usize = 50;
/// Opportunity momentum compares the last close with the fifth-from-last.
pub const SCREEN_MOMENTUM_LOOKBACK: usize = 4;

pub const DEFAULT_UNIVERSE: [&str; 43] = [
    "AAPL", "MSFT", "GOOGL", "META", "NVDA", "AMD", "INTC", "CSCO", // tech
    "TSLA", "F", "GM", "TM", "RIVN", "LCID", "NIO", // autos
    "JPM", "BAC", "GS", "MS", "V", "MA", "PYPL", // financials
    "AMZN", "WMT", "TGT", "COST", "HD", "SHOP", // retail
    "NFLX", "DIS", "T", "VZ", "TMUS", "CMCSA", // media and telecom
    "XOM", "CVX", "COP", "BP", "SHEL", // energy
    "SPY", "QQQ", "IWM", "DIA", // index funds
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorCategory {
    Trend,
    Momentum,
    Volume,
    Volatility,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScreenerConfig {
    pub min_price: f64,
    pub max_price: f64,
    /// Minimum average daily volume over the window.
    pub min_volume: f64,
    pub min_market_cap: f64,
    pub indicator_weights: HashMap<IndicatorCategory, f64>,
    pub max_concurrency: usize,
    pub lookback_months: u32,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            min_price: 5.0,
            max_price: 1000.0,
            min_volume: 500_000.0,
            min_market_cap: 100_000_000.0,
            indicator_weights: HashMap::from([
                (IndicatorCategory::Trend, 0.3),
                (IndicatorCategory::Momentum, 0.3),
                (IndicatorCategory::Volume, 0.2),
                (IndicatorCategory::Volatility, 0.2),
            ]),
            max_concurrency: 4,
            lookback_months: 3,
        }
    }
}

impl ScreenerConfig {
    pub fn validate(&self) -> Result<(), MarketPulseError> {
        if !(self.min_price >= 0.0 && self.min_price <= self.max_price) {
            return Err(MarketPulseError::invalid_config(format!(
                "price bounds must satisfy 0 <= min_price <= max_price (got {} and {})",
                self.min_price, self.max_price
            )));
        }
        if self.min_volume < 0.0 || self.min_market_cap < 0.0 {
            return Err(MarketPulseError::invalid_config(
                "min_volume and min_market_cap must be non-negative",
            ));
        }
        if self.indicator_weights.values().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(MarketPulseError::invalid_config(
                "indicator weights must be finite and non-negative",
            ));
        }
        if self.max_concurrency == 0 {
            return Err(MarketPulseError::invalid_config("max_concurrency must be at least 1"));
        }
        if self.lookback_months == 0 {
            return Err(MarketPulseError::invalid_config("lookback_months must be at least 1"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterPreset {
    HighVolume,
    MostActive,
    LargeCapOnly,
    PennyStocks,
    VolatileStocks,
}

impl FilterPreset {
    pub const ALL: [FilterPreset; 5] = [
        FilterPreset::HighVolume,
        FilterPreset::MostActive,
        FilterPreset::LargeCapOnly,
        FilterPreset::PennyStocks,
        FilterPreset::VolatileStocks,
    ];

    /// Preset bounds on top of the defaults.
    pub fn config(&self) -> ScreenerConfig {
        let base = ScreenerConfig::default();
        match self {
            FilterPreset::HighVolume => ScreenerConfig {
                min_volume: 1_000_000.0,
                min_price: 10.0,
                min_market_cap: 1_000_000_000.0,
                ..base
            },
            FilterPreset::MostActive => ScreenerConfig {
                min_volume: 5_000_000.0,
                min_price: 5.0,
                ..base
            },
            FilterPreset::LargeCapOnly => ScreenerConfig {
                min_market_cap: 10_000_000_000.0,
                min_volume: 500_000.0,
                ..base
            },
            FilterPreset::PennyStocks => ScreenerConfig {
                min_price: 0.0,
                max_price: 5.0,
                min_volume: 100_000.0,
                min_market_cap: 50_000_000.0,
                ..base
            },
            FilterPreset::VolatileStocks => ScreenerConfig {
                min_volume: 500_000.0,
                ..base
            },
        }
    }
}

impl fmt::Display for FilterPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FilterPreset::HighVolume => "High Volume",
            FilterPreset::MostActive => "Most Active",
            FilterPreset::LargeCapOnly => "Large Cap Only",
            FilterPreset::PennyStocks => "Penny Stocks",
            FilterPreset::VolatileStocks => "Volatile Stocks",
        };
        f.write_str(name)
    }
}

impl FromStr for FilterPreset {
    type Err = MarketPulseError;

    /// Accepts the display name in any case, with spaces, dashes or underscores.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_lowercase();
        FilterPreset::ALL
            .into_iter()
            .find(|p| p.to_string().replace(' ', "").to_lowercase() == normalized)
            .ok_or_else(|| MarketPulseError::invalid_config(format!("unknown screener preset '{s}'")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ScoreBand {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
}

impl ScoreBand {
    /// Bands: ≥80, ≥60, ≤20, ≤40, otherwise HOLD. Scores strictly between
    /// 40 and 60 all land in HOLD.
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            ScoreBand::StrongBuy
        } else if score >= 60.0 {
            ScoreBand::Buy
        } else if score <= 20.0 {
            ScoreBand::StrongSell
        } else if score <= 40.0 {
            ScoreBand::Sell
        } else {
            ScoreBand::Hold
        }
    }
}

impl fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ScoreBand::StrongBuy => "STRONG BUY",
            ScoreBand::Buy => "BUY",
            ScoreBand::Hold => "HOLD",
            ScoreBand::Sell => "SELL",
            ScoreBand::StrongSell => "STRONG SELL",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreInputs {
    pub rsi: f64,
    pub latest_close: f64,
    pub mean_close: f64,
    pub latest_volume: f64,
    pub mean_volume: f64,
}

/// 50 base, ±20 for RSI extremes, +10 for close above its window mean,
/// +10 for volume above its window mean; clamped to [0, 100].
pub fn calculate_score(inputs: &ScoreInputs) -> f64 {
    let mut score: f64 = 50.0;
    if inputs.rsi < OVERSOLD {
        score += 20.0;
    } else if inputs.rsi > OVERBOUGHT {
        score -= 20.0;
    }
    if inputs.latest_close > inputs.mean_close {
        score += 10.0;
    }
    if inputs.latest_volume > inputs.mean_volume {
        score += 10.0;
    }
    score.clamp(0.0, 100.0)
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Opportunity {
    pub symbol: String,
    pub price: f64,
    pub score: f64,
    /// Percent change over `SCREEN_MOMENTUM_LOOKBACK` bars.
    pub momentum: f64,
    /// +1 when the latest volume exceeds the window mean, else -1.
    pub volume_trend: i8,
    pub rsi: f64,
    pub macd_histogram: Option<f64>,
    pub atr: Option<f64>,
    pub recommendation: ScoreBand,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    Failed(String),
    InsufficientBars { bars: usize },
    OutsideBounds(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Failed(reason) => write!(f, "failed: {reason}"),
            SkipReason::InsufficientBars { bars } => {
                write!(f, "only {bars} bars, minimum {MIN_SCREEN_BARS} required")
            }
            SkipReason::OutsideBounds(reason) => write!(f, "filtered: {reason}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScreenReport {
    /// Sorted by descending score.
    pub opportunities: Vec<Opportunity>,
    pub skipped: Vec<SkippedSymbol>,
}

pub struct Screener<'a> {
    data_port: &'a dyn DataPort,
    universe: Vec<String>,
}

impl<'a> Screener<'a> {
    pub fn new(data_port: &'a dyn DataPort) -> Self {
        Self {
            data_port,
            universe: DEFAULT_UNIVERSE.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_universe(data_port: &'a dyn DataPort, universe: Vec<String>) -> Self {
        Self {
            data_port,
            universe,
        }
    }

    pub fn universe(&self) -> &[String] {
        &self.universe
    }

    pub fn screen(
        &self,
        config: &ScreenerConfig,
        as_of: NaiveDate,
    ) -> Result<ScreenReport, MarketPulseError> {
        config.validate()?;
        let start = as_of
            .checked_sub_months(Months::new(config.lookback_months))
            .ok_or_else(|| {
                MarketPulseError::invalid_config(format!(
                    "cannot look back {} months from {as_of}",
                    config.lookback_months
                ))
            })?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.max_concurrency)
            .thread_name(|i| format!("marketpulse-screen-{i}"))
            .build()
            .map_err(|e| MarketPulseError::invalid_config(format!("worker pool: {e}")))?;

        let outcomes: Vec<(String, Result<Opportunity, SkipReason>)> = pool.install(|| {
            self.universe
                .par_iter()
                .map(|symbol| (symbol.clone(), self.evaluate(symbol, config, start, as_of)))
                .collect()
        });

        let mut report = ScreenReport::default();
        for (symbol, outcome) in outcomes {
            match outcome {
                Ok(opportunity) => report.opportunities.push(opportunity),
                Err(reason) => {
                    match &reason {
                        SkipReason::Failed(_) => {
                            tracing::warn!(%symbol, %reason, "skipping symbol")
                        }
                        _ => tracing::debug!(%symbol, %reason, "symbol rejected"),
                    }
                    report.skipped.push(SkippedSymbol { symbol, reason });
                }
            }
        }
        report
            .opportunities
            .sort_by(|a, b| b.score.total_cmp(&a.score));

        tracing::info!(
            screened = self.universe.len(),
            matched = report.opportunities.len(),
            skipped = report.skipped.len(),
            "screen complete"
        );
        Ok(report)
    }

    /// Screens with a preset's bounds and keeps the top `limit` results.
    pub fn quick_screen(
        &self,
        preset: FilterPreset,
        limit: usize,
        as_of: NaiveDate,
    ) -> Result<ScreenReport, MarketPulseError> {
        let mut report = self.screen(&preset.config(), as_of)?;
        report.opportunities.truncate(limit);
        Ok(report)
    }

    fn evaluate(
        &self,
        symbol: &str,
        config: &ScreenerConfig,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Opportunity, SkipReason> {
        let failed = |e: MarketPulseError| SkipReason::Failed(e.to_string());

        let bars = self
            .data_port
            .fetch_ohlcv(symbol, start, end)
            .map_err(failed)?;
        let series = TimeSeries::new(symbol, bars).map_err(failed)?;
        if series.len() < MIN_SCREEN_BARS {
            return Err(SkipReason::InsufficientBars { bars: series.len() });
        }

        let closes = series.closes();
        let volumes = series.volumes();
        let (Some(price), Some(latest_volume)) = (closes.last().copied(), volumes.last().copied())
        else {
            return Err(SkipReason::InsufficientBars { bars: 0 });
        };
        let mean_close = mean(&closes).unwrap_or(price);
        let mean_volume = mean(&volumes).unwrap_or(latest_volume);

        if price < config.min_price || price > config.max_price {
            return Err(SkipReason::OutsideBounds(format!(
                "price {price:.2} outside [{}, {}]",
                config.min_price, config.max_price
            )));
        }
        if mean_volume < config.min_volume {
            return Err(SkipReason::OutsideBounds(format!(
                "average volume {mean_volume:.0} below {}",
                config.min_volume
            )));
        }
        if let Some(cap) = self.data_port.market_cap(symbol).map_err(failed)? {
            if cap < config.min_market_cap {
                return Err(SkipReason::OutsideBounds(format!(
                    "market cap {cap:.0} below {}",
                    config.min_market_cap
                )));
            }
        }

        let bars = series.bars();
        let rsi = calculate_rsi(bars, RSI_PERIOD)
            .latest_simple()
            .ok_or_else(|| SkipReason::InsufficientBars { bars: series.len() })?;
        let macd_histogram = calculate_macd_default(bars)
            .latest()
            .and_then(|p| p.macd())
            .map(|(_, _, histogram)| histogram);
        let atr = calculate_atr(bars, ATR_PERIOD).latest_simple();

        let score = calculate_score(&ScoreInputs {
            rsi,
            latest_close: price,
            mean_close,
            latest_volume,
            mean_volume,
        });

        Ok(Opportunity {
            symbol: symbol.to_string(),
            price,
            score,
            momentum: momentum_over(&closes, SCREEN_MOMENTUM_LOOKBACK).unwrap_or(0.0),
            volume_trend: if latest_volume > mean_volume { 1 } else { -1 },
            rsi,
            macd_histogram,
            atr,
            recommendation: ScoreBand::from_score(score),
        })
    }
}
