//! Per-symbol analysis: volume, technical and risk analyzers composed into
//! one [`AnalysisBundle`].
//!
//! The input [`TimeSeries`] is only borrowed. Each analyzer returns its own
//! [`IndicatorSet`] fragment and the aggregator merges them into a new value.

use crate::domain::error::MarketPulseError;
use crate::domain::indicator::bollinger::{DEFAULT_MULT_X100, DEFAULT_PERIOD as BOLLINGER_PERIOD};
use crate::domain::indicator::macd::{DEFAULT_FAST, DEFAULT_SIGNAL, DEFAULT_SLOW};
use crate::domain::indicator::risk::{annualized_volatility, max_drawdown, value_at_risk};
use crate::domain::indicator::rsi::DEFAULT_PERIOD as RSI_PERIOD;
use crate::domain::indicator::volume::{
    calculate_volume_sma, calculate_vpt, high_volume_days, DEFAULT_DIVERGENCE_WINDOW,
    DEFAULT_TREND_WINDOW,
};
use crate::domain::indicator::{
    calculate_bollinger, calculate_ema, calculate_macd, calculate_rsi, calculate_sma,
    IndicatorSeries, IndicatorType,
};
use crate::domain::ohlcv::TimeSeries;
use crate::domain::pattern::{self, PatternSummary};
use crate::domain::signal::{merge_by_date, Direction, Signal};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt;

/// Bars needed for the slowest moving average.
pub const MIN_BARS: usize = 50;
pub const FAST_MA: usize = 20;
pub const SLOW_MA: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarMetric {
    Volatility,
    Var95,
    Var99,
    MaxDrawdown,
}

impl fmt::Display for ScalarMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarMetric::Volatility => "volatility",
            ScalarMetric::Var95 => "var_95",
            ScalarMetric::Var99 => "var_99",
            ScalarMetric::MaxDrawdown => "max_drawdown",
        };
        f.write_str(name)
    }
}

/// Derived values for one symbol: aligned series keyed by indicator identity,
/// whole-window scalars, and the dates flagged as volume spikes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorSet {
    pub series: HashMap<IndicatorType, IndicatorSeries>,
    pub scalars: HashMap<ScalarMetric, f64>,
    pub high_volume_days: Vec<NaiveDate>,
}

impl IndicatorSet {
    pub fn insert_series(&mut self, series: IndicatorSeries) {
        self.series.insert(series.indicator_type.clone(), series);
    }

    pub fn get(&self, indicator_type: &IndicatorType) -> Option<&IndicatorSeries> {
        self.series.get(indicator_type)
    }

    pub fn scalar(&self, metric: ScalarMetric) -> Option<f64> {
        self.scalars.get(&metric).copied()
    }

    pub fn merge(&mut self, other: IndicatorSet) {
        self.series.extend(other.series);
        self.scalars.extend(other.scalars);
        self.high_volume_days.extend(other.high_volume_days);
    }
}

/// One analysis capability over a time series.
pub trait Analyzer {
    fn name(&self) -> &'static str;
    fn analyze(&self, series: &TimeSeries) -> Result<IndicatorSet, MarketPulseError>;
}

#[derive(Debug, Clone)]
pub struct VolumeAnalyzer {
    pub trend_window: usize,
}

impl Default for VolumeAnalyzer {
    fn default() -> Self {
        Self {
            trend_window: DEFAULT_TREND_WINDOW,
        }
    }
}

impl Analyzer for VolumeAnalyzer {
    fn name(&self) -> &'static str {
        "volume"
    }

    fn analyze(&self, series: &TimeSeries) -> Result<IndicatorSet, MarketPulseError> {
        let bars = series.bars();
        let mut set = IndicatorSet::default();
        set.insert_series(calculate_volume_sma(bars, self.trend_window));
        set.insert_series(calculate_vpt(bars));
        set.high_volume_days = high_volume_days(bars);
        Ok(set)
    }
}

#[derive(Debug, Clone)]
pub struct TechnicalAnalyzer {
    pub rsi_period: usize,
    pub bollinger_period: usize,
    pub bollinger_mult_x100: u32,
    pub macd: (usize, usize, usize),
    pub fast_ma: usize,
    pub slow_ma: usize,
}

impl Default for TechnicalAnalyzer {
    fn default() -> Self {
        Self {
            rsi_period: RSI_PERIOD,
            bollinger_period: BOLLINGER_PERIOD,
            bollinger_mult_x100: DEFAULT_MULT_X100,
            macd: (DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL),
            fast_ma: FAST_MA,
            slow_ma: SLOW_MA,
        }
    }
}

impl Analyzer for TechnicalAnalyzer {
    fn name(&self) -> &'static str {
        "technical"
    }

    fn analyze(&self, series: &TimeSeries) -> Result<IndicatorSet, MarketPulseError> {
        let bars = series.bars();
        let (fast, slow, signal) = self.macd;
        let mut set = IndicatorSet::default();
        set.insert_series(calculate_rsi(bars, self.rsi_period));
        set.insert_series(calculate_bollinger(
            bars,
            self.bollinger_period,
            self.bollinger_mult_x100,
        ));
        set.insert_series(calculate_macd(bars, fast, slow, signal));
        set.insert_series(calculate_ema(bars, fast));
        set.insert_series(calculate_ema(bars, slow));
        set.insert_series(calculate_sma(bars, self.fast_ma));
        set.insert_series(calculate_sma(bars, self.slow_ma));
        Ok(set)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RiskAnalyzer;

impl Analyzer for RiskAnalyzer {
    fn name(&self) -> &'static str {
        "risk"
    }

    fn analyze(&self, series: &TimeSeries) -> Result<IndicatorSet, MarketPulseError> {
        let mut set = IndicatorSet::default();
        set.scalars
            .insert(ScalarMetric::Volatility, annualized_volatility(series)?);
        set.scalars
            .insert(ScalarMetric::Var95, value_at_risk(series, 0.95)?);
        set.scalars
            .insert(ScalarMetric::Var99, value_at_risk(series, 0.99)?);
        set.scalars
            .insert(ScalarMetric::MaxDrawdown, max_drawdown(series)?);
        Ok(set)
    }
}

/// Everything derived for one symbol. Owns a copy of its series so the
/// bundle can outlive the caller's input.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisBundle {
    pub symbol: String,
    pub series: TimeSeries,
    pub indicators: IndicatorSet,
    pub signals: Vec<Signal>,
    pub patterns: PatternSummary,
    /// Direction of the moving-average trend at the last bar, when both averages are defined.
    pub ma_signal: Option<Direction>,
    pub rsi_period: usize,
}

impl AnalysisBundle {
    pub fn latest_rsi(&self) -> Option<f64> {
        self.indicators
            .get(&IndicatorType::Rsi(self.rsi_period))
            .and_then(IndicatorSeries::latest_simple)
    }

    pub fn latest_close(&self) -> Option<f64> {
        self.series.last().map(|b| b.close)
    }

    pub fn volatility(&self) -> Option<f64> {
        self.indicators.scalar(ScalarMetric::Volatility)
    }

    pub fn var_95(&self) -> Option<f64> {
        self.indicators.scalar(ScalarMetric::Var95)
    }

    pub fn has_high_volume_days(&self) -> bool {
        !self.indicators.high_volume_days.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnalysisAggregator {
    pub volume: VolumeAnalyzer,
    pub technical: TechnicalAnalyzer,
    pub risk: RiskAnalyzer,
}

impl AnalysisAggregator {
    fn analyzers(&self) -> [&dyn Analyzer; 3] {
        [&self.volume, &self.technical, &self.risk]
    }

    pub fn analyze(&self, series: &TimeSeries) -> Result<AnalysisBundle, MarketPulseError> {
        series.require(MIN_BARS)?;

        let mut indicators = IndicatorSet::default();
        for analyzer in self.analyzers() {
            let fragment = analyzer.analyze(series)?;
            tracing::trace!(
                symbol = series.symbol(),
                analyzer = analyzer.name(),
                series = fragment.series.len(),
                scalars = fragment.scalars.len(),
                "analyzer finished"
            );
            indicators.merge(fragment);
        }

        let bars = series.bars();
        let missing = |t: IndicatorType| MarketPulseError::InvalidSeries {
            reason: format!("{t} was not computed for {}", series.symbol()),
        };
        let fast_type = IndicatorType::Sma(self.technical.fast_ma);
        let slow_type = IndicatorType::Sma(self.technical.slow_ma);
        let rsi_type = IndicatorType::Rsi(self.technical.rsi_period);
        let fast = indicators.get(&fast_type).ok_or_else(|| missing(fast_type.clone()))?;
        let slow = indicators.get(&slow_type).ok_or_else(|| missing(slow_type.clone()))?;
        let rsi = indicators.get(&rsi_type).ok_or_else(|| missing(rsi_type.clone()))?;

        let patterns = pattern::summarize(bars, fast, slow);
        let signals = merge_by_date(vec![
            patterns.ma_signals.clone(),
            pattern::volume_price_divergence_signals(bars, DEFAULT_DIVERGENCE_WINDOW),
            pattern::inverse_fvg(bars),
            pattern::rsi_extremes(bars, rsi),
        ]);
        let ma_signal = patterns.trend_strength.map(|t| t.direction());

        tracing::debug!(
            symbol = series.symbol(),
            bars = series.len(),
            signals = signals.len(),
            "analysis bundle built"
        );

        Ok(AnalysisBundle {
            symbol: series.symbol().to_string(),
            series: series.clone(),
            indicators,
            signals,
            patterns,
            ma_signal,
            rsi_period: self.technical.rsi_period,
        })
    }

    /// Cross-symbol divergence between two analyzed symbols.
    pub fn compare(&self, primary: &AnalysisBundle, comparison: Option<&AnalysisBundle>) -> Vec<Signal> {
        pattern::smt_divergence(&primary.series, comparison.map(|b| &b.series))
    }
}
