//! Rule-based trade advice: maps an analysis bundle, a price and a portfolio
//! size to an action, a confidence and stop/target/position parameters.

use crate::domain::analysis::AnalysisBundle;
use crate::domain::error::MarketPulseError;
use crate::domain::indicator::rsi::{OVERBOUGHT, OVERSOLD};
use crate::domain::signal::Direction;
use std::fmt;
use std::str::FromStr;

pub const REWARD_TO_RISK: f64 = 2.0;
pub const HIGH_VOLATILITY: f64 = 0.4;
pub const EXTREME_OVERSOLD: f64 = 20.0;
pub const EXTREME_OVERBOUGHT: f64 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum RiskTolerance {
    Conservative,
    #[default]
    Moderate,
    Aggressive,
}

impl RiskTolerance {
    /// Fraction of the portfolio allotted to one position.
    pub fn position_fraction(&self) -> f64 {
        match self {
            RiskTolerance::Conservative => 0.02,
            RiskTolerance::Moderate => 0.05,
            RiskTolerance::Aggressive => 0.10,
        }
    }
}

impl FromStr for RiskTolerance {
    type Err = MarketPulseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "conservative" => Ok(RiskTolerance::Conservative),
            "moderate" => Ok(RiskTolerance::Moderate),
            "aggressive" => Ok(RiskTolerance::Aggressive),
            other => Err(MarketPulseError::invalid_config(format!(
                "unknown risk tolerance '{other}'"
            ))),
        }
    }
}

impl fmt::Display for RiskTolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RiskTolerance::Conservative => "conservative",
            RiskTolerance::Moderate => "moderate",
            RiskTolerance::Aggressive => "aggressive",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Buy => write!(f, "BUY"),
            Action::Sell => write!(f, "SELL"),
            Action::Hold => write!(f, "HOLD"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Recommendation {
    pub action: Action,
    /// 0..=100
    pub confidence: u8,
    pub reasoning: Vec<String>,
    pub stop_loss: f64,
    pub target_price: f64,
    pub recommended_shares: u64,
    pub max_position_value: f64,
    pub risk_per_share: f64,
    pub potential_profit_per_share: f64,
    pub alerts: Vec<String>,
}

/// The subset of an analysis the decision rules read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdvisorInputs {
    pub rsi: f64,
    pub volatility: f64,
    /// Loss percentile as a negative return fraction.
    pub var_95: f64,
    pub ma_signal: Option<Direction>,
    pub high_volume: bool,
}

impl AdvisorInputs {
    pub fn from_bundle(bundle: &AnalysisBundle) -> Result<Self, MarketPulseError> {
        let insufficient = |minimum: usize| {
            MarketPulseError::insufficient(&bundle.symbol, bundle.series.len(), minimum)
        };
        Ok(Self {
            rsi: bundle
                .latest_rsi()
                .ok_or_else(|| insufficient(bundle.rsi_period + 1))?,
            volatility: bundle.volatility().ok_or_else(|| insufficient(3))?,
            var_95: bundle.var_95().ok_or_else(|| insufficient(2))?,
            ma_signal: bundle.ma_signal,
            high_volume: bundle.has_high_volume_days(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct TradeAdvisor {
    pub risk_tolerance: RiskTolerance,
}

impl TradeAdvisor {
    pub fn new(risk_tolerance: RiskTolerance) -> Self {
        Self { risk_tolerance }
    }

    pub fn advise(
        &self,
        bundle: &AnalysisBundle,
        current_price: f64,
        portfolio_value: f64,
    ) -> Result<Recommendation, MarketPulseError> {
        validate_amounts(current_price, portfolio_value)?;
        let inputs = AdvisorInputs::from_bundle(bundle)?;
        self.evaluate(&inputs, current_price, portfolio_value)
    }

    pub fn evaluate(
        &self,
        inputs: &AdvisorInputs,
        current_price: f64,
        portfolio_value: f64,
    ) -> Result<Recommendation, MarketPulseError> {
        validate_amounts(current_price, portfolio_value)?;

        let max_position = portfolio_value * self.risk_tolerance.position_fraction();
        let stop_loss = current_price * (1.0 + inputs.var_95);
        let target_price = current_price + (current_price - stop_loss) * REWARD_TO_RISK;

        let (action, confidence, reasoning) = generate_signal(inputs.rsi, inputs.ma_signal);
        let recommended_shares = (max_position / current_price).floor() as u64;

        tracing::debug!(
            rsi = inputs.rsi,
            %action,
            confidence,
            recommended_shares,
            "trade advice evaluated"
        );

        Ok(Recommendation {
            action,
            confidence,
            reasoning,
            stop_loss: round2(stop_loss),
            target_price: round2(target_price),
            recommended_shares,
            max_position_value: round2(max_position),
            risk_per_share: round2(current_price - stop_loss),
            potential_profit_per_share: round2(target_price - current_price),
            alerts: generate_alerts(inputs),
        })
    }
}

fn validate_amounts(current_price: f64, portfolio_value: f64) -> Result<(), MarketPulseError> {
    if !(current_price.is_finite() && current_price > 0.0) {
        return Err(MarketPulseError::invalid_config(format!(
            "current price must be positive, got {current_price}"
        )));
    }
    if !(portfolio_value.is_finite() && portfolio_value > 0.0) {
        return Err(MarketPulseError::invalid_config(format!(
            "portfolio value must be positive, got {portfolio_value}"
        )));
    }
    Ok(())
}

/// RSI-driven action table.
///
/// Only the oversold and overbought branches score; inside the overbought
/// branch the moving-average trend nudges the score by one. An RSI in
/// [30, 70] yields HOLD with zero confidence and no reasoning.
pub fn generate_signal(rsi: f64, ma_signal: Option<Direction>) -> (Action, u8, Vec<String>) {
    let mut score: i32 = 0;
    let mut reasons = Vec::new();

    if rsi < OVERSOLD {
        score += 2;
        reasons.push("RSI indicates oversold condition".to_string());
    } else if rsi > OVERBOUGHT {
        score -= 2;
        reasons.push("RSI indicates overbought condition".to_string());
        match ma_signal {
            Some(Direction::Bullish) => {
                score += 1;
                reasons.push("Moving averages show bullish trend".to_string());
            }
            Some(Direction::Bearish) => {
                score -= 1;
                reasons.push("Moving averages show bearish trend".to_string());
            }
            None => {}
        }
    } else {
        return (Action::Hold, 0, reasons);
    }

    let action = if score >= 2 {
        Action::Buy
    } else if score <= -2 {
        Action::Sell
    } else {
        Action::Hold
    };
    let confidence = (score.unsigned_abs() * 25).min(100) as u8;
    (action, confidence, reasons)
}

pub fn generate_alerts(inputs: &AdvisorInputs) -> Vec<String> {
    let mut alerts = Vec::new();
    if inputs.volatility > HIGH_VOLATILITY {
        alerts.push("High volatility - consider smaller position size".to_string());
    }
    if inputs.rsi < EXTREME_OVERSOLD {
        alerts.push("Extremely oversold - strong buy signal but high risk".to_string());
    } else if inputs.rsi > EXTREME_OVERBOUGHT {
        alerts.push("Extremely overbought - consider taking profits".to_string());
    }
    if inputs.high_volume {
        alerts.push("High volume detected - increased signal strength".to_string());
    }
    alerts
}

/// Guidance for an open position.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum HoldingAdvice {
    StopLossHit { stop_loss: f64, pnl_pct: f64 },
    TargetReached { pnl_pct: f64 },
    Profitable { pnl_pct: f64 },
    Monitor { pnl_pct: f64 },
}

impl fmt::Display for HoldingAdvice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HoldingAdvice::StopLossHit { stop_loss, pnl_pct } => write!(
                f,
                "SELL: Stop loss ({stop_loss:.2}) has been hit. Current loss: {pnl_pct:.1}%"
            ),
            HoldingAdvice::TargetReached { pnl_pct } => write!(
                f,
                "Consider taking profits. Target price reached. Current profit: {pnl_pct:.1}%"
            ),
            HoldingAdvice::Profitable { pnl_pct } => {
                write!(f, "Hold position. Currently profitable: {pnl_pct:.1}%")
            }
            HoldingAdvice::Monitor { pnl_pct } => write!(
                f,
                "Hold position but monitor closely. Current loss: {pnl_pct:.1}%"
            ),
        }
    }
}

pub fn holding_advice(
    current_price: f64,
    entry_price: f64,
    stop_loss: f64,
    target_price: f64,
) -> Result<HoldingAdvice, MarketPulseError> {
    if !(entry_price.is_finite() && entry_price > 0.0) {
        return Err(MarketPulseError::invalid_config(format!(
            "entry price must be positive, got {entry_price}"
        )));
    }
    let pnl_pct = (current_price - entry_price) / entry_price * 100.0;
    Ok(if current_price <= stop_loss {
        HoldingAdvice::StopLossHit { stop_loss, pnl_pct }
    } else if current_price >= target_price {
        HoldingAdvice::TargetReached { pnl_pct }
    } else if pnl_pct > 0.0 {
        HoldingAdvice::Profitable { pnl_pct }
    } else {
        HoldingAdvice::Monitor { pnl_pct }
    })
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
