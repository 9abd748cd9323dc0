//! Domain error types.

/// Top-level error type for marketpulse.
#[derive(Debug, thiserror::Error)]
pub enum MarketPulseError {
    #[error("insufficient data for {symbol}: have {bars} bars, need {minimum}")]
    InsufficientData {
        symbol: String,
        bars: usize,
        minimum: usize,
    },

    #[error("no comparison series supplied for {symbol}")]
    MissingComparison { symbol: String },

    #[error("invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    #[error("invalid series: {reason}")]
    InvalidSeries { reason: String },

    /// Transient fetch failure; retry adapters may try again.
    #[error("provider error for {symbol}: {reason}")]
    Provider { symbol: String, reason: String },

    /// Missing or malformed source data. Retrying cannot help.
    #[error("no usable data for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl MarketPulseError {
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        MarketPulseError::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    pub fn insufficient(symbol: &str, bars: usize, minimum: usize) -> Self {
        MarketPulseError::InsufficientData {
            symbol: symbol.to_string(),
            bars,
            minimum,
        }
    }
}

impl From<&MarketPulseError> for std::process::ExitCode {
    fn from(err: &MarketPulseError) -> Self {
        let code: u8 = match err {
            MarketPulseError::Io(_) => 1,
            MarketPulseError::ConfigParse { .. }
            | MarketPulseError::ConfigMissing { .. }
            | MarketPulseError::ConfigInvalid { .. }
            | MarketPulseError::InvalidConfiguration { .. } => 2,
            MarketPulseError::Provider { .. } | MarketPulseError::DataUnavailable { .. } => 3,
            MarketPulseError::InvalidSeries { .. } | MarketPulseError::MissingComparison { .. } => 4,
            MarketPulseError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
