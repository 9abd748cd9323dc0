//! CLI definition and dispatch.

use chrono::{Months, NaiveDate};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::retry_adapter::RetryingDataPort;
use crate::domain::advisor::{holding_advice, Recommendation, RiskTolerance, TradeAdvisor};
use crate::domain::analysis::{AnalysisAggregator, AnalysisBundle};
use crate::domain::config_validation::{
    load_advisor_settings, load_data_settings, load_screener_settings, validate_portfolio_value,
    AdvisorSettings, DataSettings, ScreenerSettings,
};
use crate::domain::error::MarketPulseError;
use crate::domain::ohlcv::TimeSeries;
use crate::domain::pattern;
use crate::domain::screener::{
    FilterPreset, ScreenReport, Screener, DEFAULT_QUICK_SCREEN_LIMIT,
};
use crate::domain::signal::Signal;
use crate::ports::data_port::DataPort;

/// History fetched for a single-symbol analysis.
pub const ANALYSIS_LOOKBACK_MONTHS: u32 = 12;

#[derive(Parser, Debug)]
#[command(
    name = "marketpulse",
    about = "Technical analysis, trade advice and stock screening"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze one symbol and print a trade recommendation
    Analyze {
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
        #[arg(short, long)]
        symbol: String,
        /// Second symbol for SMT divergence
        #[arg(long)]
        compare: Option<String>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        portfolio_value: Option<f64>,
        #[arg(long)]
        risk_tolerance: Option<RiskTolerance>,
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// Screen the symbol universe and rank opportunities
    Screen {
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        preset: Option<FilterPreset>,
        #[arg(short, long, default_value_t = DEFAULT_QUICK_SCREEN_LIMIT)]
        limit: usize,
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// Advise on an open position
    Hold {
        #[arg(long)]
        entry: f64,
        #[arg(long)]
        current: f64,
        #[arg(long)]
        stop_loss: f64,
        #[arg(long)]
        target: f64,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Analyze {
            data_dir,
            symbol,
            compare,
            config,
            portfolio_value,
            risk_tolerance,
            as_of,
        } => run_analyze(
            data_dir,
            &symbol,
            compare.as_deref(),
            config.as_deref(),
            portfolio_value,
            risk_tolerance,
            as_of,
        ),
        Command::Screen {
            data_dir,
            config,
            preset,
            limit,
            as_of,
        } => run_screen(data_dir, config.as_deref(), preset, limit, as_of),
        Command::Hold {
            entry,
            current,
            stop_loss,
            target,
        } => holding_advice(current, entry, stop_loss, target)
            .and_then(|advice| writeln!(io::stdout(), "{advice}").map_err(MarketPulseError::from)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Reads the INI file at `path`, or an empty configuration when none is given.
pub fn load_config(path: Option<&Path>) -> Result<FileConfigAdapter, MarketPulseError> {
    match path {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading config");
            FileConfigAdapter::from_file(path)
        }
        None => FileConfigAdapter::from_string(""),
    }
}

pub fn resolve_data_dir(
    cli_dir: Option<PathBuf>,
    settings: &DataSettings,
) -> Result<PathBuf, MarketPulseError> {
    cli_dir
        .or_else(|| settings.dir.clone())
        .ok_or_else(|| MarketPulseError::ConfigMissing {
            section: "data".to_string(),
            key: "dir".to_string(),
        })
}

pub fn build_data_port(dir: PathBuf, settings: &DataSettings) -> RetryingDataPort<CsvAdapter> {
    RetryingDataPort::new(
        CsvAdapter::new(dir),
        settings.retry_attempts,
        Duration::from_millis(settings.retry_delay_ms),
    )
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn months_before(as_of: NaiveDate, months: u32) -> Result<NaiveDate, MarketPulseError> {
    as_of
        .checked_sub_months(Months::new(months))
        .ok_or_else(|| {
            MarketPulseError::invalid_config(format!("cannot look back {months} months from {as_of}"))
        })
}

fn run_analyze(
    data_dir: Option<PathBuf>,
    symbol: &str,
    compare: Option<&str>,
    config_path: Option<&Path>,
    portfolio_value: Option<f64>,
    risk_tolerance: Option<RiskTolerance>,
    as_of: Option<NaiveDate>,
) -> Result<(), MarketPulseError> {
    let config = load_config(config_path)?;
    let data = load_data_settings(&config)?;
    let mut advisor = load_advisor_settings(&config)?;
    if let Some(value) = portfolio_value {
        validate_portfolio_value(value)?;
        advisor.portfolio_value = value;
    }
    if let Some(tolerance) = risk_tolerance {
        advisor.risk_tolerance = tolerance;
    }

    let data_port = build_data_port(resolve_data_dir(data_dir, &data)?, &data);
    let report = analyze_symbol(
        &data_port,
        &symbol.to_uppercase(),
        compare.map(str::to_uppercase).as_deref(),
        &advisor,
        as_of.unwrap_or_else(today),
    )?;
    print_analysis(&report, &mut io::stdout().lock())?;
    Ok(())
}

fn run_screen(
    data_dir: Option<PathBuf>,
    config_path: Option<&Path>,
    preset: Option<FilterPreset>,
    limit: usize,
    as_of: Option<NaiveDate>,
) -> Result<(), MarketPulseError> {
    let config = load_config(config_path)?;
    let data = load_data_settings(&config)?;
    let settings = load_screener_settings(&config)?;

    let data_port = build_data_port(resolve_data_dir(data_dir, &data)?, &data);
    let report = screen_symbols(
        &data_port,
        &settings,
        preset,
        limit,
        as_of.unwrap_or_else(today),
    )?;
    print_screen(&report, &mut io::stdout().lock())?;
    Ok(())
}

/// Bundle, optional pair signals and the advice for one symbol.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub bundle: AnalysisBundle,
    pub comparison_signals: Vec<Signal>,
    pub recommendation: Recommendation,
}

pub fn analyze_symbol(
    data_port: &dyn DataPort,
    symbol: &str,
    compare: Option<&str>,
    advisor: &AdvisorSettings,
    as_of: NaiveDate,
) -> Result<AnalysisReport, MarketPulseError> {
    let start = months_before(as_of, ANALYSIS_LOOKBACK_MONTHS)?;
    let aggregator = AnalysisAggregator::default();

    let series = TimeSeries::new(symbol, data_port.fetch_ohlcv(symbol, start, as_of)?)?;
    let bundle = aggregator.analyze(&series)?;

    let comparison_signals = match compare {
        Some(other) => {
            let bars = data_port.fetch_ohlcv(other, start, as_of)?;
            let comparison = if bars.is_empty() {
                None
            } else {
                Some(TimeSeries::new(other, bars)?)
            };
            pattern::smt_divergence(&bundle.series, comparison.as_ref())
        }
        None => Vec::new(),
    };

    let price = bundle
        .latest_close()
        .ok_or_else(|| MarketPulseError::insufficient(symbol, 0, 1))?;
    let recommendation = TradeAdvisor::new(advisor.risk_tolerance).advise(
        &bundle,
        price,
        advisor.portfolio_value,
    )?;

    tracing::info!(
        symbol,
        action = %recommendation.action,
        confidence = recommendation.confidence,
        "analysis complete"
    );

    Ok(AnalysisReport {
        bundle,
        comparison_signals,
        recommendation,
    })
}

/// A CLI preset replaces the configured bounds; otherwise the `[screener]`
/// section applies.
pub fn screen_symbols(
    data_port: &dyn DataPort,
    settings: &ScreenerSettings,
    preset: Option<FilterPreset>,
    limit: usize,
    as_of: NaiveDate,
) -> Result<ScreenReport, MarketPulseError> {
    let screener = match &settings.symbols {
        Some(symbols) => Screener::with_universe(data_port, symbols.clone()),
        None => Screener::new(data_port),
    };
    match preset {
        Some(preset) => {
            tracing::info!(%preset, "quick screen");
            screener.quick_screen(preset, limit, as_of)
        }
        None => {
            let mut report = screener.screen(&settings.config, as_of)?;
            report.opportunities.truncate(limit);
            Ok(report)
        }
    }
}

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.precision$}"))
}

pub fn print_analysis(report: &AnalysisReport, out: &mut impl Write) -> io::Result<()> {
    let bundle = &report.bundle;
    let rec = &report.recommendation;

    writeln!(out, "=== {} ===", bundle.symbol)?;
    writeln!(out, "Bars:             {}", bundle.series.len())?;
    writeln!(out, "Last Close:       {}", fmt_opt(bundle.latest_close(), 2))?;
    writeln!(out, "RSI:              {}", fmt_opt(bundle.latest_rsi(), 2))?;
    writeln!(
        out,
        "Volatility:       {}",
        fmt_opt(bundle.volatility().map(|v| v * 100.0), 2)
    )?;
    writeln!(
        out,
        "VaR (95%):        {}",
        fmt_opt(bundle.var_95().map(|v| v * 100.0), 2)
    )?;
    writeln!(
        out,
        "Momentum (5d):    {}",
        fmt_opt(bundle.patterns.momentum, 2)
    )?;
    match bundle.patterns.trend_strength {
        Some(trend) => writeln!(out, "Trend:            {trend}")?,
        None => writeln!(out, "Trend:            n/a")?,
    }

    let signals = bundle.signals.iter().chain(&report.comparison_signals);
    if !bundle.signals.is_empty() || !report.comparison_signals.is_empty() {
        writeln!(out, "\n=== Signals ===")?;
        for signal in signals {
            writeln!(
                out,
                "  {}  {:<28} {:>10.2}  {}",
                signal.date, signal.kind, signal.price, signal.reason
            )?;
        }
    }

    writeln!(out, "\n=== Recommendation ===")?;
    writeln!(out, "Action:           {} ({}%)", rec.action, rec.confidence)?;
    for reason in &rec.reasoning {
        writeln!(out, "  - {reason}")?;
    }
    writeln!(out, "Stop Loss:        {:.2}", rec.stop_loss)?;
    writeln!(out, "Target:           {:.2}", rec.target_price)?;
    writeln!(
        out,
        "Position:         {} shares (max ${:.2})",
        rec.recommended_shares, rec.max_position_value
    )?;
    writeln!(
        out,
        "Risk/Reward:      {:.2} / {:.2} per share",
        rec.risk_per_share, rec.potential_profit_per_share
    )?;
    for alert in &rec.alerts {
        writeln!(out, "ALERT: {alert}")?;
    }
    Ok(())
}

pub fn print_screen(report: &ScreenReport, out: &mut impl Write) -> io::Result<()> {
    writeln!(
        out,
        "{:<6} {:>10} {:>6} {:>9} {:>4} {:>7}  {}",
        "SYMBOL", "PRICE", "SCORE", "MOMENTUM", "VOL", "RSI", "RATING"
    )?;
    for o in &report.opportunities {
        writeln!(
            out,
            "{:<6} {:>10.2} {:>6.0} {:>8.2}% {:>4} {:>7.2}  {}",
            o.symbol,
            o.price,
            o.score,
            o.momentum,
            if o.volume_trend > 0 { "+" } else { "-" },
            o.rsi,
            o.recommendation
        )?;
    }
    if !report.skipped.is_empty() {
        writeln!(out, "\nSkipped {} symbols:", report.skipped.len())?;
        for s in &report.skipped {
            writeln!(out, "  {}: {}", s.symbol, s.reason)?;
        }
    }
    Ok(())
}
