//! End-to-end tests over the domain pipeline with a mock data port.
//!
//! Tests cover:
//! - Analysis bundle assembly and signal ordering
//! - Trade advice on a real bundle
//! - Screener fail-soft aggregation, filtering and ranking

mod common;

use approx::assert_relative_eq;
use common::*;
use marketpulse::domain::advisor::{Action, RiskTolerance, TradeAdvisor};
use marketpulse::domain::analysis::AnalysisAggregator;
use marketpulse::domain::error::MarketPulseError;
use marketpulse::domain::indicator::IndicatorType;
use marketpulse::domain::screener::{
    FilterPreset, ScoreBand, Screener, ScreenerConfig, SkipReason,
};
use marketpulse::domain::signal::SignalKind;

/// Flat base, a rally, then fourteen straight down days ending above the
/// window mean: RSI 0, close above mean, and a volume spike on the last bar.
fn dip_bars() -> Vec<OhlcvBar> {
    let mut closes = vec![50.0; 80];
    closes.extend((1..=20).map(|k| 50.0 + 2.5 * k as f64));
    closes.extend((1..=14).map(|k| 100.0 - k as f64));
    let mut volumes = flat_volume(closes.len(), 1_000_000);
    if let Some(last) = volumes.last_mut() {
        *last = 3_000_000;
    }
    make_bars(&closes, &volumes)
}

fn wavy_bars(n: usize, base: f64, volume: u64) -> Vec<OhlcvBar> {
    make_bars(&wavy_closes(n, base), &flat_volume(n, volume))
}

mod analysis_pipeline {
    use super::*;

    #[test]
    fn bundle_for_dip_symbol() {
        let bundle = AnalysisAggregator::default()
            .analyze(&series("DIP", dip_bars()))
            .unwrap();

        assert_eq!(bundle.symbol, "DIP");
        assert_relative_eq!(bundle.latest_rsi().unwrap(), 0.0);
        assert_relative_eq!(bundle.latest_close().unwrap(), 86.0);
        assert!(bundle.has_high_volume_days());
        assert!(bundle.indicators.get(&IndicatorType::Vpt).is_some());

        let rsi = bundle.indicators.get(&IndicatorType::Rsi(14)).unwrap();
        assert!(rsi.values[..14].iter().all(|p| !p.valid));
        assert!(rsi.values[14..].iter().all(|p| p.valid));
    }

    #[test]
    fn dip_emits_oversold_signal() {
        let bundle = AnalysisAggregator::default()
            .analyze(&series("DIP", dip_bars()))
            .unwrap();
        assert!(bundle
            .signals
            .iter()
            .any(|s| s.kind == SignalKind::RsiOversold));
        assert!(bundle.signals.windows(2).all(|w| w[0].date <= w[1].date));
    }

    #[test]
    fn short_history_is_insufficient() {
        let err = AnalysisAggregator::default()
            .analyze(&series("NEW", wavy_bars(30, 40.0, 1_000)))
            .unwrap_err();
        assert!(matches!(
            err,
            MarketPulseError::InsufficientData { bars: 30, minimum: 50, .. }
        ));
    }
}

mod advice {
    use super::*;

    #[test]
    fn oversold_bundle_yields_buy() {
        let bundle = AnalysisAggregator::default()
            .analyze(&series("DIP", dip_bars()))
            .unwrap();
        let rec = TradeAdvisor::new(RiskTolerance::Moderate)
            .advise(&bundle, 86.0, 10_000.0)
            .unwrap();

        assert_eq!(rec.action, Action::Buy);
        assert_eq!(rec.confidence, 50);
        assert_eq!(rec.recommended_shares, 5);
        assert_relative_eq!(rec.max_position_value, 500.0);
        assert!(rec.stop_loss < 86.0);
        assert!(rec.target_price > 86.0);
        assert_relative_eq!(
            rec.potential_profit_per_share,
            2.0 * rec.risk_per_share,
            epsilon = 0.02
        );
        assert!(rec.alerts.iter().any(|a| a.contains("Extremely oversold")));
    }

    #[test]
    fn position_scales_with_tolerance() {
        let bundle = AnalysisAggregator::default()
            .analyze(&series("DIP", dip_bars()))
            .unwrap();
        let shares: Vec<u64> = [
            RiskTolerance::Conservative,
            RiskTolerance::Moderate,
            RiskTolerance::Aggressive,
        ]
        .into_iter()
        .map(|t| {
            TradeAdvisor::new(t)
                .advise(&bundle, 10.0, 10_000.0)
                .unwrap()
                .recommended_shares
        })
        .collect();
        assert_eq!(shares, vec![20, 50, 100]);
    }
}

mod screening {
    use super::*;

    fn universe(symbols: &[&str]) -> Vec<String> {
        symbols.iter().map(|s| s.to_string()).collect()
    }

    fn as_of() -> chrono::NaiveDate {
        date("2024-06-30")
    }

    #[test]
    fn dip_scores_90_strong_buy() {
        let port = MockDataPort::new().with_bars("DIP", dip_bars());
        let screener = Screener::with_universe(&port, universe(&["DIP"]));

        let report = screener.screen(&ScreenerConfig::default(), as_of()).unwrap();

        assert_eq!(report.opportunities.len(), 1);
        let o = &report.opportunities[0];
        assert_eq!(o.symbol, "DIP");
        assert_relative_eq!(o.score, 90.0);
        assert_eq!(o.recommendation, ScoreBand::StrongBuy);
        assert_eq!(o.volume_trend, 1);
        assert_relative_eq!(o.rsi, 0.0);
        assert!(o.momentum < 0.0);
        assert!(o.atr.is_some());
        assert!(o.macd_histogram.is_some());
    }

    #[test]
    fn momentum_reads_fifth_from_last_close() {
        let mut closes = vec![60.0; 80];
        closes[74] = 50.0;
        closes[75] = 100.0;
        closes[79] = 110.0;
        let port = MockDataPort::new()
            .with_bars("JUMP", make_bars(&closes, &flat_volume(80, 800_000)));
        let screener = Screener::with_universe(&port, universe(&["JUMP"]));

        let report = screener.screen(&ScreenerConfig::default(), as_of()).unwrap();

        assert_eq!(report.opportunities.len(), 1);
        assert_relative_eq!(report.opportunities[0].momentum, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn failures_are_skipped_not_fatal() {
        let port = MockDataPort::new()
            .with_bars("DIP", dip_bars())
            .with_bars("WAVE", wavy_bars(120, 60.0, 800_000))
            .with_bars("SHORT", wavy_bars(20, 60.0, 800_000))
            .with_error("BROKEN", "connection reset");
        let screener =
            Screener::with_universe(&port, universe(&["BROKEN", "WAVE", "SHORT", "DIP"]));

        let report = screener.screen(&ScreenerConfig::default(), as_of()).unwrap();

        let ranked: Vec<&str> = report
            .opportunities
            .iter()
            .map(|o| o.symbol.as_str())
            .collect();
        assert_eq!(ranked, vec!["DIP", "WAVE"]);
        assert!(report
            .opportunities
            .windows(2)
            .all(|w| w[0].score >= w[1].score));

        assert_eq!(report.skipped.len(), 2);
        let broken = report.skipped.iter().find(|s| s.symbol == "BROKEN").unwrap();
        assert!(matches!(&broken.reason, SkipReason::Failed(r) if r.contains("connection reset")));
        let short = report.skipped.iter().find(|s| s.symbol == "SHORT").unwrap();
        assert_eq!(short.reason, SkipReason::InsufficientBars { bars: 20 });
    }

    #[test]
    fn bounds_filter_price_volume_and_cap() {
        let port = MockDataPort::new()
            .with_bars("CHEAP", make_bars(&[3.0; 80], &flat_volume(80, 800_000)))
            .with_bars("THIN", wavy_bars(80, 60.0, 10_000))
            .with_bars("TINY", wavy_bars(80, 60.0, 800_000))
            .with_market_cap("TINY", 1_000_000.0)
            .with_bars("OK", wavy_bars(80, 60.0, 800_000))
            .with_market_cap("OK", 5_000_000_000.0);
        let screener =
            Screener::with_universe(&port, universe(&["CHEAP", "THIN", "TINY", "OK"]));

        let report = screener.screen(&ScreenerConfig::default(), as_of()).unwrap();

        assert_eq!(report.opportunities.len(), 1);
        assert_eq!(report.opportunities[0].symbol, "OK");
        assert_eq!(report.skipped.len(), 3);
        assert!(report
            .skipped
            .iter()
            .all(|s| matches!(s.reason, SkipReason::OutsideBounds(_))));
    }

    #[test]
    fn quick_screen_keeps_top_results() {
        let mut port = MockDataPort::new();
        let symbols = ["A", "B", "C", "D"];
        for (i, s) in symbols.iter().enumerate() {
            port = port.with_bars(s, wavy_bars(80, 20.0 + i as f64 * 10.0, 6_000_000));
        }
        let screener = Screener::with_universe(&port, universe(&symbols));

        let all = screener
            .screen(&FilterPreset::MostActive.config(), as_of())
            .unwrap();
        assert_eq!(all.opportunities.len(), 4);

        let top = screener
            .quick_screen(FilterPreset::MostActive, 2, as_of())
            .unwrap();
        assert_eq!(top.opportunities.len(), 2);
        assert_eq!(top.opportunities[..], all.opportunities[..2]);
    }

    #[test]
    fn preset_bounds_reject_thin_volume() {
        let port = MockDataPort::new().with_bars("A", wavy_bars(80, 30.0, 2_000_000));
        let screener = Screener::with_universe(&port, universe(&["A"]));

        let report = screener
            .quick_screen(FilterPreset::MostActive, 10, as_of())
            .unwrap();
        assert!(report.opportunities.is_empty());
        assert!(matches!(report.skipped[0].reason, SkipReason::OutsideBounds(_)));
    }

    #[test]
    fn invalid_config_fails_before_fetching() {
        let port = MockDataPort::new().with_error("DIP", "should not be called");
        let screener = Screener::with_universe(&port, universe(&["DIP"]));
        let config = ScreenerConfig {
            max_concurrency: 0,
            ..ScreenerConfig::default()
        };
        assert!(matches!(
            screener.screen(&config, as_of()),
            Err(MarketPulseError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn concurrency_does_not_change_results() {
        let mut port = MockDataPort::new().with_bars("DIP", dip_bars());
        for i in 0..8 {
            port = port.with_bars(&format!("W{i}"), wavy_bars(90, 30.0 + i as f64, 900_000));
        }
        let symbols: Vec<String> = std::iter::once("DIP".to_string())
            .chain((0..8).map(|i| format!("W{i}")))
            .collect();
        let screener = Screener::with_universe(&port, symbols);

        let serial = screener
            .screen(
                &ScreenerConfig {
                    max_concurrency: 1,
                    ..ScreenerConfig::default()
                },
                as_of(),
            )
            .unwrap();
        let parallel = screener
            .screen(
                &ScreenerConfig {
                    max_concurrency: 8,
                    ..ScreenerConfig::default()
                },
                as_of(),
            )
            .unwrap();

        let scores = |r: &marketpulse::domain::screener::ScreenReport| {
            let mut v: Vec<(String, f64)> = r
                .opportunities
                .iter()
                .map(|o| (o.symbol.clone(), o.score))
                .collect();
            v.sort_by(|a, b| a.0.cmp(&b.0));
            v
        };
        assert_eq!(scores(&serial), scores(&parallel));
        assert_eq!(parallel.opportunities[0].symbol, "DIP");
    }
}
