//! Core domain types and logic.

pub mod ohlcv;
pub mod stats;
pub mod indicator;
pub mod signal;
pub mod pattern;
pub mod analysis;
pub mod advisor;
pub mod screener;
pub mod config_validation;
pub mod error;
