//! Statistics engines over a decoded [`Capture`](crate::Capture).
//!
//! - `series`: numeric helpers (difference series, population summary).
//! - `capture`: protocol-independent aggregates (`CaptureStats`).
//! - `icmp`: echo request/reply correlation (`IcmpCorrelation`).
//! - `loss`: delivery accounting (`LossBundle`).
//! - `error`: recoverable per-statistic failures.
//!
//! Engines borrow the capture immutably and keep no state between calls,
//! so every bundle can be recomputed at will with identical results.

pub mod capture;
pub mod error;
pub mod icmp;
pub mod loss;
pub mod series;

pub use capture::{CaptureStats, LayerCount, LayerHistogram};
pub use error::StatsError;
pub use icmp::{IcmpCorrelation, RttSample};
pub use loss::LossBundle;
pub use series::{
    SeriesSummary, StatBundle, describe, interval_series, jitter_series, jitter_stats,
};
