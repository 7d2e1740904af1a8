use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::Capture;

use super::error::StatsError;
use super::series::{StatBundle, interval_series, jitter_stats};

/// Packet count for one layer name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerCount {
    pub name: String,
    pub count: u64,
}

/// Layer name histogram in first-seen order.
///
/// # Examples
/// ```
/// use pingshark_core::stats::LayerHistogram;
///
/// let mut histogram = LayerHistogram::new();
/// for name in ["Ethernet", "IP", "ICMP", "Ethernet"] {
///     histogram.increment(name);
/// }
/// let names: Vec<_> = histogram.names().collect();
/// assert_eq!(names, ["Ethernet", "IP", "ICMP"]);
/// assert_eq!(histogram.count("Ethernet"), Some(2));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerHistogram {
    entries: Vec<LayerCount>,
    index: HashMap<String, usize>,
}

impl LayerHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, name: &str) {
        match self.index.get(name) {
            Some(&slot) => self.entries[slot].count += 1,
            None => {
                self.index.insert(name.to_string(), self.entries.len());
                self.entries.push(LayerCount {
                    name: name.to_string(),
                    count: 1,
                });
            }
        }
    }

    pub fn count(&self, name: &str) -> Option<u64> {
        self.index.get(name).map(|&slot| self.entries[slot].count)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LayerCount> {
        self.entries.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts (total layer occurrences).
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|entry| entry.count).sum()
    }

    pub fn into_counts(self) -> Vec<LayerCount> {
        self.entries
    }
}

/// Capture-wide aggregates that do not depend on any protocol.
///
/// # Examples
/// ```
/// use pingshark_core::{Capture, PacketRecord};
/// use pingshark_core::stats::CaptureStats;
///
/// let capture = Capture::new(
///     "demo",
///     vec![
///         PacketRecord::new(0.0, 125_000, Vec::new()),
///         PacketRecord::new(1.0, 125_000, Vec::new()),
///     ],
/// );
/// let stats = CaptureStats::new(&capture);
/// assert_eq!(stats.total_bytes(), 250_000);
/// assert_eq!(stats.throughput_mbps(), 2.0);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CaptureStats<'a> {
    capture: &'a Capture,
}

impl<'a> CaptureStats<'a> {
    pub fn new(capture: &'a Capture) -> Self {
        Self { capture }
    }

    pub fn capture(&self) -> &'a Capture {
        self.capture
    }

    pub fn total_packets(&self) -> u64 {
        self.capture.len() as u64
    }

    pub fn total_bytes(&self) -> u64 {
        self.capture
            .records()
            .iter()
            .map(|record| record.byte_length())
            .sum()
    }

    /// Last minus first timestamp in capture order; 0 below two records.
    ///
    /// Out-of-order captures can make this negative; the value is reported
    /// as-is.
    pub fn total_duration(&self) -> f64 {
        match self.capture.records() {
            [first, .., last] => last.timestamp() - first.timestamp(),
            _ => 0.0,
        }
    }

    /// Megabits per second over the capture duration, 0 when the duration
    /// is not positive.
    pub fn throughput_mbps(&self) -> f64 {
        let duration = self.total_duration();
        if duration <= 0.0 {
            return 0.0;
        }
        (self.total_bytes() * 8) as f64 / duration / 1e6
    }

    /// Packets per second over the capture duration, 0 when the duration
    /// is not positive.
    pub fn capture_rate_pps(&self) -> f64 {
        let duration = self.total_duration();
        if duration <= 0.0 {
            return 0.0;
        }
        self.total_packets() as f64 / duration
    }

    pub fn layer_histogram(&self) -> LayerHistogram {
        let mut histogram = LayerHistogram::new();
        for record in self.capture.records() {
            for layer in record.layers() {
                histogram.increment(layer);
            }
        }
        histogram
    }

    /// Timestamps of every record in capture order.
    pub fn timestamps(&self) -> Vec<f64> {
        self.capture
            .records()
            .iter()
            .map(|record| record.timestamp())
            .collect()
    }

    /// Earliest and latest timestamps, regardless of capture order.
    pub fn time_bounds(&self) -> Option<(f64, f64)> {
        let mut first = None;
        let mut last = None;
        for record in self.capture.records() {
            update_ts_bounds(&mut first, &mut last, record.timestamp());
        }
        first.zip(last)
    }

    /// Inter-arrival intervals over all packets.
    pub fn packet_interval_stats(&self) -> Result<StatBundle, StatsError> {
        StatsError::require("packet interval", 2, self.capture.len())?;
        Ok(StatBundle::from_samples(interval_series(&self.timestamps())))
    }

    /// Jitter over the all-packet inter-arrival intervals.
    pub fn packet_jitter_stats(&self) -> Result<StatBundle, StatsError> {
        let intervals = interval_series(&self.timestamps());
        jitter_stats("packet jitter", &intervals)
    }
}

fn update_ts_bounds(first: &mut Option<f64>, last: &mut Option<f64>, ts: f64) {
    match first {
        None => *first = Some(ts),
        Some(existing) => {
            if ts < *existing {
                *first = Some(ts);
            }
        }
    }
    match last {
        None => *last = Some(ts),
        Some(existing) => {
            if ts > *existing {
                *last = Some(ts);
            }
        }
    }
}
