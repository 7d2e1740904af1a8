use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::model::{Capture, IpFields, PacketRecord};

use super::capture::CaptureStats;
use super::error::StatsError;
use super::loss::LossBundle;
use super::series::{StatBundle, interval_series, jitter_stats};

/// One matched echo request/reply pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RttSample {
    pub seq: u16,
    /// Timestamp of the request that was answered.
    pub request_ts: f64,
    /// Reply timestamp minus request timestamp, in seconds.
    pub rtt: f64,
}

/// Echo request/reply correlation over one capture.
///
/// Requests are keyed by their 16-bit sequence number. Only the latest
/// unanswered request per sequence number is kept, and a reply consumes it,
/// so a retransmitted reply cannot produce a second sample. Sequence numbers
/// are compared as-is, without wraparound handling.
///
/// # Examples
/// ```
/// use pingshark_core::{Capture, IcmpFields, PacketRecord};
/// use pingshark_core::stats::IcmpCorrelation;
///
/// let echo = |ts: f64, icmp_type: u8, seq: u16| {
///     PacketRecord::new(ts, 98, Vec::new()).with_icmp(IcmpFields { icmp_type, seq })
/// };
/// let capture = Capture::new(
///     "ping",
///     vec![echo(0.0, 8, 1), echo(0.01, 0, 1), echo(1.0, 8, 2), echo(1.02, 0, 2)],
/// );
/// let icmp = IcmpCorrelation::new(&capture);
/// assert!((icmp.rtt_stats().summary.mean - 0.015).abs() < 1e-9);
/// assert_eq!(icmp.loss_stats().lost, 0);
/// ```
#[derive(Debug, Clone)]
pub struct IcmpCorrelation<'a> {
    stats: CaptureStats<'a>,
    samples: Vec<RttSample>,
    request_timestamps: Vec<f64>,
    replies: u64,
    unmatched_replies: u64,
    replied_sequences: BTreeSet<u16>,
    sequences: BTreeSet<u16>,
    endpoints: Option<IpFields>,
}

impl<'a> IcmpCorrelation<'a> {
    pub fn new(capture: &'a Capture) -> Self {
        let mut correlation = Self {
            stats: CaptureStats::new(capture),
            samples: Vec::new(),
            request_timestamps: Vec::new(),
            replies: 0,
            unmatched_replies: 0,
            replied_sequences: BTreeSet::new(),
            sequences: BTreeSet::new(),
            endpoints: None,
        };
        correlation.correlate(capture.records());
        correlation
    }

    fn correlate(&mut self, records: &'a [PacketRecord]) {
        let mut pending: HashMap<u16, &'a PacketRecord> = HashMap::new();

        for record in records {
            let Some(icmp) = record.icmp() else {
                continue;
            };
            let seq = icmp.seq;
            self.sequences.insert(seq);

            if icmp.is_echo_request() {
                if self.endpoints.is_none() {
                    self.endpoints = record.ip().copied();
                }
                self.request_timestamps.push(record.timestamp());
                if pending.insert(seq, record).is_some() {
                    trace!(seq, "unanswered echo request replaced");
                }
            } else if icmp.is_echo_reply() {
                self.replies += 1;
                self.replied_sequences.insert(seq);
                match pending.remove(&seq) {
                    Some(request) => self.samples.push(RttSample {
                        seq,
                        request_ts: request.timestamp(),
                        rtt: record.timestamp() - request.timestamp(),
                    }),
                    None => {
                        self.unmatched_replies += 1;
                        trace!(seq, "echo reply without pending request");
                    }
                }
            }
        }
    }

    /// Protocol-independent statistics over the same capture.
    pub fn capture_stats(&self) -> CaptureStats<'a> {
        self.stats
    }

    pub fn requests_sent(&self) -> u64 {
        self.request_timestamps.len() as u64
    }

    /// Echo replies seen, duplicates included.
    pub fn replies_seen(&self) -> u64 {
        self.replies
    }

    pub fn matched_pairs(&self) -> usize {
        self.samples.len()
    }

    pub fn unmatched_replies(&self) -> u64 {
        self.unmatched_replies
    }

    /// Addresses of the first echo request carrying an IP layer.
    pub fn endpoints(&self) -> Option<IpFields> {
        self.endpoints
    }

    pub fn rtt_samples(&self) -> &[RttSample] {
        &self.samples
    }

    pub fn rtt_series(&self) -> Vec<f64> {
        self.samples.iter().map(|sample| sample.rtt).collect()
    }

    /// RTT summary and series; all-zero summary when nothing matched.
    pub fn rtt_stats(&self) -> StatBundle {
        StatBundle::from_samples(self.rtt_series())
    }

    pub fn request_timestamps(&self) -> &[f64] {
        &self.request_timestamps
    }

    /// Intervals between consecutive echo requests.
    pub fn request_interval_stats(&self) -> Result<StatBundle, StatsError> {
        StatsError::require("request interval", 2, self.request_timestamps.len())?;
        Ok(StatBundle::from_samples(interval_series(
            &self.request_timestamps,
        )))
    }

    /// Jitter over an arbitrary timing series (RTTs or intervals).
    pub fn jitter_stats(&self, base: &[f64]) -> Result<StatBundle, StatsError> {
        jitter_stats("jitter", base)
    }

    pub fn rtt_jitter_stats(&self) -> Result<StatBundle, StatsError> {
        jitter_stats("rtt jitter", &self.rtt_series())
    }

    pub fn request_interval_jitter_stats(&self) -> Result<StatBundle, StatsError> {
        jitter_stats(
            "request interval jitter",
            &interval_series(&self.request_timestamps),
        )
    }

    /// Requests sent versus distinct sequence numbers replied to.
    pub fn loss_stats(&self) -> LossBundle {
        LossBundle::from_counts(self.requests_sent(), self.replied_sequences.len() as u64)
    }

    /// Every sequence number seen on an ICMP record, ascending.
    pub fn distinct_sequence_numbers(&self) -> Vec<u16> {
        self.sequences.iter().copied().collect()
    }
}
