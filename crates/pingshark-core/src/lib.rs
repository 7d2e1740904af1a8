//! pingshark core library for offline ICMP echo capture analysis.
//!
//! Packet sources frame PCAP/PCAPNG input, the decode layer turns each frame
//! into a [`PacketRecord`], and the statistics engines derive timing, loss
//! and layer composition from the resulting [`Capture`]:
//!
//! - [`stats::CaptureStats`]: totals, duration, throughput, layer histogram,
//!   inter-arrival intervals and jitter over every packet.
//! - [`stats::IcmpCorrelation`]: echo request/reply pairing by sequence
//!   number, RTT, request intervals, jitter and loss.
//!
//! Engines are pure functions of the capture. A statistic that cannot be
//! computed is reported as unavailable with its reason; it never aborts the
//! rest of the analysis.
//!
//! Invariants:
//! - Report outputs are deterministic and stable across runs.
//! - Layer counts keep first-seen order.
//! - Loss rate is 0 when nothing was sent; excess replies are flagged, not
//!   clamped.
//!
//! # Examples
//! ```no_run
//! use std::path::Path;
//!
//! use pingshark_core::analyze_pcap_file;
//!
//! let report = analyze_pcap_file(Path::new("h1-h3.pcap"))?;
//! if let Some(icmp) = &report.icmp {
//!     println!("mean rtt: {:.3} ms", icmp.rtt.summary.mean * 1000.0);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::{Deserialize, Serialize};

pub mod analysis;
pub mod model;
pub mod source;
pub mod stats;

pub use analysis::{
    Analysis, AnalysisError, AnalysisOptions, analyze_capture, analyze_pcap_file,
    analyze_pcap_file_with, analyze_source, load_capture,
};
pub use model::{Capture, IcmpFields, IpFields, PacketRecord};
pub use source::{PacketEvent, PacketSource, PcapFileSource, PcapSource, SourceError};
pub use stats::{LayerCount, LossBundle, SeriesSummary, StatBundle, StatsError};

/// Current report schema version.
pub const REPORT_VERSION: u32 = 1;
/// Default timestamp used when no capture time is available.
pub const DEFAULT_GENERATED_AT: &str = "1970-01-01T00:00:00Z";

/// Analysis report for one capture.
///
/// # Examples
/// ```
/// use pingshark_core::make_stub_report;
///
/// let report = make_stub_report("h1-h3.pcap", 123, "h1-h3");
/// assert_eq!(report.report_version, pingshark_core::REPORT_VERSION);
/// assert!(report.icmp.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Report schema version (not the binary version).
    pub report_version: u32,
    /// Tool identification metadata.
    pub tool: ToolInfo,
    /// RFC3339 timestamp; the capture end time when known.
    pub generated_at: String,
    /// Input capture metadata.
    pub input: InputInfo,
    /// Caller-chosen capture identifier.
    pub capture_id: String,

    /// Capture-wide totals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture_summary: Option<CaptureSummary>,
    /// Layer counts in first-seen order.
    pub layers: Vec<LayerCount>,
    /// Inter-arrival intervals over all packets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packet_intervals: Option<StatBundle>,
    /// Jitter of the all-packet intervals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packet_jitter: Option<StatBundle>,
    /// Echo correlation results, present when the capture has ICMP.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icmp: Option<IcmpSummary>,
    /// Statistics that could not be computed, with the reason.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unavailable: Vec<UnavailableStatistic>,
}

impl Report {
    /// True when echo replies outnumber requests.
    pub fn has_correlation_anomaly(&self) -> bool {
        self.icmp
            .as_ref()
            .is_some_and(|icmp| icmp.loss.correlation_anomaly)
    }
}

/// Tool metadata embedded in reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool name (e.g., "pingshark").
    pub name: String,
    /// Tool version (semver).
    pub version: String,
}

/// Input capture metadata embedded in reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputInfo {
    /// Input path as provided to the analyzer.
    pub path: String,
    /// Input size in bytes.
    pub bytes: u64,
}

/// Capture-wide totals.
///
/// # Examples
/// ```
/// use pingshark_core::CaptureSummary;
///
/// let summary = CaptureSummary {
///     packets_total: 400,
///     bytes_total: 39_200,
///     duration_s: 199.2,
///     throughput_mbps: 0.0016,
///     capture_rate_pps: 2.0,
///     time_start: None,
///     time_end: None,
/// };
/// assert_eq!(summary.packets_total, 400);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureSummary {
    pub packets_total: u64,
    pub bytes_total: u64,
    /// Last minus first timestamp in capture order (seconds).
    pub duration_s: f64,
    pub throughput_mbps: f64,
    pub capture_rate_pps: f64,
    /// RFC3339 timestamp of the earliest packet (if known).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_start: Option<String>,
    /// RFC3339 timestamp of the latest packet (if known).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_end: Option<String>,
}

/// Echo request/reply statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IcmpSummary {
    /// Echo requests seen.
    pub requests: u64,
    /// Echo replies seen, duplicates included.
    pub replies: u64,
    pub matched_pairs: u64,
    /// Replies with no pending request (late duplicates or missed requests).
    pub unmatched_replies: u64,
    /// Source/destination of the first echo request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoints: Option<IpFields>,
    /// Distinct sequence numbers, ascending (shared x-axis for plots).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sequence_numbers: Vec<u16>,
    pub rtt: StatBundle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_intervals: Option<StatBundle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rtt_jitter: Option<StatBundle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_jitter: Option<StatBundle>,
    pub loss: LossBundle,
}

/// A statistic left out of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnavailableStatistic {
    /// Report field name (e.g., `icmp.rtt_jitter`).
    pub statistic: String,
    pub reason: String,
}

/// Build a stub report with base fields filled and empty aggregates.
///
/// # Examples
/// ```
/// use pingshark_core::make_stub_report;
///
/// let report = make_stub_report("capture.pcapng", 123, "capture");
/// assert!(report.layers.is_empty());
/// assert_eq!(report.capture_id, "capture");
/// ```
pub fn make_stub_report(input_path: &str, input_bytes: u64, capture_id: &str) -> Report {
    Report {
        report_version: REPORT_VERSION,
        tool: ToolInfo {
            name: "pingshark".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        generated_at: DEFAULT_GENERATED_AT.to_string(),
        input: InputInfo {
            path: input_path.to_string(),
            bytes: input_bytes,
        },
        capture_id: capture_id.to_string(),
        capture_summary: None,
        layers: vec![],
        packet_intervals: None,
        packet_jitter: None,
        icmp: None,
        unavailable: vec![],
    }
}
