use std::path::Path;

use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::{debug, warn};

use crate::model::Capture;
use crate::source::{PacketSource, PcapFileSource, SourceError};
use crate::stats::{CaptureStats, IcmpCorrelation, LayerCount, StatBundle, StatsError};
use crate::{
    CaptureSummary, DEFAULT_GENERATED_AT, IcmpSummary, Report, UnavailableStatistic,
    make_stub_report,
};

pub mod decode;

use decode::{decode_event, opaque_record};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
}

/// Knobs for report generation.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Capture identifier; defaults to the input file stem.
    pub capture_id: Option<String>,
    /// Keep raw series (samples, sequence numbers) in the report.
    pub include_series: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            capture_id: None,
            include_series: true,
        }
    }
}

/// Statistics derived from one capture, ready to be placed in a report.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub capture_summary: CaptureSummary,
    pub layers: Vec<LayerCount>,
    pub packet_intervals: Option<StatBundle>,
    pub packet_jitter: Option<StatBundle>,
    pub icmp: Option<IcmpSummary>,
    pub unavailable: Vec<UnavailableStatistic>,
}

pub fn analyze_pcap_file(path: &Path) -> Result<Report, AnalysisError> {
    analyze_pcap_file_with(path, &AnalysisOptions::default())
}

pub fn analyze_pcap_file_with(
    path: &Path,
    options: &AnalysisOptions,
) -> Result<Report, AnalysisError> {
    let source = PcapFileSource::open(path)?;
    analyze_source(path, source, options)
}

pub fn analyze_source<S: PacketSource>(
    path: &Path,
    source: S,
    options: &AnalysisOptions,
) -> Result<Report, AnalysisError> {
    let capture_id = options
        .capture_id
        .clone()
        .unwrap_or_else(|| default_capture_id(path));
    let capture = load_capture(&capture_id, source)?;
    let analysis = analyze_capture(&capture, options);

    let mut report = make_stub_report(
        &path.display().to_string(),
        path.metadata()?.len(),
        &capture_id,
    );
    report.generated_at = analysis
        .capture_summary
        .time_end
        .clone()
        .or_else(|| analysis.capture_summary.time_start.clone())
        .unwrap_or_else(|| DEFAULT_GENERATED_AT.to_string());
    report.capture_summary = Some(analysis.capture_summary);
    report.layers = analysis.layers;
    report.packet_intervals = analysis.packet_intervals;
    report.packet_jitter = analysis.packet_jitter;
    report.icmp = analysis.icmp;
    report.unavailable = analysis.unavailable;
    Ok(report)
}

/// Drain a source into a capture.
///
/// Frames that cannot be decoded are kept as opaque records so totals still
/// match the file.
pub fn load_capture<S: PacketSource>(id: &str, mut source: S) -> Result<Capture, AnalysisError> {
    let mut records = Vec::new();
    let mut opaque = 0u64;

    while let Some(event) = source.next_packet()? {
        match decode_event(&event) {
            Ok(record) => records.push(record),
            Err(err) => {
                opaque += 1;
                debug!(error = %err, ts = event.ts, "frame kept as opaque record");
                records.push(opaque_record(&event));
            }
        }
    }

    debug!(capture = id, packets = records.len(), opaque, "capture loaded");
    Ok(Capture::new(id, records))
}

/// Run both engines over a capture.
pub fn analyze_capture(capture: &Capture, options: &AnalysisOptions) -> Analysis {
    let stats = CaptureStats::new(capture);
    let mut unavailable = Vec::new();
    let keep = |bundle: StatBundle| {
        if options.include_series {
            bundle
        } else {
            bundle.without_samples()
        }
    };

    let (time_start, time_end) = match stats.time_bounds() {
        Some((start, end)) => (ts_to_rfc3339(start), ts_to_rfc3339(end)),
        None => (None, None),
    };
    let capture_summary = CaptureSummary {
        packets_total: stats.total_packets(),
        bytes_total: stats.total_bytes(),
        duration_s: stats.total_duration(),
        throughput_mbps: stats.throughput_mbps(),
        capture_rate_pps: stats.capture_rate_pps(),
        time_start,
        time_end,
    };

    let packet_intervals =
        available(stats.packet_interval_stats(), "packet_intervals", &mut unavailable).map(keep);
    let packet_jitter =
        available(stats.packet_jitter_stats(), "packet_jitter", &mut unavailable).map(keep);

    let icmp = if capture.records().iter().any(|record| record.icmp().is_some()) {
        Some(summarize_icmp(capture, options, &mut unavailable))
    } else {
        None
    };

    Analysis {
        capture_summary,
        layers: stats.layer_histogram().into_counts(),
        packet_intervals,
        packet_jitter,
        icmp,
        unavailable,
    }
}

fn summarize_icmp(
    capture: &Capture,
    options: &AnalysisOptions,
    unavailable: &mut Vec<UnavailableStatistic>,
) -> IcmpSummary {
    let correlation = IcmpCorrelation::new(capture);
    let keep = |bundle: StatBundle| {
        if options.include_series {
            bundle
        } else {
            bundle.without_samples()
        }
    };

    let loss = correlation.loss_stats();
    if let Err(err) = loss.check() {
        warn!(capture = capture.id(), error = %err, "echo correlation anomaly");
    }

    let rtt = correlation.rtt_stats();
    debug!(
        capture = capture.id(),
        requests = correlation.requests_sent(),
        matched = correlation.matched_pairs(),
        "echo correlation done"
    );

    IcmpSummary {
        requests: correlation.requests_sent(),
        replies: correlation.replies_seen(),
        matched_pairs: correlation.matched_pairs() as u64,
        unmatched_replies: correlation.unmatched_replies(),
        endpoints: correlation.endpoints(),
        sequence_numbers: if options.include_series {
            correlation.distinct_sequence_numbers()
        } else {
            Vec::new()
        },
        rtt: keep(rtt),
        request_intervals: available(
            correlation.request_interval_stats(),
            "icmp.request_intervals",
            unavailable,
        )
        .map(keep),
        rtt_jitter: available(correlation.rtt_jitter_stats(), "icmp.rtt_jitter", unavailable)
            .map(keep),
        interval_jitter: available(
            correlation.request_interval_jitter_stats(),
            "icmp.interval_jitter",
            unavailable,
        )
        .map(keep),
        loss,
    }
}

fn available(
    result: Result<StatBundle, StatsError>,
    statistic: &str,
    unavailable: &mut Vec<UnavailableStatistic>,
) -> Option<StatBundle> {
    match result {
        Ok(bundle) => Some(bundle),
        Err(err) => {
            debug!(statistic, error = %err, "statistic unavailable");
            unavailable.push(UnavailableStatistic {
                statistic: statistic.to_string(),
                reason: err.to_string(),
            });
            None
        }
    }
}

fn default_capture_id(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn ts_to_rfc3339(ts: f64) -> Option<String> {
    let nanos = (ts * 1_000_000_000.0).round() as i128;
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .ok()
        .and_then(|dt| dt.format(&Rfc3339).ok())
}
