use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use glob::glob;
use pingshark_core::{AnalysisOptions, Report, StatBundle};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (commit ",
    env!("PINGSHARK_BUILD_COMMIT"),
    ", built ",
    env!("PINGSHARK_BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "pingshark")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    about = "Offline analyzer for ICMP echo captures: RTT, jitter, loss and layer statistics.",
    long_about = None,
    after_help = "Examples:\n  pingshark pcap analyse h1-h3.pcap -o report.json\n  pingshark pcap analyze 'captures/h1-*.pcapng' --stdout --pretty"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Operations on PCAP/PCAPNG inputs.
    Pcap {
        #[command(subcommand)]
        command: PcapCommands,
    },
}

#[derive(Subcommand, Debug)]
enum PcapCommands {
    /// Analyse a capture file and generate a versioned JSON report.
    #[command(alias = "analyze")]
    #[command(
        after_help = "Examples:\n  pingshark pcap analyse h1-h3.pcap -o report.json\n  pingshark pcap analyse h1-h3.pcapng --stdout --summary"
    )]
    Analyse(AnalyseArgs),
}

#[derive(Args, Debug)]
struct AnalyseArgs {
    /// Path (or glob pattern matching one file) to a .pcap or .pcapng file
    input: PathBuf,

    /// Output report path (JSON)
    #[arg(short = 'o', long, required_unless_present = "stdout")]
    report: Option<PathBuf>,

    /// Write JSON report to stdout
    #[arg(long, conflicts_with = "report")]
    stdout: bool,

    /// Pretty-print JSON output
    #[arg(long, conflicts_with = "compact")]
    pretty: bool,

    /// Compact JSON output (default)
    #[arg(long)]
    compact: bool,

    /// Suppress non-error output
    #[arg(long)]
    quiet: bool,

    /// Capture identifier stored in the report (default: input file stem)
    #[arg(long = "id", value_name = "NAME")]
    capture_id: Option<String>,

    /// Leave raw sample series out of the report
    #[arg(long)]
    no_series: bool,

    /// Print a millisecond summary to stderr
    #[arg(long)]
    summary: bool,

    /// Exit with a non-zero code if echo replies outnumber requests
    #[arg(long)]
    strict: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Pcap { command } => match command {
            PcapCommands::Analyse(args) => cmd_pcap_analyse(args),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{err:#}"), None)
    }
}

fn cmd_pcap_analyse(args: AnalyseArgs) -> Result<(), CliError> {
    let resolved_input = resolve_input_path(&args.input)?;
    validate_input_file(&resolved_input)?;
    let input_abs = fs::canonicalize(&resolved_input)
        .with_context(|| format!("Failed to resolve input path: {}", resolved_input.display()))?;

    let report_path = match (args.stdout, args.report.as_ref()) {
        (true, _) => None,
        (false, Some(path)) => {
            ensure_distinct_output(path, &input_abs)?;
            Some(path.clone())
        }
        (false, None) => {
            return Err(CliError::new(
                "missing output path",
                Some("use -o/--report or --stdout".to_string()),
            ));
        }
    };

    let options = AnalysisOptions {
        capture_id: args.capture_id.clone(),
        include_series: !args.no_series,
    };
    debug!(input = %resolved_input.display(), ?options, "analysing capture");
    let rep = pingshark_core::analyze_pcap_file_with(&resolved_input, &options)
        .context("PCAP/PCAPNG analysis failed")?;
    let json = serialize_report(&rep, args.pretty, args.compact)?;

    match report_path {
        None => print!("{}", json),
        Some(report) => {
            if let Some(parent) = report.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create output directory: {}", parent.display())
                    })?;
                }
            }
            fs::write(&report, json)
                .with_context(|| format!("Failed to write report: {}", report.display()))?;
            info!(report = %report.display(), "report written");
            if !args.quiet {
                eprintln!("OK: report written -> {}", report.display());
            }
        }
    }

    if args.summary {
        eprint!("{}", render_summary(&rep));
    }

    if args.strict && rep.has_correlation_anomaly() {
        let (sent, received) = rep
            .icmp
            .as_ref()
            .map(|icmp| (icmp.loss.sent, icmp.loss.received))
            .unwrap_or_default();
        return Err(CliError::new(
            format!(
                "echo correlation anomaly: {} replied sequence numbers for {} requests",
                received, sent
            ),
            Some(
                "the capture may start after the first requests; check its boundaries".to_string(),
            ),
        ));
    }
    Ok(())
}

fn ensure_distinct_output(report_path: &Path, input_abs: &Path) -> Result<(), CliError> {
    let report_dir = report_path
        .parent()
        .filter(|parent| parent.as_os_str().is_empty() || parent.exists())
        .map(|parent| {
            if parent.as_os_str().is_empty() {
                fs::canonicalize(".")
            } else {
                fs::canonicalize(parent)
            }
        })
        .transpose()
        .with_context(|| format!("Failed to resolve output path: {}", report_path.display()))?;
    let Some(report_dir) = report_dir else {
        return Ok(());
    };
    let file_name = report_path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Invalid report path"))?;
    if report_dir.join(file_name) == input_abs {
        return Err(CliError::new(
            format!(
                "report path must differ from input: {}",
                report_path.display()
            ),
            Some("choose a different output path".to_string()),
        ));
    }
    Ok(())
}

fn serialize_report(rep: &Report, pretty: bool, compact: bool) -> Result<String, CliError> {
    if pretty && compact {
        return Err(CliError::new(
            "cannot use --pretty and --compact together",
            Some("choose one output format".to_string()),
        ));
    }
    if pretty {
        serde_json::to_string_pretty(rep)
            .context("JSON serialization failed")
            .map_err(Into::into)
    } else {
        serde_json::to_string(rep)
            .context("JSON serialization failed")
            .map_err(Into::into)
    }
}

/// Human-readable digest of a report, timings in milliseconds.
fn render_summary(rep: &Report) -> String {
    let mut out = format!("capture {}\n", rep.capture_id);
    if let Some(summary) = &rep.capture_summary {
        out.push_str(&format!(
            "  packets: {}  bytes: {}  duration: {:.3} s  throughput: {:.6} Mbps\n",
            summary.packets_total, summary.bytes_total, summary.duration_s, summary.throughput_mbps
        ));
    }
    let Some(icmp) = &rep.icmp else {
        out.push_str("  no ICMP echo traffic\n");
        return out;
    };
    out.push_str(&format!(
        "  echo: {} requests, {} replies, {} matched\n",
        icmp.requests, icmp.replies, icmp.matched_pairs
    ));
    out.push_str(&summary_line("rtt", Some(&icmp.rtt)));
    out.push_str(&summary_line("interval", icmp.request_intervals.as_ref()));
    out.push_str(&summary_line("rtt jitter", icmp.rtt_jitter.as_ref()));
    out.push_str(&summary_line("interval jitter", icmp.interval_jitter.as_ref()));
    out.push_str(&format!(
        "  loss: {}/{} lost ({:.2}%)\n",
        icmp.loss.lost, icmp.loss.sent, icmp.loss.loss_rate_percent
    ));
    if icmp.loss.correlation_anomaly {
        out.push_str("  warning: more replied sequence numbers than requests\n");
    }
    out
}

fn summary_line(label: &str, bundle: Option<&StatBundle>) -> String {
    match bundle {
        Some(bundle) => {
            let s = bundle.summary;
            format!(
                "  {label}: mean {:.3} ms  std {:.3} ms  min {:.3} ms  max {:.3} ms\n",
                s.mean * 1000.0,
                s.std * 1000.0,
                s.min * 1000.0,
                s.max * 1000.0
            )
        }
        None => format!("  {label}: n/a\n"),
    }
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("use a .pcap or .pcapng file".to_string()),
        ));
    }
    if !input.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("use a .pcap or .pcapng file".to_string()),
        ));
    }
    let ext = input
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if ext != "pcap" && ext != "pcapng" {
        return Err(CliError::new(
            format!("unsupported input format '{}'", input.display()),
            Some("expected a .pcap or .pcapng file".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &Path) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.to_path_buf());
    }

    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    let mut matches = Vec::new();
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    match matches.len() {
        0 => Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern; expected .pcap or .pcapng".to_string()),
        )),
        1 => Ok(matches.remove(0)),
        count => {
            let mut message = format!(
                "multiple files match pattern '{}' ({} matches)",
                pattern, count
            );
            let listed: Vec<String> = matches
                .iter()
                .take(3)
                .map(|p| p.display().to_string())
                .collect();
            message.push_str("; matches: ");
            message.push_str(&listed.join(", "));
            if count > 3 {
                message.push_str(", ...");
            }
            Err(CliError::new(
                message,
                Some("pass a single capture file, or run once per file".to_string()),
            ))
        }
    }
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}

#[cfg(test)]
mod tests {
    use super::{is_glob_pattern, render_summary};
    use pingshark_core::{LossBundle, StatBundle, make_stub_report};

    #[test]
    fn glob_detection() {
        assert!(is_glob_pattern("captures/*.pcap"));
        assert!(is_glob_pattern("h1-h?.pcapng"));
        assert!(!is_glob_pattern("h1-h3.pcap"));
    }

    #[test]
    fn summary_reports_milliseconds() {
        let mut report = make_stub_report("h1-h3.pcap", 10, "h1-h3");
        report.icmp = Some(pingshark_core::IcmpSummary {
            requests: 2,
            replies: 2,
            matched_pairs: 2,
            unmatched_replies: 0,
            endpoints: None,
            sequence_numbers: vec![1, 2],
            rtt: StatBundle::from_samples(vec![0.010, 0.020]),
            request_intervals: None,
            rtt_jitter: None,
            interval_jitter: None,
            loss: LossBundle::from_counts(2, 2),
        });
        let text = render_summary(&report);
        assert!(text.contains("rtt: mean 15.000 ms"));
        assert!(text.contains("interval: n/a"));
        assert!(text.contains("loss: 0/2 lost (0.00%)"));
    }
}
