use thiserror::Error;

/// Recoverable failures of a single statistic.
///
/// None of these abort the analysis of a capture: callers record the
/// statistic as unavailable and keep going.
///
/// # Examples
/// ```
/// use pingshark_core::stats::StatsError;
///
/// let err = StatsError::InsufficientData {
///     statistic: "request interval",
///     needed: 2,
///     actual: 1,
/// };
/// assert!(err.to_string().contains("need 2"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatsError {
    #[error("insufficient data for {statistic}: need {needed} samples, got {actual}")]
    InsufficientData {
        statistic: &'static str,
        needed: usize,
        actual: usize,
    },
    #[error("missing {layer} layer in packet")]
    MissingLayer { layer: &'static str },
    #[error("correlation anomaly: {received} distinct replies for {sent} requests")]
    CorrelationAnomaly { sent: u64, received: u64 },
}

impl StatsError {
    pub(crate) fn require(statistic: &'static str, needed: usize, actual: usize) -> Result<(), Self> {
        if actual < needed {
            return Err(StatsError::InsufficientData {
                statistic,
                needed,
                actual,
            });
        }
        Ok(())
    }
}
