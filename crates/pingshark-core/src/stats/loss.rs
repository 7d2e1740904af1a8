use serde::{Deserialize, Serialize};

use super::error::StatsError;

/// Echo delivery accounting.
///
/// `lost` is signed: more distinct replies than requests means the capture
/// or the correlation is inconsistent, and that is reported rather than
/// clamped.
///
/// # Examples
/// ```
/// use pingshark_core::stats::LossBundle;
///
/// let loss = LossBundle::from_counts(4, 3);
/// assert_eq!(loss.lost, 1);
/// assert_eq!(loss.loss_rate_percent, 25.0);
/// assert!(loss.check().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LossBundle {
    pub sent: u64,
    pub received: u64,
    pub lost: i64,
    pub loss_rate_percent: f64,
    pub correlation_anomaly: bool,
}

impl LossBundle {
    pub fn from_counts(sent: u64, received: u64) -> Self {
        let lost = sent as i64 - received as i64;
        let loss_rate_percent = if sent == 0 {
            0.0
        } else {
            lost as f64 * 100.0 / sent as f64
        };
        Self {
            sent,
            received,
            lost,
            loss_rate_percent,
            correlation_anomaly: received > sent,
        }
    }

    /// Fails with `CorrelationAnomaly` when replies outnumber requests.
    pub fn check(&self) -> Result<(), StatsError> {
        if self.correlation_anomaly {
            return Err(StatsError::CorrelationAnomaly {
                sent: self.sent,
                received: self.received,
            });
        }
        Ok(())
    }
}
