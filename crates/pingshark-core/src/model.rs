//! Normalized capture model consumed by the statistics engines.
//!
//! A `PacketRecord` is what the decoding layer produces for one captured
//! frame; a `Capture` owns the records of one file in arrival order. Both
//! are immutable once built and carry no link back to the raw bytes.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::stats::StatsError;

/// ICMP type of an echo request.
pub const ICMP_ECHO_REQUEST: u8 = 8;
/// ICMP type of an echo reply.
pub const ICMP_ECHO_REPLY: u8 = 0;

pub(crate) const IP_LAYER: &str = "IP";
pub(crate) const ICMP_LAYER: &str = "ICMP";

/// Network-layer addresses of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpFields {
    pub src: IpAddr,
    pub dst: IpAddr,
}

/// ICMP header fields used for echo correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IcmpFields {
    pub icmp_type: u8,
    pub seq: u16,
}

impl IcmpFields {
    pub fn is_echo_request(&self) -> bool {
        self.icmp_type == ICMP_ECHO_REQUEST
    }

    pub fn is_echo_reply(&self) -> bool {
        self.icmp_type == ICMP_ECHO_REPLY
    }
}

/// One captured packet, as seen by the analysis engines.
///
/// # Examples
/// ```
/// use pingshark_core::{IcmpFields, PacketRecord};
///
/// let record = PacketRecord::new(1.5, 98, vec!["Ethernet".into(), "IP".into(), "ICMP".into()])
///     .with_icmp(IcmpFields { icmp_type: 8, seq: 1 });
/// assert_eq!(record.icmp_seq().unwrap(), 1);
/// assert!(record.src_ip().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacketRecord {
    timestamp: f64,
    byte_length: u64,
    layers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ip: Option<IpFields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    icmp: Option<IcmpFields>,
}

impl PacketRecord {
    pub fn new(timestamp: f64, byte_length: u64, layers: Vec<String>) -> Self {
        Self {
            timestamp,
            byte_length,
            layers,
            ip: None,
            icmp: None,
        }
    }

    pub fn with_ip(mut self, ip: IpFields) -> Self {
        self.ip = Some(ip);
        self
    }

    pub fn with_icmp(mut self, icmp: IcmpFields) -> Self {
        self.icmp = Some(icmp);
        self
    }

    /// Capture timestamp in seconds since the Unix epoch.
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn byte_length(&self) -> u64 {
        self.byte_length
    }

    /// Layer names, outermost first.
    pub fn layers(&self) -> &[String] {
        &self.layers
    }

    pub fn ip(&self) -> Option<&IpFields> {
        self.ip.as_ref()
    }

    pub fn icmp(&self) -> Option<&IcmpFields> {
        self.icmp.as_ref()
    }

    pub fn src_ip(&self) -> Result<IpAddr, StatsError> {
        self.ip.map(|ip| ip.src).ok_or(StatsError::MissingLayer { layer: IP_LAYER })
    }

    pub fn dst_ip(&self) -> Result<IpAddr, StatsError> {
        self.ip.map(|ip| ip.dst).ok_or(StatsError::MissingLayer { layer: IP_LAYER })
    }

    pub fn icmp_type(&self) -> Result<u8, StatsError> {
        self.icmp
            .map(|icmp| icmp.icmp_type)
            .ok_or(StatsError::MissingLayer { layer: ICMP_LAYER })
    }

    pub fn icmp_seq(&self) -> Result<u16, StatsError> {
        self.icmp
            .map(|icmp| icmp.seq)
            .ok_or(StatsError::MissingLayer { layer: ICMP_LAYER })
    }
}

/// Records of a single capture in arrival order.
///
/// Timestamps are kept exactly as decoded; nothing here sorts or repairs
/// out-of-order packets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capture {
    id: String,
    records: Vec<PacketRecord>,
}

impl Capture {
    pub fn new(id: impl Into<String>, records: Vec<PacketRecord>) -> Self {
        Self {
            id: id.into(),
            records,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn records(&self) -> &[PacketRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
