use std::io::{Read, Seek, SeekFrom};

use super::error::PcapSourceError;
use super::layout;
use pcap_parser::Linktype;

/// Link type and clock of one PCAPNG interface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterfaceInfo {
    pub linktype: Linktype,
    pub ts_units_per_sec: f64,
}

impl Default for InterfaceInfo {
    fn default() -> Self {
        Self {
            linktype: Linktype::ETHERNET,
            ts_units_per_sec: layout::DEFAULT_TS_UNITS_PER_SEC,
        }
    }
}

/// Read the leading magic bytes and rewind the reader to the start.
///
/// # Examples
/// This helper is part of an internal module, so the example is marked as
/// text example.
/// ```text
/// use pingshark_core::source::pcap::reader::read_magic_and_rewind;
/// use std::io::Cursor;
///
/// let mut cursor = Cursor::new([0x0a, 0x0d, 0x0d, 0x0a, 0x01]);
/// assert_eq!(read_magic_and_rewind(&mut cursor).unwrap(), [0x0a, 0x0d, 0x0d, 0x0a]);
/// assert_eq!(cursor.position(), 0);
/// ```
///
/// # Errors
/// Returns `PcapSourceError::Io` when fewer than four bytes are available.
pub fn read_magic_and_rewind<R: Read + Seek>(
    reader: &mut R,
) -> Result<[u8; layout::MAGIC_LEN], PcapSourceError> {
    let mut magic = [0u8; layout::MAGIC_LEN];
    reader.read_exact(&mut magic)?;
    reader.seek(SeekFrom::Start(0))?;
    Ok(magic)
}

pub fn is_pcapng_magic(magic: &[u8; layout::MAGIC_LEN]) -> bool {
    magic == &layout::PCAPNG_MAGIC
}

/// Interface info for an interface id, defaulting to microsecond Ethernet.
pub fn interface_for(interfaces: &[InterfaceInfo], if_id: u32) -> InterfaceInfo {
    interfaces
        .get(if_id as usize)
        .copied()
        .unwrap_or_default()
}

/// Timestamp units per second for a PCAPNG `if_tsresol` value.
///
/// The high bit selects a power of two, otherwise a power of ten.
///
/// # Examples
/// ```text
/// use pingshark_core::source::pcap::reader::ts_units_per_sec;
///
/// assert_eq!(ts_units_per_sec(6), 1e6);
/// assert_eq!(ts_units_per_sec(9), 1e9);
/// assert_eq!(ts_units_per_sec(0x80 | 10), 1024.0);
/// ```
pub fn ts_units_per_sec(if_tsresol: u8) -> f64 {
    let exponent = (if_tsresol & !layout::TSRESOL_BINARY_FLAG) as i32;
    if if_tsresol & layout::TSRESOL_BINARY_FLAG != 0 {
        2f64.powi(exponent)
    } else {
        10f64.powi(exponent)
    }
}

/// Convert PCAPNG high/low timestamp words to seconds.
pub fn pcapng_ts_to_seconds(ts_high: u32, ts_low: u32, units_per_sec: f64) -> f64 {
    let ts = ((ts_high as u64) << 32) | (ts_low as u64);
    ts as f64 / units_per_sec
}

/// Convert a legacy PCAP record timestamp to seconds.
pub fn legacy_ts_to_seconds(ts_sec: u32, ts_frac: u32, nanosecond: bool) -> f64 {
    let scale = if nanosecond { 1e-9 } else { 1e-6 };
    ts_sec as f64 + ts_frac as f64 * scale
}
