//! PCAP/PCAPNG source implementation.
//!
//! `PcapSource` reads legacy PCAP (micro- or nanosecond timestamps) and
//! PCAPNG from any seekable reader, picking the format from the leading
//! magic bytes.
//! It only frames packets; no protocol decoding happens here.

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use parser::{PcapFileSource, PcapSource};
