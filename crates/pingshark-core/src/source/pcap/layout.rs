pub const MAGIC_LEN: usize = 4;
pub const PCAPNG_MAGIC: [u8; MAGIC_LEN] = [0x0a, 0x0d, 0x0d, 0x0a];

pub const PCAP_READER_BUFFER_SIZE: usize = 64 * 1024;

/// PCAPNG default when an interface carries no `if_tsresol` option.
pub const DEFAULT_TS_UNITS_PER_SEC: f64 = 1e6;
pub const TSRESOL_BINARY_FLAG: u8 = 0x80;
