use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use pcap_parser::{
    Block, LegacyPcapReader, Linktype, PcapBlockOwned, PcapError, PcapNGReader,
    traits::PcapReaderIterator,
};

use crate::source::{PacketEvent, PacketSource, SourceError};

use super::error::PcapSourceError;
use super::layout;
use super::reader::{
    InterfaceInfo, interface_for, is_pcapng_magic, legacy_ts_to_seconds, pcapng_ts_to_seconds,
    read_magic_and_rewind, ts_units_per_sec,
};

/// Packet source over PCAP or PCAPNG data from any seekable reader.
pub struct PcapSource<R: Read> {
    inner: PcapReader<R>,
}

/// Packet source reading a capture file.
pub type PcapFileSource = PcapSource<File>;

enum PcapReader<R: Read> {
    Legacy {
        reader: LegacyPcapReader<R>,
        linktype: Option<Linktype>,
        nanosecond: bool,
    },
    Ng {
        reader: PcapNGReader<R>,
        interfaces: Vec<InterfaceInfo>,
    },
}

impl PcapSource<File> {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path).map_err(SourceError::from)?;
        Self::from_reader(file)
    }
}

impl<R: Read + Seek> PcapSource<R> {
    pub fn from_reader(reader: R) -> Result<Self, SourceError> {
        let inner = create_reader(reader).map_err(SourceError::from)?;
        Ok(Self { inner })
    }
}

impl<R: Read> PacketSource for PcapSource<R> {
    fn next_packet(&mut self) -> Result<Option<PacketEvent>, SourceError> {
        next_packet(&mut self.inner).map_err(SourceError::from)
    }
}

fn create_reader<R: Read + Seek>(mut input: R) -> Result<PcapReader<R>, PcapSourceError> {
    let magic = read_magic_and_rewind(&mut input)?;

    if is_pcapng_magic(&magic) {
        let reader = PcapNGReader::new(layout::PCAP_READER_BUFFER_SIZE, input)
            .map_err(|e| PcapSourceError::pcap("pcapng reader init", e))?;
        Ok(PcapReader::Ng {
            reader,
            interfaces: Vec::new(),
        })
    } else {
        let reader = LegacyPcapReader::new(layout::PCAP_READER_BUFFER_SIZE, input)
            .map_err(|e| PcapSourceError::pcap("pcap reader init", e))?;
        Ok(PcapReader::Legacy {
            reader,
            linktype: None,
            nanosecond: false,
        })
    }
}

fn next_packet<R: Read>(
    reader: &mut PcapReader<R>,
) -> Result<Option<PacketEvent>, PcapSourceError> {
    loop {
        match reader {
            PcapReader::Legacy {
                reader,
                linktype,
                nanosecond,
            } => match reader.next() {
                Ok((offset, block)) => {
                    let event = match block {
                        PcapBlockOwned::LegacyHeader(header) => {
                            *linktype = Some(header.network);
                            *nanosecond = header.is_nanosecond_precision();
                            None
                        }
                        PcapBlockOwned::Legacy(packet) => Some(PacketEvent {
                            ts: legacy_ts_to_seconds(packet.ts_sec, packet.ts_usec, *nanosecond),
                            linktype: linktype.unwrap_or(Linktype::ETHERNET),
                            data: packet.data.to_vec(),
                        }),
                        _ => None,
                    };
                    reader.consume(offset);
                    if event.is_some() {
                        return Ok(event);
                    }
                }
                Err(PcapError::Eof) => return Ok(None),
                Err(PcapError::Incomplete(_)) => {
                    reader
                        .refill()
                        .map_err(|e| PcapSourceError::pcap("pcap reader refill", e))?;
                }
                Err(e) => return Err(PcapSourceError::pcap("pcap reader next", e)),
            },
            PcapReader::Ng { reader, interfaces } => match reader.next() {
                Ok((offset, block)) => {
                    let event = match block {
                        PcapBlockOwned::NG(Block::SectionHeader(_)) => {
                            interfaces.clear();
                            None
                        }
                        PcapBlockOwned::NG(Block::InterfaceDescription(intf)) => {
                            interfaces.push(InterfaceInfo {
                                linktype: intf.linktype,
                                ts_units_per_sec: ts_units_per_sec(intf.if_tsresol),
                            });
                            None
                        }
                        PcapBlockOwned::NG(Block::EnhancedPacket(packet)) => {
                            let interface = interface_for(interfaces, packet.if_id);
                            Some(PacketEvent {
                                ts: pcapng_ts_to_seconds(
                                    packet.ts_high,
                                    packet.ts_low,
                                    interface.ts_units_per_sec,
                                ),
                                linktype: interface.linktype,
                                data: packet.data.to_vec(),
                            })
                        }
                        _ => None,
                    };
                    reader.consume(offset);
                    if event.is_some() {
                        return Ok(event);
                    }
                }
                Err(PcapError::Eof) => return Ok(None),
                Err(PcapError::Incomplete(_)) => {
                    reader
                        .refill()
                        .map_err(|e| PcapSourceError::pcap("pcapng reader refill", e))?;
                }
                Err(e) => return Err(PcapSourceError::pcap("pcapng reader next", e)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PcapSource;
    use crate::source::{PacketSource, SourceError};
    use pcap_parser::Linktype;
    use std::io::Cursor;

    fn legacy_capture(magic: u32, ts_frac: u32, frame: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&magic.to_le_bytes());
        out.extend_from_slice(&2u16.to_le_bytes());
        out.extend_from_slice(&4u16.to_le_bytes());
        out.extend_from_slice(&0i32.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&65535u32.to_le_bytes());
        out.extend_from_slice(&101u32.to_le_bytes());
        out.extend_from_slice(&7u32.to_le_bytes());
        out.extend_from_slice(&ts_frac.to_le_bytes());
        out.extend_from_slice(&(frame.len() as u32).to_le_bytes());
        out.extend_from_slice(&(frame.len() as u32).to_le_bytes());
        out.extend_from_slice(frame);
        out
    }

    #[test]
    fn legacy_microsecond_capture() {
        let data = legacy_capture(0xa1b2_c3d4, 500_000, &[0x45, 0, 0, 20]);
        let mut source = PcapSource::from_reader(Cursor::new(data)).unwrap();
        let event = source.next_packet().unwrap().unwrap();
        assert!((event.ts - 7.5).abs() < 1e-9);
        assert_eq!(event.linktype, Linktype::RAW);
        assert_eq!(event.data, [0x45, 0, 0, 20]);
        assert!(source.next_packet().unwrap().is_none());
    }

    #[test]
    fn legacy_nanosecond_capture() {
        let data = legacy_capture(0xa1b2_3c4d, 250_000_000, &[0x45]);
        let mut source = PcapSource::from_reader(Cursor::new(data)).unwrap();
        let event = source.next_packet().unwrap().unwrap();
        assert!((event.ts - 7.25).abs() < 1e-9);
    }

    #[test]
    fn empty_input_is_io_error() {
        let err = match PcapSource::from_reader(Cursor::new(Vec::new())) {
            Ok(_) => panic!("expected empty input to be rejected"),
            Err(err) => err,
        };
        assert!(matches!(err, SourceError::Io(_)));
    }
}
