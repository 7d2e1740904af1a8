use std::net::IpAddr;

use etherparse::{Icmpv4Type, NetSlice, SlicedPacket, TransportSlice};
use pcap_parser::Linktype;

use crate::model::{IcmpFields, IpFields, PacketRecord};
use crate::source::PacketEvent;

use super::error::DecodeError;
use super::layout;

/// Decode one captured frame into a record.
///
/// The layer chain lists the link layer (when the link type has one), the
/// network and transport layers etherparse recognizes, and `Raw` when the
/// innermost layer carries a non-empty payload.
pub fn decode_event(event: &PacketEvent) -> Result<PacketRecord, DecodeError> {
    let data = event.data.as_slice();
    let (link_layer, sliced) = match event.linktype {
        Linktype::ETHERNET => (
            Some(layout::ETHERNET),
            SlicedPacket::from_ethernet(data).map_err(|e| DecodeError::Slice(e.to_string()))?,
        ),
        Linktype::LINUX_SLL => (
            Some(layout::LINUX_SLL),
            SlicedPacket::from_linux_sll(data).map_err(|e| DecodeError::Slice(e.to_string()))?,
        ),
        Linktype::RAW | Linktype::IPV4 | Linktype::IPV6 => (
            None,
            SlicedPacket::from_ip(data).map_err(|e| DecodeError::Slice(e.to_string()))?,
        ),
        other => return Err(DecodeError::UnsupportedLinktype(other.0)),
    };

    let mut layers: Vec<String> = Vec::new();
    if let Some(name) = link_layer {
        layers.push(name.to_string());
    }

    let mut ip = None;
    let mut icmp = None;
    let mut innermost_payload = match &sliced.net {
        Some(net) => {
            let (name, fields) = match net {
                NetSlice::Ipv4(ipv4) => (
                    layout::IPV4,
                    IpFields {
                        src: IpAddr::V4(ipv4.header().source_addr()),
                        dst: IpAddr::V4(ipv4.header().destination_addr()),
                    },
                ),
                NetSlice::Ipv6(ipv6) => (
                    layout::IPV6,
                    IpFields {
                        src: IpAddr::V6(ipv6.header().source_addr()),
                        dst: IpAddr::V6(ipv6.header().destination_addr()),
                    },
                ),
            };
            layers.push(name.to_string());
            ip = Some(fields);
            net.ip_payload_ref()
                .map(|payload| payload.payload.len())
                .unwrap_or(0)
        }
        None => data.len(),
    };

    if let Some(transport) = &sliced.transport {
        let (name, payload_len) = match transport {
            TransportSlice::Icmpv4(slice) => {
                // Only echo messages carry a sequence number.
                let seq = match slice.icmp_type() {
                    Icmpv4Type::EchoRequest(echo) | Icmpv4Type::EchoReply(echo) => echo.seq,
                    _ => 0,
                };
                icmp = Some(IcmpFields {
                    icmp_type: slice.type_u8(),
                    seq,
                });
                (layout::ICMP, slice.payload().len())
            }
            TransportSlice::Icmpv6(slice) => (layout::ICMPV6, slice.payload().len()),
            TransportSlice::Udp(slice) => (layout::UDP, slice.payload().len()),
            TransportSlice::Tcp(slice) => (layout::TCP, slice.payload().len()),
        };
        layers.push(name.to_string());
        innermost_payload = payload_len;
    }

    if innermost_payload > 0 {
        layers.push(layout::RAW.to_string());
    }

    let mut record = PacketRecord::new(event.ts, data.len() as u64, layers);
    if let Some(ip) = ip {
        record = record.with_ip(ip);
    }
    if let Some(icmp) = icmp {
        record = record.with_icmp(icmp);
    }
    Ok(record)
}

/// Record for a frame that could not be decoded: counted, never correlated.
pub fn opaque_record(event: &PacketEvent) -> PacketRecord {
    PacketRecord::new(
        event.ts,
        event.data.len() as u64,
        vec![layout::RAW.to_string()],
    )
}

#[cfg(test)]
mod tests {
    use super::{decode_event, opaque_record};
    use crate::analysis::decode::error::DecodeError;
    use crate::source::PacketEvent;
    use etherparse::PacketBuilder;
    use pcap_parser::Linktype;

    fn event(linktype: Linktype, data: Vec<u8>) -> PacketEvent {
        PacketEvent {
            ts: 12.5,
            linktype,
            data,
        }
    }

    #[test]
    fn decode_echo_request() {
        let builder = PacketBuilder::ethernet2([1, 2, 3, 4, 5, 6], [7, 8, 9, 10, 11, 12])
            .ipv4([10, 0, 0, 1], [10, 0, 0, 3], 64)
            .icmpv4_echo_request(0x1234, 17);
        let payload = [0xabu8; 56];
        let mut packet = Vec::<u8>::with_capacity(builder.size(payload.len()));
        builder.write(&mut packet, &payload).unwrap();
        let len = packet.len() as u64;

        let record = decode_event(&event(Linktype::ETHERNET, packet)).unwrap();
        assert_eq!(record.timestamp(), 12.5);
        assert_eq!(record.byte_length(), len);
        assert_eq!(record.layers(), ["Ethernet", "IP", "ICMP", "Raw"]);
        assert_eq!(record.icmp_type().unwrap(), 8);
        assert_eq!(record.icmp_seq().unwrap(), 17);
        assert_eq!(record.src_ip().unwrap().to_string(), "10.0.0.1");
        assert_eq!(record.dst_ip().unwrap().to_string(), "10.0.0.3");
    }

    #[test]
    fn decode_echo_reply_from_raw_ip() {
        let builder = PacketBuilder::ipv4([10, 0, 0, 3], [10, 0, 0, 1], 64)
            .icmpv4_echo_reply(0x1234, 300);
        let mut packet = Vec::<u8>::with_capacity(builder.size(0));
        builder.write(&mut packet, &[]).unwrap();

        let record = decode_event(&event(Linktype::RAW, packet)).unwrap();
        assert_eq!(record.layers(), ["IP", "ICMP"]);
        assert_eq!(record.icmp_type().unwrap(), 0);
        assert_eq!(record.icmp_seq().unwrap(), 300);
    }

    #[test]
    fn decode_udp_has_ip_but_no_icmp() {
        let builder = PacketBuilder::ethernet2([1, 1, 1, 1, 1, 1], [2, 2, 2, 2, 2, 2])
            .ipv4([192, 168, 0, 1], [192, 168, 0, 2], 64)
            .udp(5353, 5353);
        let payload = [1, 2, 3, 4];
        let mut packet = Vec::<u8>::with_capacity(builder.size(payload.len()));
        builder.write(&mut packet, &payload).unwrap();

        let record = decode_event(&event(Linktype::ETHERNET, packet)).unwrap();
        assert_eq!(record.layers(), ["Ethernet", "IP", "UDP", "Raw"]);
        assert!(record.icmp().is_none());
        assert!(record.ip().is_some());
    }

    #[test]
    fn decode_tcp_without_payload_has_no_raw() {
        let builder = PacketBuilder::ethernet2([1, 1, 1, 1, 1, 1], [2, 2, 2, 2, 2, 2])
            .ipv6([1; 16], [2; 16], 64)
            .tcp(1000, 443, 0, 1024);
        let mut packet = Vec::<u8>::with_capacity(builder.size(0));
        builder.write(&mut packet, &[]).unwrap();

        let record = decode_event(&event(Linktype::ETHERNET, packet)).unwrap();
        assert_eq!(record.layers(), ["Ethernet", "IPv6", "TCP"]);
    }

    #[test]
    fn non_echo_icmp_has_no_sequence() {
        // Destination unreachable, fragmentation needed, next-hop MTU 1400.
        let builder = PacketBuilder::ipv4([10, 0, 0, 254], [10, 0, 0, 1], 64)
            .icmpv4_raw(3, 4, [0, 0, 0x05, 0x78]);
        let payload = [0x45u8; 28];
        let mut packet = Vec::<u8>::with_capacity(builder.size(payload.len()));
        builder.write(&mut packet, &payload).unwrap();

        let record = decode_event(&event(Linktype::RAW, packet)).unwrap();
        assert_eq!(record.layers(), ["IP", "ICMP", "Raw"]);
        assert_eq!(record.icmp_type().unwrap(), 3);
        assert_eq!(record.icmp_seq().unwrap(), 0);
    }

    #[test]
    fn decode_slice_error() {
        let result = decode_event(&event(Linktype::ETHERNET, Vec::new()));
        assert!(matches!(result, Err(DecodeError::Slice(_))));
    }

    #[test]
    fn decode_unsupported_linktype() {
        let result = decode_event(&event(Linktype::NULL, vec![0; 8]));
        assert!(matches!(result, Err(DecodeError::UnsupportedLinktype(0))));
    }

    #[test]
    fn opaque_record_keeps_length() {
        let record = opaque_record(&event(Linktype::ETHERNET, vec![0; 14]));
        assert_eq!(record.byte_length(), 14);
        assert_eq!(record.layers(), ["Raw"]);
        assert!(record.icmp().is_none());
    }
}
