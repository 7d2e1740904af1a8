#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

const ETHERTYPE_IPV4: u16 = 0x0800;
const ICMP_PROTO: u8 = 1;
const UDP_PROTO: u8 = 17;
const ICMP_ECHO_REQUEST: u8 = 8;
const ICMP_ECHO_REPLY: u8 = 0;
const ECHO_IDENT: u16 = 0x4242;
const ECHO_PAYLOAD_LEN: usize = 56;

pub const H1: [u8; 4] = [10, 0, 0, 1];
pub const H3: [u8; 4] = [10, 0, 0, 3];

/// Capture start used by every fixture (2024-01-01T00:00:00Z).
pub const BASE_TS_US: u64 = 1_704_067_200_000_000;

/// One frame of a synthetic capture, offset from `BASE_TS_US`.
pub struct Frame {
    pub offset_us: u64,
    pub data: Vec<u8>,
}

pub fn request(offset_us: u64, seq: u16) -> Frame {
    Frame {
        offset_us,
        data: icmp_echo_frame(H1, H3, ICMP_ECHO_REQUEST, seq),
    }
}

pub fn reply(offset_us: u64, seq: u16) -> Frame {
    Frame {
        offset_us,
        data: icmp_echo_frame(H3, H1, ICMP_ECHO_REPLY, seq),
    }
}

pub fn udp(offset_us: u64) -> Frame {
    Frame {
        offset_us,
        data: udp_frame(H1, H3, &[0xde, 0xad, 0xbe, 0xef]),
    }
}

pub fn garbage(offset_us: u64) -> Frame {
    Frame {
        offset_us,
        data: vec![0xff; 6],
    }
}

/// Write frames to a uniquely named PCAPNG file in the temp dir.
pub fn write_capture(name: &str, frames: &[Frame]) -> PathBuf {
    let path = temp_path(name, "pcapng");
    fs::write(&path, pcapng_bytes(frames)).expect("write capture");
    path
}

/// Write frames to a uniquely named legacy PCAP file (nanosecond magic when
/// `nanosecond` is set) in the temp dir.
pub fn write_legacy_capture(name: &str, frames: &[Frame], nanosecond: bool) -> PathBuf {
    let path = temp_path(name, "pcap");
    fs::write(&path, legacy_pcap_bytes(frames, nanosecond)).expect("write capture");
    path
}

fn temp_path(name: &str, ext: &str) -> PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    std::env::temp_dir().join(format!("pingshark_{name}_{unique}.{ext}"))
}

pub fn icmp_echo_frame(src: [u8; 4], dst: [u8; 4], icmp_type: u8, seq: u16) -> Vec<u8> {
    let mut icmp = vec![0u8; 8 + ECHO_PAYLOAD_LEN];
    icmp[0] = icmp_type;
    icmp[4..6].copy_from_slice(&ECHO_IDENT.to_be_bytes());
    icmp[6..8].copy_from_slice(&seq.to_be_bytes());
    for (idx, byte) in icmp[8..].iter_mut().enumerate() {
        *byte = idx as u8;
    }
    let checksum = internet_checksum(&icmp);
    icmp[2..4].copy_from_slice(&checksum.to_be_bytes());
    ipv4_frame(src, dst, ICMP_PROTO, &icmp)
}

pub fn udp_frame(src: [u8; 4], dst: [u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut udp = Vec::new();
    udp.extend_from_slice(&40000u16.to_be_bytes());
    udp.extend_from_slice(&5353u16.to_be_bytes());
    udp.extend_from_slice(&(8 + payload.len() as u16).to_be_bytes());
    udp.extend_from_slice(&0u16.to_be_bytes());
    udp.extend_from_slice(payload);
    ipv4_frame(src, dst, UDP_PROTO, &udp)
}

fn ipv4_frame(src: [u8; 4], dst: [u8; 4], protocol: u8, payload: &[u8]) -> Vec<u8> {
    let mut packet = Vec::new();
    packet.extend_from_slice(&[0x02, 0x00, 0x00, 0x00, 0x00, 0x03]);
    packet.extend_from_slice(&[0x02, 0x00, 0x00, 0x00, 0x00, 0x01]);
    packet.extend_from_slice(&ETHERTYPE_IPV4.to_be_bytes());

    let total_len = 20u16 + payload.len() as u16;
    let mut ip_header = [0u8; 20];
    ip_header[0] = 0x45;
    ip_header[2..4].copy_from_slice(&total_len.to_be_bytes());
    ip_header[8] = 64;
    ip_header[9] = protocol;
    ip_header[12..16].copy_from_slice(&src);
    ip_header[16..20].copy_from_slice(&dst);
    let checksum = internet_checksum(&ip_header);
    ip_header[10..12].copy_from_slice(&checksum.to_be_bytes());
    packet.extend_from_slice(&ip_header);
    packet.extend_from_slice(payload);
    packet
}

fn internet_checksum(data: &[u8]) -> u16 {
    let mut sum = 0u32;
    for chunk in data.chunks(2) {
        let hi = chunk[0];
        let lo = chunk.get(1).copied().unwrap_or(0);
        sum = sum.wrapping_add(u16::from_be_bytes([hi, lo]) as u32);
    }
    while (sum >> 16) != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    !(sum as u16)
}

fn pcapng_bytes(frames: &[Frame]) -> Vec<u8> {
    let mut output = Vec::new();
    output.extend_from_slice(&pcapng_block(0x0A0D0D0A, &section_header_body()));
    output.extend_from_slice(&pcapng_block(1, &interface_desc_body()));
    for frame in frames {
        let ts_us = BASE_TS_US + frame.offset_us;
        output.extend_from_slice(&pcapng_block(6, &enhanced_packet_body(ts_us, &frame.data)));
    }
    output
}

fn legacy_pcap_bytes(frames: &[Frame], nanosecond: bool) -> Vec<u8> {
    let magic: u32 = if nanosecond { 0xa1b2_3c4d } else { 0xa1b2_c3d4 };
    let mut output = Vec::new();
    output.extend_from_slice(&magic.to_le_bytes());
    output.extend_from_slice(&2u16.to_le_bytes());
    output.extend_from_slice(&4u16.to_le_bytes());
    output.extend_from_slice(&0i32.to_le_bytes());
    output.extend_from_slice(&0u32.to_le_bytes());
    output.extend_from_slice(&65535u32.to_le_bytes());
    output.extend_from_slice(&1u32.to_le_bytes());
    for frame in frames {
        let ts_us = BASE_TS_US + frame.offset_us;
        let sec = (ts_us / 1_000_000) as u32;
        let frac = (ts_us % 1_000_000) as u32;
        let frac = if nanosecond { frac * 1_000 } else { frac };
        output.extend_from_slice(&sec.to_le_bytes());
        output.extend_from_slice(&frac.to_le_bytes());
        output.extend_from_slice(&(frame.data.len() as u32).to_le_bytes());
        output.extend_from_slice(&(frame.data.len() as u32).to_le_bytes());
        output.extend_from_slice(&frame.data);
    }
    output
}

fn pcapng_block(block_type: u32, body: &[u8]) -> Vec<u8> {
    let total_len = (8 + body.len() + 4) as u32;
    let mut block = Vec::with_capacity(total_len as usize);
    block.extend_from_slice(&block_type.to_be_bytes());
    block.extend_from_slice(&total_len.to_be_bytes());
    block.extend_from_slice(body);
    block.extend_from_slice(&total_len.to_be_bytes());
    block
}

fn section_header_body() -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&0x1A2B3C4Du32.to_be_bytes());
    body.extend_from_slice(&1u16.to_be_bytes());
    body.extend_from_slice(&0u16.to_be_bytes());
    body.extend_from_slice(&(-1i64).to_be_bytes());
    body
}

fn interface_desc_body() -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&1u16.to_be_bytes());
    body.extend_from_slice(&0u16.to_be_bytes());
    body.extend_from_slice(&65535u32.to_be_bytes());
    body
}

fn enhanced_packet_body(ts_us: u64, data: &[u8]) -> Vec<u8> {
    let ts_high = (ts_us >> 32) as u32;
    let ts_low = (ts_us & 0xFFFF_FFFF) as u32;
    let cap_len = data.len() as u32;
    let mut body = Vec::new();
    body.extend_from_slice(&0u32.to_be_bytes());
    body.extend_from_slice(&ts_high.to_be_bytes());
    body.extend_from_slice(&ts_low.to_be_bytes());
    body.extend_from_slice(&cap_len.to_be_bytes());
    body.extend_from_slice(&cap_len.to_be_bytes());
    body.extend_from_slice(data);
    let pad_len = (4 - (data.len() % 4)) % 4;
    body.extend(std::iter::repeat_n(0u8, pad_len));
    body
}
