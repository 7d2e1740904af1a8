pub const ETHERNET: &str = "Ethernet";
pub const LINUX_SLL: &str = "SLL";
pub const IPV4: &str = "IP";
pub const IPV6: &str = "IPv6";
pub const ICMP: &str = "ICMP";
pub const ICMPV6: &str = "ICMPv6";
pub const TCP: &str = "TCP";
pub const UDP: &str = "UDP";
pub const RAW: &str = "Raw";
