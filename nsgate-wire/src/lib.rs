pub mod arp;
pub mod checksum;
pub mod cursor;
pub mod dhcp;
pub mod ethernet;
pub mod icmp;
pub mod ipv4;
pub mod ipv6;
pub mod stack;
pub mod tcp;
pub mod udp;

pub use cursor::{ByteCursor, Half, WireError};
pub use stack::{Layer, LayerKind, PacketStack};
pub use udp::UdpDatagram;

#[cfg(test)]
mod tests {
    use crate::ethernet::{EthernetHeader, Mac, ETHERTYPE_IPV4};
    use crate::stack::{LayerKind, PacketStack};
    use crate::{cursor::ByteCursor, ipv4, udp};
    use std::net::Ipv4Addr;

    /// Builds IPv4 + UDP around a DNS-looking payload, requests both
    /// checksums through the stack, and checks both verify.
    #[test]
    fn should_checksum_ipv4_udp_dns_packet() {
        // a serialized A query for "foo" with ID 0xABCD
        let dns: &[u8] = &[
            0xAB, 0xCD, 0x01, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03, b'f',
            b'o', b'o', 0x00, 0x00, 0x01, 0x00, 0x01,
        ];

        let mut cursor = ByteCursor::with_capacity(0);
        let ip = ipv4::Ipv4Header::create(
            ipv4::PROTO_UDP,
            Ipv4Addr::new(192, 168, 1, 10),
            Ipv4Addr::new(8, 8, 8, 8),
            udp::HEADER_LEN + dns.len(),
        );
        let ip_len = ip.write(&mut cursor, 0).unwrap();
        udp::UdpHeader::new(50000, 53, dns.len())
            .write(&mut cursor, ip_len)
            .unwrap();
        cursor.set_writer(ip_len + udp::HEADER_LEN).unwrap();
        cursor.write_bytes(dns).unwrap();

        let eth = EthernetHeader::new(
            Mac([0xFF; 6]),
            Mac([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]),
            ETHERTYPE_IPV4,
        );
        let frame = eth.build(cursor.as_slice()).unwrap().into_vec();

        let mut stack = PacketStack::parse(&frame).unwrap();
        let udp_layer = stack.find(LayerKind::Udp).unwrap();
        let ip_layer = stack.find(LayerKind::Ipv4).unwrap();

        stack.checksum(udp_layer, 0).unwrap();
        stack.checksum(ip_layer, 0).unwrap();

        assert!(stack.verify_checksum(udp_layer).unwrap());
        assert!(stack.verify_checksum(ip_layer).unwrap());
        assert_eq!(stack.payload().unwrap(), dns);
    }
}
