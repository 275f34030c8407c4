use crate::checksum::PseudoHeader;
use crate::cursor::{ByteCursor, Half, WireError};
use crate::{arp, ethernet, icmp, ipv4, ipv6, tcp, udp};
use std::net::IpAddr;

/// Tag selecting the concrete framing of a [`Layer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Ethernet,
    Arp,
    Ipv4,
    Ipv6,
    Tcp,
    Udp,
    Icmp,
    Payload,
}

/// One protocol layer's region of the shared buffer. `len` spans the header
/// and everything nested inside it; the parent of layer `i` is layer `i - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layer {
    pub kind: LayerKind,
    pub offset: usize,
    pub len: usize,
}

/// A parsed frame: one buffer, a list of nested layer views over it.
///
/// Storing a checksum on any layer re-propagates to the enclosing layers, so
/// mutating an inner region can never leave an outer checksum stale.
#[derive(Debug)]
pub struct PacketStack {
    cursor: ByteCursor,
    layers: Vec<Layer>,
}

impl PacketStack {
    /// Parses a frame starting at the Ethernet layer, dispatching on the
    /// EtherType and then on the IP protocol number.
    pub fn parse(bytes: &[u8]) -> Result<Self, WireError> {
        let mut stack = Self {
            cursor: ByteCursor::from_slice(bytes),
            layers: Vec::new(),
        };
        let header = ethernet::EthernetHeader::read(&stack.cursor, 0)?;
        stack.layers.push(Layer {
            kind: LayerKind::Ethernet,
            offset: 0,
            len: stack.cursor.writer(),
        });
        stack.parse_l3(header.ether_type, header.len())?;
        Ok(stack)
    }

    /// Parses a bare IP packet (no link layer), sniffing the version nibble.
    pub fn parse_ip(bytes: &[u8]) -> Result<Self, WireError> {
        let mut stack = Self {
            cursor: ByteCursor::from_slice(bytes),
            layers: Vec::new(),
        };
        let ether_type = match stack.cursor.nibble(0, Half::High)? {
            4 => ethernet::ETHERTYPE_IPV4,
            6 => ethernet::ETHERTYPE_IPV6,
            other => {
                return Err(WireError::Protocol {
                    context: "ip version",
                    value: other as u32,
                })
            }
        };
        stack.parse_l3(ether_type, 0)?;
        Ok(stack)
    }

    fn parse_l3(&mut self, ether_type: u16, offset: usize) -> Result<(), WireError> {
        match ether_type {
            ethernet::ETHERTYPE_IPV4 => {
                let header = ipv4::Ipv4Header::read(&self.cursor, offset)?;
                let len = (header.total_len as usize).min(self.cursor.writer() - offset);
                if len < header.header_len() {
                    return Err(WireError::Protocol {
                        context: "ipv4 total length",
                        value: header.total_len as u32,
                    });
                }
                self.layers.push(Layer {
                    kind: LayerKind::Ipv4,
                    offset,
                    len,
                });
                self.parse_l4(header.protocol, offset + header.header_len(), offset + len)
            }
            ethernet::ETHERTYPE_IPV6 => {
                let header = ipv6::Ipv6Header::read(&self.cursor, offset)?;
                let len = (ipv6::SIZE + header.payload_len as usize)
                    .min(self.cursor.writer() - offset);
                self.layers.push(Layer {
                    kind: LayerKind::Ipv6,
                    offset,
                    len,
                });
                self.parse_l4(header.next_header, offset + ipv6::SIZE, offset + len)
            }
            ethernet::ETHERTYPE_ARP => {
                arp::ArpHeader::read(&self.cursor, offset)?;
                self.layers.push(Layer {
                    kind: LayerKind::Arp,
                    offset,
                    len: arp::SIZE,
                });
                Ok(())
            }
            other => Err(WireError::Protocol {
                context: "ether type dispatch",
                value: other as u32,
            }),
        }
    }

    fn parse_l4(&mut self, protocol: u8, offset: usize, end: usize) -> Result<(), WireError> {
        if end < offset {
            return Err(WireError::Protocol {
                context: "ip payload length",
                value: 0,
            });
        }
        let len = end - offset;
        let header_len = match protocol {
            ipv4::PROTO_TCP => {
                let header = tcp::TcpHeader::read(&self.cursor, offset)?;
                self.layers.push(Layer {
                    kind: LayerKind::Tcp,
                    offset,
                    len,
                });
                header.header_len()
            }
            ipv4::PROTO_UDP => {
                udp::UdpHeader::read(&self.cursor, offset)?;
                self.layers.push(Layer {
                    kind: LayerKind::Udp,
                    offset,
                    len,
                });
                udp::HEADER_LEN
            }
            ipv4::PROTO_ICMP => {
                let header = icmp::IcmpHeader::read(&self.cursor, offset)?;
                self.layers.push(Layer {
                    kind: LayerKind::Icmp,
                    offset,
                    len,
                });
                header.header_len()
            }
            other => {
                return Err(WireError::Protocol {
                    context: "ip protocol dispatch",
                    value: other as u32,
                })
            }
        };
        if header_len <= len {
            self.layers.push(Layer {
                kind: LayerKind::Payload,
                offset: offset + header_len,
                len: len - header_len,
            });
        }
        Ok(())
    }

    pub fn cursor(&self) -> &ByteCursor {
        &self.cursor
    }

    pub fn cursor_mut(&mut self) -> &mut ByteCursor {
        &mut self.cursor
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Index of the first layer of the given kind.
    pub fn find(&self, kind: LayerKind) -> Option<usize> {
        self.layers.iter().position(|layer| layer.kind == kind)
    }

    /// The innermost payload region, if any.
    pub fn payload(&self) -> Option<&[u8]> {
        let layer = self.layers.last()?;
        if layer.kind != LayerKind::Payload {
            return None;
        }
        self.cursor.get_bytes(layer.offset, layer.len).ok()
    }

    fn layer(&self, index: usize) -> Result<Layer, WireError> {
        self.layers.get(index).copied().ok_or(WireError::Protocol {
            context: "layer index",
            value: index as u32,
        })
    }

    /// The pseudo-header for layer `index`, taken from the nearest enclosing
    /// IP layer's current addresses.
    fn pseudo_for(&self, index: usize) -> Result<PseudoHeader, WireError> {
        for layer in self.layers[..index].iter().rev() {
            match layer.kind {
                LayerKind::Ipv4 => {
                    return Ok(PseudoHeader::V4 {
                        src: self.cursor.get_u32(layer.offset + 12)?.into(),
                        dst: self.cursor.get_u32(layer.offset + 16)?.into(),
                        protocol: self.cursor.get_u8(layer.offset + 9)?,
                    })
                }
                LayerKind::Ipv6 => {
                    let mut src = [0u8; 16];
                    src.copy_from_slice(self.cursor.get_bytes(layer.offset + 8, 16)?);
                    let mut dst = [0u8; 16];
                    dst.copy_from_slice(self.cursor.get_bytes(layer.offset + 24, 16)?);
                    return Ok(PseudoHeader::V6 {
                        src: src.into(),
                        dst: dst.into(),
                        next_header: self.cursor.get_u8(layer.offset + 6)?,
                    });
                }
                _ => continue,
            }
        }
        Err(WireError::Protocol {
            context: "no enclosing ip layer",
            value: index as u32,
        })
    }

    /// Value 0 recomputes the layer's checksum; any other value is stored
    /// literally. Either way the enclosing layers recompute afterwards;
    /// layers without a checksum are a no-op link in the chain.
    pub fn checksum(&mut self, index: usize, value: u16) -> Result<(), WireError> {
        let layer = self.layer(index)?;
        match layer.kind {
            LayerKind::Ipv4 => {
                if value == 0 {
                    ipv4::store_checksum(&mut self.cursor, layer.offset)?;
                } else {
                    self.cursor.set_u16(layer.offset + 10, value)?;
                }
            }
            LayerKind::Tcp => {
                let pseudo = self.pseudo_for(index)?;
                if value == 0 {
                    tcp::store_checksum(&mut self.cursor, layer.offset, layer.len, &pseudo)?;
                } else {
                    self.cursor.set_u16(layer.offset + 16, value)?;
                }
            }
            LayerKind::Udp => {
                let pseudo = self.pseudo_for(index)?;
                if value == 0 {
                    udp::store_checksum(&mut self.cursor, layer.offset, &pseudo)?;
                } else {
                    self.cursor.set_u16(layer.offset + 6, value)?;
                }
            }
            LayerKind::Icmp => {
                if value == 0 {
                    icmp::store_checksum(&mut self.cursor, layer.offset, layer.len)?;
                } else {
                    self.cursor.set_u16(layer.offset + 2, value)?;
                }
            }
            LayerKind::Ethernet | LayerKind::Arp | LayerKind::Ipv6 | LayerKind::Payload => {}
        }
        if index > 0 {
            self.checksum(index - 1, 0)?;
        }
        Ok(())
    }

    /// True when the layer's stored checksum is consistent with its bytes.
    /// Layers without a checksum verify trivially.
    pub fn verify_checksum(&self, index: usize) -> Result<bool, WireError> {
        let layer = self.layer(index)?;
        match layer.kind {
            LayerKind::Ipv4 => ipv4::verify_checksum(&self.cursor, layer.offset),
            LayerKind::Tcp => {
                let pseudo = self.pseudo_for(index)?;
                tcp::verify_checksum(&self.cursor, layer.offset, layer.len, &pseudo)
            }
            LayerKind::Udp => {
                let pseudo = self.pseudo_for(index)?;
                udp::verify_checksum(&self.cursor, layer.offset, &pseudo)
            }
            LayerKind::Icmp => icmp::verify_checksum(&self.cursor, layer.offset, layer.len),
            _ => Ok(true),
        }
    }

    pub fn src_ip(&self) -> Result<IpAddr, WireError> {
        for layer in &self.layers {
            match layer.kind {
                LayerKind::Ipv4 => {
                    return Ok(IpAddr::from(std::net::Ipv4Addr::from(
                        self.cursor.get_u32(layer.offset + 12)?,
                    )))
                }
                LayerKind::Ipv6 => {
                    let mut raw = [0u8; 16];
                    raw.copy_from_slice(self.cursor.get_bytes(layer.offset + 8, 16)?);
                    return Ok(IpAddr::from(std::net::Ipv6Addr::from(raw)));
                }
                _ => continue,
            }
        }
        Err(WireError::Protocol {
            context: "no ip layer",
            value: 0,
        })
    }

    pub fn dst_ip(&self) -> Result<IpAddr, WireError> {
        for layer in &self.layers {
            match layer.kind {
                LayerKind::Ipv4 => {
                    return Ok(IpAddr::from(std::net::Ipv4Addr::from(
                        self.cursor.get_u32(layer.offset + 16)?,
                    )))
                }
                LayerKind::Ipv6 => {
                    let mut raw = [0u8; 16];
                    raw.copy_from_slice(self.cursor.get_bytes(layer.offset + 24, 16)?);
                    return Ok(IpAddr::from(std::net::Ipv6Addr::from(raw)));
                }
                _ => continue,
            }
        }
        Err(WireError::Protocol {
            context: "no ip layer",
            value: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{LayerKind, PacketStack};
    use crate::cursor::ByteCursor;
    use crate::ethernet::{EthernetHeader, Mac, ETHERTYPE_ARP, ETHERTYPE_IPV4};
    use crate::{arp, ipv4, udp};
    use std::net::Ipv4Addr;

    fn build_udp_frame(payload: &[u8]) -> Vec<u8> {
        let mut cursor = ByteCursor::with_capacity(0);
        let ip = ipv4::Ipv4Header::create(
            ipv4::PROTO_UDP,
            Ipv4Addr::new(192, 168, 1, 10),
            Ipv4Addr::new(8, 8, 8, 8),
            udp::HEADER_LEN + payload.len(),
        );
        let ip_len = ip.write(&mut cursor, 0).unwrap();
        let header = udp::UdpHeader::new(50000, 53, payload.len());
        header.write(&mut cursor, ip_len).unwrap();
        cursor.set_writer(ip_len + udp::HEADER_LEN).unwrap();
        cursor.write_bytes(payload).unwrap();

        let eth = EthernetHeader::new(
            Mac([1, 1, 1, 1, 1, 1]),
            Mac([2, 2, 2, 2, 2, 2]),
            ETHERTYPE_IPV4,
        );
        eth.build(cursor.as_slice()).unwrap().into_vec()
    }

    #[test]
    fn should_dispatch_ethernet_ipv4_udp() {
        let frame = build_udp_frame(b"abcd");
        let stack = PacketStack::parse(&frame).unwrap();
        let kinds: Vec<_> = stack.layers().iter().map(|layer| layer.kind).collect();
        assert_eq!(
            kinds,
            vec![
                LayerKind::Ethernet,
                LayerKind::Ipv4,
                LayerKind::Udp,
                LayerKind::Payload
            ]
        );
        assert_eq!(stack.payload().unwrap(), b"abcd");
    }

    #[test]
    fn should_dispatch_arp() {
        let request = arp::ArpHeader::request(
            Mac([1, 2, 3, 4, 5, 6]),
            Ipv4Addr::new(10, 0, 0, 1),
            Ipv4Addr::new(10, 0, 0, 2),
        );
        let mut cursor = ByteCursor::with_capacity(arp::SIZE);
        request.write(&mut cursor, 0).unwrap();
        let eth = EthernetHeader::new(Mac::BROADCAST, Mac([1, 2, 3, 4, 5, 6]), ETHERTYPE_ARP);
        let frame = eth.build(cursor.as_slice()).unwrap().into_vec();

        let stack = PacketStack::parse(&frame).unwrap();
        assert_eq!(stack.find(LayerKind::Arp), Some(1));
    }

    #[test]
    fn should_reject_unknown_ether_type() {
        let eth = EthernetHeader::new(Mac::BROADCAST, Mac([1, 2, 3, 4, 5, 6]), 0x1234);
        let frame = eth.build(&[0u8; 46]).unwrap().into_vec();
        assert!(PacketStack::parse(&frame).is_err());
    }

    #[test]
    fn should_checksum_and_propagate_to_parent() {
        let frame = build_udp_frame(b"query bytes here");
        let mut stack = PacketStack::parse(&frame).unwrap();
        let udp_layer = stack.find(LayerKind::Udp).unwrap();
        let ip_layer = stack.find(LayerKind::Ipv4).unwrap();

        stack.checksum(udp_layer, 0).unwrap();
        assert!(stack.verify_checksum(udp_layer).unwrap());
        // the enclosing IPv4 header was recomputed by propagation
        assert!(stack.verify_checksum(ip_layer).unwrap());

        // idempotence: a second recompute leaves the bytes unchanged
        let before = stack.cursor().as_slice().to_vec();
        stack.checksum(udp_layer, 0).unwrap();
        assert_eq!(stack.cursor().as_slice(), &before[..]);
    }

    #[test]
    fn should_store_literal_checksum_value() {
        let frame = build_udp_frame(b"x");
        let mut stack = PacketStack::parse(&frame).unwrap();
        let udp_layer = stack.find(LayerKind::Udp).unwrap();
        let offset = stack.layers()[udp_layer].offset;
        stack.checksum(udp_layer, 0xABCD).unwrap();
        assert_eq!(stack.cursor().get_u16(offset + 6).unwrap(), 0xABCD);
        // parent recomputed even for a literal store
        let ip_layer = stack.find(LayerKind::Ipv4).unwrap();
        assert!(stack.verify_checksum(ip_layer).unwrap());
    }

    #[test]
    fn should_recompute_after_address_mutation() {
        let frame = build_udp_frame(b"payload");
        let mut stack = PacketStack::parse(&frame).unwrap();
        let udp_layer = stack.find(LayerKind::Udp).unwrap();
        let ip_layer = stack.find(LayerKind::Ipv4).unwrap();
        stack.checksum(udp_layer, 0).unwrap();

        // rewrite the source address: the old UDP checksum is stale
        let ip_offset = stack.layers()[ip_layer].offset;
        stack
            .cursor_mut()
            .set_u32(ip_offset + 12, u32::from(Ipv4Addr::new(10, 9, 8, 7)))
            .unwrap();
        assert!(!stack.verify_checksum(udp_layer).unwrap());

        // recomputing picks up the current addresses
        stack.checksum(udp_layer, 0).unwrap();
        assert!(stack.verify_checksum(udp_layer).unwrap());
        assert!(stack.verify_checksum(ip_layer).unwrap());
    }
}
