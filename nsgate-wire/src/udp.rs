use crate::checksum::PseudoHeader;
use crate::cursor::{ByteCursor, WireError};
use crate::stack::{LayerKind, PacketStack};
use crate::{ipv4, ipv6};
use std::net::{IpAddr, SocketAddr};

pub const HEADER_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UdpHeader {
    pub src_port: u16,
    pub dst_port: u16,
    pub length: u16,
    pub checksum: u16,
}

impl UdpHeader {
    pub fn new(src_port: u16, dst_port: u16, payload_len: usize) -> Self {
        Self {
            src_port,
            dst_port,
            length: (HEADER_LEN + payload_len) as u16,
            checksum: 0,
        }
    }

    pub fn read(cursor: &ByteCursor, offset: usize) -> Result<Self, WireError> {
        Ok(Self {
            src_port: cursor.get_u16(offset)?,
            dst_port: cursor.get_u16(offset + 2)?,
            length: cursor.get_u16(offset + 4)?,
            checksum: cursor.get_u16(offset + 6)?,
        })
    }

    pub fn write(&self, cursor: &mut ByteCursor, offset: usize) -> Result<usize, WireError> {
        cursor.grow(offset + HEADER_LEN);
        if cursor.writer() < offset + HEADER_LEN {
            cursor.set_writer(offset + HEADER_LEN)?;
        }
        cursor.set_u16(offset, self.src_port)?;
        cursor.set_u16(offset + 2, self.dst_port)?;
        cursor.set_u16(offset + 4, self.length)?;
        cursor.set_u16(offset + 6, self.checksum)?;
        Ok(HEADER_LEN)
    }
}

/// Recomputes the datagram checksum and stores it. A computed value of zero
/// goes on the wire as `0xFFFF` (RFC 768: zero means "no checksum").
pub fn store_checksum(
    cursor: &mut ByteCursor,
    offset: usize,
    pseudo: &PseudoHeader,
) -> Result<u16, WireError> {
    let len = cursor.get_u16(offset + 4)? as usize;
    cursor.set_u16(offset + 6, 0)?;
    let mut sum = pseudo.start(len as u32);
    sum.push(cursor.get_bytes(offset, len)?);
    let value = match sum.finish() {
        0 => 0xFFFF,
        value => value,
    };
    cursor.set_u16(offset + 6, value)?;
    Ok(value)
}

pub fn verify_checksum(
    cursor: &ByteCursor,
    offset: usize,
    pseudo: &PseudoHeader,
) -> Result<bool, WireError> {
    let len = cursor.get_u16(offset + 4)? as usize;
    let mut sum = pseudo.start(len as u32);
    sum.push(cursor.get_bytes(offset, len)?);
    // all-ones sums to zero as well
    Ok(sum.finish() == 0)
}

/// A UDP datagram framed by a synthesised IP header, used by the listener to
/// hand the OS-reported addresses to the session layer as a regular packet.
#[derive(Debug)]
pub struct UdpDatagram {
    stack: PacketStack,
}

impl UdpDatagram {
    pub fn synthesize(
        src: SocketAddr,
        dst: SocketAddr,
        payload: &[u8],
    ) -> Result<Self, WireError> {
        let mut cursor = ByteCursor::with_capacity(0);
        let udp_offset = match (src.ip(), dst.ip()) {
            (IpAddr::V4(src_ip), IpAddr::V4(dst_ip)) => {
                let ip = ipv4::Ipv4Header::create(
                    ipv4::PROTO_UDP,
                    src_ip,
                    dst_ip,
                    HEADER_LEN + payload.len(),
                );
                ip.write(&mut cursor, 0)?
            }
            (IpAddr::V6(src_ip), IpAddr::V6(dst_ip)) => {
                let ip = ipv6::Ipv6Header::create(
                    ipv4::PROTO_UDP,
                    src_ip,
                    dst_ip,
                    HEADER_LEN + payload.len(),
                );
                ip.write(&mut cursor, 0)?
            }
            _ => {
                return Err(WireError::Protocol {
                    context: "mixed address families",
                    value: 0,
                })
            }
        };
        let header = UdpHeader::new(src.port(), dst.port(), payload.len());
        header.write(&mut cursor, udp_offset)?;
        cursor.set_writer(udp_offset + HEADER_LEN)?;
        cursor.write_bytes(payload)?;

        let mut stack = PacketStack::parse_ip(cursor.as_slice())?;
        let udp_layer = stack
            .find(LayerKind::Udp)
            .ok_or(WireError::Protocol {
                context: "synthesized datagram",
                value: 0,
            })?;
        stack.checksum(udp_layer, 0)?;
        Ok(Self { stack })
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, WireError> {
        let stack = PacketStack::parse_ip(bytes)?;
        if stack.find(LayerKind::Udp).is_none() {
            return Err(WireError::Protocol {
                context: "expected udp datagram",
                value: 0,
            });
        }
        Ok(Self { stack })
    }

    fn udp_header(&self) -> Result<UdpHeader, WireError> {
        let index = self.stack.find(LayerKind::Udp).ok_or(WireError::Protocol {
            context: "udp layer",
            value: 0,
        })?;
        let offset = self.stack.layers()[index].offset;
        UdpHeader::read(self.stack.cursor(), offset)
    }

    pub fn src(&self) -> Result<SocketAddr, WireError> {
        let header = self.udp_header()?;
        Ok(SocketAddr::new(self.stack.src_ip()?, header.src_port))
    }

    pub fn dst(&self) -> Result<SocketAddr, WireError> {
        let header = self.udp_header()?;
        Ok(SocketAddr::new(self.stack.dst_ip()?, header.dst_port))
    }

    pub fn payload(&self) -> &[u8] {
        self.stack.payload().unwrap_or(&[])
    }

    pub fn stack(&self) -> &PacketStack {
        &self.stack
    }
}
