use crate::cursor::{ByteCursor, Half, WireError};
use std::net::Ipv6Addr;

pub const SIZE: usize = 40;

const DEFAULT_HOP_LIMIT: u8 = 255;

/// Fixed 40 byte IPv6 header. The next-header field carries the upper
/// protocol number; the hop limit takes over the role of the IPv4 TTL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv6Header {
    pub traffic_class: u8,
    pub flow_label: u32,
    pub payload_len: u16,
    pub next_header: u8,
    pub hop_limit: u8,
    pub src: Ipv6Addr,
    pub dst: Ipv6Addr,
}

impl Ipv6Header {
    pub fn create(next_header: u8, src: Ipv6Addr, dst: Ipv6Addr, payload_len: usize) -> Self {
        Self {
            traffic_class: 0,
            flow_label: 0,
            payload_len: payload_len as u16,
            next_header,
            hop_limit: DEFAULT_HOP_LIMIT,
            src,
            dst,
        }
    }

    pub fn read(cursor: &ByteCursor, offset: usize) -> Result<Self, WireError> {
        let version = cursor.nibble(offset, Half::High)?;
        if version != 6 {
            return Err(WireError::Protocol {
                context: "ip version",
                value: version as u32,
            });
        }
        let head = cursor.get_u32(offset)?;
        let mut src = [0u8; 16];
        src.copy_from_slice(cursor.get_bytes(offset + 8, 16)?);
        let mut dst = [0u8; 16];
        dst.copy_from_slice(cursor.get_bytes(offset + 24, 16)?);

        Ok(Self {
            traffic_class: ((head >> 20) & 0xFF) as u8,
            flow_label: head & 0x000F_FFFF,
            payload_len: cursor.get_u16(offset + 4)?,
            next_header: cursor.get_u8(offset + 6)?,
            hop_limit: cursor.get_u8(offset + 7)?,
            src: Ipv6Addr::from(src),
            dst: Ipv6Addr::from(dst),
        })
    }

    pub fn write(&self, cursor: &mut ByteCursor, offset: usize) -> Result<usize, WireError> {
        cursor.grow(offset + SIZE);
        if cursor.writer() < offset + SIZE {
            cursor.set_writer(offset + SIZE)?;
        }
        let head = (6u32 << 28) | ((self.traffic_class as u32) << 20) | self.flow_label;
        cursor.set_u32(offset, head)?;
        cursor.set_u16(offset + 4, self.payload_len)?;
        cursor.set_u8(offset + 6, self.next_header)?;
        cursor.set_u8(offset + 7, self.hop_limit)?;
        cursor.set_bytes(offset + 8, &self.src.octets())?;
        cursor.set_bytes(offset + 24, &self.dst.octets())?;
        Ok(SIZE)
    }
}
