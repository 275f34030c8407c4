use crate::cursor::{ByteCursor, WireError};
use crate::ethernet::{Mac, ETHERTYPE_IPV4};
use std::net::Ipv4Addr;

pub const SIZE: usize = 28;
pub const HARDWARE_ETHERNET: u16 = 1;
pub const OP_REQUEST: u16 = 1;
pub const OP_REPLY: u16 = 2;

/// Fixed 28 byte ARP payload for IPv4 over Ethernet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArpHeader {
    pub hardware_type: u16,
    pub protocol_type: u16,
    pub hardware_len: u8,
    pub protocol_len: u8,
    pub operation: u16,
    pub sender_mac: Mac,
    pub sender_ip: Ipv4Addr,
    pub target_mac: Mac,
    pub target_ip: Ipv4Addr,
}

impl ArpHeader {
    /// A who-has request with the conventional presets.
    pub fn request(sender_mac: Mac, sender_ip: Ipv4Addr, target_ip: Ipv4Addr) -> Self {
        Self {
            hardware_type: HARDWARE_ETHERNET,
            protocol_type: ETHERTYPE_IPV4,
            hardware_len: 6,
            protocol_len: 4,
            operation: OP_REQUEST,
            sender_mac,
            sender_ip,
            target_mac: Mac::default(),
            target_ip,
        }
    }

    /// The answer to a request, announcing this host's MAC.
    pub fn reply_to(&self, mac: Mac) -> Self {
        Self {
            operation: OP_REPLY,
            sender_mac: mac,
            sender_ip: self.target_ip,
            target_mac: self.sender_mac,
            target_ip: self.sender_ip,
            ..*self
        }
    }

    pub fn read(cursor: &ByteCursor, offset: usize) -> Result<Self, WireError> {
        let hardware_type = cursor.get_u16(offset)?;
        if hardware_type != HARDWARE_ETHERNET {
            return Err(WireError::Protocol {
                context: "arp hardware type",
                value: hardware_type as u32,
            });
        }
        let mut sender_mac = [0u8; 6];
        sender_mac.copy_from_slice(cursor.get_bytes(offset + 8, 6)?);
        let mut target_mac = [0u8; 6];
        target_mac.copy_from_slice(cursor.get_bytes(offset + 18, 6)?);
        let sender_ip = Ipv4Addr::from(cursor.get_u32(offset + 14)?);
        let target_ip = Ipv4Addr::from(cursor.get_u32(offset + 24)?);

        Ok(Self {
            hardware_type,
            protocol_type: cursor.get_u16(offset + 2)?,
            hardware_len: cursor.get_u8(offset + 4)?,
            protocol_len: cursor.get_u8(offset + 5)?,
            operation: cursor.get_u16(offset + 6)?,
            sender_mac: Mac(sender_mac),
            sender_ip,
            target_mac: Mac(target_mac),
            target_ip,
        })
    }

    pub fn write(&self, cursor: &mut ByteCursor, offset: usize) -> Result<usize, WireError> {
        cursor.grow(offset + SIZE);
        if cursor.writer() < offset + SIZE {
            cursor.set_writer(offset + SIZE)?;
        }
        cursor.set_u16(offset, self.hardware_type)?;
        cursor.set_u16(offset + 2, self.protocol_type)?;
        cursor.set_u8(offset + 4, self.hardware_len)?;
        cursor.set_u8(offset + 5, self.protocol_len)?;
        cursor.set_u16(offset + 6, self.operation)?;
        cursor.set_bytes(offset + 8, &self.sender_mac.0)?;
        cursor.set_u32(offset + 14, u32::from(self.sender_ip))?;
        cursor.set_bytes(offset + 18, &self.target_mac.0)?;
        cursor.set_u32(offset + 24, u32::from(self.target_ip))?;
        Ok(SIZE)
    }
}
