use crate::cursor::{ByteCursor, WireError};
use crate::ethernet::Mac;
use std::net::Ipv4Addr;

pub const SERVER_PORT: u16 = 67;
pub const CLIENT_PORT: u16 = 68;

/// Length of the fixed head, including the magic cookie.
pub const FIXED_LEN: usize = 240;
pub const MAGIC_COOKIE: u32 = 0x6382_5363;

pub const OP_REQUEST: u8 = 1;
pub const OP_REPLY: u8 = 2;

pub const OPT_PAD: u8 = 0;
pub const OPT_SUBNET_MASK: u8 = 1;
pub const OPT_HOSTNAME: u8 = 12;
pub const OPT_MESSAGE_TYPE: u8 = 53;
pub const OPT_SERVER_ID: u8 = 54;
pub const OPT_END: u8 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DhcpMessageType {
    Discover = 1,
    Offer = 2,
    Request = 3,
    Decline = 4,
    Ack = 5,
    Nak = 6,
    Release = 7,
    Inform = 8,
}

impl DhcpMessageType {
    pub fn from_num(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Discover),
            2 => Some(Self::Offer),
            3 => Some(Self::Request),
            4 => Some(Self::Decline),
            5 => Some(Self::Ack),
            6 => Some(Self::Nak),
            7 => Some(Self::Release),
            8 => Some(Self::Inform),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DhcpOption {
    pub code: u8,
    pub data: Vec<u8>,
}

/// BOOTP-framed DHCP message: 240 byte fixed head (ending in the magic
/// cookie), then TLV options terminated by 0xFF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DhcpMessage {
    pub op: u8,
    pub htype: u8,
    pub hlen: u8,
    pub hops: u8,
    pub xid: u32,
    pub secs: u16,
    pub flags: u16,
    pub ciaddr: Ipv4Addr,
    pub yiaddr: Ipv4Addr,
    pub siaddr: Ipv4Addr,
    pub giaddr: Ipv4Addr,
    /// Client hardware address; the 16 byte field carries 6 useful bytes.
    pub chaddr: Mac,
    pub sname: String,
    pub file: String,
    pub options: Vec<DhcpOption>,
}

impl DhcpMessage {
    fn blank(op: u8, xid: u32) -> Self {
        Self {
            op,
            htype: 1,
            hlen: 6,
            hops: 0,
            xid,
            secs: 0,
            flags: 0,
            ciaddr: Ipv4Addr::UNSPECIFIED,
            yiaddr: Ipv4Addr::UNSPECIFIED,
            siaddr: Ipv4Addr::UNSPECIFIED,
            giaddr: Ipv4Addr::UNSPECIFIED,
            chaddr: Mac::default(),
            sname: String::new(),
            file: String::new(),
            options: Vec::new(),
        }
    }

    /// A broadcast address request from a client.
    pub fn request(client_mac: Mac, xid: u32) -> Self {
        let mut message = Self::blank(OP_REQUEST, xid);
        message.flags = 0x8000;
        message.chaddr = client_mac;
        message.options.push(DhcpOption {
            code: OPT_MESSAGE_TYPE,
            data: vec![DhcpMessageType::Request as u8],
        });
        message
    }

    /// The server's positive answer to `request`, assigning `your_ip`.
    pub fn reply(request: &Self, your_ip: Ipv4Addr, server_ip: Ipv4Addr, mask: Ipv4Addr) -> Self {
        let mut message = Self::blank(OP_REPLY, request.xid);
        message.flags = request.flags;
        message.yiaddr = your_ip;
        message.siaddr = server_ip;
        message.chaddr = request.chaddr;
        message.options.push(DhcpOption {
            code: OPT_MESSAGE_TYPE,
            data: vec![DhcpMessageType::Ack as u8],
        });
        message.options.push(DhcpOption {
            code: OPT_SUBNET_MASK,
            data: mask.octets().to_vec(),
        });
        message.options.push(DhcpOption {
            code: OPT_SERVER_ID,
            data: server_ip.octets().to_vec(),
        });
        message
    }

    /// The server's refusal.
    pub fn nak(request: &Self, server_ip: Ipv4Addr) -> Self {
        let mut message = Self::blank(OP_REPLY, request.xid);
        message.flags = request.flags;
        message.chaddr = request.chaddr;
        message.options.push(DhcpOption {
            code: OPT_MESSAGE_TYPE,
            data: vec![DhcpMessageType::Nak as u8],
        });
        message.options.push(DhcpOption {
            code: OPT_SERVER_ID,
            data: server_ip.octets().to_vec(),
        });
        message
    }

    pub fn option(&self, code: u8) -> Option<&[u8]> {
        self.options
            .iter()
            .find(|option| option.code == code)
            .map(|option| option.data.as_slice())
    }

    /// Option 53.
    pub fn message_type(&self) -> Option<DhcpMessageType> {
        self.option(OPT_MESSAGE_TYPE)
            .and_then(|data| data.first())
            .and_then(|value| DhcpMessageType::from_num(*value))
    }

    /// Option 12.
    pub fn hostname(&self) -> Option<String> {
        self.option(OPT_HOSTNAME)
            .and_then(|data| std::str::from_utf8(data).ok())
            .map(str::to_owned)
    }

    pub fn read(cursor: &ByteCursor, offset: usize) -> Result<Self, WireError> {
        let cookie = cursor.get_u32(offset + 236)?;
        if cookie != MAGIC_COOKIE {
            return Err(WireError::Protocol {
                context: "dhcp magic cookie",
                value: cookie,
            });
        }
        let mut chaddr = [0u8; 6];
        chaddr.copy_from_slice(cursor.get_bytes(offset + 28, 6)?);

        let mut options = Vec::new();
        let mut position = offset + FIXED_LEN;
        loop {
            let code = match cursor.get_u8(position) {
                Ok(code) => code,
                // options may simply run to the end of the datagram
                Err(_) => break,
            };
            position += 1;
            match code {
                OPT_END => break,
                OPT_PAD => continue,
                _ => {
                    let len = cursor.get_u8(position)? as usize;
                    position += 1;
                    options.push(DhcpOption {
                        code,
                        data: cursor.get_bytes(position, len)?.to_vec(),
                    });
                    position += len;
                }
            }
        }

        Ok(Self {
            op: cursor.get_u8(offset)?,
            htype: cursor.get_u8(offset + 1)?,
            hlen: cursor.get_u8(offset + 2)?,
            hops: cursor.get_u8(offset + 3)?,
            xid: cursor.get_u32(offset + 4)?,
            secs: cursor.get_u16(offset + 8)?,
            flags: cursor.get_u16(offset + 10)?,
            ciaddr: Ipv4Addr::from(cursor.get_u32(offset + 12)?),
            yiaddr: Ipv4Addr::from(cursor.get_u32(offset + 16)?),
            siaddr: Ipv4Addr::from(cursor.get_u32(offset + 20)?),
            giaddr: Ipv4Addr::from(cursor.get_u32(offset + 24)?),
            chaddr: Mac(chaddr),
            sname: cursor.get_padded_str(offset + 44, 64)?,
            file: cursor.get_padded_str(offset + 108, 128)?,
            options,
        })
    }

    /// Writes head and options and returns the total length.
    pub fn write(&self, cursor: &mut ByteCursor, offset: usize) -> Result<usize, WireError> {
        cursor.grow(offset + FIXED_LEN);
        if cursor.writer() < offset + FIXED_LEN {
            cursor.set_writer(offset + FIXED_LEN)?;
        }
        cursor.set_u8(offset, self.op)?;
        cursor.set_u8(offset + 1, self.htype)?;
        cursor.set_u8(offset + 2, self.hlen)?;
        cursor.set_u8(offset + 3, self.hops)?;
        cursor.set_u32(offset + 4, self.xid)?;
        cursor.set_u16(offset + 8, self.secs)?;
        cursor.set_u16(offset + 10, self.flags)?;
        cursor.set_u32(offset + 12, u32::from(self.ciaddr))?;
        cursor.set_u32(offset + 16, u32::from(self.yiaddr))?;
        cursor.set_u32(offset + 20, u32::from(self.siaddr))?;
        cursor.set_u32(offset + 24, u32::from(self.giaddr))?;
        cursor.set_bytes(offset + 28, &self.chaddr.0)?;
        // remaining 10 bytes of the 16 byte chaddr field
        cursor.set_bytes(offset + 34, &[0u8; 10])?;
        cursor.set_padded_str(offset + 44, 64, &self.sname)?;
        cursor.set_padded_str(offset + 108, 128, &self.file)?;
        cursor.set_u32(offset + 236, MAGIC_COOKIE)?;

        cursor.set_writer(offset + FIXED_LEN)?;
        for option in &self.options {
            cursor.write_u8(option.code)?;
            cursor.write_u8(option.data.len() as u8)?;
            cursor.write_bytes(&option.data)?;
        }
        cursor.write_u8(OPT_END)?;
        Ok(cursor.writer() - offset)
    }
}
