use crate::checksum::PseudoHeader;
use crate::cursor::{ByteCursor, Half, WireError};

pub const MIN_HEADER_LEN: usize = 20;

// Flag bits inside byte 13 of the header.
pub const FLAG_FIN: u8 = 0x01;
pub const FLAG_SYN: u8 = 0x02;
pub const FLAG_RST: u8 = 0x04;
pub const FLAG_PSH: u8 = 0x08;
pub const FLAG_ACK: u8 = 0x10;
pub const FLAG_URG: u8 = 0x20;

const DEFAULT_WINDOW: u16 = 8192;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpHeader {
    pub src_port: u16,
    pub dst_port: u16,
    pub seq: u32,
    pub ack: u32,
    pub flags: u8,
    pub window: u16,
    pub checksum: u16,
    pub urgent: u16,
    /// Options, always a multiple of 4 bytes.
    pub options: Vec<u8>,
}

impl TcpHeader {
    fn base(src_port: u16, dst_port: u16, seq: u32, ack: u32, flags: u8) -> Self {
        Self {
            src_port,
            dst_port,
            seq,
            ack,
            flags,
            window: DEFAULT_WINDOW,
            checksum: 0,
            urgent: 0,
            options: Vec::new(),
        }
    }

    pub fn syn(src_port: u16, dst_port: u16, seq: u32) -> Self {
        Self::base(src_port, dst_port, seq, 0, FLAG_SYN)
    }

    /// Second step of the handshake; acknowledges the peer's SYN.
    pub fn reply_syn_ack(&self, seq: u32) -> Self {
        Self::base(
            self.dst_port,
            self.src_port,
            seq,
            self.seq.wrapping_add(1),
            FLAG_SYN | FLAG_ACK,
        )
    }

    pub fn reply_ack(&self, seq: u32) -> Self {
        Self::base(
            self.dst_port,
            self.src_port,
            seq,
            self.seq.wrapping_add(1),
            FLAG_ACK,
        )
    }

    pub fn reply_rst(&self) -> Self {
        Self::base(
            self.dst_port,
            self.src_port,
            self.ack,
            self.seq.wrapping_add(1),
            FLAG_RST | FLAG_ACK,
        )
    }

    pub fn fin(src_port: u16, dst_port: u16, seq: u32, ack: u32) -> Self {
        Self::base(src_port, dst_port, seq, ack, FLAG_FIN | FLAG_ACK)
    }

    pub fn reply_fin_ack(&self, seq: u32) -> Self {
        Self::base(
            self.dst_port,
            self.src_port,
            seq,
            self.seq.wrapping_add(1),
            FLAG_FIN | FLAG_ACK,
        )
    }

    pub fn is_syn(&self) -> bool {
        self.flags & FLAG_SYN != 0
    }

    pub fn is_ack(&self) -> bool {
        self.flags & FLAG_ACK != 0
    }

    pub fn is_rst(&self) -> bool {
        self.flags & FLAG_RST != 0
    }

    pub fn is_fin(&self) -> bool {
        self.flags & FLAG_FIN != 0
    }

    /// Data offset times four.
    pub fn header_len(&self) -> usize {
        MIN_HEADER_LEN + self.options.len()
    }

    pub fn read(cursor: &ByteCursor, offset: usize) -> Result<Self, WireError> {
        let header_len = cursor.nibble(offset + 12, Half::High)? as usize * 4;
        if header_len < MIN_HEADER_LEN {
            return Err(WireError::Protocol {
                context: "tcp data offset",
                value: header_len as u32,
            });
        }

        Ok(Self {
            src_port: cursor.get_u16(offset)?,
            dst_port: cursor.get_u16(offset + 2)?,
            seq: cursor.get_u32(offset + 4)?,
            ack: cursor.get_u32(offset + 8)?,
            flags: cursor.get_u8(offset + 13)? & 0x3F,
            window: cursor.get_u16(offset + 14)?,
            checksum: cursor.get_u16(offset + 16)?,
            urgent: cursor.get_u16(offset + 18)?,
            options: cursor
                .get_bytes(offset + MIN_HEADER_LEN, header_len - MIN_HEADER_LEN)?
                .to_vec(),
        })
    }

    pub fn write(&self, cursor: &mut ByteCursor, offset: usize) -> Result<usize, WireError> {
        if self.options.len() % 4 != 0 {
            return Err(WireError::Protocol {
                context: "tcp options length",
                value: self.options.len() as u32,
            });
        }
        let header_len = self.header_len();
        cursor.grow(offset + header_len);
        if cursor.writer() < offset + header_len {
            cursor.set_writer(offset + header_len)?;
        }
        cursor.set_u16(offset, self.src_port)?;
        cursor.set_u16(offset + 2, self.dst_port)?;
        cursor.set_u32(offset + 4, self.seq)?;
        cursor.set_u32(offset + 8, self.ack)?;
        cursor.set_u8(offset + 12, ((header_len / 4) as u8) << 4)?;
        cursor.set_u8(offset + 13, self.flags & 0x3F)?;
        cursor.set_u16(offset + 14, self.window)?;
        cursor.set_u16(offset + 16, self.checksum)?;
        cursor.set_u16(offset + 18, self.urgent)?;
        cursor.set_bytes(offset + MIN_HEADER_LEN, &self.options)?;
        Ok(header_len)
    }
}

/// Recomputes the checksum of the segment `[offset, offset + len)` with the
/// given pseudo-header and stores it.
pub fn store_checksum(
    cursor: &mut ByteCursor,
    offset: usize,
    len: usize,
    pseudo: &PseudoHeader,
) -> Result<u16, WireError> {
    cursor.set_u16(offset + 16, 0)?;
    let mut sum = pseudo.start(len as u32);
    sum.push(cursor.get_bytes(offset, len)?);
    let value = sum.finish();
    cursor.set_u16(offset + 16, value)?;
    Ok(value)
}

pub fn verify_checksum(
    cursor: &ByteCursor,
    offset: usize,
    len: usize,
    pseudo: &PseudoHeader,
) -> Result<bool, WireError> {
    let mut sum = pseudo.start(len as u32);
    sum.push(cursor.get_bytes(offset, len)?);
    Ok(sum.finish() == 0)
}

#[cfg(test)]
mod tests {
    use super::{TcpHeader, FLAG_ACK, FLAG_FIN, FLAG_RST, FLAG_SYN};
    use crate::cursor::ByteCursor;

    #[test]
    fn should_round_trip() {
        let mut header = TcpHeader::syn(49152, 80, 1000);
        header.window = 1024;
        let mut cursor = ByteCursor::with_capacity(20);
        assert_eq!(header.write(&mut cursor, 0).unwrap(), 20);
        assert_eq!(cursor.get_u8(12).unwrap(), 0x50);
        assert_eq!(cursor.get_u8(13).unwrap(), FLAG_SYN);
        let back = TcpHeader::read(&cursor, 0).unwrap();
        assert_eq!(back, header);
    }

    #[test]
    fn should_keep_flag_bit_positions() {
        let mut cursor = ByteCursor::with_capacity(20);
        let header = TcpHeader::syn(1, 2, 0);
        header.write(&mut cursor, 0).unwrap();
        // FIN=0 SYN=1 RST=2 PSH=3 ACK=4 URG=5 inside byte 13
        assert!(cursor.bit(13, 1).unwrap());
        assert!(!cursor.bit(13, 0).unwrap());
        assert!(!cursor.bit(13, 4).unwrap());
    }

    #[test]
    fn should_build_handshake_replies() {
        let syn = TcpHeader::syn(50000, 443, 7);
        let syn_ack = syn.reply_syn_ack(90);
        assert_eq!(syn_ack.flags, FLAG_SYN | FLAG_ACK);
        assert_eq!(syn_ack.src_port, 443);
        assert_eq!(syn_ack.dst_port, 50000);
        assert_eq!(syn_ack.ack, 8);

        let ack = syn_ack.reply_ack(8);
        assert_eq!(ack.flags, FLAG_ACK);
        assert!(ack.is_ack() && !ack.is_syn());
        assert_eq!(ack.ack, 91);

        let rst = syn.reply_rst();
        assert_eq!(rst.flags, FLAG_RST | FLAG_ACK);
        assert!(rst.is_rst());
        assert_eq!(rst.ack, 8);

        let fin = TcpHeader::fin(50000, 443, 120, 91);
        let fin_ack = fin.reply_fin_ack(91);
        assert_eq!(fin_ack.flags, FLAG_FIN | FLAG_ACK);
        assert!(fin_ack.is_fin());
        assert_eq!(fin_ack.ack, 121);
    }
}
