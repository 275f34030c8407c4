use crate::cursor::{ByteCursor, WireError};
use std::fmt::Display;

pub const ETHERTYPE_IPV4: u16 = 0x0800;
pub const ETHERTYPE_ARP: u16 = 0x0806;
pub const ETHERTYPE_VLAN: u16 = 0x8100;
pub const ETHERTYPE_IPV6: u16 = 0x86DD;

/// Frames shorter than this (after the 14 byte header) are padded with zeros.
pub const MIN_PAYLOAD: usize = 46;

/// Static lookup table for display purposes.
pub fn ether_type_name(value: u16) -> &'static str {
    match value {
        ETHERTYPE_IPV4 => "ipv4",
        ETHERTYPE_ARP => "arp",
        ETHERTYPE_VLAN => "vlan",
        ETHERTYPE_IPV6 => "ipv6",
        _ => "unknown",
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Mac(pub [u8; 6]);

impl Mac {
    pub const BROADCAST: Mac = Mac([0xFF; 6]);

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl Display for Mac {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

/// The 802.1Q tag injected between the source MAC and the EtherType.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VlanTag {
    pub priority: u8,
    pub drop_eligible: bool,
    pub vlan_id: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthernetHeader {
    pub dst: Mac,
    pub src: Mac,
    pub vlan: Option<VlanTag>,
    pub ether_type: u16,
}

impl EthernetHeader {
    pub fn new(dst: Mac, src: Mac, ether_type: u16) -> Self {
        Self {
            dst,
            src,
            vlan: None,
            ether_type,
        }
    }

    /// 14 bytes, or 18 when the frame carries a VLAN tag.
    pub fn len(&self) -> usize {
        if self.vlan.is_some() {
            18
        } else {
            14
        }
    }

    pub fn read(cursor: &ByteCursor, offset: usize) -> Result<Self, WireError> {
        let mut dst = [0u8; 6];
        dst.copy_from_slice(cursor.get_bytes(offset, 6)?);
        let mut src = [0u8; 6];
        src.copy_from_slice(cursor.get_bytes(offset + 6, 6)?);

        let tag = cursor.get_u16(offset + 12)?;
        let (vlan, ether_type) = if tag == ETHERTYPE_VLAN {
            let tci = cursor.get_u16(offset + 14)?;
            let vlan = VlanTag {
                priority: (tci >> 13) as u8,
                drop_eligible: tci & 0x1000 != 0,
                vlan_id: tci & 0x0FFF,
            };
            (Some(vlan), cursor.get_u16(offset + 16)?)
        } else {
            (None, tag)
        };

        Ok(Self {
            dst: Mac(dst),
            src: Mac(src),
            vlan,
            ether_type,
        })
    }

    /// Writes the header and returns its length.
    pub fn write(&self, cursor: &mut ByteCursor, offset: usize) -> Result<usize, WireError> {
        cursor.grow(offset + self.len());
        if cursor.writer() < offset + self.len() {
            cursor.set_writer(offset + self.len())?;
        }
        cursor.set_bytes(offset, &self.dst.0)?;
        cursor.set_bytes(offset + 6, &self.src.0)?;
        match self.vlan {
            Some(tag) => {
                cursor.set_u16(offset + 12, ETHERTYPE_VLAN)?;
                let tci = ((tag.priority as u16) << 13)
                    | ((tag.drop_eligible as u16) << 12)
                    | (tag.vlan_id & 0x0FFF);
                cursor.set_u16(offset + 14, tci)?;
                cursor.set_u16(offset + 16, self.ether_type)?;
            }
            None => cursor.set_u16(offset + 12, self.ether_type)?,
        }
        Ok(self.len())
    }

    /// Builds a complete frame, padding the payload to the 46 byte minimum.
    pub fn build(&self, payload: &[u8]) -> Result<ByteCursor, WireError> {
        let mut cursor = ByteCursor::with_capacity(self.len() + payload.len().max(MIN_PAYLOAD));
        let header_len = self.write(&mut cursor, 0)?;
        cursor.set_writer(header_len)?;
        cursor.write_bytes(payload)?;
        for _ in payload.len()..MIN_PAYLOAD {
            cursor.write_u8(0)?;
        }
        Ok(cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::{EthernetHeader, Mac, VlanTag, ETHERTYPE_IPV4, ETHERTYPE_IPV6};
    use crate::cursor::ByteCursor;

    fn sample_macs() -> (Mac, Mac) {
        (
            Mac([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]),
            Mac([0x66, 0x77, 0x88, 0x99, 0xAA, 0xBB]),
        )
    }

    #[test]
    fn should_round_trip_untagged_header() {
        let (dst, src) = sample_macs();
        let header = EthernetHeader::new(dst, src, ETHERTYPE_IPV4);
        let mut cursor = ByteCursor::with_capacity(14);
        assert_eq!(header.write(&mut cursor, 0).unwrap(), 14);
        assert_eq!(cursor.get_u16(12).unwrap(), 0x0800);
        let back = EthernetHeader::read(&cursor, 0).unwrap();
        assert_eq!(back, header);
    }

    #[test]
    fn should_round_trip_vlan_tagged_header() {
        let (dst, src) = sample_macs();
        let header = EthernetHeader {
            dst,
            src,
            vlan: Some(VlanTag {
                priority: 5,
                drop_eligible: false,
                vlan_id: 0x123,
            }),
            ether_type: ETHERTYPE_IPV6,
        };
        let mut cursor = ByteCursor::with_capacity(18);
        assert_eq!(header.write(&mut cursor, 0).unwrap(), 18);
        assert_eq!(cursor.get_u16(12).unwrap(), 0x8100);
        assert_eq!(cursor.get_u16(16).unwrap(), 0x86DD);
        let back = EthernetHeader::read(&cursor, 0).unwrap();
        assert_eq!(back, header);
        assert_eq!(back.len(), 18);
    }

    #[test]
    fn should_pad_short_payload_to_minimum() {
        let (dst, src) = sample_macs();
        let header = EthernetHeader::new(dst, src, ETHERTYPE_IPV4);
        let frame = header.build(&[1, 2, 3]).unwrap();
        assert_eq!(frame.as_slice().len(), 14 + 46);
        assert_eq!(&frame.as_slice()[14..17], &[1, 2, 3]);
        assert!(frame.as_slice()[17..].iter().all(|b| *b == 0));
    }

    #[test]
    fn should_format_mac() {
        let mac = Mac([0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x01]);
        assert_eq!(mac.to_string(), "de:ad:be:ef:00:01");
    }

    #[test]
    fn should_name_known_ether_types() {
        assert_eq!(super::ether_type_name(ETHERTYPE_IPV4), "ipv4");
        assert_eq!(super::ether_type_name(ETHERTYPE_IPV6), "ipv6");
        assert_eq!(super::ether_type_name(0x1234), "unknown");
    }
}
