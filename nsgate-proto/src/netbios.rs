//! NetBIOS name service encodings from RFC 1001/1002.

use nsgate_wire::ethernet::Mac;
use std::fmt::Display;

/// A NetBIOS name is exactly 16 raw bytes before encoding.
pub const NAME_LEN: usize = 16;
/// ... and 32 ASCII bytes after: one character per nibble, 'A' through 'P'.
pub const ENCODED_LEN: usize = 32;

pub const PORT: u16 = 137;

#[derive(Debug, PartialEq, Eq)]
pub enum NetbiosError {
    RawNameLength(usize),
    EncodedNameLength(usize),
    EncodedCharacter(u8),
    StatusLength(usize),
}

impl Display for NetbiosError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RawNameLength(len) => write!(f, "raw name of {len} bytes, expected at most 16"),
            Self::EncodedNameLength(len) => {
                write!(f, "encoded name of {len} bytes, expected 32")
            }
            Self::EncodedCharacter(byte) => write!(f, "encoded byte {byte:#x} outside 'A'..='P'"),
            Self::StatusLength(len) => write!(f, "node status of {len} bytes cut short"),
        }
    }
}

impl std::error::Error for NetbiosError {}

/// Encodes up to 16 raw bytes (shorter names are padded with spaces) into
/// the 32 byte first-level form: each nibble maps to `'A' + nibble`.
pub fn encode_name(raw: &[u8]) -> Result<[u8; ENCODED_LEN], NetbiosError> {
    if raw.len() > NAME_LEN {
        return Err(NetbiosError::RawNameLength(raw.len()));
    }
    let mut padded = [b' '; NAME_LEN];
    padded[..raw.len()].copy_from_slice(raw);

    let mut encoded = [0u8; ENCODED_LEN];
    for (index, byte) in padded.iter().enumerate() {
        encoded[index * 2] = b'A' + (byte >> 4);
        encoded[index * 2 + 1] = b'A' + (byte & 0x0F);
    }
    Ok(encoded)
}

/// Reverses [`encode_name`]; the input must be exactly 32 bytes of 'A'..='P'.
pub fn decode_name(encoded: &[u8]) -> Result<[u8; NAME_LEN], NetbiosError> {
    if encoded.len() != ENCODED_LEN {
        return Err(NetbiosError::EncodedNameLength(encoded.len()));
    }
    let mut raw = [0u8; NAME_LEN];
    for (index, pair) in encoded.chunks_exact(2).enumerate() {
        for byte in pair {
            if !(b'A'..=b'P').contains(byte) {
                return Err(NetbiosError::EncodedCharacter(*byte));
            }
        }
        raw[index] = ((pair[0] - b'A') << 4) | (pair[1] - b'A');
    }
    Ok(raw)
}

/// One entry of a node status reply: 15 name characters, a type suffix and
/// the name flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeName {
    pub name: String,
    pub suffix: u8,
    pub flags: u16,
}

/// The structured view over NBSTAT rdata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeStatus {
    pub names: Vec<NodeName>,
    pub mac: Mac,
}

impl NodeStatus {
    /// Parses `(num_names, [name[15] + type, flags u16] x N, mac[6])`.
    pub fn parse(data: &[u8]) -> Result<Self, NetbiosError> {
        let count = *data.first().ok_or(NetbiosError::StatusLength(0))? as usize;
        let wanted = 1 + count * 18 + 6;
        if data.len() < wanted {
            return Err(NetbiosError::StatusLength(data.len()));
        }

        let mut names = Vec::with_capacity(count);
        for index in 0..count {
            let entry = &data[1 + index * 18..1 + (index + 1) * 18];
            let name = String::from_utf8_lossy(&entry[..15])
                .trim_end()
                .to_string();
            names.push(NodeName {
                name,
                suffix: entry[15],
                flags: u16::from_be_bytes([entry[16], entry[17]]),
            });
        }

        let mut mac = [0u8; 6];
        mac.copy_from_slice(&data[1 + count * 18..wanted]);
        Ok(Self {
            names,
            mac: Mac(mac),
        })
    }
}
