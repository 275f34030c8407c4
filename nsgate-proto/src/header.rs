use crate::error::{ReaderError, WriterError};
use nsgate_wire::ByteCursor;

/// Response code, the low four bits of the flags word.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Rcode {
    /// No error condition
    NoError,
    /// Format error - The name server was unable to interpret the query.
    FormatError,
    /// Server failure - The name server was unable to process this query.
    ServerFailure,
    /// Name Error - the domain name referenced in the query does not exist.
    /// Previously named NXDOMAIN
    NameError,
    /// Not Implemented - The name server does not support this kind of query.
    NotImplemented,
    /// Refused - The name server refuses to perform the operation for policy
    /// reasons.
    Refused,
    /// Anything else. Carried as 0xFF internally; on the wire only the low
    /// four bits survive.
    Unknown,
}

impl Rcode {
    pub fn from_num(value: u8) -> Self {
        match value {
            0 => Self::NoError,
            1 => Self::FormatError,
            2 => Self::ServerFailure,
            3 => Self::NameError,
            4 => Self::NotImplemented,
            5 => Self::Refused,
            _ => Self::Unknown,
        }
    }

    pub fn to_num(self) -> u8 {
        match self {
            Self::NoError => 0,
            Self::FormatError => 1,
            Self::ServerFailure => 2,
            Self::NameError => 3,
            Self::NotImplemented => 4,
            Self::Refused => 5,
            Self::Unknown => 0xFF,
        }
    }
}

/// The fixed part of the 12 byte message header: everything except the four
/// section counts, which are derived from the section lists when writing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DnsHeader {
    /// A 16 bit identifier assigned by the program that generates the query;
    /// copied into the reply so the requester can match them up.
    pub id: u16, // 16 bits

    /// RD Recursion Desired - set in a query and copied into the response.
    pub recursion_desired: bool, // 1 bit
    /// TC TrunCation - the message was cut to fit the transport.
    pub truncated_message: bool, // 1 bit
    /// AA Authoritative Answer - the responding server is an authority for
    /// the queried name.
    pub authoritative_answer: bool, // 1 bit
    /// OPCODE - kind of query: 0 standard, 1 inverse, 2 status.
    pub opcode: u8, // 4 bits
    /// QR - query (0) or response (1).
    pub response: bool, // 1 bit

    /// RCODE - set as part of responses.
    pub rcode: Rcode, // 4 bits
    pub checking_disabled: bool, // 1 bit
    pub authed_data: bool,       // 1 bit
    /// Z Reserved for future use. Must be zero.
    pub z: bool, // 1 bit
    /// RA Recursion Available - set in a response when the server recurses.
    pub recursion_available: bool, // 1 bit
}

impl Default for DnsHeader {
    fn default() -> Self {
        Self {
            id: 0,

            recursion_desired: false,
            truncated_message: false,
            authoritative_answer: false,
            opcode: 0,
            response: false,

            rcode: Rcode::NoError,
            checking_disabled: false,
            authed_data: false,
            z: false,
            recursion_available: false,
        }
    }
}

impl DnsHeader {
    pub fn question(id: u16) -> Self {
        Self {
            id,
            recursion_desired: true,
            ..Default::default()
        }
    }

    pub fn response(id: u16) -> Self {
        Self {
            id,
            response: true,
            ..Default::default()
        }
    }

    pub fn response_from(request: &Self) -> Self {
        Self {
            id: request.id,
            recursion_desired: request.recursion_desired,
            truncated_message: false,
            authoritative_answer: false,
            opcode: request.opcode,
            response: true,
            rcode: Rcode::NoError,
            checking_disabled: false,
            authed_data: false,
            z: false,
            recursion_available: false,
        }
    }

    pub fn with_rcode(mut self, value: Rcode) -> Self {
        self.rcode = value;
        self
    }

    /// Reads the first 4 bytes.
    pub fn read(cursor: &mut ByteCursor) -> Result<Self, ReaderError> {
        let id = cursor.read_u16()?;
        let head = cursor.read_u8()?;
        let tail = cursor.read_u8()?;

        Ok(Self {
            id,
            recursion_desired: (head & (1 << 0)) > 0,
            truncated_message: (head & (1 << 1)) > 0,
            authoritative_answer: (head & (1 << 2)) > 0,
            opcode: (head >> 3) & 0x0F,
            response: (head & (1 << 7)) > 0,
            rcode: Rcode::from_num(tail & 0x0F),
            checking_disabled: (tail & (1 << 4)) > 0,
            authed_data: (tail & (1 << 5)) > 0,
            z: (tail & (1 << 6)) > 0,
            recursion_available: (tail & (1 << 7)) > 0,
        })
    }

    pub fn write(&self, cursor: &mut ByteCursor) -> Result<(), WriterError> {
        cursor.write_u16(self.id)?;

        cursor.write_u8(
            (self.recursion_desired as u8)
                | ((self.truncated_message as u8) << 1)
                | ((self.authoritative_answer as u8) << 2)
                | (self.opcode << 3)
                | ((self.response as u8) << 7),
        )?;

        cursor.write_u8(
            (self.rcode.to_num() & 0x0F)
                | ((self.checking_disabled as u8) << 4)
                | ((self.authed_data as u8) << 5)
                | ((self.z as u8) << 6)
                | ((self.recursion_available as u8) << 7),
        )?;

        Ok(())
    }
}
