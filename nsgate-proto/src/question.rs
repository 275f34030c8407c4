use crate::error::{ReaderError, WriterError};
use crate::name;
use nsgate_wire::ByteCursor;

/// The recognised query types and their numeric codes.
#[derive(PartialEq, Eq, Debug, Clone, Hash, Copy)]
#[allow(clippy::upper_case_acronyms)]
pub enum QueryType {
    Unknown(u16),
    /// a host address
    A, // 1
    /// an authoritative name server
    NS, // 2
    /// a mail destination (obsolete)
    MD, // 3
    /// a mail forwarder (obsolete)
    MF, // 4
    /// the canonical name for an alias
    CNAME, // 5
    /// start of a zone of authority
    SOA, // 6
    /// a mailbox domain name
    MB, // 7
    /// a mail group member
    MG, // 8
    /// a mail rename domain name
    MR, // 9
    /// a null record
    NULL, // 10
    /// a well known service description
    WKS, // 11
    /// a domain name pointer
    PTR, // 12
    /// host information
    HINFO, // 13
    /// mailbox or mail list information
    MINFO, // 14
    /// mail exchange
    MX, // 15
    /// text strings
    TXT, // 16
    SIG,  // 24
    KEY,  // 25
    AAAA, // 28
    LOC,  // 29
    NXT,  // 30
    /// NetBIOS general name service (RFC 1002)
    NB, // 32
    /// NetBIOS node status (RFC 1002)
    NBSTAT, // 33
    OPT,   // 41
    HTTPS, // 65
    TKEY,  // 249
    TSIG,  // 250
}

impl QueryType {
    pub fn to_num(self) -> u16 {
        match self {
            QueryType::Unknown(x) => x,
            QueryType::A => 1,
            QueryType::NS => 2,
            QueryType::MD => 3,
            QueryType::MF => 4,
            QueryType::CNAME => 5,
            QueryType::SOA => 6,
            QueryType::MB => 7,
            QueryType::MG => 8,
            QueryType::MR => 9,
            QueryType::NULL => 10,
            QueryType::WKS => 11,
            QueryType::PTR => 12,
            QueryType::HINFO => 13,
            QueryType::MINFO => 14,
            QueryType::MX => 15,
            QueryType::TXT => 16,
            QueryType::SIG => 24,
            QueryType::KEY => 25,
            QueryType::AAAA => 28,
            QueryType::LOC => 29,
            QueryType::NXT => 30,
            QueryType::NB => 32,
            QueryType::NBSTAT => 33,
            QueryType::OPT => 41,
            QueryType::HTTPS => 65,
            QueryType::TKEY => 249,
            QueryType::TSIG => 250,
        }
    }

    pub fn from_num(num: u16) -> QueryType {
        match num {
            1 => QueryType::A,
            2 => QueryType::NS,
            3 => QueryType::MD,
            4 => QueryType::MF,
            5 => QueryType::CNAME,
            6 => QueryType::SOA,
            7 => QueryType::MB,
            8 => QueryType::MG,
            9 => QueryType::MR,
            10 => QueryType::NULL,
            11 => QueryType::WKS,
            12 => QueryType::PTR,
            13 => QueryType::HINFO,
            14 => QueryType::MINFO,
            15 => QueryType::MX,
            16 => QueryType::TXT,
            24 => QueryType::SIG,
            25 => QueryType::KEY,
            28 => QueryType::AAAA,
            29 => QueryType::LOC,
            30 => QueryType::NXT,
            32 => QueryType::NB,
            33 => QueryType::NBSTAT,
            41 => QueryType::OPT,
            65 => QueryType::HTTPS,
            249 => QueryType::TKEY,
            250 => QueryType::TSIG,
            _ => QueryType::Unknown(num),
        }
    }
}

/// CLASS fields appearing in questions and resource records.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum QueryClass {
    /// IN - the Internet
    Internet, // 1
    /// CS - the CSNET class (obsolete)
    Csnet, // 2
    /// CH - the CHAOS class
    Chaos, // 3
    /// HS - Hesiod
    Hesiod, // 4
    Unknown(u16),
}

impl Default for QueryClass {
    fn default() -> Self {
        Self::Internet
    }
}

impl QueryClass {
    pub fn to_num(self) -> u16 {
        match self {
            Self::Internet => 1,
            Self::Csnet => 2,
            Self::Chaos => 3,
            Self::Hesiod => 4,
            Self::Unknown(x) => x,
        }
    }

    pub fn from_num(value: u16) -> Self {
        match value {
            1 => Self::Internet,
            2 => Self::Csnet,
            3 => Self::Chaos,
            4 => Self::Hesiod,
            other => Self::Unknown(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub name: String,
    pub qtype: QueryType,
    pub qclass: QueryClass,
}

impl Question {
    pub fn new<N: Into<String>>(name: N, qtype: QueryType) -> Self {
        Self {
            name: name.into(),
            qtype,
            qclass: QueryClass::default(),
        }
    }

    pub fn read(cursor: &mut ByteCursor) -> Result<Self, ReaderError> {
        let name = name::read_name(cursor)?;
        let qtype = QueryType::from_num(cursor.read_u16()?);
        let qclass = QueryClass::from_num(cursor.read_u16()?);

        Ok(Self {
            name,
            qtype,
            qclass,
        })
    }

    pub fn write(&self, cursor: &mut ByteCursor) -> Result<(), WriterError> {
        name::write_name(cursor, &self.name)?;
        cursor.write_u16(self.qtype.to_num())?;
        cursor.write_u16(self.qclass.to_num())?;
        Ok(())
    }
}
