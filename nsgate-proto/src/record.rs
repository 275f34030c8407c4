use crate::error::{ReaderError, WriterError};
use crate::name;
use crate::question::QueryType;
use nsgate_wire::ByteCursor;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Upper bound for rdata; anything bigger is treated as malformed traffic.
pub const MAX_RDATA_LEN: u16 = 2048;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    A {
        domain: String,
        addr: Ipv4Addr,
        ttl: u32,
    },
    Aaaa {
        domain: String,
        addr: Ipv6Addr,
        ttl: u32,
    },
    Cname {
        domain: String,
        host: String,
        ttl: u32,
    },
    Ptr {
        domain: String,
        host: String,
        ttl: u32,
    },
    /// NetBIOS general name service rdata, retained opaquely (type 32).
    NetBios {
        domain: String,
        ttl: u32,
        data: Vec<u8>,
    },
    /// NetBIOS node status rdata (type 33); see [`crate::netbios`] for the
    /// structured view.
    NetBiosStat {
        domain: String,
        ttl: u32,
        data: Vec<u8>,
    },
    Unknown {
        domain: String,
        qtype: u16,
        ttl: u32,
        data: Vec<u8>,
    },
}

impl Record {
    pub fn domain(&self) -> &str {
        match self {
            Self::A { domain, .. }
            | Self::Aaaa { domain, .. }
            | Self::Cname { domain, .. }
            | Self::Ptr { domain, .. }
            | Self::NetBios { domain, .. }
            | Self::NetBiosStat { domain, .. }
            | Self::Unknown { domain, .. } => domain,
        }
    }

    pub fn ttl(&self) -> u32 {
        match self {
            Self::A { ttl, .. }
            | Self::Aaaa { ttl, .. }
            | Self::Cname { ttl, .. }
            | Self::Ptr { ttl, .. }
            | Self::NetBios { ttl, .. }
            | Self::NetBiosStat { ttl, .. }
            | Self::Unknown { ttl, .. } => *ttl,
        }
    }

    pub fn read(cursor: &mut ByteCursor) -> Result<Self, ReaderError> {
        // NAME the record pertains to; always a fresh value, the buffer is
        // never shared with the question's name.
        let domain = name::read_name(cursor)?;

        let qtype_num = cursor.read_u16()?;
        let qtype = QueryType::from_num(qtype_num);
        let _qclass = cursor.read_u16()?;
        let ttl = cursor.read_u32()?;

        let data_len = cursor.read_u16()?;
        if data_len > MAX_RDATA_LEN {
            return Err(ReaderError::RecordLength(data_len));
        }

        match qtype {
            QueryType::A => {
                let addr = Ipv4Addr::from(cursor.read_u32()?);
                Ok(Record::A { domain, addr, ttl })
            }
            QueryType::AAAA => {
                let mut raw = [0u8; 16];
                raw.copy_from_slice(&cursor.read_bytes(16)?);
                let addr = Ipv6Addr::from(raw);
                Ok(Record::Aaaa { domain, addr, ttl })
            }
            QueryType::CNAME => {
                let host = name::read_name(cursor)?;
                Ok(Record::Cname { domain, host, ttl })
            }
            QueryType::PTR => {
                let host = name::read_name(cursor)?;
                Ok(Record::Ptr { domain, host, ttl })
            }
            QueryType::NB => Ok(Record::NetBios {
                domain,
                ttl,
                data: cursor.read_bytes(data_len as usize)?,
            }),
            QueryType::NBSTAT => Ok(Record::NetBiosStat {
                domain,
                ttl,
                data: cursor.read_bytes(data_len as usize)?,
            }),
            _ => Ok(Record::Unknown {
                domain,
                qtype: qtype_num,
                ttl,
                data: cursor.read_bytes(data_len as usize)?,
            }),
        }
    }

    pub fn write(&self, cursor: &mut ByteCursor) -> Result<usize, WriterError> {
        let start = cursor.writer();

        match self {
            Record::A { domain, addr, ttl } => {
                name::write_name(cursor, domain)?;
                cursor.write_u16(QueryType::A.to_num())?;
                cursor.write_u16(1)?;
                cursor.write_u32(*ttl)?;
                cursor.write_u16(4)?;
                cursor.write_bytes(&addr.octets())?;
            }
            Record::Aaaa { domain, addr, ttl } => {
                name::write_name(cursor, domain)?;
                cursor.write_u16(QueryType::AAAA.to_num())?;
                cursor.write_u16(1)?;
                cursor.write_u32(*ttl)?;
                cursor.write_u16(16)?;
                cursor.write_bytes(&addr.octets())?;
            }
            Record::Cname { domain, host, ttl } => {
                name::write_name(cursor, domain)?;
                cursor.write_u16(QueryType::CNAME.to_num())?;
                cursor.write_u16(1)?;
                cursor.write_u32(*ttl)?;
                // length is known only after the name is written
                let patch = cursor.writer();
                cursor.write_u16(0)?;
                name::write_name(cursor, host)?;
                let size = cursor.writer() - (patch + 2);
                cursor.set_u16(patch, size as u16)?;
            }
            Record::Ptr { domain, host, ttl } => {
                name::write_name(cursor, domain)?;
                cursor.write_u16(QueryType::PTR.to_num())?;
                cursor.write_u16(1)?;
                cursor.write_u32(*ttl)?;
                let patch = cursor.writer();
                cursor.write_u16(0)?;
                name::write_name(cursor, host)?;
                let size = cursor.writer() - (patch + 2);
                cursor.set_u16(patch, size as u16)?;
            }
            Record::NetBios { domain, ttl, data } => {
                name::write_name(cursor, domain)?;
                cursor.write_u16(QueryType::NB.to_num())?;
                cursor.write_u16(1)?;
                cursor.write_u32(*ttl)?;
                cursor.write_u16(data.len() as u16)?;
                cursor.write_bytes(data)?;
            }
            Record::NetBiosStat { domain, ttl, data } => {
                name::write_name(cursor, domain)?;
                cursor.write_u16(QueryType::NBSTAT.to_num())?;
                cursor.write_u16(1)?;
                cursor.write_u32(*ttl)?;
                cursor.write_u16(data.len() as u16)?;
                cursor.write_bytes(data)?;
            }
            Record::Unknown {
                domain,
                qtype,
                ttl,
                data,
            } => {
                name::write_name(cursor, domain)?;
                cursor.write_u16(*qtype)?;
                cursor.write_u16(1)?;
                cursor.write_u32(*ttl)?;
                cursor.write_u16(data.len() as u16)?;
                cursor.write_bytes(data)?;
            }
        }

        Ok(cursor.writer() - start)
    }
}
