pub mod error;
pub mod header;
pub mod name;
pub mod netbios;
pub mod packet;
pub mod question;
pub mod record;

pub use error::{ReaderError, WriterError};
pub use header::{DnsHeader, Rcode};
pub use packet::{set_transaction_id, transaction_id, DnsMessage};
pub use question::{QueryClass, QueryType, Question};
pub use record::Record;
