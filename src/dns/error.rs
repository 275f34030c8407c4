use nsgate_proto::{ReaderError, WriterError};
use nsgate_wire::WireError;
use std::fmt::Display;

#[derive(Debug)]
pub enum HandleError {
    Reader(ReaderError),
    Writer(WriterError),
    Wire(WireError),
    NoQuestion,
}

impl Display for HandleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reader(inner) => write!(f, "reading request: {inner}"),
            Self::Writer(inner) => write!(f, "writing response: {inner}"),
            Self::Wire(inner) => write!(f, "framing datagram: {inner}"),
            Self::NoQuestion => write!(f, "no question in request"),
        }
    }
}

impl std::error::Error for HandleError {}

impl From<ReaderError> for HandleError {
    fn from(value: ReaderError) -> Self {
        Self::Reader(value)
    }
}

impl From<WriterError> for HandleError {
    fn from(value: WriterError) -> Self {
        Self::Writer(value)
    }
}

impl From<WireError> for HandleError {
    fn from(value: WireError) -> Self {
        Self::Wire(value)
    }
}
