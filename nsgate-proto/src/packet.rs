use crate::error::{ReaderError, WriterError};
use crate::header::DnsHeader;
use crate::question::Question;
use crate::record::Record;
use nsgate_wire::ByteCursor;

/// Cap on every section count; real resolvers stay far below this, malformed
/// traffic does not.
pub const MAX_COUNT: usize = 40;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DnsMessage {
    pub header: DnsHeader,
    pub questions: Vec<Question>,
    pub answers: Vec<Record>,
    pub authorities: Vec<Record>,
    pub additionals: Vec<Record>,
}

impl DnsMessage {
    pub fn new(header: DnsHeader) -> Self {
        Self {
            header,
            ..Default::default()
        }
    }

    /// An empty response echoing the request's id, opcode and questions.
    pub fn response_from(request: &Self) -> Self {
        Self {
            header: DnsHeader::response_from(&request.header),
            questions: request.questions.clone(),
            ..Default::default()
        }
    }

    pub fn with_question(mut self, question: Question) -> Self {
        self.questions.push(question);
        self
    }

    pub fn with_answer(mut self, record: Record) -> Self {
        self.answers.push(record);
        self
    }

    pub fn with_answers(mut self, records: Vec<Record>) -> Self {
        self.answers.extend(records);
        self
    }

    pub fn first_question(&self) -> Option<&Question> {
        self.questions.first()
    }

    /// Targets of every CNAME in the answer section, in order.
    pub fn cnames(&self) -> Vec<&str> {
        self.answers
            .iter()
            .filter_map(|record| match record {
                Record::Cname { host, .. } => Some(host.as_str()),
                _ => None,
            })
            .collect()
    }
}

fn read_section(
    cursor: &mut ByteCursor,
    count: usize,
) -> Result<Vec<Record>, ReaderError> {
    let mut records = Vec::with_capacity(count);
    for _ in 0..count {
        records.push(Record::read(cursor)?);
    }
    Ok(records)
}

impl TryFrom<&[u8]> for DnsMessage {
    type Error = ReaderError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let mut cursor = ByteCursor::from_slice(bytes);
        let header = DnsHeader::read(&mut cursor)?;

        let question_count = cursor.read_u16()? as usize;
        let answer_count = cursor.read_u16()? as usize;
        let authority_count = cursor.read_u16()? as usize;
        let additional_count = cursor.read_u16()? as usize;
        for count in [
            question_count,
            answer_count,
            authority_count,
            additional_count,
        ] {
            if count > MAX_COUNT {
                return Err(ReaderError::TooManyRecords(count));
            }
        }

        let mut questions = Vec::with_capacity(question_count);
        for _ in 0..question_count {
            questions.push(Question::read(&mut cursor)?);
        }

        Ok(Self {
            header,
            questions,
            answers: read_section(&mut cursor, answer_count)?,
            authorities: read_section(&mut cursor, authority_count)?,
            additionals: read_section(&mut cursor, additional_count)?,
        })
    }
}

impl DnsMessage {
    /// Serialises the message; the section counts always reflect the list
    /// lengths.
    pub fn create_buffer(&self) -> Result<ByteCursor, WriterError> {
        let mut cursor = ByteCursor::with_capacity(512);
        self.header.write(&mut cursor)?;

        cursor.write_u16(self.questions.len() as u16)?;
        cursor.write_u16(self.answers.len() as u16)?;
        cursor.write_u16(self.authorities.len() as u16)?;
        cursor.write_u16(self.additionals.len() as u16)?;

        for question in &self.questions {
            question.write(&mut cursor)?;
        }
        for record in &self.answers {
            record.write(&mut cursor)?;
        }
        for record in &self.authorities {
            record.write(&mut cursor)?;
        }
        for record in &self.additionals {
            record.write(&mut cursor)?;
        }

        Ok(cursor)
    }
}

/// The transaction id of a raw message, when there is one.
pub fn transaction_id(bytes: &[u8]) -> Option<u16> {
    match bytes {
        [head, tail, ..] => Some(u16::from_be_bytes([*head, *tail])),
        _ => None,
    }
}

/// Rewrites the transaction id in place; relaying only ever touches the
/// first two bytes of an upstream reply.
pub fn set_transaction_id(bytes: &mut [u8], id: u16) {
    if bytes.len() >= 2 {
        bytes[..2].copy_from_slice(&id.to_be_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::{transaction_id, DnsMessage, MAX_COUNT};
    use crate::header::{DnsHeader, Rcode};
    use crate::question::{QueryType, Question};
    use crate::record::Record;
    use std::net::Ipv4Addr;

    #[test]
    fn should_serialize_a_query_byte_exact() {
        let message = DnsMessage::new(DnsHeader::question(0x1234))
            .with_question(Question::new("example.com", QueryType::A));
        let buffer = message.create_buffer().unwrap();
        assert_eq!(
            buffer.as_slice(),
            &[
                0x12, 0x34, 0x01, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x07,
                0x65, 0x78, 0x61, 0x6d, 0x70, 0x6c, 0x65, 0x03, 0x63, 0x6f, 0x6d, 0x00, 0x00,
                0x01, 0x00, 0x01
            ]
        );
    }

    #[test]
    fn should_round_trip_full_message() {
        let message = DnsMessage::new(DnsHeader::response(0x77))
            .with_question(Question::new("example.com", QueryType::A))
            .with_answer(Record::A {
                domain: "example.com".into(),
                addr: Ipv4Addr::new(1, 2, 3, 4),
                ttl: 120,
            })
            .with_answer(Record::Cname {
                domain: "www.example.com".into(),
                host: "example.com".into(),
                ttl: 120,
            });
        let buffer = message.create_buffer().unwrap();
        let back = DnsMessage::try_from(buffer.as_slice()).unwrap();
        assert_eq!(back, message);
        assert_eq!(back.cnames(), vec!["example.com"]);
    }

    #[test]
    fn should_write_counts_from_list_lengths() {
        let message = DnsMessage::new(DnsHeader::response(9))
            .with_question(Question::new("a.b", QueryType::A))
            .with_answers(vec![
                Record::A {
                    domain: "a.b".into(),
                    addr: Ipv4Addr::new(1, 1, 1, 1),
                    ttl: 1,
                },
                Record::A {
                    domain: "a.b".into(),
                    addr: Ipv4Addr::new(2, 2, 2, 2),
                    ttl: 1,
                },
            ]);
        let buffer = message.create_buffer().unwrap();
        assert_eq!(buffer.get_u16(4).unwrap(), 1);
        assert_eq!(buffer.get_u16(6).unwrap(), 2);
        assert_eq!(buffer.get_u16(8).unwrap(), 0);
        assert_eq!(buffer.get_u16(10).unwrap(), 0);
    }

    #[test]
    fn should_reject_oversized_section_count() {
        let message =
            DnsMessage::new(DnsHeader::question(1)).with_question(Question::new("x", QueryType::A));
        let mut bytes = message.create_buffer().unwrap().into_vec();
        bytes[6] = ((MAX_COUNT + 1) >> 8) as u8;
        bytes[7] = ((MAX_COUNT + 1) & 0xFF) as u8;
        assert!(DnsMessage::try_from(bytes.as_slice()).is_err());
    }

    #[test]
    fn should_parse_compressed_response() {
        // header, one question, one answer whose name is a pointer to the
        // question name at offset 12
        let bytes: &[u8] = &[
            0xAB, 0xCD, 0x81, 0x80, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, // header
            0x03, b'f', b'o', b'o', 0x03, b'b', b'a', b'r', 0x00, 0x00, 0x01, 0x00,
            0x01, // question
            0xC0, 0x0C, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x3C, 0x00, 0x04, 0x0A, 0x00,
            0x00, 0x01, // answer
        ];
        let message = DnsMessage::try_from(bytes).unwrap();
        assert!(message.header.response);
        assert_eq!(message.questions[0].name, "foo.bar");
        assert_eq!(
            message.answers[0],
            Record::A {
                domain: "foo.bar".into(),
                addr: Ipv4Addr::new(10, 0, 0, 1),
                ttl: 60,
            }
        );
    }

    #[test]
    fn should_echo_request_in_response() {
        let request = DnsMessage::new(DnsHeader::question(0x42))
            .with_question(Question::new("perdu.com", QueryType::A));
        let response = DnsMessage::response_from(&request);
        assert_eq!(response.header.id, 0x42);
        assert!(response.header.response);
        assert_eq!(response.header.rcode, Rcode::NoError);
        assert_eq!(response.questions, request.questions);
    }

    #[test]
    fn should_expose_transaction_id() {
        assert_eq!(transaction_id(&[0x12, 0x34, 0x00]), Some(0x1234));
        assert_eq!(transaction_id(&[0x12]), None);
        let mut bytes = vec![0xAA, 0xBB, 0x01];
        super::set_transaction_id(&mut bytes, 0x0102);
        assert_eq!(&bytes, &[0x01, 0x02, 0x01]);
    }
}
