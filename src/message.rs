use std::io::Cursor;

use tracing::instrument;

use crate::wirebuf::WireBuf;
use crate::{DnsError, Header, Question, ResourceRecord, Wire};

/// A DNS message holding the sections this crate consumes. Authority and
/// additional records are never read by the resolver, so only their counts
/// survive decoding (in the header).
#[derive(Debug, Default)]
pub struct Message {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<ResourceRecord>,
}

impl Message {
    pub fn new(header: Header) -> Self {
        Self {
            header,
            ..Default::default()
        }
    }

    pub fn add_question(&mut self, question: Question) {
        self.header.qd_count += 1;
        self.questions.push(question)
    }

    pub fn add_answer(&mut self, answer: ResourceRecord) {
        self.header.an_count += 1;
        self.answers.push(answer)
    }
}

impl Wire for Message {
    #[instrument(level = "debug", skip_all)]
    fn encode(&self, buf: &mut WireBuf) -> Result<(), DnsError> {
        self.header.encode(buf)?;

        for question in self.questions.iter() {
            question.encode(buf)?;
        }
        for record in self.answers.iter() {
            record.encode(buf)?;
        }

        Ok(())
    }

    /// Decodes the header, then exactly the questions and answers it
    /// counts. Anything after the answer section is left unread; counts
    /// larger than the data fail with [`DnsError::Truncated`] once the
    /// cursor runs dry.
    #[instrument(level = "debug", skip_all)]
    fn decode(bytes: &mut Cursor<&[u8]>) -> Result<Self, DnsError> {
        let header = Header::decode(bytes)?;

        let mut questions = Vec::new();
        for _ in 0..header.qd_count {
            questions.push(Question::decode(bytes)?);
        }

        let mut answers = Vec::new();
        for _ in 0..header.an_count {
            answers.push(ResourceRecord::decode(bytes)?);
        }

        Ok(Self {
            header,
            questions,
            answers,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use crate::wirebuf::WireBuf;
    use crate::{
        DnsError, Flags, Header, Message, Name, Question, RecordData, RecordType, ResourceRecord,
        SrvData, Wire,
    };

    fn encode_to_vec(message: &Message) -> Vec<u8> {
        let mut buf = WireBuf::new(512);
        message.encode(&mut buf).unwrap();
        buf.as_bytes().to_vec()
    }

    #[test]
    fn adding_sections_keeps_the_counts_in_step() {
        let mut message = Message::new(Header::new(7, Flags::default()));
        message.add_question(Question::new(Name::new("example.com"), RecordType::Srv));
        message.add_answer(ResourceRecord::new(
            Name::new("example.com"),
            RecordType::Srv,
            300,
            RecordData::Srv(SrvData {
                priority: 0,
                weight: 0,
                port: 5222,
                target: Name::new("chat.example.com"),
            }),
        ));

        assert_eq!(message.header.qd_count, 1);
        assert_eq!(message.header.an_count, 1);

        let decoded = Message::decode(&mut Cursor::new(&encode_to_vec(&message)[..])).unwrap();
        assert_eq!(decoded.header.id, 7);
        assert_eq!(decoded.questions.len(), 1);
        assert_eq!(decoded.answers.len(), 1);
    }

    #[test]
    fn decodes_a_compressed_reply_from_raw_bytes() {
        // Reply to an srv query for _xmpp-client._tcp.example.com. The
        // answer's owner name points at offset 12 and its target points
        // into the middle of the qname at offset 30.
        #[rustfmt::skip]
        let reply = [
            // header: id 0x3039, qr|rd|ra, 1 question, 1 answer
            0x30, 0x39, 0x81, 0x80, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00,
            // question
            12, b'_', b'x', b'm', b'p', b'p', b'-', b'c', b'l', b'i', b'e', b'n', b't',
            4, b'_', b't', b'c', b'p',
            7, b'e', b'x', b'a', b'm', b'p', b'l', b'e',
            3, b'c', b'o', b'm',
            0,
            0x00, 0x21, 0x00, 0x01,
            // answer: name ptr -> 12, type 33, class 1, ttl 300, rd_length 8
            0xC0, 0x0C, 0x00, 0x21, 0x00, 0x01, 0x00, 0x00, 0x01, 0x2C, 0x00, 0x08,
            // priority 5, weight 0, port 5222, target ptr -> 30
            0x00, 0x05, 0x00, 0x00, 0x14, 0x66, 0xC0, 0x1E,
        ];

        let decoded = Message::decode(&mut Cursor::new(&reply[..])).unwrap();
        assert_eq!(decoded.header.id, 0x3039);
        assert!(decoded.header.flags.qr());
        assert_eq!(
            decoded.questions[0].name.as_str(),
            "_xmpp-client._tcp.example.com"
        );

        match &decoded.answers[0].data {
            RecordData::Srv(data) => {
                assert_eq!(data.priority, 5);
                assert_eq!(data.port, 5222);
                assert_eq!(data.target.as_str(), "example.com");
            }
            other => panic!("expected srv data, got {other:?}"),
        }

        // Trailing bytes past the answer section are ignored.
        let mut padded = reply.to_vec();
        padded.extend_from_slice(&[0xFF; 5]);
        assert!(Message::decode(&mut Cursor::new(&padded[..])).is_ok());
    }

    #[test]
    fn rejects_counts_that_overrun_the_data() {
        let mut message = Message::new(Header::new(1, Flags::default()));
        message.add_question(Question::new(Name::new("example.com"), RecordType::Srv));
        // Promise two answers but encode none.
        message.header.an_count = 2;

        let err = Message::decode(&mut Cursor::new(&encode_to_vec(&message)[..])).unwrap_err();
        assert_eq!(err, DnsError::Truncated);
    }
}
