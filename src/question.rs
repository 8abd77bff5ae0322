use std::io::Cursor;

use bytes::Buf;
use tracing::instrument;

use crate::wirebuf::WireBuf;
use crate::{DnsError, Name, RecordType, Wire};

#[derive(Debug, Clone)]
pub struct Question {
    pub name: Name,
    /// Raw qtype code, kept as sent so any reply parses.
    pub type_: u16,
    pub class: u16,
}

impl Question {
    pub fn new(name: Name, type_: RecordType) -> Self {
        Self {
            name,
            type_: type_ as u16,
            class: 1,
        }
    }
}

impl Wire for Question {
    #[instrument(level = "trace", skip_all)]
    fn encode(&self, buf: &mut WireBuf) -> Result<(), DnsError> {
        self.name.encode(buf)?;
        buf.write_u16(self.type_)?;
        buf.write_u16(self.class)
    }

    #[instrument(level = "trace", skip_all)]
    fn decode(bytes: &mut Cursor<&[u8]>) -> Result<Self, DnsError> {
        let name = Name::decode(bytes)?;

        if bytes.remaining() < 4 {
            return Err(DnsError::Truncated);
        }

        let type_ = bytes.get_u16();
        let class = bytes.get_u16();

        Ok(Self { name, type_, class })
    }
}
