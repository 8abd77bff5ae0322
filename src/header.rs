use std::io::Cursor;

use bitfield::bitfield;
use bytes::Buf;
use tracing::{instrument, warn};

use crate::wirebuf::WireBuf;
use crate::{DnsError, Wire};

bitfield! {
    #[derive(Clone, Copy, Default)]
    pub struct Flags(u16);
    impl Debug;
    u8;
    // query or response
    pub qr, set_qr: 15;
    // query kind
    pub opcode, set_opcode: 14, 11;
    // authoritative answer
    pub aa, set_aa: 10;
    // truncation
    pub tc, set_tc: 9;
    // recursion desired
    pub rd, set_rd: 8;
    // recursion available
    pub ra, set_ra: 7;
    // reserved, must be zero
    pub z, set_z: 6, 4;
    // response code
    pub rcode, set_rcode: 3, 0;
}

impl Wire for Flags {
    #[instrument(level = "trace", skip_all)]
    fn encode(&self, buf: &mut WireBuf) -> Result<(), DnsError> {
        buf.write_u16(self.0)
    }

    #[instrument(level = "trace", skip_all)]
    fn decode(bytes: &mut Cursor<&[u8]>) -> Result<Self, DnsError> {
        if bytes.remaining() < 2 {
            return Err(DnsError::Truncated);
        }

        Ok(Self(bytes.get_u16()))
    }
}

#[derive(Debug, Default)]
pub struct Header {
    pub id: u16,
    pub flags: Flags,
    pub qd_count: u16,
    pub an_count: u16,
    pub ns_count: u16,
    pub ar_count: u16,
}

impl Header {
    pub fn new(id: u16, flags: Flags) -> Self {
        Self {
            id,
            flags,
            ..Default::default()
        }
    }
}

impl Wire for Header {
    #[instrument(level = "trace", skip_all)]
    fn encode(&self, buf: &mut WireBuf) -> Result<(), DnsError> {
        buf.write_u16(self.id)?;
        self.flags.encode(buf)?;
        buf.write_u16(self.qd_count)?;
        buf.write_u16(self.an_count)?;
        buf.write_u16(self.ns_count)?;
        buf.write_u16(self.ar_count)
    }

    #[instrument(level = "trace", skip_all)]
    fn decode(bytes: &mut Cursor<&[u8]>) -> Result<Self, DnsError> {
        if bytes.remaining() < 12 {
            warn!("insufficient remaining bytes");
            return Err(DnsError::Truncated);
        }

        let id = bytes.get_u16();
        let flags = Flags::decode(bytes)?;
        let qd_count = bytes.get_u16();
        let an_count = bytes.get_u16();
        let ns_count = bytes.get_u16();
        let ar_count = bytes.get_u16();

        Ok(Self {
            id,
            flags,
            qd_count,
            an_count,
            ns_count,
            ar_count,
        })
    }
}
