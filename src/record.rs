use std::io::Cursor;

use bytes::Buf;
use num_traits::cast::FromPrimitive;
use tracing::{instrument, trace};

use crate::wirebuf::WireBuf;
use crate::{DnsError, Name, RecordType, Wire};

/// The rdata of an SRV record, RFC 2782.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrvData {
    pub priority: u16,
    pub weight: u16,
    pub port: u16,
    pub target: Name,
}

#[derive(Debug, Clone)]
pub enum RecordData {
    Srv(SrvData),
    /// Uninterpreted rdata of any type we do not model, exactly
    /// `rd_length` bytes.
    Other(Vec<u8>),
}

impl RecordData {
    /// Decodes the rdata for one record. `bytes` must be a cursor over the
    /// whole message so compressed names inside the rdata can be followed.
    pub fn decode(type_: u16, rd_length: u16, bytes: &mut Cursor<&[u8]>) -> Result<Self, DnsError> {
        match RecordType::from_u16(type_) {
            Some(RecordType::Srv) => {
                if bytes.remaining() < 6 {
                    return Err(DnsError::Truncated);
                }

                let priority = bytes.get_u16();
                let weight = bytes.get_u16();
                let port = bytes.get_u16();
                let target = Name::decode(bytes)?;

                Ok(Self::Srv(SrvData {
                    priority,
                    weight,
                    port,
                    target,
                }))
            }

            _ => {
                trace!(type_, "keeping rdata of unhandled type uninterpreted");
                if bytes.remaining() < rd_length as usize {
                    return Err(DnsError::Truncated);
                }
                let data = bytes.copy_to_bytes(rd_length as usize);
                Ok(Self::Other(data.to_vec()))
            }
        }
    }

    pub fn encode(&self, buf: &mut WireBuf) -> Result<(), DnsError> {
        match self {
            Self::Srv(data) => {
                buf.write_u16(data.priority)?;
                buf.write_u16(data.weight)?;
                buf.write_u16(data.port)?;
                data.target.encode(buf)
            }
            Self::Other(data) => buf.write_slice(data),
        }
    }

    /// Encoded rdata size in octets, written into the rd_length field.
    pub fn wire_len(&self) -> usize {
        match self {
            Self::Srv(data) => 6 + data.target.wire_len(),
            Self::Other(data) => data.len(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResourceRecord {
    pub name: Name,
    /// Raw rr type code, kept as sent so records of types we do not model
    /// still pass through the decoder.
    pub type_: u16,
    pub class: u16,
    pub ttl: u32,
    pub rd_length: u16,
    pub data: RecordData,
}

impl ResourceRecord {
    pub fn new(name: Name, type_: RecordType, ttl: u32, data: RecordData) -> Self {
        Self {
            name,
            type_: type_ as u16,
            class: 1,
            ttl,
            rd_length: data.wire_len() as u16,
            data,
        }
    }
}

impl Wire for ResourceRecord {
    #[instrument(level = "trace", skip_all)]
    fn encode(&self, buf: &mut WireBuf) -> Result<(), DnsError> {
        self.name.encode(buf)?;
        buf.write_u16(self.type_)?;
        buf.write_u16(self.class)?;
        buf.write_u32(self.ttl)?;
        buf.write_u16(self.rd_length)?;
        self.data.encode(buf)
    }

    #[instrument(level = "trace", skip_all)]
    fn decode(bytes: &mut Cursor<&[u8]>) -> Result<Self, DnsError> {
        let name = Name::decode(bytes)?;

        if bytes.remaining() < 10 {
            return Err(DnsError::Truncated);
        }

        let type_ = bytes.get_u16();
        let class = bytes.get_u16();
        let ttl = bytes.get_u32();
        let rd_length = bytes.get_u16();

        if bytes.remaining() < rd_length as usize {
            return Err(DnsError::Truncated);
        }

        // The rdata must account for exactly rd_length octets, or the
        // record boundaries after this one cannot be trusted.
        let rdata_start = bytes.position();
        let data = RecordData::decode(type_, rd_length, bytes)?;
        if bytes.position() != rdata_start + u64::from(rd_length) {
            return Err(DnsError::FormatError);
        }

        Ok(Self {
            name,
            type_,
            class,
            ttl,
            rd_length,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use crate::wirebuf::WireBuf;
    use crate::{DnsError, Name, RecordData, RecordType, ResourceRecord, SrvData, Wire};

    fn srv_record(port: u16, target: &str) -> ResourceRecord {
        ResourceRecord::new(
            Name::new("_xmpp-client._tcp.example.com"),
            RecordType::Srv,
            300,
            RecordData::Srv(SrvData {
                priority: 1,
                weight: 5,
                port,
                target: Name::new(target),
            }),
        )
    }

    fn encode_to_vec(record: &ResourceRecord) -> Vec<u8> {
        let mut buf = WireBuf::new(512);
        record.encode(&mut buf).unwrap();
        buf.as_bytes().to_vec()
    }

    #[test]
    fn round_trips_an_srv_record() {
        let encoded = encode_to_vec(&srv_record(5222, "chat.example.com"));

        let decoded = ResourceRecord::decode(&mut Cursor::new(&encoded[..])).unwrap();
        assert_eq!(decoded.type_, RecordType::Srv as u16);
        assert_eq!(decoded.class, 1);
        assert_eq!(decoded.ttl, 300);
        match decoded.data {
            RecordData::Srv(data) => {
                assert_eq!(data.priority, 1);
                assert_eq!(data.weight, 5);
                assert_eq!(data.port, 5222);
                assert_eq!(data.target.as_str(), "chat.example.com");
            }
            other => panic!("expected srv data, got {other:?}"),
        }
    }

    #[test]
    fn keeps_unhandled_rdata_and_stays_aligned() {
        // An A record followed by an SRV record. The A rdata is carried
        // raw and accounted by its rd_length so the SRV decode starts in
        // the right place.
        let mut buf = WireBuf::new(512);
        Name::new("example.com").encode(&mut buf).unwrap();
        buf.write_u16(RecordType::A as u16).unwrap();
        buf.write_u16(1).unwrap();
        buf.write_u32(60).unwrap();
        buf.write_u16(4).unwrap();
        buf.write_slice(&[192, 0, 2, 1]).unwrap();
        srv_record(5223, "alt.example.com").encode(&mut buf).unwrap();

        let mut cursor = Cursor::new(buf.as_bytes());
        let first = ResourceRecord::decode(&mut cursor).unwrap();
        match first.data {
            RecordData::Other(data) => assert_eq!(data, [192, 0, 2, 1]),
            other => panic!("expected raw data, got {other:?}"),
        }

        let second = ResourceRecord::decode(&mut cursor).unwrap();
        match second.data {
            RecordData::Srv(data) => assert_eq!(data.port, 5223),
            other => panic!("expected srv data, got {other:?}"),
        }

        // Both records accounted for every byte.
        assert_eq!(cursor.position(), buf.position() as u64);
    }

    #[test]
    fn decodes_a_compressed_srv_target() {
        // "example.com" at offset 0, then a record whose owner name and
        // srv target are both pointers back to it.
        let mut buf = WireBuf::new(512);
        Name::new("example.com").encode(&mut buf).unwrap();
        let record_at = buf.position() as u64;
        buf.write_slice(&[0xC0, 0x00]).unwrap();
        buf.write_u16(RecordType::Srv as u16).unwrap();
        buf.write_u16(1).unwrap();
        buf.write_u32(300).unwrap();
        buf.write_u16(8).unwrap();
        buf.write_u16(0).unwrap();
        buf.write_u16(0).unwrap();
        buf.write_u16(5222).unwrap();
        buf.write_slice(&[0xC0, 0x00]).unwrap();

        let mut cursor = Cursor::new(buf.as_bytes());
        cursor.set_position(record_at);
        let record = ResourceRecord::decode(&mut cursor).unwrap();
        assert_eq!(record.name.as_str(), "example.com");
        assert_eq!(record.rd_length, 8);
        match record.data {
            RecordData::Srv(data) => assert_eq!(data.target.as_str(), "example.com"),
            other => panic!("expected srv data, got {other:?}"),
        }
        assert_eq!(cursor.position(), buf.position() as u64);
    }

    #[test]
    fn rejects_rdata_shorter_than_rd_length() {
        let mut buf = WireBuf::new(512);
        Name::new("example.com").encode(&mut buf).unwrap();
        buf.write_u16(RecordType::A as u16).unwrap();
        buf.write_u16(1).unwrap();
        buf.write_u32(60).unwrap();
        buf.write_u16(10).unwrap();
        buf.write_slice(&[1, 2, 3]).unwrap();

        let err = ResourceRecord::decode(&mut Cursor::new(buf.as_bytes())).unwrap_err();
        assert_eq!(err, DnsError::Truncated);
    }

    #[test]
    fn rejects_srv_rdata_that_disagrees_with_rd_length() {
        // rd_length claims two octets more than the srv data occupies.
        let mut record = srv_record(5222, "chat.example.com");
        record.rd_length += 2;
        let mut encoded = encode_to_vec(&record);
        encoded.extend_from_slice(&[0, 0]);

        let err = ResourceRecord::decode(&mut Cursor::new(&encoded[..])).unwrap_err();
        assert_eq!(err, DnsError::FormatError);
    }
}
