use crate::DnsError;

/// Fixed-capacity message buffer with an explicit write position.
///
/// One `WireBuf` is owned by each call that encodes a message. All writes are
/// big-endian, advance the position by exactly the number of bytes produced,
/// and fail with [`DnsError::BufferFull`] instead of growing or overrunning
/// the buffer.
#[derive(Debug)]
pub struct WireBuf {
    buf: Box<[u8]>,
    pos: usize,
}

impl WireBuf {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0; capacity].into_boxed_slice(),
            pos: 0,
        }
    }

    /// The bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.pos]
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn write_u8(&mut self, value: u8) -> Result<(), DnsError> {
        self.write_slice(&[value])
    }

    pub fn write_u16(&mut self, value: u16) -> Result<(), DnsError> {
        self.write_slice(&value.to_be_bytes())
    }

    pub fn write_u32(&mut self, value: u32) -> Result<(), DnsError> {
        self.write_slice(&value.to_be_bytes())
    }

    pub fn write_slice(&mut self, bytes: &[u8]) -> Result<(), DnsError> {
        if self.remaining() < bytes.len() {
            return Err(DnsError::BufferFull);
        }
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
        Ok(())
    }
}
