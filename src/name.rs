use std::fmt::Display;
use std::io::Cursor;

use bytes::Buf;
use tracing::warn;

use crate::wirebuf::WireBuf;
use crate::{DnsError, Wire};

/// Longest label the wire format can carry. The length octet reserves its
/// top two bits for compression pointers.
const MAX_LABEL_LEN: usize = 63;

/// Longest decoded name we accept, matching the RFC 1035 ceiling.
const MAX_NAME_LEN: usize = 255;

/// A domain name held in dotted presentation form, without the trailing dot.
/// The root name is the empty string.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: &str) -> Self {
        Self(name.trim_end_matches('.').to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Encoded size in octets: one length octet per label plus the label
    /// bytes, plus the terminating zero octet. Never emits pointers, so
    /// this is exact for what [`Wire::encode`] will produce.
    pub fn wire_len(&self) -> usize {
        self.0
            .split('.')
            .filter(|label| !label.is_empty())
            .map(|label| 1 + label.len().min(MAX_LABEL_LEN))
            .sum::<usize>()
            + 1
    }
}

impl Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Wire for Name {
    /// Writes the uncompressed label sequence. Labels over 63 octets are
    /// truncated to fit the length octet rather than rejected.
    fn encode(&self, buf: &mut WireBuf) -> Result<(), DnsError> {
        for label in self.0.split('.').filter(|label| !label.is_empty()) {
            let bytes = label.as_bytes();
            let len = bytes.len().min(MAX_LABEL_LEN);
            if bytes.len() > MAX_LABEL_LEN {
                warn!(label, "label exceeds 63 octets, truncating");
            }
            buf.write_u8(len as u8)?;
            buf.write_slice(&bytes[..len])?;
        }
        buf.write_u8(0)
    }

    /// Reads a possibly-compressed name. The cursor ends up one past the
    /// terminating zero octet, or one past the first pointer if the name
    /// was compressed, no matter how many pointers the chain followed.
    ///
    /// Every pointer target must sit strictly before the previous one
    /// (and the first strictly before the name itself), so a chain can
    /// only step backwards and always terminates.
    fn decode(bytes: &mut Cursor<&[u8]>) -> Result<Self, DnsError> {
        let mut parts: Vec<String> = Vec::new();
        let mut name_len = 0;

        // Position to restore once the whole name is read. Only the first
        // pointer sets it.
        let mut resume_at = None;
        let mut last_target = bytes.position();

        loop {
            if bytes.remaining() < 1 {
                return Err(DnsError::Truncated);
            }
            let len = bytes.get_u8();

            match len & 0xC0 {
                0x00 => {
                    if len == 0 {
                        break;
                    }
                    let len = len as usize;
                    if bytes.remaining() < len {
                        return Err(DnsError::Truncated);
                    }
                    name_len += len + if parts.is_empty() { 0 } else { 1 };
                    if name_len > MAX_NAME_LEN {
                        return Err(DnsError::NameTooLong);
                    }
                    let label = bytes.copy_to_bytes(len);
                    let label =
                        String::from_utf8(label.to_vec()).or(Err(DnsError::FormatError))?;
                    parts.push(label);
                }
                0xC0 => {
                    if bytes.remaining() < 1 {
                        return Err(DnsError::Truncated);
                    }
                    let target = u64::from(len & 0x3F) << 8 | u64::from(bytes.get_u8());
                    if target >= last_target {
                        return Err(DnsError::BadPointer);
                    }
                    last_target = target;
                    if resume_at.is_none() {
                        resume_at = Some(bytes.position());
                    }
                    bytes.set_position(target);
                }
                // 0x40 and 0x80 label types were never standardized
                _ => return Err(DnsError::FormatError),
            }
        }

        if let Some(pos) = resume_at {
            bytes.set_position(pos);
        }

        Ok(Self(parts.join(".")))
    }
}
