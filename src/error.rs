/// Errors produced while encoding or decoding DNS messages.
///
/// Every variant except [`DnsError::BufferFull`] describes malformed input:
/// the resolver treats those identically to "no usable reply" and falls
/// through to its next source. `BufferFull` is a contract violation on the
/// encode side (a write past the buffer's fixed capacity) surfaced as an
/// explicit failure instead of memory corruption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DnsError {
    /// The message ended before the field being decoded.
    #[error("unexpected end of message")]
    Truncated,

    /// A field violated the wire format (bad label type, rdata length
    /// mismatch, invalid UTF-8 in a label).
    #[error("malformed message")]
    FormatError,

    /// A compression pointer did not point strictly backwards. Forward
    /// pointers, self references and pointer cycles all land here.
    #[error("invalid compression pointer")]
    BadPointer,

    /// A decoded domain name exceeded the 255 octet limit.
    #[error("domain name too long")]
    NameTooLong,

    /// A write would pass the end of a fixed-capacity buffer.
    #[error("write past end of buffer")]
    BufferFull,
}
