//! DNS SRV lookup and nonblocking connect primitives for
//! messaging-protocol clients: a wire codec for the messages involved,
//! a resolution engine that never fails outward, and the socket plumbing
//! to reach whatever endpoint resolution produced.

use std::io::Cursor;

mod error;
pub use error::DnsError;

mod wirebuf;
pub use wirebuf::WireBuf;

mod header;
pub use header::{Flags, Header};

mod name;
pub use name::Name;

mod message;
pub use message::Message;

mod question;
pub use question::Question;

mod record;
pub use record::{RecordData, ResourceRecord, SrvData};

mod record_type;
pub use record_type::RecordType;

mod resolver;
pub use resolver::{
    resolve_srv, NameserverSource, NativeResolver, NoNativeResolver, ResolvedTarget, SrvResolver,
    StaticNameservers,
};

mod conn;
pub use conn::{
    connect_nonblocking, connect_to_host, is_recoverable, probe_connect, set_blocking,
    set_nonblocking, ConnectProbe,
};

/// Encoding to and decoding from the DNS wire format.
pub trait Wire: Sized {
    fn encode(&self, buf: &mut WireBuf) -> Result<(), DnsError>;

    fn decode(bytes: &mut Cursor<&[u8]>) -> Result<Self, DnsError>;
}
