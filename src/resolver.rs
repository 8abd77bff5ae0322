use std::io::{self, Cursor};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::thread;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::conn::is_recoverable;
use crate::wirebuf::WireBuf;
use crate::{Flags, Header, Message, Name, Question, RecordData, RecordType, Wire};

/// Nameservers consulted per resolution, at most.
const MAX_NAMESERVERS: usize = 16;

/// Receive polls per nameserver before giving up on it.
const DEFAULT_ATTEMPTS: u32 = 50;

/// Pause between receive polls.
const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(100);

const QUERY_BUF_LEN: usize = 512;

/// The endpoint a resolution produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub target: String,
    pub port: u16,
}

/// Platform resolver capability. An implementation that can answer SRV
/// queries itself (res_query, DnsQuery and the like) short-circuits the
/// manual wire exchange.
pub trait NativeResolver {
    fn lookup_srv(&self, name: &str) -> Option<ResolvedTarget>;
}

/// The capability on platforms without a usable native resolver.
#[derive(Debug, Default)]
pub struct NoNativeResolver;

impl NativeResolver for NoNativeResolver {
    fn lookup_srv(&self, _name: &str) -> Option<ResolvedTarget> {
        None
    }
}

/// Where the ordered nameserver list comes from. The engine consults the
/// addresses strictly in the order returned.
pub trait NameserverSource {
    fn list_nameservers(&self) -> Vec<SocketAddr>;
}

/// A fixed nameserver list. Addresses carry their port, so tests can
/// stand in servers bound to ephemeral ports for port 53.
#[derive(Debug, Default)]
pub struct StaticNameservers(pub Vec<SocketAddr>);

impl NameserverSource for StaticNameservers {
    fn list_nameservers(&self) -> Vec<SocketAddr> {
        self.0.clone()
    }
}

/// SRV resolution engine: native resolver capability first, then a manual
/// UDP query against each supplied nameserver, then the caller's fallback.
#[derive(Debug)]
pub struct SrvResolver<N = NoNativeResolver, S = StaticNameservers> {
    native: N,
    nameservers: S,
    attempts: u32,
    retry_delay: Duration,
}

impl SrvResolver {
    pub fn new() -> Self {
        Self {
            native: NoNativeResolver,
            nameservers: StaticNameservers::default(),
            attempts: DEFAULT_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl Default for SrvResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: NativeResolver, S: NameserverSource> SrvResolver<N, S> {
    pub fn with_native_resolver<N2: NativeResolver>(self, native: N2) -> SrvResolver<N2, S> {
        SrvResolver {
            native,
            nameservers: self.nameservers,
            attempts: self.attempts,
            retry_delay: self.retry_delay,
        }
    }

    pub fn with_nameservers<S2: NameserverSource>(self, nameservers: S2) -> SrvResolver<N, S2> {
        SrvResolver {
            native: self.native,
            nameservers,
            attempts: self.attempts,
            retry_delay: self.retry_delay,
        }
    }

    /// Adjusts the receive poll: `attempts` polls of `retry_delay` each
    /// per nameserver.
    pub fn with_poll(self, attempts: u32, retry_delay: Duration) -> Self {
        Self {
            attempts,
            retry_delay,
            ..self
        }
    }

    /// Resolves the SRV endpoint for `_<service>._<proto>.<domain>`.
    ///
    /// Never fails outward: when no strategy produces an answer, the
    /// fallback `(domain, default_port)` is returned so the caller can
    /// still attempt a direct connection.
    #[instrument(level = "debug", skip(self))]
    pub fn resolve(
        &self,
        service: &str,
        proto: &str,
        domain: &str,
        default_port: u16,
    ) -> ResolvedTarget {
        let fullname = format!("_{}._{}.{}", service, proto, domain);

        if let Some(found) = self.native.lookup_srv(&fullname) {
            debug!(host = %found.target, port = found.port, "native resolver answered");
            return found;
        }

        match self.query_nameservers(&fullname) {
            Some(found) => found,
            None => {
                debug!("no srv answer, falling back to the domain itself");
                ResolvedTarget {
                    target: domain.to_owned(),
                    port: default_port,
                }
            }
        }
    }

    fn query_nameservers(&self, fullname: &str) -> Option<ResolvedTarget> {
        let nameservers = self.nameservers.list_nameservers();
        if nameservers.is_empty() {
            debug!("no nameservers to query");
            return None;
        }

        let id = rand::random::<u16>();
        let query = build_query(id, fullname);
        let mut buf = WireBuf::new(QUERY_BUF_LEN);
        if let Err(err) = query.encode(&mut buf) {
            warn!(%err, "could not encode the query");
            return None;
        }

        for nameserver in nameservers.iter().take(MAX_NAMESERVERS) {
            match self.exchange(*nameserver, buf.as_bytes()) {
                Ok(reply) => {
                    if let Some(found) = parse_reply(&reply, id) {
                        debug!(%nameserver, host = %found.target, port = found.port, "srv answer");
                        return Some(found);
                    }
                }
                Err(err) => {
                    debug!(%nameserver, %err, "nameserver did not answer");
                }
            }
        }

        None
    }

    /// Sends the query and polls for one datagram. The socket is
    /// connected, so the kernel filters replies from other sources and
    /// surfaces port-unreachable as an error instead of a full timeout.
    fn exchange(&self, nameserver: SocketAddr, query: &[u8]) -> io::Result<Vec<u8>> {
        let bind_addr: SocketAddr = if nameserver.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };

        let sock = UdpSocket::bind(bind_addr)?;
        sock.set_nonblocking(true)?;
        sock.connect(nameserver)?;
        sock.send(query)?;

        // http://www.dnsflagday.net/2020/
        let mut buf = [0; 1232];

        for _ in 0..self.attempts {
            match sock.recv(&mut buf) {
                Ok(len) => return Ok(buf[..len].to_vec()),
                Err(err) if is_recoverable(&err) => thread::sleep(self.retry_delay),
                Err(err) => return Err(err),
            }
        }

        Err(io::ErrorKind::TimedOut.into())
    }
}

fn build_query(id: u16, fullname: &str) -> Message {
    let mut flags = Flags::default();
    flags.set_rd(true);

    let mut query = Message::new(Header::new(id, flags));
    query.add_question(Question::new(Name::new(fullname), RecordType::Srv));
    query
}

/// Pulls the first SRV answer out of a reply, or nothing if the reply
/// does not decode, does not echo the transaction id, or carries no SRV
/// record. All of those read the same to the engine: no usable reply.
fn parse_reply(reply: &[u8], id: u16) -> Option<ResolvedTarget> {
    let message = match Message::decode(&mut Cursor::new(reply)) {
        Ok(message) => message,
        Err(err) => {
            warn!(%err, "discarding undecodable reply");
            return None;
        }
    };

    if message.header.id != id {
        warn!(
            got = message.header.id,
            want = id,
            "discarding reply with a foreign transaction id"
        );
        return None;
    }

    message.answers.into_iter().find_map(|record| match record.data {
        RecordData::Srv(data) => Some(ResolvedTarget {
            target: data.target.0,
            port: data.port,
        }),
        _ => None,
    })
}

/// One-shot resolution with no capabilities wired in: goes straight to
/// the fallback, the behavior on platforms without nameserver discovery.
/// Callers with a nameserver list or a platform resolver use
/// [`SrvResolver`] directly.
pub fn resolve_srv(service: &str, proto: &str, domain: &str, default_port: u16) -> ResolvedTarget {
    SrvResolver::new().resolve(service, proto, domain, default_port)
}
