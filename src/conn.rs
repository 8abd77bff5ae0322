use std::io::{self, Read};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};

use socket2::{Domain, Protocol, Socket, Type};
use tracing::{debug, instrument};

/// Outcome of probing an in-flight nonblocking connect.
#[derive(Debug)]
pub enum ConnectProbe {
    /// The connection is established.
    Connected,
    /// The handshake is still in flight; probe again later.
    Pending,
    /// The connect settled with this error.
    Failed(io::Error),
}

/// Whether a socket error is transient, meaning the same operation makes
/// sense to retry on the same socket. Anything else is fatal for that
/// socket.
pub fn is_recoverable(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
    ) || err.raw_os_error() == Some(libc::EINPROGRESS)
}

/// A nonblocking connect that could not finish immediately reports
/// would-block on some platforms and EINPROGRESS on others.
fn connect_in_progress(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock || err.raw_os_error() == Some(libc::EINPROGRESS)
}

fn start_connect(addr: SocketAddr) -> io::Result<TcpStream> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_nonblocking(true)?;

    match socket.connect(&addr.into()) {
        Ok(()) => {}
        Err(err) if connect_in_progress(&err) => {}
        Err(err) => return Err(err),
    }

    Ok(socket.into())
}

/// Starts a nonblocking TCP connect to the first workable candidate.
///
/// A candidate is kept when its connect succeeds immediately or reports
/// in-progress; any other error moves on to the next address. The error
/// of the last candidate surfaces only once the whole list is exhausted.
pub fn connect_nonblocking(candidates: &[SocketAddr]) -> io::Result<TcpStream> {
    let mut last_err = None;

    for addr in candidates {
        match start_connect(*addr) {
            Ok(stream) => return Ok(stream),
            Err(err) => {
                debug!(%addr, %err, "connect candidate failed");
                last_err = Some(err);
            }
        }
    }

    Err(last_err
        .unwrap_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "no candidate addresses")))
}

/// Resolves `host` and starts a nonblocking connect to the candidates in
/// resolver order.
#[instrument(level = "debug")]
pub fn connect_to_host(host: &str, port: u16) -> io::Result<TcpStream> {
    let candidates: Vec<SocketAddr> = (host, port).to_socket_addrs()?.collect();
    connect_nonblocking(&candidates)
}

/// Checks whether a nonblocking connect has completed.
///
/// An established connection answers `peer_addr`. While the handshake is
/// still in flight the socket reports not-connected, which carries no
/// cause; the pending error is slipped out by attempting a one byte read
/// and classifying the refreshed error instead. The read can even succeed
/// if the handshake finished between the two calls.
pub fn probe_connect(stream: &TcpStream) -> ConnectProbe {
    match stream.peer_addr() {
        Ok(_) => ConnectProbe::Connected,
        Err(err) if err.kind() == io::ErrorKind::NotConnected => {
            let mut reader = stream;
            let mut byte = [0u8; 1];
            match reader.read(&mut byte) {
                Ok(_) => ConnectProbe::Connected,
                Err(err) if is_recoverable(&err) => ConnectProbe::Pending,
                Err(err) => ConnectProbe::Failed(err),
            }
        }
        Err(err) => ConnectProbe::Failed(err),
    }
}

/// Puts the stream into blocking mode.
pub fn set_blocking(stream: &TcpStream) -> io::Result<()> {
    stream.set_nonblocking(false)
}

/// Puts the stream into nonblocking mode.
pub fn set_nonblocking(stream: &TcpStream) -> io::Result<()> {
    stream.set_nonblocking(true)
}
