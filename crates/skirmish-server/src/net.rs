// net.rs — The single UDP socket shared by the whole loop.
// Converted in spirit from myq2-sys/src/net_udp.rs's net_ip_socket: socket2
// for setup (non-blocking, bound to all interfaces), std::net::UdpSocket
// for the actual send/recv calls.

use std::io;
use std::net::{SocketAddr, UdpSocket};

use socket2::{Domain, Protocol, Socket, Type};

use skirmish_common::protocol::MAX_DATAGRAM_SIZE;

use crate::logging::log_info;

/// Binds a non-blocking UDP socket to all interfaces on `port`.
///
/// This is the one fallible, fatal operation in the server: callers should
/// log and exit non-zero on `Err` rather than retry.
pub fn bind(port: u16) -> io::Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    let addr: std::net::SocketAddrV4 = format!("0.0.0.0:{port}")
        .parse()
        .expect("well-formed bind address");
    socket.bind(&addr.into())?;
    socket.set_nonblocking(true)?;
    let socket: UdpSocket = socket.into();
    log_info(&format!("listening on udp port {port}"));
    Ok(socket)
}

/// Reads at most one pending datagram without blocking. `Ok(None)` means
/// nothing was waiting; any receive error is logged and treated the same
/// as "nothing waiting" — the socket survives a per-datagram transport
/// error.
pub fn try_recv(socket: &UdpSocket) -> Option<(SocketAddr, Vec<u8>)> {
    let mut buf = [0u8; MAX_DATAGRAM_SIZE];
    match socket.recv_from(&mut buf) {
        Ok((len, from)) => Some((from, buf[..len].to_vec())),
        Err(e) if e.kind() == io::ErrorKind::WouldBlock => None,
        Err(e) => {
            crate::logging::log_debug(&format!("recv error: {e}"));
            None
        }
    }
}

/// Best-effort send. Failures (including a broken pipe) are swallowed —
/// the transport is unreliable by design and a dead peer must never stop
/// the loop.
pub fn send_to(socket: &UdpSocket, addr: SocketAddr, bytes: &[u8]) {
    if let Err(e) = socket.send_to(bytes, addr) {
        crate::logging::log_debug(&format!("send to {addr} failed: {e}"));
    }
}
