use super::Ttl;
use std::net::Ipv4Addr;
use std::{io, time::Duration};

pub(crate) mod raw_socket;

/// An ICMPv4 packet channel.
///
/// `recv_from` fills `buf` with the ICMP message only (no IPv4 header) and returns its length,
/// the sender address and the TTL of the received datagram. When the read timeout expires it
/// fails with `WouldBlock` or `TimedOut`.
pub trait TSocket: Send {
    fn set_ttl(&self, ttl: Ttl) -> io::Result<()>;
    fn set_read_timeout(&self, timeout: Duration) -> io::Result<()>;
    fn send_to(&self, buf: &[u8], addr: &socket2::SockAddr) -> io::Result<usize>;
    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, Ipv4Addr, Ttl)>;
}

/// Opens one fresh channel per hop attempt. The channel is closed when dropped.
pub trait TSocketFactory {
    type Socket: TSocket;

    fn open(&self) -> io::Result<Self::Socket>;
}
