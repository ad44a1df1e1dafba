use super::{TSocket, TSocketFactory};
use crate::icmp::v4::Ttl;
use pnet_packet::ipv4::Ipv4Packet;
use socket2::{Domain, Protocol, Type};
use std::net::Ipv4Addr;
use std::{io, time::Duration};

const RECV_BUFFER_SIZE: usize = 1500;

/// A `SOCK_RAW` ICMPv4 socket, not bound to any local address. Needs `CAP_NET_RAW` (or root).
pub struct RawSocket {
    socket: socket2::Socket,
}

impl RawSocket {
    pub fn new() -> Result<Self, io::Error> {
        tracing::trace!("creating RawSocket");
        let socket = socket2::Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::ICMPV4))?;
        Ok(RawSocket { socket })
    }
}

impl TSocket for RawSocket {
    fn set_ttl(&self, ttl: Ttl) -> io::Result<()> {
        self.socket.set_ttl(ttl.into())
    }

    fn set_read_timeout(&self, timeout: Duration) -> io::Result<()> {
        self.socket.set_read_timeout(Some(timeout))
    }

    fn send_to(&self, buf: &[u8], addr: &socket2::SockAddr) -> io::Result<usize> {
        self.socket.send_to(buf, addr)
    }

    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, Ipv4Addr, Ttl)> {
        let mut recv_buf = [0u8; RECV_BUFFER_SIZE];

        // Socket2 gives a safety guaranty which allows us to do an unsafe cast from `&mut [u8]`
        // to `&mut [std::mem::MaybeUninit<u8>]`: it never writes uninitialized bytes into the buffer.
        // https://docs.rs/socket2/0.4.7/socket2/struct.Socket.html#method.recv
        //
        // On a RAW socket we get an IP packet.
        let (n, socket_addr) = self.socket.recv_from(unsafe {
            &mut *(std::ptr::addr_of_mut!(recv_buf) as *mut [u8] as *mut [std::mem::MaybeUninit<u8>])
        })?;
        let (icmp, ttl) = strip_ipv4_header(&recv_buf[..n])?;
        let len = icmp.len().min(buf.len());
        buf[..len].copy_from_slice(&icmp[..len]);

        let ip = *socket_addr
            .as_socket_ipv4()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "sender is not an IPv4 address"))?
            .ip();
        Ok((len, ip, ttl))
    }
}

/// Splits a received IPv4 datagram into its ICMP message and the datagram's TTL.
fn strip_ipv4_header(datagram: &[u8]) -> io::Result<(&[u8], Ttl)> {
    let ipv4_packet = Ipv4Packet::new(datagram)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "datagram shorter than an IPv4 header"))?;
    // total length is not reliable across platforms, the header length is
    let header_len = usize::from(ipv4_packet.get_header_length()) * 4;
    if header_len < Ipv4Packet::minimum_packet_size() {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "IPv4 header length below minimum"));
    }
    let icmp = datagram
        .get(header_len..)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "IPv4 header length exceeds datagram"))?;
    Ok((icmp, Ttl(ipv4_packet.get_ttl())))
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RawSocketFactory;

impl TSocketFactory for RawSocketFactory {
    type Socket = RawSocket;

    fn open(&self) -> io::Result<RawSocket> {
        RawSocket::new()
    }
}
