use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use super::protocol::MAX_PACKET_SIZE;
use super::stats::NetworkStats;
use super::transport::{Channel, ChannelError};

/// Non-blocking UDP channel bound to a local address with a fixed remote.
pub struct UdpChannel {
    socket: Option<UdpSocket>,
    local_addr: SocketAddr,
    remote_addr: SocketAddr,
    stats: NetworkStats,
    recv_buffer: Vec<u8>,
}

impl UdpChannel {
    pub fn bind<A: ToSocketAddrs>(local: A, remote: SocketAddr) -> io::Result<Self> {
        let socket = UdpSocket::bind(local)?;
        socket.set_nonblocking(true)?;

        let local_addr = socket.local_addr()?;

        Ok(Self {
            socket: Some(socket),
            local_addr,
            remote_addr: remote,
            stats: NetworkStats::default(),
            recv_buffer: vec![0u8; MAX_PACKET_SIZE],
        })
    }

    /// Binds `ip:local_port`, talking to `ip:remote_port`.
    pub fn open(ip: &str, local_port: u16, remote_port: u16) -> io::Result<Self> {
        let remote: SocketAddr = format!("{}:{}", ip, remote_port)
            .parse()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let local = match remote {
            SocketAddr::V4(_) => format!("0.0.0.0:{}", local_port),
            SocketAddr::V6(_) => format!("[::]:{}", local_port),
        };
        Self::bind(local, remote)
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    pub fn stats(&self) -> &NetworkStats {
        &self.stats
    }

    pub fn is_open(&self) -> bool {
        self.socket.is_some()
    }

    fn socket(&self) -> Result<&UdpSocket, ChannelError> {
        self.socket.as_ref().ok_or(ChannelError::Closed)
    }
}

impl Channel for UdpChannel {
    fn send(&mut self, data: &[u8]) -> Result<(), ChannelError> {
        if data.len() > MAX_PACKET_SIZE {
            return Err(ChannelError::PacketTooLarge {
                size: data.len(),
                max: MAX_PACKET_SIZE,
            });
        }

        let bytes = self.socket()?.send_to(data, self.remote_addr)?;
        self.stats.record_sent(bytes);
        Ok(())
    }

    fn try_receive(&mut self) -> Result<Option<Vec<u8>>, ChannelError> {
        loop {
            let socket = self.socket.as_ref().ok_or(ChannelError::Closed)?;
            match socket.recv_from(&mut self.recv_buffer) {
                Ok((size, addr)) => {
                    if addr != self.remote_addr {
                        log::trace!("ignoring datagram from {}", addr);
                        self.stats.packets_dropped += 1;
                        continue;
                    }
                    self.stats.record_received(size);
                    return Ok(Some(self.recv_buffer[..size].to_vec()));
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(None),
                // ICMP port unreachable from an earlier send surfaces here on some platforms
                Err(ref e) if e.kind() == io::ErrorKind::ConnectionReset => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn close(&mut self) {
        if self.socket.take().is_some() {
            log::debug!("closed channel {} -> {}", self.local_addr, self.remote_addr);
        }
    }
}
