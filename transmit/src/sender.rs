//! Best-effort datagram sender.

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};

use tracing::{debug, warn};

use crate::error::{ConfigError, TransmitError};
use crate::stats::NetworkStats;

/// One-shot datagram transport.
pub trait Transport: Send {
    /// Sends one datagram, returning the number of bytes accepted.
    fn send(&mut self, datagram: &[u8]) -> io::Result<usize>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, datagram: &[u8]) -> io::Result<usize> {
        (**self).send(datagram)
    }
}

/// Non-blocking UDP socket bound to an ephemeral port.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpTransport {
    /// Opens a socket of the target's address family. Never blocks on send.
    pub fn open(target: SocketAddr) -> Result<Self, ConfigError> {
        let bind: SocketAddr = match target {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        let socket = UdpSocket::bind(bind).map_err(transport_error)?;
        socket.set_nonblocking(true).map_err(transport_error)?;
        Ok(Self { socket, target })
    }

    #[must_use]
    pub const fn target(&self) -> SocketAddr {
        self.target
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

impl Transport for UdpTransport {
    fn send(&mut self, datagram: &[u8]) -> io::Result<usize> {
        self.socket.send_to(datagram, self.target)
    }
}

fn transport_error(err: io::Error) -> ConfigError {
    ConfigError::Transport {
        reason: err.to_string(),
    }
}

/// Sends whole frames as single datagrams and counts the outcome.
///
/// There is no retry and no fragmentation. A sender without a transport
/// (never opened, or closed) fails every send without faulting.
#[derive(Default)]
pub struct NetworkSender {
    transport: Option<Box<dyn Transport>>,
    stats: NetworkStats,
}

impl NetworkSender {
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Some(Box::new(transport)),
            stats: NetworkStats::default(),
        }
    }

    /// Opens a UDP sender towards `target`.
    pub fn udp(target: SocketAddr) -> Result<Self, ConfigError> {
        Ok(Self::new(UdpTransport::open(target)?))
    }

    /// Creates a sender with no transport.
    #[must_use]
    pub fn detached() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    /// Sends `frame`, returning `true` on success.
    pub fn send(&mut self, frame: &[u8]) -> bool {
        match self.try_send(frame) {
            Ok(_) => true,
            Err(err) => {
                warn!(len = frame.len(), %err, "frame dropped");
                false
            }
        }
    }

    /// Sends `frame`, returning the bytes accepted or why it failed.
    /// Statistics are updated either way.
    pub fn try_send(&mut self, frame: &[u8]) -> Result<usize, TransmitError> {
        let result = match self.transport.as_mut() {
            Some(transport) => transport.send(frame).map_err(TransmitError::from),
            None => Err(TransmitError::NotConnected),
        };
        match result {
            Ok(sent) => {
                self.stats.packets_sent += 1;
                self.stats.bytes_sent += sent as u64;
            }
            Err(_) => self.stats.errors += 1,
        }
        result
    }

    /// Returns a copy of the counters.
    #[must_use]
    pub const fn stats(&self) -> NetworkStats {
        self.stats
    }

    /// Releases the transport. Safe to call repeatedly.
    pub fn close(&mut self) {
        if self.transport.take().is_some() {
            debug!("network sender closed");
        }
    }
}

impl std::fmt::Debug for NetworkSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkSender")
            .field("open", &self.is_open())
            .field("stats", &self.stats)
            .finish()
    }
}
