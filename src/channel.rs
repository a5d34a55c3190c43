//! The unreliable datagram channel the protocol runs over.
//!
//! The protocol core never talks to a socket directly; it goes through the
//! [`Channel`] trait, which captures the three capabilities it needs:
//! - fire a frame at the peer ([`Channel::send`]),
//! - block for the next frame ([`Channel::recv`]), where a zero-length read
//!   signals end-of-stream,
//! - block for the next frame with a deadline ([`Channel::recv_deadline`]),
//!   returning a tagged [`RecvOutcome`] instead of mutating ambient socket
//!   options.
//!
//! The channel may lose, delay, or reorder frames; it must not corrupt or
//! duplicate them.  Establishment and teardown of the channel are the
//! caller's business.
//!
//! [`UdpChannel`] is the production implementation; [`crate::sim`] provides
//! a deterministic in-memory pair for tests.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::OnceLock;
use std::time::Duration;

use tokio::net::UdpSocket;

/// Result of a timed read: either a frame arrived or the deadline expired.
///
/// A timeout is an expected event on the send path (it drives
/// retransmission), so it is a value here rather than an error.
#[derive(Debug, PartialEq, Eq)]
pub enum RecvOutcome {
    /// A frame arrived before the deadline.  May be empty (end-of-stream).
    Data(Vec<u8>),
    /// The deadline expired with nothing to read.
    TimedOut,
}

/// An unreliable, packet-oriented, MTU-bounded channel.
pub trait Channel: Send + Sync {
    /// Send one frame towards the peer.  Loss in transit is not reported.
    fn send(&self, frame: &[u8]) -> impl Future<Output = io::Result<()>> + Send;

    /// Receive the next frame, up to `max_len` bytes.
    ///
    /// Blocks until a frame arrives or the channel closes; a zero-length
    /// frame signals end-of-stream.
    fn recv(&self, max_len: usize) -> impl Future<Output = io::Result<Vec<u8>>> + Send;

    /// Receive the next frame, giving up after `deadline`.
    fn recv_deadline(
        &self,
        max_len: usize,
        deadline: Duration,
    ) -> impl Future<Output = io::Result<RecvOutcome>> + Send {
        async move {
            match tokio::time::timeout(deadline, self.recv(max_len)).await {
                Ok(Ok(frame)) => Ok(RecvOutcome::Data(frame)),
                Ok(Err(e)) => Err(e),
                Err(_elapsed) => Ok(RecvOutcome::TimedOut),
            }
        }
    }
}

/// A [`Channel`] over a UDP socket.
///
/// The peer address is either fixed up front ([`UdpChannel::connect`], the
/// sending side) or learned from the first inbound datagram
/// ([`UdpChannel::bind`], the receiving side).  Datagrams from any other
/// address are skipped.  A zero-length datagram is the channel's
/// end-of-stream signal ([`UdpChannel::close`] emits one).
#[derive(Debug)]
pub struct UdpChannel {
    socket: UdpSocket,
    peer: OnceLock<SocketAddr>,
}

impl UdpChannel {
    /// Bind to `local` and wait for the peer to reveal itself with its
    /// first datagram.
    pub async fn bind(local: SocketAddr) -> io::Result<Self> {
        let socket = UdpSocket::bind(local).await?;
        Ok(Self {
            socket,
            peer: OnceLock::new(),
        })
    }

    /// Bind to `local` and fix the peer address immediately.
    pub async fn connect(local: SocketAddr, peer: SocketAddr) -> io::Result<Self> {
        let chan = Self::bind(local).await?;
        let _ = chan.peer.set(peer);
        Ok(chan)
    }

    /// Address this socket is bound to (after the OS assigns a port).
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Signal end-of-stream by sending a zero-length datagram.
    pub async fn close(&self) -> io::Result<()> {
        let peer = self.peer_addr()?;
        self.socket.send_to(&[], peer).await?;
        Ok(())
    }

    fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.peer.get().copied().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotConnected, "peer address not yet known")
        })
    }
}

impl Channel for UdpChannel {
    fn send(&self, frame: &[u8]) -> impl Future<Output = io::Result<()>> + Send {
        async move {
            let peer = self.peer_addr()?;
            self.socket.send_to(frame, peer).await?;
            Ok(())
        }
    }

    fn recv(&self, max_len: usize) -> impl Future<Output = io::Result<Vec<u8>>> + Send {
        async move {
            let mut buf = vec![0u8; max_len];
            loop {
                let (n, addr) = self.socket.recv_from(&mut buf).await?;
                match self.peer.get() {
                    Some(peer) if *peer != addr => continue, // not our peer
                    Some(_) => {}
                    None => {
                        let _ = self.peer.set(addr);
                    }
                }
                buf.truncate(n);
                return Ok(buf);
            }
        }
    }
}
