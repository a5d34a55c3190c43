//! The stop-and-wait transfer loops.
//!
//! [`send`] and [`recv`] are the two operations of the protocol.  Both are
//! strictly sequential: one packet is outstanding on the wire at any moment,
//! and each loop iteration is a complete request/response step.
//!
//! # Send side
//!
//! The input stream is segmented into chunks of at most
//! `max_packet_size − 4` bytes.  Per chunk: frame it with the current
//! sequence number, then loop { record the send time; transmit; wait for one
//! acknowledgment bounded by the current adaptive timeout }:
//! - **timeout** — retransmit the identical frame; the RTT estimate is not
//!   touched.  Retries are uncapped unless [`SendConfig::retry_limit`] says
//!   otherwise, so sustained loss blocks forever by contract.
//! - **matching ACK** — feed the elapsed round-trip into the estimator and
//!   advance to the next chunk.
//! - **mismatched ACK** — retransmit immediately, without waiting out the
//!   stray acknowledgment and without updating the estimator.
//!
//! After the last chunk, one terminal marker (header only, sequence number =
//! chunk count) is sent exactly once, unacknowledged.
//!
//! # Receive side
//!
//! Frames are read with no deadline until the channel signals end-of-stream
//! with a zero-length read — the sole termination condition; the terminal
//! marker is handled as an ordinary empty data packet.  In-order payloads go
//! to the sink immediately, out-of-order ones wait in the
//! [`crate::receiver::Receiver`] reorder buffer, and every received frame is
//! acknowledged with the sequence number it carried.

use std::io::Write;

use tokio::time::Instant;

use crate::channel::{Channel, RecvOutcome};
use crate::packet::{Packet, PacketError, HEADER_LEN};
use crate::receiver::Receiver;
use crate::sender::Sender;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tunables for one [`send`] call.
#[derive(Debug, Clone)]
pub struct SendConfig {
    /// The channel's MTU; every frame, header included, fits within it.
    pub max_packet_size: usize,
    /// Maximum retransmissions of a single packet before giving up, or
    /// `None` for the default uncapped behaviour.
    pub retry_limit: Option<u32>,
}

impl SendConfig {
    /// Configuration with uncapped retries for a channel with the given MTU.
    ///
    /// # Panics
    ///
    /// Panics if `max_packet_size` leaves no room for payload bytes after
    /// the 4-byte header.
    pub fn new(max_packet_size: usize) -> Self {
        assert!(
            max_packet_size > HEADER_LEN,
            "max_packet_size must exceed the {HEADER_LEN}-byte header"
        );
        Self {
            max_packet_size,
            retry_limit: None,
        }
    }

    /// Cap retransmissions per packet at `limit`.
    pub fn with_retry_limit(mut self, limit: u32) -> Self {
        self.retry_limit = Some(limit);
        self
    }

    /// Largest payload a single data packet may carry.
    pub fn max_payload(&self) -> usize {
        self.max_packet_size - HEADER_LEN
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that abort a [`send`] or [`recv`] call.
///
/// Timeouts and channel closure are **not** errors: the former drives
/// retransmission, the latter is normal receiver termination.
#[derive(Debug)]
pub enum TransferError {
    /// Underlying channel or sink I/O error, propagated untranslated.
    Io(std::io::Error),
    /// A received frame was too short to decode.  No recovery path is
    /// defined for this, so it is a hard failure.
    Frame(PacketError),
    /// A packet exhausted its configured retransmission budget.
    RetriesExceeded {
        /// Sequence number of the packet that was given up on.
        seq: u32,
        /// Transmission attempts made, the first send included.
        attempts: u32,
    },
}

impl std::fmt::Display for TransferError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "channel I/O error: {e}"),
            Self::Frame(e) => write!(f, "malformed frame: {e}"),
            Self::RetriesExceeded { seq, attempts } => {
                write!(f, "gave up on packet seq={seq} after {attempts} attempts")
            }
        }
    }
}

impl std::error::Error for TransferError {}

impl From<std::io::Error> for TransferError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<PacketError> for TransferError {
    fn from(e: PacketError) -> Self {
        Self::Frame(e)
    }
}

// ---------------------------------------------------------------------------
// Send loop
// ---------------------------------------------------------------------------

/// Transfer `data` over `chan`, blocking until every chunk is acknowledged.
///
/// Ends by firing the terminal marker once, unacknowledged.  The channel is
/// left open; signalling end-of-stream (so the peer's [`recv`] returns) is
/// the caller's responsibility.
pub async fn send<C: Channel>(
    chan: &C,
    data: &[u8],
    config: &SendConfig,
) -> Result<(), TransferError> {
    let mut sender = Sender::new();

    for chunk in data.chunks(config.max_payload()) {
        let frame = sender.data_packet(chunk).encode();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            if let Some(limit) = config.retry_limit {
                // `limit` retransmissions on top of the first send.
                if attempts > limit + 1 {
                    return Err(TransferError::RetriesExceeded {
                        seq: sender.next_seq,
                        attempts: attempts - 1,
                    });
                }
            }

            let sent_at = Instant::now();
            chan.send(&frame).await?;
            let rto = sender.timeout();
            log::debug!(
                "[sw] → DATA seq={} len={} attempt={} rto={:?}",
                sender.next_seq,
                chunk.len(),
                attempts,
                rto
            );

            match chan.recv_deadline(HEADER_LEN, rto).await? {
                RecvOutcome::TimedOut => {
                    log::debug!("[sw] timeout seq={} — retransmitting", sender.next_seq);
                }
                RecvOutcome::Data(buf) => {
                    let ack = Packet::decode(&buf)?;
                    if sender.on_ack(ack.seq, sent_at.elapsed()) {
                        log::debug!("[sw] ← ACK seq={}", ack.seq);
                        break;
                    }
                    // Stray or duplicate ACK: retransmit immediately rather
                    // than waiting out another deadline on this send.
                    log::debug!(
                        "[sw] ← stray ACK seq={} (want {}) — retransmitting",
                        ack.seq,
                        sender.next_seq
                    );
                }
            }
        }
    }

    let fin = sender.terminal_packet();
    chan.send(&fin.encode()).await?;
    log::debug!("[sw] → FIN seq={} (unacknowledged)", fin.seq);
    Ok(())
}

// ---------------------------------------------------------------------------
// Receive loop
// ---------------------------------------------------------------------------

/// Receive a stream from `chan`, writing ordered bytes to `sink`.
///
/// Runs until the channel's zero-length end-of-stream read, then returns the
/// total number of payload bytes delivered to the sink.
pub async fn recv<C: Channel, W: Write>(
    chan: &C,
    sink: &mut W,
    max_packet_size: usize,
) -> Result<usize, TransferError> {
    let mut receiver = Receiver::new();
    let mut delivered = 0usize;

    loop {
        let buf = chan.recv(max_packet_size).await?;
        if buf.is_empty() {
            log::debug!("[sw] channel closed — {delivered} byte(s) delivered");
            break;
        }

        let pkt = Packet::decode(&buf)?;
        let seq = pkt.seq;
        let ready = receiver.on_packet(seq, pkt.payload);

        if ready.is_empty() {
            log::debug!(
                "[sw] ← DATA seq={} buffered (expecting {}, {} pending)",
                seq,
                receiver.expected_seq,
                receiver.buffered()
            );
        } else {
            for payload in &ready {
                sink.write_all(payload)?;
                delivered += payload.len();
            }
            sink.flush()?;
            log::debug!(
                "[sw] ← DATA seq={} delivered {} packet(s), cursor now {}",
                seq,
                ready.len(),
                receiver.expected_seq
            );
        }

        // Always echo the sequence number we decoded, not the cursor.
        chan.send(&Packet::header_only(seq).encode()).await?;
    }

    Ok(delivered)
}
