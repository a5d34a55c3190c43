//! Outbound packet state for stop-and-wait reliability.
//!
//! [`Sender`] tracks the sequence cursor and the adaptive timeout estimate.
//! It does **not** touch the channel; [`crate::transfer::send`] calls these
//! methods and owns the actual send/receive loop.
//!
//! # Stop-and-Wait contract
//! - At most **one** packet is in flight at any moment.
//! - On a matching ACK: record the RTT sample; advance `next_seq`.
//! - On timeout or a mismatched ACK: resend the same packet unchanged and
//!   leave the RTT estimate alone.
//! - After the last chunk, exactly one terminal marker is sent: header only,
//!   sequence number equal to the chunk count, never retried or awaited.

use std::time::Duration;

use crate::packet::Packet;
use crate::rto::RtoEstimator;

/// Stop-and-wait send-side state for one transfer.
#[derive(Debug)]
pub struct Sender {
    /// Sequence number of the packet currently being sent.
    ///
    /// Advances by one per acknowledged chunk; after the final chunk it
    /// equals the chunk count and becomes the terminal marker's number.
    pub next_seq: u32,

    /// Round-trip estimate driving the retransmission timeout.
    pub rto: RtoEstimator,
}

impl Default for Sender {
    fn default() -> Self {
        Self::new()
    }
}

impl Sender {
    /// Create a new [`Sender`] with the cursor at 0 and a fresh RTT estimate.
    pub fn new() -> Self {
        Self {
            next_seq: 0,
            rto: RtoEstimator::new(),
        }
    }

    /// Frame `chunk` with the current sequence number.
    pub fn data_packet(&self, chunk: &[u8]) -> Packet {
        Packet {
            seq: self.next_seq,
            payload: chunk.to_vec(),
        }
    }

    /// The terminal marker: header only, sequence number = chunk count.
    pub fn terminal_packet(&self) -> Packet {
        Packet::header_only(self.next_seq)
    }

    /// Process an inbound acknowledgment.
    ///
    /// Returns `true` if `ack_seq` matches the in-flight packet; the measured
    /// `sample` round-trip feeds the timeout estimate and `next_seq` advances.
    ///
    /// Returns `false` for a stray or duplicate ACK: no state changes, and
    /// the caller must retransmit immediately rather than wait again.
    pub fn on_ack(&mut self, ack_seq: u32, sample: Duration) -> bool {
        if ack_seq != self.next_seq {
            return false;
        }
        self.rto.record_sample(sample);
        self.next_seq = self.next_seq.wrapping_add(1);
        true
    }

    /// Current retransmission timeout for the ACK wait.
    pub fn timeout(&self) -> Duration {
        self.rto.timeout()
    }
}
