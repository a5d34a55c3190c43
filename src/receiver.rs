//! Inbound packet resequencing for stop-and-wait reliability.
//!
//! [`Receiver`] is responsible for everything that happens *after* a raw
//! frame is decoded into a [`crate::packet::Packet`] and *before* ordered
//! bytes reach the output sink:
//! - Delivering the payload immediately when its sequence number is the one
//!   expected next.
//! - Buffering out-of-order payloads until the gap before them is filled.
//! - Draining the reorder buffer each time the cursor advances.
//!
//! Duplicates of already-delivered packets land in the reorder buffer under
//! their stale key and are never drained, so output bytes are never
//! duplicated.
//!
//! This module only manages state; all channel I/O and acknowledgment
//! traffic is the caller's ([`crate::transfer::recv`]) responsibility.  Note
//! that the ACK for a packet always echoes the sequence number *received*,
//! not the cursor — that is what lets the sender's match check discard
//! acknowledgments for duplicate or out-of-order packets.

use std::collections::BTreeMap;

/// Resequencing state for one transfer.
#[derive(Debug, Default)]
pub struct Receiver {
    /// Sequence number of the next packet to deliver in order.
    pub expected_seq: u32,

    /// Out-of-order payloads keyed by sequence number, awaiting their turn.
    pending: BTreeMap<u32, Vec<u8>>,
}

impl Receiver {
    /// Create a new [`Receiver`] expecting sequence number 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one decoded packet.
    ///
    /// Returns the payloads now deliverable in order: empty when the packet
    /// was buffered (or is a stale duplicate), one payload for an in-order
    /// arrival, more when the arrival unblocks buffered successors.
    ///
    /// A repeated sequence number overwrites any earlier buffered payload
    /// for that key.
    pub fn on_packet(&mut self, seq: u32, payload: Vec<u8>) -> Vec<Vec<u8>> {
        if seq != self.expected_seq {
            self.pending.insert(seq, payload);
            return Vec::new();
        }

        let mut ready = vec![payload];
        self.expected_seq = self.expected_seq.wrapping_add(1);
        while let Some(next) = self.pending.remove(&self.expected_seq) {
            ready.push(next);
            self.expected_seq = self.expected_seq.wrapping_add(1);
        }
        ready
    }

    /// Number of out-of-order payloads currently buffered.
    pub fn buffered(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state() {
        let r = Receiver::new();
        assert_eq!(r.expected_seq, 0);
        assert_eq!(r.buffered(), 0);
    }

    #[test]
    fn in_order_packet_delivered_immediately() {
        let mut r = Receiver::new();
        let ready = r.on_packet(0, b"hello".to_vec());
        assert_eq!(ready, vec![b"hello".to_vec()]);
        assert_eq!(r.expected_seq, 1);
        assert_eq!(r.buffered(), 0);
    }

    #[test]
    fn out_of_order_packet_buffered() {
        let mut r = Receiver::new();
        let ready = r.on_packet(2, b"later".to_vec());
        assert!(ready.is_empty());
        assert_eq!(r.expected_seq, 0);
        assert_eq!(r.buffered(), 1);
    }

    #[test]
    fn reorder_scenario_two_packets() {
        let mut r = Receiver::new();

        // seq=1 arrives first: buffered, cursor unchanged.
        assert!(r.on_packet(1, b"one".to_vec()).is_empty());
        assert_eq!(r.buffered(), 1);

        // seq=0 arrives: delivers both, cursor lands on 2, buffer drained.
        let ready = r.on_packet(0, b"zero".to_vec());
        assert_eq!(ready, vec![b"zero".to_vec(), b"one".to_vec()]);
        assert_eq!(r.expected_seq, 2);
        assert_eq!(r.buffered(), 0);
    }

    #[test]
    fn any_permutation_delivers_in_order() {
        let payloads: Vec<Vec<u8>> = (0..5u8).map(|i| vec![i; 3]).collect();
        let orders: [[u32; 5]; 4] = [
            [4, 3, 2, 1, 0],
            [1, 0, 3, 2, 4],
            [2, 4, 0, 1, 3],
            [0, 1, 2, 3, 4],
        ];

        for order in orders {
            let mut r = Receiver::new();
            let mut out: Vec<u8> = Vec::new();
            for seq in order {
                for p in r.on_packet(seq, payloads[seq as usize].clone()) {
                    out.extend_from_slice(&p);
                }
            }
            let expected: Vec<u8> = payloads.concat();
            assert_eq!(out, expected, "order {order:?} delivered out of order");
            assert_eq!(r.expected_seq, 5);
            assert_eq!(r.buffered(), 0);
        }
    }

    #[test]
    fn duplicate_of_delivered_packet_is_not_redelivered() {
        let mut r = Receiver::new();
        assert_eq!(r.on_packet(0, b"data".to_vec()).len(), 1);

        // The duplicate lands in the buffer under its stale key and stays
        // there; nothing is delivered twice.
        let ready = r.on_packet(0, b"data".to_vec());
        assert!(ready.is_empty());
        assert_eq!(r.expected_seq, 1);
        assert_eq!(r.buffered(), 1);
    }

    #[test]
    fn repeated_buffered_seq_overwrites() {
        let mut r = Receiver::new();
        assert!(r.on_packet(1, b"old".to_vec()).is_empty());
        assert!(r.on_packet(1, b"new".to_vec()).is_empty());
        assert_eq!(r.buffered(), 1);

        let ready = r.on_packet(0, b"zero".to_vec());
        assert_eq!(ready, vec![b"zero".to_vec(), b"new".to_vec()]);
    }

    #[test]
    fn empty_payload_advances_cursor() {
        // The terminal marker is handled as an ordinary empty data packet.
        let mut r = Receiver::new();
        let ready = r.on_packet(0, Vec::new());
        assert_eq!(ready, vec![Vec::new()]);
        assert_eq!(r.expected_seq, 1);
    }
}
