//! `stopwait` — a TCP-like reliable byte stream over an unreliable
//! datagram channel, using strict stop-and-wait acknowledgment.
//!
//! # Architecture
//!
//! ```text
//!  caller bytes                              output sink
//!      │                                          ▲
//!      ▼                                          │
//!  ┌──────────────┐  DATA (seq + payload)  ┌──────┴───────┐
//!  │ transfer::send│───────────────────────▶│transfer::recv│
//!  │  (segment +   │                        │ (resequence +│
//!  │   retry loop) │◀───────────────────────│    ack)      │
//!  └──────┬───────┘     ACK (seq only)      └──────┬───────┘
//!         │                                        │
//!  ┌──────▼────────────────────────────────────────▼───────┐
//!  │                   Channel (trait)                     │
//!  │   unreliable, MTU-bounded frames; may lose/reorder    │
//!  └──────┬────────────────────────────────────────┬───────┘
//!         │                                        │
//!    UdpChannel                           sim::SimChannel (tests)
//! ```
//!
//! Each module has a single responsibility:
//! - [`packet`]   — wire format (serialise / deserialise)
//! - [`rto`]      — adaptive retransmission-timeout estimation (EWMA RTT)
//! - [`sender`]   — stop-and-wait outbound state (cursor + RTT estimate)
//! - [`receiver`] — inbound resequencing with an out-of-order buffer
//! - [`transfer`] — the send/retry and receive/ack loops
//! - [`channel`]  — the unreliable datagram channel seam + UDP impl
//! - [`sim`]      — deterministic lossy/reordering channel for testing

pub mod channel;
pub mod packet;
pub mod receiver;
pub mod rto;
pub mod sender;
pub mod sim;
pub mod transfer;
