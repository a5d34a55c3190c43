//! Wire-format definitions for protocol packets.
//!
//! Every frame exchanged between peers is a [`Packet`].  This module is
//! responsible for:
//! - Defining the on-wire binary layout (header plus payload).
//! - Serialising a [`Packet`] into a byte buffer ready for transmission.
//! - Deserialising a raw byte slice back into a [`Packet`], returning an
//!   error for truncated input.
//!
//! No I/O happens here — this is pure data transformation.
//!
//! # Wire format
//!
//! All multi-byte integers are **big-endian**.
//!
//! ```text
//!  0               1               2               3
//!  0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                        Sequence Number                        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                        Payload ...                            |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! Total header size: [`HEADER_LEN`] = 4 bytes.  Three packet kinds share
//! this single layout:
//! - **data**: header followed by up to MAX_PAYLOAD payload bytes,
//! - **acknowledgment**: header only, echoing a received sequence number,
//! - **terminal marker**: header only, sequence number = total chunk count.

/// Byte length of the fixed-size header on the wire.
pub const HEADER_LEN: usize = 4;

/// A complete protocol frame: sequence number + payload bytes.
///
/// Acknowledgments and the terminal marker are ordinary [`Packet`]s with an
/// empty payload; nothing on the wire distinguishes them besides context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Per-packet sequence number (consecutive integers starting at 0).
    pub seq: u32,
    /// Payload bytes; empty for acknowledgments and the terminal marker.
    pub payload: Vec<u8>,
}

impl Packet {
    /// Build a header-only packet (acknowledgment or terminal marker).
    pub fn header_only(seq: u32) -> Self {
        Self {
            seq,
            payload: Vec::new(),
        }
    }

    /// Serialise this packet into a newly allocated byte vector.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_LEN + self.payload.len());
        buf.extend_from_slice(&self.seq.to_be_bytes());
        buf.extend_from_slice(&self.payload);
        buf
    }

    /// Parse a [`Packet`] from a raw byte slice.
    ///
    /// Returns [`PacketError::BufferTooShort`] if `buf` cannot hold the
    /// 4-byte header.  Everything after the header is payload; there is no
    /// length field and no checksum to verify.
    pub fn decode(buf: &[u8]) -> Result<Self, PacketError> {
        if buf.len() < HEADER_LEN {
            return Err(PacketError::BufferTooShort);
        }
        let seq = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
        Ok(Packet {
            seq,
            payload: buf[HEADER_LEN..].to_vec(),
        })
    }
}

/// Errors that can arise when parsing a raw frame.
#[derive(Debug, PartialEq, Eq)]
pub enum PacketError {
    /// Buffer shorter than the fixed header size.
    BufferTooShort,
}

impl std::fmt::Display for PacketError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PacketError::BufferTooShort => write!(f, "buffer too short to contain a header"),
        }
    }
}

impl std::error::Error for PacketError {}
