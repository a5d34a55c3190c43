//! Deterministic in-memory channel pair for testing.
//!
//! Real networks drop and reorder packets.  To exercise the reliability
//! mechanisms without depending on actual network conditions, [`pair`]
//! builds two connected [`SimChannel`] endpoints over in-process queues and
//! applies a configurable, fully deterministic fault plan per direction:
//!
//! | Fault       | Plan field  | Effect                                        |
//! |-------------|-------------|-----------------------------------------------|
//! | Packet loss | `drop`      | Discard the frames at these outbound indices. |
//! | Reordering  | `delay_one` | Hold one frame back until after the next send,|
//! |             |             | letting its successor overtake it.            |
//!
//! Outbound frames are counted per endpoint starting at 0, retransmissions
//! and acknowledgments included, so a test names exactly which wire events
//! it perturbs and failures are reproducible without a seeded RNG.
//!
//! Dropping an endpoint closes its direction: the peer's next `recv` yields
//! a zero-length read, the channel's end-of-stream signal.  Frames sent
//! towards an already-dropped peer are silently lost, as on any unreliable
//! channel.

use std::future::Future;
use std::io;

use tokio::sync::{mpsc, Mutex};

use crate::channel::Channel;

/// Deterministic fault schedule for one endpoint's outbound frames.
#[derive(Debug, Clone, Default)]
pub struct FaultPlan {
    /// Outbound frame indices to silently discard.
    pub drop: Vec<usize>,
    /// Outbound frame index to hold back until the next successful send.
    pub delay_one: Option<usize>,
}

#[derive(Debug, Default)]
struct FaultState {
    plan: FaultPlan,
    /// Total outbound frames seen so far (the next frame's index).
    sent: usize,
    /// Frame held back by `delay_one`, released after the next delivery.
    held: Option<Vec<u8>>,
}

/// One endpoint of an in-memory unreliable channel.
#[derive(Debug)]
pub struct SimChannel {
    tx: mpsc::UnboundedSender<Vec<u8>>,
    rx: Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
    faults: Mutex<FaultState>,
}

/// Build two connected endpoints with fault-free plans.
pub fn pair() -> (SimChannel, SimChannel) {
    let (a_tx, a_rx) = mpsc::unbounded_channel();
    let (b_tx, b_rx) = mpsc::unbounded_channel();
    (SimChannel::new(a_tx, b_rx), SimChannel::new(b_tx, a_rx))
}

impl SimChannel {
    fn new(tx: mpsc::UnboundedSender<Vec<u8>>, rx: mpsc::UnboundedReceiver<Vec<u8>>) -> Self {
        Self {
            tx,
            rx: Mutex::new(rx),
            faults: Mutex::new(FaultState::default()),
        }
    }

    /// Install a fault schedule for this endpoint's outbound frames.
    pub async fn set_faults(&self, plan: FaultPlan) {
        self.faults.lock().await.plan = plan;
    }
}

impl Channel for SimChannel {
    fn send(&self, frame: &[u8]) -> impl Future<Output = io::Result<()>> + Send {
        async move {
            let mut out: Vec<Vec<u8>> = Vec::new();
            {
                let mut st = self.faults.lock().await;
                let idx = st.sent;
                st.sent += 1;

                if st.plan.drop.contains(&idx) {
                    log::trace!("[sim] dropping outbound frame #{idx}");
                } else if st.plan.delay_one == Some(idx) {
                    log::trace!("[sim] holding back outbound frame #{idx}");
                    st.held = Some(frame.to_vec());
                } else {
                    out.push(frame.to_vec());
                    if let Some(held) = st.held.take() {
                        out.push(held);
                    }
                }
            }
            for f in out {
                // A closed peer is indistinguishable from loss in transit.
                let _ = self.tx.send(f);
            }
            Ok(())
        }
    }

    fn recv(&self, max_len: usize) -> impl Future<Output = io::Result<Vec<u8>>> + Send {
        async move {
            let mut rx = self.rx.lock().await;
            match rx.recv().await {
                Some(mut frame) => {
                    frame.truncate(max_len);
                    Ok(frame)
                }
                // Peer endpoint dropped: end-of-stream.
                None => Ok(Vec::new()),
            }
        }
    }
}
