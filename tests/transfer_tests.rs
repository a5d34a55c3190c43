//! Integration tests for the stop-and-wait transfer loops.
//!
//! Each test spins up the two endpoints of a deterministic in-memory channel
//! pair ([`stopwait::sim`]) and runs sender and receiver as separate tokio
//! tasks so they make progress concurrently.  Tests that depend on the
//! retransmission timeout run with a paused clock (`start_paused`), so timer
//! waits auto-advance and the fault schedule alone decides the outcome.

use stopwait::channel::Channel;
use stopwait::packet::Packet;
use stopwait::sim::{self, FaultPlan};
use stopwait::transfer::{self, SendConfig, TransferError};

const MTU: usize = 1024;

/// Deterministic test payload of the given length.
fn test_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

// ---------------------------------------------------------------------------
// Test 1: lossless round-trip over multiple chunks
// ---------------------------------------------------------------------------

#[tokio::test]
async fn round_trip_lossless() {
    let (tx_chan, rx_chan) = sim::pair();
    let data = test_bytes(10_000); // ~10 chunks at MTU 1024

    let expected = data.clone();
    let sender = tokio::spawn(async move {
        let config = SendConfig::new(MTU);
        transfer::send(&tx_chan, &data, &config).await
        // tx_chan drops here, closing the channel for the receiver.
    });

    let receiver = tokio::spawn(async move {
        let mut sink = Vec::new();
        let n = transfer::recv(&rx_chan, &mut sink, MTU).await?;
        Ok::<_, TransferError>((n, sink))
    });

    let (sr, rr) = tokio::join!(sender, receiver);
    sr.unwrap().expect("send failed");
    let (n, sink) = rr.unwrap().expect("recv failed");

    assert_eq!(n, expected.len());
    assert_eq!(sink, expected);
}

// ---------------------------------------------------------------------------
// Test 2: segmentation — frames on the wire for "ab" at MAX_PAYLOAD = 1
// ---------------------------------------------------------------------------

#[tokio::test]
async fn segmentation_emits_consecutive_frames_and_terminal() {
    // MTU 5 leaves exactly one payload byte per packet.
    let (tx_chan, peer) = sim::pair();

    let sender = tokio::spawn(async move {
        let config = SendConfig::new(5);
        transfer::send(&tx_chan, b"ab", &config).await
    });

    // Scripted peer: record every frame, acknowledge whatever arrives.
    let scripted = tokio::spawn(async move {
        let mut frames = Vec::new();
        loop {
            let buf = peer.recv(5).await.unwrap();
            if buf.is_empty() {
                break;
            }
            let pkt = Packet::decode(&buf).unwrap();
            let seq = pkt.seq;
            frames.push(pkt);
            peer.send(&Packet::header_only(seq).encode()).await.unwrap();
        }
        frames
    });

    let (sr, fr) = tokio::join!(sender, scripted);
    sr.unwrap().expect("send failed");
    let frames = fr.unwrap();

    let expected = vec![
        Packet {
            seq: 0,
            payload: b"a".to_vec(),
        },
        Packet {
            seq: 1,
            payload: b"b".to_vec(),
        },
        Packet::header_only(2), // terminal marker = chunk count
    ];
    assert_eq!(frames, expected);
}

// ---------------------------------------------------------------------------
// Test 3: receiver contract — acks echo the received seq, loop ends on the
// empty read only
// ---------------------------------------------------------------------------

#[tokio::test]
async fn receiver_acks_each_frame_and_stops_on_empty_read() {
    let (driver, rx_chan) = sim::pair();

    let receiver = tokio::spawn(async move {
        let mut sink = Vec::new();
        let n = transfer::recv(&rx_chan, &mut sink, 5).await.unwrap();
        (n, sink)
    });

    // Feed (0,"a"), (1,"b"), terminal (2,"") by hand, checking each ack.
    for (seq, payload) in [(0u32, &b"a"[..]), (1, b"b"), (2, b"")] {
        let frame = Packet {
            seq,
            payload: payload.to_vec(),
        };
        driver.send(&frame.encode()).await.unwrap();
        let ack = Packet::decode(&driver.recv(4).await.unwrap()).unwrap();
        assert_eq!(ack.seq, seq);
        assert!(ack.payload.is_empty());
    }

    // The terminal marker did not end the loop; closing the channel does.
    drop(driver);
    let (n, sink) = receiver.await.unwrap();
    assert_eq!(n, 2);
    assert_eq!(sink, b"ab");
}

// ---------------------------------------------------------------------------
// Test 4: a lost data frame is recovered by retransmission
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn lost_data_frame_is_retransmitted() {
    let (tx_chan, rx_chan) = sim::pair();
    // Outbound frame #0 is the first DATA packet; it vanishes in transit.
    tx_chan
        .set_faults(FaultPlan {
            drop: vec![0],
            ..Default::default()
        })
        .await;

    let data = test_bytes(3_000);
    let expected = data.clone();

    let sender = tokio::spawn(async move {
        let config = SendConfig::new(MTU);
        transfer::send(&tx_chan, &data, &config).await
    });
    let receiver = tokio::spawn(async move {
        let mut sink = Vec::new();
        let n = transfer::recv(&rx_chan, &mut sink, MTU).await.unwrap();
        (n, sink)
    });

    let (sr, rr) = tokio::join!(sender, receiver);
    sr.unwrap().expect("send failed");
    let (n, sink) = rr.unwrap();

    assert_eq!(n, expected.len());
    assert_eq!(sink, expected);
}

// ---------------------------------------------------------------------------
// Test 5: a lost ACK triggers a resend but never duplicates output
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn lost_ack_does_not_duplicate_output() {
    let (tx_chan, rx_chan) = sim::pair();
    // Outbound frame #0 of the receiver is the ACK for seq=0.
    rx_chan
        .set_faults(FaultPlan {
            drop: vec![0],
            ..Default::default()
        })
        .await;

    let data = test_bytes(2_500);
    let expected = data.clone();

    let sender = tokio::spawn(async move {
        let config = SendConfig::new(MTU);
        transfer::send(&tx_chan, &data, &config).await
    });
    let receiver = tokio::spawn(async move {
        let mut sink = Vec::new();
        let n = transfer::recv(&rx_chan, &mut sink, MTU).await.unwrap();
        (n, sink)
    });

    let (sr, rr) = tokio::join!(sender, receiver);
    sr.unwrap().expect("send failed");
    let (n, sink) = rr.unwrap();

    // The duplicate of seq=0 must not reach the sink a second time.
    assert_eq!(n, expected.len());
    assert_eq!(sink, expected);
}

// ---------------------------------------------------------------------------
// Test 6: a delayed (reordered) ACK exercises the immediate-resend path
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn delayed_ack_forces_immediate_resend() {
    let (tx_chan, rx_chan) = sim::pair();
    // Hold the ACK for seq=0 back until the receiver's next send, so the
    // sender first times out and later reads a stale duplicate ACK while
    // waiting on seq=1.
    rx_chan
        .set_faults(FaultPlan {
            delay_one: Some(0),
            ..Default::default()
        })
        .await;

    let sender = tokio::spawn(async move {
        let config = SendConfig::new(5); // one payload byte per packet
        transfer::send(&tx_chan, b"ab", &config).await
    });
    let receiver = tokio::spawn(async move {
        let mut sink = Vec::new();
        let n = transfer::recv(&rx_chan, &mut sink, 5).await.unwrap();
        (n, sink)
    });

    let (sr, rr) = tokio::join!(sender, receiver);
    sr.unwrap().expect("send failed");
    let (n, sink) = rr.unwrap();

    assert_eq!(n, 2);
    assert_eq!(sink, b"ab");
}

// ---------------------------------------------------------------------------
// Test 7: bounded-retry extension point surfaces total loss as an error
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn retry_limit_exceeded_under_total_loss() {
    let (tx_chan, rx_chan) = sim::pair();
    // Every outbound frame from the sender is dropped.
    tx_chan
        .set_faults(FaultPlan {
            drop: (0..64).collect(),
            ..Default::default()
        })
        .await;

    let sender = tokio::spawn(async move {
        let config = SendConfig::new(MTU).with_retry_limit(3);
        transfer::send(&tx_chan, b"doomed", &config).await
    });
    let receiver = tokio::spawn(async move {
        let mut sink = Vec::new();
        transfer::recv(&rx_chan, &mut sink, MTU).await.map(|n| (n, sink))
    });

    let (sr, rr) = tokio::join!(sender, receiver);
    let err = sr.unwrap().expect_err("send must give up");
    assert!(
        matches!(err, TransferError::RetriesExceeded { seq: 0, .. }),
        "unexpected error: {err}"
    );

    // Nothing ever reached the receiver.
    let (n, sink) = rr.unwrap().expect("recv failed");
    assert_eq!(n, 0);
    assert!(sink.is_empty());
}

// ---------------------------------------------------------------------------
// Test 8: empty input produces only the terminal marker
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_input_delivers_zero_bytes() {
    let (tx_chan, rx_chan) = sim::pair();

    let sender = tokio::spawn(async move {
        let config = SendConfig::new(MTU);
        transfer::send(&tx_chan, b"", &config).await
    });
    let receiver = tokio::spawn(async move {
        let mut sink = Vec::new();
        let n = transfer::recv(&rx_chan, &mut sink, MTU).await.unwrap();
        (n, sink)
    });

    let (sr, rr) = tokio::join!(sender, receiver);
    sr.unwrap().expect("send failed");
    let (n, sink) = rr.unwrap();

    assert_eq!(n, 0);
    assert!(sink.is_empty());
}
