//! Adaptive retransmission-timeout estimation.
//!
//! Reliable delivery requires that an unacknowledged packet is re-sent if no
//! ACK arrives within a bounded time.  [`RtoEstimator`] maintains an
//! exponentially-weighted estimate of the round-trip time and its deviation
//! (Jacobson's algorithm, RFC 6298 shape with TCP's conventional weights):
//!
//! ```text
//! RTTVAR = (1 − β)·RTTVAR + β·|sample − SRTT|      β = 0.25
//! SRTT   = (1 − α)·SRTT   + α·sample               α = 0.125
//! RTO    = SRTT + 4·RTTVAR
//! ```
//!
//! The deviation is recomputed from the *pre-update* estimate, so the update
//! order above matters.  Only correctly-matched acknowledgments feed
//! samples in; timeouts and stray ACKs leave the estimate untouched, which is
//! the caller's ([`crate::transfer`]) responsibility.

use std::time::Duration;

/// Smoothing weight for the RTT estimate (TCP convention).
const ALPHA: f64 = 0.125;
/// Smoothing weight for the RTT deviation (TCP convention).
const BETA: f64 = 0.25;

/// Timeout assumed before the first round-trip sample is available.
pub const INITIAL_TIMEOUT: Duration = Duration::from_millis(500);

/// Exponentially-weighted RTT estimate for one transmitter.
///
/// Owned exclusively by a single send call; never shared.
#[derive(Debug, Clone)]
pub struct RtoEstimator {
    /// Smoothed round-trip time estimate, in seconds (SRTT).
    pub estimated_rtt: f64,
    /// Smoothed deviation of the round-trip time, in seconds (RTTVAR).
    pub dev_rtt: f64,
}

impl Default for RtoEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl RtoEstimator {
    /// Construct an estimator in its initial state:
    /// `estimated_rtt = INITIAL_TIMEOUT`, `dev_rtt = 0`.
    pub fn new() -> Self {
        Self {
            estimated_rtt: INITIAL_TIMEOUT.as_secs_f64(),
            dev_rtt: 0.0,
        }
    }

    /// Fold one measured round-trip sample into the estimate.
    ///
    /// Deviation first (from the pre-update estimate), then the estimate.
    pub fn record_sample(&mut self, sample: Duration) {
        let s = sample.as_secs_f64();
        self.dev_rtt = (1.0 - BETA) * self.dev_rtt + BETA * (s - self.estimated_rtt).abs();
        self.estimated_rtt = (1.0 - ALPHA) * self.estimated_rtt + ALPHA * s;
    }

    /// Current retransmission timeout: `estimated_rtt + 4·dev_rtt`.
    ///
    /// Always strictly positive: the estimate starts positive and an EWMA of
    /// non-negative samples never reaches zero.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.estimated_rtt + 4.0 * self.dev_rtt)
    }
}
