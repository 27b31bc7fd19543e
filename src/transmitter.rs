//! Serialized RF transmission with spacing, retry and preemption.
//!
//! The receiver drops frames that arrive too close together, so every
//! transmission is separated by at least `rf.min_gap_ms`. The transmitter
//! never sleeps: when the gap has not elapsed it reports
//! [`TxStatus::Deferred`] and the caller comes back on a later tick.
//!
//! Multi-step plans go through a small queue. A new plan replaces whatever
//! is still pending (preemption); steps already sent stay sent.
//!
//! # Example
//!
//! ```rust
//! use rs_fanrf::{RfCode, Transmitter, TxStatus};
//! use rs_fanrf::config::RfConfig;
//! use rs_fanrf::hal::MockRf;
//!
//! let mut tx = Transmitter::new(MockRf::new(), &RfConfig::default());
//! let code = RfCode::new(6656, 6, 8);
//!
//! assert_eq!(tx.send(code, 0), Ok(TxStatus::Sent));
//! assert_eq!(tx.send(code, 100), Ok(TxStatus::Deferred { ready_at_ms: 300 }));
//! assert_eq!(tx.send(code, 300), Ok(TxStatus::Sent));
//! assert_eq!(tx.driver().transmissions.len(), 2);
//! ```

use heapless::Deque;
use log::{debug, error, warn};

use crate::action::RfCode;
use crate::config::RfConfig;
use crate::error::FanError;
use crate::plan::MAX_PLAN_STEPS;
use crate::traits::RfDriver;

/// Result of a single send attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxStatus {
    /// The driver accepted the code.
    Sent,
    /// The quiet interval has not elapsed; nothing was transmitted.
    Deferred {
        /// Earliest time a transmission is allowed.
        ready_at_ms: u64,
    },
}

/// Owns the RF driver and serializes everything sent through it.
pub struct Transmitter<R: RfDriver> {
    driver: R,
    min_gap_ms: u32,
    retries: u8,
    queue: Deque<RfCode, MAX_PLAN_STEPS>,
    last_tx_ms: Option<u64>,
}

impl<R: RfDriver> Transmitter<R> {
    /// Create a transmitter with the spacing and retry policy from `rf`.
    pub fn new(driver: R, rf: &RfConfig) -> Self {
        Self {
            driver,
            min_gap_ms: rf.min_gap_ms,
            retries: rf.tx_retries,
            queue: Deque::new(),
            last_tx_ms: None,
        }
    }

    /// Time at which the next transmission is allowed, if it is still in the future.
    pub fn ready_at(&self, now_ms: u64) -> Option<u64> {
        let last = self.last_tx_ms?;
        let ready = last.saturating_add(u64::from(self.min_gap_ms));
        (ready > now_ms).then_some(ready)
    }

    /// Transmit one code now, or report when it can go out.
    ///
    /// A driver error is retried immediately up to `rf.tx_retries` times.
    /// When every attempt fails the result is [`FanError::TransmitFault`]
    /// and the receiver may or may not have seen the code.
    pub fn send(&mut self, code: RfCode, now_ms: u64) -> Result<TxStatus, FanError> {
        if let Some(ready_at_ms) = self.ready_at(now_ms) {
            return Ok(TxStatus::Deferred { ready_at_ms });
        }

        let attempts = self.retries.saturating_add(1);
        for attempt in 1..=attempts {
            match self
                .driver
                .transmit(code.value, code.protocol, code.repeats)
            {
                Ok(()) => {
                    self.last_tx_ms = Some(now_ms);
                    debug!(
                        "RF tx {} (protocol {}, repeats {})",
                        code.value, code.protocol, code.repeats
                    );
                    return Ok(TxStatus::Sent);
                }
                Err(e) => {
                    warn!(
                        "RF tx {} attempt {}/{} failed: {:?}",
                        code.value, attempt, attempts, e
                    );
                }
            }
        }

        self.last_tx_ms = Some(now_ms);
        error!("RF tx {} failed after {} attempts", code.value, attempts);
        Err(FanError::TransmitFault {
            code: code.value,
            attempts,
        })
    }

    /// Replace the pending queue with `codes`.
    ///
    /// Returns how many previously pending codes were abandoned.
    pub fn enqueue(&mut self, codes: &[RfCode]) -> usize {
        let abandoned = self.clear();
        if abandoned > 0 {
            debug!("preempted {} pending RF step(s)", abandoned);
        }
        for code in codes {
            if self.queue.push_back(*code).is_err() {
                warn!("RF queue full, dropping code {}", code.value);
            }
        }
        abandoned
    }

    /// Send the next queued code if the gap allows.
    ///
    /// Returns the code that went out, or `None` when the queue is empty or
    /// the gap has not elapsed. A fault drops the rest of the queue.
    pub fn poll(&mut self, now_ms: u64) -> Result<Option<RfCode>, FanError> {
        let Some(code) = self.queue.front().copied() else {
            return Ok(None);
        };
        if self.ready_at(now_ms).is_some() {
            return Ok(None);
        }
        self.queue.pop_front();
        match self.send(code, now_ms) {
            Ok(TxStatus::Sent) => Ok(Some(code)),
            Ok(TxStatus::Deferred { .. }) => {
                let _ = self.queue.push_front(code);
                Ok(None)
            }
            Err(e) => {
                self.queue.clear();
                Err(e)
            }
        }
    }

    /// Abandon every pending code. Returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.queue.len();
        self.queue.clear();
        dropped
    }

    /// Number of codes waiting to be sent.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// True when nothing is queued.
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    /// Time of the last transmission attempt.
    pub fn last_tx_ms(&self) -> Option<u64> {
        self.last_tx_ms
    }

    /// Borrow the driver.
    pub fn driver(&self) -> &R {
        &self.driver
    }

    /// Mutably borrow the driver (used to drain receptions).
    pub fn driver_mut(&mut self) -> &mut R {
        &mut self.driver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::MockRf;

    fn code(value: u32) -> RfCode {
        RfCode::new(value, 6, 8)
    }

    fn tx() -> Transmitter<MockRf> {
        Transmitter::new(MockRf::new(), &RfConfig::default())
    }

    #[test]
    fn first_send_is_immediate() {
        let mut tx = tx();
        assert_eq!(tx.send(code(1), 0), Ok(TxStatus::Sent));
        assert_eq!(tx.driver().transmissions, vec![(1, 6, 8)]);
        assert_eq!(tx.last_tx_ms(), Some(0));
    }

    #[test]
    fn gap_defers_without_touching_driver() {
        let mut tx = tx();
        tx.send(code(1), 1000).unwrap();
        assert_eq!(
            tx.send(code(2), 1299),
            Ok(TxStatus::Deferred { ready_at_ms: 1300 })
        );
        assert_eq!(tx.driver().attempts, 1);
    }

    #[test]
    fn single_retry_recovers() {
        let mut tx = Transmitter::new(MockRf::new().fail_times(1), &RfConfig::default());
        assert_eq!(tx.send(code(7), 0), Ok(TxStatus::Sent));
        assert_eq!(tx.driver().attempts, 2);
    }

    #[test]
    fn persistent_failure_is_fault() {
        let mut tx = Transmitter::new(MockRf::new().fail_times(5), &RfConfig::default());
        assert_eq!(
            tx.send(code(7), 0),
            Err(FanError::TransmitFault {
                code: 7,
                attempts: 2
            })
        );
        assert!(tx.driver().transmissions.is_empty());
        // the failed attempt still occupies the channel
        assert!(tx.ready_at(100).is_some());
    }

    #[test]
    fn configured_retries() {
        let rf = RfConfig::default().with_tx_retries(3);
        let mut tx = Transmitter::new(MockRf::new().fail_times(3), &rf);
        assert_eq!(tx.send(code(7), 0), Ok(TxStatus::Sent));
        assert_eq!(tx.driver().attempts, 4);
    }

    #[test]
    fn queue_respects_gap() {
        let mut tx = tx();
        tx.enqueue(&[code(1), code(2)]);
        assert_eq!(tx.poll(0), Ok(Some(code(1))));
        assert_eq!(tx.poll(100), Ok(None));
        assert_eq!(tx.pending(), 1);
        assert_eq!(tx.poll(300), Ok(Some(code(2))));
        assert!(tx.is_idle());
        assert_eq!(tx.poll(1000), Ok(None));
    }

    #[test]
    fn enqueue_preempts_pending() {
        let mut tx = tx();
        tx.enqueue(&[code(1), code(2)]);
        tx.poll(0).unwrap();
        assert_eq!(tx.enqueue(&[code(3)]), 1);
        assert_eq!(tx.poll(300), Ok(Some(code(3))));
        assert_eq!(tx.driver().sent_values(), vec![1, 3]);
    }

    #[test]
    fn fault_drops_queue() {
        let mut tx = Transmitter::new(MockRf::new().fail_times(2), &RfConfig::default());
        tx.enqueue(&[code(1), code(2)]);
        assert!(matches!(tx.poll(0), Err(FanError::TransmitFault { .. })));
        assert!(tx.is_idle());
    }

    #[test]
    fn zero_gap_allows_back_to_back() {
        let rf = RfConfig::default().with_min_gap_ms(0);
        let mut tx = Transmitter::new(MockRf::new(), &rf);
        assert_eq!(tx.send(code(1), 5), Ok(TxStatus::Sent));
        assert_eq!(tx.send(code(2), 5), Ok(TxStatus::Sent));
    }

    #[test]
    fn clear_reports_dropped() {
        let mut tx = tx();
        tx.enqueue(&[code(1), code(2), code(3)]);
        assert_eq!(tx.clear(), 3);
        assert_eq!(tx.clear(), 0);
    }
}
