//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for the RF and network traits,
//! enabling development and testing on desktop without a transceiver.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockRf`] | [`RfDriver`] | Records transmissions, replays queued receptions, injects faults |
//! | [`MockClock`] | [`Clock`] | Controllable time source |
//! | [`MockMqtt`] | [`MqttClient`] | Captures pub/sub operations |
//! | [`StdClock`] | [`Clock`] | Real monotonic clock (`std` only) |
//!
//! # Example
//!
//! ```rust
//! use rs_fanrf::{CommandBridge, Config, FanState, FanMode, Power};
//! use rs_fanrf::hal::MockRf;
//!
//! let config = Config::default();
//! let mut bridge = CommandBridge::new(&config, MockRf::new(), 0);
//!
//! bridge.handle_message("fan/set_power", b"ON", 0).unwrap();
//!
//! // Unknown mode at boot: the default summer mode code goes out first
//! assert_eq!(bridge.transmitter().driver().transmissions, vec![(6754, 6, 8)]);
//! assert_eq!(
//!     bridge.fan_state(),
//!     FanState { mode: FanMode::Summer, level: 1, power: Power::On }
//! );
//! ```
//!
//! [`RfDriver`]: crate::traits::RfDriver
//! [`Clock`]: crate::traits::Clock
//! [`MqttClient`]: crate::traits::MqttClient

extern crate alloc;
use alloc::string::String;
use alloc::vec::Vec;

use crate::action::ReceivedCode;
use crate::traits::{Clock, MqttClient, MqttMessage, RfDriver};

// ============================================================================
// Hardware Mocks
// ============================================================================

/// Fault reported by [`MockRf`] when a failure was injected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MockRfFault;

/// Mock RF transceiver for testing.
///
/// Records every successful transmission as `(value, protocol, repeats)`
/// and hands out queued receptions in FIFO order.
///
/// # Example
///
/// ```rust
/// use rs_fanrf::hal::MockRf;
/// use rs_fanrf::traits::RfDriver;
/// use rs_fanrf::ReceivedCode;
///
/// let mut rf = MockRf::new();
/// rf.fail_next = 1;
/// assert!(rf.transmit(6834, 6, 8).is_err());
/// assert!(rf.transmit(6834, 6, 8).is_ok());
/// assert_eq!(rf.attempts, 2);
/// assert_eq!(rf.transmissions.len(), 1);
///
/// rf.queue_receive(6789, 6);
/// assert_eq!(rf.try_receive(), Some(ReceivedCode::new(6789, 6)));
/// ```
#[derive(Debug, Default)]
pub struct MockRf {
    /// Successful transmissions (value, protocol, repeats).
    pub transmissions: Vec<(u32, u8, u8)>,
    /// Codes waiting to be returned by `try_receive()`.
    pub received: Vec<ReceivedCode>,
    /// Number of upcoming `transmit` calls that fail.
    pub fail_next: u8,
    /// Total `transmit` calls, failed ones included.
    pub attempts: usize,
}

impl MockRf {
    /// Creates a new mock radio with nothing queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a code as if the physical remote had been pressed.
    pub fn queue_receive(&mut self, value: u32, protocol: u8) {
        self.received.push(ReceivedCode::new(value, protocol));
    }

    /// Make the next `count` transmissions fail.
    pub fn fail_times(mut self, count: u8) -> Self {
        self.fail_next = count;
        self
    }

    /// Values of all successful transmissions, in order.
    pub fn sent_values(&self) -> Vec<u32> {
        self.transmissions.iter().map(|(v, _, _)| *v).collect()
    }
}

impl RfDriver for MockRf {
    type Error = MockRfFault;

    fn transmit(&mut self, value: u32, protocol: u8, repeats: u8) -> Result<(), MockRfFault> {
        self.attempts += 1;
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(MockRfFault);
        }
        self.transmissions.push((value, protocol, repeats));
        Ok(())
    }

    fn try_receive(&mut self) -> Option<ReceivedCode> {
        if self.received.is_empty() {
            None
        } else {
            Some(self.received.remove(0))
        }
    }
}

/// Mock clock for testing time-dependent behavior.
///
/// # Example
///
/// ```rust
/// use rs_fanrf::hal::MockClock;
/// use rs_fanrf::traits::Clock;
///
/// let mut clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.set(1000);
/// assert_eq!(clock.now_ms(), 1000);
///
/// clock.advance(500);
/// assert_eq!(clock.now_ms(), 1500);
/// ```
#[derive(Debug)]
pub struct MockClock {
    current_ms: u64,
}

impl MockClock {
    /// Creates a new mock clock starting at 0ms.
    pub fn new() -> Self {
        Self { current_ms: 0 }
    }

    /// Sets the current time in milliseconds.
    pub fn set(&mut self, ms: u64) {
        self.current_ms = ms;
    }

    /// Advances the clock by the given duration.
    pub fn advance(&mut self, ms: u64) {
        self.current_ms += ms;
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.current_ms
    }
}

/// Monotonic clock backed by `std::time::Instant`.
#[cfg(feature = "std")]
#[derive(Debug)]
pub struct StdClock {
    start: std::time::Instant,
}

#[cfg(feature = "std")]
impl StdClock {
    /// Creates a clock whose epoch is now.
    pub fn new() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Clock for StdClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

// ============================================================================
// Network Mocks
// ============================================================================

/// Mock MQTT client for testing.
///
/// Records all publish/subscribe operations and allows injecting
/// incoming messages for testing message handling.
///
/// # Example
///
/// ```rust
/// use rs_fanrf::hal::MockMqtt;
///
/// let mut mqtt = MockMqtt::new();
///
/// // Queue incoming message
/// mqtt.queue_message("fan_control/fan/set_level", b"3".to_vec());
///
/// // Check subscriptions
/// mqtt.subscriptions.push("fan_control/fan/set_level".into());
/// assert!(mqtt.is_subscribed("fan_control/fan/set_level"));
///
/// // Check published messages
/// mqtt.published.push(("fan_control/fan/state".into(), b"{}".to_vec(), true));
/// assert_eq!(mqtt.published_to("fan_control/fan/state").len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MockMqtt {
    /// Messages that have been published (topic, payload, retain).
    pub published: Vec<(String, Vec<u8>, bool)>,
    /// Topics that have been subscribed to.
    pub subscriptions: Vec<String>,
    /// Queue of incoming messages to be returned by `try_recv()`.
    pub incoming: Vec<MqttMessage>,
    /// Whether the client is connected.
    pub connected: bool,
}

impl MockMqtt {
    /// Creates a new mock MQTT client in connected state.
    pub fn new() -> Self {
        Self {
            connected: true,
            ..Default::default()
        }
    }

    /// Queue an incoming message
    pub fn queue_message(&mut self, topic: impl Into<String>, payload: impl Into<Vec<u8>>) {
        self.incoming.push(MqttMessage {
            topic: topic.into(),
            payload: payload.into(),
        });
    }

    /// Check if a topic was subscribed to
    pub fn is_subscribed(&self, topic: &str) -> bool {
        self.subscriptions.iter().any(|t| t == topic)
    }

    /// Get published messages for a topic
    pub fn published_to(&self, topic: &str) -> Vec<&(String, Vec<u8>, bool)> {
        self.published
            .iter()
            .filter(|(t, _, _)| t == topic)
            .collect()
    }

    /// Payload of the most recent publish to a topic, as text
    pub fn last_payload(&self, topic: &str) -> Option<&str> {
        self.published
            .iter()
            .rev()
            .find(|(t, _, _)| t == topic)
            .and_then(|(_, p, _)| core::str::from_utf8(p).ok())
    }
}

impl MqttClient for MockMqtt {
    type Error = ();

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), ()> {
        if !self.connected {
            return Err(());
        }
        self.published.push((topic.into(), payload.to_vec(), retain));
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), ()> {
        self.subscriptions.push(topic.into());
        Ok(())
    }

    fn try_recv(&mut self) -> Option<MqttMessage> {
        if self.incoming.is_empty() {
            None
        } else {
            Some(self.incoming.remove(0))
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
