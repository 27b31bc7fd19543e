//! Network abstraction trait for MQTT.
//!
//! The bridge is reached over an MQTT broker. Commands arrive on topics
//! below the configured prefix and state is published back beside them:
//!
//! ```text
//! fan_control/fan/set_level    - Set fan speed: "3" or {"level":3}
//! fan_control/light/set_power  - Light on/off: "ON" or {"state":"ON"}
//! fan_control/learning/start   - Begin learning the unbound codes
//! fan_control/fan/state        - Current fan snapshot (retained)
//! fan_control/codes/light_min  - Learned code for persistence (retained)
//! ```

extern crate alloc;
use alloc::string::String;
use alloc::vec::Vec;

// ============================================================================
// MQTT Client Trait (Sync-First Design)
// ============================================================================

/// MQTT client trait for pub/sub messaging.
///
/// This trait uses a **sync-first design** that works on both ESP32 (blocking I/O)
/// and desktop, where a background thread drives the connection and feeds
/// received messages into a channel.
///
/// # Implementation Notes
///
/// - `publish` and `subscribe` are synchronous (blocking on ESP32)
/// - `try_recv` is non-blocking for polling patterns
/// - The client should handle reconnection internally
///
/// # Example
///
/// ```rust,ignore
/// use rs_fanrf::traits::MqttClient;
///
/// fn publish_level<M: MqttClient>(client: &mut M, level: u8) {
///     let payload = format!("{}", level);
///     client.publish("fan_control/fan/level", payload.as_bytes(), true).unwrap();
/// }
/// ```
pub trait MqttClient {
    /// Error type for MQTT operations.
    type Error;

    /// Publish a message to a topic (blocking).
    ///
    /// # Arguments
    /// - `topic`: MQTT topic path
    /// - `payload`: Message bytes
    /// - `retain`: If true, broker keeps message for new subscribers
    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), Self::Error>;

    /// Subscribe to a topic (blocking).
    ///
    /// Supports wildcards: `fan_control/#` or `fan_control/+/set_power`
    fn subscribe(&mut self, topic: &str) -> Result<(), Self::Error>;

    /// Try to receive the next message (non-blocking).
    ///
    /// Returns `None` if no message is available. This should never block.
    fn try_recv(&mut self) -> Option<MqttMessage>;

    /// Check if connected to broker.
    fn is_connected(&self) -> bool;
}

/// An MQTT message received from a subscription.
///
/// Contains the topic and payload of a published message.
#[derive(Clone, Debug)]
pub struct MqttMessage {
    /// Topic the message was published to.
    pub topic: String,
    /// Message payload as raw bytes.
    pub payload: Vec<u8>,
}

impl MqttMessage {
    /// Create a new MQTT message.
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }

    /// Returns the payload as a UTF-8 string, if valid.
    pub fn payload_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.payload).ok()
    }
}
