//! Network services wiring the bridge to MQTT.
//!
//! - [`runner`]: platform-agnostic control loop over any [`MqttClient`]
//! - `mqtt` feature: `RumqttcClient`, a `rumqttc` + tokio implementation
//!
//! [`MqttClient`]: crate::traits::MqttClient

pub mod runner;

#[cfg(feature = "mqtt")]
pub mod mqtt;

pub use runner::BridgeRunner;

#[cfg(feature = "mqtt")]
pub use mqtt::{MqttError, RumqttcClient};
