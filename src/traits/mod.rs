//! Trait definitions for the RF hardware and the MQTT transport.
//!
//! These abstractions let the bridge core run unchanged on the device, on a
//! desktop with a dry-run radio, and inside tests with the mocks from
//! [`crate::hal`].
//!
//! # Submodules
//!
//! - `hardware`: RF transceiver driver and monotonic clock
//! - `network`: sync-first MQTT client
//!
//! # Hardware Abstraction
//!
//! - [`RfDriver`]: transmit a raw code, poll for received codes
//! - [`Clock`]: monotonic millisecond time source for `no_std` environments

pub mod hardware;
pub mod network;

pub use hardware::*;
pub use network::*;
