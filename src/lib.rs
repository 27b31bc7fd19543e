//! # rs-fanrf
//!
//! Core of an RF bridge for remote-controlled ceiling fans with a light.
//! The fan receiver has no feedback channel, so the bridge keeps an
//! emulated fan and light state and turns MQTT commands into the minimal
//! sequence of one-way RF codes that moves the device there.
//!
//! ## Features
//!
//! - **Thirteen primitive actions**: light on/off/min/max, fan off, summer and
//!   winter mode, and on/min/max per mode
//! - **Planning**: power, mode and addressed levels are snapped to the
//!   endpoints the remote can reach and planned as a short code sequence
//! - **Pacing**: a minimum inter-frame gap with bounded retries; a new plan
//!   preempts whatever is still queued
//! - **Learning**: capture codes from the original remote, one slot or every
//!   unbound slot in turn, with repeat confirmation and a deadline
//! - **Reconciliation**: codes from the physical remote update the emulated
//!   state
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `action` - Primitive actions and raw RF codes
//! - `code_table` - Action to code bindings
//! - `fan`, `light` - Emulated state machines and planners
//! - `transmitter` - Paced, retrying transmit queue
//! - `learning` - Code capture from the physical remote
//! - `commands` - MQTT topic/payload parsing
//! - `bridge` - Ties everything together behind one non-blocking API
//! - `traits` / `hal` - Hardware and network abstractions, mocks
//! - `services` - MQTT control loop (and the `rumqttc` client with `mqtt`)
//!
//! ## Example
//!
//! ```rust
//! use rs_fanrf::{BridgeEvent, CommandBridge, Config, FanMode, FanState, Power};
//! use rs_fanrf::hal::MockRf;
//!
//! let config = Config::default();
//! let mut bridge = CommandBridge::new(&config, MockRf::new(), 0);
//! bridge.drain_events(); // startup warnings about the shipped duplicate codes
//!
//! bridge.handle_message("fan/set_mode", b"winter", 0).unwrap();
//! bridge.handle_message("fan/set_level", b"6", 0).unwrap();
//!
//! // the second code waits for the inter-frame gap
//! assert_eq!(bridge.transmitter().driver().sent_values(), vec![6755]);
//! bridge.tick(300);
//! assert_eq!(bridge.transmitter().driver().sent_values(), vec![6755, 6751]);
//!
//! assert_eq!(
//!     bridge.fan_state(),
//!     FanState { mode: FanMode::Winter, level: 6, power: Power::On }
//! );
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Primitive actions, domains and raw RF codes.
pub mod action;
/// Command bridge tying planners, transmitter and learning together.
pub mod bridge;
/// Binding table from actions to RF codes.
pub mod code_table;
/// Inbound command vocabulary and parsing.
pub mod commands;
/// Error type shared by every module.
pub mod error;
/// Emulated fan state machine and planner.
pub mod fan;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Code learning from the physical remote.
pub mod learning;
/// Emulated light state machine and planner.
pub mod light;
/// Plans, power state and level snapping.
pub mod plan;
/// Core traits for hardware and network abstraction.
pub mod traits;
/// Paced, retrying RF transmit queue.
pub mod transmitter;

/// Configuration for the RF profile, code table, MQTT and learning.
pub mod config;

/// JSON request types for the MQTT surface (serde-based).
#[cfg(feature = "serde")]
pub mod messages;

/// MQTT control loop and clients.
#[cfg(all(feature = "std", feature = "serde-json-core"))]
pub mod services;

// Re-exports for convenience
pub use action::{Action, Domain, ReceivedCode, RfCode, ACTION_COUNT};
pub use bridge::{BridgeEvent, CodeBinding, CommandBridge, ConfigReport};
pub use code_table::{CodeTable, Rebind};
pub use commands::{Command, CommandOutcome, COMMAND_TOPICS};
pub use error::FanError;
pub use fan::{FanMachine, FanMode, FanRequest, FanState};
pub use learning::{LearningController, LearningEvent, LearningState};
pub use light::{LightMachine, LightRequest, LightState};
pub use plan::{LevelPolicy, Plan, Power};
pub use traits::{Clock, MqttClient, MqttMessage, RfDriver};
pub use transmitter::{Transmitter, TxStatus};

// Config re-exports
pub use config::{
    CodeConfig, Config, DeviceConfig, FanConfig, LearningConfig, LightConfig, MqttConfig,
    RfConfig, WifiConfig,
};

// Parsing function re-exports (serde-json-core based)
#[cfg(feature = "serde-json-core")]
pub use messages::{
    parse_action_request, parse_level_request, parse_mode_request, parse_power_request,
};
