//! Error taxonomy for the bridge core.
//!
//! None of these errors is fatal. Each one is local to the command, receive
//! event or tick that produced it; the control loop logs it (and for some
//! variants publishes it as a telemetry event) and keeps running.

use crate::action::{Action, Domain};
use crate::config::ShortString;

/// Every fallible operation in the core funnels into this type.
///
/// It is `Clone + Eq` so it can travel inside outbound
/// [`BridgeEvent`](crate::BridgeEvent)s.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FanError {
    /// No RF code is bound for the action. The action is skipped; other
    /// actions keep working.
    #[error("no RF code bound for {0}")]
    NotBound(Action),

    /// The RF driver reported a hardware fault on every attempt. The
    /// command may or may not have reached the receiver.
    #[error("RF transmit of code {code} failed after {attempts} attempts")]
    TransmitFault {
        /// Code value that failed to go out.
        code: u32,
        /// Number of driver calls made.
        attempts: u8,
    },

    /// Inbound message did not map to a known command or had an unusable payload.
    #[error("unrecognized command: {0}")]
    UnrecognizedCommand(ShortString),

    /// The capture deadline passed before a code was confirmed.
    #[error("learning timed out waiting for {0}")]
    LearningTimeout(Action),

    /// Two distinct actions share the same code value.
    #[error("code {code} is bound to both {first} and {second}")]
    AmbiguousCode {
        /// Shared code value.
        code: u32,
        /// Earlier action in enumeration order.
        first: Action,
        /// Later action in enumeration order.
        second: Action,
    },

    /// A fan or light command arrived while learning mode owns the radio.
    #[error("{0} command suppressed while learning")]
    LearningActive(Domain),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

impl FanError {
    /// Build an [`UnrecognizedCommand`](Self::UnrecognizedCommand) from free text,
    /// truncating it to fit.
    pub fn unrecognized(text: &str) -> Self {
        FanError::UnrecognizedCommand(crate::config::short_string(text))
    }

    /// Returns true for findings that are reported as warnings rather than faults.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            FanError::AmbiguousCode { .. } | FanError::InvalidConfig(_)
        )
    }
}
