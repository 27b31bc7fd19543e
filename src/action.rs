//! Symbolic remote-control buttons and the RF code types bound to them.
//!
//! The physical remote for the fan/light receiver exposes a fixed set of
//! buttons. Each one is an [`Action`]; the receiver understands it only as
//! a raw [`RfCode`] transmitted with a specific protocol and repeat profile.
//!
//! # Enumeration Order
//!
//! [`Action::ALL`] lists every action in a fixed order. Learning mode walks
//! this order when it advances to the next unbound slot, so the order is
//! part of the operator-facing behavior and must not change.
//!
//! ```rust
//! use rs_fanrf::{Action, Domain};
//!
//! assert_eq!(Action::ALL[0], Action::LightOn);
//! assert_eq!(Action::from_text("SUMMER_FAN_MODE"), Some(Action::FanSummerMode));
//! assert_eq!(Action::FanWinterMax.domain(), Domain::Fan);
//! ```

use core::fmt;

/// Which half of the receiver an action controls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Domain {
    /// Fan motor (speed and airflow direction).
    Fan,
    /// Light kit (brightness).
    Light,
}

impl Domain {
    /// Returns the domain as a lowercase string, matching the topic prefix.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Domain::Fan => "fan",
            Domain::Light => "light",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A button on the physical remote.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Action {
    /// Light on at its last brightness.
    LightOn,
    /// Light off.
    LightOff,
    /// Dimmest light level.
    LightMin,
    /// Brightest light level.
    LightMax,
    /// Fan off (same code in summer and winter mode).
    FanOff,
    /// Switch to summer mode (air pushed down).
    FanSummerMode,
    /// Switch to winter mode (air pulled up).
    FanWinterMode,
    /// Summer mode, on at the current speed.
    FanSummerOn,
    /// Summer mode, maximum speed.
    FanSummerMax,
    /// Summer mode, minimum speed.
    FanSummerMin,
    /// Winter mode, on at the current speed.
    FanWinterOn,
    /// Winter mode, maximum speed.
    FanWinterMax,
    /// Winter mode, minimum speed.
    FanWinterMin,
}

/// Number of actions in [`Action::ALL`].
pub const ACTION_COUNT: usize = 13;

impl Action {
    /// Every action, in the fixed enumeration order.
    pub const ALL: [Action; ACTION_COUNT] = [
        Action::LightOn,
        Action::LightOff,
        Action::LightMin,
        Action::LightMax,
        Action::FanOff,
        Action::FanSummerMode,
        Action::FanWinterMode,
        Action::FanSummerOn,
        Action::FanSummerMax,
        Action::FanSummerMin,
        Action::FanWinterOn,
        Action::FanWinterMax,
        Action::FanWinterMin,
    ];

    /// Position of this action in [`Action::ALL`].
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns the domain this action belongs to.
    pub const fn domain(self) -> Domain {
        match self {
            Action::LightOn | Action::LightOff | Action::LightMin | Action::LightMax => {
                Domain::Light
            }
            _ => Domain::Fan,
        }
    }

    /// Stable snake_case name, used in topics and JSON.
    pub const fn as_str(self) -> &'static str {
        match self {
            Action::LightOn => "light_on",
            Action::LightOff => "light_off",
            Action::LightMin => "light_min",
            Action::LightMax => "light_max",
            Action::FanOff => "fan_off",
            Action::FanSummerMode => "fan_summer_mode",
            Action::FanWinterMode => "fan_winter_mode",
            Action::FanSummerOn => "fan_summer_on",
            Action::FanSummerMax => "fan_summer_max",
            Action::FanSummerMin => "fan_summer_min",
            Action::FanWinterOn => "fan_winter_on",
            Action::FanWinterMax => "fan_winter_max",
            Action::FanWinterMin => "fan_winter_min",
        }
    }

    /// Name used by the legacy firmware configuration header.
    pub const fn legacy_name(self) -> &'static str {
        match self {
            Action::LightOn => "LIGHT_ON",
            Action::LightOff => "LIGHT_OFF",
            Action::LightMin => "LIGHT_MIN",
            Action::LightMax => "LIGHT_MAX",
            Action::FanOff => "FAN_OFF",
            Action::FanSummerMode => "SUMMER_FAN_MODE",
            Action::FanWinterMode => "WINTER_FAN_MODE",
            Action::FanSummerOn => "SUMMER_FAN_ON",
            Action::FanSummerMax => "SUMMER_FAN_MAX",
            Action::FanSummerMin => "SUMMER_FAN_MIN",
            Action::FanWinterOn => "WINTER_FAN_ON",
            Action::FanWinterMax => "WINTER_FAN_MAX",
            Action::FanWinterMin => "WINTER_FAN_MIN",
        }
    }

    /// Parse an action from either its snake_case or legacy name.
    ///
    /// Input is trimmed and case-insensitive.
    ///
    /// ```
    /// use rs_fanrf::Action;
    ///
    /// assert_eq!(Action::from_text("light_min"), Some(Action::LightMin));
    /// assert_eq!(Action::from_text("  WINTER_FAN_ON "), Some(Action::FanWinterOn));
    /// assert_eq!(Action::from_text("fan_reverse"), None);
    /// ```
    pub fn from_text(s: &str) -> Option<Self> {
        let s = s.trim();
        Action::ALL
            .iter()
            .copied()
            .find(|a| s.eq_ignore_ascii_case(a.as_str()) || s.eq_ignore_ascii_case(a.legacy_name()))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw code as replayed by the transmitter.
///
/// The numeric value is only meaningful together with the protocol id and
/// repeat count it was captured with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RfCode {
    /// Numeric payload understood by the receiver's decoder.
    pub value: u32,
    /// Modulation protocol id of the RF driver.
    pub protocol: u8,
    /// How many times the frame is repeated per transmission.
    pub repeats: u8,
}

impl RfCode {
    /// Create a new code.
    pub const fn new(value: u32, protocol: u8, repeats: u8) -> Self {
        Self {
            value,
            protocol,
            repeats,
        }
    }
}

/// A code reported by the receiver side of the RF driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReceivedCode {
    /// Decoded numeric payload.
    pub value: u32,
    /// Protocol id the decoder matched.
    pub protocol: u8,
}

impl ReceivedCode {
    /// Create a new received code.
    pub const fn new(value: u32, protocol: u8) -> Self {
        Self { value, protocol }
    }
}
