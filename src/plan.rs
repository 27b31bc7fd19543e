//! Shared vocabulary for the fan and light state machines.
//!
//! The receiver only understands absolute power codes and the two speed
//! endpoints (MIN and MAX). Intermediate levels exist only in the emulated
//! state, so an addressed level is snapped to the nearest reachable endpoint
//! by [`LevelPolicy`] before a [`Plan`] is built.
//!
//! # Example
//!
//! ```rust
//! use rs_fanrf::plan::{LevelPolicy, MIN_LEVEL};
//!
//! let policy = LevelPolicy::new(6);
//! assert_eq!(policy.snap(0), 0);
//! assert_eq!(policy.snap(3), MIN_LEVEL);
//! assert_eq!(policy.snap(4), 6);
//! assert_eq!(policy.snap(200), 6);
//! ```

use core::fmt;

use crate::action::Action;

/// Lowest reachable non-zero level (the MIN endpoint).
pub const MIN_LEVEL: u8 = 1;

/// Upper bound on the number of primitive actions a single transition needs.
pub const MAX_PLAN_STEPS: usize = 4;

/// Ordered primitive actions computed for one logical transition.
pub type Plan = heapless::Vec<Action, MAX_PLAN_STEPS>;

/// Build a plan from a slice of actions.
pub(crate) fn plan_of(actions: &[Action]) -> Plan {
    let mut plan = Plan::new();
    for action in actions.iter().take(MAX_PLAN_STEPS) {
        let _ = plan.push(*action);
    }
    plan
}

/// Power state of an emulated device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum Power {
    /// Running or lit.
    On,
    /// Stopped or dark.
    #[default]
    Off,
}

impl Power {
    /// Returns the power state as the uppercase string used on the bus.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Power::On => "ON",
            Power::Off => "OFF",
        }
    }

    /// Parse a power state from text.
    ///
    /// Accepts `on`/`off`, `1`/`0` and `true`/`false`, trimmed and
    /// case-insensitive.
    ///
    /// ```
    /// use rs_fanrf::Power;
    ///
    /// assert_eq!(Power::from_text("ON"), Some(Power::On));
    /// assert_eq!(Power::from_text(" false "), Some(Power::Off));
    /// assert_eq!(Power::from_text("maybe"), None);
    /// ```
    pub fn from_text(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("on") || s == "1" || s.eq_ignore_ascii_case("true") {
            Some(Power::On)
        } else if s.eq_ignore_ascii_case("off") || s == "0" || s.eq_ignore_ascii_case("false") {
            Some(Power::Off)
        } else {
            None
        }
    }

    /// Returns true when on.
    pub const fn is_on(&self) -> bool {
        matches!(self, Power::On)
    }
}

impl fmt::Display for Power {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps addressed levels onto the two reachable endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelPolicy {
    max: u8,
}

impl LevelPolicy {
    /// Creates a policy for levels `0..=max`. A zero `max` is treated as `1`.
    pub const fn new(max: u8) -> Self {
        Self {
            max: if max == 0 { 1 } else { max },
        }
    }

    /// Highest emulated level (the MAX endpoint).
    pub const fn max(&self) -> u8 {
        self.max
    }

    /// Snap an addressed level to `0`, [`MIN_LEVEL`] or [`max`](Self::max).
    ///
    /// Levels above `max` are clamped first. Ties round up to MAX.
    pub fn snap(&self, level: u8) -> u8 {
        let level = level.min(self.max);
        if level == 0 {
            return 0;
        }
        let below_midpoint = (u16::from(level) - 1) * 2 < u16::from(self.max) - 1;
        if below_midpoint {
            MIN_LEVEL
        } else {
            self.max
        }
    }

    /// True when `level` is the MAX endpoint and MAX is distinct from MIN.
    pub fn is_max(&self, level: u8) -> bool {
        level == self.max && self.max > MIN_LEVEL
    }
}
