//! Mapping from remote buttons to the RF codes that replay them.
//!
//! The table has exactly one slot per [`Action`]. It is populated from
//! [`CodeConfig`] at boot; afterwards only learning rebinds slots.
//!
//! # Example
//!
//! ```rust
//! use rs_fanrf::{Action, CodeTable, RfCode};
//! use rs_fanrf::config::{CodeConfig, RfConfig};
//!
//! let mut table = CodeTable::from_config(&CodeConfig::unbound(), &RfConfig::default());
//! assert_eq!(table.first_unbound(), Some(Action::LightOn));
//!
//! let code = RfCode::new(6834, 6, 8);
//! let rebind = table.bind(Action::LightOn, code).expect("slot changed");
//! assert_eq!(rebind.previous, None);
//! assert_eq!(table.lookup(Action::LightOn), Ok(code));
//!
//! // Binding the same code again changes nothing
//! assert!(table.bind(Action::LightOn, code).is_none());
//! ```

extern crate alloc;
use alloc::vec::Vec;

use crate::action::{Action, RfCode, ACTION_COUNT};
use crate::config::{CodeConfig, RfConfig};
use crate::error::FanError;

/// Record of a slot whose binding changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rebind {
    /// Slot that changed.
    pub action: Action,
    /// Code bound before, if any.
    pub previous: Option<RfCode>,
    /// Code bound now.
    pub code: RfCode,
}

/// One optional [`RfCode`] per [`Action`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CodeTable {
    slots: [Option<RfCode>; ACTION_COUNT],
}

impl CodeTable {
    /// Empty table.
    pub const fn new() -> Self {
        Self {
            slots: [None; ACTION_COUNT],
        }
    }

    /// Build the table from configured values. A value of `0` stays unbound.
    pub fn from_config(codes: &CodeConfig, rf: &RfConfig) -> Self {
        let mut table = Self::new();
        for action in Action::ALL {
            let value = codes.get(action);
            if value != 0 {
                table.slots[action.index()] = Some(RfCode::new(value, rf.protocol, rf.repeats));
            }
        }
        table
    }

    /// Code bound to an action.
    pub fn lookup(&self, action: Action) -> Result<RfCode, FanError> {
        self.slots[action.index()].ok_or(FanError::NotBound(action))
    }

    /// Bind a code, replacing any previous one.
    ///
    /// Returns `None` when the slot already held exactly this code.
    pub fn bind(&mut self, action: Action, code: RfCode) -> Option<Rebind> {
        let slot = &mut self.slots[action.index()];
        if *slot == Some(code) {
            return None;
        }
        let previous = slot.replace(code);
        Some(Rebind {
            action,
            previous,
            code,
        })
    }

    /// Clear a slot, returning the code it held.
    pub fn unbind(&mut self, action: Action) -> Option<RfCode> {
        self.slots[action.index()].take()
    }

    /// Whether a slot holds a code.
    pub fn is_bound(&self, action: Action) -> bool {
        self.slots[action.index()].is_some()
    }

    /// Number of bound slots.
    pub fn bound_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Unbound actions in enumeration order.
    pub fn unbound(&self) -> impl Iterator<Item = Action> + '_ {
        Action::ALL.into_iter().filter(|a| !self.is_bound(*a))
    }

    /// First unbound action in enumeration order.
    pub fn first_unbound(&self) -> Option<Action> {
        self.unbound().next()
    }

    /// First unbound action strictly after `action` in enumeration order.
    pub fn next_unbound_after(&self, action: Action) -> Option<Action> {
        self.unbound().find(|a| a.index() > action.index())
    }

    /// Every action bound to `value` under `protocol`, in enumeration order.
    pub fn actions_for(&self, value: u32, protocol: u8) -> impl Iterator<Item = Action> + '_ {
        Action::ALL.into_iter().filter(move |a| {
            self.slots[a.index()]
                .map(|c| c.value == value && c.protocol == protocol)
                .unwrap_or(false)
        })
    }

    /// Every pair of distinct actions sharing a code value.
    pub fn validate(&self) -> Vec<FanError> {
        let mut found = Vec::new();
        for (i, first) in Action::ALL.iter().enumerate() {
            let Some(code) = self.slots[i] else {
                continue;
            };
            for second in &Action::ALL[i + 1..] {
                if matches!(self.slots[second.index()], Some(other) if other.value == code.value) {
                    found.push(FanError::AmbiguousCode {
                        code: code.value,
                        first: *first,
                        second: *second,
                    });
                }
            }
        }
        found
    }

    /// Other actions already bound to the same value as `action`.
    pub fn conflicts_with(&self, action: Action) -> Vec<FanError> {
        let Some(code) = self.slots[action.index()] else {
            return Vec::new();
        };
        Action::ALL
            .into_iter()
            .filter(|other| *other != action)
            .filter(|other| matches!(self.slots[other.index()], Some(c) if c.value == code.value))
            .map(|other| {
                let (first, second) = if other.index() < action.index() {
                    (other, action)
                } else {
                    (action, other)
                };
                FanError::AmbiguousCode {
                    code: code.value,
                    first,
                    second,
                }
            })
            .collect()
    }

    /// Iterate over `(action, code)` for every slot.
    pub fn iter(&self) -> impl Iterator<Item = (Action, Option<RfCode>)> + '_ {
        Action::ALL.into_iter().map(|a| (a, self.slots[a.index()]))
    }
}
