//! Learning mode: capture codes from the physical remote into the table.
//!
//! While a session is active the radio is used only to listen. The operator
//! presses the button for the pending [`Action`] on the original remote; once
//! the same value has been decoded `learning.confirmations` times in a row it
//! is bound into the [`CodeTable`].
//!
//! A single press arrives as a burst of repeated frames. After a capture in
//! a sequential session the captured value is held off: further frames of
//! it are ignored until a different value arrives or no frame of it has
//! been seen for `learning.holdoff_ms`. One press therefore binds one slot.
//!
//! ```text
//! Idle -> Awaiting(action) -> Captured -> Awaiting(next unbound) | Idle
//!                          -> TimedOut | Cancelled -> Idle
//! ```
//!
//! # Example
//!
//! ```rust
//! use rs_fanrf::{Action, CodeTable, LearningController, LearningEvent, ReceivedCode};
//! use rs_fanrf::config::{LearningConfig, RfConfig};
//!
//! let mut table = CodeTable::new();
//! let config = LearningConfig::default().with_confirmations(2);
//! let mut learning = LearningController::new(&config, &RfConfig::default());
//!
//! assert_eq!(
//!     learning.start(&table, None, 0),
//!     LearningEvent::Awaiting { action: Action::LightOn }
//! );
//!
//! let press = ReceivedCode::new(6834, 6);
//! assert_eq!(learning.on_receive(&mut table, press, 10), Ok(None));
//! let event = learning.on_receive(&mut table, press, 20).unwrap();
//! assert!(matches!(
//!     event,
//!     Some(LearningEvent::Captured { action: Action::LightOn, next: Some(Action::LightOff), .. })
//! ));
//! assert!(table.is_bound(Action::LightOn));
//! ```

use log::{debug, info, warn};

use crate::action::{Action, ReceivedCode, RfCode};
use crate::code_table::CodeTable;
use crate::config::{LearningConfig, RfConfig};
use crate::error::FanError;

/// Where the controller is in its cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LearningState {
    /// Not learning; receptions are ignored.
    Idle,
    /// Waiting for confirmed presses of one button.
    Awaiting {
        /// Slot being learned.
        action: Action,
        /// Time after which the capture is abandoned.
        deadline_ms: u64,
        /// Advance to the next unbound slot after a capture.
        sequential: bool,
    },
}

/// Progress reported to the operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "event", rename_all = "snake_case"))]
pub enum LearningEvent {
    /// Press the button for `action` now.
    Awaiting {
        /// Slot being learned.
        action: Action,
    },
    /// A code was confirmed and bound.
    Captured {
        /// Slot that was bound.
        action: Action,
        /// Bound code.
        code: RfCode,
        /// Slot the session moved on to, if any.
        next: Option<Action>,
    },
    /// The deadline passed without a confirmed code.
    TimedOut {
        /// Slot that was being learned.
        action: Action,
    },
    /// The operator cancelled.
    Cancelled {
        /// Slot that was being learned.
        action: Action,
    },
    /// Nothing left to learn.
    Complete,
}

/// Capture state machine.
#[derive(Clone, Debug)]
pub struct LearningController {
    protocol: u8,
    repeats: u8,
    timeout_ms: u32,
    confirmations: u8,
    holdoff_ms: u32,
    state: LearningState,
    candidate: Option<(u32, u8)>,
    // (value, last seen) of the code captured last
    holdoff: Option<(u32, u64)>,
}

impl LearningController {
    /// Create an idle controller.
    pub fn new(config: &LearningConfig, rf: &RfConfig) -> Self {
        Self {
            protocol: rf.protocol,
            repeats: rf.repeats,
            timeout_ms: config.timeout_ms,
            confirmations: config.confirmations.max(1),
            holdoff_ms: config.holdoff_ms,
            state: LearningState::Idle,
            candidate: None,
            holdoff: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> LearningState {
        self.state
    }

    /// True while a capture is pending.
    pub fn is_active(&self) -> bool {
        matches!(self.state, LearningState::Awaiting { .. })
    }

    /// Slot currently being learned.
    pub fn pending(&self) -> Option<Action> {
        match self.state {
            LearningState::Awaiting { action, .. } => Some(action),
            LearningState::Idle => None,
        }
    }

    /// Start a sequential session at `slot`, or at the first unbound slot.
    ///
    /// With every slot bound and no explicit slot, reports
    /// [`LearningEvent::Complete`] and stays idle.
    pub fn start(&mut self, table: &CodeTable, slot: Option<Action>, now_ms: u64) -> LearningEvent {
        match slot.or_else(|| table.first_unbound()) {
            Some(action) => {
                info!(
                    "learning: {} of {} codes bound, starting at {}",
                    table.bound_count(),
                    Action::ALL.len(),
                    action
                );
                self.await_action(action, now_ms, true)
            }
            None => {
                info!("learning: every code is already bound");
                self.reset();
                LearningEvent::Complete
            }
        }
    }

    /// Learn exactly one slot.
    pub fn capture(&mut self, action: Action, now_ms: u64) -> LearningEvent {
        info!("learning: capturing {}", action);
        self.await_action(action, now_ms, false)
    }

    /// Abandon the session.
    pub fn cancel(&mut self) -> Option<LearningEvent> {
        let action = self.pending()?;
        info!("learning: cancelled while waiting for {}", action);
        self.reset();
        Some(LearningEvent::Cancelled { action })
    }

    /// Feed a decoded code into the session.
    ///
    /// Returns `Ok(None)` while idle, for other protocols, and while the
    /// code is still being confirmed.
    pub fn on_receive(
        &mut self,
        table: &mut CodeTable,
        code: ReceivedCode,
        now_ms: u64,
    ) -> Result<Option<LearningEvent>, FanError> {
        let LearningState::Awaiting {
            action,
            deadline_ms,
            sequential,
        } = self.state
        else {
            return Ok(None);
        };

        if now_ms > deadline_ms {
            self.reset();
            warn!("learning: timed out waiting for {}", action);
            return Err(FanError::LearningTimeout(action));
        }

        if code.protocol != self.protocol {
            debug!(
                "learning: ignoring code {} on protocol {}",
                code.value, code.protocol
            );
            return Ok(None);
        }

        if let Some((held, last_seen_ms)) = self.holdoff {
            if held == code.value
                && now_ms.saturating_sub(last_seen_ms) <= u64::from(self.holdoff_ms)
            {
                self.holdoff = Some((held, now_ms));
                debug!("learning: {} still held after capture", held);
                return Ok(None);
            }
            self.holdoff = None;
        }

        let count = match self.candidate {
            Some((value, count)) if value == code.value => count.saturating_add(1),
            _ => 1,
        };
        self.candidate = Some((code.value, count));
        debug!(
            "learning: {} seen {}/{} for {}",
            code.value, count, self.confirmations, action
        );
        if count < self.confirmations {
            return Ok(None);
        }

        let rf_code = RfCode::new(code.value, self.protocol, self.repeats);
        table.bind(action, rf_code);
        info!("learning: bound {} to {}", action, code.value);

        let next = if sequential {
            table.next_unbound_after(action)
        } else {
            None
        };
        match next {
            Some(next_action) => {
                self.await_action(next_action, now_ms, true);
                self.holdoff = Some((code.value, now_ms));
            }
            None => self.reset(),
        }

        Ok(Some(LearningEvent::Captured {
            action,
            code: rf_code,
            next,
        }))
    }

    /// Check the deadline.
    pub fn poll(&mut self, now_ms: u64) -> Result<(), FanError> {
        if let LearningState::Awaiting {
            action,
            deadline_ms,
            ..
        } = self.state
        {
            if now_ms > deadline_ms {
                self.reset();
                warn!("learning: timed out waiting for {}", action);
                return Err(FanError::LearningTimeout(action));
            }
        }
        Ok(())
    }

    fn await_action(&mut self, action: Action, now_ms: u64, sequential: bool) -> LearningEvent {
        self.state = LearningState::Awaiting {
            action,
            deadline_ms: now_ms.saturating_add(u64::from(self.timeout_ms)),
            sequential,
        };
        self.candidate = None;
        self.holdoff = None;
        LearningEvent::Awaiting { action }
    }

    fn reset(&mut self) {
        self.state = LearningState::Idle;
        self.candidate = None;
        self.holdoff = None;
    }
}
