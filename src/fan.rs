//! Emulated fan state and planning of the RF actions that move it.
//!
//! The fan receiver has no addressable speed. It understands an absolute
//! off code, a mode code per airflow direction (which also starts the fan
//! at MIN), and per-mode ON, MIN and MAX codes. [`FanMachine`] keeps the
//! believed state and computes the [`Plan`] for each [`FanRequest`].
//!
//! Planning is pure: [`FanMachine::plan`] never mutates. The caller resolves
//! every planned action to a bound code first, and only then feeds the
//! actions back through [`FanMachine::apply`].
//!
//! # Example
//!
//! ```rust
//! use rs_fanrf::{Action, FanMachine, FanMode, FanRequest, Power};
//! use rs_fanrf::config::FanConfig;
//!
//! let mut fan = FanMachine::new(&FanConfig::default());
//!
//! // Mode is unknown at boot, so powering on establishes summer first
//! let plan = fan.plan(FanRequest::SetPower(Power::On));
//! assert_eq!(plan.as_slice(), &[Action::FanSummerMode]);
//! for action in &plan {
//!     fan.apply(*action);
//! }
//! assert_eq!(fan.state().mode, FanMode::Summer);
//! assert_eq!(fan.state().level, 1);
//!
//! let plan = fan.plan(FanRequest::SetLevel(6));
//! assert_eq!(plan.as_slice(), &[Action::FanSummerMax]);
//! ```

use core::fmt;

use crate::action::Action;
use crate::config::FanConfig;
use crate::plan::{plan_of, LevelPolicy, Plan, Power, MIN_LEVEL};

/// Airflow direction of the fan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FanMode {
    /// Air pushed down.
    Summer,
    /// Air pulled up.
    Winter,
    /// Not known since boot or the last resync.
    #[default]
    Unknown,
}

impl FanMode {
    /// Returns the mode as a lowercase string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            FanMode::Summer => "summer",
            FanMode::Winter => "winter",
            FanMode::Unknown => "unknown",
        }
    }

    /// Parse a requestable mode from text.
    ///
    /// Accepts `summer`/`down` and `winter`/`up`, trimmed and
    /// case-insensitive. `Unknown` is never parsed.
    ///
    /// ```
    /// use rs_fanrf::FanMode;
    ///
    /// assert_eq!(FanMode::from_text("Winter"), Some(FanMode::Winter));
    /// assert_eq!(FanMode::from_text("down"), Some(FanMode::Summer));
    /// assert_eq!(FanMode::from_text("unknown"), None);
    /// ```
    pub fn from_text(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("summer") || s.eq_ignore_ascii_case("down") {
            Some(FanMode::Summer)
        } else if s.eq_ignore_ascii_case("winter") || s.eq_ignore_ascii_case("up") {
            Some(FanMode::Winter)
        } else {
            None
        }
    }

    /// Code that switches to this mode (and starts the fan at MIN).
    pub const fn mode_action(self) -> Option<Action> {
        match self {
            FanMode::Summer => Some(Action::FanSummerMode),
            FanMode::Winter => Some(Action::FanWinterMode),
            FanMode::Unknown => None,
        }
    }

    /// "On at current speed" code for this mode.
    pub const fn on_action(self) -> Option<Action> {
        match self {
            FanMode::Summer => Some(Action::FanSummerOn),
            FanMode::Winter => Some(Action::FanWinterOn),
            FanMode::Unknown => None,
        }
    }

    /// MIN speed code for this mode.
    pub const fn min_action(self) -> Option<Action> {
        match self {
            FanMode::Summer => Some(Action::FanSummerMin),
            FanMode::Winter => Some(Action::FanWinterMin),
            FanMode::Unknown => None,
        }
    }

    /// MAX speed code for this mode.
    pub const fn max_action(self) -> Option<Action> {
        match self {
            FanMode::Summer => Some(Action::FanSummerMax),
            FanMode::Winter => Some(Action::FanWinterMax),
            FanMode::Unknown => None,
        }
    }
}

impl fmt::Display for FanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the believed fan state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FanState {
    /// Airflow direction.
    pub mode: FanMode,
    /// Emulated speed level, `0` when off.
    pub level: u8,
    /// Power state.
    pub power: Power,
}

impl FanState {
    /// State after boot or resync: mode unknown, stopped.
    pub const fn unknown() -> Self {
        Self {
            mode: FanMode::Unknown,
            level: 0,
            power: Power::Off,
        }
    }
}

/// A logical request against the fan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FanRequest {
    /// Power on at the remembered speed, or off.
    SetPower(Power),
    /// Switch airflow direction.
    SetMode(FanMode),
    /// Go to an addressed speed level (snapped to MIN or MAX, `0` = off).
    SetLevel(u8),
    /// One endpoint faster.
    StepUp,
    /// One endpoint slower.
    StepDown,
}

/// Emulated fan with planning of RF primitives.
#[derive(Clone, Debug)]
pub struct FanMachine {
    policy: LevelPolicy,
    default_mode: FanMode,
    state: FanState,
    resume_level: u8,
}

impl FanMachine {
    /// Creates a machine in the unknown state.
    pub fn new(config: &FanConfig) -> Self {
        let default_mode = match config.default_mode {
            FanMode::Unknown => FanMode::Summer,
            mode => mode,
        };
        Self {
            policy: LevelPolicy::new(config.level_max),
            default_mode,
            state: FanState::unknown(),
            resume_level: 0,
        }
    }

    /// Current believed state.
    pub fn state(&self) -> FanState {
        self.state
    }

    /// Level policy in use.
    pub fn policy(&self) -> LevelPolicy {
        self.policy
    }

    /// Seed the machine with a previously known snapshot.
    ///
    /// The level is clamped to the configured maximum and forced to `0`
    /// when off.
    pub fn restore(&mut self, state: FanState) {
        let mut state = state;
        state.level = state.level.min(self.policy.max());
        if !state.power.is_on() {
            state.level = 0;
        } else if state.level == 0 {
            state.level = MIN_LEVEL;
        }
        if state.level > 0 {
            self.resume_level = state.level;
        }
        self.state = state;
    }

    /// Forget everything: the operator asserts the fan is physically off
    /// and in an unknown mode.
    pub fn resync(&mut self) {
        self.state = FanState::unknown();
        self.resume_level = 0;
    }

    /// Compute the primitive actions for a request without changing state.
    ///
    /// An empty plan means the request is a no-op.
    pub fn plan(&self, request: FanRequest) -> Plan {
        let FanState { mode, level, power } = self.state;
        let known = mode != FanMode::Unknown;

        match request {
            FanRequest::SetPower(Power::Off) => plan_of(&[Action::FanOff]),
            FanRequest::SetPower(Power::On) => match mode.on_action() {
                Some(on) => plan_of(&[on]),
                None => self.establish_default_mode(None),
            },
            FanRequest::SetMode(target) => match target.mode_action() {
                Some(code) if target != mode => plan_of(&[code]),
                _ => Plan::new(),
            },
            FanRequest::SetLevel(k) => {
                let target = self.policy.snap(k);
                if target == 0 {
                    return plan_of(&[Action::FanOff]);
                }
                if !known {
                    return self.establish_default_mode(Some(target));
                }
                if power.is_on() && level == target {
                    return Plan::new();
                }
                self.endpoint_action(mode, target)
                    .map(|a| plan_of(&[a]))
                    .unwrap_or_default()
            }
            FanRequest::StepUp => {
                if !known {
                    return self.establish_default_mode(None);
                }
                if !power.is_on() {
                    return mode.min_action().map(|a| plan_of(&[a])).unwrap_or_default();
                }
                if level < self.policy.max() {
                    return mode.max_action().map(|a| plan_of(&[a])).unwrap_or_default();
                }
                Plan::new()
            }
            FanRequest::StepDown => {
                if !known || !power.is_on() {
                    return Plan::new();
                }
                if level > MIN_LEVEL {
                    return mode.min_action().map(|a| plan_of(&[a])).unwrap_or_default();
                }
                plan_of(&[Action::FanOff])
            }
        }
    }

    /// Update the believed state as if `action` had reached the fan.
    ///
    /// Light actions are ignored. Returns true when the snapshot changed.
    pub fn apply(&mut self, action: Action) -> bool {
        let before = self.state;
        let max = self.policy.max();
        match action {
            Action::FanOff => {
                if self.state.level > 0 {
                    self.resume_level = self.state.level;
                }
                self.state.level = 0;
                self.state.power = Power::Off;
            }
            Action::FanSummerMode => self.set_running(FanMode::Summer, MIN_LEVEL),
            Action::FanWinterMode => self.set_running(FanMode::Winter, MIN_LEVEL),
            Action::FanSummerOn => self.set_running(FanMode::Summer, self.on_level()),
            Action::FanWinterOn => self.set_running(FanMode::Winter, self.on_level()),
            Action::FanSummerMax => self.set_running(FanMode::Summer, max),
            Action::FanWinterMax => self.set_running(FanMode::Winter, max),
            Action::FanSummerMin => self.set_running(FanMode::Summer, MIN_LEVEL),
            Action::FanWinterMin => self.set_running(FanMode::Winter, MIN_LEVEL),
            Action::LightOn | Action::LightOff | Action::LightMin | Action::LightMax => {}
        }
        self.state != before
    }

    fn set_running(&mut self, mode: FanMode, level: u8) {
        self.state = FanState {
            mode,
            level,
            power: Power::On,
        };
        self.resume_level = level;
    }

    fn on_level(&self) -> u8 {
        if self.state.power.is_on() && self.state.level > 0 {
            self.state.level
        } else if self.resume_level > 0 {
            self.resume_level
        } else {
            MIN_LEVEL
        }
    }

    fn endpoint_action(&self, mode: FanMode, level: u8) -> Option<Action> {
        if self.policy.is_max(level) {
            mode.max_action()
        } else {
            mode.min_action()
        }
    }

    // Mode code starts the fan at MIN; reaching MAX needs a second step.
    fn establish_default_mode(&self, target: Option<u8>) -> Plan {
        let mode = self.default_mode;
        let mut plan = Plan::new();
        if let Some(code) = mode.mode_action() {
            let _ = plan.push(code);
        }
        if let Some(level) = target {
            if self.policy.is_max(level) {
                if let Some(max) = mode.max_action() {
                    let _ = plan.push(max);
                }
            }
        }
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> FanMachine {
        FanMachine::new(&FanConfig::default())
    }

    fn running(mode: FanMode, level: u8) -> FanMachine {
        let mut fan = machine();
        fan.restore(FanState {
            mode,
            level,
            power: Power::On,
        });
        fan
    }

    fn run(fan: &mut FanMachine, request: FanRequest) -> Plan {
        let plan = fan.plan(request);
        for action in &plan {
            fan.apply(*action);
        }
        plan
    }

    // =========================================================================
    // FanMode Tests
    // =========================================================================

    #[test]
    fn mode_actions() {
        assert_eq!(FanMode::Summer.mode_action(), Some(Action::FanSummerMode));
        assert_eq!(FanMode::Winter.on_action(), Some(Action::FanWinterOn));
        assert_eq!(FanMode::Summer.min_action(), Some(Action::FanSummerMin));
        assert_eq!(FanMode::Winter.max_action(), Some(Action::FanWinterMax));
        assert_eq!(FanMode::Unknown.mode_action(), None);
    }

    #[test]
    fn mode_from_text() {
        assert_eq!(FanMode::from_text("SUMMER"), Some(FanMode::Summer));
        assert_eq!(FanMode::from_text(" up "), Some(FanMode::Winter));
        assert_eq!(FanMode::from_text("sideways"), None);
    }

    // =========================================================================
    // Power Tests
    // =========================================================================

    #[test]
    fn off_from_running_state() {
        let mut fan = running(FanMode::Summer, 5);
        let plan = run(&mut fan, FanRequest::SetPower(Power::Off));
        assert_eq!(plan.as_slice(), &[Action::FanOff]);
        assert_eq!(
            fan.state(),
            FanState {
                mode: FanMode::Summer,
                level: 0,
                power: Power::Off
            }
        );
    }

    #[test]
    fn off_is_always_emitted() {
        let fan = machine();
        assert_eq!(fan.plan(FanRequest::SetPower(Power::Off)).as_slice(), &[Action::FanOff]);
    }

    #[test]
    fn on_from_unknown_establishes_default_mode() {
        let mut fan = machine();
        let plan = run(&mut fan, FanRequest::SetPower(Power::On));
        assert_eq!(plan.as_slice(), &[Action::FanSummerMode]);
        assert_eq!(fan.state().level, MIN_LEVEL);
    }

    #[test]
    fn on_from_unknown_uses_configured_default() {
        let mut fan = FanMachine::new(&FanConfig::default().with_default_mode(FanMode::Winter));
        let plan = run(&mut fan, FanRequest::SetPower(Power::On));
        assert_eq!(plan.as_slice(), &[Action::FanWinterMode]);
    }

    #[test]
    fn on_resumes_last_level() {
        let mut fan = running(FanMode::Winter, 6);
        run(&mut fan, FanRequest::SetPower(Power::Off));
        let plan = run(&mut fan, FanRequest::SetPower(Power::On));
        assert_eq!(plan.as_slice(), &[Action::FanWinterOn]);
        assert_eq!(fan.state().level, 6);
        assert_eq!(fan.state().power, Power::On);
    }

    #[test]
    fn on_without_history_resumes_min() {
        let mut fan = machine();
        fan.restore(FanState {
            mode: FanMode::Summer,
            level: 0,
            power: Power::Off,
        });
        run(&mut fan, FanRequest::SetPower(Power::On));
        assert_eq!(fan.state().level, MIN_LEVEL);
    }

    // =========================================================================
    // Mode Tests
    // =========================================================================

    #[test]
    fn mode_switch_resets_level_to_min() {
        let mut fan = running(FanMode::Summer, 6);
        let plan = run(&mut fan, FanRequest::SetMode(FanMode::Winter));
        assert_eq!(plan.as_slice(), &[Action::FanWinterMode]);
        assert_eq!(
            fan.state(),
            FanState {
                mode: FanMode::Winter,
                level: 1,
                power: Power::On
            }
        );
    }

    #[test]
    fn same_mode_is_noop() {
        let fan = running(FanMode::Summer, 6);
        assert!(fan.plan(FanRequest::SetMode(FanMode::Summer)).is_empty());
    }

    #[test]
    fn set_mode_unknown_is_noop() {
        let fan = running(FanMode::Summer, 6);
        assert!(fan.plan(FanRequest::SetMode(FanMode::Unknown)).is_empty());
    }

    // =========================================================================
    // Level Tests
    // =========================================================================

    #[test]
    fn set_level_snaps_to_endpoints() {
        let fan = running(FanMode::Summer, 1);
        assert_eq!(fan.plan(FanRequest::SetLevel(5)).as_slice(), &[Action::FanSummerMax]);
        let fan = running(FanMode::Summer, 6);
        assert_eq!(fan.plan(FanRequest::SetLevel(2)).as_slice(), &[Action::FanSummerMin]);
    }

    #[test]
    fn set_level_same_is_noop() {
        let fan = running(FanMode::Winter, 6);
        assert!(fan.plan(FanRequest::SetLevel(6)).is_empty());
        assert!(fan.plan(FanRequest::SetLevel(5)).is_empty());
    }

    #[test]
    fn set_level_zero_is_off() {
        let fan = running(FanMode::Winter, 6);
        assert_eq!(fan.plan(FanRequest::SetLevel(0)).as_slice(), &[Action::FanOff]);
    }

    #[test]
    fn set_level_from_off_powers_on() {
        let mut fan = running(FanMode::Summer, 6);
        run(&mut fan, FanRequest::SetPower(Power::Off));
        let plan = run(&mut fan, FanRequest::SetLevel(6));
        assert_eq!(plan.as_slice(), &[Action::FanSummerMax]);
        assert_eq!(fan.state().power, Power::On);
    }

    #[test]
    fn set_level_max_from_unknown_is_two_steps() {
        let mut fan = machine();
        let plan = run(&mut fan, FanRequest::SetLevel(6));
        assert_eq!(plan.as_slice(), &[Action::FanSummerMode, Action::FanSummerMax]);
        assert_eq!(fan.state().level, 6);
    }

    #[test]
    fn set_level_min_from_unknown_is_mode_only() {
        let plan = machine().plan(FanRequest::SetLevel(1));
        assert_eq!(plan.as_slice(), &[Action::FanSummerMode]);
    }

    // =========================================================================
    // Step Tests
    // =========================================================================

    #[test]
    fn step_up_sequence() {
        let mut fan = running(FanMode::Summer, 6);
        run(&mut fan, FanRequest::SetPower(Power::Off));

        assert_eq!(run(&mut fan, FanRequest::StepUp).as_slice(), &[Action::FanSummerMin]);
        assert_eq!(fan.state().level, 1);
        assert_eq!(run(&mut fan, FanRequest::StepUp).as_slice(), &[Action::FanSummerMax]);
        assert_eq!(fan.state().level, 6);
        assert!(run(&mut fan, FanRequest::StepUp).is_empty());
    }

    #[test]
    fn step_up_from_unknown_sends_mode() {
        let plan = machine().plan(FanRequest::StepUp);
        assert_eq!(plan.as_slice(), &[Action::FanSummerMode]);
    }

    #[test]
    fn step_down_sequence() {
        let mut fan = running(FanMode::Winter, 6);
        assert_eq!(run(&mut fan, FanRequest::StepDown).as_slice(), &[Action::FanWinterMin]);
        assert_eq!(run(&mut fan, FanRequest::StepDown).as_slice(), &[Action::FanOff]);
        assert_eq!(fan.state().power, Power::Off);
        assert!(run(&mut fan, FanRequest::StepDown).is_empty());
    }

    #[test]
    fn step_down_from_unknown_is_noop() {
        assert!(machine().plan(FanRequest::StepDown).is_empty());
    }

    #[test]
    fn single_level_fan_never_plans_max() {
        let mut fan = FanMachine::new(&FanConfig::default().with_level_max(1));
        assert_eq!(run(&mut fan, FanRequest::SetLevel(9)).as_slice(), &[Action::FanSummerMode]);
        assert!(run(&mut fan, FanRequest::StepUp).is_empty());
    }

    // =========================================================================
    // Apply / Resync Tests
    // =========================================================================

    #[test]
    fn apply_ignores_light_actions() {
        let mut fan = running(FanMode::Summer, 6);
        assert!(!fan.apply(Action::LightOff));
        assert_eq!(fan.state().level, 6);
    }

    #[test]
    fn apply_reports_change() {
        let mut fan = running(FanMode::Summer, 6);
        assert!(!fan.apply(Action::FanSummerMax));
        assert!(fan.apply(Action::FanSummerMin));
    }

    #[test]
    fn resync_forgets_mode() {
        let mut fan = running(FanMode::Winter, 6);
        fan.resync();
        assert_eq!(fan.state(), FanState::unknown());
        run(&mut fan, FanRequest::SetPower(Power::On));
        assert_eq!(fan.state().level, MIN_LEVEL);
    }

    #[test]
    fn restore_normalizes_levels() {
        let mut fan = machine();
        fan.restore(FanState {
            mode: FanMode::Summer,
            level: 9,
            power: Power::On,
        });
        assert_eq!(fan.state().level, 6);
        fan.restore(FanState {
            mode: FanMode::Summer,
            level: 4,
            power: Power::Off,
        });
        assert_eq!(fan.state().level, 0);
    }
}
