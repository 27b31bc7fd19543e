//! Emulated light kit state.
//!
//! Same endpoint policy as the fan, without modes. `LightOn` and `LightOff`
//! are absolute power codes and are always transmitted when requested.

use crate::action::Action;
use crate::config::LightConfig;
use crate::plan::{plan_of, LevelPolicy, Plan, Power, MIN_LEVEL};

/// Snapshot of the believed light state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LightState {
    /// Emulated brightness level, `0` when off.
    pub level: u8,
    /// Power state.
    pub power: Power,
}

/// A logical request against the light.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LightRequest {
    /// Absolute on (last brightness) or off.
    SetPower(Power),
    /// Go to an addressed brightness (snapped to MIN or MAX, `0` = off).
    SetLevel(u8),
    /// One endpoint brighter.
    StepUp,
    /// One endpoint dimmer.
    StepDown,
}

/// Emulated light with planning of RF primitives.
#[derive(Clone, Debug)]
pub struct LightMachine {
    policy: LevelPolicy,
    state: LightState,
    resume_level: u8,
}

impl LightMachine {
    /// Creates a machine with the light believed off.
    pub fn new(config: &LightConfig) -> Self {
        Self {
            policy: LevelPolicy::new(config.level_max),
            state: LightState::default(),
            resume_level: 0,
        }
    }

    /// Current believed state.
    pub fn state(&self) -> LightState {
        self.state
    }

    /// Seed the machine with a previously known snapshot.
    pub fn restore(&mut self, state: LightState) {
        let mut state = state;
        state.level = state.level.min(self.policy.max());
        if !state.power.is_on() {
            state.level = 0;
        } else if state.level == 0 {
            state.level = self.policy.max();
        }
        if state.level > 0 {
            self.resume_level = state.level;
        }
        self.state = state;
    }

    /// The operator asserts the light is physically off.
    pub fn resync(&mut self) {
        self.state = LightState::default();
        self.resume_level = 0;
    }

    /// Compute the primitive actions for a request without changing state.
    pub fn plan(&self, request: LightRequest) -> Plan {
        let LightState { level, power } = self.state;
        match request {
            LightRequest::SetPower(Power::On) => plan_of(&[Action::LightOn]),
            LightRequest::SetPower(Power::Off) => plan_of(&[Action::LightOff]),
            LightRequest::SetLevel(k) => {
                let target = self.policy.snap(k);
                if target == 0 {
                    plan_of(&[Action::LightOff])
                } else if power.is_on() && level == target {
                    Plan::new()
                } else if self.policy.is_max(target) {
                    plan_of(&[Action::LightMax])
                } else {
                    plan_of(&[Action::LightMin])
                }
            }
            LightRequest::StepUp => {
                if !power.is_on() {
                    plan_of(&[Action::LightMin])
                } else if level < self.policy.max() {
                    plan_of(&[Action::LightMax])
                } else {
                    Plan::new()
                }
            }
            LightRequest::StepDown => {
                if !power.is_on() {
                    Plan::new()
                } else if level > MIN_LEVEL {
                    plan_of(&[Action::LightMin])
                } else {
                    plan_of(&[Action::LightOff])
                }
            }
        }
    }

    /// Update the believed state as if `action` had reached the light.
    ///
    /// Fan actions are ignored. Returns true when the snapshot changed.
    pub fn apply(&mut self, action: Action) -> bool {
        let before = self.state;
        match action {
            Action::LightOn => {
                let level = if self.state.power.is_on() && self.state.level > 0 {
                    self.state.level
                } else if self.resume_level > 0 {
                    self.resume_level
                } else {
                    self.policy.max()
                };
                self.set_lit(level);
            }
            Action::LightOff => {
                if self.state.level > 0 {
                    self.resume_level = self.state.level;
                }
                self.state = LightState::default();
            }
            Action::LightMin => self.set_lit(MIN_LEVEL),
            Action::LightMax => self.set_lit(self.policy.max()),
            _ => {}
        }
        self.state != before
    }

    fn set_lit(&mut self, level: u8) {
        self.state = LightState {
            level,
            power: Power::On,
        };
        self.resume_level = level;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(light: &mut LightMachine, request: LightRequest) -> Plan {
        let plan = light.plan(request);
        for action in &plan {
            light.apply(*action);
        }
        plan
    }

    #[test]
    fn first_on_goes_to_max() {
        let mut light = LightMachine::new(&LightConfig::default());
        let plan = run(&mut light, LightRequest::SetPower(Power::On));
        assert_eq!(plan.as_slice(), &[Action::LightOn]);
        assert_eq!(
            light.state(),
            LightState {
                level: 6,
                power: Power::On
            }
        );
    }

    #[test]
    fn on_resumes_last_level() {
        let mut light = LightMachine::new(&LightConfig::default());
        run(&mut light, LightRequest::SetLevel(1));
        run(&mut light, LightRequest::SetPower(Power::Off));
        assert_eq!(light.state().level, 0);
        run(&mut light, LightRequest::SetPower(Power::On));
        assert_eq!(light.state().level, 1);
    }

    #[test]
    fn power_codes_always_emitted() {
        let mut light = LightMachine::new(&LightConfig::default());
        assert_eq!(
            light.plan(LightRequest::SetPower(Power::Off)).as_slice(),
            &[Action::LightOff]
        );
        run(&mut light, LightRequest::SetPower(Power::On));
        assert_eq!(
            light.plan(LightRequest::SetPower(Power::On)).as_slice(),
            &[Action::LightOn]
        );
    }

    #[test]
    fn set_level_snapping() {
        let light = LightMachine::new(&LightConfig::default());
        assert_eq!(light.plan(LightRequest::SetLevel(2)).as_slice(), &[Action::LightMin]);
        assert_eq!(light.plan(LightRequest::SetLevel(4)).as_slice(), &[Action::LightMax]);
        assert_eq!(light.plan(LightRequest::SetLevel(0)).as_slice(), &[Action::LightOff]);
    }

    #[test]
    fn set_level_same_is_noop() {
        let mut light = LightMachine::new(&LightConfig::default());
        run(&mut light, LightRequest::SetLevel(6));
        assert!(light.plan(LightRequest::SetLevel(5)).is_empty());
    }

    #[test]
    fn stepping() {
        let mut light = LightMachine::new(&LightConfig::default());
        assert!(run(&mut light, LightRequest::StepDown).is_empty());
        assert_eq!(run(&mut light, LightRequest::StepUp).as_slice(), &[Action::LightMin]);
        assert_eq!(run(&mut light, LightRequest::StepUp).as_slice(), &[Action::LightMax]);
        assert!(run(&mut light, LightRequest::StepUp).is_empty());
        assert_eq!(run(&mut light, LightRequest::StepDown).as_slice(), &[Action::LightMin]);
        assert_eq!(run(&mut light, LightRequest::StepDown).as_slice(), &[Action::LightOff]);
        assert_eq!(light.state().power, Power::Off);
    }

    #[test]
    fn fan_actions_ignored() {
        let mut light = LightMachine::new(&LightConfig::default());
        assert!(!light.apply(Action::FanSummerMax));
    }

    #[test]
    fn resync_clears_resume_level() {
        let mut light = LightMachine::new(&LightConfig::default());
        run(&mut light, LightRequest::SetLevel(1));
        light.resync();
        assert_eq!(light.state(), LightState::default());
        run(&mut light, LightRequest::SetPower(Power::On));
        assert_eq!(light.state().level, 6);
    }
}
