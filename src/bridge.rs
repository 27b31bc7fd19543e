//! The command bridge: commands in, RF codes out, state events back.
//!
//! [`CommandBridge`] owns everything the control loop needs: the code table,
//! the transmitter (and through it the RF driver), both state machines and
//! the learning controller. It never blocks; the caller drives it with
//! [`handle_message`](CommandBridge::handle_message) for every inbound MQTT
//! message and [`tick`](CommandBridge::tick) on every loop iteration, then
//! drains the outbound [`BridgeEvent`]s.
//!
//! # Overview
//!
//! - Fan and light commands are planned, every planned step is resolved to
//!   a bound code up front, the emulated state is updated and the codes are
//!   queued, preempting any sequence still in flight.
//! - Codes decoded by the receiver go to learning while it is active and
//!   otherwise reconcile the emulated state (someone used the physical remote).
//! - Errors are local to the message or tick that produced them. Nothing
//!   here aborts the loop.
//!
//! # Example
//!
//! ```rust
//! use rs_fanrf::{BridgeEvent, CommandBridge, Config, FanMode, FanState, Power};
//! use rs_fanrf::hal::MockRf;
//!
//! let config = Config::default();
//! let mut bridge = CommandBridge::new(&config, MockRf::new(), 0);
//! bridge.drain_events(); // startup warnings about the shipped duplicate codes
//!
//! bridge.restore_fan_state(FanState { mode: FanMode::Summer, level: 5, power: Power::On });
//! bridge.handle_message("fan/set_power", b"OFF", 1000).unwrap();
//!
//! assert_eq!(bridge.transmitter().driver().transmissions, vec![(6656, 6, 8)]);
//! assert_eq!(
//!     bridge.pop_event(),
//!     Some(BridgeEvent::Fan(FanState { mode: FanMode::Summer, level: 0, power: Power::Off }))
//! );
//! ```

use heapless::Deque;
use log::{debug, info, warn};

use crate::action::{Action, Domain, ReceivedCode, RfCode, ACTION_COUNT};
use crate::code_table::{CodeTable, Rebind};
use crate::commands::{Command, CommandOutcome};
use crate::config::Config;
use crate::error::FanError;
use crate::fan::{FanMachine, FanState};
use crate::learning::{LearningController, LearningEvent};
use crate::light::{LightMachine, LightState};
use crate::plan::{Plan, MAX_PLAN_STEPS};
use crate::traits::RfDriver;
use crate::transmitter::Transmitter;

/// Capacity of the outbound event queue.
pub const EVENT_QUEUE_DEPTH: usize = 16;

/// Outbound notification for the MQTT side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BridgeEvent {
    /// Full fan snapshot after a change.
    Fan(FanState),
    /// Full light snapshot after a change.
    Light(LightState),
    /// Learning progress.
    Learning(LearningEvent),
    /// A slot was (re)bound; persist it if you care.
    CodeBound(Rebind),
    /// Reply to [`Command::QueryConfig`].
    Config(ConfigReport),
    /// A transmission failed; the device may not match the emulated state.
    Fault(FanError),
    /// Non-fatal finding (ambiguous codes, questionable configuration).
    Warning(FanError),
}

/// One row of the configuration report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CodeBinding {
    /// Slot.
    pub action: Action,
    /// Bound value, `None` when unbound.
    pub code: Option<u32>,
}

/// Snapshot of the RF profile and code table.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConfigReport {
    /// Carrier frequency in kHz.
    pub frequency_khz: u32,
    /// Protocol id.
    pub protocol: u8,
    /// Repeats per transmission.
    pub repeats: u8,
    /// Whether learning currently owns the radio.
    pub learning_active: bool,
    /// Every slot in enumeration order.
    pub bindings: heapless::Vec<CodeBinding, ACTION_COUNT>,
}

/// Boundary adapter between the command surface and the RF hardware.
pub struct CommandBridge<'a, R: RfDriver> {
    config: &'a Config,
    codes: CodeTable,
    tx: Transmitter<R>,
    fan: FanMachine,
    light: LightMachine,
    learning: LearningController,
    events: Deque<BridgeEvent, EVENT_QUEUE_DEPTH>,
}

impl<'a, R: RfDriver> CommandBridge<'a, R> {
    /// Build the bridge from configuration.
    ///
    /// Configuration findings are logged and queued as
    /// [`BridgeEvent::Warning`]s. With `learning.enabled_at_boot` a
    /// sequential learning session starts immediately.
    pub fn new(config: &'a Config, driver: R, now_ms: u64) -> Self {
        let mut bridge = Self {
            config,
            codes: CodeTable::from_config(&config.codes, &config.rf),
            tx: Transmitter::new(driver, &config.rf),
            fan: FanMachine::new(&config.fan),
            light: LightMachine::new(&config.light),
            learning: LearningController::new(&config.learning, &config.rf),
            events: Deque::new(),
        };

        for finding in config.validate() {
            warn!("config: {}", finding);
            bridge.push_event(BridgeEvent::Warning(finding));
        }

        info!(
            "bridge ready: {} of {} codes bound, protocol {} x{}",
            bridge.codes.bound_count(),
            ACTION_COUNT,
            config.rf.protocol,
            config.rf.repeats
        );

        if config.learning.enabled_at_boot {
            let event = bridge.learning.start(&bridge.codes, None, now_ms);
            bridge.push_event(BridgeEvent::Learning(event));
        }
        bridge
    }

    // ========================================================================
    // Inbound
    // ========================================================================

    /// Parse and apply one inbound message (topic relative to the prefix).
    pub fn handle_message(
        &mut self,
        topic: &str,
        payload: &[u8],
        now_ms: u64,
    ) -> Result<CommandOutcome, FanError> {
        let cmd = Command::parse(topic, payload).inspect_err(|e| {
            warn!("dropping message on {}: {}", topic, e);
        })?;
        self.apply(cmd, now_ms)
    }

    /// Apply a parsed command.
    pub fn apply(&mut self, cmd: Command, now_ms: u64) -> Result<CommandOutcome, FanError> {
        if let Some(domain) = cmd.domain() {
            if self.learning.is_active() {
                warn!("{} command ignored while learning", domain);
                return Err(FanError::LearningActive(domain));
            }
        }

        match cmd {
            Command::Fan(request) => {
                let plan = self.fan.plan(request);
                self.transition(Domain::Fan, &plan, now_ms)
            }
            Command::Light(request) => {
                let plan = self.light.plan(request);
                self.transition(Domain::Light, &plan, now_ms)
            }
            Command::Resync(domain) => {
                let abandoned = self.tx.clear();
                if abandoned > 0 {
                    debug!("resync abandoned {} pending RF step(s)", abandoned);
                }
                match domain {
                    Domain::Fan => self.fan.resync(),
                    Domain::Light => self.light.resync(),
                }
                info!("{} resynced to off", domain);
                self.push_state(domain);
                Ok(CommandOutcome::Resynced(domain))
            }
            Command::StartLearning(slot) => {
                self.tx.clear();
                let event = self.learning.start(&self.codes, slot, now_ms);
                self.push_event(BridgeEvent::Learning(event));
                Ok(CommandOutcome::Learning(event))
            }
            Command::CaptureCode(action) => {
                self.tx.clear();
                let event = self.learning.capture(action, now_ms);
                self.push_event(BridgeEvent::Learning(event));
                Ok(CommandOutcome::Learning(event))
            }
            Command::CancelLearning => match self.learning.cancel() {
                Some(event) => {
                    self.push_event(BridgeEvent::Learning(event));
                    Ok(CommandOutcome::Learning(event))
                }
                None => Ok(CommandOutcome::Unchanged),
            },
            Command::QueryConfig => {
                let report = self.config_report();
                self.push_event(BridgeEvent::Config(report));
                Ok(CommandOutcome::ConfigReported)
            }
        }
    }

    fn transition(
        &mut self,
        domain: Domain,
        plan: &Plan,
        now_ms: u64,
    ) -> Result<CommandOutcome, FanError> {
        if plan.is_empty() {
            debug!("{} request is a no-op", domain);
            return Ok(CommandOutcome::Unchanged);
        }

        let mut codes: heapless::Vec<RfCode, MAX_PLAN_STEPS> = heapless::Vec::new();
        for action in plan {
            let code = self
                .codes
                .lookup(*action)
                .inspect_err(|e| warn!("{} command dropped: {}", domain, e))?;
            let _ = codes.push(code);
        }

        for action in plan {
            match domain {
                Domain::Fan => self.fan.apply(*action),
                Domain::Light => self.light.apply(*action),
            };
        }
        self.tx.enqueue(&codes);
        self.push_state(domain);

        match self.tx.poll(now_ms) {
            Ok(_) => Ok(CommandOutcome::Transitioned { steps: plan.len() }),
            Err(e) => {
                self.push_event(BridgeEvent::Fault(e.clone()));
                Err(e)
            }
        }
    }

    /// Handle one code decoded by the receiver.
    ///
    /// While learning is active the code goes to learning only. Otherwise a
    /// code bound to a known action updates the matching state machine.
    pub fn on_receive(&mut self, code: ReceivedCode, now_ms: u64) -> Result<(), FanError> {
        if self.learning.is_active() {
            return self.learn(code, now_ms);
        }

        if code.protocol != self.config.rf.protocol {
            debug!(
                "ignoring code {} on protocol {}",
                code.value, code.protocol
            );
            return Ok(());
        }

        let Some(action) = self.codes.actions_for(code.value, code.protocol).next() else {
            debug!("ignoring unbound code {}", code.value);
            return Ok(());
        };

        let domain = action.domain();
        let changed = match domain {
            Domain::Fan => self.fan.apply(action),
            Domain::Light => self.light.apply(action),
        };
        if changed {
            info!("remote used: {}", action);
            self.push_state(domain);
        }
        Ok(())
    }

    fn learn(&mut self, code: ReceivedCode, now_ms: u64) -> Result<(), FanError> {
        let previous = self
            .learning
            .pending()
            .and_then(|action| self.codes.lookup(action).ok());

        match self.learning.on_receive(&mut self.codes, code, now_ms) {
            Ok(Some(event)) => {
                self.push_event(BridgeEvent::Learning(event));
                if let LearningEvent::Captured { action, code, .. } = event {
                    if previous != Some(code) {
                        self.push_event(BridgeEvent::CodeBound(Rebind {
                            action,
                            previous,
                            code,
                        }));
                    }
                    for conflict in self.codes.conflicts_with(action) {
                        warn!("learning: {}", conflict);
                        self.push_event(BridgeEvent::Warning(conflict));
                    }
                }
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(e) => {
                if let FanError::LearningTimeout(action) = e {
                    self.push_event(BridgeEvent::Learning(LearningEvent::TimedOut { action }));
                }
                Err(e)
            }
        }
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// One cooperative iteration: drain receptions, check the learning
    /// deadline, pump the transmit queue.
    pub fn tick(&mut self, now_ms: u64) {
        while let Some(code) = self.tx.driver_mut().try_receive() {
            debug!("RF rx {} (protocol {})", code.value, code.protocol);
            if let Err(e) = self.on_receive(code, now_ms) {
                debug!("receive not applied: {}", e);
            }
        }

        if let Err(FanError::LearningTimeout(action)) = self.learning.poll(now_ms) {
            self.push_event(BridgeEvent::Learning(LearningEvent::TimedOut { action }));
        }

        if let Err(e) = self.tx.poll(now_ms) {
            self.push_event(BridgeEvent::Fault(e));
        }
    }

    // ========================================================================
    // State and events
    // ========================================================================

    /// Seed the emulated fan state, e.g. from a retained snapshot. No event.
    pub fn restore_fan_state(&mut self, state: FanState) {
        self.fan.restore(state);
    }

    /// Seed the emulated light state. No event.
    pub fn restore_light_state(&mut self, state: LightState) {
        self.light.restore(state);
    }

    /// Current fan snapshot.
    pub fn fan_state(&self) -> FanState {
        self.fan.state()
    }

    /// Current light snapshot.
    pub fn light_state(&self) -> LightState {
        self.light.state()
    }

    /// The code table.
    pub fn codes(&self) -> &CodeTable {
        &self.codes
    }

    /// The learning controller.
    pub fn learning(&self) -> &LearningController {
        &self.learning
    }

    /// The transmitter (and through it the driver).
    pub fn transmitter(&self) -> &Transmitter<R> {
        &self.tx
    }

    /// Mutable access to the transmitter.
    pub fn transmitter_mut(&mut self) -> &mut Transmitter<R> {
        &mut self.tx
    }

    /// Configuration the bridge was built from.
    pub fn config(&self) -> &'a Config {
        self.config
    }

    /// Build the configuration report.
    pub fn config_report(&self) -> ConfigReport {
        let mut bindings = heapless::Vec::new();
        for (action, code) in self.codes.iter() {
            let _ = bindings.push(CodeBinding {
                action,
                code: code.map(|c| c.value),
            });
        }
        ConfigReport {
            frequency_khz: self.config.rf.frequency_khz,
            protocol: self.config.rf.protocol,
            repeats: self.config.rf.repeats,
            learning_active: self.learning.is_active(),
            bindings,
        }
    }

    /// Take the oldest pending event.
    pub fn pop_event(&mut self) -> Option<BridgeEvent> {
        self.events.pop_front()
    }

    /// Oldest pending event, left in the queue.
    pub fn peek_event(&self) -> Option<&BridgeEvent> {
        self.events.front()
    }

    /// Take every pending event, oldest first.
    ///
    /// The queue is empty when this returns, whether or not the result is
    /// used.
    pub fn drain_events(&mut self) -> heapless::Vec<BridgeEvent, EVENT_QUEUE_DEPTH> {
        let mut drained = heapless::Vec::new();
        while let Some(event) = self.events.pop_front() {
            // same capacity as the queue
            let _ = drained.push(event);
        }
        drained
    }

    /// Number of pending events.
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    fn push_state(&mut self, domain: Domain) {
        let event = match domain {
            Domain::Fan => {
                let state = self.fan.state();
                info!(
                    "fan: {} level {} {}",
                    state.mode, state.level, state.power
                );
                BridgeEvent::Fan(state)
            }
            Domain::Light => {
                let state = self.light.state();
                info!("light: level {} {}", state.level, state.power);
                BridgeEvent::Light(state)
            }
        };
        self.push_event(event);
    }

    fn push_event(&mut self, event: BridgeEvent) {
        if self.events.is_full() {
            if let Some(dropped) = self.events.pop_front() {
                warn!("event outbox full, dropping {:?}", dropped);
            }
        }
        let _ = self.events.push_back(event);
    }
}
