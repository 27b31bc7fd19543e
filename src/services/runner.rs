//! Cooperative control loop wiring an MQTT client to the bridge.
//!
//! Works with any implementation of the [`MqttClient`] trait, so the same
//! loop runs against `rumqttc` on a desktop and against [`MockMqtt`] in
//! tests.
//!
//! # Published Topics
//!
//! Relative to the configured prefix:
//!
//! | Topic | Retained | Payload |
//! |-------|----------|---------|
//! | `fan/state` | yes | `{"mode":"summer","level":1,"power":"ON"}` |
//! | `light/state` | yes | `{"level":6,"power":"ON"}` |
//! | `learning/state` | no | `{"event":"awaiting","action":"light_min"}` |
//! | `codes/<action>` | yes | `{"value":6789,"protocol":6,"repeats":8}` |
//! | `config/state` | no | protocol, repeats, frequency and every binding |
//! | `fault` | no | error text |
//! | `warning` | no | error text |
//!
//! # Example
//!
//! ```rust
//! use rs_fanrf::{CommandBridge, Config};
//! use rs_fanrf::hal::{MockMqtt, MockRf};
//! use rs_fanrf::services::BridgeRunner;
//!
//! let config = Config::default();
//! let bridge = CommandBridge::new(&config, MockRf::new(), 0);
//! let mut runner = BridgeRunner::new(bridge, MockMqtt::new());
//! runner.subscribe_command_topics().unwrap();
//!
//! runner.client_mut().queue_message("fan_control/light/set_power", "ON");
//! runner.poll(0).unwrap();
//!
//! assert_eq!(
//!     runner.client().last_payload("fan_control/light/state"),
//!     Some(r#"{"level":6,"power":"ON"}"#)
//! );
//! ```
//!
//! [`MockMqtt`]: crate::hal::MockMqtt

use log::{debug, info, warn};

use crate::bridge::{BridgeEvent, CommandBridge};
use crate::commands::COMMAND_TOPICS;
use crate::config::Config;
use crate::messages::to_json;
use crate::traits::{MqttClient, RfDriver};

const STATE_JSON_CAPACITY: usize = 128;
const LEARNING_JSON_CAPACITY: usize = 192;
const CONFIG_JSON_CAPACITY: usize = 1024;

// ============================================================================
// Bridge Runner
// ============================================================================

/// Drives a [`CommandBridge`] from an MQTT client.
///
/// Call [`poll`](Self::poll) on every loop iteration (every 20 ms or so).
pub struct BridgeRunner<'a, R, C>
where
    R: RfDriver,
    C: MqttClient,
{
    bridge: CommandBridge<'a, R>,
    client: C,
    config: &'a Config,
    online: bool,
    last_check_ms: Option<u64>,
    last_heartbeat_ms: Option<u64>,
}

impl<'a, R, C> BridgeRunner<'a, R, C>
where
    R: RfDriver,
    C: MqttClient,
{
    /// Create a runner around a bridge and a client.
    pub fn new(bridge: CommandBridge<'a, R>, client: C) -> Self {
        let config = bridge.config();
        let online = client.is_connected();
        Self {
            bridge,
            client,
            config,
            online,
            last_check_ms: None,
            last_heartbeat_ms: None,
        }
    }

    /// Get a reference to the MQTT client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Get a mutable reference to the MQTT client.
    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    /// Get a reference to the bridge.
    pub fn bridge(&self) -> &CommandBridge<'a, R> {
        &self.bridge
    }

    /// Get a mutable reference to the bridge.
    pub fn bridge_mut(&mut self) -> &mut CommandBridge<'a, R> {
        &mut self.bridge
    }

    /// Whether the last connectivity check saw the broker.
    pub fn is_online(&self) -> bool {
        self.online
    }

    /// Subscribe to every command topic.
    pub fn subscribe_command_topics(&mut self) -> Result<(), C::Error> {
        for suffix in COMMAND_TOPICS {
            let topic = self.config.mqtt.topic(suffix);
            self.client.subscribe(&topic)?;
        }
        debug!(
            "subscribed to {} topics under {}",
            COMMAND_TOPICS.len(),
            self.config.mqtt.topic_prefix
        );
        Ok(())
    }

    /// One loop iteration.
    ///
    /// Checks connectivity, feeds inbound messages to the bridge, ticks it,
    /// then publishes queued events and the heartbeat. The bridge ticks on
    /// every call. While offline events stay queued.
    ///
    /// A failed subscribe or publish marks the runner offline and is
    /// returned after the tick. The event being published stays queued, and
    /// the next connectivity check resubscribes and flushes it.
    pub fn poll(&mut self, now_ms: u64) -> Result<(), C::Error> {
        let reconnected = self.check_connectivity(now_ms);

        let mut result = Ok(());
        if reconnected {
            result = self.subscribe_command_topics();
            if result.is_err() {
                self.mark_offline("resubscribe");
            }
        }

        if self.online {
            while let Some(msg) = self.client.try_recv() {
                let Some(suffix) = self.config.mqtt.relative_topic(&msg.topic) else {
                    debug!("ignoring message on foreign topic {}", msg.topic);
                    continue;
                };
                match self.bridge.handle_message(suffix, &msg.payload, now_ms) {
                    Ok(outcome) => debug!("{}: {:?}", suffix, outcome),
                    Err(e) => debug!("{}: {}", suffix, e),
                }
            }
        }

        self.bridge.tick(now_ms);

        if self.online {
            result = self.publish_pending(now_ms, reconnected);
            if result.is_err() {
                self.mark_offline("publish");
            }
        }
        result
    }

    /// Publish the full fan and light snapshots (retained).
    pub fn publish_snapshots(&mut self) -> Result<(), C::Error> {
        let fan = self.bridge.fan_state();
        let light = self.bridge.light_state();
        self.publish_event(&BridgeEvent::Fan(fan))?;
        self.publish_event(&BridgeEvent::Light(light))
    }

    // Events leave the queue only once the client took them.
    fn publish_pending(&mut self, now_ms: u64, reconnected: bool) -> Result<(), C::Error> {
        while let Some(event) = self.bridge.peek_event().cloned() {
            self.publish_event(&event)?;
            self.bridge.pop_event();
        }

        let heartbeat_due = match self.last_heartbeat_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= u64::from(self.config.mqtt.heartbeat_ms),
        };
        if reconnected || heartbeat_due {
            self.publish_snapshots()?;
            self.last_heartbeat_ms = Some(now_ms);
        }
        Ok(())
    }

    fn mark_offline(&mut self, during: &str) {
        warn!("MQTT {} failed, holding events until the next check", during);
        self.online = false;
    }

    // Returns true on an offline -> online transition.
    fn check_connectivity(&mut self, now_ms: u64) -> bool {
        let due = match self.last_check_ms {
            None => true,
            Some(last) => {
                now_ms.saturating_sub(last) >= u64::from(self.config.wifi.check_interval_ms)
            }
        };
        if !due {
            return false;
        }
        self.last_check_ms = Some(now_ms);

        let connected = self.client.is_connected();
        let reconnected = connected && !self.online;
        if reconnected {
            info!("MQTT connection restored");
        } else if !connected && self.online {
            warn!("MQTT connection lost, holding events");
        }
        self.online = connected;
        reconnected
    }

    fn publish_event(&mut self, event: &BridgeEvent) -> Result<(), C::Error> {
        match event {
            BridgeEvent::Fan(state) => {
                self.publish_json::<_, STATE_JSON_CAPACITY>("fan/state", state, true)
            }
            BridgeEvent::Light(state) => {
                self.publish_json::<_, STATE_JSON_CAPACITY>("light/state", state, true)
            }
            BridgeEvent::Learning(learning) => self
                .publish_json::<_, LEARNING_JSON_CAPACITY>("learning/state", learning, false),
            BridgeEvent::CodeBound(rebind) => {
                let suffix = format!("codes/{}", rebind.action);
                self.publish_json::<_, STATE_JSON_CAPACITY>(&suffix, &rebind.code, true)
            }
            BridgeEvent::Config(report) => {
                self.publish_json::<_, CONFIG_JSON_CAPACITY>("config/state", report, false)
            }
            BridgeEvent::Fault(e) => self.publish_text("fault", &e.to_string()),
            BridgeEvent::Warning(e) => self.publish_text("warning", &e.to_string()),
        }
    }

    fn publish_json<T: serde::Serialize, const N: usize>(
        &mut self,
        suffix: &str,
        value: &T,
        retain: bool,
    ) -> Result<(), C::Error> {
        let Some(json) = to_json::<T, N>(value) else {
            warn!("payload for {} does not fit in {} bytes", suffix, N);
            return Ok(());
        };
        let topic = self.config.mqtt.topic(suffix);
        self.client.publish(&topic, json.as_bytes(), retain)
    }

    fn publish_text(&mut self, suffix: &str, text: &str) -> Result<(), C::Error> {
        let topic = self.config.mqtt.topic(suffix);
        self.client.publish(&topic, text.as_bytes(), false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::config::{CodeConfig, MqttConfig};
    use crate::hal::{MockMqtt, MockRf};

    fn quiet_config() -> Config {
        Config::default()
            .with_codes(
                CodeConfig::default()
                    .with(Action::FanSummerMax, 7001)
                    .with(Action::FanWinterMax, 7002),
            )
            .with_mqtt(MqttConfig::default().with_heartbeat_ms(10_000))
    }

    // ========================================================================
    // Subscription tests
    // ========================================================================

    #[test]
    fn subscribes_every_command_topic() {
        let config = quiet_config();
        let bridge = CommandBridge::new(&config, MockRf::new(), 0);
        let mut runner = BridgeRunner::new(bridge, MockMqtt::new());
        runner.subscribe_command_topics().unwrap();

        assert_eq!(runner.client().subscriptions.len(), COMMAND_TOPICS.len());
        assert!(runner.client().is_subscribed("fan_control/fan/set_level"));
        assert!(runner.client().is_subscribed("fan_control/learning/capture"));
    }

    // ========================================================================
    // Message flow tests
    // ========================================================================

    #[test]
    fn first_poll_publishes_snapshots() {
        let config = quiet_config();
        let bridge = CommandBridge::new(&config, MockRf::new(), 0);
        let mut runner = BridgeRunner::new(bridge, MockMqtt::new());
        runner.poll(0).unwrap();

        let fan = runner.client().published_to("fan_control/fan/state");
        assert_eq!(fan.len(), 1);
        assert!(fan[0].2, "fan state is retained");
        assert_eq!(
            runner.client().last_payload("fan_control/fan/state"),
            Some(r#"{"mode":"unknown","level":0,"power":"OFF"}"#)
        );
    }

    #[test]
    fn command_publishes_state_once() {
        let config = quiet_config();
        let bridge = CommandBridge::new(&config, MockRf::new(), 0);
        let mut runner = BridgeRunner::new(bridge, MockMqtt::new());
        runner.poll(0).unwrap();

        runner
            .client_mut()
            .queue_message("fan_control/fan/set_mode", r#"{"mode":"winter"}"#);
        runner.poll(20).unwrap();

        assert_eq!(runner.client().published_to("fan_control/fan/state").len(), 2);
        assert_eq!(
            runner.client().last_payload("fan_control/fan/state"),
            Some(r#"{"mode":"winter","level":1,"power":"ON"}"#)
        );
        assert_eq!(runner.bridge().transmitter().driver().sent_values(), vec![6755]);
    }

    #[test]
    fn foreign_topics_ignored() {
        let config = quiet_config();
        let bridge = CommandBridge::new(&config, MockRf::new(), 0);
        let mut runner = BridgeRunner::new(bridge, MockMqtt::new());
        runner.client_mut().queue_message("other/fan/set_power", "ON");
        runner.poll(0).unwrap();
        assert!(runner.bridge().transmitter().driver().transmissions.is_empty());
    }

    #[test]
    fn heartbeat_republishes() {
        let config = quiet_config();
        let bridge = CommandBridge::new(&config, MockRf::new(), 0);
        let mut runner = BridgeRunner::new(bridge, MockMqtt::new());
        runner.poll(0).unwrap();
        runner.poll(5_000).unwrap();
        assert_eq!(runner.client().published_to("fan_control/light/state").len(), 1);
        runner.poll(10_000).unwrap();
        assert_eq!(runner.client().published_to("fan_control/light/state").len(), 2);
    }

    #[test]
    fn learned_code_published_retained() {
        let config = quiet_config()
            .with_codes(CodeConfig::default().with(Action::LightMin, 0));
        let bridge = CommandBridge::new(&config, MockRf::new(), 0);
        let mut runner = BridgeRunner::new(bridge, MockMqtt::new());
        runner
            .client_mut()
            .queue_message("fan_control/learning/capture", "light_min");
        runner.poll(0).unwrap();
        assert_eq!(
            runner.client().last_payload("fan_control/learning/state"),
            Some(r#"{"event":"awaiting","action":"light_min"}"#)
        );

        for _ in 0..3 {
            runner
                .bridge_mut()
                .transmitter_mut()
                .driver_mut()
                .queue_receive(6789, 6);
        }
        runner.poll(100).unwrap();

        let codes = runner.client().published_to("fan_control/codes/light_min");
        assert_eq!(codes.len(), 1);
        assert!(codes[0].2);
        assert_eq!(
            runner.client().last_payload("fan_control/codes/light_min"),
            Some(r#"{"value":6789,"protocol":6,"repeats":8}"#)
        );
    }

    #[test]
    fn config_report_published() {
        let config = quiet_config();
        let bridge = CommandBridge::new(&config, MockRf::new(), 0);
        let mut runner = BridgeRunner::new(bridge, MockMqtt::new());
        runner.client_mut().queue_message("fan_control/config/get", "");
        runner.poll(0).unwrap();

        let payload = runner.client().last_payload("fan_control/config/state").unwrap();
        let report: serde_json::Value = serde_json::from_str(payload).unwrap();
        assert_eq!(report["protocol"], 6);
        assert_eq!(report["bindings"].as_array().unwrap().len(), 13);
        assert_eq!(report["bindings"][4]["action"], "fan_off");
        assert_eq!(report["bindings"][4]["code"], 6656);
    }

    #[test]
    fn warnings_published_as_text() {
        let config = Config::default();
        let bridge = CommandBridge::new(&config, MockRf::new(), 0);
        let mut runner = BridgeRunner::new(bridge, MockMqtt::new());
        runner.poll(0).unwrap();
        assert_eq!(runner.client().published_to("fan_control/warning").len(), 2);
    }

    // ========================================================================
    // Connectivity tests
    // ========================================================================

    #[test]
    fn offline_holds_events_and_republishes_on_reconnect() {
        let config = quiet_config();
        let bridge = CommandBridge::new(&config, MockRf::new(), 0);
        let mut mqtt = MockMqtt::new();
        mqtt.connected = false;
        let mut runner = BridgeRunner::new(bridge, mqtt);

        runner
            .bridge_mut()
            .handle_message("light/set_power", b"ON", 0)
            .unwrap();
        runner.poll(0).unwrap();
        assert!(!runner.is_online());
        assert!(runner.client().published.is_empty());
        assert_eq!(runner.bridge().pending_events(), 1);

        runner.client_mut().connected = true;
        runner.poll(500).unwrap();
        assert!(!runner.is_online(), "not checked again before the interval");

        runner.poll(1000).unwrap();
        assert!(runner.is_online());
        assert_eq!(runner.bridge().pending_events(), 0);
        // queued event plus the reconnect snapshot
        assert_eq!(runner.client().published_to("fan_control/light/state").len(), 2);
        assert_eq!(runner.client().subscriptions.len(), COMMAND_TOPICS.len());
    }

    #[test]
    fn failed_publish_keeps_events_and_still_ticks() {
        let config = quiet_config();
        let bridge = CommandBridge::new(&config, MockRf::new(), 0);
        let mut runner = BridgeRunner::new(bridge, MockMqtt::new());
        runner.poll(0).unwrap();

        runner
            .bridge_mut()
            .handle_message("light/set_power", b"ON", 10)
            .unwrap();
        runner
            .bridge_mut()
            .handle_message("light/set_power", b"OFF", 20)
            .unwrap();
        assert_eq!(runner.bridge().pending_events(), 2);

        // the link drops between connectivity checks
        runner.client_mut().connected = false;
        assert!(runner.poll(400).is_err());
        assert!(!runner.is_online());
        assert_eq!(runner.bridge().pending_events(), 2);
        assert_eq!(
            runner.bridge().transmitter().driver().sent_values(),
            vec![6834, 6784]
        );

        runner.client_mut().connected = true;
        runner.poll(1000).unwrap();
        assert!(runner.is_online());
        assert_eq!(runner.bridge().pending_events(), 0);
        assert_eq!(runner.client().subscriptions.len(), COMMAND_TOPICS.len());

        let light = runner.client().published_to("fan_control/light/state");
        let payloads: Vec<_> = light
            .iter()
            .map(|(_, p, _)| core::str::from_utf8(p).unwrap())
            .collect();
        // startup snapshot, both held events, reconnect snapshot
        assert_eq!(
            payloads,
            vec![
                r#"{"level":0,"power":"OFF"}"#,
                r#"{"level":6,"power":"ON"}"#,
                r#"{"level":0,"power":"OFF"}"#,
                r#"{"level":0,"power":"OFF"}"#,
            ]
        );
    }
}
