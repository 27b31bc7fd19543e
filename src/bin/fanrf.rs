//! Desktop fan bridge: MQTT in, RF codes out.
//!
//! Without a transceiver attached the radio is a dry run: every code that
//! would go on air is logged instead. Useful for checking plans and the MQTT
//! surface against a real broker before flashing hardware.
//!
//! # Environment
//!
//! | Variable | Default |
//! |----------|---------|
//! | `FANRF_MQTT_HOST` | `127.0.0.1` |
//! | `FANRF_MQTT_PORT` | `1883` |
//! | `FANRF_MQTT_USER` / `FANRF_MQTT_PASSWORD` | no auth |
//! | `FANRF_TOPIC_PREFIX` | `fan_control` |
//! | `FANRF_DEBUG_LEVEL` | `2` (debug) |
//! | `FANRF_LEARN_AT_BOOT` | `0` |
//!
//! `RUST_LOG` overrides the log filter derived from `FANRF_DEBUG_LEVEL`.
//!
//! # Run
//!
//! ```bash
//! FANRF_MQTT_HOST=broker.local cargo run --features mqtt --bin fanrf
//! mosquitto_pub -t fan_control/fan/set_level -m 6
//! ```

use std::convert::Infallible;
use std::env;
use std::time::Duration;

use log::{info, warn};
use rs_fanrf::hal::StdClock;
use rs_fanrf::services::{BridgeRunner, RumqttcClient};
use rs_fanrf::traits::{Clock, RfDriver};
use rs_fanrf::{CommandBridge, Config, DeviceConfig, LearningConfig, MqttConfig, ReceivedCode};

/// Main loop interval in milliseconds (50Hz = 20ms)
const LOOP_INTERVAL_MS: u64 = 20;

/// Radio that logs codes instead of sending them.
#[derive(Debug, Default)]
struct DryRunRf {
    sent: u64,
}

impl RfDriver for DryRunRf {
    type Error = Infallible;

    fn transmit(&mut self, value: u32, protocol: u8, repeats: u8) -> Result<(), Infallible> {
        self.sent += 1;
        info!(
            "[dry-run #{}] code {} protocol {} x{}",
            self.sent, value, protocol, repeats
        );
        Ok(())
    }

    fn try_receive(&mut self) -> Option<ReceivedCode> {
        None
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            eprintln!("ignoring unparsable {}={}", name, raw);
            default
        }),
        Err(_) => default,
    }
}

fn load_config() -> Config {
    let defaults = Config::default();

    let mut mqtt = MqttConfig::default()
        .with_host(&env_or("FANRF_MQTT_HOST", defaults.mqtt.host.to_string()))
        .with_port(env_or("FANRF_MQTT_PORT", defaults.mqtt.port))
        .with_topic_prefix(&env_or(
            "FANRF_TOPIC_PREFIX",
            defaults.mqtt.topic_prefix.to_string(),
        ));
    if let Ok(user) = env::var("FANRF_MQTT_USER") {
        let password = env::var("FANRF_MQTT_PASSWORD").unwrap_or_default();
        mqtt = mqtt.with_auth(&user, &password);
    }

    let learn_at_boot = env_or("FANRF_LEARN_AT_BOOT", 0u8) != 0;

    defaults
        .with_mqtt(mqtt)
        .with_learning(LearningConfig::default().with_enabled_at_boot(learn_at_boot))
        .with_device(
            DeviceConfig::default()
                .with_debug_level(env_or("FANRF_DEBUG_LEVEL", DeviceConfig::default().debug_level)),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config();

    env_logger::Builder::new()
        .filter_level(config.device.log_level())
        .parse_default_env()
        .init();

    info!(
        "{} starting: {} kHz, protocol {}, prefix {}",
        config.device.name, config.rf.frequency_khz, config.rf.protocol, config.mqtt.topic_prefix
    );

    let clock = StdClock::new();
    let client = RumqttcClient::spawn(&config.mqtt);
    let bridge = CommandBridge::new(&config, DryRunRf::default(), clock.now_ms());
    let mut runner = BridgeRunner::new(bridge, client);
    runner.subscribe_command_topics()?;

    let mut interval = tokio::time::interval(Duration::from_millis(LOOP_INTERVAL_MS));
    loop {
        interval.tick().await;
        if let Err(e) = runner.poll(clock.now_ms()) {
            warn!("{}", e);
        }
    }
}
