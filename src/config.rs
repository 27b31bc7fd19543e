//! Device configuration, built once at startup and passed by reference.
//!
//! Uses `heapless::String` for `no_std` compatibility while remaining
//! ergonomic to use on desktop with `std`.
//!
//! The defaults reproduce the code table of a Fanimation Slinger V2 remote
//! with DIP switches set to `OFF OFF ON OFF ON`, transmitting on 304.25 MHz
//! with protocol 6 and 8 repeats.
//!
//! # Example
//!
//! ```rust
//! use rs_fanrf::config::{Config, MqttConfig, RfConfig, CodeConfig};
//! use rs_fanrf::Action;
//!
//! // Use defaults
//! let config = Config::default();
//! assert_eq!(config.codes.get(Action::FanOff), 6656);
//!
//! // Or customize
//! let config = Config::default()
//!     .with_mqtt(MqttConfig::default().with_host("192.168.1.100"))
//!     .with_rf(RfConfig::default().with_repeats(10))
//!     .with_codes(CodeConfig::default().with(Action::LightMin, 0)); // learn it later
//! assert_eq!(config.codes.get(Action::LightMin), 0);
//! ```

extern crate alloc;
use alloc::vec::Vec;

use heapless::String as HString;

use crate::action::{Action, ACTION_COUNT};
use crate::code_table::CodeTable;
use crate::error::FanError;
use crate::fan::FanMode;

/// Maximum length for short config strings (hostnames, client IDs)
pub const MAX_SHORT_STRING: usize = 64;

/// Maximum length for longer config strings (topic prefixes, paths)
pub const MAX_LONG_STRING: usize = 128;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

/// Type alias for longer config strings
pub type LongString = HString<MAX_LONG_STRING>;

// ============================================================================
// Helper for creating heapless strings
// ============================================================================

fn utf8_prefix(s: &str, max: usize) -> &str {
    let take = s.len().min(max);
    let valid_end = s
        .char_indices()
        .take_while(|(i, c)| i + c.len_utf8() <= take)
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    &s[..valid_end]
}

/// Create a ShortString from a &str, truncating if too long
pub fn short_string(s: &str) -> ShortString {
    let mut hs = ShortString::new();
    let _ = hs.push_str(utf8_prefix(s, MAX_SHORT_STRING));
    hs
}

/// Create a LongString from a &str, truncating if too long
pub fn long_string(s: &str) -> LongString {
    let mut hs = LongString::new();
    let _ = hs.push_str(utf8_prefix(s, MAX_LONG_STRING));
    hs
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete application configuration
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// WiFi connection configuration
    pub wifi: WifiConfig,
    /// MQTT client configuration
    pub mqtt: MqttConfig,
    /// RF transmitter profile
    pub rf: RfConfig,
    /// Named RF codes, one per remote button
    pub codes: CodeConfig,
    /// Fan emulation parameters
    pub fan: FanConfig,
    /// Light emulation parameters
    pub light: LightConfig,
    /// Learning mode parameters
    pub learning: LearningConfig,
    /// Device identification
    pub device: DeviceConfig,
}

impl Config {
    /// Set WiFi configuration
    pub fn with_wifi(mut self, wifi: WifiConfig) -> Self {
        self.wifi = wifi;
        self
    }

    /// Set MQTT configuration
    pub fn with_mqtt(mut self, mqtt: MqttConfig) -> Self {
        self.mqtt = mqtt;
        self
    }

    /// Set RF configuration
    pub fn with_rf(mut self, rf: RfConfig) -> Self {
        self.rf = rf;
        self
    }

    /// Set the code table
    pub fn with_codes(mut self, codes: CodeConfig) -> Self {
        self.codes = codes;
        self
    }

    /// Set fan configuration
    pub fn with_fan(mut self, fan: FanConfig) -> Self {
        self.fan = fan;
        self
    }

    /// Set light configuration
    pub fn with_light(mut self, light: LightConfig) -> Self {
        self.light = light;
        self
    }

    /// Set learning configuration
    pub fn with_learning(mut self, learning: LearningConfig) -> Self {
        self.learning = learning;
        self
    }

    /// Set device configuration
    pub fn with_device(mut self, device: DeviceConfig) -> Self {
        self.device = device;
        self
    }

    /// Check the configuration and return every non-fatal finding.
    ///
    /// Out-of-range values come back as [`FanError::InvalidConfig`]; codes
    /// shared between actions come back as [`FanError::AmbiguousCode`].
    /// Nothing here prevents startup.
    pub fn validate(&self) -> Vec<FanError> {
        let mut findings = Vec::new();

        if self.rf.protocol == 0 {
            findings.push(FanError::InvalidConfig("rf.protocol must be non-zero"));
        }
        if self.rf.repeats == 0 {
            findings.push(FanError::InvalidConfig("rf.repeats must be non-zero"));
        }
        if self.fan.level_max == 0 {
            findings.push(FanError::InvalidConfig("fan.level_max must be at least 1"));
        }
        if self.fan.default_mode == FanMode::Unknown {
            findings.push(FanError::InvalidConfig(
                "fan.default_mode must be summer or winter",
            ));
        }
        if self.light.level_max == 0 {
            findings.push(FanError::InvalidConfig("light.level_max must be at least 1"));
        }
        if self.learning.confirmations == 0 {
            findings.push(FanError::InvalidConfig(
                "learning.confirmations must be at least 1",
            ));
        }

        findings.extend(CodeTable::from_config(&self.codes, &self.rf).validate());
        findings
    }
}

// ============================================================================
// MQTT Config
// ============================================================================

/// MQTT client configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MqttConfig {
    /// Broker hostname or IP
    pub host: ShortString,
    /// Broker port
    pub port: u16,
    /// Client ID (should be unique per device)
    pub client_id: ShortString,
    /// Topic prefix for all pub/sub (e.g., "fan_control" -> "fan_control/fan/set_level")
    pub topic_prefix: ShortString,
    /// Username for authentication (empty = no auth)
    pub username: ShortString,
    /// Password for authentication
    pub password: ShortString,
    /// Heartbeat/state publish interval in milliseconds
    pub heartbeat_ms: u32,
    /// Keep-alive interval in seconds
    pub keep_alive_secs: u16,
    /// Whether MQTT is enabled
    pub enabled: bool,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: short_string("127.0.0.1"),
            port: 1883,
            client_id: short_string("rs-fanrf"),
            topic_prefix: short_string("fan_control"),
            username: ShortString::new(),
            password: ShortString::new(),
            heartbeat_ms: 60_000,
            keep_alive_secs: 30,
            enabled: true,
        }
    }
}

impl MqttConfig {
    /// Set the broker host
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = short_string(host);
        self
    }

    /// Set the broker port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the client ID
    pub fn with_client_id(mut self, id: &str) -> Self {
        self.client_id = short_string(id);
        self
    }

    /// Set the topic prefix
    pub fn with_topic_prefix(mut self, prefix: &str) -> Self {
        self.topic_prefix = short_string(prefix);
        self
    }

    /// Set authentication credentials
    pub fn with_auth(mut self, username: &str, password: &str) -> Self {
        self.username = short_string(username);
        self.password = short_string(password);
        self
    }

    /// Set the heartbeat interval
    pub fn with_heartbeat_ms(mut self, ms: u32) -> Self {
        self.heartbeat_ms = ms;
        self
    }

    /// Enable or disable MQTT
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Build a topic string with the configured prefix
    pub fn topic(&self, suffix: &str) -> LongString {
        let mut topic = LongString::new();
        let _ = topic.push_str(self.topic_prefix.as_str());
        let _ = topic.push('/');
        let _ = topic.push_str(suffix);
        topic
    }

    /// Strip the configured prefix from an incoming topic.
    ///
    /// Returns `None` for topics outside this device's namespace.
    pub fn relative_topic<'t>(&self, topic: &'t str) -> Option<&'t str> {
        topic
            .strip_prefix(self.topic_prefix.as_str())?
            .strip_prefix('/')
    }

    /// Check if authentication is configured
    pub fn has_auth(&self) -> bool {
        !self.username.is_empty()
    }
}

// ============================================================================
// RF Config
// ============================================================================

/// Transmitter profile shared by every code in the table.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RfConfig {
    /// Carrier frequency of the remote in kHz (informational, set on the transceiver).
    pub frequency_khz: u32,
    /// Protocol id passed to the RF driver.
    pub protocol: u8,
    /// Frame repeats per transmission.
    pub repeats: u8,
    /// Minimum quiet time between two transmissions in milliseconds.
    pub min_gap_ms: u32,
    /// Extra attempts after a driver fault before giving up.
    pub tx_retries: u8,
}

impl Default for RfConfig {
    fn default() -> Self {
        Self {
            frequency_khz: 304_250,
            protocol: 6,
            repeats: 8,
            min_gap_ms: 300,
            tx_retries: 1,
        }
    }
}

impl RfConfig {
    /// Set the carrier frequency
    pub fn with_frequency_khz(mut self, khz: u32) -> Self {
        self.frequency_khz = khz;
        self
    }

    /// Set the protocol id
    pub fn with_protocol(mut self, protocol: u8) -> Self {
        self.protocol = protocol;
        self
    }

    /// Set the repeat count
    pub fn with_repeats(mut self, repeats: u8) -> Self {
        self.repeats = repeats;
        self
    }

    /// Set the minimum gap between transmissions
    pub fn with_min_gap_ms(mut self, ms: u32) -> Self {
        self.min_gap_ms = ms;
        self
    }

    /// Set how many times a faulted transmission is retried
    pub fn with_tx_retries(mut self, retries: u8) -> Self {
        self.tx_retries = retries;
        self
    }
}

// ============================================================================
// Code Config
// ============================================================================

/// Named RF codes, one per [`Action`]. A value of `0` leaves the action
/// unbound until it is learned.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CodeConfig {
    values: [u32; ACTION_COUNT],
}

impl Default for CodeConfig {
    fn default() -> Self {
        let mut codes = Self::unbound();
        for (action, value) in [
            (Action::LightOn, 6834),
            (Action::LightOff, 6784),
            (Action::LightMin, 6789),
            (Action::LightMax, 6830),
            (Action::FanOff, 6656),
            (Action::FanSummerMode, 6754),
            (Action::FanWinterMode, 6755),
            (Action::FanSummerOn, 6687),
            (Action::FanSummerMax, 6687),
            (Action::FanSummerMin, 6657),
            (Action::FanWinterOn, 6751),
            (Action::FanWinterMax, 6751),
            (Action::FanWinterMin, 6721),
        ] {
            codes.values[action.index()] = value;
        }
        codes
    }
}

impl CodeConfig {
    /// A table with every action unbound.
    pub const fn unbound() -> Self {
        Self {
            values: [0; ACTION_COUNT],
        }
    }

    /// Set the code for one action (`0` = unbound)
    pub fn with(mut self, action: Action, value: u32) -> Self {
        self.values[action.index()] = value;
        self
    }

    /// Code value configured for an action (`0` = unbound)
    pub fn get(&self, action: Action) -> u32 {
        self.values[action.index()]
    }
}

// ============================================================================
// Fan / Light Config
// ============================================================================

/// Fan emulation parameters
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FanConfig {
    /// Highest emulated speed level (MAX)
    pub level_max: u8,
    /// Mode established when powering on from an unknown mode
    pub default_mode: FanMode,
}

impl Default for FanConfig {
    fn default() -> Self {
        Self {
            level_max: 6,
            default_mode: FanMode::Summer,
        }
    }
}

impl FanConfig {
    /// Set the highest speed level
    pub fn with_level_max(mut self, max: u8) -> Self {
        self.level_max = max;
        self
    }

    /// Set the default mode
    pub fn with_default_mode(mut self, mode: FanMode) -> Self {
        self.default_mode = mode;
        self
    }
}

/// Light emulation parameters
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LightConfig {
    /// Highest emulated brightness level (MAX)
    pub level_max: u8,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self { level_max: 6 }
    }
}

impl LightConfig {
    /// Set the highest brightness level
    pub fn with_level_max(mut self, max: u8) -> Self {
        self.level_max = max;
        self
    }
}

// ============================================================================
// Learning Config
// ============================================================================

/// Learning mode parameters
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LearningConfig {
    /// Start a sequential learning session at boot
    pub enabled_at_boot: bool,
    /// How long each slot waits for a code, in milliseconds
    pub timeout_ms: u32,
    /// Identical consecutive receptions required before a code is accepted
    pub confirmations: u8,
    /// Quiet time after a capture before the same value counts again, in
    /// milliseconds
    pub holdoff_ms: u32,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            enabled_at_boot: false,
            timeout_ms: 30_000,
            confirmations: 3,
            holdoff_ms: 500,
        }
    }
}

impl LearningConfig {
    /// Enable or disable learning at boot
    pub fn with_enabled_at_boot(mut self, enabled: bool) -> Self {
        self.enabled_at_boot = enabled;
        self
    }

    /// Set the capture timeout
    pub fn with_timeout_ms(mut self, ms: u32) -> Self {
        self.timeout_ms = ms;
        self
    }

    /// Set the number of confirmations
    pub fn with_confirmations(mut self, n: u8) -> Self {
        self.confirmations = n;
        self
    }

    /// Set the post-capture hold-off
    pub fn with_holdoff_ms(mut self, ms: u32) -> Self {
        self.holdoff_ms = ms;
        self
    }
}

// ============================================================================
// WiFi Config
// ============================================================================

/// Link supervision settings.
///
/// Joining the network is the platform's job; the bridge only polls the
/// MQTT client's connectivity at this interval.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WifiConfig {
    /// Connectivity check interval in milliseconds
    pub check_interval_ms: u32,
}

impl Default for WifiConfig {
    fn default() -> Self {
        Self {
            check_interval_ms: 1000,
        }
    }
}

impl WifiConfig {
    /// Set the connectivity check interval
    pub fn with_check_interval_ms(mut self, ms: u32) -> Self {
        self.check_interval_ms = ms;
        self
    }
}

// ============================================================================
// Device Config
// ============================================================================

/// Device identification configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceConfig {
    /// Human-readable device name
    pub name: ShortString,
    /// Device ID (for multi-fan setups)
    pub id: ShortString,
    /// Log verbosity: 0 = errors, 1 = info, 2 = debug, 3+ = trace
    pub debug_level: u8,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: short_string("Ceiling Fan"),
            id: short_string("fan1"),
            debug_level: 2,
        }
    }
}

impl DeviceConfig {
    /// Set the device name
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = short_string(name);
        self
    }

    /// Set the device ID
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = short_string(id);
        self
    }

    /// Set the log verbosity
    pub fn with_debug_level(mut self, level: u8) -> Self {
        self.debug_level = level;
        self
    }

    /// Map the debug level onto a `log` filter.
    pub fn log_level(&self) -> log::LevelFilter {
        match self.debug_level {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.mqtt.port, 1883);
        assert_eq!(config.rf.protocol, 6);
        assert_eq!(config.rf.repeats, 8);
        assert_eq!(config.rf.frequency_khz, 304_250);
        assert!(!config.learning.enabled_at_boot);
    }

    #[test]
    fn default_codes_match_slinger_v2() {
        let codes = CodeConfig::default();
        assert_eq!(codes.get(Action::LightOn), 6834);
        assert_eq!(codes.get(Action::LightOff), 6784);
        assert_eq!(codes.get(Action::LightMin), 6789);
        assert_eq!(codes.get(Action::LightMax), 6830);
        assert_eq!(codes.get(Action::FanOff), 6656);
        assert_eq!(codes.get(Action::FanSummerMode), 6754);
        assert_eq!(codes.get(Action::FanWinterMode), 6755);
        assert_eq!(codes.get(Action::FanSummerMin), 6657);
        assert_eq!(codes.get(Action::FanWinterMin), 6721);
    }

    #[test]
    fn default_codes_have_two_known_duplicates() {
        let dups = Config::default().validate();
        assert_eq!(dups.len(), 2);
        assert!(dups.contains(&FanError::AmbiguousCode {
            code: 6687,
            first: Action::FanSummerOn,
            second: Action::FanSummerMax,
        }));
        assert!(dups.contains(&FanError::AmbiguousCode {
            code: 6751,
            first: Action::FanWinterOn,
            second: Action::FanWinterMax,
        }));
    }

    #[test]
    fn unbound_codes_are_not_duplicates() {
        let config = Config::default().with_codes(CodeConfig::unbound().with(Action::FanOff, 1));
        assert!(config.validate().is_empty());
    }

    #[test]
    fn validate_flags_bad_values() {
        let config = Config::default()
            .with_rf(RfConfig::default().with_protocol(0).with_repeats(0))
            .with_learning(LearningConfig::default().with_confirmations(0))
            .with_codes(CodeConfig::unbound());
        let findings = config.validate();
        assert_eq!(findings.len(), 3);
        assert!(findings.iter().all(|f| f.is_warning()));
    }

    #[test]
    fn mqtt_topic_building() {
        let mqtt = MqttConfig::default().with_topic_prefix("home/bedroom_fan");
        let topic = mqtt.topic("fan/set_level");
        assert_eq!(topic.as_str(), "home/bedroom_fan/fan/set_level");
    }

    #[test]
    fn mqtt_relative_topic() {
        let mqtt = MqttConfig::default();
        assert_eq!(
            mqtt.relative_topic("fan_control/light/set_power"),
            Some("light/set_power")
        );
        assert_eq!(mqtt.relative_topic("other/light/set_power"), None);
        assert_eq!(mqtt.relative_topic("fan_controlx/light"), None);
    }

    #[test]
    fn mqtt_auth_detection() {
        let no_auth = MqttConfig::default();
        assert!(!no_auth.has_auth());

        let with_auth = MqttConfig::default().with_auth("mqtt", "password");
        assert!(with_auth.has_auth());
    }

    #[test]
    fn short_string_truncation() {
        let long_input = "a".repeat(100);
        let s = short_string(&long_input);
        assert_eq!(s.len(), MAX_SHORT_STRING);
    }

    #[test]
    fn long_string_truncation() {
        let long_input = "b".repeat(200);
        let s = long_string(&long_input);
        assert_eq!(s.len(), MAX_LONG_STRING);
    }

    #[test]
    fn string_helpers_utf8_boundary() {
        // 3-byte characters: 21 fit into 64 bytes (63), the 22nd would not
        let input = "風".repeat(30);
        let s = short_string(&input);
        assert_eq!(s.len(), 63);
        assert!(core::str::from_utf8(s.as_bytes()).is_ok());
    }

    #[test]
    fn wifi_check_interval() {
        assert_eq!(WifiConfig::default().check_interval_ms, 1000);
        let wifi = WifiConfig::default().with_check_interval_ms(250);
        assert_eq!(wifi.check_interval_ms, 250);
    }

    #[test]
    fn device_log_level_mapping() {
        let device = DeviceConfig::default();
        assert_eq!(device.log_level(), log::LevelFilter::Debug);
        assert_eq!(
            device.clone().with_debug_level(0).log_level(),
            log::LevelFilter::Error
        );
        assert_eq!(
            device.clone().with_debug_level(1).log_level(),
            log::LevelFilter::Info
        );
        assert_eq!(device.with_debug_level(9).log_level(), log::LevelFilter::Trace);
    }

    #[test]
    fn builder_pattern() {
        let config = Config::default()
            .with_mqtt(
                MqttConfig::default()
                    .with_host("broker.local")
                    .with_port(8883),
            )
            .with_fan(FanConfig::default().with_level_max(3))
            .with_device(DeviceConfig::default().with_name("Bedroom Fan"));

        assert_eq!(config.mqtt.host.as_str(), "broker.local");
        assert_eq!(config.mqtt.port, 8883);
        assert_eq!(config.fan.level_max, 3);
        assert_eq!(config.device.name.as_str(), "Bedroom Fan");
    }
}


