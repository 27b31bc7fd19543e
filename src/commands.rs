//! Inbound command vocabulary and topic/payload parsing.
//!
//! Commands arrive as an MQTT topic (relative to the configured prefix) plus
//! a payload. Payloads are plain text (`ON`, `3`, `winter`, `light_min`) or,
//! with the `serde-json-core` feature, a JSON object
//! (`{"state":"ON"}`, `{"level":3}`, `{"mode":"winter"}`,
//! `{"action":"light_min"}`).
//!
//! # Topics
//!
//! | Topic | Payload | Command |
//! |-------|---------|---------|
//! | `fan/set_power` | power | [`FanRequest::SetPower`] |
//! | `fan/set_mode` | mode | [`FanRequest::SetMode`] |
//! | `fan/set_level` | level | [`FanRequest::SetLevel`] |
//! | `fan/step_up`, `fan/step_down` | ignored | [`FanRequest::StepUp`], [`FanRequest::StepDown`] |
//! | `fan/resync`, `light/resync` | ignored | [`Command::Resync`] |
//! | `light/set_power` | power | [`LightRequest::SetPower`] |
//! | `light/set_level` | level | [`LightRequest::SetLevel`] |
//! | `light/step_up`, `light/step_down` | ignored | [`LightRequest::StepUp`], [`LightRequest::StepDown`] |
//! | `learning/start` | optional action | [`Command::StartLearning`] |
//! | `learning/capture` | action | [`Command::CaptureCode`] |
//! | `learning/cancel` | ignored | [`Command::CancelLearning`] |
//! | `config/get` | ignored | [`Command::QueryConfig`] |
//!
//! # Example
//!
//! ```rust
//! use rs_fanrf::{Command, FanRequest, Power, FanError};
//!
//! let cmd = Command::parse("fan/set_power", b"OFF").unwrap();
//! assert_eq!(cmd, Command::Fan(FanRequest::SetPower(Power::Off)));
//!
//! let cmd = Command::parse("fan/set_level", br#"{"level": 3}"#).unwrap();
//! assert_eq!(cmd, Command::Fan(FanRequest::SetLevel(3)));
//!
//! assert!(matches!(
//!     Command::parse("foo/bar", b""),
//!     Err(FanError::UnrecognizedCommand(_))
//! ));
//! ```

use core::fmt::Write;

use crate::action::{Action, Domain};
use crate::config::ShortString;
use crate::error::FanError;
use crate::fan::{FanMode, FanRequest};
use crate::learning::LearningEvent;
use crate::light::LightRequest;
use crate::plan::Power;

/// Every topic suffix the bridge accepts, relative to the MQTT prefix.
pub const COMMAND_TOPICS: [&str; 15] = [
    "fan/set_power",
    "fan/set_mode",
    "fan/set_level",
    "fan/step_up",
    "fan/step_down",
    "fan/resync",
    "light/set_power",
    "light/set_level",
    "light/step_up",
    "light/step_down",
    "light/resync",
    "learning/start",
    "learning/capture",
    "learning/cancel",
    "config/get",
];

/// A parsed inbound command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Fan transition.
    Fan(FanRequest),
    /// Light transition.
    Light(LightRequest),
    /// Operator asserts the device is physically off; nothing is sent.
    Resync(Domain),
    /// Sequential learning from the given slot or the first unbound one.
    StartLearning(Option<Action>),
    /// Learn exactly one slot.
    CaptureCode(Action),
    /// Abandon learning.
    CancelLearning,
    /// Publish the code table and RF profile.
    QueryConfig,
}

/// What applying a command did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandOutcome {
    /// A plan of `steps` codes was queued and the state updated.
    Transitioned {
        /// Number of primitive actions in the plan.
        steps: usize,
    },
    /// The request was a no-op; nothing was sent.
    Unchanged,
    /// Learning mode changed.
    Learning(LearningEvent),
    /// Emulated state was reset without transmitting.
    Resynced(Domain),
    /// The configuration report was queued.
    ConfigReported,
}

impl Command {
    /// Parse a topic (relative to the prefix) and payload.
    pub fn parse(topic: &str, payload: &[u8]) -> Result<Command, FanError> {
        let topic = topic.trim_matches('/');
        let text = core::str::from_utf8(payload)
            .map_err(|_| bad_payload(topic, "<binary>"))?
            .trim();

        let cmd = match topic {
            "fan/set_power" => Command::Fan(FanRequest::SetPower(power(topic, text, payload)?)),
            "fan/set_mode" => Command::Fan(FanRequest::SetMode(mode(topic, text, payload)?)),
            "fan/set_level" => Command::Fan(FanRequest::SetLevel(level(topic, text, payload)?)),
            "fan/step_up" => Command::Fan(FanRequest::StepUp),
            "fan/step_down" => Command::Fan(FanRequest::StepDown),
            "fan/resync" => Command::Resync(Domain::Fan),
            "light/set_power" => {
                Command::Light(LightRequest::SetPower(power(topic, text, payload)?))
            }
            "light/set_level" => {
                Command::Light(LightRequest::SetLevel(level(topic, text, payload)?))
            }
            "light/step_up" => Command::Light(LightRequest::StepUp),
            "light/step_down" => Command::Light(LightRequest::StepDown),
            "light/resync" => Command::Resync(Domain::Light),
            "learning/start" => {
                if text.is_empty() {
                    Command::StartLearning(None)
                } else {
                    Command::StartLearning(Some(action(topic, text, payload)?))
                }
            }
            "learning/capture" => Command::CaptureCode(action(topic, text, payload)?),
            "learning/cancel" => Command::CancelLearning,
            "config/get" => Command::QueryConfig,
            _ => return Err(FanError::unrecognized(topic)),
        };
        Ok(cmd)
    }

    /// Domain a fan/light command targets, if any.
    pub fn domain(&self) -> Option<Domain> {
        match self {
            Command::Fan(_) => Some(Domain::Fan),
            Command::Light(_) => Some(Domain::Light),
            _ => None,
        }
    }
}

fn bad_payload(topic: &str, text: &str) -> FanError {
    let mut s = ShortString::new();
    let _ = write!(s, "{}={}", topic, text);
    FanError::UnrecognizedCommand(s)
}

fn is_json(text: &str) -> bool {
    text.starts_with('{')
}

fn power(topic: &str, text: &str, payload: &[u8]) -> Result<Power, FanError> {
    let value = if is_json(text) {
        json_power(payload)
    } else {
        Some(text)
    };
    value
        .and_then(Power::from_text)
        .ok_or_else(|| bad_payload(topic, text))
}

fn mode(topic: &str, text: &str, payload: &[u8]) -> Result<FanMode, FanError> {
    let value = if is_json(text) {
        json_mode(payload)
    } else {
        Some(text)
    };
    value
        .and_then(FanMode::from_text)
        .ok_or_else(|| bad_payload(topic, text))
}

fn level(topic: &str, text: &str, payload: &[u8]) -> Result<u8, FanError> {
    let value = if is_json(text) {
        json_level(payload)
    } else {
        text.parse::<u32>().ok()
    };
    value
        .map(|v| v.min(u32::from(u8::MAX)) as u8)
        .ok_or_else(|| bad_payload(topic, text))
}

fn action(topic: &str, text: &str, payload: &[u8]) -> Result<Action, FanError> {
    let value = if is_json(text) {
        json_action(payload)
    } else {
        Some(text)
    };
    value
        .and_then(Action::from_text)
        .ok_or_else(|| bad_payload(topic, text))
}

#[cfg(feature = "serde-json-core")]
fn json_power(payload: &[u8]) -> Option<&str> {
    crate::messages::parse_power_request(payload).map(|r| r.state)
}

#[cfg(feature = "serde-json-core")]
fn json_mode(payload: &[u8]) -> Option<&str> {
    crate::messages::parse_mode_request(payload).map(|r| r.mode)
}

#[cfg(feature = "serde-json-core")]
fn json_level(payload: &[u8]) -> Option<u32> {
    crate::messages::parse_level_request(payload).map(|r| r.level)
}

#[cfg(feature = "serde-json-core")]
fn json_action(payload: &[u8]) -> Option<&str> {
    crate::messages::parse_action_request(payload).map(|r| r.action)
}

#[cfg(not(feature = "serde-json-core"))]
fn json_power(_payload: &[u8]) -> Option<&str> {
    None
}

#[cfg(not(feature = "serde-json-core"))]
fn json_mode(_payload: &[u8]) -> Option<&str> {
    None
}

#[cfg(not(feature = "serde-json-core"))]
fn json_level(_payload: &[u8]) -> Option<u32> {
    None
}

#[cfg(not(feature = "serde-json-core"))]
fn json_action(_payload: &[u8]) -> Option<&str> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_topic_parses() {
        for topic in COMMAND_TOPICS {
            let payload: &[u8] = match topic {
                "fan/set_power" | "light/set_power" => b"ON",
                "fan/set_mode" => b"summer",
                "fan/set_level" | "light/set_level" => b"3",
                "learning/capture" => b"fan_off",
                _ => b"",
            };
            assert!(Command::parse(topic, payload).is_ok(), "{topic}");
        }
    }

    #[test]
    fn text_payloads() {
        assert_eq!(
            Command::parse("light/set_power", b" off\n"),
            Ok(Command::Light(LightRequest::SetPower(Power::Off)))
        );
        assert_eq!(
            Command::parse("fan/set_mode", b"WINTER"),
            Ok(Command::Fan(FanRequest::SetMode(FanMode::Winter)))
        );
        assert_eq!(
            Command::parse("learning/capture", b"SUMMER_FAN_MODE"),
            Ok(Command::CaptureCode(Action::FanSummerMode))
        );
    }

    #[test]
    fn level_saturates() {
        assert_eq!(
            Command::parse("fan/set_level", b"1000"),
            Ok(Command::Fan(FanRequest::SetLevel(255)))
        );
    }

    #[cfg(feature = "serde-json-core")]
    #[test]
    fn json_payloads() {
        assert_eq!(
            Command::parse("fan/set_power", br#"{"state":"ON"}"#),
            Ok(Command::Fan(FanRequest::SetPower(Power::On)))
        );
        assert_eq!(
            Command::parse("light/set_level", br#"{"level": 6}"#),
            Ok(Command::Light(LightRequest::SetLevel(6)))
        );
        assert_eq!(
            Command::parse("fan/set_mode", br#"{"mode":"winter"}"#),
            Ok(Command::Fan(FanRequest::SetMode(FanMode::Winter)))
        );
        assert_eq!(
            Command::parse("learning/start", br#"{"action":"light_min"}"#),
            Ok(Command::StartLearning(Some(Action::LightMin)))
        );
    }

    #[test]
    fn learning_start_without_slot() {
        assert_eq!(
            Command::parse("learning/start", b""),
            Ok(Command::StartLearning(None))
        );
    }

    #[test]
    fn unknown_topic() {
        assert_eq!(
            Command::parse("foo/bar", b"ON"),
            Err(FanError::unrecognized("foo/bar"))
        );
    }

    #[test]
    fn bad_payloads() {
        assert_eq!(
            Command::parse("fan/set_level", b"fast"),
            Err(FanError::unrecognized("fan/set_level=fast"))
        );
        assert!(Command::parse("fan/set_power", b"maybe").is_err());
        assert!(Command::parse("fan/set_mode", b"unknown").is_err());
        assert!(Command::parse("learning/capture", b"").is_err());
        assert!(Command::parse("fan/set_power", &[0xff, 0x00]).is_err());
        assert!(Command::parse("fan/set_level", br#"{"level":"x"}"#).is_err());
    }

    #[test]
    fn leading_and_trailing_slashes_ignored() {
        assert_eq!(
            Command::parse("/config/get/", b""),
            Ok(Command::QueryConfig)
        );
    }

    #[test]
    fn command_domain() {
        assert_eq!(
            Command::Fan(FanRequest::StepUp).domain(),
            Some(Domain::Fan)
        );
        assert_eq!(Command::QueryConfig.domain(), None);
    }
}
