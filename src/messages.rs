//! JSON payload types for the MQTT command surface.
//!
//! Inbound requests borrow their strings from the payload and can be
//! deserialized with either `serde_json` (desktop) or `serde-json-core`
//! (embedded). Outbound snapshots are serialized into fixed-capacity
//! `heapless::String`s.
//!
//! # Example
//!
//! ```
//! use rs_fanrf::messages::LevelRequest;
//!
//! // Desktop: using serde_json
//! #[cfg(feature = "std")]
//! {
//!     let req: LevelRequest = serde_json::from_str(r#"{"level": 3}"#).unwrap();
//!     assert_eq!(req.level, 3);
//! }
//!
//! // Embedded: using serde-json-core
//! #[cfg(feature = "serde-json-core")]
//! {
//!     let (req, _): (LevelRequest, _) = serde_json_core::from_slice(br#"{"level": 3}"#).unwrap();
//!     assert_eq!(req.level, 3);
//! }
//! ```

use serde::{Deserialize, Serialize};

// ============================================================================
// Request Types
// ============================================================================

/// Power request.
///
/// ```json
/// {"state": "ON"}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerRequest<'a> {
    /// `ON`/`OFF` (any case), `1`/`0` or `true`/`false` as text
    pub state: &'a str,
}

/// Addressed level request.
///
/// ```json
/// {"level": 3}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelRequest {
    /// Target level; values above the configured maximum are clamped
    pub level: u32,
}

/// Fan mode request.
///
/// ```json
/// {"mode": "winter"}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeRequest<'a> {
    /// `summer` or `winter`
    pub mode: &'a str,
}

/// Learning slot request.
///
/// ```json
/// {"action": "light_min"}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest<'a> {
    /// Action name (snake_case or legacy form)
    pub action: &'a str,
}

// ============================================================================
// Parsing Functions (using serde-json-core for no_std compatibility)
// ============================================================================

/// Parse a power request from JSON bytes.
///
/// ```
/// use rs_fanrf::messages::parse_power_request;
///
/// let req = parse_power_request(br#"{"state": "OFF"}"#).unwrap();
/// assert_eq!(req.state, "OFF");
/// ```
#[cfg(feature = "serde-json-core")]
pub fn parse_power_request(json: &[u8]) -> Option<PowerRequest<'_>> {
    serde_json_core::from_slice(json).ok().map(|(req, _)| req)
}

/// Parse a level request from JSON bytes.
///
/// ```
/// use rs_fanrf::messages::parse_level_request;
///
/// assert_eq!(parse_level_request(br#"{"level": 6}"#).unwrap().level, 6);
/// assert!(parse_level_request(br#"{"level": -1}"#).is_none());
/// ```
#[cfg(feature = "serde-json-core")]
pub fn parse_level_request(json: &[u8]) -> Option<LevelRequest> {
    serde_json_core::from_slice(json).ok().map(|(req, _)| req)
}

/// Parse a mode request from JSON bytes.
#[cfg(feature = "serde-json-core")]
pub fn parse_mode_request(json: &[u8]) -> Option<ModeRequest<'_>> {
    serde_json_core::from_slice(json).ok().map(|(req, _)| req)
}

/// Parse an action request from JSON bytes.
#[cfg(feature = "serde-json-core")]
pub fn parse_action_request(json: &[u8]) -> Option<ActionRequest<'_>> {
    serde_json_core::from_slice(json).ok().map(|(req, _)| req)
}

/// Serialize a value into a fixed-capacity JSON string.
///
/// Returns `None` if it does not fit in `N` bytes.
///
/// ```
/// use rs_fanrf::messages::to_json;
/// use rs_fanrf::{FanMode, FanState, Power};
///
/// let state = FanState { mode: FanMode::Summer, level: 0, power: Power::Off };
/// let json = to_json::<_, 64>(&state).unwrap();
/// assert_eq!(json.as_str(), r#"{"mode":"summer","level":0,"power":"OFF"}"#);
/// ```
#[cfg(feature = "serde-json-core")]
pub fn to_json<T: Serialize, const N: usize>(value: &T) -> Option<heapless::String<N>> {
    serde_json_core::to_string(value).ok()
}
