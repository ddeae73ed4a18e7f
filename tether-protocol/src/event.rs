//! Decoded inbound events
//!
//! Every well-formed inbound frame decodes into one [`ShieldEvent`]: the
//! canonical fields both sides agree on, plus hashes of the result/action
//! text for switch-style routing. The raw [`ObjectView`] travels next to
//! the event as "cargo" so a peripheral can reinterpret keys the core does
//! not know about.

use heapless::String;

use crate::hash::{hash, hash_bytes};
use crate::json::{self, ObjectView};

/// Capacity of the text fields carried by a decoded event
pub const MAX_EVENT_TEXT: usize = 32;

/// Type discriminator reserved for connection-lifecycle events
pub const SYSTEM_EVENT: char = '!';

// Result keywords the companion uses on system events.
pub const RESULT_PING: &str = "PING";
pub const RESULT_REFRESH: &str = "REFRESH";
pub const RESULT_CONNECT: &str = "CONNECT";
pub const RESULT_SUSPEND: &str = "SUSPEND";
pub const RESULT_RESUME: &str = "RESUME";

pub const PING_HASH: u32 = hash(RESULT_PING);
pub const REFRESH_HASH: u32 = hash(RESULT_REFRESH);
pub const CONNECT_HASH: u32 = hash(RESULT_CONNECT);
pub const SUSPEND_HASH: u32 = hash(RESULT_SUSPEND);
pub const RESUME_HASH: u32 = hash(RESULT_RESUME);

/// System event kinds, matched by result hash
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SystemCommand {
    Ping,
    Refresh,
    Connect,
    Suspend,
    Resume,
}

impl SystemCommand {
    /// Match a result hash against the known keywords
    pub fn from_hash(hash: u32) -> Option<Self> {
        match hash {
            PING_HASH => Some(Self::Ping),
            REFRESH_HASH => Some(Self::Refresh),
            CONNECT_HASH => Some(Self::Connect),
            SUSPEND_HASH => Some(Self::Suspend),
            RESUME_HASH => Some(Self::Resume),
            _ => None,
        }
    }
}

/// Dispatch upgrade tag
///
/// A peripheral that reinterprets an event marks it `Sensor`; the
/// dispatcher then attaches the peripheral's registry slot as a
/// back-reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EventClass {
    #[default]
    Plain,
    Sensor,
}

/// Canonical decoded form of one inbound frame
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ShieldEvent {
    /// One-character event type; `!` is a system event
    pub discriminator: Option<char>,
    /// Caller-supplied correlation tag
    pub tag: String<MAX_EVENT_TEXT>,
    /// Id of the outbound message this responds to (`Pid` preferred,
    /// falling back to `Id`)
    pub id: i32,
    /// Result code; negative marks an error condition
    pub result_id: i64,
    /// Result text (may be truncated; the hash never is)
    pub result: String<MAX_EVENT_TEXT>,
    pub result_hash: u32,
    /// Action text (may be truncated; the hash never is)
    pub action: String<MAX_EVENT_TEXT>,
    pub action_hash: u32,
    /// Numeric payload
    pub value: f64,
    pub class: EventClass,
    /// Registry slot of the peripheral that upgraded this event
    pub peripheral: Option<usize>,
}

impl ShieldEvent {
    pub fn new() -> Self {
        Self {
            discriminator: None,
            tag: String::new(),
            id: 0,
            result_id: 0,
            result: String::new(),
            result_hash: 0,
            action: String::new(),
            action_hash: 0,
            value: 0.0,
            class: EventClass::Plain,
            peripheral: None,
        }
    }

    /// Extract the canonical fields from a parsed frame
    ///
    /// Missing keys decode to zero/empty values. Hashes cover the full
    /// unescaped text even when the stored copy is truncated.
    pub fn decode(object: &ObjectView<'_>) -> Self {
        let mut event = Self::new();
        if let Some(raw) = object.text("Type") {
            event.discriminator = json::unescape_chars(raw).next();
        }
        if let Some(raw) = object.text("Tag") {
            event.tag = json::unescape_into(raw);
        }
        event.id = object
            .int("Pid")
            .filter(|&id| id != 0)
            .or_else(|| object.int("Id"))
            .unwrap_or(0);
        event.result_id = object.long("ResultId").unwrap_or(0);
        if let Some(raw) = object.text("Result") {
            event.result = json::unescape_into(raw);
            event.result_hash = hash_bytes(json::unescape_bytes(raw), 0);
        }
        if let Some(raw) = object.text("Action") {
            event.action = json::unescape_into(raw);
            event.action_hash = hash_bytes(json::unescape_bytes(raw), 0);
        }
        event.value = object.number("Value").unwrap_or(0.0);
        event
    }

    /// The companion reported an error for this request
    pub fn is_error(&self) -> bool {
        self.result_id < 0
    }

    /// Connection-lifecycle event
    pub fn is_system(&self) -> bool {
        self.discriminator == Some(SYSTEM_EVENT)
    }
}

impl Default for ShieldEvent {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::parse;

    #[test]
    fn test_decode_full_event() {
        let frame = b"{'Type':'L','Tag':'lux','Id':7,'ResultId':3,'Result':'OK','Action':'READ','Value':42.5}";
        let object = parse(frame).unwrap();
        let event = ShieldEvent::decode(&object);
        assert_eq!(event.discriminator, Some('L'));
        assert_eq!(event.tag.as_str(), "lux");
        assert_eq!(event.id, 7);
        assert_eq!(event.result_id, 3);
        assert_eq!(event.result.as_str(), "OK");
        assert_eq!(event.result_hash, hash("OK"));
        assert_eq!(event.action.as_str(), "READ");
        assert_eq!(event.action_hash, hash("READ"));
        assert_eq!(event.value, 42.5);
        assert!(!event.is_error());
        assert!(!event.is_system());
    }

    #[test]
    fn test_decode_missing_keys_default() {
        let object = parse(b"{'Value':1.0}").unwrap();
        let event = ShieldEvent::decode(&object);
        assert_eq!(event.discriminator, None);
        assert!(event.tag.is_empty());
        assert_eq!(event.id, 0);
        assert_eq!(event.result_id, 0);
        assert_eq!(event.result_hash, 0);
        assert_eq!(event.value, 1.0);
    }

    #[test]
    fn test_pid_preferred_over_id() {
        let object = parse(b"{'Id':3,'Pid':9}").unwrap();
        assert_eq!(ShieldEvent::decode(&object).id, 9);
    }

    #[test]
    fn test_zero_pid_falls_back_to_id() {
        let object = parse(b"{'Id':3,'Pid':0}").unwrap();
        assert_eq!(ShieldEvent::decode(&object).id, 3);
    }

    #[test]
    fn test_negative_result_id_is_error() {
        let object = parse(b"{'ResultId':-2}").unwrap();
        assert!(ShieldEvent::decode(&object).is_error());
    }

    #[test]
    fn test_system_discriminator() {
        let object = parse(b"{'Type':'!','Result':'CONNECT'}").unwrap();
        let event = ShieldEvent::decode(&object);
        assert!(event.is_system());
        assert_eq!(
            SystemCommand::from_hash(event.result_hash),
            Some(SystemCommand::Connect)
        );
    }

    #[test]
    fn test_result_hash_covers_untruncated_text() {
        // 40 chars: longer than MAX_EVENT_TEXT, hash still covers it all
        let frame = b"{'Result':'0123456789012345678901234567890123456789'}";
        let object = parse(frame).unwrap();
        let event = ShieldEvent::decode(&object);
        assert_eq!(event.result.len(), MAX_EVENT_TEXT);
        assert_eq!(
            event.result_hash,
            hash("0123456789012345678901234567890123456789")
        );
    }

    #[test]
    fn test_unknown_result_hash_routes_nowhere() {
        assert_eq!(SystemCommand::from_hash(hash("NONSENSE")), None);
        assert_eq!(SystemCommand::from_hash(0), None);
    }
}
