//! The event type registry.
//!
//! Two closed tables map wire strings to tags:
//!
//! - [`EventType`]: the top-level `type` of every event.
//! - [`MessageType`]: the `msgtype` inside `m.room.message` content.
//!
//! Anything not in a table is an error, never a catch-all variant. A
//! client that silently accepted unknown types would have to carry
//! untyped content around, which is exactly what the codec exists to
//! prevent.

use std::fmt;
use std::str::FromStr;

use crate::EventError;

// ---------------------------------------------------------------------------
// EventType
// ---------------------------------------------------------------------------

/// The event types this client understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventType {
    /// `m.room.canonical_alias`
    RoomCanonicalAlias,
    /// `m.room.create`
    RoomCreate,
    /// `m.room.member`
    RoomMember,
    /// `m.room.join_rules`
    RoomJoinRules,
    /// `m.room.power_levels`
    RoomPowerLevels,
    /// `m.room.name`
    RoomName,
    /// `m.room.avatar`
    RoomAvatar,
    /// `m.room.topic`
    RoomTopic,
    /// `m.tag`
    Tag,
    /// `m.room.encryption`
    RoomEncryption,
    /// `m.room.encrypted`
    RoomEncrypted,
    /// `m.room.message`
    RoomMessage,
}

impl EventType {
    /// Every supported event type, in registry order.
    pub const ALL: [EventType; 12] = [
        Self::RoomCanonicalAlias,
        Self::RoomCreate,
        Self::RoomMember,
        Self::RoomJoinRules,
        Self::RoomPowerLevels,
        Self::RoomName,
        Self::RoomAvatar,
        Self::RoomTopic,
        Self::Tag,
        Self::RoomEncryption,
        Self::RoomEncrypted,
        Self::RoomMessage,
    ];

    /// The wire string for this type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RoomCanonicalAlias => "m.room.canonical_alias",
            Self::RoomCreate => "m.room.create",
            Self::RoomMember => "m.room.member",
            Self::RoomJoinRules => "m.room.join_rules",
            Self::RoomPowerLevels => "m.room.power_levels",
            Self::RoomName => "m.room.name",
            Self::RoomAvatar => "m.room.avatar",
            Self::RoomTopic => "m.room.topic",
            Self::Tag => "m.tag",
            Self::RoomEncryption => "m.room.encryption",
            Self::RoomEncrypted => "m.room.encrypted",
            Self::RoomMessage => "m.room.message",
        }
    }

    /// Returns `true` for types whose events replace a piece of room state
    /// (and therefore carry a `state_key`).
    pub fn is_state(self) -> bool {
        !matches!(self, Self::Tag | Self::RoomEncrypted | Self::RoomMessage)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_event_type(s)
    }
}

/// Looks up the tag for a wire event type.
///
/// # Errors
/// Returns [`EventError::UnsupportedEventType`] for any string not in the
/// registry.
pub fn parse_event_type(wire: &str) -> Result<EventType, EventError> {
    EventType::ALL
        .into_iter()
        .find(|t| t.as_str() == wire)
        .ok_or_else(|| EventError::UnsupportedEventType(wire.to_owned()))
}

// ---------------------------------------------------------------------------
// MessageType
// ---------------------------------------------------------------------------

/// The `msgtype` sub-types of `m.room.message`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    Text,
    Emote,
    Notice,
    Image,
    Location,
    Audio,
    Video,
    File,
}

impl MessageType {
    pub const ALL: [MessageType; 8] = [
        Self::Text,
        Self::Emote,
        Self::Notice,
        Self::Image,
        Self::Location,
        Self::Audio,
        Self::Video,
        Self::File,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "m.text",
            Self::Emote => "m.emote",
            Self::Notice => "m.notice",
            Self::Image => "m.image",
            Self::Location => "m.location",
            Self::Audio => "m.audio",
            Self::Video => "m.video",
            Self::File => "m.file",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_message_type(s)
    }
}

/// Looks up the tag for a wire `msgtype`.
///
/// # Errors
/// Returns [`EventError::UnsupportedMessageType`] for any string not in
/// the registry.
pub fn parse_message_type(wire: &str) -> Result<MessageType, EventError> {
    MessageType::ALL
        .into_iter()
        .find(|t| t.as_str() == wire)
        .ok_or_else(|| EventError::UnsupportedMessageType(wire.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_event_type_round_trips_through_its_wire_string() {
        for ty in EventType::ALL {
            assert_eq!(parse_event_type(ty.as_str()).unwrap(), ty);
        }
    }

    #[test]
    fn test_every_message_type_round_trips_through_its_wire_string() {
        for ty in MessageType::ALL {
            assert_eq!(parse_message_type(ty.as_str()).unwrap(), ty);
        }
    }

    #[test]
    fn test_unknown_event_type_is_an_error() {
        let err = parse_event_type("m.some.unknown.type").unwrap_err();
        assert!(matches!(
            err,
            EventError::UnsupportedEventType(ref s) if s == "m.some.unknown.type"
        ));
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        assert!(parse_event_type("M.ROOM.NAME").is_err());
        assert!(parse_message_type("m.Text").is_err());
    }

    #[test]
    fn test_unknown_message_type_is_an_error() {
        let err = parse_message_type("m.sticker").unwrap_err();
        assert!(matches!(err, EventError::UnsupportedMessageType(_)));
    }

    #[test]
    fn test_from_str_delegates_to_registry() {
        let ty: EventType = "m.room.topic".parse().unwrap();
        assert_eq!(ty, EventType::RoomTopic);
    }

    #[test]
    fn test_state_types() {
        assert!(EventType::RoomMember.is_state());
        assert!(EventType::RoomEncryption.is_state());
        assert!(!EventType::RoomMessage.is_state());
        assert!(!EventType::RoomEncrypted.is_state());
        assert!(!EventType::Tag.is_state());
    }

    #[test]
    fn test_display_uses_wire_string() {
        assert_eq!(EventType::RoomPowerLevels.to_string(), "m.room.power_levels");
        assert_eq!(MessageType::Location.to_string(), "m.location");
    }
}
