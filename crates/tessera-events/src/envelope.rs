//! Event envelopes: metadata wrapped around one content value.
//!
//! The protocol delivers the same content in several outer shapes,
//! depending on where the event came from:
//!
//! | Envelope | Metadata beyond `type` + `content` |
//! |---|---|
//! | [`ClientEvent`] | `event_id`, `origin_server_ts`, `room_id`, `sender`, `state_key?`, `unsigned?` |
//! | [`ClientEventWithoutRoomId`] | same, minus `room_id` (room is implied by the sync section) |
//! | [`StrippedStateEvent`] | `sender`, `state_key` (invites, room previews) |
//! | [`ToDeviceEvent`] | `sender` |
//! | [`MinimalEvent`] | nothing (account data) |
//!
//! Decoding reads the metadata first, then the `type` discriminator, then
//! hands `content` to [`content::decode`]. Encoding writes the metadata
//! and asks [`content::encode`] for the content. Envelopes never touch
//! content fields themselves.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tessera_identifiers::{RoomId, UserId};

use crate::content::{self, EventContent};
use crate::{parse_event_type, EventError, EventType};

// ---------------------------------------------------------------------------
// Event trait
// ---------------------------------------------------------------------------

/// Behaviour shared by all envelope shapes.
///
/// `from_json` / `to_json` carry the typed [`EventError`]. The serde
/// `Serialize`/`Deserialize` impls of each envelope delegate to them, so
/// envelopes can also be embedded in larger serde structures (at the cost
/// of flattening the error into a message).
pub trait Event: Sized {
    /// Short name of the envelope shape, for logs.
    const SHAPE: &'static str;

    /// The declared type of this event.
    fn event_type(&self) -> EventType;

    /// The typed content.
    fn content(&self) -> &EventContent;

    /// The event id, for envelopes that carry one.
    fn event_id(&self) -> Option<&str> {
        None
    }

    /// Decodes an envelope from a JSON value.
    fn from_json(value: Value) -> Result<Self, EventError>;

    /// Encodes the envelope to a JSON value.
    fn to_json(&self) -> Result<Value, EventError>;
}

/// Parses the discriminator and decodes the content it selects.
fn decode_typed_content(
    event_type: &str,
    content: &Value,
) -> Result<(EventType, EventContent), EventError> {
    let event_type = parse_event_type(event_type)?;
    let content = content::decode(event_type, content)?;
    Ok((event_type, content))
}

/// Deserializes an envelope's wire struct.
///
/// Derived struct deserializers also accept a positional array, so the
/// object check happens here, before serde sees the value.
fn from_wire<T: DeserializeOwned>(value: Value) -> Result<T, EventError> {
    if !value.is_object() {
        return Err(EventError::MalformedEvent(serde::de::Error::custom(format!(
            "event must be a JSON object, got {}",
            content::json_kind(&value)
        ))));
    }
    serde_json::from_value(value).map_err(EventError::MalformedEvent)
}

fn to_value<T: Serialize>(wire: &T) -> Result<Value, EventError> {
    serde_json::to_value(wire).map_err(EventError::Encode)
}

/// Implements serde's `Serialize`/`Deserialize` for envelopes in terms of
/// [`Event::to_json`] / [`Event::from_json`].
///
/// Deriving them would not work: an envelope's content can only be decoded
/// after its `type` has been read, which a derive has no way to express.
/// Going through `Value` keeps one decode path for both entry points.
macro_rules! serde_via_event {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Serialize for $ty {
                fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                    self.to_json()
                        .map_err(<S::Error as serde::ser::Error>::custom)?
                        .serialize(serializer)
                }
            }

            impl<'de> Deserialize<'de> for $ty {
                fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                    let value = Value::deserialize(deserializer)?;
                    Self::from_json(value).map_err(serde::de::Error::custom)
                }
            }
        )*
    };
}

// ---------------------------------------------------------------------------
// Unsigned
// ---------------------------------------------------------------------------

/// Server-attached metadata that isn't covered by the sender's signature.
///
/// The protocol puts the whole redacting event under
/// `redacted_because`. Only its id is kept here: the full event would be
/// the same shape as the event containing it. Callers that need the
/// redaction itself look it up by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "UnsignedWire", into = "UnsignedWire")]
pub struct Unsigned {
    /// Milliseconds since the event was sent, as seen by the server.
    pub age: Option<i64>,
    /// Id of the event that redacted this one.
    pub redacted_because: Option<String>,
    /// Set on the sender's own events, echoing the send request.
    pub transaction_id: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct UnsignedWire {
    #[serde(skip_serializing_if = "Option::is_none")]
    age: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    redacted_because: Option<RedactionRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    transaction_id: Option<String>,
}

/// `redacted_because` as found on the wire: normally the redaction event
/// itself (only `event_id` is read), sometimes just its id.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RedactionRef {
    Id(String),
    Event { event_id: String },
}

impl From<UnsignedWire> for Unsigned {
    fn from(wire: UnsignedWire) -> Self {
        Self {
            age: wire.age,
            redacted_because: wire.redacted_because.map(|r| match r {
                RedactionRef::Id(id) | RedactionRef::Event { event_id: id } => id,
            }),
            transaction_id: wire.transaction_id,
        }
    }
}

impl From<Unsigned> for UnsignedWire {
    fn from(unsigned: Unsigned) -> Self {
        Self {
            age: unsigned.age,
            redacted_because: unsigned
                .redacted_because
                .map(|event_id| RedactionRef::Event { event_id }),
            transaction_id: unsigned.transaction_id,
        }
    }
}

// ---------------------------------------------------------------------------
// ClientEvent
// ---------------------------------------------------------------------------

/// A room event as returned by most client APIs (`/messages`, `/event`, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct ClientEvent {
    pub event_id: String,
    /// Milliseconds since the epoch on the originating server.
    pub origin_server_ts: u64,
    pub room_id: RoomId,
    pub sender: UserId,
    /// Present on state events only.
    pub state_key: Option<String>,
    pub unsigned: Option<Unsigned>,
    pub event_type: EventType,
    pub content: EventContent,
}

#[derive(Deserialize)]
struct ClientEventIn {
    event_id: String,
    origin_server_ts: u64,
    room_id: String,
    sender: String,
    #[serde(default)]
    state_key: Option<String>,
    #[serde(default)]
    unsigned: Option<Unsigned>,
    #[serde(rename = "type")]
    event_type: String,
    content: Value,
}

#[derive(Serialize)]
struct ClientEventOut<'a> {
    #[serde(rename = "type")]
    event_type: &'static str,
    content: Value,
    event_id: &'a str,
    origin_server_ts: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    room_id: Option<&'a RoomId>,
    sender: &'a UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    state_key: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    unsigned: Option<&'a Unsigned>,
}

impl ClientEvent {
    /// Drops the room id, e.g. to hand the event to code that works on
    /// sync timelines.
    pub fn without_room_id(self) -> ClientEventWithoutRoomId {
        ClientEventWithoutRoomId {
            event_id: self.event_id,
            origin_server_ts: self.origin_server_ts,
            sender: self.sender,
            state_key: self.state_key,
            unsigned: self.unsigned,
            event_type: self.event_type,
            content: self.content,
        }
    }
}

impl Event for ClientEvent {
    const SHAPE: &'static str = "client event";

    fn event_type(&self) -> EventType {
        self.event_type
    }

    fn content(&self) -> &EventContent {
        &self.content
    }

    fn event_id(&self) -> Option<&str> {
        Some(&self.event_id)
    }

    fn from_json(value: Value) -> Result<Self, EventError> {
        let raw: ClientEventIn = from_wire(value)?;
        let room_id = RoomId::try_from(raw.room_id)?;
        let sender = UserId::try_from(raw.sender)?;
        let (event_type, content) = decode_typed_content(&raw.event_type, &raw.content)?;
        Ok(Self {
            event_id: raw.event_id,
            origin_server_ts: raw.origin_server_ts,
            room_id,
            sender,
            state_key: raw.state_key,
            unsigned: raw.unsigned,
            event_type,
            content,
        })
    }

    fn to_json(&self) -> Result<Value, EventError> {
        to_value(&ClientEventOut {
            event_type: self.event_type.as_str(),
            content: content::encode(&self.content, self.event_type)?,
            event_id: &self.event_id,
            origin_server_ts: self.origin_server_ts,
            room_id: Some(&self.room_id),
            sender: &self.sender,
            state_key: self.state_key.as_deref(),
            unsigned: self.unsigned.as_ref(),
        })
    }
}

// ---------------------------------------------------------------------------
// ClientEventWithoutRoomId
// ---------------------------------------------------------------------------

/// A room event inside a sync response, where the room is given by the
/// enclosing section rather than by the event.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientEventWithoutRoomId {
    pub event_id: String,
    pub origin_server_ts: u64,
    pub sender: UserId,
    pub state_key: Option<String>,
    pub unsigned: Option<Unsigned>,
    pub event_type: EventType,
    pub content: EventContent,
}

#[derive(Deserialize)]
struct ClientEventWithoutRoomIdIn {
    event_id: String,
    origin_server_ts: u64,
    sender: String,
    #[serde(default)]
    state_key: Option<String>,
    #[serde(default)]
    unsigned: Option<Unsigned>,
    #[serde(rename = "type")]
    event_type: String,
    content: Value,
}

impl ClientEventWithoutRoomId {
    /// Attaches the room the event was delivered under.
    pub fn into_client_event(self, room_id: RoomId) -> ClientEvent {
        ClientEvent {
            event_id: self.event_id,
            origin_server_ts: self.origin_server_ts,
            room_id,
            sender: self.sender,
            state_key: self.state_key,
            unsigned: self.unsigned,
            event_type: self.event_type,
            content: self.content,
        }
    }
}

impl Event for ClientEventWithoutRoomId {
    const SHAPE: &'static str = "client event without room id";

    fn event_type(&self) -> EventType {
        self.event_type
    }

    fn content(&self) -> &EventContent {
        &self.content
    }

    fn event_id(&self) -> Option<&str> {
        Some(&self.event_id)
    }

    fn from_json(value: Value) -> Result<Self, EventError> {
        let raw: ClientEventWithoutRoomIdIn = from_wire(value)?;
        let sender = UserId::try_from(raw.sender)?;
        let (event_type, content) = decode_typed_content(&raw.event_type, &raw.content)?;
        Ok(Self {
            event_id: raw.event_id,
            origin_server_ts: raw.origin_server_ts,
            sender,
            state_key: raw.state_key,
            unsigned: raw.unsigned,
            event_type,
            content,
        })
    }

    fn to_json(&self) -> Result<Value, EventError> {
        to_value(&ClientEventOut {
            event_type: self.event_type.as_str(),
            content: content::encode(&self.content, self.event_type)?,
            event_id: &self.event_id,
            origin_server_ts: self.origin_server_ts,
            room_id: None,
            sender: &self.sender,
            state_key: self.state_key.as_deref(),
            unsigned: self.unsigned.as_ref(),
        })
    }
}

// ---------------------------------------------------------------------------
// StrippedStateEvent
// ---------------------------------------------------------------------------

/// A reduced state event, as found in invites and room previews.
#[derive(Debug, Clone, PartialEq)]
pub struct StrippedStateEvent {
    pub sender: UserId,
    pub state_key: String,
    pub event_type: EventType,
    pub content: EventContent,
}

#[derive(Deserialize)]
struct StrippedStateEventIn {
    sender: String,
    state_key: String,
    #[serde(rename = "type")]
    event_type: String,
    content: Value,
}

#[derive(Serialize)]
struct StrippedStateEventOut<'a> {
    #[serde(rename = "type")]
    event_type: &'static str,
    content: Value,
    sender: &'a UserId,
    state_key: &'a str,
}

impl Event for StrippedStateEvent {
    const SHAPE: &'static str = "stripped state event";

    fn event_type(&self) -> EventType {
        self.event_type
    }

    fn content(&self) -> &EventContent {
        &self.content
    }

    fn from_json(value: Value) -> Result<Self, EventError> {
        let raw: StrippedStateEventIn = from_wire(value)?;
        let sender = UserId::try_from(raw.sender)?;
        let (event_type, content) = decode_typed_content(&raw.event_type, &raw.content)?;
        Ok(Self {
            sender,
            state_key: raw.state_key,
            event_type,
            content,
        })
    }

    fn to_json(&self) -> Result<Value, EventError> {
        to_value(&StrippedStateEventOut {
            event_type: self.event_type.as_str(),
            content: content::encode(&self.content, self.event_type)?,
            sender: &self.sender,
            state_key: &self.state_key,
        })
    }
}

// ---------------------------------------------------------------------------
// ToDeviceEvent
// ---------------------------------------------------------------------------

/// An event sent directly to a device rather than to a room.
#[derive(Debug, Clone, PartialEq)]
pub struct ToDeviceEvent {
    pub sender: UserId,
    pub event_type: EventType,
    pub content: EventContent,
}

#[derive(Deserialize)]
struct ToDeviceEventIn {
    sender: String,
    #[serde(rename = "type")]
    event_type: String,
    content: Value,
}

#[derive(Serialize)]
struct ToDeviceEventOut<'a> {
    #[serde(rename = "type")]
    event_type: &'static str,
    content: Value,
    sender: &'a UserId,
}

impl Event for ToDeviceEvent {
    const SHAPE: &'static str = "to-device event";

    fn event_type(&self) -> EventType {
        self.event_type
    }

    fn content(&self) -> &EventContent {
        &self.content
    }

    fn from_json(value: Value) -> Result<Self, EventError> {
        let raw: ToDeviceEventIn = from_wire(value)?;
        let sender = UserId::try_from(raw.sender)?;
        let (event_type, content) = decode_typed_content(&raw.event_type, &raw.content)?;
        Ok(Self {
            sender,
            event_type,
            content,
        })
    }

    fn to_json(&self) -> Result<Value, EventError> {
        to_value(&ToDeviceEventOut {
            event_type: self.event_type.as_str(),
            content: content::encode(&self.content, self.event_type)?,
            sender: &self.sender,
        })
    }
}

// ---------------------------------------------------------------------------
// MinimalEvent
// ---------------------------------------------------------------------------

/// Just `type` and `content`. Used for account data such as `m.tag`.
#[derive(Debug, Clone, PartialEq)]
pub struct MinimalEvent {
    pub event_type: EventType,
    pub content: EventContent,
}

impl MinimalEvent {
    /// Wraps content under its own type.
    pub fn new(content: EventContent) -> Self {
        Self {
            event_type: content.event_type(),
            content,
        }
    }
}

#[derive(Deserialize)]
struct MinimalEventIn {
    #[serde(rename = "type")]
    event_type: String,
    content: Value,
}

#[derive(Serialize)]
struct MinimalEventOut {
    #[serde(rename = "type")]
    event_type: &'static str,
    content: Value,
}

impl Event for MinimalEvent {
    const SHAPE: &'static str = "minimal event";

    fn event_type(&self) -> EventType {
        self.event_type
    }

    fn content(&self) -> &EventContent {
        &self.content
    }

    fn from_json(value: Value) -> Result<Self, EventError> {
        let raw: MinimalEventIn = from_wire(value)?;
        let (event_type, content) = decode_typed_content(&raw.event_type, &raw.content)?;
        Ok(Self {
            event_type,
            content,
        })
    }

    fn to_json(&self) -> Result<Value, EventError> {
        to_value(&MinimalEventOut {
            event_type: self.event_type.as_str(),
            content: content::encode(&self.content, self.event_type)?,
        })
    }
}

serde_via_event!(
    ClientEvent,
    ClientEventWithoutRoomId,
    StrippedStateEvent,
    ToDeviceEvent,
    MinimalEvent,
);

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::content::{MessageContent, NameContent};

    #[test]
    fn test_unsigned_accepts_nested_redaction_event() {
        let unsigned: Unsigned = serde_json::from_value(json!({
            "age": 1234,
            "redacted_because": {
                "type": "m.room.redaction",
                "event_id": "$redaction",
                "sender": "@mod:s.com",
                "content": { "reason": "spam" }
            }
        }))
        .unwrap();
        assert_eq!(unsigned.age, Some(1234));
        assert_eq!(unsigned.redacted_because.as_deref(), Some("$redaction"));
    }

    #[test]
    fn test_unsigned_accepts_bare_redaction_id() {
        let unsigned: Unsigned =
            serde_json::from_value(json!({ "redacted_because": "$redaction" })).unwrap();
        assert_eq!(unsigned.redacted_because.as_deref(), Some("$redaction"));
    }

    #[test]
    fn test_unsigned_encodes_redaction_as_reference_object() {
        let unsigned = Unsigned {
            age: None,
            redacted_because: Some("$r".into()),
            transaction_id: Some("txn1".into()),
        };
        assert_eq!(
            serde_json::to_value(&unsigned).unwrap(),
            json!({ "redacted_because": { "event_id": "$r" }, "transaction_id": "txn1" })
        );
    }

    #[test]
    fn test_client_event_missing_event_id_is_malformed_event() {
        let err = ClientEvent::from_json(json!({
            "type": "m.room.name",
            "content": { "name": "x" },
            "origin_server_ts": 1,
            "room_id": "!r:s.com",
            "sender": "@a:s.com"
        }))
        .unwrap_err();
        assert!(matches!(err, EventError::MalformedEvent(_)));
    }

    #[test]
    fn test_client_event_bad_sender_is_identifier_error() {
        let err = ClientEvent::from_json(json!({
            "type": "m.room.name",
            "content": { "name": "x" },
            "event_id": "$1",
            "origin_server_ts": 1,
            "room_id": "!r:s.com",
            "sender": "alice"
        }))
        .unwrap_err();
        assert!(matches!(err, EventError::InvalidIdentifier(_)));
    }

    #[test]
    fn test_array_envelope_is_malformed_event() {
        let err = MinimalEvent::from_json(json!(["m.room.topic", { "topic": "t" }])).unwrap_err();
        assert!(matches!(err, EventError::MalformedEvent(_)));
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn test_array_content_inside_envelope_is_malformed_content() {
        let err = ToDeviceEvent::from_json(json!({
            "sender": "@a:s.com",
            "type": "m.room.name",
            "content": ["Lobby"]
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            EventError::MalformedContent { event_type: EventType::RoomName, .. }
        ));
    }

    #[test]
    fn test_stripped_state_requires_state_key() {
        let err = StrippedStateEvent::from_json(json!({
            "type": "m.room.name",
            "content": { "name": "x" },
            "sender": "@a:s.com"
        }))
        .unwrap_err();
        assert!(matches!(err, EventError::MalformedEvent(_)));
    }

    #[test]
    fn test_envelope_mismatch_fails_on_encode() {
        let event = MinimalEvent {
            event_type: EventType::RoomAvatar,
            content: EventContent::Message(MessageContent::text("hi")),
        };
        assert!(matches!(
            event.to_json(),
            Err(EventError::ContentTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_room_id_round_trip_between_shapes() {
        let event = ClientEventWithoutRoomId {
            event_id: "$1".into(),
            origin_server_ts: 5,
            sender: UserId::parse("@a:s.com").unwrap(),
            state_key: Some(String::new()),
            unsigned: None,
            event_type: EventType::RoomName,
            content: NameContent { name: "n".into() }.into(),
        };
        let room_id = RoomId::parse("!r:s.com").unwrap();
        let full = event.clone().into_client_event(room_id);
        assert_eq!(full.without_room_id(), event);
    }

    #[test]
    fn test_serde_impls_delegate_to_event() {
        let event: MinimalEvent =
            serde_json::from_value(json!({ "type": "m.tag", "content": { "tags": {} } })).unwrap();
        assert_eq!(event.event_type, EventType::Tag);

        let bad: Result<MinimalEvent, _> =
            serde_json::from_value(json!({ "type": "m.nope", "content": {} }));
        assert!(bad.unwrap_err().to_string().contains("m.nope"));
    }
}
