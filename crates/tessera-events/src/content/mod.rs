//! The content codec.
//!
//! [`decode`] and [`encode`] are the only places content is converted
//! between JSON and typed values. Every envelope delegates to them.
//!
//! ```text
//! EventType ──┬─ m.room.message   → probe msgtype  → MessageType sub-schema
//!             ├─ m.room.encrypted → probe algorithm → ciphertext shape
//!             └─ everything else  → fixed schema for the type
//! ```

mod encrypted;
mod message;
mod room;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use crate::{EventError, EventType};

pub use encrypted::{parse_algorithm, Algorithm, Ciphertext, EncryptedContent, OlmMessage};
pub use message::{
    AudioContent, AudioInfo, EncryptedFile, FileContent, FileInfo, ImageContent, ImageInfo,
    JsonWebKey, LocationContent, LocationInfo, MessageContent, TextContent, ThumbnailInfo,
    VideoContent, VideoInfo,
};
pub use room::{
    AvatarContent, CanonicalAliasContent, CreateContent, EncryptionContent, JoinRule,
    JoinRulesContent, MemberContent, Membership, NameContent, NotificationPowerLevels,
    PowerLevelsContent, PreviousRoom, TagContent, TagInfo, TopicContent,
};

// ---------------------------------------------------------------------------
// EventContent
// ---------------------------------------------------------------------------

/// Typed content of an event: one variant per supported [`EventType`].
///
/// The variant is the discriminant. [`EventContent::event_type`] recovers
/// the type a value belongs to, and [`encode`] refuses to write it under
/// any other.
#[derive(Debug, Clone, PartialEq)]
pub enum EventContent {
    CanonicalAlias(CanonicalAliasContent),
    Create(CreateContent),
    Member(MemberContent),
    JoinRules(JoinRulesContent),
    PowerLevels(PowerLevelsContent),
    Name(NameContent),
    Avatar(AvatarContent),
    Topic(TopicContent),
    Tag(TagContent),
    Encryption(EncryptionContent),
    Encrypted(EncryptedContent),
    Message(MessageContent),
}

impl EventContent {
    /// The event type this content belongs to.
    pub fn event_type(&self) -> EventType {
        match self {
            Self::CanonicalAlias(_) => EventType::RoomCanonicalAlias,
            Self::Create(_) => EventType::RoomCreate,
            Self::Member(_) => EventType::RoomMember,
            Self::JoinRules(_) => EventType::RoomJoinRules,
            Self::PowerLevels(_) => EventType::RoomPowerLevels,
            Self::Name(_) => EventType::RoomName,
            Self::Avatar(_) => EventType::RoomAvatar,
            Self::Topic(_) => EventType::RoomTopic,
            Self::Tag(_) => EventType::Tag,
            Self::Encryption(_) => EventType::RoomEncryption,
            Self::Encrypted(_) => EventType::RoomEncrypted,
            Self::Message(_) => EventType::RoomMessage,
        }
    }
}

macro_rules! impl_from_content {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for EventContent {
                fn from(content: $ty) -> Self {
                    Self::$variant(content)
                }
            }
        )*
    };
}

impl_from_content! {
    CanonicalAlias(CanonicalAliasContent),
    Create(CreateContent),
    Member(MemberContent),
    JoinRules(JoinRulesContent),
    PowerLevels(PowerLevelsContent),
    Name(NameContent),
    Avatar(AvatarContent),
    Topic(TopicContent),
    Tag(TagContent),
    Encryption(EncryptionContent),
    Encrypted(EncryptedContent),
    Message(MessageContent),
}

// ---------------------------------------------------------------------------
// decode / encode
// ---------------------------------------------------------------------------
/// Decodes the `content` object of an event of type `ty`.
/// Decodes the `content` object of an event of type `event_type`.
///
/// Unknown fields are ignored. `content` must be a JSON object; serde
/// would otherwise accept a positional array for any struct schema.
///
/// # Errors
/// - [`EventError::UnsupportedMessageType`] / [`EventError::UnsupportedAlgorithm`]
///   when the nested discriminator is outside the registry.
/// - [`EventError::MalformedContent`] when a required field is missing or
///   has the wrong shape.
pub fn decode(ty: EventType, content: &Value) -> Result<EventContent, EventError> {
    tracing::trace!(event_type = %ty, "decoding content");

    expect_object(ty, content)?;
    Ok(match ty {
        EventType::RoomCanonicalAlias => EventContent::CanonicalAlias(from_content(ty, content)?),
        EventType::RoomCreate => EventContent::Create(from_content(ty, content)?),
        EventType::RoomMember => EventContent::Member(from_content(ty, content)?),
        EventType::RoomJoinRules => EventContent::JoinRules(from_content(ty, content)?),
        EventType::RoomPowerLevels => EventContent::PowerLevels(from_content(ty, content)?),
        EventType::RoomName => EventContent::Name(from_content(ty, content)?),
        EventType::RoomAvatar => EventContent::Avatar(from_content(ty, content)?),
        EventType::RoomTopic => EventContent::Topic(from_content(ty, content)?),
        EventType::Tag => EventContent::Tag(from_content(ty, content)?),
        EventType::RoomEncryption => {
            // Classify an unknown algorithm as unsupported, not malformed.
            encrypted::probe_algorithm(ty, content)?;
            EventContent::Encryption(from_content(ty, content)?)
        }
        EventType::RoomEncrypted => EventContent::Encrypted(encrypted::decode_encrypted(content)?),
        EventType::RoomMessage => EventContent::Message(message::decode_message(content)?),
    })
}

/// Encodes `content` as the `content` object of an event of type
/// `event_type`.
///
/// # Errors
/// - [`EventError::ContentTypeMismatch`] if `content` belongs to a
///   different event type. Nothing is re-tagged.
/// - [`EventError::MalformedContent`] if a message lacks a media source.
/// - [`EventError::Encode`] if serialization fails.
pub fn encode(content: &EventContent, event_type: EventType) -> Result<Value, EventError> {
    let actual = content.event_type();
    if actual != event_type {
        return Err(EventError::ContentTypeMismatch {
            declared: event_type,
            actual,
        });
    }

    let object = match content {
        EventContent::CanonicalAlias(c) => to_object(c)?,
        EventContent::Create(c) => to_object(c)?,
        EventContent::Member(c) => to_object(c)?,
        EventContent::JoinRules(c) => to_object(c)?,
        EventContent::PowerLevels(c) => to_object(c)?,
        EventContent::Name(c) => to_object(c)?,
        EventContent::Avatar(c) => to_object(c)?,
        EventContent::Topic(c) => to_object(c)?,
        EventContent::Tag(c) => to_object(c)?,
        EventContent::Encryption(c) => to_object(c)?,
        EventContent::Encrypted(c) => encrypted::encode_encrypted(c)?,
        EventContent::Message(c) => message::encode_message(c)?,
    };
    Ok(Value::Object(object))
}

// ---------------------------------------------------------------------------
// Helpers shared by the schema modules
// ---------------------------------------------------------------------------

/// Fails with malformed content unless `content` is a JSON object.
pub(crate) fn expect_object(event_type: EventType, content: &Value) -> Result<(), EventError> {
    if content.is_object() {
        Ok(())
    } else {
        Err(EventError::malformed(
            event_type,
            format!("content must be a JSON object, got {}", json_kind(content)),
        ))
    }
}

/// Name of a JSON value's kind, for error messages.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Decodes a fixed schema from a content object, reporting failures as
/// malformed content of `event_type`.
pub(crate) fn from_content<T: DeserializeOwned>(
    event_type: EventType,
    content: &Value,
) -> Result<T, EventError> {
    expect_object(event_type, content)?;
    T::deserialize(content).map_err(|e| EventError::malformed(event_type, e))
}

/// Serializes a schema struct, which must produce a JSON object.
pub(crate) fn to_object<T: Serialize>(value: &T) -> Result<Map<String, Value>, EventError> {
    match serde_json::to_value(value).map_err(EventError::Encode)? {
        Value::Object(object) => Ok(object),
        other => Err(EventError::Encode(serde::ser::Error::custom(format!(
            "content must serialize to an object, got {other}"
        )))),
    }
}
