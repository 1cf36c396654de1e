//! `m.room.message` content and its `msgtype` sub-schemas.
//!
//! Decoding happens in two passes over the same JSON object:
//!
//! 1. A probe reads only `msgtype`. Nothing else about the object has to
//!    be present or well-formed for the probe to succeed.
//! 2. The sub-schema selected by that `msgtype` decodes the whole object.
//!
//! Encoding serializes the sub-schema and puts `msgtype` back, derived
//! from the [`MessageContent`] variant itself.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{expect_object, from_content, to_object};
use crate::{parse_message_type, EventError, EventType, MessageType};

// ---------------------------------------------------------------------------
// MessageContent
// ---------------------------------------------------------------------------

/// Content of an `m.room.message` event, one variant per `msgtype`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    Text(TextContent),
    Emote(TextContent),
    Notice(TextContent),
    Image(ImageContent),
    Location(LocationContent),
    Audio(AudioContent),
    Video(VideoContent),
    File(FileContent),
}

impl MessageContent {
    /// Plain `m.text` message.
    pub fn text(body: impl Into<String>) -> Self {
        Self::Text(TextContent::plain(body))
    }

    /// The `msgtype` this content is sent under.
    pub fn msgtype(&self) -> MessageType {
        match self {
            Self::Text(_) => MessageType::Text,
            Self::Emote(_) => MessageType::Emote,
            Self::Notice(_) => MessageType::Notice,
            Self::Image(_) => MessageType::Image,
            Self::Location(_) => MessageType::Location,
            Self::Audio(_) => MessageType::Audio,
            Self::Video(_) => MessageType::Video,
            Self::File(_) => MessageType::File,
        }
    }

    /// The fallback text every message type carries.
    pub fn body(&self) -> &str {
        match self {
            Self::Text(c) | Self::Emote(c) | Self::Notice(c) => &c.body,
            Self::Image(c) => &c.body,
            Self::Location(c) => &c.body,
            Self::Audio(c) => &c.body,
            Self::Video(c) => &c.body,
            Self::File(c) => &c.body,
        }
    }

    /// Media messages must point at their media one way or another.
    fn check_media_source(&self) -> Result<(), EventError> {
        let (url, file) = match self {
            Self::Image(c) => (&c.url, &c.file),
            Self::Audio(c) => (&c.url, &c.file),
            Self::Video(c) => (&c.url, &c.file),
            Self::File(c) => (&c.url, &c.file),
            _ => return Ok(()),
        };
        if url.is_none() && file.is_none() {
            return Err(EventError::malformed(
                EventType::RoomMessage,
                format!("`{}` content needs either `url` or `file`", self.msgtype()),
            ));
        }
        Ok(())
    }
}

/// The minimal schema used to read the discriminator.
///
/// Serde ignores fields a struct doesn't name, so this deserializes from
/// any message object that has a string `msgtype`, even one whose other
/// fields are missing or wrong. That keeps "unknown msgtype" apart from
/// "known msgtype, broken body".
#[derive(Deserialize)]
struct MsgTypeProbe {
    msgtype: String,
}

/// Decodes `m.room.message` content: probe `msgtype`, then decode the
/// whole object against the selected sub-schema.
pub(crate) fn decode_message(content: &Value) -> Result<MessageContent, EventError> {
    expect_object(EventType::RoomMessage, content)?;
    let probe = MsgTypeProbe::deserialize(content)
        .map_err(|e| EventError::malformed(EventType::RoomMessage, e))?;
    let msgtype = parse_message_type(&probe.msgtype)?;

    tracing::trace!(%msgtype, "decoding message content");

    let ty = EventType::RoomMessage;
    let message = match msgtype {
        MessageType::Text => MessageContent::Text(from_content(ty, content)?),
        MessageType::Emote => MessageContent::Emote(from_content(ty, content)?),
        MessageType::Notice => MessageContent::Notice(from_content(ty, content)?),
        MessageType::Image => MessageContent::Image(from_content(ty, content)?),
        MessageType::Location => MessageContent::Location(from_content(ty, content)?),
        MessageType::Audio => MessageContent::Audio(from_content(ty, content)?),
        MessageType::Video => MessageContent::Video(from_content(ty, content)?),
        MessageType::File => MessageContent::File(from_content(ty, content)?),
    };
    message.check_media_source()?;
    Ok(message)
}

/// Encodes message content, re-adding `msgtype` from the variant.
pub(crate) fn encode_message(
    message: &MessageContent,
) -> Result<Map<String, Value>, EventError> {
    message.check_media_source()?;

    let mut object = match message {
        MessageContent::Text(c) | MessageContent::Emote(c) | MessageContent::Notice(c) => {
            to_object(c)?
        }
        MessageContent::Image(c) => to_object(c)?,
        MessageContent::Location(c) => to_object(c)?,
        MessageContent::Audio(c) => to_object(c)?,
        MessageContent::Video(c) => to_object(c)?,
        MessageContent::File(c) => to_object(c)?,
    };
    object.insert(
        "msgtype".to_owned(),
        Value::String(message.msgtype().as_str().to_owned()),
    );
    Ok(object)
}

// ---------------------------------------------------------------------------
// Sub-schemas
// ---------------------------------------------------------------------------

/// `m.text`, `m.emote` and `m.notice` share this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextContent {
    pub body: String,

    /// Markup of `formatted_body`, in practice `org.matrix.custom.html`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted_body: Option<String>,
}

impl TextContent {
    pub fn plain(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            format: None,
            formatted_body: None,
        }
    }
}

/// `m.image`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageContent {
    pub body: String,

    /// `mxc://` URI of unencrypted media.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Descriptor of encrypted media; replaces `url` in encrypted rooms.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<EncryptedFile>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<ImageInfo>,
}

/// `m.location`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationContent {
    pub body: String,

    /// `geo:` URI, e.g. `geo:51.5008,0.1247`.
    pub geo_uri: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<LocationInfo>,
}

/// `m.audio`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioContent {
    pub body: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<EncryptedFile>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<AudioInfo>,
}

/// `m.video`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoContent {
    pub body: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<EncryptedFile>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<VideoInfo>,
}

/// `m.file`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContent {
    pub body: String,

    /// Original file name, when `body` is a caption rather than the name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<EncryptedFile>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<FileInfo>,
}

// ---------------------------------------------------------------------------
// Media info
// ---------------------------------------------------------------------------

/// Metadata of an image. Also used by `m.room.avatar`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub w: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_file: Option<EncryptedFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_info: Option<ThumbnailInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub w: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_file: Option<EncryptedFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_info: Option<ThumbnailInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioInfo {
    /// Milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoInfo {
    /// Milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub w: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_file: Option<EncryptedFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_info: Option<ThumbnailInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_file: Option<EncryptedFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_info: Option<ThumbnailInfo>,
}

// ---------------------------------------------------------------------------
// Encrypted attachments
// ---------------------------------------------------------------------------

/// Where an encrypted attachment lives and what is needed to decrypt it.
///
/// Only the shape is modelled; producing and checking these values is the
/// job of the crypto layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedFile {
    pub url: String,
    pub key: JsonWebKey,
    /// Unpadded base64 AES-CTR counter block.
    pub iv: String,
    /// Hash algorithm name (`sha256`) to unpadded base64 digest.
    pub hashes: BTreeMap<String, String>,
    /// Attachment format version, `v2`.
    pub v: String,
}

/// The AES key of an [`EncryptedFile`], as a JSON Web Key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonWebKey {
    pub kty: String,
    pub key_ops: Vec<String>,
    pub alg: String,
    /// Unpadded url-safe base64 key.
    pub k: String,
    pub ext: bool,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_probe_ignores_other_fields() {
        // `body` has the wrong type, but the probe only looks at msgtype.
        let content = json!({ "msgtype": "m.text", "body": 42 });
        let probe = MsgTypeProbe::deserialize(&content).unwrap();
        assert_eq!(probe.msgtype, "m.text");
    }

    #[test]
    fn test_decode_text() {
        let content = json!({ "msgtype": "m.text", "body": "hello" });
        let message = decode_message(&content).unwrap();
        assert_eq!(message, MessageContent::text("hello"));
    }

    #[test]
    fn test_decode_selects_sub_schema_by_msgtype() {
        let content = json!({
            "msgtype": "m.notice",
            "body": "bot says hi"
        });
        let message = decode_message(&content).unwrap();
        assert!(matches!(message, MessageContent::Notice(_)));
        assert_eq!(message.msgtype(), MessageType::Notice);
    }

    #[test]
    fn test_decode_missing_msgtype_is_malformed() {
        let content = json!({ "body": "no discriminator" });
        let err = decode_message(&content).unwrap_err();
        assert!(matches!(
            err,
            EventError::MalformedContent { event_type: EventType::RoomMessage, .. }
        ));
    }

    #[test]
    fn test_decode_array_message_is_malformed() {
        let err = decode_message(&json!(["m.text", "hello"])).unwrap_err();
        assert!(matches!(
            err,
            EventError::MalformedContent { event_type: EventType::RoomMessage, .. }
        ));
    }

    #[test]
    fn test_decode_unknown_msgtype_is_unsupported() {
        let content = json!({ "msgtype": "m.sticker", "body": "x" });
        let err = decode_message(&content).unwrap_err();
        assert!(matches!(err, EventError::UnsupportedMessageType(ref t) if t == "m.sticker"));
    }

    #[test]
    fn test_decode_known_msgtype_with_bad_body_is_malformed() {
        let content = json!({ "msgtype": "m.text", "body": 42 });
        let err = decode_message(&content).unwrap_err();
        assert!(matches!(err, EventError::MalformedContent { .. }));
    }

    #[test]
    fn test_decode_location_requires_geo_uri() {
        let content = json!({ "msgtype": "m.location", "body": "here" });
        assert!(decode_message(&content).is_err());
    }

    #[test]
    fn test_media_without_source_is_malformed() {
        let content = json!({ "msgtype": "m.image", "body": "cat.png" });
        let err = decode_message(&content).unwrap_err();
        assert!(matches!(err, EventError::MalformedContent { .. }));
    }

    #[test]
    fn test_encode_reinserts_msgtype() {
        let message = MessageContent::Emote(TextContent::plain("waves"));
        let object = encode_message(&message).unwrap();
        assert_eq!(
            Value::Object(object),
            json!({ "msgtype": "m.emote", "body": "waves" })
        );
    }

    #[test]
    fn test_body_accessor_covers_media() {
        let message = MessageContent::File(FileContent {
            body: "report.pdf".into(),
            filename: None,
            url: Some("mxc://s.com/abc".into()),
            file: None,
            info: None,
        });
        assert_eq!(message.body(), "report.pdf");
    }
}
