//! Codec trait and the JSON implementation.
//!
//! A codec turns raw bytes from the network layer into typed envelopes and
//! back. The envelope and content logic lives in [`Event`] and
//! [`content`](crate::content); a codec only decides the byte format.
//! [`JsonCodec`] is the one the protocol uses.

use serde_json::Value;

use crate::content::{self, EventContent};
use crate::{Event, EventError, EventType};

/// Converts between envelopes and bytes.
///
/// ## Trait bounds explained
///
/// - `Send + Sync` → one codec value can be shared by every thread that
///   processes network responses. Codecs hold no state, so there is
///   nothing to lock.
/// - `'static` → the codec borrows nothing. It can live in a long-lived
///   client struct or be moved into a spawned thread or task.
///
/// ## Generic methods
///
/// `encode_event` and `decode_event` work with any envelope `E: Event`.
/// The envelope decides which metadata it carries and the codec decides
/// the byte format, so adding an envelope shape never touches a codec.
///
/// The decoded envelope owns all of its data (`Event::from_json` takes a
/// [`Value`] by value), so the input buffer can be dropped as soon as
/// `decode_event` returns.
pub trait Codec: Send + Sync + 'static {
    /// Serializes an envelope.
    ///
    /// # Errors
    /// [`EventError::ContentTypeMismatch`] if the envelope's content doesn't
    /// belong to its declared type, or [`EventError::Encode`].
    fn encode_event<E: Event>(&self, event: &E) -> Result<Vec<u8>, EventError>;

    /// Deserializes one envelope.
    ///
    /// # Errors
    /// [`EventError::MalformedEvent`] for bytes that aren't a JSON object of
    /// the right shape, or any content error from [`content::decode`].
    fn decode_event<E: Event>(&self, data: &[u8]) -> Result<E, EventError>;

    /// Serializes bare content, e.g. the body of a send request.
    ///
    /// # Errors
    /// Same as [`content::encode`].
    fn encode_content(
        &self,
        content: &EventContent,
        event_type: EventType,
    ) -> Result<Vec<u8>, EventError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] over UTF-8 JSON (via `serde_json`).
///
/// JSON is the only format the protocol defines, so unlike a codec for a
/// private wire format there is nothing to opt out of: the content codec
/// itself is written against `serde_json::Value`.
///
/// ## Example
///
/// ```rust
/// use tessera_events::{ClientEvent, Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let bytes = br#"{
///     "type": "m.room.message",
///     "content": { "msgtype": "m.text", "body": "hello" },
///     "event_id": "$1",
///     "origin_server_ts": 123,
///     "room_id": "!r:s.com",
///     "sender": "@a:s.com"
/// }"#;
///
/// let event: ClientEvent = codec.decode_event(bytes).unwrap();
/// let encoded = codec.encode_event(&event).unwrap();
/// let again: ClientEvent = codec.decode_event(&encoded).unwrap();
/// assert_eq!(event, again);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode_event<E: Event>(&self, event: &E) -> Result<Vec<u8>, EventError> {
        let value = event.to_json()?;
        serde_json::to_vec(&value).map_err(EventError::Encode)
    }

    fn decode_event<E: Event>(&self, data: &[u8]) -> Result<E, EventError> {
        let value: Value = serde_json::from_slice(data).map_err(EventError::MalformedEvent)?;
        E::from_json(value)
    }

    fn encode_content(
        &self,
        content: &EventContent,
        event_type: EventType,
    ) -> Result<Vec<u8>, EventError> {
        let value = content::encode(content, event_type)?;
        serde_json::to_vec(&value).map_err(EventError::Encode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::MessageContent;
    use crate::{MinimalEvent, ToDeviceEvent};

    #[test]
    fn test_decode_garbage_is_malformed_event() {
        let result: Result<MinimalEvent, _> = JsonCodec.decode_event(b"not json at all");
        assert!(matches!(result, Err(EventError::MalformedEvent(_))));
    }

    #[test]
    fn test_decode_wrong_shape_is_malformed_event() {
        let result: Result<ToDeviceEvent, _> = JsonCodec.decode_event(br#"{"name": "hello"}"#);
        assert!(matches!(result, Err(EventError::MalformedEvent(_))));
    }

    #[test]
    fn test_encode_content_bytes() {
        let content = EventContent::Message(MessageContent::text("hi"));
        let bytes = JsonCodec
            .encode_content(&content, EventType::RoomMessage)
            .unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value, serde_json::json!({ "msgtype": "m.text", "body": "hi" }));
    }

    #[test]
    fn test_encode_content_mismatch() {
        let content = EventContent::Message(MessageContent::text("hi"));
        let result = JsonCodec.encode_content(&content, EventType::RoomName);
        assert!(matches!(result, Err(EventError::ContentTypeMismatch { .. })));
    }
}
