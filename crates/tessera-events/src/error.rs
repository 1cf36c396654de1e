//! Error types for the event layer.
//!
//! Each category is a separate variant so callers can tell "the server
//! sent something this client doesn't understand" (the `Unsupported*`
//! variants) apart from "the server sent something broken"
//! (`Malformed*`) and from "we tried to send something inconsistent"
//! (`ContentTypeMismatch`).

use tessera_identifiers::IdentifierError;

use crate::EventType;

/// Errors that can occur while decoding or encoding events.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// A user or room id in the event metadata failed validation.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(#[from] IdentifierError),

    /// The `type` field names an event type outside the supported set.
    #[error("unsupported event type `{0}`")]
    UnsupportedEventType(String),

    /// The `msgtype` of a message names a sub-type outside the supported set.
    #[error("unsupported message type `{0}`")]
    UnsupportedMessageType(String),

    /// The `algorithm` of encrypted content is not one we can represent.
    #[error("unsupported encryption algorithm `{0}`")]
    UnsupportedAlgorithm(String),

    /// The content object doesn't fit the schema its discriminator selected.
    #[error("malformed `{event_type}` content: {reason}")]
    MalformedContent {
        event_type: EventType,
        reason: String,
    },

    /// Content was handed to the encoder under a type it doesn't belong to.
    ///
    /// This is a caller bug, not a wire problem, and it is reported before
    /// any bytes are produced.
    #[error("content of type `{actual}` cannot be sent as `{declared}`")]
    ContentTypeMismatch {
        declared: EventType,
        actual: EventType,
    },

    /// The envelope itself (not its content) is missing or mistyping a
    /// required field, or the input isn't JSON at all.
    #[error("malformed event: {0}")]
    MalformedEvent(serde_json::Error),

    /// Serialization to JSON failed.
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),
}

impl EventError {
    /// Shorthand for building a [`EventError::MalformedContent`].
    pub(crate) fn malformed(event_type: EventType, reason: impl ToString) -> Self {
        Self::MalformedContent {
            event_type,
            reason: reason.to_string(),
        }
    }
}
