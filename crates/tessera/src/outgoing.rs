//! Outgoing request bodies.
//!
//! Higher layers assemble typed content and hand it to the network layer
//! as bytes. Everything here validates the content against its declared
//! type first, so a mismatch surfaces to the sender before anything is
//! transmitted.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};
use tessera_events::{content, Codec, EventContent, EventError, EventType, JsonCodec};
use tessera_identifiers::UserId;

use crate::{Result, TesseraError};

/// Logs a refused encode and converts it.
fn refused(event_type: EventType, error: EventError) -> TesseraError {
    if let EventError::ContentTypeMismatch { actual, .. } = &error {
        tracing::warn!(declared = %event_type, %actual, "refusing to encode mismatched content");
    }
    error.into()
}

/// Body of a room send request (`PUT /rooms/{roomId}/send/{type}/{txnId}`
/// or the state equivalent).
pub fn message_body(content: &EventContent, event_type: EventType) -> Result<Vec<u8>> {
    let body = JsonCodec
        .encode_content(content, event_type)
        .map_err(|e| refused(event_type, e))?;
    tracing::debug!(%event_type, bytes = body.len(), "encoded outgoing content");
    Ok(body)
}

// ---------------------------------------------------------------------------
// ToDeviceMessages
// ---------------------------------------------------------------------------

/// Messages of one event type addressed to individual devices.
///
/// A device id of `*` addresses every device of that user.
#[derive(Debug, Clone)]
pub struct ToDeviceMessages {
    event_type: EventType,
    messages: BTreeMap<UserId, BTreeMap<String, EventContent>>,
}

impl ToDeviceMessages {
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            messages: BTreeMap::new(),
        }
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    /// Adds (or replaces) the message for one device.
    pub fn add(
        &mut self,
        user: UserId,
        device_id: impl Into<String>,
        content: EventContent,
    ) -> &mut Self {
        self.messages
            .entry(user)
            .or_default()
            .insert(device_id.into(), content);
        self
    }

    /// Number of addressed devices.
    pub fn len(&self) -> usize {
        self.messages.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// `{"messages": {user: {device: content}}}`.
    ///
    /// # Errors
    /// [`EventError::ContentTypeMismatch`] (wrapped) if any message doesn't
    /// belong to [`Self::event_type`].
    pub fn to_body(&self) -> Result<Vec<u8>> {
        let mut messages = Map::new();
        for (user, devices) in &self.messages {
            let mut per_device = Map::new();
            for (device_id, content) in devices {
                let encoded = content::encode(content, self.event_type)
                    .map_err(|e| refused(self.event_type, e))?;
                per_device.insert(device_id.clone(), encoded);
            }
            messages.insert(user.to_string(), Value::Object(per_device));
        }

        let body = serde_json::to_vec(&json!({ "messages": messages }))
            .map_err(EventError::Encode)?;
        tracing::debug!(
            event_type = %self.event_type,
            devices = self.len(),
            bytes = body.len(),
            "encoded to-device messages"
        );
        Ok(body)
    }
}

// ---------------------------------------------------------------------------
// InitialState
// ---------------------------------------------------------------------------

/// The `initial_state` list of a room creation request.
#[derive(Debug, Clone, Default)]
pub struct InitialState {
    entries: Vec<(String, EventContent)>,
}

impl InitialState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a state event. Most room state uses an empty state key.
    pub fn push(&mut self, state_key: impl Into<String>, content: EventContent) -> &mut Self {
        self.entries.push((state_key.into(), content));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `[{"type", "state_key", "content"}, ...]`.
    ///
    /// # Errors
    /// [`TesseraError::NotState`] if an entry's content isn't room state.
    pub fn to_value(&self) -> Result<Value> {
        let mut list = Vec::with_capacity(self.entries.len());
        for (state_key, content) in &self.entries {
            let event_type = content.event_type();
            if !event_type.is_state() {
                tracing::warn!(%event_type, "refusing non-state content in initial state");
                return Err(TesseraError::NotState(event_type));
            }
            list.push(json!({
                "type": event_type.as_str(),
                "state_key": state_key,
                "content": content::encode(content, event_type)?,
            }));
        }
        Ok(Value::Array(list))
    }
}

#[cfg(test)]
mod tests {
    use tessera_events::content::{MessageContent, NameContent};

    use super::*;

    #[test]
    fn test_message_body_mismatch_is_refused() {
        let content = EventContent::Message(MessageContent::text("hi"));
        let result = message_body(&content, EventType::RoomAvatar);
        assert!(matches!(
            result,
            Err(TesseraError::Event(EventError::ContentTypeMismatch { .. }))
        ));
    }

    #[test]
    fn test_to_device_len_counts_devices() {
        let user = UserId::parse("@a:s.com").unwrap();
        let mut messages = ToDeviceMessages::new(EventType::RoomName);
        assert!(messages.is_empty());
        messages
            .add(user.clone(), "DEV1", NameContent { name: "x".into() }.into())
            .add(user, "DEV2", NameContent { name: "y".into() }.into());
        assert_eq!(messages.len(), 2);
    }

    #[test]
    fn test_initial_state_rejects_message_content() {
        let mut state = InitialState::new();
        state.push("", MessageContent::text("hi").into());
        assert!(matches!(
            state.to_value(),
            Err(TesseraError::NotState(EventType::RoomMessage))
        ));
    }
}
