//! Batch decoding with per-event isolation.
//!
//! A sync response or a `/messages` page carries many events. One of them
//! being broken or of an unknown type must not cost the caller the rest,
//! so every event is decoded on its own and failures are collected next
//! to the successes instead of aborting the batch.

use serde_json::Value;
use tessera_events::{Event, EventError};

use crate::{DecodeConfig, Result};

/// An event that was dropped from a batch, and why.
#[derive(Debug)]
pub struct DroppedEvent {
    /// Position in the input batch.
    pub index: usize,
    /// `event_id` of the raw event, if it had a string one.
    pub event_id: Option<String>,
    /// `type` of the raw event, if it had a string one.
    pub event_type: Option<String>,
    pub error: EventError,
}

/// The result of decoding a batch: decoded events in input order, plus
/// everything that was dropped.
#[derive(Debug)]
pub struct BatchOutcome<E> {
    pub events: Vec<E>,
    pub dropped: Vec<DroppedEvent>,
}

impl<E> BatchOutcome<E> {
    /// `true` if nothing was dropped.
    pub fn is_clean(&self) -> bool {
        self.dropped.is_empty()
    }
}

/// Decodes each value in `raw` as an `E`, isolating failures.
///
/// # Errors
/// Only [`TesseraError::BatchTooLarge`](crate::TesseraError::BatchTooLarge).
/// Individual event failures end up in [`BatchOutcome::dropped`].
pub fn decode_batch<E: Event>(raw: Vec<Value>, config: &DecodeConfig) -> Result<BatchOutcome<E>> {
    config.check_batch_len(raw.len())?;

    let mut outcome = BatchOutcome {
        events: Vec::with_capacity(raw.len()),
        dropped: Vec::new(),
    };

    for (index, value) in raw.into_iter().enumerate() {
        let event_id = string_field(&value, "event_id");
        let event_type = string_field(&value, "type");

        match E::from_json(value) {
            Ok(event) => outcome.events.push(event),
            Err(error) => {
                if config.log_dropped_events {
                    tracing::warn!(
                        index,
                        shape = E::SHAPE,
                        event_id = ?event_id,
                        event_type = ?event_type,
                        error = %error,
                        "dropping undecodable event"
                    );
                }
                outcome.dropped.push(DroppedEvent {
                    index,
                    event_id,
                    event_type,
                    error,
                });
            }
        }
    }

    tracing::debug!(
        shape = E::SHAPE,
        decoded = outcome.events.len(),
        dropped = outcome.dropped.len(),
        "batch decoded"
    );
    Ok(outcome)
}

/// Decodes a JSON array of events straight from response bytes.
///
/// # Errors
/// [`EventError::MalformedEvent`] (wrapped) if `data` isn't a JSON array,
/// plus everything [`decode_batch`] returns.
pub fn decode_batch_bytes<E: Event>(data: &[u8], config: &DecodeConfig) -> Result<BatchOutcome<E>> {
    let raw: Vec<Value> = serde_json::from_slice(data).map_err(EventError::MalformedEvent)?;
    decode_batch(raw, config)
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_owned)
}
