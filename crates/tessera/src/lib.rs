//! # Tessera
//!
//! Typed event codec for a federated messaging client.
//!
//! Tessera turns the JSON events a homeserver sends into typed envelopes
//! and back. It re-exports the member crates and adds the pieces a client
//! needs around them: batch decoding that survives individual bad events,
//! builders for outgoing request bodies, and a small decode configuration.
//!
//! ## Quick Start
//!
//! ```rust
//! use tessera::prelude::*;
//!
//! let timeline = br#"[
//!     {"event_id": "$1", "origin_server_ts": 1, "room_id": "!r:s.com",
//!      "sender": "@a:s.com", "type": "m.room.message",
//!      "content": {"msgtype": "m.text", "body": "hi"}},
//!     {"event_id": "$2", "origin_server_ts": 2, "room_id": "!r:s.com",
//!      "sender": "@a:s.com", "type": "m.custom.thing", "content": {}}
//! ]"#;
//!
//! let outcome = decode_batch_bytes::<ClientEvent>(timeline, &DecodeConfig::default())?;
//! assert_eq!(outcome.events.len(), 1);
//! assert_eq!(outcome.dropped[0].event_id.as_deref(), Some("$2"));
//! # Ok::<(), TesseraError>(())
//! ```

pub mod config;

mod batch;
mod error;
mod outgoing;

pub use batch::{decode_batch, decode_batch_bytes, BatchOutcome, DroppedEvent};
pub use config::DecodeConfig;
pub use error::{Result, TesseraError};
pub use outgoing::{message_body, InitialState, ToDeviceMessages};

pub use tessera_events as events;
pub use tessera_identifiers as identifiers;

/// Everything a typical client needs in one import.
pub mod prelude {
    pub use crate::{
        decode_batch, decode_batch_bytes, message_body, BatchOutcome, DecodeConfig,
        DroppedEvent, InitialState, TesseraError, ToDeviceMessages,
    };
    pub use tessera_events::content::{self, MessageContent};
    pub use tessera_events::{
        ClientEvent, ClientEventWithoutRoomId, Codec, Event, EventContent, EventError,
        EventType, JsonCodec, MessageType, MinimalEvent, StrippedStateEvent, ToDeviceEvent,
        Unsigned,
    };
    pub use tessera_identifiers::{parse_room, parse_user, IdentifierError, RoomId, UserId};
}
