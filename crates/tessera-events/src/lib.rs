//! Event codec for Tessera.
//!
//! This crate turns protocol events between their wire JSON and typed
//! values:
//!
//! - **Registry** ([`EventType`], [`MessageType`]): the closed set of
//!   event types and message sub-types the client understands.
//! - **Content** ([`content::decode`], [`content::encode`],
//!   [`EventContent`]): the discriminated content codec, including the
//!   nested `msgtype` dispatch and the algorithm-dependent ciphertext
//!   shapes.
//! - **Envelopes** ([`ClientEvent`], [`ClientEventWithoutRoomId`],
//!   [`StrippedStateEvent`], [`ToDeviceEvent`], [`MinimalEvent`]): the
//!   outer shapes that carry metadata around one content value.
//! - **Codec** ([`Codec`], [`JsonCodec`]): bytes in, envelopes out.
//! - **Errors** ([`EventError`]).
//!
//! Everything here is a pure function of its input: no I/O, no shared
//! state, safe to call from any thread.
//!
//! ```text
//! bytes → envelope metadata → type → content::decode ─┬─ fixed schema
//!                                                     ├─ msgtype probe → sub-schema
//!                                                     └─ algorithm probe → ciphertext
//! ```

pub mod content;

mod codec;
mod envelope;
mod error;
mod event_type;

pub use codec::{Codec, JsonCodec};
pub use content::EventContent;
pub use envelope::{
    ClientEvent, ClientEventWithoutRoomId, Event, MinimalEvent, StrippedStateEvent,
    ToDeviceEvent, Unsigned,
};
pub use error::EventError;
pub use event_type::{parse_event_type, parse_message_type, EventType, MessageType};
pub use tessera_identifiers::{RoomId, UserId};
