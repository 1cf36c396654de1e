//! Validated identifiers for Tessera.
//!
//! Two compound identifiers show up in nearly every event the client
//! receives:
//!
//! - [`UserId`]: `@username:domain`, the address of an account.
//! - [`RoomId`]: `!opaque:domain`, the address of a room.
//!
//! Both are only constructible through a validating parse, and both are
//! immutable afterwards. Parsing comes in two flavours:
//!
//! - [`parse_user`] / [`parse_room`] return `Option`. Malformed ids arrive
//!   from the network all the time, and callers usually just want to treat
//!   them as absent.
//! - `TryFrom` / `FromStr` return an [`IdentifierError`] that says what was
//!   wrong, for callers (and serde) that need a reason.

mod error;
mod parse;
mod room_id;
mod user_id;

pub use error::IdentifierError;
pub use room_id::RoomId;
pub use user_id::UserId;

/// Parses a canonical user id (`@username:domain`).
///
/// Returns `None` for anything that isn't a well-formed user id.
pub fn parse_user(s: &str) -> Option<UserId> {
    UserId::try_from(s).ok()
}

/// Parses a canonical room id (`!opaque:domain`).
///
/// Returns `None` for anything that isn't a well-formed room id.
pub fn parse_room(s: &str) -> Option<RoomId> {
    RoomId::try_from(s).ok()
}
