//! Room identifiers: `!opaque:domain`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::parse::split_identifier;
use crate::IdentifierError;

const SIGIL: char = '!';

/// The address of a room, e.g. `!abc123:example.com`.
///
/// The opaque part carries no meaning to clients; only the domain of the
/// server that created the room is recoverable from it. Same construction
/// and wire rules as [`UserId`](crate::UserId).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomId {
    opaque_id: String,
    domain: String,
}

impl RoomId {
    /// Parses a canonical room id, returning `None` if it is malformed.
    pub fn parse(s: &str) -> Option<Self> {
        Self::try_from(s).ok()
    }

    pub fn opaque_id(&self) -> &str {
        &self.opaque_id
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// The canonical `!opaque:domain` form.
    pub fn to_canonical(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SIGIL}{}:{}", self.opaque_id, self.domain)
    }
}

impl TryFrom<&str> for RoomId {
    type Error = IdentifierError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let (opaque_id, domain) = split_identifier(SIGIL, value)?;
        Ok(Self {
            opaque_id: opaque_id.to_owned(),
            domain: domain.to_owned(),
        })
    }
}

impl TryFrom<String> for RoomId {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl FromStr for RoomId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s)
    }
}

impl From<RoomId> for String {
    fn from(id: RoomId) -> Self {
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_room() {
        let id = RoomId::parse("!abc123:example.com").unwrap();
        assert_eq!(id.opaque_id(), "abc123");
        assert_eq!(id.domain(), "example.com");
        assert_eq!(id.to_canonical(), "!abc123:example.com");
    }

    #[test]
    fn test_parse_rejects_missing_sigil() {
        assert_eq!(RoomId::parse("abc123:example.com"), None);
    }

    #[test]
    fn test_parse_rejects_user_sigil() {
        let err = RoomId::try_from("@abc:example.com").unwrap_err();
        assert!(matches!(
            err,
            IdentifierError::MissingSigil { expected: '!', .. }
        ));
    }

    #[test]
    fn test_round_trips_through_json() {
        let id = RoomId::parse("!r:s.com").unwrap();
        let json = serde_json::to_value(&id).unwrap();
        assert_eq!(json, serde_json::json!("!r:s.com"));
        let back: RoomId = serde_json::from_value(json).unwrap();
        assert_eq!(back, id);
    }
}
