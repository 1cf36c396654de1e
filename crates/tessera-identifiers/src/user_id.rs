//! User identifiers: `@username:domain`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::parse::split_identifier;
use crate::IdentifierError;

const SIGIL: char = '@';

/// The address of an account, e.g. `@alice:example.com`.
///
/// There is no public constructor besides parsing, so holding a `UserId`
/// means the string it came from passed validation. Equality, hashing and
/// ordering are over the `(username, domain)` pair, which is equivalent to
/// comparing canonical strings.
///
/// ## Serde routing
///
/// On the wire a `UserId` is just its canonical string, not a struct:
///
/// - `try_from = "String"` → serde first deserializes a plain `String`,
///   then calls our `TryFrom<String>` impl. A malformed id becomes a
///   deserialization error instead of a half-valid value.
/// - `into = "String"` → serialization clones the id, converts it with
///   `From<UserId> for String` (which uses [`fmt::Display`]) and writes
///   the string.
///
/// Because the serialized form is a string, a `UserId` also works as a
/// JSON map key, e.g. the `users` table of `m.room.power_levels`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId {
    username: String,
    domain: String,
}

impl UserId {
    /// Parses a canonical user id, returning `None` if it is malformed.
    pub fn parse(s: &str) -> Option<Self> {
        Self::try_from(s).ok()
    }

    /// The part between `@` and `:`.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The homeserver domain.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// The canonical `@username:domain` form.
    pub fn to_canonical(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SIGIL}{}:{}", self.username, self.domain)
    }
}

impl TryFrom<&str> for UserId {
    type Error = IdentifierError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let (username, domain) = split_identifier(SIGIL, value)?;
        Ok(Self {
            username: username.to_owned(),
            domain: domain.to_owned(),
        })
    }
}

impl TryFrom<String> for UserId {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl FromStr for UserId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_splits_username_and_domain() {
        let id = UserId::parse("@alice:example.com").unwrap();
        assert_eq!(id.username(), "alice");
        assert_eq!(id.domain(), "example.com");
    }

    #[test]
    fn test_to_canonical_is_inverse_of_parse() {
        let id = UserId::parse("@alice:example.com").unwrap();
        assert_eq!(id.to_canonical(), "@alice:example.com");
    }

    #[test]
    fn test_parse_rejects_plain_text() {
        assert_eq!(UserId::parse("not-a-user-id"), None);
    }

    #[test]
    fn test_parse_rejects_room_sigil() {
        assert_eq!(UserId::parse("!alice:example.com"), None);
    }

    #[test]
    fn test_from_str_reports_reason() {
        let err = "@alice:localhost".parse::<UserId>().unwrap_err();
        assert!(matches!(err, IdentifierError::InvalidDomain { .. }));
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = UserId::parse("@bob:matrix.org").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"@bob:matrix.org\"");
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: UserId = serde_json::from_str("\"@bob:matrix.org\"").unwrap();
        assert_eq!(ok.username(), "bob");

        let bad: Result<UserId, _> = serde_json::from_str("\"bob\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_equal_ids_hash_equal() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(UserId::parse("@a:s.com").unwrap());
        set.insert(UserId::parse("@a:s.com").unwrap());
        assert_eq!(set.len(), 1);
    }
}
