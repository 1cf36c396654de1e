//! Error types for identifier parsing.

/// Why a string was rejected as a user or room id.
///
/// Every variant keeps the offending input so it can be logged next to
/// the event it came from.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    /// The string doesn't start with the sigil for this kind of id
    /// (`@` for users, `!` for rooms).
    #[error("identifier `{value}` must start with `{expected}`")]
    MissingSigil { expected: char, value: String },

    /// The string isn't exactly `sigil + local : domain`.
    #[error("identifier `{value}` must have exactly two `:`-separated segments")]
    WrongSegmentCount { value: String },

    /// Nothing between the sigil and the colon.
    #[error("identifier `{value}` has an empty local part")]
    EmptyLocalpart { value: String },

    /// The domain is too short or has no `.` in it.
    #[error("identifier `{value}` has an invalid domain")]
    InvalidDomain { value: String },
}
