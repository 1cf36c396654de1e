//! Unified error type for the Tessera facade.

use tessera_events::EventError;
use tessera_identifiers::IdentifierError;

/// Top-level error that wraps the errors of the member crates.
///
/// The `#[from]` attributes generate `From` impls, so `?` converts
/// sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum TesseraError {
    /// Decoding or encoding an event or its content failed.
    #[error(transparent)]
    Event(#[from] EventError),

    /// A standalone identifier failed validation.
    #[error(transparent)]
    Identifier(#[from] IdentifierError),

    /// The decode configuration couldn't be read or is invalid.
    #[error("invalid config: {0}")]
    Config(String),

    /// Content that isn't room state was placed where state is required.
    #[error("`{0}` is not a state event type")]
    NotState(tessera_events::EventType),

    /// A batch has more events than the configured maximum.
    #[error("batch of {len} events exceeds the limit of {max}")]
    BatchTooLarge { len: usize, max: usize },
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, TesseraError>;
