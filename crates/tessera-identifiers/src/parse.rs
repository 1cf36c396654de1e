//! The grammar shared by user and room ids.
//!
//! ```text
//! <sigil><local>:<domain>
//! ```
//!
//! - exactly one `:`, so exactly two segments;
//! - the first segment (sigil included) is longer than one character;
//! - the domain is longer than three characters and contains a `.`.
//!
//! A domain carrying a port (`example.com:8448`) has a second colon and is
//! rejected by the segment rule.

use crate::IdentifierError;

/// Splits `value` into `(local, domain)` after checking it against the
/// grammar above. `local` excludes the sigil.
pub(crate) fn split_identifier(
    sigil: char,
    value: &str,
) -> Result<(&str, &str), IdentifierError> {
    if !value.starts_with(sigil) {
        return Err(IdentifierError::MissingSigil {
            expected: sigil,
            value: value.to_owned(),
        });
    }

    let mut segments = value.split(':');
    let (first, domain) = match (segments.next(), segments.next(), segments.next()) {
        (Some(first), Some(domain), None) => (first, domain),
        _ => {
            return Err(IdentifierError::WrongSegmentCount {
                value: value.to_owned(),
            })
        }
    };

    if first.chars().count() <= 1 {
        return Err(IdentifierError::EmptyLocalpart {
            value: value.to_owned(),
        });
    }

    if domain.chars().count() <= 3 || !domain.contains('.') {
        return Err(IdentifierError::InvalidDomain {
            value: value.to_owned(),
        });
    }

    // The sigil is ASCII, so skipping one byte lands on a char boundary.
    Ok((&first[sigil.len_utf8()..], domain))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_valid() {
        assert_eq!(
            split_identifier('@', "@alice:example.com").unwrap(),
            ("alice", "example.com")
        );
    }

    #[test]
    fn test_split_single_char_local_is_fine() {
        assert_eq!(split_identifier('!', "!r:s.com").unwrap(), ("r", "s.com"));
    }

    #[test]
    fn test_split_wrong_sigil() {
        let err = split_identifier('@', "!alice:example.com").unwrap_err();
        assert!(matches!(
            err,
            IdentifierError::MissingSigil { expected: '@', .. }
        ));
    }

    #[test]
    fn test_split_no_colon() {
        let err = split_identifier('@', "@alice").unwrap_err();
        assert!(matches!(err, IdentifierError::WrongSegmentCount { .. }));
    }

    #[test]
    fn test_split_port_is_rejected() {
        let err = split_identifier('@', "@alice:example.com:8448").unwrap_err();
        assert!(matches!(err, IdentifierError::WrongSegmentCount { .. }));
    }

    #[test]
    fn test_split_empty_local() {
        let err = split_identifier('@', "@:example.com").unwrap_err();
        assert!(matches!(err, IdentifierError::EmptyLocalpart { .. }));
    }

    #[test]
    fn test_split_short_domain() {
        let err = split_identifier('@', "@alice:a.b").unwrap_err();
        assert!(matches!(err, IdentifierError::InvalidDomain { .. }));
    }

    #[test]
    fn test_split_domain_without_dot() {
        let err = split_identifier('@', "@alice:localhost").unwrap_err();
        assert!(matches!(err, IdentifierError::InvalidDomain { .. }));
    }
}
