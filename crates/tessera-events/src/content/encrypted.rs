//! `m.room.encrypted` content: the ciphertext variant decoder.
//!
//! All encrypted content shares a small envelope (`algorithm`,
//! `sender_key`, `device_id`, `session_id`). The shape of `ciphertext`
//! depends on the algorithm:
//!
//! ```text
//! m.olm.v1.curve25519-aes-sha2   { "<recipient identity key>": { "type": 0, "body": "<b64>" }, ... }
//! m.megolm.v1.aes-sha2           "<b64>"
//! ```
//!
//! The algorithm is read first (a probe, like `msgtype` for messages), and
//! the ciphertext is then decoded with the matching shape. Nothing here
//! decrypts anything.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use super::{expect_object, from_content, to_object};
use crate::{EventError, EventType};

/// Standard alphabet, padding optional. The protocol sends unpadded
/// base64, but some clients pad anyway.
const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

// ---------------------------------------------------------------------------
// Algorithm
// ---------------------------------------------------------------------------

/// The end-to-end encryption algorithms this client can represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum Algorithm {
    /// `m.olm.v1.curve25519-aes-sha2`: pairwise, used for to-device traffic.
    OlmV1,
    /// `m.megolm.v1.aes-sha2`: group sessions, used for room messages.
    MegolmV1,
}

impl Algorithm {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OlmV1 => "m.olm.v1.curve25519-aes-sha2",
            Self::MegolmV1 => "m.megolm.v1.aes-sha2",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_algorithm(s)
    }
}

impl TryFrom<String> for Algorithm {
    type Error = EventError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        parse_algorithm(&value)
    }
}

impl Serialize for Algorithm {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Looks up the tag for a wire algorithm name.
///
/// # Errors
/// Returns [`EventError::UnsupportedAlgorithm`] for anything else.
pub fn parse_algorithm(wire: &str) -> Result<Algorithm, EventError> {
    match wire {
        "m.olm.v1.curve25519-aes-sha2" => Ok(Algorithm::OlmV1),
        "m.megolm.v1.aes-sha2" => Ok(Algorithm::MegolmV1),
        other => Err(EventError::UnsupportedAlgorithm(other.to_owned())),
    }
}

/// Reads only `algorithm` out of a content object.
#[derive(Deserialize)]
struct AlgorithmProbe {
    algorithm: String,
}

/// Probes `algorithm` and maps it through [`parse_algorithm`].
pub(crate) fn probe_algorithm(
    event_type: EventType,
    content: &Value,
) -> Result<Algorithm, EventError> {
    expect_object(event_type, content)?;
    let probe = AlgorithmProbe::deserialize(content)
        .map_err(|e| EventError::malformed(event_type, e))?;
    parse_algorithm(&probe.algorithm)
}

// ---------------------------------------------------------------------------
// Ciphertext
// ---------------------------------------------------------------------------

/// One Olm message, addressed to one recipient device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OlmMessage {
    /// `0` for a pre-key message, `1` for a normal message.
    #[serde(rename = "type")]
    pub message_type: u64,
    /// Base64 ciphertext.
    pub body: String,
}

/// The ciphertext payload, shaped by the algorithm that produced it.
///
/// Serialized untagged: the algorithm travels in its own field next to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Ciphertext {
    /// Recipient Curve25519 identity key to the message for that device.
    Olm(BTreeMap<String, OlmMessage>),
    /// A single base64 Megolm message.
    Megolm(String),
}

impl Ciphertext {
    pub fn algorithm(&self) -> Algorithm {
        match self {
            Self::Olm(_) => Algorithm::OlmV1,
            Self::Megolm(_) => Algorithm::MegolmV1,
        }
    }

    fn check_base64(&self) -> Result<(), EventError> {
        match self {
            Self::Olm(messages) => messages
                .iter()
                .try_for_each(|(key, msg)| check_base64(&format!("ciphertext.{key}.body"), &msg.body)),
            Self::Megolm(ciphertext) => check_base64("ciphertext", ciphertext),
        }
    }
}

fn check_base64(field: &str, value: &str) -> Result<(), EventError> {
    BASE64.decode(value).map(|_| ()).map_err(|e| {
        EventError::malformed(
            EventType::RoomEncrypted,
            format!("`{field}` is not valid base64: {e}"),
        )
    })
}

// ---------------------------------------------------------------------------
// EncryptedContent
// ---------------------------------------------------------------------------

/// Content of an `m.room.encrypted` event.
///
/// The algorithm isn't stored separately: it is implied by the
/// [`Ciphertext`] variant, so the two can never disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedContent {
    /// Curve25519 identity key of the sending device.
    pub sender_key: String,
    /// Deprecated for Megolm, absent for Olm on newer clients.
    pub device_id: Option<String>,
    /// Megolm session id. Absent for Olm.
    pub session_id: Option<String>,
    pub ciphertext: Ciphertext,
}

impl EncryptedContent {
    pub fn algorithm(&self) -> Algorithm {
        self.ciphertext.algorithm()
    }
}

/// Wire form, generic over the ciphertext shape so the same fields serve
/// both algorithms.
#[derive(Serialize, Deserialize)]
struct EncryptedWire<C> {
    sender_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    device_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<String>,
    ciphertext: C,
}

impl<C> EncryptedWire<C> {
    fn into_content(self, wrap: impl FnOnce(C) -> Ciphertext) -> EncryptedContent {
        EncryptedContent {
            sender_key: self.sender_key,
            device_id: self.device_id,
            session_id: self.session_id,
            ciphertext: wrap(self.ciphertext),
        }
    }
}

/// Decodes encrypted content, branching on `algorithm`.
pub(crate) fn decode_encrypted(content: &Value) -> Result<EncryptedContent, EventError> {
    let ty = EventType::RoomEncrypted;
    let algorithm = probe_algorithm(ty, content)?;

    tracing::trace!(%algorithm, "decoding encrypted content");

    let encrypted = match algorithm {
        Algorithm::OlmV1 => from_content::<EncryptedWire<BTreeMap<String, OlmMessage>>>(ty, content)?
            .into_content(Ciphertext::Olm),
        Algorithm::MegolmV1 => {
            from_content::<EncryptedWire<String>>(ty, content)?.into_content(Ciphertext::Megolm)
        }
    };
    encrypted.ciphertext.check_base64()?;
    Ok(encrypted)
}

/// Encodes encrypted content, writing `algorithm` from the ciphertext shape.
/// The ciphertext is checked the same way decoding checks it, so what is
/// written can always be read back.
pub(crate) fn encode_encrypted(
    encrypted: &EncryptedContent,
) -> Result<Map<String, Value>, EventError> {
    encrypted.ciphertext.check_base64()?;

    let wire = EncryptedWire {
        sender_key: encrypted.sender_key.clone(),
        device_id: encrypted.device_id.clone(),
        session_id: encrypted.session_id.clone(),
        ciphertext: &encrypted.ciphertext,
    };
    let mut object = to_object(&wire)?;
    object.insert(
        "algorithm".to_owned(),
        Value::String(encrypted.algorithm().as_str().to_owned()),
    );
    Ok(object)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_algorithm() {
        assert_eq!(
            parse_algorithm("m.megolm.v1.aes-sha2").unwrap(),
            Algorithm::MegolmV1
        );
        assert_eq!(
            parse_algorithm("m.olm.v1.curve25519-aes-sha2").unwrap(),
            Algorithm::OlmV1
        );
        assert!(matches!(
            parse_algorithm("m.rot13"),
            Err(EventError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn test_megolm_decodes_to_single_string() {
        let content = json!({
            "algorithm": "m.megolm.v1.aes-sha2",
            "sender_key": "c2VuZGVy",
            "device_id": "ABCDEF",
            "session_id": "c2Vzc2lvbg",
            "ciphertext": "bWVnb2xtIGNpcGhlcnRleHQgYnl0ZXMgZm9yIHRlc3RzIQ"
        });
        let encrypted = decode_encrypted(&content).unwrap();
        assert_eq!(encrypted.algorithm(), Algorithm::MegolmV1);
        assert!(matches!(encrypted.ciphertext, Ciphertext::Megolm(_)));
    }

    #[test]
    fn test_olm_decodes_to_mapping() {
        let content = json!({
            "algorithm": "m.olm.v1.curve25519-aes-sha2",
            "sender_key": "c2VuZGVy",
            "ciphertext": {
                "cmVjaXBpZW50": { "type": 0, "body": "aGVsbG8gd29ybGQ=" }
            }
        });
        let encrypted = decode_encrypted(&content).unwrap();
        let Ciphertext::Olm(messages) = &encrypted.ciphertext else {
            panic!("expected Olm ciphertext");
        };
        assert_eq!(messages["cmVjaXBpZW50"].message_type, 0);
        assert_eq!(encrypted.session_id, None);
    }

    #[test]
    fn test_megolm_with_object_ciphertext_is_malformed() {
        let content = json!({
            "algorithm": "m.megolm.v1.aes-sha2",
            "sender_key": "c2VuZGVy",
            "ciphertext": { "key": { "type": 0, "body": "AAAA" } }
        });
        let err = decode_encrypted(&content).unwrap_err();
        assert!(matches!(err, EventError::MalformedContent { .. }));
    }

    #[test]
    fn test_invalid_base64_is_malformed() {
        let content = json!({
            "algorithm": "m.megolm.v1.aes-sha2",
            "sender_key": "c2VuZGVy",
            "ciphertext": "not base64!"
        });
        let err = decode_encrypted(&content).unwrap_err();
        assert!(err.to_string().contains("base64"));
    }

    #[test]
    fn test_unknown_algorithm_is_unsupported() {
        let content = json!({
            "algorithm": "m.megolm.v2.aes-sha2",
            "sender_key": "c2VuZGVy",
            "ciphertext": "AAAA"
        });
        let err = decode_encrypted(&content).unwrap_err();
        assert!(matches!(err, EventError::UnsupportedAlgorithm(_)));
    }

    #[test]
    fn test_encode_writes_algorithm_and_omits_absent_ids() {
        let encrypted = EncryptedContent {
            sender_key: "c2VuZGVy".into(),
            device_id: None,
            session_id: Some("c2Vzc2lvbg".into()),
            ciphertext: Ciphertext::Megolm("AAAA".into()),
        };
        let object = encode_encrypted(&encrypted).unwrap();
        assert_eq!(
            Value::Object(object),
            json!({
                "algorithm": "m.megolm.v1.aes-sha2",
                "sender_key": "c2VuZGVy",
                "session_id": "c2Vzc2lvbg",
                "ciphertext": "AAAA"
            })
        );
    }

    #[test]
    fn test_olm_body_with_invalid_base64_is_malformed() {
        let content = json!({
            "algorithm": "m.olm.v1.curve25519-aes-sha2",
            "sender_key": "c2VuZGVy",
            "ciphertext": {
                "cmVjaXBpZW50": { "type": 1, "body": "%%%" }
            }
        });
        let err = decode_encrypted(&content).unwrap_err();
        match err {
            EventError::MalformedContent { reason, .. } => {
                assert!(reason.contains("ciphertext.cmVjaXBpZW50.body"));
            }
            other => panic!("expected MalformedContent, got {other:?}"),
        }
    }

    #[test]
    fn test_encode_refuses_invalid_base64() {
        let encrypted = EncryptedContent {
            sender_key: "c2VuZGVy".into(),
            device_id: None,
            session_id: None,
            ciphertext: Ciphertext::Megolm("not base64!".into()),
        };
        let err = encode_encrypted(&encrypted).unwrap_err();
        assert!(matches!(
            err,
            EventError::MalformedContent { event_type: EventType::RoomEncrypted, .. }
        ));
    }

    #[test]
    fn test_encode_refuses_invalid_olm_body() {
        let mut messages = BTreeMap::new();
        messages.insert(
            "cmVjaXBpZW50".to_owned(),
            OlmMessage {
                message_type: 0,
                body: "not base64!".into(),
            },
        );
        let encrypted = EncryptedContent {
            sender_key: "c2VuZGVy".into(),
            device_id: Some("DEVICE".into()),
            session_id: None,
            ciphertext: Ciphertext::Olm(messages),
        };
        assert!(encode_encrypted(&encrypted).is_err());
    }

    #[test]
    fn test_probe_rejects_array_content() {
        let err = probe_algorithm(EventType::RoomEncryption, &json!(["m.megolm.v1.aes-sha2"]))
            .unwrap_err();
        assert!(matches!(err, EventError::MalformedContent { .. }));
    }
}
