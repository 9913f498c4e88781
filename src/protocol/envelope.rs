//! Single-key JSON envelope codec.
//!
//! Every frame on the wire is a JSON object with exactly one key, the tag,
//! whose value is the tag-specific payload:
//!
//! ```json
//! {"LineEvent": {"source": "tail", "at": "2024-01-01T00:00:00Z", "message": "hello"}}
//! ```
//!
//! Decoding leaves the payload encoded so the receiver can pick a type by tag.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::value::RawValue;

use crate::error::EnvelopeError;

/// A value that knows its wire tag.
///
/// Tags come from the explicit table in [`super::messages::tags`], never
/// from Rust type names.
pub trait Tagged {
    /// Returns the wire tag for this value.
    fn tag(&self) -> &'static str;
}

/// A decoded envelope: the tag plus its still-encoded payload.
#[derive(Debug)]
pub struct Envelope {
    /// The sole key of the wire object.
    pub tag: String,
    /// The raw JSON value stored under the tag.
    pub payload: Box<RawValue>,
}

/// Encodes `value` as `{"<tag>": <value>}`.
///
/// # Errors
///
/// Returns [`EnvelopeError::Json`] if `value` fails to serialize.
pub fn encode<T: Tagged + Serialize + ?Sized>(value: &T) -> Result<String, EnvelopeError> {
    let mut wrapped = serde_json::Map::with_capacity(1);
    wrapped.insert(value.tag().to_string(), serde_json::to_value(value)?);
    Ok(serde_json::to_string(&wrapped)?)
}

/// Splits a wire frame into its tag and raw payload.
///
/// # Errors
///
/// Returns [`EnvelopeError::Json`] if `bytes` is not a JSON object and
/// [`EnvelopeError::KeyCount`] if the object does not have exactly one key.
pub fn decode(bytes: &[u8]) -> Result<Envelope, EnvelopeError> {
    let object: HashMap<String, Box<RawValue>> = serde_json::from_slice(bytes)?;
    if object.len() != 1 {
        return Err(EnvelopeError::KeyCount(object.len()));
    }
    object
        .into_iter()
        .next()
        .map(|(tag, payload)| Envelope { tag, payload })
        .ok_or(EnvelopeError::KeyCount(0))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Sample {
        n: u32,
    }

    impl Tagged for Sample {
        fn tag(&self) -> &'static str {
            "Sample"
        }
    }

    #[test]
    fn encode_wraps_under_tag() {
        let Ok(json) = encode(&Sample { n: 3 }) else {
            panic!("encode failed");
        };
        assert_eq!(json, r#"{"Sample":{"n":3}}"#);
    }

    #[test]
    fn decode_recovers_encoded_value() {
        let Ok(json) = encode(&Sample { n: 3 }) else {
            panic!("encode failed");
        };
        let Ok(envelope) = decode(json.as_bytes()) else {
            panic!("decode failed");
        };
        assert_eq!(envelope.tag, "Sample");
        assert_eq!(envelope.payload.get(), r#"{"n":3}"#);
    }

    #[test]
    fn decode_single_key_leaves_payload_raw() {
        let Ok(envelope) = decode(br#"{ "x": 2 }"#) else {
            panic!("decode failed");
        };
        assert_eq!(envelope.tag, "x");
        assert_eq!(envelope.payload.get(), "2");
    }

    #[test]
    fn decode_rejects_empty_input() {
        assert!(matches!(decode(b""), Err(EnvelopeError::Json(_))));
    }

    #[test]
    fn decode_rejects_empty_object() {
        assert!(matches!(decode(b"{}"), Err(EnvelopeError::KeyCount(0))));
    }

    #[test]
    fn decode_rejects_multi_key_object() {
        assert!(matches!(
            decode(br#"{"a":1,"b":2}"#),
            Err(EnvelopeError::KeyCount(2))
        ));
    }

    #[test]
    fn decode_rejects_array() {
        assert!(matches!(decode(b"[1,2,3]"), Err(EnvelopeError::Json(_))));
    }
}
