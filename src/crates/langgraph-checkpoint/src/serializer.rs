//! Text serialization for checkpoint payloads
//!
//! Checkpoint stores that keep payloads in string-valued fields (Redis hashes, key/value
//! stores) need a text form for every value, including raw byte sequences. Embedding raw
//! bytes in such a field invites control characters and invalid UTF-8, so bytes travel as
//! lowercase hexadecimal text instead.
//!
//! - [`SerializerProtocol`] - typed `dumps` / `loads` over text
//! - [`JsonAndBinarySerializer`] - JSON for structured values, hex for bytes
//! - [`Payload`] - a value that is either structured or raw bytes
//! - [`HexBytes`] / [`hex_bytes`] - carry bytes nested inside structured values
//!
//! ```rust
//! use langgraph_checkpoint::serializer::{JsonAndBinarySerializer, Payload};
//!
//! let serde = JsonAndBinarySerializer::new();
//! let text = serde.encode(&Payload::Binary(vec![0x00, 0xff, 0x10])).unwrap();
//! assert_eq!(text, "00ff10");
//!
//! let back = serde.decode(&text, true).unwrap();
//! assert_eq!(back, Payload::Binary(vec![0x00, 0xff, 0x10]));
//! ```

use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Protocol for serializing and deserializing checkpoint data to text
pub trait SerializerProtocol: Send + Sync {
    /// Serialize a value to text
    fn dumps<T: Serialize + ?Sized>(&self, value: &T) -> Result<String>;

    /// Deserialize a value from text
    fn loads<T: DeserializeOwned>(&self, data: &str) -> Result<T>;
}

/// A value handed to the codec: either structured data or a raw byte sequence
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Raw bytes, encoded as bare lowercase hex
    Binary(Vec<u8>),
    /// Anything serde_json can represent, encoded as JSON text
    Structured(serde_json::Value),
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Binary(bytes)
    }
}

impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self {
        Self::Structured(value)
    }
}

/// JSON serializer that keeps byte sequences text-safe by hex-encoding them
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonAndBinarySerializer;

impl JsonAndBinarySerializer {
    pub fn new() -> Self {
        Self
    }

    /// Encode a payload to its wire text
    pub fn encode(&self, payload: &Payload) -> Result<String> {
        match payload {
            Payload::Binary(bytes) => Ok(self.dumps_binary(bytes)),
            Payload::Structured(value) => self.dumps(value),
        }
    }

    /// Decode wire text; `is_binary` marks the field as a hex-encoded byte sequence
    pub fn decode(&self, text: &str, is_binary: bool) -> Result<Payload> {
        if is_binary {
            Ok(Payload::Binary(self.loads_binary(text)?))
        } else {
            Ok(Payload::Structured(self.loads(text)?))
        }
    }

    /// Hex-encode raw bytes (lowercase, no prefix)
    pub fn dumps_binary(&self, bytes: &[u8]) -> String {
        hex::encode(bytes)
    }

    /// Decode hex text back to raw bytes
    pub fn loads_binary(&self, text: &str) -> Result<Vec<u8>> {
        Ok(hex::decode(text)?)
    }
}

impl SerializerProtocol for JsonAndBinarySerializer {
    fn dumps<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        Ok(serde_json::to_string(value)?)
    }

    fn loads<T: DeserializeOwned>(&self, data: &str) -> Result<T> {
        Ok(serde_json::from_str(data)?)
    }
}

/// Byte buffer that serializes as a lowercase hex string
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct HexBytes(pub Vec<u8>);

impl HexBytes {
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for HexBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for HexBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for HexBytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        hex_bytes::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for HexBytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        hex_bytes::deserialize(deserializer).map(HexBytes)
    }
}

/// serde adapter for `Vec<u8>` fields: `#[serde(with = "hex_bytes")]`
pub mod hex_bytes {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<T, S>(bytes: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: AsRef<[u8]> + ?Sized,
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes.as_ref()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        hex::decode(&text).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CheckpointError;
    use proptest::prelude::*;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TestData {
        name: String,
        value: i32,
        blob: HexBytes,
        #[serde(with = "hex_bytes")]
        raw: Vec<u8>,
    }

    #[test]
    fn test_structured_round_trip() {
        let serde = JsonAndBinarySerializer::new();
        let payload = Payload::Structured(json!({"v": 1, "nested": {"list": [1, "two", null]}}));

        let text = serde.encode(&payload).unwrap();
        assert_eq!(serde.decode(&text, false).unwrap(), payload);
    }

    #[test]
    fn test_binary_is_lowercase_hex() {
        let serde = JsonAndBinarySerializer::new();
        let text = serde.encode(&Payload::Binary(vec![0xAB, 0x00, 0x0A, 0x7F])).unwrap();
        assert_eq!(text, "ab000a7f");
    }

    #[test]
    fn test_nested_bytes_round_trip() {
        let serde = JsonAndBinarySerializer::new();
        let data = TestData {
            name: "test".to_string(),
            value: 42,
            blob: HexBytes(vec![0, 1, 2, 255]),
            raw: b"\x00\r\n\x1b".to_vec(),
        };

        let text = serde.dumps(&data).unwrap();
        assert!(text.contains("\"blob\":\"000102ff\""));
        assert!(text.contains("\"raw\":\"000d0a1b\""));

        let restored: TestData = serde.loads(&text).unwrap();
        assert_eq!(data, restored);
    }

    #[test]
    fn test_invalid_hex_is_decode_error() {
        let serde = JsonAndBinarySerializer::new();
        let err = serde.decode("not-hex", true).unwrap_err();
        assert!(matches!(err, CheckpointError::Decode(_)));
    }

    #[test]
    fn test_invalid_json_is_serialization_error() {
        let serde = JsonAndBinarySerializer::new();
        let err = serde.decode("{truncated", false).unwrap_err();
        assert!(matches!(err, CheckpointError::Serialization(_)));
    }

    proptest! {
        #[test]
        fn prop_binary_round_trip(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
            let serde = JsonAndBinarySerializer::new();
            let text = serde.encode(&Payload::Binary(bytes.clone())).unwrap();

            prop_assert!(text.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
            prop_assert_eq!(serde.decode(&text, true).unwrap(), Payload::Binary(bytes));
        }

        #[test]
        fn prop_nested_round_trip(
            name in ".*",
            value in any::<i32>(),
            blob in proptest::collection::vec(any::<u8>(), 0..64),
        ) {
            let serde = JsonAndBinarySerializer::new();
            let data = TestData { name, value, blob: HexBytes(blob.clone()), raw: blob };

            let text = serde.dumps(&data).unwrap();
            let restored: TestData = serde.loads(&text).unwrap();
            prop_assert_eq!(data, restored);
        }
    }
}
