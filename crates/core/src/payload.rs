use crate::config::MAX_COMPRESSION_LEVEL;
use crate::error::{CwlError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde::Serialize;
use std::io::{Read, Write};

/// Turns in-memory values into text-safe blobs that can travel inside a YAML
/// document, and back.
///
/// Values are serialized as JSON, optionally zlib-compressed, then base64
/// encoded.
#[derive(Debug, Clone, Copy)]
pub struct PayloadCodec {
    level: Compression,
}

impl PayloadCodec {
    pub fn new(level: u32) -> Self {
        if level > MAX_COMPRESSION_LEVEL {
            tracing::warn!(
                "Compression level {} out of range, using {}",
                level,
                MAX_COMPRESSION_LEVEL
            );
        }
        Self {
            level: Compression::new(level.min(MAX_COMPRESSION_LEVEL)),
        }
    }

    /// Serialize and base64 encode without compression
    pub fn encode_plain<T: Serialize + ?Sized>(&self, what: &str, value: &T) -> Result<String> {
        let bytes = serde_json::to_vec(value).map_err(|e| CwlError::serialization(what, e))?;
        Ok(STANDARD.encode(bytes))
    }

    /// Serialize, zlib compress and base64 encode
    pub fn encode_compressed<T: Serialize + ?Sized>(
        &self,
        what: &str,
        value: &T,
    ) -> Result<String> {
        let bytes = serde_json::to_vec(value).map_err(|e| CwlError::serialization(what, e))?;

        let mut encoder = ZlibEncoder::new(Vec::new(), self.level);
        encoder
            .write_all(&bytes)
            .map_err(|e| compression_error(what, e))?;
        let compressed = encoder.finish().map_err(|e| compression_error(what, e))?;

        Ok(STANDARD.encode(compressed))
    }

    /// Inverse of `encode_plain`: returns the serialized bytes
    pub fn decode_plain(&self, what: &str, text: &str) -> Result<Vec<u8>> {
        STANDARD.decode(text).map_err(|e| CwlError::Decode {
            what: what.to_string(),
            reason: e.to_string(),
        })
    }

    /// Inverse of `encode_compressed`: returns the serialized bytes
    pub fn decode_compressed(&self, what: &str, text: &str) -> Result<Vec<u8>> {
        let compressed = self.decode_plain(what, text)?;

        let mut decoder = ZlibDecoder::new(compressed.as_slice());
        let mut bytes = Vec::new();
        decoder
            .read_to_end(&mut bytes)
            .map_err(|e| compression_error(what, e))?;

        Ok(bytes)
    }
}

impl Default for PayloadCodec {
    fn default() -> Self {
        Self {
            level: Compression::default(),
        }
    }
}

fn compression_error(what: &str, source: std::io::Error) -> CwlError {
    CwlError::Compression {
        what: what.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::QuantumNode;
    use serde_json::json;

    #[test]
    fn test_compressed_payload_round_trip() {
        let codec = PayloadCodec::new(6);
        let mut node = QuantumNode::new("isr");
        node.data_id.insert("visit".to_string(), json!(903334));

        let text = codec.encode_compressed("quantum", &node).unwrap();
        let bytes = codec.decode_compressed("quantum", &text).unwrap();

        assert_eq!(bytes, serde_json::to_vec(&node).unwrap());
        let restored: QuantumNode = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(restored, node);
    }

    #[test]
    fn test_plain_payload_is_base64_json() {
        let codec = PayloadCodec::default();
        let text = codec.encode_plain("context", &json!({"root": "/repo"})).unwrap();

        assert_eq!(text, STANDARD.encode(br#"{"root":"/repo"}"#));
        assert_eq!(
            codec.decode_plain("context", &text).unwrap(),
            br#"{"root":"/repo"}"#.to_vec()
        );
    }

    #[test]
    fn test_invalid_text_is_rejected() {
        let codec = PayloadCodec::default();

        let err = codec.decode_plain("context", "not base64!").unwrap_err();
        assert!(matches!(err, CwlError::Decode { .. }));

        // Valid base64, but not zlib data
        let plain = STANDARD.encode(b"hello");
        let err = codec.decode_compressed("quantum", &plain).unwrap_err();
        assert!(matches!(err, CwlError::Compression { .. }));
    }
}
