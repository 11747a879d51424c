//! Resource wire codec seam

use fhir_facade_core::Resource;
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::rest::negotiate::Format;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("{} format is not supported by this codec", .0.name())]
    Unsupported(Format),

    #[error("{0}")]
    Malformed(String),
}

/// Decodes request bodies and encodes response bodies in a given format
pub trait Codec: Send + Sync {
    fn decode(&self, bytes: &[u8], format: Format) -> Result<Resource, CodecError>;

    fn encode(&self, resource: &JsonValue, format: Format) -> Result<Vec<u8>, CodecError>;
}

/// JSON-only codec; XML needs an external codec injected in its place
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn decode(&self, bytes: &[u8], format: Format) -> Result<Resource, CodecError> {
        if format != Format::Json {
            return Err(CodecError::Unsupported(format));
        }
        let value: JsonValue =
            serde_json::from_slice(bytes).map_err(|e| CodecError::Malformed(e.to_string()))?;
        Resource::from_value(value).map_err(|e| CodecError::Malformed(e.to_string()))
    }

    fn encode(&self, resource: &JsonValue, format: Format) -> Result<Vec<u8>, CodecError> {
        if format != Format::Json {
            return Err(CodecError::Unsupported(format));
        }
        serde_json::to_vec(resource).map_err(|e| CodecError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_codec_rejects_xml_and_garbage() {
        let codec = JsonCodec;
        assert!(matches!(
            codec.decode(b"<Patient/>", Format::Xml),
            Err(CodecError::Unsupported(Format::Xml))
        ));
        assert!(matches!(
            codec.decode(b"{not json", Format::Json),
            Err(CodecError::Malformed(_))
        ));
        assert!(matches!(
            codec.decode(br#"{"id": "1"}"#, Format::Json),
            Err(CodecError::Malformed(_))
        ));

        let r = codec
            .decode(br#"{"resourceType": "Patient", "id": "1"}"#, Format::Json)
            .unwrap();
        assert_eq!(r.id(), Some("1"));
    }
}
