// Opaque user argument carried by a turn and handed back on completion.

use crate::domain::errors::DecodeError;
use serde_json::Value;

/// Capability required from a turn's user argument.
///
/// Taking ownership acquires the value and dropping it releases it, so a rotator
/// releases its payload exactly once when the scheduler drops it. The payload is
/// never inspected; only `encode`/`decode` touch its contents.
pub trait Payload: Clone + Send + 'static {
    fn encode(&self) -> Vec<u8>;
    fn decode(bytes: &[u8]) -> Result<Self, DecodeError>;
}

/// Script-side argument backed by an arbitrary JSON value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JsonPayload(pub Value);

impl Payload for JsonPayload {
    fn encode(&self) -> Vec<u8> {
        // Serializing a `Value` cannot fail: its map keys are always strings.
        serde_json::to_vec(&self.0).unwrap_or_default()
    }

    fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        serde_json::from_slice(bytes)
            .map(Self)
            .map_err(|e| DecodeError::Payload(e.to_string()))
    }
}
