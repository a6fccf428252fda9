// Persisted form of a turn: destination heading, velocity and the encoded payload.
//
// Written with bincode's legacy configuration, so every field is fixed-width
// little-endian and the payload bytes carry a u64 length prefix.

use crate::domain::Direction;
use crate::domain::errors::{DecodeError, TurnError};
use bincode::config::{Configuration, Fixint, LittleEndian, NoLimit};
use serde::{Deserialize, Serialize};

fn record_config() -> Configuration<LittleEndian, Fixint, NoLimit> {
    bincode::config::legacy()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
    pub velocity: f32,
    pub payload: Vec<u8>,
}

impl TurnRecord {
    pub fn destination(&self) -> Direction {
        Direction::new(self.roll, self.pitch, self.yaw)
    }

    /// Appends the encoded record to `out` and returns how many bytes were written.
    pub fn write_to(&self, out: &mut Vec<u8>) -> Result<usize, TurnError> {
        bincode::serde::encode_into_std_write(self, out, record_config())
            .map_err(|e| TurnError::Encode(e.to_string()))
    }

    /// Reads exactly one record. Bytes left over after it are an error.
    pub fn read_from(bytes: &[u8]) -> Result<Self, DecodeError> {
        let (record, read): (Self, usize) =
            bincode::serde::decode_from_slice(bytes, record_config()).map_err(decode_error)?;
        match bytes.len() - read {
            0 => Ok(record),
            n => Err(DecodeError::TrailingBytes(n)),
        }
    }
}

fn decode_error(e: bincode::error::DecodeError) -> DecodeError {
    match e {
        bincode::error::DecodeError::UnexpectedEnd { additional } => {
            DecodeError::Truncated { additional }
        }
        other => DecodeError::Malformed(other.to_string()),
    }
}
