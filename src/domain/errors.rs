// Domain-level errors for turn requests and persisted turn records.

use crate::domain::{ControllerId, EntityId};
use std::fmt;

/// Failures reading a persisted turn record.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// The buffer ended before a field could be read.
    Truncated { additional: usize },
    /// The record bytes do not describe a turn record.
    Malformed(String),
    /// The payload blob could not be turned back into a payload.
    Payload(String),
    /// Bytes were left over after the record.
    TrailingBytes(usize),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Truncated { additional } => {
                write!(f, "record truncated: {additional} more bytes needed")
            }
            DecodeError::Malformed(reason) => write!(f, "malformed turn record: {reason}"),
            DecodeError::Payload(reason) => write!(f, "invalid payload blob: {reason}"),
            DecodeError::TrailingBytes(count) => {
                write!(f, "{count} unexpected bytes after record")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// Errors returned by world operations that start, inspect or suspend turns.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnError {
    UnknownEntity(EntityId),
    /// The controller was never created or has already been destroyed.
    ControllerDestroyed(ControllerId),
    /// The controller has no rotator that can be written out right now.
    NoActiveTurn(ControllerId),
    InvalidVelocity(f32),
    InvalidDirection,
    InvalidPosition,
    /// Every controller id has been handed out.
    ControllerIdsExhausted,
    Encode(String),
    Decode(DecodeError),
}

impl fmt::Display for TurnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnError::UnknownEntity(id) => write!(f, "entity {id} does not exist"),
            TurnError::ControllerDestroyed(id) => write!(f, "controller {id} does not exist"),
            TurnError::NoActiveTurn(id) => write!(f, "controller {id} has no active turn"),
            TurnError::InvalidVelocity(v) => {
                write!(f, "velocity must be finite and non-negative, got {v}")
            }
            TurnError::InvalidDirection => write!(f, "direction components must be finite"),
            TurnError::InvalidPosition => write!(f, "position components must be finite"),
            TurnError::ControllerIdsExhausted => write!(f, "no controller ids left"),
            TurnError::Encode(reason) => write!(f, "failed to write turn record: {reason}"),
            TurnError::Decode(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for TurnError {}

impl From<DecodeError> for TurnError {
    fn from(e: DecodeError) -> Self {
        TurnError::Decode(e)
    }
}
