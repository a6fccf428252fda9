// Domain layer: orientation math, turn controllers and persisted turn records.

pub mod controller;
pub mod direction;
pub mod entity;
pub mod errors;
pub mod payload;
pub mod record;
pub mod tuning;

pub type EntityId = u64;
pub type ControllerId = u32;
pub type HandlerId = u64;

pub use controller::{ControllerRegistry, TurnController};
pub use direction::{Direction, Position, normalize_angle};
pub use entity::{EntitySnapshot, SimEntity};
pub use errors::{DecodeError, TurnError};
pub use payload::{JsonPayload, Payload};
pub use record::TurnRecord;
