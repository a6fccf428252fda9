// Use-case level inputs/outputs for the cell task.

use crate::domain::{
    ControllerId, Direction, EntityId, EntitySnapshot, JsonPayload, Position, TurnError,
};
use tokio::sync::oneshot;

/// Outcome notifications produced by a world while it ticks.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnEvent<P> {
    /// A rotator reached its heading and notified the entity.
    Completed {
        entity_id: EntityId,
        controller_id: ControllerId,
        payload: P,
    },
    /// A controller was cancelled from outside its rotator.
    Cancelled {
        entity_id: EntityId,
        controller_id: ControllerId,
    },
}

#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub destination: Direction,
    pub velocity: f32,
    pub payload: JsonPayload,
}

pub type Reply<T> = oneshot::Sender<Result<T, TurnError>>;

/// Requests applied by the cell task between ticks.
#[derive(Debug)]
pub enum CellCommand {
    SpawnEntity {
        position: Position,
        direction: Direction,
        reply: Reply<EntityId>,
    },
    DestroyEntity {
        entity_id: EntityId,
        reply: Reply<()>,
    },
    GetEntity {
        entity_id: EntityId,
        reply: Reply<EntitySnapshot>,
    },
    AddTurn {
        entity_id: EntityId,
        request: TurnRequest,
        reply: Reply<ControllerId>,
    },
    CancelController {
        controller_id: ControllerId,
        reply: Reply<()>,
    },
    SuspendTurn {
        controller_id: ControllerId,
        reply: Reply<Vec<u8>>,
    },
    ResumeTurn {
        entity_id: EntityId,
        record: Vec<u8>,
        reply: Reply<ControllerId>,
    },
}
