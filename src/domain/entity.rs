// Simulated entity state and the snapshot exposed outside the world task.

use crate::domain::EntityId;
use crate::domain::direction::{Direction, Position};

#[derive(Debug, Clone, PartialEq)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub position: Position,
    pub direction: Direction,
}

pub struct SimEntity {
    id: EntityId,
    position: Position,
    direction: Direction,
    // Bumped on every combined position/direction write.
    revision: u64,
}

impl SimEntity {
    pub fn new(id: EntityId, position: Position, direction: Direction) -> Self {
        Self {
            id,
            position,
            direction,
            revision: 0,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Writes position and direction as one update so movement observers see both.
    pub fn set_position_and_direction(&mut self, position: Position, direction: Direction) {
        self.position = position;
        self.direction = direction;
        self.revision += 1;
    }
}

impl From<&SimEntity> for EntitySnapshot {
    fn from(e: &SimEntity) -> Self {
        Self {
            id: e.id,
            position: e.position,
            direction: e.direction,
        }
    }
}
