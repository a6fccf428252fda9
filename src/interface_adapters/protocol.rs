// Wire protocol DTOs and conversions for the cell HTTP API.

use crate::domain::{Direction, EntitySnapshot, Position};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body for spawning an entity. Every component defaults to zero.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpawnEntityRequest {
    #[serde(default)]
    pub position: PositionDto,
    #[serde(default)]
    pub direction: DirectionDto,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpawnEntityResponse {
    pub entity_id: u64,
}

/// Body for starting a yaw turn on an entity.
#[derive(Debug, Clone, Deserialize)]
pub struct TurnRequestDto {
    pub yaw: f32,
    #[serde(default)]
    pub pitch: f32,
    #[serde(default)]
    pub roll: f32,
    // Radians per tick; falls back to the turn tuning default.
    #[serde(default)]
    pub velocity: Option<f32>,
    // Handed back verbatim when the turn completes.
    #[serde(default)]
    pub payload: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct TurnResponse {
    pub controller_id: u32,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PositionDto {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl From<PositionDto> for Position {
    fn from(p: PositionDto) -> Self {
        Position::new(p.x, p.y, p.z)
    }
}

impl From<Position> for PositionDto {
    fn from(p: Position) -> Self {
        Self {
            x: p.x,
            y: p.y,
            z: p.z,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DirectionDto {
    #[serde(default)]
    pub roll: f32,
    #[serde(default)]
    pub pitch: f32,
    #[serde(default)]
    pub yaw: f32,
}

impl From<DirectionDto> for Direction {
    fn from(d: DirectionDto) -> Self {
        Direction::new(d.roll, d.pitch, d.yaw)
    }
}

impl From<Direction> for DirectionDto {
    fn from(d: Direction) -> Self {
        Self {
            roll: d.roll,
            pitch: d.pitch,
            yaw: d.yaw,
        }
    }
}

/// Entity state returned by the entity lookup endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct EntityStateDto {
    pub id: u64,
    pub position: PositionDto,
    pub direction: DirectionDto,
}

impl From<EntitySnapshot> for EntityStateDto {
    fn from(entity: EntitySnapshot) -> Self {
        Self {
            id: entity.id,
            position: entity.position.into(),
            direction: entity.direction.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    // Human-readable error string for consistent JSON error responses.
    pub error: String,
}
