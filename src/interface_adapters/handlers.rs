use crate::domain::{Direction, JsonPayload, TurnError};
use crate::interface_adapters::protocol::{
    EntityStateDto, ErrorResponse, SpawnEntityRequest, SpawnEntityResponse, TurnRequestDto,
    TurnResponse,
};
use crate::interface_adapters::state::AppState;
use crate::use_cases::{CellError, TurnRequest};
use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{error, warn};

type ApiError = (StatusCode, Json<ErrorResponse>);

// Map cell failures onto HTTP status codes with a JSON error body.
fn api_error(e: CellError) -> ApiError {
    let status = match &e {
        CellError::Closed => {
            error!("cell task is not running");
            StatusCode::SERVICE_UNAVAILABLE
        }
        CellError::Turn(TurnError::UnknownEntity(_) | TurnError::ControllerDestroyed(_)) => {
            StatusCode::NOT_FOUND
        }
        CellError::Turn(TurnError::NoActiveTurn(_)) => StatusCode::CONFLICT,
        CellError::Turn(
            TurnError::InvalidVelocity(_)
            | TurnError::InvalidDirection
            | TurnError::InvalidPosition
            | TurnError::Decode(_),
        ) => StatusCode::BAD_REQUEST,
        CellError::Turn(TurnError::ControllerIdsExhausted | TurnError::Encode(_)) => {
            error!(error = %e, "turn request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

pub async fn spawn_entity(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SpawnEntityRequest>,
) -> Result<(StatusCode, Json<SpawnEntityResponse>), ApiError> {
    let entity_id = state
        .cell
        .spawn_entity(request.position.into(), request.direction.into())
        .await
        .map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(SpawnEntityResponse { entity_id })))
}

pub async fn get_entity(
    State(state): State<Arc<AppState>>,
    Path(entity_id): Path<u64>,
) -> Result<Json<EntityStateDto>, ApiError> {
    let snapshot = state.cell.entity(entity_id).await.map_err(api_error)?;
    Ok(Json(snapshot.into()))
}

pub async fn destroy_entity(
    State(state): State<Arc<AppState>>,
    Path(entity_id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    state
        .cell
        .destroy_entity(entity_id)
        .await
        .map_err(api_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_turn(
    State(state): State<Arc<AppState>>,
    Path(entity_id): Path<u64>,
    Json(request): Json<TurnRequestDto>,
) -> Result<(StatusCode, Json<TurnResponse>), ApiError> {
    let velocity = request
        .velocity
        .unwrap_or(state.turn_tuning.default_velocity);
    let turn = TurnRequest {
        destination: Direction::new(request.roll, request.pitch, request.yaw),
        velocity,
        payload: JsonPayload(request.payload),
    };

    let controller_id = state
        .cell
        .add_turn(entity_id, turn)
        .await
        .map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(TurnResponse { controller_id })))
}

pub async fn cancel_controller(
    State(state): State<Arc<AppState>>,
    Path(controller_id): Path<u32>,
) -> Result<StatusCode, ApiError> {
    state
        .cell
        .cancel_controller(controller_id)
        .await
        .map_err(api_error)?;
    Ok(StatusCode::NO_CONTENT)
}

// Returns the raw turn record so it can be resumed on another entity or cell.
pub async fn suspend_turn(
    State(state): State<Arc<AppState>>,
    Path(controller_id): Path<u32>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state
        .cell
        .suspend_turn(controller_id)
        .await
        .map_err(api_error)?;
    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        record,
    ))
}

pub async fn resume_turn(
    State(state): State<Arc<AppState>>,
    Path(entity_id): Path<u64>,
    body: Bytes,
) -> Result<(StatusCode, Json<TurnResponse>), ApiError> {
    let controller_id = state
        .cell
        .resume_turn(entity_id, body.to_vec())
        .await
        .map_err(|e| {
            warn!(entity_id, error = %e, "failed to resume turn");
            api_error(e)
        })?;
    Ok((StatusCode::CREATED, Json(TurnResponse { controller_id })))
}
