// Cell orchestration: one task owns a world and ticks it at a fixed rate.

use crate::domain::{
    ControllerId, Direction, EntityId, EntitySnapshot, JsonPayload, Position, TurnError,
};
use crate::use_cases::types::{CellCommand, Reply, TurnEvent, TurnRequest};
use crate::use_cases::world::World;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

/// Shared configuration for spawning a cell.
#[derive(Debug, Clone)]
pub struct CellSettings {
    /// Capacity for inbound commands.
    pub command_channel_capacity: usize,
    /// Capacity for broadcast turn events.
    pub event_broadcast_capacity: usize,
    /// Fixed tick interval for the scheduler sweep.
    pub tick_interval: Duration,
}

/// Errors returned when talking to a cell task.
#[derive(Debug, PartialEq)]
pub enum CellError {
    /// The cell task is gone.
    Closed,
    Turn(TurnError),
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellError::Closed => write!(f, "cell is not running"),
            CellError::Turn(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CellError {}

impl From<TurnError> for CellError {
    fn from(e: TurnError) -> Self {
        CellError::Turn(e)
    }
}

/// Channels into and out of a running cell.
#[derive(Clone)]
pub struct CellHandle {
    /// Sender for commands into the cell task.
    pub command_tx: mpsc::Sender<CellCommand>,
    /// Broadcast sender for turn events produced by the cell.
    pub event_tx: broadcast::Sender<TurnEvent<JsonPayload>>,
    shutdown: Arc<Notify>,
}

impl CellHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> CellCommand,
    ) -> Result<T, CellError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(build(reply_tx))
            .await
            .map_err(|_| CellError::Closed)?;
        let result = reply_rx.await.map_err(|_| CellError::Closed)?;
        Ok(result?)
    }

    pub async fn spawn_entity(
        &self,
        position: Position,
        direction: Direction,
    ) -> Result<EntityId, CellError> {
        self.request(|reply| CellCommand::SpawnEntity {
            position,
            direction,
            reply,
        })
        .await
    }

    pub async fn destroy_entity(&self, entity_id: EntityId) -> Result<(), CellError> {
        self.request(|reply| CellCommand::DestroyEntity { entity_id, reply })
            .await
    }

    pub async fn entity(&self, entity_id: EntityId) -> Result<EntitySnapshot, CellError> {
        self.request(|reply| CellCommand::GetEntity { entity_id, reply })
            .await
    }

    pub async fn add_turn(
        &self,
        entity_id: EntityId,
        request: TurnRequest,
    ) -> Result<ControllerId, CellError> {
        self.request(|reply| CellCommand::AddTurn {
            entity_id,
            request,
            reply,
        })
        .await
    }

    pub async fn cancel_controller(&self, controller_id: ControllerId) -> Result<(), CellError> {
        self.request(|reply| CellCommand::CancelController {
            controller_id,
            reply,
        })
        .await
    }

    pub async fn suspend_turn(&self, controller_id: ControllerId) -> Result<Vec<u8>, CellError> {
        self.request(|reply| CellCommand::SuspendTurn {
            controller_id,
            reply,
        })
        .await
    }

    pub async fn resume_turn(
        &self,
        entity_id: EntityId,
        record: Vec<u8>,
    ) -> Result<ControllerId, CellError> {
        self.request(|reply| CellCommand::ResumeTurn {
            entity_id,
            record,
            reply,
        })
        .await
    }

    /// Stops the cell task after its current tick.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }
}

/// Creates the cell channels and spawns its task.
pub fn spawn_cell(settings: &CellSettings) -> CellHandle {
    let (command_tx, command_rx) = mpsc::channel::<CellCommand>(settings.command_channel_capacity);
    let (event_tx, _event_rx) =
        broadcast::channel::<TurnEvent<JsonPayload>>(settings.event_broadcast_capacity);
    let shutdown = Arc::new(Notify::new());

    tokio::spawn(cell_task(
        command_rx,
        event_tx.clone(),
        settings.tick_interval,
        shutdown.clone(),
    ));

    CellHandle {
        command_tx,
        event_tx,
        shutdown,
    }
}

pub async fn cell_task(
    mut command_rx: mpsc::Receiver<CellCommand>,
    event_tx: broadcast::Sender<TurnEvent<JsonPayload>>,
    tick_interval: Duration,
    shutdown: Arc<Notify>,
) {
    let mut world: World<JsonPayload> = World::new();

    // Drive the fixed-step scheduler at the configured tick rate.
    let mut interval = tokio::time::interval(tick_interval);
    info!(tick_ms = tick_interval.as_millis() as u64, "cell started");

    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                break;
            }
            _ = interval.tick() => {
                world.tick();
            }
            command = command_rx.recv() => {
                match command {
                    Some(command) => apply_command(&mut world, command),
                    // Every handle is gone; nobody can reach this cell anymore.
                    None => break,
                }
            }
        }

        for event in world.drain_events() {
            // No subscribers is fine; events are best-effort notifications.
            let _ = event_tx.send(event);
        }
    }

    info!(tick = world.current_tick(), "cell stopped");
}

fn apply_command(world: &mut World<JsonPayload>, command: CellCommand) {
    match command {
        CellCommand::SpawnEntity {
            position,
            direction,
            reply,
        } => {
            let _ = reply.send(world.spawn_entity(position, direction));
        }
        CellCommand::DestroyEntity { entity_id, reply } => {
            let result = if world.destroy_entity(entity_id) {
                Ok(())
            } else {
                Err(TurnError::UnknownEntity(entity_id))
            };
            let _ = reply.send(result);
        }
        CellCommand::GetEntity { entity_id, reply } => {
            let result = world
                .entity(entity_id)
                .map(EntitySnapshot::from)
                .ok_or(TurnError::UnknownEntity(entity_id));
            let _ = reply.send(result);
        }
        CellCommand::AddTurn {
            entity_id,
            request,
            reply,
        } => {
            let result = world.add_yaw_rotator(
                entity_id,
                request.destination,
                request.velocity,
                request.payload,
            );
            let _ = reply.send(result);
        }
        CellCommand::CancelController {
            controller_id,
            reply,
        } => {
            let result = if world.cancel_controller(controller_id) {
                Ok(())
            } else {
                Err(TurnError::ControllerDestroyed(controller_id))
            };
            let _ = reply.send(result);
        }
        CellCommand::SuspendTurn {
            controller_id,
            reply,
        } => {
            let _ = reply.send(world.suspend_turn(controller_id));
        }
        CellCommand::ResumeTurn {
            entity_id,
            record,
            reply,
        } => {
            let result = world.resume_turn(entity_id, &record);
            if let Err(e) = &result {
                debug!(entity_id, error = %e, "resume rejected");
            }
            let _ = reply.send(result);
        }
    }
}

/// Logs every turn event the cell publishes until the cell goes away.
pub async fn log_turn_events(mut event_rx: broadcast::Receiver<TurnEvent<JsonPayload>>) {
    loop {
        match event_rx.recv().await {
            Ok(TurnEvent::Completed {
                entity_id,
                controller_id,
                payload,
            }) => {
                info!(entity_id, controller_id, payload = %payload.0, "onTurn");
            }
            Ok(TurnEvent::Cancelled {
                entity_id,
                controller_id,
            }) => {
                info!(entity_id, controller_id, "turn cancelled");
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(missed = n, "turn event logger lagged");
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!("turn events channel closed; logger exiting");
                break;
            }
        }
    }
}
