// Cell space: entities, their turn controllers and the scheduler that drives them.

use crate::domain::{
    ControllerId, ControllerRegistry, Direction, EntityId, EntitySnapshot, HandlerId, Payload,
    Position, SimEntity, TurnError,
};
use crate::use_cases::rotator::RotatorHandler;
use crate::use_cases::scheduler::{Scheduler, run_tick};
use crate::use_cases::types::TurnEvent;
use std::collections::HashMap;
use tracing::{debug, info};

/// Entity-side handler invoked when a turn completes.
///
/// It runs with full access to the world and may cancel or re-arm the very
/// controller that just completed.
pub type TurnHook<P> = Box<dyn FnMut(&mut World<P>, EntityId, ControllerId, &P) + Send>;

pub struct World<P: Payload> {
    tick: u64,
    next_entity_id: EntityId,
    entities: HashMap<EntityId, SimEntity>,
    controllers: ControllerRegistry,
    scheduler: Scheduler<P>,
    turn_hook: Option<TurnHook<P>>,
    events: Vec<TurnEvent<P>>,
}

impl<P: Payload> Default for World<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Payload> World<P> {
    pub fn new() -> Self {
        Self {
            tick: 0,
            next_entity_id: 1,
            entities: HashMap::new(),
            controllers: ControllerRegistry::new(),
            scheduler: Scheduler::new(),
            turn_hook: None,
            events: Vec::new(),
        }
    }

    pub fn set_turn_hook<F>(&mut self, hook: F)
    where
        F: FnMut(&mut World<P>, EntityId, ControllerId, &P) + Send + 'static,
    {
        self.turn_hook = Some(Box::new(hook));
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn controllers(&self) -> &ControllerRegistry {
        &self.controllers
    }

    pub(crate) fn controllers_mut(&mut self) -> &mut ControllerRegistry {
        &mut self.controllers
    }

    pub fn scheduler(&self) -> &Scheduler<P> {
        &self.scheduler
    }

    pub(crate) fn scheduler_mut(&mut self) -> &mut Scheduler<P> {
        &mut self.scheduler
    }

    pub fn entity(&self, entity_id: EntityId) -> Option<&SimEntity> {
        self.entities.get(&entity_id)
    }

    pub fn snapshot(&self) -> Vec<EntitySnapshot> {
        let mut entities: Vec<EntitySnapshot> =
            self.entities.values().map(EntitySnapshot::from).collect();
        entities.sort_by_key(|e| e.id);
        entities
    }

    pub fn spawn_entity(
        &mut self,
        position: Position,
        direction: Direction,
    ) -> Result<EntityId, TurnError> {
        if !position.is_finite() {
            return Err(TurnError::InvalidPosition);
        }
        if !direction.is_finite() {
            return Err(TurnError::InvalidDirection);
        }

        let entity_id = self.next_entity_id;
        self.next_entity_id += 1;
        self.entities
            .insert(entity_id, SimEntity::new(entity_id, position, direction));
        debug!(entity_id, yaw = direction.yaw, "entity spawned");
        Ok(entity_id)
    }

    /// Removes the entity and destroys every controller acting on it. Their rotators
    /// drop out on the next tick.
    pub fn destroy_entity(&mut self, entity_id: EntityId) -> bool {
        if self.entities.remove(&entity_id).is_none() {
            return false;
        }
        for controller_id in self.controllers.for_entity(entity_id) {
            self.controllers.destroy(controller_id);
        }
        debug!(entity_id, "entity destroyed");
        true
    }

    pub(crate) fn set_position_and_direction(
        &mut self,
        entity_id: EntityId,
        position: Position,
        direction: Direction,
    ) -> bool {
        match self.entities.get_mut(&entity_id) {
            Some(entity) => {
                entity.set_position_and_direction(position, direction);
                true
            }
            None => false,
        }
    }

    pub fn create_controller(&mut self, entity_id: EntityId) -> Result<ControllerId, TurnError> {
        if !self.entities.contains_key(&entity_id) {
            return Err(TurnError::UnknownEntity(entity_id));
        }
        self.controllers.create(entity_id)
    }

    /// Starts a rotator on an existing controller, replacing any rotator already
    /// bound to it. The payload is owned by the rotator until it is dropped.
    pub fn create_turn(
        &mut self,
        controller_id: ControllerId,
        destination: Direction,
        velocity: f32,
        payload: P,
    ) -> Result<HandlerId, TurnError> {
        validate_turn(destination, velocity)?;
        if !self.controllers.contains(controller_id) {
            return Err(TurnError::ControllerDestroyed(controller_id));
        }
        self.register_rotator(controller_id, RotatorHandler::new(destination, velocity, payload))
    }

    /// Creates a controller on the entity and starts a yaw rotator on it.
    pub fn add_yaw_rotator(
        &mut self,
        entity_id: EntityId,
        destination: Direction,
        velocity: f32,
        payload: P,
    ) -> Result<ControllerId, TurnError> {
        validate_turn(destination, velocity)?;
        let controller_id = self.create_controller(entity_id)?;
        self.register_rotator(controller_id, RotatorHandler::new(destination, velocity, payload))?;
        info!(entity_id, controller_id, dest_yaw = destination.yaw, velocity, "turn started");
        Ok(controller_id)
    }

    fn register_rotator(
        &mut self,
        controller_id: ControllerId,
        mut rotator: RotatorHandler<P>,
    ) -> Result<HandlerId, TurnError> {
        let handler_id = self.scheduler.reserve_id();
        let replaced = self.controllers.bind_handler(controller_id, handler_id)?;
        rotator.bind(controller_id, handler_id);
        self.scheduler.register(handler_id, Box::new(rotator));
        debug!(controller_id, handler_id, ?replaced, "rotator bound");
        Ok(handler_id)
    }

    /// Destroys a controller from outside its rotator. The rotator notices on its
    /// next update. Returns false if the controller was already gone.
    pub fn cancel_controller(&mut self, controller_id: ControllerId) -> bool {
        let Some(controller) = self.controllers.destroy(controller_id) else {
            return false;
        };
        info!(
            entity_id = controller.entity_id(),
            controller_id, "controller cancelled"
        );
        self.events.push(TurnEvent::Cancelled {
            entity_id: controller.entity_id(),
            controller_id,
        });
        true
    }

    /// Writes the controller's rotator out and destroys the controller.
    pub fn suspend_turn(&mut self, controller_id: ControllerId) -> Result<Vec<u8>, TurnError> {
        let handler_id = self
            .controllers
            .get(controller_id)
            .ok_or(TurnError::ControllerDestroyed(controller_id))?
            .handler()
            .ok_or(TurnError::NoActiveTurn(controller_id))?;
        let rotator = self
            .scheduler
            .get(handler_id)
            .and_then(|u| u.as_any().downcast_ref::<RotatorHandler<P>>())
            .ok_or(TurnError::NoActiveTurn(controller_id))?;

        let mut record = Vec::new();
        rotator.add_to_stream(&mut record)?;

        self.controllers.destroy(controller_id);
        info!(controller_id, bytes = record.len(), "turn suspended");
        Ok(record)
    }

    /// Rebuilds a rotator from a suspended record and binds it to a fresh controller
    /// on `entity_id`. Nothing is mutated unless the record decodes cleanly.
    pub fn resume_turn(
        &mut self,
        entity_id: EntityId,
        record: &[u8],
    ) -> Result<ControllerId, TurnError> {
        if !self.entities.contains_key(&entity_id) {
            return Err(TurnError::UnknownEntity(entity_id));
        }

        let rotator = RotatorHandler::<P>::create_from_stream(record)?;
        validate_turn(rotator.dest_dir(), rotator.velocity())?;

        let controller_id = self.controllers.create(entity_id)?;
        self.register_rotator(controller_id, rotator)?;
        info!(entity_id, controller_id, "turn resumed");
        Ok(controller_id)
    }

    /// Runs one scheduler sweep and returns the new tick number.
    pub fn tick(&mut self) -> u64 {
        self.tick += 1;
        let finished = run_tick(self);
        if finished > 0 {
            debug!(tick = self.tick, finished, "rotators finished");
        }
        self.tick
    }

    pub fn drain_events(&mut self) -> Vec<TurnEvent<P>> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn notify_turn(
        &mut self,
        entity_id: EntityId,
        controller_id: ControllerId,
        payload: &P,
    ) {
        info!(entity_id, controller_id, "turn complete");
        self.events.push(TurnEvent::Completed {
            entity_id,
            controller_id,
            payload: payload.clone(),
        });

        if let Some(mut hook) = self.turn_hook.take() {
            hook(self, entity_id, controller_id, payload);
            // Keep a hook the callback installed for itself.
            if self.turn_hook.is_none() {
                self.turn_hook = Some(hook);
            }
        }
    }
}

fn validate_turn(destination: Direction, velocity: f32) -> Result<(), TurnError> {
    if !destination.is_finite() {
        return Err(TurnError::InvalidDirection);
    }
    if !velocity.is_finite() || velocity < 0.0 {
        return Err(TurnError::InvalidVelocity(velocity));
    }
    Ok(())
}
