// Turn controller identities and the registry that owns them.

use crate::domain::errors::TurnError;
use crate::domain::{ControllerId, EntityId, HandlerId};
use std::collections::HashMap;

/// Identity of an in-progress controller-driven action on one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnController {
    id: ControllerId,
    entity_id: EntityId,
    // The rotator currently allowed to drive this controller.
    handler: Option<HandlerId>,
}

impl TurnController {
    pub fn id(&self) -> ControllerId {
        self.id
    }

    pub fn entity_id(&self) -> EntityId {
        self.entity_id
    }

    pub fn handler(&self) -> Option<HandlerId> {
        self.handler
    }
}

/// Owns every live controller of a world.
///
/// Rotators only hold a controller id and look it up here, so removing an entry is
/// what "nulls" a rotator's controller reference. Ids are never reused, which keeps
/// a stale rotator from mistaking a newer controller for its own.
#[derive(Debug)]
pub struct ControllerRegistry {
    // Wider than `ControllerId` so running past the last id is detectable.
    next_id: u64,
    controllers: HashMap<ControllerId, TurnController>,
}

impl Default for ControllerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            controllers: HashMap::new(),
        }
    }

    /// Allocates a fresh controller id. Fails once every id has been handed out
    /// rather than wrapping onto ids a stale rotator might still remember.
    pub fn create(&mut self, entity_id: EntityId) -> Result<ControllerId, TurnError> {
        let id = ControllerId::try_from(self.next_id)
            .map_err(|_| TurnError::ControllerIdsExhausted)?;
        self.next_id += 1;
        self.controllers.insert(
            id,
            TurnController {
                id,
                entity_id,
                handler: None,
            },
        );
        Ok(id)
    }

    pub fn get(&self, id: ControllerId) -> Option<&TurnController> {
        self.controllers.get(&id)
    }

    pub fn contains(&self, id: ControllerId) -> bool {
        self.controllers.contains_key(&id)
    }

    /// Owning entity of a live controller.
    pub fn entity(&self, id: ControllerId) -> Result<EntityId, TurnError> {
        self.get(id)
            .map(TurnController::entity_id)
            .ok_or(TurnError::ControllerDestroyed(id))
    }

    /// Points the controller's active slot at `handler`, returning the handler it
    /// replaced. The replaced rotator no longer sees itself as bound.
    pub fn bind_handler(
        &mut self,
        id: ControllerId,
        handler: HandlerId,
    ) -> Result<Option<HandlerId>, TurnError> {
        let controller = self
            .controllers
            .get_mut(&id)
            .ok_or(TurnError::ControllerDestroyed(id))?;
        Ok(controller.handler.replace(handler))
    }

    /// True while `handler` is the one bound to a live controller `id`.
    pub fn is_bound(&self, id: ControllerId, handler: HandlerId) -> bool {
        self.get(id).and_then(TurnController::handler) == Some(handler)
    }

    /// Removes the controller. Calling it again, including from inside a callback
    /// triggered by an earlier destroy, is a no-op returning `None`.
    pub fn destroy(&mut self, id: ControllerId) -> Option<TurnController> {
        self.controllers.remove(&id)
    }

    pub fn for_entity(&self, entity_id: EntityId) -> Vec<ControllerId> {
        let mut ids: Vec<ControllerId> = self
            .controllers
            .values()
            .filter(|c| c.entity_id == entity_id)
            .map(TurnController::id)
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}
