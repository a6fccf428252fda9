// Per-tick update registry. Owns every registered updatable and is the only place
// that drops them.

use crate::domain::{HandlerId, Payload};
use crate::use_cases::world::World;
use std::any::Any;
use std::collections::BTreeMap;
use tracing::trace;

/// Anything the scheduler drives once per tick.
pub trait Updatable<P: Payload>: Send + 'static {
    /// Advances one tick. Returning false means the updatable is done; the scheduler
    /// drops it after the call returns and never calls it again.
    fn update(&mut self, world: &mut World<P>) -> bool;

    /// For downcasting when a controller writes its behavior out.
    fn as_any(&self) -> &dyn Any;
}

type ActiveSet<P> = BTreeMap<HandlerId, Box<dyn Updatable<P>>>;

pub struct Scheduler<P: Payload> {
    next_id: HandlerId,
    active: ActiveSet<P>,
}

impl<P: Payload> Default for Scheduler<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Payload> Scheduler<P> {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            active: BTreeMap::new(),
        }
    }

    /// Hands out the id an updatable will be registered under, so it can know its
    /// own identity before it is boxed.
    pub fn reserve_id(&mut self) -> HandlerId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn register(&mut self, id: HandlerId, updatable: Box<dyn Updatable<P>>) {
        trace!(handler_id = id, "updatable registered");
        self.active.insert(id, updatable);
    }

    /// Registered updatable by id. The one entry the current sweep is driving is
    /// not visible until its update returns.
    pub fn get(&self, id: HandlerId) -> Option<&dyn Updatable<P>> {
        self.active.get(&id).map(|u| u.as_ref())
    }

    pub fn contains(&self, id: HandlerId) -> bool {
        self.active.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    fn active_ids(&self) -> Vec<HandlerId> {
        self.active.keys().copied().collect()
    }

    fn take(&mut self, id: HandlerId) -> Option<Box<dyn Updatable<P>>> {
        self.active.remove(&id)
    }

    fn put_back(&mut self, id: HandlerId, updatable: Box<dyn Updatable<P>>) {
        self.active.insert(id, updatable);
    }
}

/// Drives every registered updatable exactly once and drops the ones that finished.
/// Returns how many were removed.
pub fn run_tick<P: Payload>(world: &mut World<P>) -> usize {
    // Ids registered while the sweep runs are not in this list; they are first
    // driven next tick.
    let ids = world.scheduler().active_ids();
    let mut finished = 0;

    for handler_id in ids {
        let Some(mut updatable) = world.scheduler_mut().take(handler_id) else {
            continue;
        };
        if updatable.update(world) {
            world.scheduler_mut().put_back(handler_id, updatable);
        } else {
            trace!(handler_id, "updatable finished");
            finished += 1;
        }
    }

    finished
}
