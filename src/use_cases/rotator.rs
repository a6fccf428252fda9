// Yaw rotator: turns an entity toward a destination heading a bounded amount per
// tick and notifies the entity once the heading is reached.

use crate::domain::tuning::TURN_EPSILON;
use crate::domain::{
    ControllerId, DecodeError, Direction, HandlerId, Payload, TurnError, TurnRecord,
    normalize_angle,
};
use crate::use_cases::scheduler::Updatable;
use crate::use_cases::world::World;
use std::any::Any;
use tracing::{debug, warn};

// Lookup-only link to the controller. The controller's registry entry is the source
// of truth; this is only valid while that entry still names `handler`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Binding {
    controller: ControllerId,
    handler: HandlerId,
}

pub struct RotatorHandler<P: Payload> {
    dest_dir: Direction,
    velocity: f32,
    payload: P,
    binding: Option<Binding>,
}

impl<P: Payload> RotatorHandler<P> {
    /// Builds an unbound rotator. `World::create_turn` binds and registers it.
    pub fn new(dest_dir: Direction, velocity: f32, payload: P) -> Self {
        Self {
            dest_dir,
            velocity,
            payload,
            binding: None,
        }
    }

    pub fn dest_dir(&self) -> Direction {
        self.dest_dir
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Controller this rotator was last bound to, whether or not it still exists.
    pub fn controller_id(&self) -> Option<ControllerId> {
        self.binding.map(|b| b.controller)
    }

    pub(crate) fn bind(&mut self, controller: ControllerId, handler: HandlerId) {
        self.binding = Some(Binding {
            controller,
            handler,
        });
    }

    pub fn to_record(&self) -> TurnRecord {
        TurnRecord {
            yaw: self.dest_dir.yaw,
            pitch: self.dest_dir.pitch,
            roll: self.dest_dir.roll,
            velocity: self.velocity,
            payload: self.payload.encode(),
        }
    }

    /// Appends this rotator's record to `stream`.
    pub fn add_to_stream(&self, stream: &mut Vec<u8>) -> Result<usize, TurnError> {
        self.to_record().write_to(stream)
    }

    /// Reads a rotator written by `add_to_stream`. The result is neither bound to a
    /// controller nor registered with a scheduler.
    pub fn create_from_stream(stream: &[u8]) -> Result<Self, DecodeError> {
        let record = TurnRecord::read_from(stream)?;
        let payload = P::decode(&record.payload)?;
        Ok(Self::new(record.destination(), record.velocity, payload))
    }

    // Re-reads the registry on every call; a cached answer goes stale as soon as
    // entity code runs.
    fn live_controller(&mut self, world: &World<P>) -> Option<ControllerId> {
        let binding = self.binding?;
        if world
            .controllers()
            .is_bound(binding.controller, binding.handler)
        {
            Some(binding.controller)
        } else {
            self.binding = None;
            None
        }
    }

    /// Notifies the entity and tears down the controller. Always reports finished.
    fn request_turn_over(&mut self, world: &mut World<P>) -> bool {
        if let Some(controller_id) = self.live_controller(world) {
            if let Ok(entity_id) = world.controllers().entity(controller_id) {
                world.notify_turn(entity_id, controller_id, &self.payload);
            }

            // on_turn may have cancelled the controller or re-armed it with another
            // rotator. Only destroy it if it is still ours.
            if self.live_controller(world).is_some() {
                world.controllers_mut().destroy(controller_id);
            }
            self.binding = None;
        }

        true
    }
}

impl<P: Payload> Updatable<P> for RotatorHandler<P> {
    fn update(&mut self, world: &mut World<P>) -> bool {
        let Some(controller_id) = self.live_controller(world) else {
            debug!(dest_yaw = self.dest_dir.yaw, "rotator has no controller; removing");
            return false;
        };

        let entity = world
            .controllers()
            .entity(controller_id)
            .ok()
            .and_then(|entity_id| world.entity(entity_id))
            .map(|e| (e.id(), e.position(), e.direction()));
        let Some((entity_id, position, current)) = entity else {
            warn!(controller_id, "controller outlived its entity; removing rotator");
            world.controllers_mut().destroy(controller_id);
            return false;
        };

        let mut delta_yaw = normalize_angle(self.dest_dir.yaw - current.yaw);

        let reached = delta_yaw.abs() < TURN_EPSILON;
        if reached {
            delta_yaw = 0.0;
        } else if delta_yaw.abs() > self.velocity {
            delta_yaw = self.velocity.copysign(delta_yaw);
        }

        let next = current.with_yaw(normalize_angle(current.yaw + delta_yaw));

        if self.live_controller(world).is_some() {
            world.set_position_and_direction(entity_id, position, next);
        }

        if reached && self.request_turn_over(world) {
            return false;
        }

        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EntityId, JsonPayload, Position};
    use crate::use_cases::scheduler::run_tick;
    use crate::use_cases::types::TurnEvent;
    use proptest::prelude::*;
    use serde_json::{Value, json};
    use std::f32::consts::PI;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn world_with_entity(yaw: f32) -> (World<JsonPayload>, EntityId) {
        let mut world = World::new();
        let entity_id = world
            .spawn_entity(Position::new(1.0, 2.0, 3.0), Direction::from_yaw(yaw))
            .expect("spawn should succeed");
        (world, entity_id)
    }

    fn yaw_of(world: &World<JsonPayload>, entity_id: EntityId) -> f32 {
        world
            .entity(entity_id)
            .expect("entity should exist")
            .direction()
            .yaw
    }

    // Unregistered rotator bound to a fresh controller, so `update` can be called
    // directly instead of through the scheduler.
    fn bound_rotator(
        world: &mut World<JsonPayload>,
        entity_id: EntityId,
        dest_yaw: f32,
        velocity: f32,
    ) -> (RotatorHandler<JsonPayload>, ControllerId) {
        let controller_id = world
            .create_controller(entity_id)
            .expect("controller should be created");
        let handler_id = world.scheduler_mut().reserve_id();
        world
            .controllers_mut()
            .bind_handler(controller_id, handler_id)
            .expect("bind should succeed");
        let mut rotator =
            RotatorHandler::new(Direction::from_yaw(dest_yaw), velocity, JsonPayload(json!("arg")));
        rotator.bind(controller_id, handler_id);
        (rotator, controller_id)
    }

    #[test]
    fn when_delta_is_below_threshold_then_single_update_completes() {
        let (mut world, entity_id) = world_with_entity(1.0);
        let (mut rotator, controller_id) = bound_rotator(&mut world, entity_id, 1.005, 0.001);

        assert!(!rotator.update(&mut world));

        // Snapped, not clamped: heading is left where it was.
        assert_eq!(yaw_of(&world, entity_id), 1.0);
        assert!(!world.controllers().contains(controller_id));
        let events = world.drain_events();
        assert!(matches!(
            events.as_slice(),
            [TurnEvent::Completed { controller_id: c, .. }] if *c == controller_id
        ));
    }

    #[test]
    fn when_delta_exceeds_velocity_then_heading_advances_by_exactly_velocity() {
        let (mut world, entity_id) = world_with_entity(0.0);
        let (mut rotator, controller_id) = bound_rotator(&mut world, entity_id, 2.0, 0.25);

        assert!(rotator.update(&mut world));
        assert_eq!(yaw_of(&world, entity_id), 0.25);
        assert!(world.controllers().contains(controller_id));

        let (mut back, _) = bound_rotator(&mut world, entity_id, -2.0, 0.25);
        assert!(back.update(&mut world));
        assert_eq!(yaw_of(&world, entity_id), 0.0);
    }

    #[test]
    fn when_rotating_then_position_and_other_axes_are_preserved() {
        let mut world = World::<JsonPayload>::new();
        let entity_id = world
            .spawn_entity(Position::new(4.0, 5.0, 6.0), Direction::new(0.3, -0.2, 0.0))
            .expect("spawn should succeed");
        let (mut rotator, _) = bound_rotator(&mut world, entity_id, 1.0, 0.5);

        rotator.update(&mut world);

        let entity = world.entity(entity_id).expect("entity should exist");
        assert_eq!(entity.position(), Position::new(4.0, 5.0, 6.0));
        assert_eq!(entity.direction(), Direction::new(0.3, -0.2, 0.5));
        assert_eq!(entity.revision(), 1);
    }

    #[test]
    fn when_turning_across_pi_then_it_takes_the_short_way_and_completes_on_second_tick() {
        let (mut world, entity_id) = world_with_entity(3.10);
        let (mut rotator, _) = bound_rotator(&mut world, entity_id, -3.10, 0.5);

        // Wrapped delta is about +0.0832: above the threshold, below the clamp.
        assert!(rotator.update(&mut world));
        let yaw = yaw_of(&world, entity_id);
        assert!((yaw - (-3.10)).abs() < 1e-4, "yaw after first tick was {yaw}");

        assert!(!rotator.update(&mut world));
        assert_eq!(world.drain_events().len(), 1);
    }

    #[test]
    fn when_controller_is_destroyed_between_ticks_then_next_update_finishes_without_moving() {
        let (mut world, entity_id) = world_with_entity(0.0);
        let (mut rotator, controller_id) = bound_rotator(&mut world, entity_id, 2.0, 0.25);

        assert!(rotator.update(&mut world));
        assert!(world.cancel_controller(controller_id));

        assert!(!rotator.update(&mut world));
        assert_eq!(yaw_of(&world, entity_id), 0.25);
        assert_eq!(rotator.controller_id(), None);
    }

    #[test]
    fn when_turn_hook_cancels_the_controller_then_completion_does_not_destroy_again() {
        let (mut world, entity_id) = world_with_entity(0.0);
        let calls = Arc::new(AtomicUsize::new(0));
        let hook_calls = calls.clone();
        world.set_turn_hook(move |world, _entity_id, controller_id, _payload| {
            hook_calls.fetch_add(1, Ordering::SeqCst);
            assert!(world.cancel_controller(controller_id));
        });
        let (mut rotator, controller_id) = bound_rotator(&mut world, entity_id, 0.0, 0.5);

        assert!(!rotator.update(&mut world));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!world.controllers().contains(controller_id));
        let events = world.drain_events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], TurnEvent::Completed { .. }));
        assert!(matches!(events[1], TurnEvent::Cancelled { .. }));
    }

    #[test]
    fn when_turn_hook_rearms_the_controller_then_the_new_rotator_keeps_it() {
        let (mut world, entity_id) = world_with_entity(0.0);
        world.set_turn_hook(|world, _entity_id, controller_id, payload: &JsonPayload| {
            if payload.0 == json!("arg") {
                world
                    .create_turn(controller_id, Direction::from_yaw(1.0), 0.5, JsonPayload(json!("again")))
                    .expect("re-arm should succeed");
            }
        });
        let (mut rotator, controller_id) = bound_rotator(&mut world, entity_id, 0.0, 0.5);

        assert!(!rotator.update(&mut world));

        // The completing rotator must not tear down a controller it no longer owns.
        assert!(world.controllers().contains(controller_id));
        assert_eq!(world.scheduler().len(), 1);

        // Drive the re-armed turn to completion through the scheduler.
        for _ in 0..5 {
            run_tick(&mut world);
        }
        assert_eq!(yaw_of(&world, entity_id), 1.0);
        assert!(!world.controllers().contains(controller_id));
        assert!(world.scheduler().is_empty());
    }

    #[test]
    fn when_record_is_truncated_then_reading_fails() {
        let rotator = RotatorHandler::new(Direction::from_yaw(1.0), 0.5, JsonPayload(json!(1)));
        let mut bytes = Vec::new();
        rotator.add_to_stream(&mut bytes).expect("record should encode");

        let result = RotatorHandler::<JsonPayload>::create_from_stream(&bytes[..bytes.len() - 1]);
        assert!(matches!(result, Err(DecodeError::Truncated { .. })));
    }

    #[test]
    fn when_unbound_rotator_is_updated_then_it_finishes_immediately() {
        let (mut world, entity_id) = world_with_entity(0.0);
        let mut rotator = RotatorHandler::new(Direction::from_yaw(1.0), 0.5, JsonPayload::default());

        assert!(!rotator.update(&mut world));
        assert_eq!(yaw_of(&world, entity_id), 0.0);
    }

    fn arb_scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            "[a-zA-Z0-9 _]{0,16}".prop_map(Value::from),
        ]
    }

    fn arb_payload() -> impl Strategy<Value = JsonPayload> {
        prop_oneof![
            arb_scalar(),
            prop::collection::vec(arb_scalar(), 0..8).prop_map(Value::from),
        ]
        .prop_map(JsonPayload)
    }

    proptest! {
        #[test]
        fn when_rotating_repeatedly_then_it_converges_within_bounded_updates(
            start in -PI..=PI,
            dest in -PI..=PI,
            velocity in 0.001f32..4.0,
        ) {
            let (mut world, entity_id) = world_with_entity(start);
            let (mut rotator, _) = bound_rotator(&mut world, entity_id, dest, velocity);
            let bound = (PI / velocity).ceil() as usize + 1;

            // Every call counts, including the final one that reports finished.
            let mut updates = 0;
            loop {
                updates += 1;
                prop_assert!(
                    updates <= bound,
                    "start {} dest {} v {} exceeded {} updates", start, dest, velocity, bound
                );
                if !rotator.update(&mut world) {
                    break;
                }
            }
            prop_assert_eq!(world.drain_events().len(), 1);
        }

        #[test]
        fn when_rotator_is_written_then_reading_restores_fields_bit_exact(
            yaw in -PI..=PI,
            pitch in -PI..=PI,
            roll in -PI..=PI,
            velocity in 0.0f32..10.0,
            payload in arb_payload(),
        ) {
            let dest = Direction::new(roll, pitch, yaw);
            let rotator = RotatorHandler::new(dest, velocity, payload);
            let mut bytes = Vec::new();
            rotator.add_to_stream(&mut bytes).expect("record should encode");

            let restored = RotatorHandler::<JsonPayload>::create_from_stream(&bytes)
                .expect("record should decode");

            prop_assert_eq!(restored.dest_dir().yaw.to_bits(), yaw.to_bits());
            prop_assert_eq!(restored.dest_dir().pitch.to_bits(), pitch.to_bits());
            prop_assert_eq!(restored.dest_dir().roll.to_bits(), roll.to_bits());
            prop_assert_eq!(restored.velocity().to_bits(), velocity.to_bits());
            prop_assert_eq!(restored.payload(), rotator.payload());
            prop_assert_eq!(restored.controller_id(), None);
        }
    }
}
