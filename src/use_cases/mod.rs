// Use cases layer: the tick-driven world and the task that runs it.

pub mod cell;
pub mod rotator;
pub mod scheduler;
pub mod types;
pub mod world;

pub use cell::{CellError, CellHandle, CellSettings, spawn_cell};
pub use rotator::RotatorHandler;
pub use scheduler::{Scheduler, Updatable};
pub use types::{CellCommand, TurnEvent, TurnRequest};
pub use world::World;
