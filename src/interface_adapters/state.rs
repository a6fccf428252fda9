use crate::domain::tuning::TurnTuning;
use crate::use_cases::CellHandle;

// Shared application state for the HTTP handlers.
pub struct AppState {
    // Channels into the cell task that owns the world.
    pub cell: CellHandle,
    // Defaults applied to turn requests that leave fields out.
    pub turn_tuning: TurnTuning,
}
