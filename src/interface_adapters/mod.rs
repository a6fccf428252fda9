// Interface adapters: HTTP protocol and handlers in front of the cell task.

pub mod handlers;
pub mod protocol;
pub mod routes;
pub mod state;
