//! Harvester core: pure state machine and view-model helpers for the
//! start/stop control surface.
mod effect;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use state::{AppState, FinishStatus, Notice, RunOutcome, RunState, RunStatus};
pub use update::update;
pub use view_model::AppViewModel;
