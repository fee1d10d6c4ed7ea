//! Terminal front end: drives the core state machine from the command line.
mod app;
mod effects;
mod ui;

pub use app::{run_app, Launch};

use harvester_core::Msg;

/// Everything the main loop reacts to.
#[derive(Debug)]
pub(crate) enum Inbound {
    Ui(Msg),
    /// Ctrl-C from the terminal.
    Interrupted,
}
