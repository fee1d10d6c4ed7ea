use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc;
use std::thread;

use engine_logging::{engine_debug, engine_info, engine_warn};
use harvester_core::{update, AppState, Msg, Notice, RunStatus};
use harvester_engine::EngineHandle;

use super::effects::EffectRunner;
use super::ui::render::Renderer;
use super::Inbound;

const EXIT_FAILED: u8 = 1;
const EXIT_INVALID_INPUT: u8 = 2;
const EXIT_INTERRUPTED: u8 = 130;

/// What the user typed on the command line, fed to the form as if entered.
#[derive(Debug, Clone)]
pub struct Launch {
    pub query: String,
    pub count: String,
    pub destination: Option<PathBuf>,
}

pub fn run_app(engine: EngineHandle, launch: Launch) -> io::Result<ExitCode> {
    let (inbound_tx, inbound_rx) = mpsc::channel::<Inbound>();
    spawn_interrupt_listener(inbound_tx.clone())?;
    let runner = EffectRunner::new(engine, inbound_tx, launch.destination)?;

    let mut app = App {
        state: AppState::new(),
        runner,
        renderer: Renderer::default(),
    };
    app.dispatch(Msg::QueryChanged(launch.query));
    app.dispatch(Msg::CountChanged(launch.count));
    app.dispatch(Msg::StartClicked);

    while !app.settled() {
        let Ok(inbound) = inbound_rx.recv() else {
            engine_warn!("All message senders dropped before the run settled");
            break;
        };
        let msg = match inbound {
            Inbound::Ui(msg) => msg,
            Inbound::Interrupted => app.interrupt_msg(),
        };
        app.dispatch(msg);
    }

    Ok(app.exit_code())
}

struct App {
    state: AppState,
    runner: EffectRunner,
    renderer: Renderer,
}

impl App {
    fn dispatch(&mut self, msg: Msg) {
        let (state, effects) = update(std::mem::take(&mut self.state), msg);
        self.state = state;
        self.runner.run(effects);

        if self.state.consume_dirty() {
            let view = self.state.view();
            if let Err(err) = self.renderer.render(&view, &mut io::stderr()) {
                engine_debug!("Render failed: {}", err);
            }
        }
    }

    /// True once nothing further can happen without new user input.
    fn settled(&self) -> bool {
        let view = self.state.view();
        view.status.is_terminal() || (view.status == RunStatus::Idle && !view.awaiting_destination)
    }

    /// Ctrl-C stops a running harvest, or cancels a pending prompt.
    fn interrupt_msg(&self) -> Msg {
        let view = self.state.view();
        if view.awaiting_destination {
            Msg::DestinationChosen(None)
        } else if view.can_stop {
            Msg::StopClicked
        } else {
            Msg::NoOp
        }
    }

    fn exit_code(&self) -> ExitCode {
        let view = self.state.view();
        engine_info!(
            "Exiting with status {:?} ({} of {} images)",
            view.status,
            view.downloaded,
            view.requested
        );
        match view.status {
            RunStatus::Complete => ExitCode::SUCCESS,
            RunStatus::Stopped => ExitCode::from(EXIT_INTERRUPTED),
            RunStatus::Idle if matches!(view.notice, Some(Notice::Error(_))) => {
                ExitCode::from(EXIT_INVALID_INPUT)
            }
            _ => ExitCode::from(EXIT_FAILED),
        }
    }
}

/// Forwards every Ctrl-C to the main loop until it stops listening.
fn spawn_interrupt_listener(inbound: mpsc::Sender<Inbound>) -> io::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    thread::Builder::new()
        .name("ctrl-c".into())
        .spawn(move || {
            while runtime.block_on(tokio::signal::ctrl_c()).is_ok() {
                engine_info!("Received Ctrl-C");
                if inbound.send(Inbound::Interrupted).is_err() {
                    break;
                }
            }
        })?;
    Ok(())
}
