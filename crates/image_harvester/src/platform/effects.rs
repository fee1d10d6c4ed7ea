use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use engine_logging::{engine_error, engine_info, engine_warn};
use harvester_core::{Effect, FinishStatus, Msg, RunOutcome};
use harvester_engine::{
    EngineEvent, EngineHandle, HarvestError, HarvestEvent, HarvestReport, HarvestRequest,
    HarvestStatus,
};

use super::Inbound;

const EVENT_POLL: Duration = Duration::from_millis(100);

/// Carries out the effects `update` asks for and feeds engine events back
/// in as messages.
pub(crate) struct EffectRunner {
    engine: Arc<EngineHandle>,
    inbound: mpsc::Sender<Inbound>,
    preset_destination: Option<PathBuf>,
}

impl EffectRunner {
    pub fn new(
        engine: EngineHandle,
        inbound: mpsc::Sender<Inbound>,
        preset_destination: Option<PathBuf>,
    ) -> io::Result<Self> {
        let runner = Self {
            engine: Arc::new(engine),
            inbound,
            preset_destination,
        };
        runner.spawn_event_pump()?;
        Ok(runner)
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::PromptDestination => self.resolve_destination(),
                Effect::StartHarvest {
                    query,
                    target_count,
                    destination,
                } => self.start(query, target_count, destination),
                Effect::StopHarvest => self.engine.stop(),
            }
        }
    }

    fn resolve_destination(&self) {
        if let Some(dir) = &self.preset_destination {
            self.send(Msg::DestinationChosen(Some(dir.clone())));
            return;
        }
        let inbound = self.inbound.clone();
        // stdin blocks; keep the main loop free to react to Ctrl-C.
        let spawned = thread::Builder::new()
            .name("destination-prompt".into())
            .spawn(move || {
                let choice = prompt_destination(&mut io::stdin().lock(), &mut io::stderr());
                let _ = inbound.send(Inbound::Ui(Msg::DestinationChosen(choice)));
            });
        if let Err(err) = spawned {
            engine_error!("Failed to spawn destination prompt: {}", err);
            self.send(Msg::DestinationChosen(None));
        }
    }

    fn start(&self, query: String, target_count: usize, destination: PathBuf) {
        let count = i64::try_from(target_count).unwrap_or(i64::MAX);
        match HarvestRequest::new(query, count, destination) {
            Ok(request) => {
                engine_info!(
                    "StartHarvest query={:?} count={} destination={:?}",
                    request.query(),
                    request.target_count(),
                    request.destination()
                );
                if let Err(err) = self.engine.start(request) {
                    engine_warn!("Harvest not started: {}", err);
                    self.send(Msg::RunFinished(failed(err.to_string())));
                }
            }
            Err(err) => {
                engine_warn!("Harvest request rejected: {}", err);
                self.send(Msg::RunFinished(failed(err.to_string())));
            }
        }
    }

    fn send(&self, msg: Msg) {
        let _ = self.inbound.send(Inbound::Ui(msg));
    }

    fn spawn_event_pump(&self) -> io::Result<()> {
        let engine = Arc::clone(&self.engine);
        let inbound = self.inbound.clone();
        thread::Builder::new()
            .name("engine-events".into())
            .spawn(move || loop {
                let msg = match engine.recv_timeout(EVENT_POLL) {
                    Ok(event) => match map_event(event) {
                        Some(msg) => msg,
                        None => continue,
                    },
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => {
                        let _ = inbound.send(Inbound::Ui(Msg::RunFinished(failed(
                            "harvest engine stopped unexpectedly".to_string(),
                        ))));
                        break;
                    }
                };
                if inbound.send(Inbound::Ui(msg)).is_err() {
                    break;
                }
            })?;
        Ok(())
    }
}

fn map_event(event: EngineEvent) -> Option<Msg> {
    match event {
        EngineEvent::Harvest(HarvestEvent::Progress(progress)) => Some(Msg::Progress {
            percent: progress.percent,
            downloaded: progress.downloaded,
        }),
        EngineEvent::Harvest(_) => None,
        EngineEvent::RunCompleted(result) => Some(Msg::RunFinished(outcome(result))),
    }
}

fn outcome(result: Result<HarvestReport, HarvestError>) -> RunOutcome {
    match result {
        Ok(report) => RunOutcome {
            status: match report.status {
                HarvestStatus::Complete => FinishStatus::Complete,
                HarvestStatus::Stopped => FinishStatus::Stopped,
            },
            downloaded: report.downloaded,
            error: None,
        },
        Err(err) => failed(err.to_string()),
    }
}

fn failed(error: String) -> RunOutcome {
    RunOutcome {
        status: FinishStatus::Failed,
        downloaded: 0,
        error: Some(error),
    }
}

/// Reads one line naming the output directory. Blank input or EOF cancels.
fn prompt_destination(input: &mut impl BufRead, out: &mut impl Write) -> Option<PathBuf> {
    let _ = write!(out, "Save images to directory: ");
    let _ = out.flush();
    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) => None,
        Ok(_) => {
            let trimmed = line.trim();
            (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
        }
        Err(err) => {
            engine_warn!("Failed to read destination: {}", err);
            None
        }
    }
}
