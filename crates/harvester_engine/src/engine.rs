use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use engine_logging::{engine_error, engine_info};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::page::PageLoader;
use crate::progress::ChannelProgressSink;
use crate::{
    Coordinator, EngineEvent, FetchError, FetchSettings, HarvestRequest, HttpImageSink, Provider,
    ScrollSettings, StaticPageLoader,
};

/// How results pages are loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageBackend {
    /// Plain HTTP fetch of the server-rendered HTML.
    Static,
    /// A browser behind a WebDriver endpoint; needs the `webdriver` feature.
    WebDriver { endpoint: String, headless: bool },
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub fetch: FetchSettings,
    pub scroll: ScrollSettings,
    pub backend: PageBackend,
    /// Sources in priority order.
    pub providers: Vec<Provider>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fetch: FetchSettings::default(),
            scroll: ScrollSettings::default(),
            backend: PageBackend::Static,
            providers: Provider::ALL.to_vec(),
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("http client setup failed: {0}")]
    Http(#[from] FetchError),
    #[error("async runtime setup failed: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("page backend unavailable: {0}")]
    Backend(String),
    #[error("a harvest is already running")]
    Busy,
}

enum EngineCommand {
    Start {
        request: HarvestRequest,
        cancel: CancellationToken,
    },
}

/// Owns the background thread that runs harvests one at a time.
///
/// Dropping the handle lets the thread exit once its current run finishes.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: Mutex<mpsc::Receiver<EngineEvent>>,
    /// Token of the run queued or in flight; cleared by the engine thread
    /// before it reports completion.
    current: Arc<Mutex<Option<CancellationToken>>>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let coordinator = build_coordinator(&config)?;
        Self::with_coordinator(coordinator).map_err(EngineError::Runtime)
    }

    /// Runs harvests through an already-assembled coordinator.
    pub fn with_coordinator(coordinator: Coordinator) -> Result<Self, std::io::Error> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let current: Arc<Mutex<Option<CancellationToken>>> = Arc::default();
        let engine_current = Arc::clone(&current);
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()?;

        thread::Builder::new()
            .name("harvest-engine".into())
            .spawn(move || {
                while let Ok(command) = cmd_rx.recv() {
                    match command {
                        EngineCommand::Start { request, cancel } => {
                            let sink = ChannelProgressSink::new(event_tx.clone());
                            let result =
                                runtime.block_on(coordinator.harvest(&request, &sink, &cancel));
                            if let Err(err) = &result {
                                engine_error!("Harvest failed: {}", err);
                            }
                            if let Ok(mut slot) = engine_current.lock() {
                                *slot = None;
                            }
                            let _ = event_tx.send(EngineEvent::RunCompleted(result));
                        }
                    }
                }
                engine_info!("Engine thread exiting");
            })?;

        Ok(Self {
            cmd_tx,
            event_rx: Mutex::new(event_rx),
            current,
        })
    }

    /// Starts a run. Only one run may be outstanding; starting another before
    /// the previous one reports completion fails with [`EngineError::Busy`].
    pub fn start(&self, request: HarvestRequest) -> Result<(), EngineError> {
        let cancel = CancellationToken::new();
        {
            let mut current = self
                .current
                .lock()
                .map_err(|_| EngineError::Backend("engine state poisoned".into()))?;
            if current.is_some() {
                return Err(EngineError::Busy);
            }
            *current = Some(cancel.clone());
        }
        if self
            .cmd_tx
            .send(EngineCommand::Start { request, cancel })
            .is_err()
        {
            if let Ok(mut current) = self.current.lock() {
                *current = None;
            }
            return Err(EngineError::Backend("engine thread has exited".into()));
        }
        Ok(())
    }

    /// Signals the current run to stop at its next poll point.
    pub fn stop(&self) {
        if let Ok(current) = self.current.lock() {
            if let Some(cancel) = current.as_ref() {
                engine_info!("Stop requested");
                cancel.cancel();
            }
        }
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.try_recv().ok()
    }

    /// Waits up to `timeout` for the next event. `Disconnected` means the
    /// engine thread is gone, and with it any run in progress.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<EngineEvent, mpsc::RecvTimeoutError> {
        match self.event_rx.lock() {
            Ok(rx) => rx.recv_timeout(timeout),
            Err(_) => Err(mpsc::RecvTimeoutError::Disconnected),
        }
    }
}

fn build_coordinator(config: &EngineConfig) -> Result<Coordinator, EngineError> {
    let sink = Arc::new(HttpImageSink::new(&config.fetch)?);
    let loader = build_loader(config)?;
    Ok(Coordinator::for_providers(
        &config.providers,
        loader,
        sink,
        config.scroll.clone(),
    ))
}

fn build_loader(config: &EngineConfig) -> Result<Arc<dyn PageLoader>, EngineError> {
    match &config.backend {
        PageBackend::Static => Ok(Arc::new(StaticPageLoader::new(&config.fetch)?)),
        #[cfg(feature = "webdriver")]
        PageBackend::WebDriver { endpoint, headless } => Ok(Arc::new(
            crate::webdriver::WebDriverPageLoader::new(endpoint.clone(), *headless),
        )),
        #[cfg(not(feature = "webdriver"))]
        PageBackend::WebDriver { endpoint, .. } => Err(EngineError::Backend(format!(
            "WebDriver endpoint {endpoint} configured but built without the `webdriver` feature"
        ))),
    }
}
