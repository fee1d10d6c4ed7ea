//! `harvester.ron` loading and its mapping onto the engine configuration.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use engine_logging::{engine_debug, engine_info};
use harvester_engine::{
    EngineConfig, FetchSettings, PageBackend, Provider, ScrollSettings, UnknownProvider,
};
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "./harvester.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
    #[error(transparent)]
    UnknownSource(#[from] UnknownProvider),
    #[error("no sources configured")]
    NoSources,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub enum BackendConfig {
    Static,
    WebDriver(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HarvesterConfig {
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub redirect_limit: usize,
    pub min_bytes: u64,
    pub max_bytes: u64,
    pub settle_ms: u64,
    pub scroll_pause_ms: u64,
    pub max_scrolls: usize,
    pub backend: BackendConfig,
    /// Only read for the WebDriver backend.
    pub headless: bool,
    pub sources: Vec<String>,
    pub default_output_dir: Option<PathBuf>,
    pub log_to_file: bool,
}

impl Default for HarvesterConfig {
    fn default() -> Self {
        let fetch = FetchSettings::default();
        let scroll = ScrollSettings::default();
        Self {
            connect_timeout_ms: millis(fetch.connect_timeout),
            request_timeout_ms: millis(fetch.request_timeout),
            redirect_limit: fetch.redirect_limit,
            min_bytes: fetch.min_image_bytes,
            max_bytes: fetch.max_bytes,
            settle_ms: millis(scroll.settle),
            scroll_pause_ms: millis(scroll.pause),
            max_scrolls: scroll.max_scrolls,
            backend: BackendConfig::Static,
            headless: true,
            sources: Provider::ALL.iter().map(|p| p.tag().to_string()).collect(),
            default_output_dir: None,
            log_to_file: false,
        }
    }
}

impl HarvesterConfig {
    /// Loads `path`. A missing file at the default location yields the
    /// defaults; a missing file the user named explicitly is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound && !explicit => {
                engine_debug!("No config at {:?}; using defaults", path);
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::Read { path, source }),
        };
        let config = Self::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        engine_info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(text)
    }

    pub fn providers(&self) -> Result<Vec<Provider>, ConfigError> {
        let providers = self
            .sources
            .iter()
            .map(|name| name.parse::<Provider>())
            .collect::<Result<Vec<_>, _>>()?;
        if providers.is_empty() {
            return Err(ConfigError::NoSources);
        }
        Ok(providers)
    }

    pub fn engine_config(&self) -> Result<EngineConfig, ConfigError> {
        let fetch = FetchSettings {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            redirect_limit: self.redirect_limit,
            min_image_bytes: self.min_bytes,
            max_bytes: self.max_bytes,
            ..FetchSettings::default()
        };
        let scroll = ScrollSettings {
            settle: Duration::from_millis(self.settle_ms),
            pause: Duration::from_millis(self.scroll_pause_ms),
            max_scrolls: self.max_scrolls,
        };
        let backend = match &self.backend {
            BackendConfig::Static => PageBackend::Static,
            BackendConfig::WebDriver(endpoint) => PageBackend::WebDriver {
                endpoint: endpoint.clone(),
                headless: self.headless,
            },
        };
        Ok(EngineConfig {
            fetch,
            scroll,
            backend,
            providers: self.providers()?,
        })
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
