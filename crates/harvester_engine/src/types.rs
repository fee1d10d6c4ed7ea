use std::fmt;
use std::path::PathBuf;

use crate::HarvestError;

/// One notification from a running harvest, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarvestEvent {
    SourceStarted {
        source: String,
        limit: usize,
    },
    ImageSaved {
        source: String,
        /// 1-based count of images this source has saved so far.
        index: usize,
        path: PathBuf,
    },
    CandidateSkipped {
        source: String,
        url: String,
    },
    SourceFinished {
        source: String,
        saved: usize,
    },
    /// Overall run progress; `percent` never decreases within a run.
    Progress(HarvestProgress),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarvestProgress {
    pub percent: u8,
    pub downloaded: usize,
    pub requested: usize,
}

impl HarvestProgress {
    pub fn new(downloaded: usize, requested: usize) -> Self {
        let downloaded = downloaded.min(requested);
        let percent = if requested == 0 {
            100
        } else {
            (downloaded * 100 / requested) as u8
        };
        Self {
            percent,
            downloaded,
            requested,
        }
    }

    pub fn finished(downloaded: usize, requested: usize) -> Self {
        Self {
            percent: 100,
            ..Self::new(downloaded, requested)
        }
    }
}

/// Events sent from the background engine thread to its owner.
#[derive(Debug)]
pub enum EngineEvent {
    Harvest(HarvestEvent),
    RunCompleted(Result<HarvestReport, HarvestError>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarvestStatus {
    Complete,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub source: String,
    pub limit: usize,
    pub saved: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestReport {
    pub requested: usize,
    pub downloaded: usize,
    pub status: HarvestStatus,
    /// Sources that were actually invoked, in invocation order.
    pub sources: Vec<SourceReport>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutput {
    pub bytes: Vec<u8>,
    pub metadata: FetchMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchMetadata {
    pub original_url: String,
    pub final_url: String,
    pub content_type: Option<String>,
    pub declared_len: Option<u64>,
    pub byte_len: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooSmall { min_bytes: u64, declared: Option<u64> },
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooSmall { min_bytes, declared } => {
                write!(f, "response too small (min {min_bytes}, declared {declared:?})")
            }
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
