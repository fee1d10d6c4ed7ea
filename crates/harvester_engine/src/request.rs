use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::PersistError;

#[derive(Debug, Error)]
pub enum HarvestError {
    /// Rejected before any network activity.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("destination unavailable: {0}")]
    Destination(#[from] PersistError),
}

/// What one harvest run is asked to do. Fields are fixed once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestRequest {
    query: String,
    target_count: usize,
    destination: PathBuf,
}

impl HarvestRequest {
    /// Validates the inputs; the query is trimmed.
    pub fn new(
        query: impl Into<String>,
        target_count: i64,
        destination: impl Into<PathBuf>,
    ) -> Result<Self, HarvestError> {
        let query = query.into().trim().to_string();
        if query.is_empty() {
            return Err(HarvestError::InvalidRequest("search query is empty".into()));
        }
        if target_count <= 0 {
            return Err(HarvestError::InvalidRequest(format!(
                "target count must be positive, got {target_count}"
            )));
        }
        let target_count = usize::try_from(target_count).map_err(|_| {
            HarvestError::InvalidRequest(format!("target count {target_count} is too large"))
        })?;
        Ok(Self {
            query,
            target_count,
            destination: destination.into(),
        })
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn target_count(&self) -> usize {
        self.target_count
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }
}
