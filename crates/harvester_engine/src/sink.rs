use std::path::{Path, PathBuf};

use async_trait::async_trait;
use engine_logging::{engine_debug, engine_warn};

use crate::decode::{decode_image, encode_jpeg};
use crate::fetch::{build_client, fetch_bytes, BodyLimits};
use crate::{AtomicFileWriter, DecodeError, FetchError, FetchSettings, PersistError};

/// Downloads one candidate and stores it as an image file.
#[async_trait]
pub trait ImageSink: Send + Sync {
    /// Returns `true` only when the image was decoded and written to
    /// `destination/filename`. Failures are absorbed; nothing is written then.
    async fn save(&self, url: &str, destination: &Path, filename: &str) -> bool;
}

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

pub struct HttpImageSink {
    client: reqwest::Client,
    limits: BodyLimits,
}

impl HttpImageSink {
    pub fn new(settings: &FetchSettings) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_client(settings)?,
            limits: BodyLimits {
                min_declared: Some(settings.min_image_bytes),
                max_bytes: settings.max_bytes,
            },
        })
    }

    /// Like [`ImageSink::save`] but keeps the reason for a failure.
    pub async fn try_save(
        &self,
        url: &str,
        destination: &Path,
        filename: &str,
    ) -> Result<PathBuf, SaveError> {
        let output = fetch_bytes(&self.client, url, self.limits).await?;
        let image = decode_image(&output.bytes)?;
        let jpeg = encode_jpeg(&image)?;
        let path = AtomicFileWriter::new(destination.to_path_buf()).write(filename, &jpeg)?;
        Ok(path)
    }
}

#[async_trait]
impl ImageSink for HttpImageSink {
    async fn save(&self, url: &str, destination: &Path, filename: &str) -> bool {
        match self.try_save(url, destination, filename).await {
            Ok(path) => {
                engine_debug!("Saved {} to {:?}", url, path);
                true
            }
            Err(err) => {
                engine_warn!("Skipping {}: {}", url, err);
                false
            }
        }
    }
}
