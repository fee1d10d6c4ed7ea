use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use engine_logging::{engine_debug, engine_info, engine_warn};
use futures_util::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::filename::image_filename;
use crate::page::{Page, PageLoader};
use crate::{HarvestEvent, ImageSink, ProgressSink, Provider, ScrollFetcher, ScrollSettings};

/// One source invocation: find up to `limit` images for `query`.
#[derive(Debug, Clone, Copy)]
pub struct SourceJob<'a> {
    pub query: &'a str,
    pub limit: usize,
    pub destination: &'a Path,
}

/// A provider-specific way of turning a query into saved images.
#[async_trait]
pub trait Source: Send + Sync {
    fn tag(&self) -> &str;

    /// Returns how many images were saved, never more than `job.limit`.
    /// Per-item and per-page failures are absorbed here.
    async fn harvest(
        &self,
        job: &SourceJob<'_>,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> usize;
}

/// Drives one search provider's results page through a [`PageLoader`] and
/// saves what it finds through an [`ImageSink`].
pub struct ProviderSource {
    provider: Provider,
    loader: Arc<dyn PageLoader>,
    sink: Arc<dyn ImageSink>,
    fetcher: ScrollFetcher,
}

impl ProviderSource {
    pub fn new(
        provider: Provider,
        loader: Arc<dyn PageLoader>,
        sink: Arc<dyn ImageSink>,
        scroll: ScrollSettings,
    ) -> Self {
        Self {
            provider,
            loader,
            sink,
            fetcher: ScrollFetcher::new(scroll),
        }
    }

    async fn harvest_page(
        &self,
        page: &dyn Page,
        job: &SourceJob<'_>,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> usize {
        let tag = self.provider.tag();
        let elements = match self
            .fetcher
            .discover(page, self.provider.selector(), cancel)
            .await
        {
            Ok(elements) => elements,
            Err(err) => {
                engine_warn!("{}: results unavailable: {}", tag, err);
                return 0;
            }
        };
        engine_info!("{}: {} candidate elements", tag, elements.len());

        let mut saved = 0;
        for element in elements {
            if cancel.is_cancelled() || saved >= job.limit {
                break;
            }
            let raw = match element.attribute(self.provider.link_attribute()).await {
                Ok(Some(raw)) => raw,
                Ok(None) => continue,
                Err(err) => {
                    engine_debug!("{}: unreadable element: {}", tag, err);
                    continue;
                }
            };
            let Some(url) = self.provider.extract_image_url(&raw) else {
                engine_debug!("{}: ignoring non-image link {}", tag, raw);
                continue;
            };

            let filename = image_filename(tag, saved + 1);
            if self.sink.save(&url, job.destination, &filename).await {
                saved += 1;
                progress.emit(HarvestEvent::ImageSaved {
                    source: tag.to_string(),
                    index: saved,
                    path: job.destination.join(&filename),
                });
            } else {
                progress.emit(HarvestEvent::CandidateSkipped {
                    source: tag.to_string(),
                    url,
                });
            }
        }
        saved
    }
}

#[async_trait]
impl Source for ProviderSource {
    fn tag(&self) -> &str {
        self.provider.tag()
    }

    async fn harvest(
        &self,
        job: &SourceJob<'_>,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> usize {
        let tag = self.provider.tag();
        if cancel.is_cancelled() || job.limit == 0 {
            return 0;
        }
        let url = match self.provider.search_url(job.query) {
            Ok(url) => url,
            Err(err) => {
                engine_warn!("{}: cannot build search url: {}", tag, err);
                return 0;
            }
        };

        let page = match self.loader.load_page(url.as_str()).await {
            Ok(page) => page,
            Err(err) => {
                engine_warn!("{}: source unavailable: {}", tag, err);
                return 0;
            }
        };

        let outcome = AssertUnwindSafe(self.harvest_page(&*page, job, progress, cancel))
            .catch_unwind()
            .await;

        // The page may hold a remote browser session; release it before
        // letting a panic continue.
        if let Err(err) = page.close().await {
            engine_warn!("{}: failed to close page: {}", tag, err);
        }
        match outcome {
            Ok(saved) => saved,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}
