use std::panic::AssertUnwindSafe;
use std::sync::atomic::AtomicU8;
use std::sync::Arc;

use engine_logging::{engine_error, engine_info, engine_warn};
use futures_util::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::page::PageLoader;
use crate::progress::RunProgress;
use crate::{
    ensure_output_dir, HarvestError, HarvestEvent, HarvestProgress, HarvestReport, HarvestRequest,
    HarvestStatus, ImageSink, ProgressSink, Provider, ProviderSource, ScrollSettings, Source,
    SourceJob, SourceReport,
};

/// Runs sources one after another against a shared quota.
pub struct Coordinator {
    sources: Vec<Box<dyn Source>>,
}

impl Coordinator {
    /// `sources` are drained in the given order.
    pub fn new(sources: Vec<Box<dyn Source>>) -> Self {
        Self { sources }
    }

    /// One [`ProviderSource`] per provider, sharing a page loader and sink.
    pub fn for_providers(
        providers: &[Provider],
        loader: Arc<dyn PageLoader>,
        sink: Arc<dyn ImageSink>,
        scroll: ScrollSettings,
    ) -> Self {
        let sources = providers
            .iter()
            .map(|provider| {
                Box::new(ProviderSource::new(
                    *provider,
                    loader.clone(),
                    sink.clone(),
                    scroll.clone(),
                )) as Box<dyn Source>
            })
            .collect();
        Self::new(sources)
    }

    pub fn source_tags(&self) -> Vec<&str> {
        self.sources.iter().map(|source| source.tag()).collect()
    }

    /// Harvests until the quota is met, the sources run out, or `cancel`
    /// fires. Only a missing destination fails the run; a run where every
    /// source came back empty is `Complete` with zero images.
    pub async fn harvest(
        &self,
        request: &HarvestRequest,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<HarvestReport, HarvestError> {
        ensure_output_dir(request.destination())?;

        let requested = request.target_count();
        engine_info!(
            "Harvest started: query={:?} requested={} destination={:?}",
            request.query(),
            requested,
            request.destination()
        );

        let mut downloaded = 0;
        let high_water = AtomicU8::new(0);
        let mut reports = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            if cancel.is_cancelled() {
                engine_info!("Harvest cancelled before {}", source.tag());
                break;
            }
            let remaining = requested.saturating_sub(downloaded);
            if remaining == 0 {
                break;
            }

            let tag = source.tag().to_string();
            progress.emit(HarvestEvent::SourceStarted {
                source: tag.clone(),
                limit: remaining,
            });
            let job = SourceJob {
                query: request.query(),
                limit: remaining,
                destination: request.destination(),
            };
            let run_progress = RunProgress::new(progress, downloaded, requested, &high_water);
            let outcome = AssertUnwindSafe(source.harvest(&job, &run_progress, cancel))
                .catch_unwind()
                .await;

            let saved = match outcome {
                Ok(count) if count > remaining => {
                    engine_warn!(
                        "{} reported {} images for a limit of {}; counting {}",
                        tag,
                        count,
                        remaining,
                        remaining
                    );
                    remaining
                }
                Ok(count) => count,
                Err(_) => {
                    engine_error!("{} failed unexpectedly; treating it as unavailable", tag);
                    0
                }
            };
            downloaded += saved;
            engine_info!("{} saved {} of {} requested", tag, saved, remaining);
            progress.emit(HarvestEvent::SourceFinished {
                source: tag.clone(),
                saved,
            });
            reports.push(SourceReport {
                source: tag,
                limit: remaining,
                saved,
            });
        }

        let status = if cancel.is_cancelled() {
            HarvestStatus::Stopped
        } else {
            HarvestStatus::Complete
        };
        progress.emit(HarvestEvent::Progress(HarvestProgress::finished(
            downloaded, requested,
        )));
        engine_info!(
            "Harvest finished: {:?}, {} of {} images",
            status,
            downloaded,
            requested
        );

        Ok(HarvestReport {
            requested,
            downloaded,
            status,
            sources: reports,
        })
    }
}
