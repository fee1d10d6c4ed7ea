use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::mpsc;

use crate::{EngineEvent, HarvestEvent, HarvestProgress};

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: HarvestEvent);
}

/// Forwards events to the thread that owns the engine handle.
pub struct ChannelProgressSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: HarvestEvent) {
        let _ = self.tx.send(EngineEvent::Harvest(event));
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn emit(&self, _event: HarvestEvent) {}
}

/// Wraps the caller's sink for one source invocation and turns the source's
/// local save count into overall run progress.
///
/// `high_water` is shared by every source of a run; a percentage below it is
/// never forwarded.
pub(crate) struct RunProgress<'a> {
    inner: &'a dyn ProgressSink,
    downloaded_before: usize,
    requested: usize,
    high_water: &'a AtomicU8,
}

impl<'a> RunProgress<'a> {
    pub(crate) fn new(
        inner: &'a dyn ProgressSink,
        downloaded_before: usize,
        requested: usize,
        high_water: &'a AtomicU8,
    ) -> Self {
        Self {
            inner,
            downloaded_before,
            requested,
            high_water,
        }
    }
}

impl ProgressSink for RunProgress<'_> {
    fn emit(&self, event: HarvestEvent) {
        let saved_in_source = match &event {
            HarvestEvent::ImageSaved { index, .. } => Some(*index),
            _ => None,
        };
        self.inner.emit(event);
        if let Some(index) = saved_in_source {
            let progress = HarvestProgress::new(self.downloaded_before + index, self.requested);
            let previous = self.high_water.fetch_max(progress.percent, Ordering::Relaxed);
            if previous <= progress.percent {
                self.inner.emit(HarvestEvent::Progress(progress));
            }
        }
    }
}
