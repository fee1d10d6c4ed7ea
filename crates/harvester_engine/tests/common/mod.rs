//! In-memory stand-ins for the browser, the image sink and whole sources.
#![allow(dead_code)]

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use harvester_engine::{
    CancellationToken, Element, HarvestEvent, ImageSink, Page, PageError, PageLoader,
    ProgressSink, SnapshotElement, Source, SourceJob,
};

#[derive(Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<HarvestEvent>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<HarvestEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }

    pub fn percents(&self) -> Vec<u8> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|event| match event {
                HarvestEvent::Progress(progress) => Some(progress.percent),
                _ => None,
            })
            .collect()
    }
}

impl ProgressSink for RecordingProgress {
    fn emit(&self, event: HarvestEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Observable side effects of a [`ScriptedPage`].
#[derive(Default, Clone)]
pub struct PageProbe {
    pub closed: Arc<AtomicBool>,
    pub scrolls: Arc<AtomicUsize>,
    pub queries: Arc<AtomicUsize>,
}

impl PageProbe {
    pub fn closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn scrolls(&self) -> usize {
        self.scrolls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

/// A results page whose height follows a script and whose elements all
/// carry one attribute.
pub struct ScriptedPage {
    heights: Mutex<Vec<u64>>,
    attribute: &'static str,
    values: Vec<String>,
    fail_query: bool,
    probe: PageProbe,
}

impl ScriptedPage {
    /// Height is always 100; one element per value.
    pub fn with_values(attribute: &'static str, values: &[&str]) -> Self {
        Self {
            heights: Mutex::new(vec![100]),
            attribute,
            values: values.iter().map(|v| v.to_string()).collect(),
            fail_query: false,
            probe: PageProbe::default(),
        }
    }

    /// Heights returned by successive `scroll_height` calls; the last repeats.
    pub fn heights(mut self, heights: Vec<u64>) -> Self {
        let mut reversed = heights;
        reversed.reverse();
        self.heights = Mutex::new(reversed);
        self
    }

    pub fn failing_query(mut self) -> Self {
        self.fail_query = true;
        self
    }

    pub fn probe(&self) -> PageProbe {
        self.probe.clone()
    }
}

#[async_trait]
impl Page for ScriptedPage {
    async fn scroll_to_bottom(&self) -> Result<(), PageError> {
        self.probe.scrolls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn scroll_height(&self) -> Result<u64, PageError> {
        let mut heights = self.heights.lock().unwrap();
        if heights.len() > 1 {
            Ok(heights.pop().unwrap())
        } else {
            Ok(heights.last().copied().unwrap_or(0))
        }
    }

    async fn find_all(&self, _selector: &str) -> Result<Vec<Box<dyn Element>>, PageError> {
        self.probe.queries.fetch_add(1, Ordering::SeqCst);
        if self.fail_query {
            return Err(PageError::Element("scripted failure".into()));
        }
        Ok(self
            .values
            .iter()
            .map(|value| {
                Box::new(SnapshotElement::new([(
                    self.attribute.to_string(),
                    value.clone(),
                )])) as Box<dyn Element>
            })
            .collect())
    }

    async fn close(self: Box<Self>) -> Result<(), PageError> {
        self.probe.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Hands out one prepared page, or fails every load when it has none.
pub struct OnePageLoader {
    page: Mutex<Option<ScriptedPage>>,
    pub loads: AtomicUsize,
    pub last_url: Mutex<Option<String>>,
}

impl OnePageLoader {
    pub fn new(page: ScriptedPage) -> Self {
        Self {
            page: Mutex::new(Some(page)),
            loads: AtomicUsize::new(0),
            last_url: Mutex::new(None),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            page: Mutex::new(None),
            loads: AtomicUsize::new(0),
            last_url: Mutex::new(None),
        }
    }
}

#[async_trait]
impl PageLoader for OnePageLoader {
    async fn load_page(&self, url: &str) -> Result<Box<dyn Page>, PageError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        *self.last_url.lock().unwrap() = Some(url.to_string());
        match self.page.lock().unwrap().take() {
            Some(page) => Ok(Box::new(page)),
            None => Err(PageError::Load("connection refused".into())),
        }
    }
}

/// Accepts every URL except the ones listed as broken; optionally cancels a
/// token after a number of successful saves.
#[derive(Default)]
pub struct FakeSink {
    broken: HashSet<String>,
    saved: Mutex<Vec<(String, String)>>,
    cancel_after: Option<(usize, CancellationToken)>,
    panics: bool,
}

impl FakeSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn broken(mut self, urls: &[&str]) -> Self {
        self.broken = urls.iter().map(|u| u.to_string()).collect();
        self
    }

    pub fn cancel_after(mut self, saves: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((saves, token));
        self
    }

    pub fn panicking(mut self) -> Self {
        self.panics = true;
        self
    }

    /// `(url, filename)` pairs in save order.
    pub fn saved(&self) -> Vec<(String, String)> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageSink for FakeSink {
    async fn save(&self, url: &str, _destination: &Path, filename: &str) -> bool {
        if self.panics {
            panic!("sink exploded on {url}");
        }
        if self.broken.contains(url) {
            return false;
        }
        let mut saved = self.saved.lock().unwrap();
        saved.push((url.to_string(), filename.to_string()));
        if let Some((after, token)) = &self.cancel_after {
            if saved.len() == *after {
                token.cancel();
            }
        }
        true
    }
}

/// A whole source that can supply a fixed number of images.
pub struct FakeSource {
    tag: String,
    available: usize,
    calls: Arc<AtomicUsize>,
    limits: Arc<Mutex<Vec<usize>>>,
    panics: bool,
    overreports: bool,
    cancel_after: Option<(usize, CancellationToken)>,
}

impl FakeSource {
    pub fn new(tag: &str, available: usize) -> Self {
        Self {
            tag: tag.to_string(),
            available,
            calls: Arc::new(AtomicUsize::new(0)),
            limits: Arc::new(Mutex::new(Vec::new())),
            panics: false,
            overreports: false,
            cancel_after: None,
        }
    }

    pub fn panicking(mut self) -> Self {
        self.panics = true;
        self
    }

    /// Returns `available` regardless of the limit it was given.
    pub fn overreporting(mut self) -> Self {
        self.overreports = true;
        self
    }

    pub fn cancel_after(mut self, saves: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((saves, token));
        self
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }

    pub fn limits(&self) -> Arc<Mutex<Vec<usize>>> {
        self.limits.clone()
    }
}

#[async_trait]
impl Source for FakeSource {
    fn tag(&self) -> &str {
        &self.tag
    }

    async fn harvest(
        &self,
        job: &SourceJob<'_>,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> usize {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.limits.lock().unwrap().push(job.limit);
        if self.panics {
            panic!("{} exploded", self.tag);
        }
        if self.overreports {
            return self.available;
        }
        let mut saved = 0;
        while saved < self.available.min(job.limit) {
            if cancel.is_cancelled() {
                break;
            }
            saved += 1;
            progress.emit(HarvestEvent::ImageSaved {
                source: self.tag.clone(),
                index: saved,
                path: job.destination.join(format!("{}_{saved}.jpg", self.tag)),
            });
            if let Some((after, token)) = &self.cancel_after {
                if saved == *after {
                    token.cancel();
                }
            }
        }
        saved
    }
}
