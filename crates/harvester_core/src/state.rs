use std::path::{Path, PathBuf};

use crate::view_model::AppViewModel;

pub(crate) const STATUS_RUNNING: &str = "Scraping images...";
pub(crate) const STATUS_STOPPING: &str = "Stopping scraping...";
pub(crate) const STATUS_COMPLETE: &str = "Scraping complete.";
pub(crate) const STATUS_STOPPED: &str = "Scraping stopped.";
pub(crate) const STATUS_FAILED: &str = "Scraping failed.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunStatus {
    #[default]
    Idle,
    Running,
    Stopping,
    Complete,
    Stopped,
    Failed,
}

impl RunStatus {
    /// A run is in flight and owns the engine.
    pub fn is_active(self) -> bool {
        matches!(self, RunStatus::Running | RunStatus::Stopping)
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunStatus::Complete | RunStatus::Stopped | RunStatus::Failed
        )
    }
}

/// How the engine says a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishStatus {
    Complete,
    Stopped,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub status: FinishStatus,
    pub downloaded: usize,
    pub error: Option<String>,
}

/// Bookkeeping for the run in flight (or the last one).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunState {
    pub requested: usize,
    pub downloaded: usize,
    pub cancelled: bool,
}

/// Message shown to the user until dismissed or replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    query_input: String,
    count_input: String,
    destination: Option<PathBuf>,
    awaiting_destination: bool,
    status: RunStatus,
    status_line: String,
    run: Option<RunState>,
    progress: u8,
    notice: Option<Notice>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        let run = self.run.clone().unwrap_or_default();
        AppViewModel {
            status: self.status,
            status_line: self.status_line.clone(),
            progress: self.progress,
            downloaded: run.downloaded,
            requested: run.requested,
            awaiting_destination: self.awaiting_destination,
            notice: self.notice.clone(),
            can_start: !self.status.is_active() && !self.awaiting_destination,
            can_stop: self.status == RunStatus::Running,
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn run(&self) -> Option<&RunState> {
        self.run.as_ref()
    }

    pub(crate) fn query_input(&self) -> &str {
        &self.query_input
    }

    pub(crate) fn count_input(&self) -> &str {
        &self.count_input
    }

    pub(crate) fn destination(&self) -> Option<&Path> {
        self.destination.as_deref()
    }

    pub(crate) fn awaiting_destination(&self) -> bool {
        self.awaiting_destination
    }

    pub(crate) fn set_query(&mut self, query: String) {
        self.query_input = query;
        self.mark_dirty();
    }

    pub(crate) fn set_count(&mut self, count: String) {
        self.count_input = count;
        self.mark_dirty();
    }

    pub(crate) fn set_destination(&mut self, destination: Option<PathBuf>) {
        self.destination = destination;
        self.mark_dirty();
    }

    pub(crate) fn set_awaiting_destination(&mut self, awaiting: bool) {
        self.awaiting_destination = awaiting;
        self.mark_dirty();
    }

    pub(crate) fn set_notice(&mut self, notice: Option<Notice>) {
        self.notice = notice;
        self.mark_dirty();
    }

    pub(crate) fn start_run(&mut self, requested: usize) {
        self.status = RunStatus::Running;
        self.status_line = STATUS_RUNNING.to_string();
        self.progress = 0;
        self.notice = None;
        self.run = Some(RunState {
            requested,
            downloaded: 0,
            cancelled: false,
        });
        self.mark_dirty();
    }

    pub(crate) fn request_stop(&mut self) {
        self.status = RunStatus::Stopping;
        self.status_line = STATUS_STOPPING.to_string();
        if let Some(run) = self.run.as_mut() {
            run.cancelled = true;
        }
        self.mark_dirty();
    }

    pub(crate) fn apply_progress(&mut self, percent: u8, downloaded: usize) {
        let percent = percent.min(100);
        let Some(run) = self.run.as_mut() else {
            return;
        };
        run.downloaded = downloaded.min(run.requested);
        if percent != self.progress {
            self.progress = percent;
        }
        self.mark_dirty();
    }

    pub(crate) fn finish_run(&mut self, outcome: RunOutcome) {
        if let Some(run) = self.run.as_mut() {
            run.downloaded = outcome.downloaded.min(run.requested);
        }
        match outcome.status {
            FinishStatus::Complete => {
                self.status = RunStatus::Complete;
                self.status_line = STATUS_COMPLETE.to_string();
                self.notice = Some(Notice::Info(format!(
                    "{} images downloaded successfully!",
                    outcome.downloaded
                )));
            }
            FinishStatus::Stopped => {
                self.status = RunStatus::Stopped;
                self.status_line = STATUS_STOPPED.to_string();
            }
            FinishStatus::Failed => {
                self.status = RunStatus::Failed;
                self.status_line = STATUS_FAILED.to_string();
                let detail = outcome.error.unwrap_or_else(|| "unknown error".to_string());
                self.notice = Some(Notice::Error(format!("An error occurred: {detail}")));
            }
        }
        self.mark_dirty();
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}
