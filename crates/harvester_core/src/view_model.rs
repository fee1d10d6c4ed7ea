use crate::{Notice, RunStatus};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub status: RunStatus,
    pub status_line: String,
    /// 0..=100, for the progress bar.
    pub progress: u8,
    pub downloaded: usize,
    pub requested: usize,
    pub awaiting_destination: bool,
    pub notice: Option<Notice>,
    pub can_start: bool,
    pub can_stop: bool,
    pub dirty: bool,
}
