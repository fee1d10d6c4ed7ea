use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User edited the subject input.
    QueryChanged(String),
    /// User edited the image count input (raw text, validated on start).
    CountChanged(String),
    /// Destination picked by the user; `None` if the prompt was dismissed.
    DestinationChosen(Option<PathBuf>),
    /// User clicked Start.
    StartClicked,
    /// User clicked Stop.
    StopClicked,
    /// Engine progress for the running harvest.
    Progress { percent: u8, downloaded: usize },
    /// Engine reached a terminal state.
    RunFinished(crate::RunOutcome),
    /// Nothing to do; an interrupt with no run or prompt to cancel.
    NoOp,
}
