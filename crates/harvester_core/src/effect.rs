use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Ask the user where images should go; answer with `Msg::DestinationChosen`.
    PromptDestination,
    StartHarvest {
        query: String,
        target_count: usize,
        destination: PathBuf,
    },
    StopHarvest,
}
