use std::path::PathBuf;

use clap::Parser;

/// Download images for a subject from Yandex, Google and Bing image search.
#[derive(Debug, Parser)]
#[command(name = "image_harvester", version, about)]
pub struct Cli {
    /// Subject to search for.
    pub query: String,

    /// How many images to save across all sources.
    #[arg(short = 'n', long, allow_hyphen_values = true)]
    pub count: String,

    /// Directory to save into. Prompted for when neither this nor the
    /// config's `default_output_dir` is set.
    #[arg(short, long, env = "HARVESTER_OUTPUT")]
    pub output: Option<PathBuf>,

    /// RON config file (default: ./harvester.ron).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log at debug level.
    #[arg(short, long)]
    pub verbose: bool,
}
