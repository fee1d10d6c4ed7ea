//! Harvester engine: multi-source image discovery, download and the
//! background run loop.
mod coordinator;
mod decode;
mod engine;
mod fetch;
mod filename;
mod page;
mod persist;
mod progress;
mod provider;
mod request;
mod scroll;
mod sink;
mod source;
mod static_page;
mod types;
#[cfg(feature = "webdriver")]
mod webdriver;

pub use coordinator::Coordinator;
pub use decode::{decode_image, encode_jpeg, DecodeError};
pub use engine::{EngineConfig, EngineError, EngineHandle, PageBackend};
pub use fetch::{FetchSettings, DEFAULT_MIN_IMAGE_BYTES};
pub use filename::image_filename;
pub use page::{Element, Page, PageError, PageLoader};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use progress::{ChannelProgressSink, NullProgressSink, ProgressSink};
pub use provider::{decode_redirect_link, normalize_scheme_relative, Provider, UnknownProvider};
pub use request::{HarvestError, HarvestRequest};
pub use scroll::{ScrollFetcher, ScrollOutcome, ScrollSettings};
pub use sink::{HttpImageSink, ImageSink, SaveError};
pub use source::{ProviderSource, Source, SourceJob};
pub use static_page::{SnapshotElement, StaticPage, StaticPageLoader};
pub use types::{
    EngineEvent, FailureKind, FetchError, FetchMetadata, FetchOutput, HarvestEvent,
    HarvestProgress, HarvestReport, HarvestStatus, SourceReport,
};
#[cfg(feature = "webdriver")]
pub use webdriver::{WebDriverPage, WebDriverPageLoader};

pub use tokio_util::sync::CancellationToken;
