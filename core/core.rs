pub mod archive;
pub mod block_locator;
pub mod config;
pub mod detector;
pub mod document;
pub mod download;
pub mod error;
pub mod mime;
pub mod output_formats;
pub mod path_extractor;
pub mod scheduler;
pub mod selection;
pub mod text_cleaner;

pub use archive::{ArchiveBuilder, Artifact, normalize_entry_path};
pub use config::{
    ArchiveConfig, CollisionPolicy, CompressionSetting, Config, DetectConfig, OutputConfig,
    SaveConfig, WatchConfig,
};
pub use detector::{
    DetectionReport, FileRecord, FileSummary, HeadingOutcome, RejectReason, SourceAnchor, detect,
    detect_with_report,
};
pub use document::Document;
pub use download::{DirectorySink, DownloadId, DownloadSink, deliver};
pub use error::{AppError, Result};
pub use output_formats::{OutputFormat, ScanListing};
pub use scheduler::{Reconciliation, RescanScheduler, RescanState, Trigger, reconcile};
pub use selection::Selection;
