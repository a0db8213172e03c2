pub mod browser_setup;
pub mod capture;
pub mod config;
pub mod cookies;
pub mod extension;
pub mod link_resolver;
pub mod pipeline;
pub mod profile;
pub mod report;
pub mod runner;
pub mod scroller;
pub mod snapshot_writer;
pub mod stability;
pub mod utils;

pub use browser_setup::{
    download_managed_browser, find_browser_executable, launch_browser_with_extension,
};
pub use capture::{BridgeError, CaptureOptions, CaptureResult};
pub use config::SnapConfig;
pub use cookies::{CookiePair, CredentialError, parse_cookie_header, read_cookie_header};
pub use extension::{ControllerExtension, SetupError, build_controller_extension};
pub use pipeline::{
    CapturePipeline, ChromiumSurfaceProvider, PendingSet, RunSummary, SectionOutcome,
    SectionRecord, SectionSurface, SectionTask, SectionTarget, SurfaceError, SurfaceProvider,
};
pub use report::ReportAssembler;
pub use runner::{RunReport, snapshot_profile};
pub use scroller::{DrainSink, IncrementalScroller};
pub use snapshot_writer::SnapshotWriter;
pub use stability::StabilityProbe;
