//! Recursive onion crawl: session queue, report archive, discovery feedback
//! and the scan loop that ties them to the probe and the identity gate.

pub mod archive;
pub mod context;
pub mod discovery;
mod run;

pub use archive::ReportArchive;
pub use context::RunContext;
pub use discovery::DiscoverySummary;
pub use run::{CrawlError, Crawler, RunSummary};
