pub mod cli;
pub mod error;
pub mod extract;
pub mod http;
pub mod models;
pub mod reporter;
pub mod scanner;
pub mod tree;

pub use error::{Error, Result};
pub use extract::LinkExtractor;
pub use http::{GatewayResponse, HttpGateway, RequestGateway};
pub use models::{
    BruteConfig, CrawlConfig, FilterConfig, Observation, ProbeResult, ScanConfig, ScanMetrics,
    Severity,
};
pub use reporter::{ConsoleReporter, HtmlExporter, JsonExporter, TextExporter};
pub use scanner::{BruteForcer, Crawler, JobStore, ScanControl};
pub use tree::{SiteTree, SnapshotStore, TreeService, TreeSnapshot};
