mod config;
mod observation;
mod probe;
mod severity;

pub use config::{BruteConfig, CrawlConfig, FilterConfig, ScanConfig};
pub use observation::{Observation, parent_path};
pub use probe::{ProbeResult, ScanMetrics};
pub use severity::Severity;
