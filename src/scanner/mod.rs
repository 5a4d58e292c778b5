mod brute;
mod classifier;
mod control;
mod crawler;
mod jobs;

pub use brute::{BruteForcer, ResultCallback};
pub use classifier::ResultClassifier;
pub use control::{ControlGate, ControlState, ScanControl, ScanState};
pub use crawler::Crawler;
pub use jobs::{JobEntry, JobStore};
