mod builder;
mod channel;
mod snapshot;

pub use builder::{NodeRecord, PLACEHOLDER_IP, SiteTree, TreeOp};
pub use channel::{SnapshotStore, TreeService, UpdateReport};
pub use snapshot::{HIDDEN_ROOT_PATH, SnapshotNode, TreeSnapshot};
