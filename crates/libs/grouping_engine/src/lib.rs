#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

mod deletion_filter;
mod error;
mod group_engine;
mod image_probe;
mod manual_ops;
mod match_resolver;
mod merge;
mod reconcile;
mod service;
#[cfg(test)]
mod test_support;

pub use deletion_filter::filter_tombstoned;
pub use error::GroupingError;
pub use group_engine::{GroupEngine, ProcessBatchResult};
pub use image_probe::{HttpImageProbe, ImageProbe};
pub use manual_ops::ManualOps;
pub use match_resolver::{MatchResolver, RecognitionClient};
pub use merge::{merge_all, merge_groups, pick_primary};
pub use reconcile::reconcile_dangling_groups;
pub use service::GroupingService;
