// Listing pipeline: paginate each source, normalize, optionally classify, write CSV

pub mod classify;
pub mod driver;
pub mod normalize;
pub mod paginator;
pub mod sink;

pub use classify::{BatchClassifier, ClassificationReport};
pub use driver::{Pipeline, PipelineResult, SourceRun, SourceSummary};
pub use normalize::normalize;
pub use paginator::{collect, Collection, StopReason};
pub use sink::write_csv;
