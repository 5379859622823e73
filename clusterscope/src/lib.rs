// Library interface for clusterscope modules
// This allows tests and other binaries to import modules

pub mod error;
pub mod ingestion;
pub mod vectorize;
pub mod clustering;
pub mod pipeline;
pub mod presenter;
pub mod server;

pub use error::PipelineError;
pub use pipeline::{ClusteredGroups, Outcome, Pipeline};
