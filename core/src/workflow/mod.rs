// voyage/src/workflow/mod.rs

//! A small async step engine: ordered, named steps whose handlers share a
//! lockable [`ContextData`]. Checkout and notification dispatch are built on it.

pub mod context_data;
pub mod control;
pub mod execution;
pub mod pipeline;
pub mod step;

pub use context_data::ContextData;
pub use control::{PipelineControl, PipelineResult};
pub use pipeline::{Handler, Pipeline};
pub use step::{SkipCondition, StepDef};
