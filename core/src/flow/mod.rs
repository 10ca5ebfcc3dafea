// core/src/flow/mod.rs

//! A small step-pipeline engine: named steps with before/on/after async
//! handlers over a shared `ContextData<T>`, plus a registry keyed by the
//! context type.

pub mod context_data;
pub mod control;
pub mod execution;
pub mod pipeline;
pub mod registry;
pub mod step;

pub use context_data::ContextData;
pub use control::{PipelineControl, PipelineResult};
pub use pipeline::{Handler, Pipeline};
pub use registry::FlowRegistry;
pub use step::{SkipCondition, StepDef};
