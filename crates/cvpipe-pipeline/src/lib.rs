#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Built-in transforms wrapping the image processing operations.
pub mod builtins;

/// Error types for the pipeline runner.
pub mod error;

/// Pipeline execution: planning and running steps.
pub mod executor;

/// Pipeline definitions and their JSON configuration.
pub mod pipeline;

/// Registry of named transforms.
pub mod registry;

/// Parameter schemas and resolved parameter values.
pub mod schema;

/// Consumers of the pipeline outputs.
pub mod sink;

pub use crate::error::{PipelineError, SinkError, TransformError};
pub use crate::executor::{Executor, PipelineOutputs, SOURCE};
pub use crate::pipeline::{Pipeline, PipelineStep};
pub use crate::registry::{TransformEntry, TransformRegistry};
pub use crate::schema::{ParamKind, ParamSpec, ParamValue, Params, TransformSpec};
pub use crate::sink::{CaptureSink, FileSink, NullSink, ResultSink};

#[cfg(feature = "display")]
pub use crate::sink::DisplaySink;
