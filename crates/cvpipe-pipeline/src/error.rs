use cvpipe_image::ImageError;
use cvpipe_io::IoError;

/// An error raised by a transform while processing its inputs.
#[derive(thiserror::Error, Debug)]
pub enum TransformError {
    /// The underlying image operation failed.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// The transform does not accept this kind of image.
    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),

    /// The parameters are valid one by one but not together.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The input is smaller than the transform requires.
    #[error("Image of size {0}x{1} is smaller than the minimum {2}x{3}")]
    ImageTooSmall(usize, usize, usize, usize),
}

/// An error raised by a result sink.
#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    /// Failed to encode or write an image file.
    #[error(transparent)]
    Io(#[from] IoError),

    /// Failed to create the output directory.
    #[error("Cannot prepare the output directory: {0}")]
    File(#[from] std::io::Error),

    /// Two results map onto the same file.
    #[error("Result `{name}` would overwrite {}", .path.display())]
    NameCollision {
        /// The name of the later result.
        name: String,
        /// The file already written for an earlier result.
        path: std::path::PathBuf,
    },

    /// The display surface could not be used.
    #[error("Display unavailable: {0}")]
    DisplayUnavailable(String),
}

fn at_step(step: &Option<usize>) -> String {
    match step {
        Some(index) => format!(" in step {index}"),
        None => String::new(),
    }
}

/// An error that aborts a pipeline run.
///
/// Every variant is fatal: no output of a failed run reaches a sink.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    /// The transform name is not registered.
    #[error("Unknown transform `{name}`{}", at_step(.step))]
    UnknownTransform {
        /// The requested name.
        name: String,
        /// The step referring to it, if any.
        step: Option<usize>,
    },

    /// A transform with the same name is already registered.
    #[error("Transform `{0}` is already registered")]
    DuplicateTransform(String),

    /// A parameter is unknown, of the wrong type or out of range.
    #[error("Invalid parameter `{param}` of `{transform}` in step {step}: {reason}")]
    InvalidParameter {
        /// The index of the step.
        step: usize,
        /// The transform of the step.
        transform: String,
        /// The parameter name.
        param: String,
        /// What is wrong with the value.
        reason: String,
    },

    /// The step does not bind the number of inputs the transform takes.
    #[error("Transform `{transform}` in step {step} takes {min} to {max} inputs, got {got}")]
    InvalidInputCount {
        /// The index of the step.
        step: usize,
        /// The transform of the step.
        transform: String,
        /// The minimum number of inputs.
        min: usize,
        /// The maximum number of inputs.
        max: usize,
        /// The number of inputs bound by the step.
        got: usize,
    },

    /// An input name is neither the source nor the output of an earlier step.
    #[error("Input `{input}` of step {step} is not produced by an earlier step")]
    MissingInput {
        /// The index of the step.
        step: usize,
        /// The unresolved input name.
        input: String,
    },

    /// An output name is already used.
    #[error("Output `{output}` of step {step} is already taken")]
    DuplicateOutput {
        /// The index of the step.
        step: usize,
        /// The output name.
        output: String,
    },

    /// A transform failed while running.
    #[error("Step {step} (`{transform}` -> `{output}`) failed: {source}")]
    TransformFailure {
        /// The index of the step.
        step: usize,
        /// The output name of the step.
        output: String,
        /// The transform of the step.
        transform: String,
        /// The cause.
        #[source]
        source: TransformError,
    },

    /// The source image could not be loaded.
    #[error("Failed to load the image. {0}")]
    ImageLoadFailure(#[from] IoError),

    /// A sink could not present an output.
    #[error("Result sink failed. {0}")]
    SinkFailure(#[from] SinkError),

    /// The pipeline definition could not be parsed.
    #[error("Invalid pipeline configuration: {0}")]
    Config(String),
}

impl PipelineError {
    /// The process exit code reported for this error.
    ///
    /// Definition errors map to 2, transform failures to 3, load failures to 4
    /// and sink failures to 5.
    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::UnknownTransform { .. }
            | PipelineError::DuplicateTransform(_)
            | PipelineError::InvalidParameter { .. }
            | PipelineError::InvalidInputCount { .. }
            | PipelineError::MissingInput { .. }
            | PipelineError::DuplicateOutput { .. }
            | PipelineError::Config(_) => 2,
            PipelineError::TransformFailure { .. } => 3,
            PipelineError::ImageLoadFailure(_) => 4,
            PipelineError::SinkFailure(_) => 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_and_exit_codes() {
        let err = PipelineError::UnknownTransform {
            name: "sharpen".to_string(),
            step: Some(2),
        };
        assert_eq!(err.to_string(), "Unknown transform `sharpen` in step 2");
        assert_eq!(err.exit_code(), 2);

        let err = PipelineError::TransformFailure {
            step: 0,
            output: "small".to_string(),
            transform: "pyr_down".to_string(),
            source: TransformError::ImageTooSmall(1, 1, 2, 2),
        };
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("pyr_down"));

        let err = PipelineError::SinkFailure(SinkError::DisplayUnavailable("headless".into()));
        assert_eq!(err.exit_code(), 5);
    }
}
