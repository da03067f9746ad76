use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::PipelineError;

/// One invocation of a named transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineStep {
    /// The registered name of the transform.
    pub transform: String,

    /// The raw parameter values, checked against the [`crate::TransformSpec`] before running.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,

    /// The names of the input images.
    ///
    /// Defaults to the output of the previous step, or the source image for the first step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<Vec<String>>,

    /// The name of the result.
    ///
    /// Defaults to the transform name, or `<transform>_<index>` if that name is taken.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl PipelineStep {
    /// Create a step with default parameters, inputs and output.
    pub fn new(transform: &str) -> Self {
        Self {
            transform: transform.to_string(),
            params: Map::new(),
            inputs: None,
            output: None,
        }
    }

    /// Set a parameter.
    pub fn param(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }

    /// Bind the inputs explicitly.
    pub fn inputs(mut self, inputs: &[&str]) -> Self {
        self.inputs = Some(inputs.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Name the output.
    pub fn output(mut self, output: &str) -> Self {
        self.output = Some(output.to_string());
        self
    }
}

/// An ordered list of steps.
///
/// # Example
///
/// ```
/// use cvpipe_pipeline::Pipeline;
///
/// let pipeline = Pipeline::from_json(
///     r#"{ "steps": [ { "transform": "threshold", "params": { "value": 127 } } ] }"#,
/// )
/// .unwrap();
///
/// assert_eq!(pipeline.steps.len(), 1);
/// assert_eq!(pipeline.steps[0].transform, "threshold");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Pipeline {
    /// The steps, run in order.
    pub steps: Vec<PipelineStep>,
}

impl Pipeline {
    /// Create a pipeline from its steps.
    pub fn new(steps: Vec<PipelineStep>) -> Self {
        Self { steps }
    }

    /// Append a step.
    pub fn step(mut self, step: PipelineStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Parse a pipeline from its JSON representation.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] if the text is not a valid pipeline.
    pub fn from_json(text: &str) -> Result<Self, PipelineError> {
        // syntax errors are reported before shape errors
        let value: Value =
            serde_json::from_str(text).map_err(|e| PipelineError::Config(e.to_string()))?;

        // either `{ "steps": [...] }` or the bare list of steps
        let steps = if value.is_array() {
            serde_json::from_value::<Vec<PipelineStep>>(value)
        } else {
            serde_json::from_value::<Pipeline>(value).map(|pipeline| pipeline.steps)
        }
        .map_err(|e| PipelineError::Config(e.to_string()))?;

        Ok(Self::new(steps))
    }

    /// Read and parse a pipeline file.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json(&text)
    }

    /// Serialize the pipeline as pretty printed JSON.
    pub fn to_json(&self) -> Result<String, PipelineError> {
        serde_json::to_string_pretty(self).map_err(|e| PipelineError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_object_and_bare_list() -> Result<(), PipelineError> {
        let pipeline = Pipeline::from_json(
            r#"{
                "steps": [
                    { "transform": "cvt_color", "params": { "to": "gray" }, "output": "gray" },
                    { "transform": "canny", "inputs": ["gray"] }
                ]
            }"#,
        )?;
        assert_eq!(pipeline.steps.len(), 2);
        assert_eq!(pipeline.steps[0].output.as_deref(), Some("gray"));
        assert_eq!(pipeline.steps[1].inputs, Some(vec!["gray".to_string()]));
        assert!(pipeline.steps[1].params.is_empty());

        let bare = Pipeline::from_json(r#"[ { "transform": "blur" } ]"#)?;
        assert_eq!(bare, Pipeline::new(vec![PipelineStep::new("blur")]));

        Ok(())
    }

    #[test]
    fn config_errors() {
        for text in [
            "{ not json",
            r#"{ "steps": [ { "params": {} } ] }"#,
            r#"[ { "transform": "blur", "typo": 1 } ]"#,
            r#"{ "steps": [ { "transform": "blur", "params": [1, 2] } ] }"#,
        ] {
            let res = Pipeline::from_json(text);
            assert!(matches!(res, Err(PipelineError::Config(_))), "{text}");
        }

        assert!(matches!(
            Pipeline::from_path("/no/such/pipeline.json"),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn json_round_trip() -> Result<(), PipelineError> {
        let pipeline = Pipeline::default()
            .step(PipelineStep::new("gaussian_blur").param("ksize", vec![3, 3]))
            .step(
                PipelineStep::new("add")
                    .inputs(&["input", "gaussian_blur"])
                    .output("sum"),
            );

        let text = pipeline.to_json()?;
        assert_eq!(Pipeline::from_json(&text)?, pipeline);

        Ok(())
    }
}
