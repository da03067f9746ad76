use std::collections::{HashMap, HashSet};
use std::time::Instant;

use cvpipe_image::DynImage;

use crate::error::{PipelineError, TransformError};
use crate::pipeline::Pipeline;
use crate::registry::{TransformEntry, TransformRegistry};
use crate::schema::Params;
use crate::sink::ResultSink;

/// The reserved name of the image a pipeline runs on.
pub const SOURCE: &str = "input";

/// The named results of a pipeline run, in step order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineOutputs {
    outputs: Vec<(String, DynImage)>,
}

impl PipelineOutputs {
    /// Get a result by name.
    pub fn get(&self, name: &str) -> Option<&DynImage> {
        self.outputs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, image)| image)
    }

    /// The result names in step order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.outputs.iter().map(|(n, _)| n.as_str())
    }

    /// Iterate over the results in step order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DynImage)> {
        self.outputs.iter().map(|(n, image)| (n.as_str(), image))
    }

    /// The number of results.
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    /// Whether the pipeline produced no result.
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

impl IntoIterator for PipelineOutputs {
    type Item = (String, DynImage);
    type IntoIter = std::vec::IntoIter<(String, DynImage)>;

    fn into_iter(self) -> Self::IntoIter {
        self.outputs.into_iter()
    }
}

// a step whose transform, parameters, inputs and output are resolved
struct PlannedStep<'a> {
    index: usize,
    transform: &'a str,
    entry: &'a TransformEntry,
    params: Params,
    inputs: Vec<String>,
    output: String,
}

/// Runs pipelines against a registry of transforms.
///
/// A pipeline is fully checked before its first transform runs, so a definition
/// error never leaves partial results behind.
///
/// # Example
///
/// ```
/// use cvpipe_image::{DynImage, Image, ImageSize};
/// use cvpipe_pipeline::{Executor, Pipeline, PipelineStep, TransformRegistry};
///
/// let registry = TransformRegistry::with_builtins().unwrap();
/// let executor = Executor::new(&registry);
///
/// let pipeline = Pipeline::default()
///     .step(PipelineStep::new("threshold").param("value", 100))
///     .step(PipelineStep::new("flip"));
///
/// let image = DynImage::gray_u8(
///     Image::new(ImageSize { width: 2, height: 1 }, vec![50, 150]).unwrap(),
/// );
///
/// let outputs = executor.run(&pipeline, &image).unwrap();
/// assert_eq!(outputs.names().collect::<Vec<_>>(), vec!["threshold", "flip"]);
/// assert_eq!(outputs.get("flip").unwrap().to_u8().unwrap().as_slice(), &[255, 0]);
/// ```
pub struct Executor<'r> {
    registry: &'r TransformRegistry,
}

impl<'r> Executor<'r> {
    /// Create an executor borrowing the given registry.
    pub fn new(registry: &'r TransformRegistry) -> Self {
        Self { registry }
    }

    /// Check a pipeline without running it.
    pub fn validate(&self, pipeline: &Pipeline) -> Result<(), PipelineError> {
        self.plan(pipeline).map(|_| ())
    }

    fn plan<'a>(&'a self, pipeline: &'a Pipeline) -> Result<Vec<PlannedStep<'a>>, PipelineError> {
        let mut taken: HashSet<String> = HashSet::from([SOURCE.to_string()]);
        let mut planned = Vec::with_capacity(pipeline.steps.len());
        let mut previous = SOURCE.to_string();

        for (index, step) in pipeline.steps.iter().enumerate() {
            let transform = step.transform.as_str();
            let entry = self
                .registry
                .resolve(transform)
                .map_err(|_| PipelineError::UnknownTransform {
                    name: transform.to_string(),
                    step: Some(index),
                })?;
            let spec = entry.spec();

            let invalid = |param: &str, reason: String| PipelineError::InvalidParameter {
                step: index,
                transform: transform.to_string(),
                param: param.to_string(),
                reason,
            };

            let mut params = Params::new();
            for (name, raw) in &step.params {
                let param = spec
                    .find_param(name)
                    .ok_or_else(|| invalid(name, "no such parameter".to_string()))?;
                let value = param.coerce(raw).map_err(|reason| invalid(name, reason))?;
                params.insert(name, value);
            }
            for param in &spec.params {
                if params.get(&param.name).is_none() {
                    params.insert(&param.name, param.default.clone());
                }
            }

            let inputs = step
                .inputs
                .clone()
                .unwrap_or_else(|| vec![previous.clone()]);
            if inputs.len() < spec.min_inputs || inputs.len() > spec.max_inputs {
                return Err(PipelineError::InvalidInputCount {
                    step: index,
                    transform: transform.to_string(),
                    min: spec.min_inputs,
                    max: spec.max_inputs,
                    got: inputs.len(),
                });
            }

            if let Some(input) = inputs.iter().find(|input| !taken.contains(*input)) {
                return Err(PipelineError::MissingInput {
                    step: index,
                    input: input.clone(),
                });
            }

            let output = match &step.output {
                Some(output) => output.clone(),
                None if !taken.contains(transform) => transform.to_string(),
                None => format!("{transform}_{index}"),
            };
            if !taken.insert(output.clone()) {
                return Err(PipelineError::DuplicateOutput {
                    step: index,
                    output,
                });
            }

            previous = output.clone();
            planned.push(PlannedStep {
                index,
                transform,
                entry,
                params,
                inputs,
                output,
            });
        }

        Ok(planned)
    }

    /// Run a pipeline on an image and collect every named result.
    ///
    /// # Errors
    ///
    /// Definition errors are reported before any transform runs. The first failing
    /// transform aborts the run with [`PipelineError::TransformFailure`].
    pub fn run(
        &self,
        pipeline: &Pipeline,
        input: &DynImage,
    ) -> Result<PipelineOutputs, PipelineError> {
        let planned = self.plan(pipeline)?;

        let start = Instant::now();
        let mut outputs: Vec<(String, DynImage)> = Vec::with_capacity(planned.len());
        let mut by_name: HashMap<String, usize> = HashMap::new();

        for step in planned {
            let step_start = Instant::now();

            let failure = |source: TransformError| PipelineError::TransformFailure {
                step: step.index,
                output: step.output.clone(),
                transform: step.transform.to_string(),
                source,
            };

            let result = {
                let mut images = Vec::with_capacity(step.inputs.len());
                for name in &step.inputs {
                    let image = if name == SOURCE {
                        input
                    } else {
                        let position =
                            by_name
                                .get(name)
                                .copied()
                                .ok_or_else(|| PipelineError::MissingInput {
                                    step: step.index,
                                    input: name.clone(),
                                })?;
                        &outputs[position].1
                    };
                    images.push(image);
                }

                if let Some((min_width, min_height)) = step.entry.spec().min_size {
                    if let Some(small) = images
                        .iter()
                        .find(|img| img.width() < min_width || img.height() < min_height)
                    {
                        return Err(failure(TransformError::ImageTooSmall(
                            small.width(),
                            small.height(),
                            min_width,
                            min_height,
                        )));
                    }
                }

                step.entry.call(&images, &step.params).map_err(failure)?
            };

            log::debug!(
                "step {} `{}` -> `{}`: {}x{} {} {} in {:?}",
                step.index,
                step.transform,
                step.output,
                result.width(),
                result.height(),
                result.color_space(),
                result.depth(),
                step_start.elapsed()
            );

            by_name.insert(step.output.clone(), outputs.len());
            outputs.push((step.output, result));
        }

        log::info!(
            "ran {} steps in {:?}",
            outputs.len(),
            start.elapsed()
        );

        Ok(PipelineOutputs { outputs })
    }

    /// Run a pipeline and hand every result to a sink, in step order.
    ///
    /// Nothing reaches the sink unless every step succeeded. With `present_input`
    /// the source image is presented first under the name [`SOURCE`].
    pub fn run_into(
        &self,
        pipeline: &Pipeline,
        input: &DynImage,
        sink: &mut dyn ResultSink,
        present_input: bool,
    ) -> Result<(), PipelineError> {
        let outputs = self.run(pipeline, input)?;

        if present_input {
            sink.present(SOURCE, input.clone())?;
        }
        for (name, image) in outputs {
            sink.present(&name, image)?;
        }
        sink.finish()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use cvpipe_image::{Image, ImageSize};

    use super::*;
    use crate::pipeline::PipelineStep;
    use crate::schema::{ParamSpec, TransformSpec};
    use crate::sink::CaptureSink;

    fn source() -> DynImage {
        DynImage::gray_u8(
            Image::new(
                ImageSize {
                    width: 3,
                    height: 2,
                },
                vec![0, 50, 100, 150, 200, 250],
            )
            .expect("valid image"),
        )
    }

    // a registry with an inverting transform that counts its calls
    fn counting_registry(calls: Arc<AtomicUsize>) -> Result<TransformRegistry, PipelineError> {
        let mut registry = TransformRegistry::new();
        registry.register(
            "invert",
            move |inputs, params| {
                calls.fetch_add(1, Ordering::SeqCst);
                let offset = params.float("offset")?;
                let src = inputs[0].to_u8()?;
                let data = src
                    .as_slice()
                    .iter()
                    .map(|&v| (255.0 - v as f32 + offset).clamp(0.0, 255.0) as u8)
                    .collect();
                Ok(DynImage::gray_u8(Image::new(inputs[0].size(), data)?))
            },
            TransformSpec::new("invert").param(ParamSpec::float("offset", -10.0, 10.0, 0.0)),
        )?;
        registry.register(
            "pair",
            |inputs, _| Ok(inputs[1].clone()),
            TransformSpec::new("second of two").inputs(2, 2),
        )?;
        registry.register(
            "large_only",
            |inputs, _| Ok(inputs[0].clone()),
            TransformSpec::new("needs 4x4").min_size(4, 4),
        )?;
        Ok(registry)
    }

    #[test]
    fn default_names_and_chaining() -> Result<(), PipelineError> {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = counting_registry(calls.clone())?;
        let executor = Executor::new(&registry);

        let pipeline = Pipeline::default()
            .step(PipelineStep::new("invert"))
            .step(PipelineStep::new("invert"))
            .step(PipelineStep::new("pair").inputs(&["input", "invert_1"]));

        let outputs = executor.run(&pipeline, &source())?;
        assert_eq!(
            outputs.names().collect::<Vec<_>>(),
            vec!["invert", "invert_1", "pair"]
        );
        assert_eq!(outputs.get("invert_1"), Some(&source()));
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        Ok(())
    }

    #[test]
    fn definition_errors_run_nothing() -> Result<(), PipelineError> {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = counting_registry(calls.clone())?;
        let executor = Executor::new(&registry);
        let image = source();

        let unknown = Pipeline::default()
            .step(PipelineStep::new("invert"))
            .step(PipelineStep::new("sharpen"));
        assert!(matches!(
            executor.run(&unknown, &image),
            Err(PipelineError::UnknownTransform { step: Some(1), .. })
        ));

        let bad_param = Pipeline::default().step(PipelineStep::new("invert").param("offset", 99));
        assert!(matches!(
            executor.run(&bad_param, &image),
            Err(PipelineError::InvalidParameter { step: 0, .. })
        ));

        let unknown_param =
            Pipeline::default().step(PipelineStep::new("invert").param("gain", 1));
        assert!(matches!(
            executor.run(&unknown_param, &image),
            Err(PipelineError::InvalidParameter { .. })
        ));

        let arity = Pipeline::default().step(PipelineStep::new("pair"));
        assert!(matches!(
            executor.run(&arity, &image),
            Err(PipelineError::InvalidInputCount { got: 1, .. })
        ));

        let missing = Pipeline::default()
            .step(PipelineStep::new("invert"))
            .step(PipelineStep::new("invert").inputs(&["later"]))
            .step(PipelineStep::new("invert").output("later"));
        assert!(matches!(
            executor.run(&missing, &image),
            Err(PipelineError::MissingInput { step: 1, .. })
        ));

        let duplicate = Pipeline::default()
            .step(PipelineStep::new("invert").output("a"))
            .step(PipelineStep::new("invert").output("a"));
        assert!(matches!(
            executor.run(&duplicate, &image),
            Err(PipelineError::DuplicateOutput { step: 1, .. })
        ));

        let shadow = Pipeline::default().step(PipelineStep::new("invert").output(SOURCE));
        assert!(matches!(
            executor.run(&shadow, &image),
            Err(PipelineError::DuplicateOutput { step: 0, .. })
        ));

        assert_eq!(calls.load(Ordering::SeqCst), 0);

        Ok(())
    }

    #[test]
    fn failures_reach_no_sink() -> Result<(), PipelineError> {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = counting_registry(calls)?;
        let executor = Executor::new(&registry);

        let pipeline = Pipeline::default()
            .step(PipelineStep::new("invert"))
            .step(PipelineStep::new("large_only"));

        let mut sink = CaptureSink::default();
        let res = executor.run_into(&pipeline, &source(), &mut sink, true);
        match res {
            Err(PipelineError::TransformFailure {
                step,
                output,
                transform,
                source,
            }) => {
                assert_eq!(step, 1);
                assert_eq!(output, "large_only");
                assert_eq!(transform, "large_only");
                assert!(matches!(source, TransformError::ImageTooSmall(3, 2, 4, 4)));
            }
            other => panic!("unexpected result {other:?}"),
        }
        assert!(sink.images().is_empty());

        Ok(())
    }

    #[test]
    fn run_into_presents_in_order() -> Result<(), Box<dyn std::error::Error>> {
        let registry = TransformRegistry::with_builtins()?;
        let executor = Executor::new(&registry);

        let pipeline = Pipeline::default()
            .step(PipelineStep::new("threshold").output("mask"))
            .step(PipelineStep::new("flip").param("axis", "vertical"));

        let mut sink = CaptureSink::default();
        executor.run_into(&pipeline, &source(), &mut sink, true)?;

        let names = sink.images().iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec![SOURCE, "mask", "flip"]);
        assert_eq!(
            sink.get("flip").map(|img| img.to_u8()).transpose()?.map(|img| img.as_slice().to_vec()),
            Some(vec![255, 255, 255, 0, 0, 0])
        );

        Ok(())
    }
}
