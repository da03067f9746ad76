use cvpipe_image::DynImage;
use cvpipe_imgproc::morphology::{self, Kernel, KernelShape, MorphologyOp};

use super::{map_pixels, with_dst};
use crate::error::{PipelineError, TransformError};
use crate::registry::TransformRegistry;
use crate::schema::{ParamSpec, Params, TransformSpec};

// the structuring element parameters shared by every morphological transform
fn kernel_params(spec: TransformSpec) -> TransformSpec {
    spec.param(ParamSpec::size("ksize", 1, 63, (5, 5)))
        .param(ParamSpec::choice(
            "shape",
            &["rect", "ellipse", "cross"],
            "rect",
        ))
        .param(ParamSpec::int("iterations", 1, 32, 1))
}

pub(crate) fn register(registry: &mut TransformRegistry) -> Result<(), PipelineError> {
    registry.register(
        "erode",
        erode,
        kernel_params(TransformSpec::new("Take the minimum over the structuring element")),
    )?;

    registry.register(
        "dilate",
        dilate,
        kernel_params(TransformSpec::new("Take the maximum over the structuring element")),
    )?;

    registry.register(
        "morphology",
        morphology,
        kernel_params(
            TransformSpec::new("Apply a compound morphological operation").param(
                ParamSpec::choice(
                    "op",
                    &["open", "close", "gradient", "tophat", "blackhat"],
                    "open",
                ),
            ),
        ),
    )?;

    Ok(())
}

fn structuring_element(params: &Params) -> Result<(Kernel, usize), TransformError> {
    let (width, height) = params.size("ksize")?;
    let shape = match params.choice("shape")? {
        "ellipse" => KernelShape::Ellipse { width, height },
        "cross" => KernelShape::Cross { width, height },
        _ => KernelShape::Box { width, height },
    };
    Ok((Kernel::new(shape), params.usize("iterations")?))
}

fn erode(inputs: &[&DynImage], params: &Params) -> Result<DynImage, TransformError> {
    let (kernel, iterations) = structuring_element(params)?;
    Ok(map_pixels!(inputs[0], |src| with_dst(src.size(), |dst| {
        morphology::erode(src, dst, &kernel, iterations)
    })?))
}

fn dilate(inputs: &[&DynImage], params: &Params) -> Result<DynImage, TransformError> {
    let (kernel, iterations) = structuring_element(params)?;
    Ok(map_pixels!(inputs[0], |src| with_dst(src.size(), |dst| {
        morphology::dilate(src, dst, &kernel, iterations)
    })?))
}

fn morphology(inputs: &[&DynImage], params: &Params) -> Result<DynImage, TransformError> {
    let (kernel, iterations) = structuring_element(params)?;
    let op = match params.choice("op")? {
        "close" => MorphologyOp::Close,
        "gradient" => MorphologyOp::Gradient,
        "tophat" => MorphologyOp::TopHat,
        "blackhat" => MorphologyOp::BlackHat,
        _ => MorphologyOp::Open,
    };
    Ok(map_pixels!(inputs[0], |src| with_dst(src.size(), |dst| {
        morphology::morphology_ex(src, dst, op, &kernel, iterations)
    })?))
}
