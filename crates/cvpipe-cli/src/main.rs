use argh::FromArgs;
use std::path::PathBuf;
use std::process::ExitCode;

use cvpipe::io::{functional as F, ImageFormat};
use cvpipe::pipeline::{
    Executor, FileSink, NullSink, Pipeline, PipelineError, ResultSink, SinkError,
    TransformRegistry,
};

/// Where the pipeline results go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SinkKind {
    Display,
    File,
    Null,
}

impl std::str::FromStr for SinkKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "display" => Ok(SinkKind::Display),
            "file" => Ok(SinkKind::File),
            "null" => Ok(SinkKind::Null),
            other => Err(format!("unknown sink `{other}`, expected display, file or null")),
        }
    }
}

#[derive(FromArgs, Debug)]
/// Run an image processing pipeline on an image and present every result
struct Args {
    /// path to the input image
    #[argh(option, short = 'i')]
    image_path: Option<PathBuf>,

    /// path to the JSON pipeline file
    #[argh(option, short = 'p')]
    pipeline_path: Option<PathBuf>,

    /// decode the input image as 8-bit grayscale
    #[argh(switch)]
    gray: bool,

    /// where the results go: display, file or null (default: display)
    #[argh(option, default = "SinkKind::Display")]
    sink: SinkKind,

    /// output directory of the file sink (default: output)
    #[argh(option, short = 'o', default = "PathBuf::from(\"output\")")]
    output_dir: PathBuf,

    /// file format of the file sink: png, jpeg, bmp, tiff or pnm (default: png)
    #[argh(option, default = "ImageFormat::Png")]
    format: ImageFormat,

    /// also present the input image, before the results
    #[argh(switch)]
    show_input: bool,

    /// print the available transforms and exit
    #[argh(switch)]
    list: bool,
}

fn list_transforms(registry: &TransformRegistry) {
    for (name, entry) in registry.iter() {
        let spec = entry.spec();
        let arity = if spec.min_inputs == spec.max_inputs {
            format!("{}", spec.min_inputs)
        } else {
            format!("{}..{}", spec.min_inputs, spec.max_inputs)
        };
        println!("{name} ({arity} inputs): {}", spec.description);
        for param in &spec.params {
            println!("    {}: {} = {}", param.name, param.kind, param.default);
        }
    }
}

fn make_sink(args: &Args) -> Result<Box<dyn ResultSink>, SinkError> {
    match args.sink {
        SinkKind::Null => Ok(Box::new(NullSink)),
        SinkKind::File => Ok(Box::new(FileSink::new(&args.output_dir, args.format))),
        #[cfg(feature = "display")]
        SinkKind::Display => Ok(Box::new(cvpipe::pipeline::DisplaySink::spawn()?)),
        #[cfg(not(feature = "display"))]
        SinkKind::Display => Err(SinkError::DisplayUnavailable(
            "built without the display feature".to_string(),
        )),
    }
}

fn run(args: &Args) -> Result<(), PipelineError> {
    let registry = TransformRegistry::with_builtins()?;

    if args.list {
        list_transforms(&registry);
        return Ok(());
    }

    let (Some(image_path), Some(pipeline_path)) = (&args.image_path, &args.pipeline_path) else {
        return Err(PipelineError::Config(
            "both --image-path and --pipeline-path are required".to_string(),
        ));
    };

    let pipeline = Pipeline::from_path(pipeline_path)?;
    let executor = Executor::new(&registry);

    // report definition errors before touching the image or the viewer
    executor.validate(&pipeline)?;

    let image = if args.gray {
        F::read_image_gray(image_path)?
    } else {
        F::read_image_any(image_path)?
    };
    log::info!(
        "loaded {} ({}x{} {})",
        image_path.display(),
        image.width(),
        image.height(),
        image.color_space()
    );

    let mut sink = make_sink(args)?;
    executor.run_into(&pipeline, &image, sink.as_mut(), args.show_input)
}

fn main() -> ExitCode {
    env_logger::init();

    let args: Args = argh::from_env();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            eprintln!("Error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}
