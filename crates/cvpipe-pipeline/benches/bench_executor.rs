use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use cvpipe_image::{DynImage, Image};
use cvpipe_pipeline::{Executor, Pipeline, PipelineStep, TransformRegistry};

fn bench_executor(c: &mut Criterion) {
    let mut group = c.benchmark_group("Executor");

    let registry = TransformRegistry::with_builtins().unwrap();
    let executor = Executor::new(&registry);

    let edges = Pipeline::default()
        .step(PipelineStep::new("cvt_color").param("to", "gray"))
        .step(PipelineStep::new("gaussian_blur"))
        .step(PipelineStep::new("canny"));

    let morphology = Pipeline::default()
        .step(PipelineStep::new("cvt_color").param("to", "gray"))
        .step(PipelineStep::new("threshold"))
        .step(PipelineStep::new("morphology").param("op", "open"))
        .step(PipelineStep::new("find_contours").inputs(&["morphology", "input"]));

    for (width, height) in [(256, 224), (512, 448), (1024, 896)].iter() {
        group.throughput(criterion::Throughput::Elements((*width * *height) as u64));

        let parameter_string = format!("{}x{}", width, height);

        let image_size = [*width, *height].into();
        let image_data = (0..width * height * 3).map(|i| (i % 256) as u8).collect();
        let image = DynImage::rgb_u8(Image::<u8, 3>::new(image_size, image_data).unwrap());

        group.bench_with_input(
            BenchmarkId::new("edges", &parameter_string),
            &image,
            |b, i| b.iter(|| black_box(executor.run(&edges, black_box(i)))),
        );

        group.bench_with_input(
            BenchmarkId::new("morphology", &parameter_string),
            &image,
            |b, i| b.iter(|| black_box(executor.run(&morphology, black_box(i)))),
        );

        group.bench_with_input(
            BenchmarkId::new("validate", &parameter_string),
            &image,
            |b, _| b.iter(|| black_box(executor.validate(&morphology))),
        );
    }
    group.finish();
}

criterion_group!(benches, bench_executor);
criterion_main!(benches);
