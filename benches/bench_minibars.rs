#![allow(
    clippy::tests_outside_test_module,
    clippy::unwrap_used,
    reason = "benchmark"
)]

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use minibars::{Context, MemorySource, MinibarsEngine, Template};

mod utils;

fn minibars_benchmark(c: &mut Criterion) {
    let template_content = include_str!("template.hbs");

    let mut source = MemorySource::new();
    source.add_template("profile", template_content).unwrap();
    let engine = MinibarsEngine::new(source);

    // Contexts deserialize straight from the JSON the other benchmarks use.
    let contexts: Vec<Context> = utils::profile_contexts(100)
        .into_iter()
        .map(|json| serde_json::from_value(json).unwrap())
        .collect();

    let mut group = c.benchmark_group("Template Rendering");
    group.sample_size(50);

    group.bench_function("minibars_render", |b| {
        b.iter(|| {
            for context in &contexts {
                black_box(engine.render("profile", context).unwrap());
            }
        });
    });

    let template = Template::parse(template_content);
    group.bench_function("minibars_render_preparsed", |b| {
        b.iter(|| {
            for context in &contexts {
                black_box(template.render(context));
            }
        });
    });

    group.bench_function("minibars_parse", |b| {
        b.iter(|| black_box(Template::parse(black_box(template_content))));
    });

    group.finish();
}

criterion_group!(benches, minibars_benchmark);
criterion_main!(benches);
