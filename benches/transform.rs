//! Benchmarks for the preview path: transform, parse and render
//!
//! Run with: cargo bench transform

mod support;

use support::make_source;
use swatch::preview::{jsx, transform, Renderer};

#[global_allocator]
static ALLOC: divan::AllocProfiler = divan::AllocProfiler::system();

fn main() {
    divan::main();
}

#[divan::bench(args = [1, 10, 100])]
fn transform_source(bencher: divan::Bencher, components: usize) {
    let source = make_source(components);
    bencher.bench(|| divan::black_box(transform(divan::black_box(&source))));
}

#[divan::bench(args = [1, 10, 100])]
fn parse_transformed(bencher: divan::Bencher, components: usize) {
    let code = transform(&make_source(components)).code;
    bencher.bench(|| divan::black_box(jsx::parse(divan::black_box(&code))));
}

#[divan::bench(args = [1, 10, 100])]
fn render_transformed(bencher: divan::Bencher, components: usize) {
    let code = transform(&make_source(components)).code;
    let renderer = Renderer::standard();
    let mut version = 0;
    bencher.bench_local(|| {
        version += 1;
        divan::black_box(renderer.render(version, divan::black_box(&code)))
    });
}
