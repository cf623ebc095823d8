use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{DynamicImage, Rgba, RgbaImage};
use memegen::model::{Style, TextLine, TextLineId};
use memegen::rendering::glyphs::{shape_text, BlockFace};
use memegen::rendering::Compositor;

fn background() -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(300, 300, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
    }))
}

fn lines() -> Vec<TextLine> {
    vec![
        TextLine::at(TextLineId(1), 20, 50).with_text("WHEN THE BENCHMARK"),
        TextLine::at(TextLineId(2), 80, 50).with_text("FINALLY RUNS"),
    ]
}

/// Full render: stretch, two stroked lines, fill.
fn bench_render(c: &mut Criterion) {
    let compositor = Compositor::default();
    let bg = background();
    let lines = lines();
    let style = Style::default();

    c.bench_function("render_500x500_two_lines", |b| {
        b.iter(|| {
            let raster = compositor.render(black_box(&bg), black_box(&lines), &style);
            black_box(raster.fingerprint());
        })
    });
}

/// Glyph shaping and stroke dilation on their own.
fn bench_stroke_mask(c: &mut Criterion) {
    c.bench_function("shape_and_dilate_48px", |b| {
        b.iter(|| {
            let mask = shape_text(&BlockFace, black_box("ONE DOES NOT SIMPLY"), 48.0);
            black_box(mask.dilated(1.0));
        })
    });
}

criterion_group!(benches, bench_render, bench_stroke_mask);
criterion_main!(benches);
