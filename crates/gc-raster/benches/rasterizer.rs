//! Glyph rasterizer throughput.
//!
//! Run with: cargo bench -p gc-raster

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use gc_core::charset::{GlyphRamp, RAMP_DETAILED, RampOrder};
use gc_core::config::{CellGeometry, FontSpec, Parallelism};
use gc_core::frame::{FrameBuffer, GlyphFrame};
use gc_raster::Rasterizer;

fn mixed_frame(cols: u32, rows: u32) -> GlyphFrame {
    let glyphs: Vec<char> = RAMP_DETAILED.chars().collect();
    let mut frame = GlyphFrame::new(cols, rows);
    for (i, cell) in frame.cells.iter_mut().enumerate() {
        *cell = glyphs[(i * 13) % glyphs.len()];
    }
    frame
}

fn bench_rasterize(c: &mut Criterion) {
    let ramp = GlyphRamp::new(RAMP_DETAILED, RampOrder::SparseToDense)
        .unwrap_or_else(|e| panic!("rampe invalide : {e}"));
    let mut group = c.benchmark_group("rasterize_into");

    for parallelism in [Parallelism::Sequential, Parallelism::Rows] {
        let raster = Rasterizer::new(
            &ramp,
            CellGeometry::default(),
            &FontSpec::default(),
            [0, 0, 0],
            parallelism,
        )
        .unwrap_or_else(|e| panic!("rasterizer : {e}"));

        for (cols, rows) in [(80, 24), (256, 106), (256, 256)] {
            let frame = mixed_frame(cols, rows);
            let mut out = FrameBuffer::new(0, 0);
            group.throughput(Throughput::Elements(u64::from(cols * rows)));
            group.bench_with_input(
                BenchmarkId::new(format!("{parallelism:?}"), format!("{cols}x{rows}")),
                &frame,
                |b, frame| {
                    b.iter(|| raster.rasterize_into(black_box(frame), &mut out));
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_rasterize);
criterion_main!(benches);
