use gc_core::charset::{GlyphRamp, LuminanceLut};
use gc_core::config::Parallelism;
use gc_core::frame::{GlyphFrame, LumaFrame};
use rayon::prelude::*;

/// Build the glyph frame of `grid` with ramp `ramp`.
///
/// `out[r][c] == quantize(grid[r][c], ramp)` for every cell.
///
/// # Example
/// ```
/// use gc_core::charset::{GlyphRamp, RampOrder};
/// use gc_core::frame::LumaFrame;
/// let ramp = GlyphRamp::new(" .:#@", RampOrder::SparseToDense).unwrap();
/// let glyphs = gc_ascii::build(&LumaFrame::filled(3, 2, 255), &ramp);
/// assert_eq!(glyphs.lines(), vec!["@@@", "@@@"]);
/// ```
#[must_use]
pub fn build(grid: &LumaFrame, ramp: &GlyphRamp) -> GlyphFrame {
    build_glyph_frame(grid, &LuminanceLut::new(ramp))
}

/// Build a fresh glyph frame from a precomputed LUT.
#[must_use]
pub fn build_glyph_frame(grid: &LumaFrame, lut: &LuminanceLut) -> GlyphFrame {
    let mut out = GlyphFrame::default();
    build_into(grid, lut, Parallelism::Auto, &mut out);
    out
}

/// Build into `out`, reusing its allocation.
///
/// `out` takes the dimensions of `grid`. The result is identical for every
/// `parallelism`.
///
/// # Example
/// ```
/// use gc_core::charset::{GlyphRamp, LuminanceLut, RampOrder};
/// use gc_core::config::Parallelism;
/// use gc_core::frame::{GlyphFrame, LumaFrame};
/// let lut = LuminanceLut::new(&GlyphRamp::new(" #", RampOrder::SparseToDense).unwrap());
/// let mut out = GlyphFrame::default();
/// gc_ascii::build_into(&LumaFrame::from_raw(2, 1, vec![0, 255]).unwrap(), &lut, Parallelism::Rows, &mut out);
/// assert_eq!(out.lines(), vec![" #"]);
/// ```
pub fn build_into(grid: &LumaFrame, lut: &LuminanceLut, parallelism: Parallelism, out: &mut GlyphFrame) {
    out.reshape(grid.width, grid.height);
    if out.is_empty() {
        return;
    }
    let cols = grid.width as usize;
    let parallel = parallelism.is_parallel(out.cells.len());
    log::trace!("Grille de glyphes {}x{} (parallèle : {parallel})", grid.width, grid.height);
    if parallel {
        out.cells
            .par_chunks_exact_mut(cols)
            .zip(grid.data.par_chunks_exact(cols))
            .for_each(|(dst, src)| map_row(src, lut, dst));
    } else {
        for (dst, src) in out.cells.chunks_exact_mut(cols).zip(grid.data.chunks_exact(cols)) {
            map_row(src, lut, dst);
        }
    }
}

#[inline(always)]
fn map_row(src: &[u8], lut: &LuminanceLut, dst: &mut [char]) {
    for (cell, &lum) in dst.iter_mut().zip(src) {
        *cell = lut.map(lum);
    }
}

#[cfg(test)]
mod tests {
    use gc_core::charset::{RAMP_DETAILED, RAMP_SIMPLE, RampOrder, quantize};

    use super::*;

    fn ramp(s: &str) -> GlyphRamp {
        GlyphRamp::new(s, RampOrder::SparseToDense).unwrap()
    }

    fn noise(w: u32, h: u32) -> LumaFrame {
        // LCG déterministe
        let mut state = 0x2545_f491_u32;
        let data = (0..w * h)
            .map(|_| {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                (state >> 24) as u8
            })
            .collect();
        LumaFrame::from_raw(w, h, data).unwrap()
    }

    #[test]
    fn dimensions_follow_the_grid() {
        let r = ramp(RAMP_SIMPLE);
        for (w, h) in [(1, 1), (7, 3), (256, 106), (512, 256)] {
            let glyphs = build(&LumaFrame::new(w, h), &r);
            assert_eq!((glyphs.cols, glyphs.rows), (w, h));
            assert_eq!(glyphs.cells.len(), (w * h) as usize);
        }
    }

    #[test]
    fn every_cell_is_quantized() {
        let r = ramp(RAMP_DETAILED);
        let grid = noise(37, 11);
        let glyphs = build(&grid, &r);
        for y in 0..grid.height {
            for x in 0..grid.width {
                assert_eq!(glyphs.get(x, y), quantize(grid.get(x, y), &r));
            }
        }
    }

    #[test]
    fn uniform_grids_map_to_ramp_ends() {
        let r = ramp(RAMP_DETAILED);
        let dark = build(&LumaFrame::filled(20, 10, 0), &r);
        assert!(dark.cells.iter().all(|&c| c == r.glyph(0)));
        let bright = build(&LumaFrame::filled(20, 10, 255), &r);
        assert!(bright.cells.iter().all(|&c| c == r.glyph(r.len() - 1)));
    }

    #[test]
    fn rebuilding_is_idempotent() {
        let r = ramp(RAMP_SIMPLE);
        let grid = noise(64, 32);
        assert_eq!(build(&grid, &r), build(&grid, &r));
    }

    #[test]
    fn parallel_matches_sequential() {
        let lut = LuminanceLut::new(&ramp(RAMP_DETAILED));
        let grid = noise(300, 120);
        let mut seq = GlyphFrame::default();
        let mut rows = GlyphFrame::default();
        let mut auto = GlyphFrame::default();
        build_into(&grid, &lut, Parallelism::Sequential, &mut seq);
        build_into(&grid, &lut, Parallelism::Rows, &mut rows);
        build_into(&grid, &lut, Parallelism::Auto, &mut auto);
        assert_eq!(seq, rows);
        assert_eq!(seq, auto);
    }

    #[test]
    fn output_is_reshaped_between_frames() {
        let lut = LuminanceLut::new(&ramp(RAMP_SIMPLE));
        let mut out = GlyphFrame::default();
        build_into(&LumaFrame::filled(10, 5, 255), &lut, Parallelism::Sequential, &mut out);
        build_into(&LumaFrame::filled(4, 2, 0), &lut, Parallelism::Sequential, &mut out);
        assert_eq!((out.cols, out.rows), (4, 2));
        assert!(out.cells.iter().all(|&c| c == ' '));
    }

    #[test]
    fn empty_grid_gives_empty_frame() {
        let glyphs = build(&LumaFrame::new(0, 0), &ramp(RAMP_SIMPLE));
        assert!(glyphs.is_empty());
        let glyphs = build(&LumaFrame::new(5, 0), &ramp(RAMP_SIMPLE));
        assert!(glyphs.is_empty());
    }
}
