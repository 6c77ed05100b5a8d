use std::collections::HashMap;

use anyhow::Result;
use gc_core::charset::GlyphRamp;
use gc_core::config::{CellGeometry, FontSpec, Parallelism};
use gc_core::error::CoreError;
use gc_core::frame::{FrameBuffer, GlyphFrame, RGB_CHANNELS};
use rayon::prelude::*;

use crate::bitmap::{self, BitmapMetrics};
use crate::outline::OutlineFont;

/// Convertit une GlyphFrame en image RGB, une cellule par glyphe.
///
/// L'atlas (un masque alpha et une tuile RGB pré-mélangée par glyphe de la
/// rampe) est construit une fois dans [`Rasterizer::new`] ; le rendu d'une
/// frame ne fait que copier des tuiles.
///
/// # Example
/// ```
/// use gc_core::charset::{GlyphRamp, RampOrder};
/// use gc_core::config::{CellGeometry, FontSpec, Parallelism};
/// use gc_core::frame::GlyphFrame;
/// use gc_raster::Rasterizer;
///
/// let ramp = GlyphRamp::new(" .:#@", RampOrder::SparseToDense).unwrap();
/// let raster = Rasterizer::new(&ramp, CellGeometry::default(), &FontSpec::default(), [0, 0, 0], Parallelism::Auto).unwrap();
/// let image = raster.rasterize(&GlyphFrame::new(4, 3)).unwrap();
/// assert_eq!((image.width, image.height), (24, 30));
/// assert!(raster.rasterize(&GlyphFrame::new(4, 0)).is_none());
/// ```
pub struct Rasterizer {
    cell: CellGeometry,
    parallelism: Parallelism,
    /// Masque alpha `cell.width × cell.height` par glyphe.
    masks: HashMap<char, Vec<u8>>,
    /// Tuile RGB `cell.width × cell.height × 3` par glyphe.
    tiles: HashMap<char, Vec<u8>>,
    /// Tuile de fond, pour les glyphes hors atlas.
    blank: Vec<u8>,
}

impl Rasterizer {
    /// Build the glyph atlas for every glyph of `ramp`.
    ///
    /// # Errors
    /// - [`CoreError::InvalidDimensions`] for an empty cell.
    /// - [`CoreError::GeometryMismatch`] when the baseline margin or the
    ///   built-in glyph box does not fit the cell.
    /// - [`CoreError::Config`] for a zero thickness.
    /// - I/O or parse errors for an unreadable TrueType font.
    pub fn new(
        ramp: &GlyphRamp,
        cell: CellGeometry,
        font: &FontSpec,
        background: [u8; 3],
        parallelism: Parallelism,
    ) -> Result<Self> {
        if cell.width == 0 || cell.height == 0 {
            return Err(CoreError::InvalidDimensions {
                width: cell.width,
                height: cell.height,
            }
            .into());
        }
        if cell.baseline_margin >= cell.height {
            return Err(CoreError::GeometryMismatch(format!(
                "marge {} ≥ hauteur de cellule {}",
                cell.baseline_margin, cell.height
            ))
            .into());
        }
        if font.thickness == 0 {
            return Err(CoreError::Config("font.thickness doit être ≥ 1".into()).into());
        }

        let cell_px = cell.width as usize * cell.height as usize;
        let baseline = cell.baseline();
        let mut masks = HashMap::with_capacity(ramp.len());
        let mut unsupported = Vec::new();

        match &font.path {
            None => {
                let metrics = BitmapMetrics::for_scale(font.scale);
                check_fit(&metrics, &cell, font.scale)?;
                let top = baseline - metrics.ascent;
                for &ch in ramp.glyphs() {
                    let mut mask = vec![0u8; cell_px];
                    if !bitmap::draw_glyph(ch, &metrics, &mut mask, cell.width, 0, top) {
                        unsupported.push(ch);
                    }
                    masks.insert(ch, mask);
                }
                log::debug!(
                    "Atlas bitmap : glyphes {}x{} dans cellules {}x{}",
                    metrics.width,
                    metrics.height,
                    cell.width,
                    cell.height
                );
            }
            Some(path) => {
                let outline = OutlineFont::load(path, font.scale)?;
                let (ascent, descent) = outline.vertical_metrics();
                if ascent > baseline as f32 + 0.5 || descent > cell.baseline_margin as f32 + 0.5 {
                    log::warn!(
                        "Police {ascent:.1}/{descent:.1} px plus grande que la cellule {}x{} : glyphes rognés",
                        cell.width,
                        cell.height
                    );
                }
                let mut clipped = Vec::new();
                for &ch in ramp.glyphs() {
                    let mut mask = vec![0u8; cell_px];
                    match outline.draw_glyph(ch, &mut mask, cell.width, 0.0, baseline as f32) {
                        None => unsupported.push(ch),
                        Some(0) => {}
                        Some(_) => clipped.push(ch),
                    }
                    masks.insert(ch, mask);
                }
                if !clipped.is_empty() {
                    log::debug!("Glyphes rognés par la cellule : {}", clipped.iter().collect::<String>());
                }
            }
        }

        if !unsupported.is_empty() {
            log::warn!(
                "Glyphes sans forme dans la police, rendus vides : {}",
                unsupported.iter().collect::<String>()
            );
        }

        let radius = font.thickness - 1;
        if radius > 0 {
            for mask in masks.values_mut() {
                dilate(mask, cell.width as usize, cell.height as usize, radius as usize);
            }
        }

        let tiles = masks
            .iter()
            .map(|(&ch, mask)| (ch, tile_from_mask(mask, font.color, background)))
            .collect();
        let blank = tile_from_mask(&vec![0u8; cell_px], font.color, background);

        log::info!(
            "Rasterizer prêt : {} glyphes, cellule {}x{} (ligne de base {})",
            masks.len(),
            cell.width,
            cell.height,
            baseline
        );

        Ok(Self {
            cell,
            parallelism,
            masks,
            tiles,
            blank,
        })
    }

    /// Alpha mask of `ch`, `None` if `ch` is not in the atlas.
    #[must_use]
    pub fn glyph_mask(&self, ch: char) -> Option<&[u8]> {
        self.masks.get(&ch).map(Vec::as_slice)
    }

    /// Dimensions of the image for a `cols × rows` glyph frame, `None` if
    /// either side overflows `u32`.
    #[must_use]
    pub fn target_dimensions(&self, cols: u32, rows: u32) -> Option<(u32, u32)> {
        Some((cols.checked_mul(self.cell.width)?, rows.checked_mul(self.cell.height)?))
    }

    /// Render `glyphs` into a new image; `None` for an empty glyph frame.
    #[must_use]
    pub fn rasterize(&self, glyphs: &GlyphFrame) -> Option<FrameBuffer> {
        let mut out = FrameBuffer::new(0, 0);
        self.rasterize_into(glyphs, &mut out).then_some(out)
    }

    /// Render into `out`, reallocating only when the size changes.
    ///
    /// Returns `false`, leaving `out` untouched, for an empty glyph frame
    /// or one whose image size does not fit in `u32`.
    /// Every pixel of `out` is overwritten: glyph cells are blended over the
    /// background, other pixels are background.
    pub fn rasterize_into(&self, glyphs: &GlyphFrame, out: &mut FrameBuffer) -> bool {
        if glyphs.is_empty() {
            return false;
        }
        let Some((width, height)) = self.target_dimensions(glyphs.cols, glyphs.rows) else {
            log::warn!("Grille {}x{} trop grande pour une image", glyphs.cols, glyphs.rows);
            return false;
        };
        if out.width != width || out.height != height {
            *out = FrameBuffer::new(width, height);
        }

        let stride = width as usize * RGB_CHANNELS;
        let band_size = stride * self.cell.height as usize;
        let render_band = |(gy, band): (usize, &mut [u8])| self.render_row(glyphs.row(gy as u32), band, stride);

        if self.parallelism.is_parallel(glyphs.cells.len()) {
            out.data.par_chunks_exact_mut(band_size).enumerate().for_each(render_band);
        } else {
            out.data.chunks_exact_mut(band_size).enumerate().for_each(render_band);
        }
        true
    }

    /// Copie les tuiles d'une ligne de glyphes dans sa bande de pixels.
    #[inline]
    fn render_row(&self, row: &[char], band: &mut [u8], stride: usize) {
        let tile_stride = self.cell.width as usize * RGB_CHANNELS;
        for (gx, ch) in row.iter().enumerate() {
            let tile = self.tiles.get(ch).unwrap_or(&self.blank);
            let x0 = gx * tile_stride;
            for (cy, src) in tile.chunks_exact(tile_stride).enumerate() {
                let start = cy * stride + x0;
                band[start..start + tile_stride].copy_from_slice(src);
            }
        }
    }
}

/// Le glyphe intégré doit tenir dans la cellule : largeur, hampe au-dessus
/// de la ligne de base, descendante dans la marge.
fn check_fit(metrics: &BitmapMetrics, cell: &CellGeometry, scale: f32) -> Result<(), CoreError> {
    if metrics.width > cell.width || metrics.ascent > cell.baseline() || metrics.descent > cell.baseline_margin {
        return Err(CoreError::GeometryMismatch(format!(
            "glyphe {}x{} (ascent {}, descent {}) à l'échelle {scale} hors de la cellule {}x{} (marge {})",
            metrics.width,
            metrics.height,
            metrics.ascent,
            metrics.descent,
            cell.width,
            cell.height,
            cell.baseline_margin
        )));
    }
    Ok(())
}

/// `fg·α + bg·(1−α)`, entier, arrondi.
#[inline(always)]
fn blend(fg: u8, bg: u8, alpha: u8) -> u8 {
    let a = u32::from(alpha);
    ((u32::from(fg) * a + u32::from(bg) * (255 - a) + 127) / 255) as u8
}

fn tile_from_mask(mask: &[u8], fg: [u8; 3], bg: [u8; 3]) -> Vec<u8> {
    mask.iter()
        .flat_map(|&a| [blend(fg[0], bg[0], a), blend(fg[1], bg[1], a), blend(fg[2], bg[2], a)])
        .collect()
}

/// Max filter of radius `r` (square window), horizontal then vertical pass.
fn dilate(mask: &mut [u8], w: usize, h: usize, r: usize) {
    let mut tmp = vec![0u8; mask.len()];
    for y in 0..h {
        for x in 0..w {
            let lo = x.saturating_sub(r);
            let hi = (x + r).min(w - 1);
            tmp[y * w + x] = mask[y * w + lo..=y * w + hi].iter().copied().max().unwrap_or(0);
        }
    }
    for y in 0..h {
        let lo = y.saturating_sub(r);
        let hi = (y + r).min(h - 1);
        for x in 0..w {
            mask[y * w + x] = (lo..=hi).map(|yy| tmp[yy * w + x]).max().unwrap_or(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use gc_core::charset::{RAMP_DETAILED, RAMP_SIMPLE, RampOrder};

    use super::*;

    fn ramp(s: &str) -> GlyphRamp {
        GlyphRamp::new(s, RampOrder::SparseToDense).unwrap()
    }

    fn raster(glyphs: &str, font: &FontSpec, bg: [u8; 3]) -> Rasterizer {
        Rasterizer::new(&ramp(glyphs), CellGeometry::default(), font, bg, Parallelism::Sequential).unwrap()
    }

    fn frame_from(lines: &[&str]) -> GlyphFrame {
        let cols = lines[0].chars().count() as u32;
        let mut frame = GlyphFrame::new(cols, lines.len() as u32);
        for (r, line) in lines.iter().enumerate() {
            for (c, ch) in line.chars().enumerate() {
                frame.set(c as u32, r as u32, ch);
            }
        }
        frame
    }

    #[test]
    fn image_size_is_grid_times_cell() {
        let r = raster(RAMP_SIMPLE, &FontSpec::default(), [0, 0, 0]);
        for (cols, rows) in [(1, 1), (3, 2), (256, 106)] {
            let image = r.rasterize(&GlyphFrame::new(cols, rows)).unwrap();
            assert_eq!((image.width, image.height), (cols * 6, rows * 10));
            assert_eq!(image.data.len(), (cols * 6 * rows * 10 * 3) as usize);
        }
        assert_eq!(r.target_dimensions(256, 256), Some((1536, 2560)));
    }

    #[test]
    fn oversized_grids_have_no_target_dimensions() {
        let r = raster(RAMP_SIMPLE, &FontSpec::default(), [0, 0, 0]);
        assert_eq!(r.target_dimensions(u32::MAX / 6, 1), Some((u32::MAX / 6 * 6, 10)));
        assert_eq!(r.target_dimensions(u32::MAX / 6 + 1, 1), None);
        assert_eq!(r.target_dimensions(1, u32::MAX / 10 + 1), None);
    }

    #[test]
    fn empty_frames_produce_nothing() {
        let r = raster(RAMP_SIMPLE, &FontSpec::default(), [0, 0, 0]);
        assert!(r.rasterize(&GlyphFrame::new(0, 0)).is_none());
        assert!(r.rasterize(&GlyphFrame::new(5, 0)).is_none());
        assert!(r.rasterize(&GlyphFrame::new(0, 5)).is_none());
        let mut out = FrameBuffer::filled(2, 2, [7, 7, 7]);
        assert!(!r.rasterize_into(&GlyphFrame::new(3, 0), &mut out));
        assert_eq!(out, FrameBuffer::filled(2, 2, [7, 7, 7]));
    }

    #[test]
    fn blank_and_unknown_glyphs_render_background() {
        let bg = [10, 20, 30];
        let r = raster(" .#", &FontSpec::default(), bg);
        let image = r.rasterize(&frame_from(&["  ", "Q "])).unwrap();
        assert_eq!(image, FrameBuffer::filled(12, 20, bg));
    }

    #[test]
    fn ink_stays_inside_its_cell() {
        let r = raster(RAMP_DETAILED, &FontSpec::default(), [0, 0, 0]);
        let image = r.rasterize(&frame_from(&[" @ ", "   "])).unwrap();
        let mut inked = 0;
        for y in 0..image.height {
            for x in 0..image.width {
                if image.pixel(x, y) != [0, 0, 0] {
                    inked += 1;
                    assert!((6..12).contains(&x) && y < 10, "encre hors cellule en ({x}, {y})");
                }
            }
        }
        assert!(inked > 0);
    }

    #[test]
    fn glyphs_sit_on_the_baseline() {
        let r = raster(" _M", &FontSpec::default(), [0, 0, 0]);
        let baseline = CellGeometry::default().baseline() as usize;
        let mask = r.glyph_mask('M').unwrap();
        // M n'a pas de descendante : rien sous la ligne de base
        assert!(mask[baseline * 6..].iter().all(|&a| a == 0));
        let under = r.glyph_mask('_').unwrap();
        assert!(under[..baseline * 6].iter().all(|&a| a == 0));
        assert!(under[baseline * 6..].iter().any(|&a| a == 255));
    }

    #[test]
    fn colors_are_blended() {
        let font = FontSpec {
            color: [255, 0, 0],
            ..FontSpec::default()
        };
        let r = raster(" █", &font, [0, 0, 255]);
        let image = r.rasterize(&frame_from(&["█"])).unwrap();
        assert_eq!(image.pixel(0, 0), [255, 0, 0]);
        assert_eq!(image.pixel(5, 8), [255, 0, 0]);
        // dernière ligne de la cellule : sous la boîte du glyphe
        assert_eq!(image.pixel(0, 9), [0, 0, 255]);
        assert_eq!(blend(255, 0, 128), 128);
        assert_eq!(blend(200, 100, 0), 100);
        assert_eq!(blend(200, 100, 255), 200);
    }

    #[test]
    fn thickness_widens_strokes() {
        let thin = raster(" .", &FontSpec::default(), [0, 0, 0]);
        let bold = raster(
            " .",
            &FontSpec {
                thickness: 2,
                ..FontSpec::default()
            },
            [0, 0, 0],
        );
        let count = |r: &Rasterizer| r.glyph_mask('.').unwrap().iter().filter(|&&a| a > 0).count();
        assert!(count(&bold) > count(&thin));
        assert_eq!(bold.glyph_mask('.').unwrap().len(), 60);
    }

    #[test]
    fn oversized_glyphs_are_a_geometry_mismatch() {
        let font = FontSpec {
            scale: 0.5,
            ..FontSpec::default()
        };
        let err = Rasterizer::new(
            &ramp(RAMP_SIMPLE),
            CellGeometry::default(),
            &font,
            [0, 0, 0],
            Parallelism::Auto,
        )
        .err()
        .unwrap();
        assert!(matches!(err.downcast_ref::<CoreError>(), Some(CoreError::GeometryMismatch(_))));

        let big_cell = CellGeometry {
            width: 12,
            height: 20,
            baseline_margin: 2,
        };
        assert!(Rasterizer::new(&ramp(RAMP_SIMPLE), big_cell, &font, [0, 0, 0], Parallelism::Auto).is_ok());
    }

    #[test]
    fn invalid_cells_are_rejected() {
        let bad = CellGeometry {
            width: 6,
            height: 2,
            baseline_margin: 2,
        };
        assert!(
            Rasterizer::new(&ramp(RAMP_SIMPLE), bad, &FontSpec::default(), [0, 0, 0], Parallelism::Auto)
                .is_err()
        );
        let zero = CellGeometry {
            width: 0,
            height: 10,
            baseline_margin: 2,
        };
        assert!(
            Rasterizer::new(&ramp(RAMP_SIMPLE), zero, &FontSpec::default(), [0, 0, 0], Parallelism::Auto)
                .is_err()
        );
    }

    #[test]
    fn unsupported_glyphs_render_empty() {
        let r = raster(" λ", &FontSpec::default(), [0, 0, 0]);
        assert!(r.glyph_mask('λ').unwrap().iter().all(|&a| a == 0));
    }

    #[test]
    fn parallel_matches_sequential() {
        let glyphs: Vec<char> = RAMP_DETAILED.chars().collect();
        let mut frame = GlyphFrame::new(90, 40);
        for (i, cell) in frame.cells.iter_mut().enumerate() {
            *cell = glyphs[(i * 7) % glyphs.len()];
        }
        let seq = raster(RAMP_DETAILED, &FontSpec::default(), [0, 0, 0]);
        let par = Rasterizer::new(
            &ramp(RAMP_DETAILED),
            CellGeometry::default(),
            &FontSpec::default(),
            [0, 0, 0],
            Parallelism::Rows,
        )
        .unwrap();
        assert_eq!(seq.rasterize(&frame), par.rasterize(&frame));
    }

    #[test]
    fn output_buffer_is_reused_and_resized() {
        let r = raster(RAMP_SIMPLE, &FontSpec::default(), [0, 0, 0]);
        let mut out = FrameBuffer::new(0, 0);
        assert!(r.rasterize_into(&GlyphFrame::new(4, 4), &mut out));
        assert_eq!((out.width, out.height), (24, 40));
        assert!(r.rasterize_into(&GlyphFrame::new(2, 1), &mut out));
        assert_eq!((out.width, out.height), (12, 10));
    }
}
