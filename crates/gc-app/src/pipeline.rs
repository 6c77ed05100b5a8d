use anyhow::{Context, Result};
use gc_core::charset::LuminanceLut;
use gc_core::config::{GlyphcastConfig, Parallelism};
use gc_core::error::CoreError;
use gc_core::frame::{FrameBuffer, GlyphFrame, LumaFrame};
use gc_raster::Rasterizer;
use gc_source::{GridSize, Resampler};

/// Result of one transform, borrowed from the pipeline's reusable buffers.
#[derive(Clone, Copy, Debug)]
pub struct FrameOutput<'a> {
    /// Glyph frame of this cycle.
    pub glyphs: &'a GlyphFrame,
    /// Rendered image; `None` means nothing to display this cycle.
    pub image: Option<&'a FrameBuffer>,
}

/// Transformation par frame : grayscale → grille → glyphes → image.
///
/// Everything derived from the configuration (ramp LUT, resampler, glyph
/// atlas) is built once in [`AsciiPipeline::new`]. The intermediate
/// buffers are kept between calls and only reallocated when a frame size
/// changes; no frame content survives from one call to the next.
pub struct AsciiPipeline {
    lut: LuminanceLut,
    resampler: Resampler,
    rasterizer: Rasterizer,
    cols: u32,
    rows: Option<u32>,
    compensation: f32,
    parallelism: Parallelism,
    gray: LumaFrame,
    grid: LumaFrame,
    glyphs: GlyphFrame,
    image: FrameBuffer,
}

impl AsciiPipeline {
    /// Validate `config` and prepare every stage.
    ///
    /// # Errors
    /// Returns the first configuration problem (invalid ramp, zero grid
    /// size, cell geometry mismatch, unreadable font).
    pub fn new(config: &GlyphcastConfig) -> Result<Self> {
        config.validate().context("Configuration rejetée")?;
        let ramp = config.ramp.build()?;
        let rasterizer = Rasterizer::new(
            &ramp,
            config.cell,
            &config.font,
            config.background,
            config.parallelism,
        )?;
        let compensation = config.grid.aspect_compensation.resolve(&config.cell);

        log::info!(
            "Pipeline : {} colonnes × {} lignes, rampe de {} glyphes ({:?}), cellule {}×{}, compensation {compensation:.2}",
            config.grid.cols,
            config.grid.rows.explicit().map_or_else(|| "auto".to_string(), |r| r.to_string()),
            ramp.len(),
            config.ramp.order,
            config.cell.width,
            config.cell.height,
        );

        Ok(Self {
            lut: LuminanceLut::new(&ramp),
            resampler: Resampler::new(),
            rasterizer,
            cols: config.grid.cols,
            rows: config.grid.rows.explicit(),
            compensation,
            parallelism: config.parallelism,
            gray: LumaFrame::new(0, 0),
            grid: LumaFrame::new(0, 0),
            glyphs: GlyphFrame::new(0, 0),
            image: FrameBuffer::new(0, 0),
        })
    }

    /// Transform one RGB frame.
    ///
    /// A zero-sized frame yields an empty glyph frame and no image.
    ///
    /// # Errors
    /// Returns an error if resampling fails or the derived image size does
    /// not fit in `u32`.
    pub fn process(&mut self, frame: &FrameBuffer) -> Result<FrameOutput<'_>> {
        let mut gray = std::mem::replace(&mut self.gray, LumaFrame::new(0, 0));
        frame.to_luma_into(&mut gray);
        let rendered = self.run_stages(&gray);
        self.gray = gray;
        Ok(self.output(rendered?))
    }

    /// Transform a frame that is already grayscale.
    ///
    /// # Errors
    /// Same as [`AsciiPipeline::process`].
    pub fn process_luma(&mut self, luma: &LumaFrame) -> Result<FrameOutput<'_>> {
        let rendered = self.run_stages(luma)?;
        Ok(self.output(rendered))
    }

    fn run_stages(&mut self, luma: &LumaFrame) -> Result<bool> {
        if luma.is_empty() {
            self.glyphs.reshape(0, 0);
            return Ok(false);
        }
        let size = GridSize::resolve(luma.width, luma.height, self.cols, self.rows, self.compensation)?;
        if self.rasterizer.target_dimensions(size.cols, size.rows).is_none() {
            return Err(CoreError::InvalidDimensions {
                width: size.cols,
                height: size.rows,
            })
            .with_context(|| format!("source {}x{} : image hors limites", luma.width, luma.height));
        }
        self.grid.reshape(size.cols, size.rows);
        self.resampler.resample_into(luma, &mut self.grid)?;
        gc_ascii::build_into(&self.grid, &self.lut, self.parallelism, &mut self.glyphs);
        Ok(self.rasterizer.rasterize_into(&self.glyphs, &mut self.image))
    }

    fn output(&self, rendered: bool) -> FrameOutput<'_> {
        FrameOutput {
            glyphs: &self.glyphs,
            image: rendered.then_some(&self.image),
        }
    }
}

#[cfg(test)]
mod tests {
    use gc_core::config::{AspectCompensation, Auto, CellGeometry, Rows};
    use gc_source::{PatternKind, PatternSource};

    use super::*;

    fn small_config(cols: u32, rows: u32) -> GlyphcastConfig {
        let mut config = GlyphcastConfig::default();
        config.grid.cols = cols;
        config.grid.rows = Rows::Count(rows);
        config.ramp.glyphs = " .:-=+*#%@".into();
        config
    }

    #[test]
    fn black_and_white_frames_hit_the_ramp_ends() {
        let mut pipeline = AsciiPipeline::new(&small_config(16, 8)).unwrap();

        let out = pipeline.process(&FrameBuffer::filled(64, 48, [0, 0, 0])).unwrap();
        assert_eq!((out.glyphs.cols, out.glyphs.rows), (16, 8));
        assert!(out.glyphs.cells.iter().all(|&c| c == ' '));
        let image = out.image.unwrap();
        assert_eq!((image.width, image.height), (96, 80));
        assert!(image.data.iter().all(|&b| b == 0));

        let out = pipeline.process(&FrameBuffer::filled(64, 48, [255, 255, 255])).unwrap();
        assert!(out.glyphs.cells.iter().all(|&c| c == '@'));
        assert!(out.image.unwrap().data.iter().any(|&b| b == 255));
    }

    #[test]
    fn aspect_preserving_mode_derives_rows() {
        let mut config = small_config(256, 1);
        config.grid.rows = Rows::Derived(Auto::Auto);
        let mut pipeline = AsciiPipeline::new(&config).unwrap();
        let out = pipeline.process(&FrameBuffer::filled(640, 480, [90, 90, 90])).unwrap();
        assert_eq!((out.glyphs.cols, out.glyphs.rows), (256, 106));
        let image = out.image.unwrap();
        assert_eq!((image.width, image.height), (256 * 6, 106 * 10));
    }

    #[test]
    fn derived_rows_beyond_image_limits_are_an_error() {
        let mut config = small_config(1000, 1);
        config.grid.rows = Rows::Derived(Auto::Auto);
        config.grid.aspect_compensation = AspectCompensation::Factor(4.0);
        let mut pipeline = AsciiPipeline::new(&config).unwrap();

        let err = pipeline.process_luma(&LumaFrame::new(1, 2_000_000)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CoreError>(),
            Some(CoreError::InvalidDimensions { width: 1000, .. })
        ));

        let out = pipeline.process_luma(&LumaFrame::new(8000, 100)).unwrap();
        assert_eq!((out.glyphs.cols, out.glyphs.rows), (1000, 50));
        assert!(out.image.is_some());
    }

    #[test]
    fn derived_compensation_follows_cell_geometry() {
        let mut config = small_config(60, 1);
        config.grid.rows = Rows::Derived(Auto::Auto);
        config.grid.aspect_compensation = AspectCompensation::Derived(Auto::Auto);
        config.cell = CellGeometry {
            width: 6,
            height: 12,
            baseline_margin: 2,
        };
        config.font.scale = 0.3;
        let mut pipeline = AsciiPipeline::new(&config).unwrap();
        // 60 × 100/100 × 0.5
        let out = pipeline.process_luma(&LumaFrame::filled(100, 100, 10)).unwrap();
        assert_eq!(out.glyphs.rows, 30);
    }

    #[test]
    fn zero_sized_frame_gives_empty_output() {
        let mut pipeline = AsciiPipeline::new(&small_config(16, 8)).unwrap();
        let out = pipeline.process(&FrameBuffer::new(0, 0)).unwrap();
        assert!(out.glyphs.is_empty());
        assert!(out.image.is_none());
    }

    #[test]
    fn invalid_configuration_is_rejected_up_front() {
        assert!(AsciiPipeline::new(&small_config(0, 8)).is_err());
        let mut config = small_config(16, 8);
        config.ramp.glyphs = "#".into();
        assert!(AsciiPipeline::new(&config).is_err());
        let mut config = small_config(16, 8);
        config.cell.baseline_margin = 10;
        assert!(AsciiPipeline::new(&config).is_err());
    }

    #[test]
    fn same_frame_twice_gives_identical_output() {
        let source = PatternSource::new(PatternKind::Rings, 160, 120);
        let frame = source.render(7);
        let mut pipeline = AsciiPipeline::new(&small_config(40, 20)).unwrap();
        let first = {
            let out = pipeline.process(&frame).unwrap();
            (out.glyphs.clone(), out.image.cloned())
        };
        let out = pipeline.process(&frame).unwrap();
        assert_eq!(&first.0, out.glyphs);
        assert_eq!(first.1.as_ref(), out.image);
        assert!(first.0.cells.iter().collect::<std::collections::HashSet<_>>().len() > 2);
    }
}
