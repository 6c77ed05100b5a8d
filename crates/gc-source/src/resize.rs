use anyhow::{Context, Result};
use fast_image_resize::images::{Image, ImageRef};
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer as FirResizer};
use gc_core::error::CoreError;
use gc_core::frame::LumaFrame;

/// Dimensions of the luminance grid, in cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridSize {
    /// Colonnes.
    pub cols: u32,
    /// Lignes.
    pub rows: u32,
}

impl GridSize {
    /// Compute the grid size for a `src_w × src_h` frame.
    ///
    /// With `rows = Some(n)` the grid is exactly `cols × n`. With `None`
    /// the rows preserve the source aspect, corrected by `compensation`:
    /// `rows = max(1, round(cols × src_h / src_w × compensation))`.
    ///
    /// # Errors
    /// [`CoreError::InvalidDimensions`] for `cols == 0`, `rows == Some(0)`
    /// or an empty source.
    ///
    /// # Example
    /// ```
    /// use gc_source::resize::GridSize;
    /// let grid = GridSize::resolve(640, 480, 256, None, 0.55).unwrap();
    /// assert_eq!((grid.cols, grid.rows), (256, 106));
    /// let fixed = GridSize::resolve(640, 480, 256, Some(256), 0.55).unwrap();
    /// assert_eq!(fixed.rows, 256);
    /// ```
    pub fn resolve(
        src_w: u32,
        src_h: u32,
        cols: u32,
        rows: Option<u32>,
        compensation: f32,
    ) -> Result<Self, CoreError> {
        if cols == 0 || rows == Some(0) {
            return Err(CoreError::InvalidDimensions {
                width: cols,
                height: rows.unwrap_or(0),
            });
        }
        if src_w == 0 || src_h == 0 {
            return Err(CoreError::InvalidDimensions {
                width: src_w,
                height: src_h,
            });
        }
        let rows = match rows {
            Some(n) => n,
            None => {
                let exact = f64::from(cols) * f64::from(src_h) / f64::from(src_w)
                    * f64::from(compensation);
                (exact.round() as u32).max(1)
            }
        };
        Ok(Self { cols, rows })
    }

    /// Nombre total de cellules.
    #[must_use]
    pub fn cells(&self) -> usize {
        self.cols as usize * self.rows as usize
    }
}

/// Area-averaging resampler for grayscale frames.
///
/// Wraps a reusable `fast_image_resize` resizer (box convolution) so the
/// per-frame path allocates nothing once sizes are stable.
///
/// # Example
/// ```
/// use gc_core::frame::LumaFrame;
/// use gc_source::resize::Resampler;
/// let mut r = Resampler::new();
/// let grid = r.resample(&LumaFrame::filled(64, 48, 90), 16, Some(8), 0.55).unwrap();
/// assert_eq!((grid.width, grid.height), (16, 8));
/// ```
pub struct Resampler {
    inner: FirResizer,
    options: ResizeOptions,
}

impl Resampler {
    /// Create a resampler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: FirResizer::new(),
            options: ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Box)),
        }
    }

    /// Resample `src` into `dst`; the dimensions of `dst` decide the grid.
    ///
    /// # Errors
    /// Returns an error if either frame is empty or the resize fails.
    pub fn resample_into(&mut self, src: &LumaFrame, dst: &mut LumaFrame) -> Result<()> {
        if src.is_empty() {
            return Err(CoreError::InvalidDimensions {
                width: src.width,
                height: src.height,
            }
            .into());
        }
        if dst.is_empty() {
            return Err(CoreError::InvalidDimensions {
                width: dst.width,
                height: dst.height,
            }
            .into());
        }
        if src.width == dst.width && src.height == dst.height {
            dst.data.copy_from_slice(&src.data);
            return Ok(());
        }

        let src_image = ImageRef::new(src.width, src.height, &src.data, PixelType::U8)
            .context("Dimensions source invalides")?;
        let mut dst_image =
            Image::from_slice_u8(dst.width, dst.height, &mut dst.data, PixelType::U8)
                .context("Dimensions destination invalides")?;

        self.inner
            .resize(&src_image, &mut dst_image, Some(&self.options))
            .context("Échec du rééchantillonnage")?;
        Ok(())
    }

    /// Resolve the grid size for `src` and resample into a new frame.
    ///
    /// # Errors
    /// See [`GridSize::resolve`] and [`Resampler::resample_into`].
    pub fn resample(
        &mut self,
        src: &LumaFrame,
        cols: u32,
        rows: Option<u32>,
        compensation: f32,
    ) -> Result<LumaFrame> {
        let grid = GridSize::resolve(src.width, src.height, cols, rows, compensation)?;
        let mut dst = LumaFrame::new(grid.cols, grid.rows);
        self.resample_into(src, &mut dst)?;
        Ok(dst)
    }
}

impl Default for Resampler {
    fn default() -> Self {
        Self::new()
    }
}
