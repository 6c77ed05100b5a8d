use crate::error::CoreError;

/// Bytes per pixel of a [`FrameBuffer`].
pub const RGB_CHANNELS: usize = 3;

/// Buffer de pixels RGB, row-major, 3 bytes par pixel.
///
/// Used for raw source frames and for the rendered glyph image alike.
///
/// # Example
/// ```
/// use gc_core::frame::FrameBuffer;
/// let fb = FrameBuffer::new(10, 10);
/// assert_eq!(fb.data.len(), 300);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    /// Pixels RGB, row-major, 3 bytes par pixel.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl FrameBuffer {
    /// Crée un buffer noir aux dimensions données.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![0u8; Self::byte_len(width, height)],
            width,
            height,
        }
    }

    /// Crée un buffer rempli d'une couleur uniforme.
    ///
    /// # Example
    /// ```
    /// use gc_core::frame::FrameBuffer;
    /// let fb = FrameBuffer::filled(2, 1, [1, 2, 3]);
    /// assert_eq!(fb.data, vec![1, 2, 3, 1, 2, 3]);
    /// ```
    #[must_use]
    pub fn filled(width: u32, height: u32, color: [u8; 3]) -> Self {
        let mut fb = Self::new(width, height);
        fb.fill(color);
        fb
    }

    /// Wrap an existing RGB buffer.
    ///
    /// # Errors
    /// Returns [`CoreError::BufferSize`] if `data.len() != width × height × 3`.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self, CoreError> {
        let expected = Self::byte_len(width, height);
        if data.len() != expected {
            return Err(CoreError::BufferSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Number of bytes needed for `width × height` RGB pixels.
    #[inline]
    #[must_use]
    pub fn byte_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * RGB_CHANNELS
    }

    /// True when the frame has no pixel.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Accès au pixel (x, y) → [r, g, b].
    #[inline(always)]
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        debug_assert!(x < self.width && y < self.height, "pixel out of bounds");
        let idx = (y as usize * self.width as usize + x as usize) * RGB_CHANNELS;
        match self.data.get(idx..idx + RGB_CHANNELS) {
            Some(p) => [p[0], p[1], p[2]],
            None => [0, 0, 0],
        }
    }

    /// Écrit le pixel (x, y). Hors limites : ignoré.
    #[inline(always)]
    pub fn put_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = (y as usize * self.width as usize + x as usize) * RGB_CHANNELS;
        self.data[idx..idx + RGB_CHANNELS].copy_from_slice(&rgb);
    }

    /// Overwrite every pixel with `rgb`.
    pub fn fill(&mut self, rgb: [u8; 3]) {
        for px in self.data.chunks_exact_mut(RGB_CHANNELS) {
            px.copy_from_slice(&rgb);
        }
    }

    /// Miroir horizontal en place (gauche ↔ droite).
    ///
    /// # Example
    /// ```
    /// use gc_core::frame::FrameBuffer;
    /// let mut fb = FrameBuffer::from_raw(2, 1, vec![1, 1, 1, 9, 9, 9]).unwrap();
    /// fb.mirror_horizontal();
    /// assert_eq!(fb.data, vec![9, 9, 9, 1, 1, 1]);
    /// ```
    pub fn mirror_horizontal(&mut self) {
        if self.is_empty() {
            return;
        }
        let w = self.width as usize;
        for row in self.data.chunks_exact_mut(w * RGB_CHANNELS) {
            for x in 0..w / 2 {
                let left = x * RGB_CHANNELS;
                let right = (w - 1 - x) * RGB_CHANNELS;
                for c in 0..RGB_CHANNELS {
                    row.swap(left + c, right + c);
                }
            }
        }
    }

    /// Luminance ITU-R BT.601 du pixel (x, y).
    ///
    /// # Example
    /// ```
    /// use gc_core::frame::FrameBuffer;
    /// let fb = FrameBuffer::filled(1, 1, [255, 255, 255]);
    /// assert_eq!(fb.luminance(0, 0), 255);
    /// ```
    #[inline(always)]
    #[must_use]
    pub fn luminance(&self, x: u32, y: u32) -> u8 {
        let [r, g, b] = self.pixel(x, y);
        bt601(r, g, b)
    }

    /// Convert to a freshly allocated grayscale frame.
    #[must_use]
    pub fn to_luma(&self) -> LumaFrame {
        let mut luma = LumaFrame::new(self.width, self.height);
        self.to_luma_into(&mut luma);
        luma
    }

    /// Convert into `out`, reallocating only when dimensions differ.
    pub fn to_luma_into(&self, out: &mut LumaFrame) {
        out.reshape(self.width, self.height);
        for (dst, px) in out.data.iter_mut().zip(self.data.chunks_exact(RGB_CHANNELS)) {
            *dst = bt601(px[0], px[1], px[2]);
        }
    }
}

/// Y = 0.299 R + 0.587 G + 0.114 B, entier, arrondi.
#[inline(always)]
fn bt601(r: u8, g: u8, b: u8) -> u8 {
    ((u32::from(r) * 299 + u32::from(g) * 587 + u32::from(b) * 114 + 500) / 1000) as u8
}

/// Image en niveaux de gris, 1 byte par échantillon.
///
/// Holds both the full-resolution grayscale frame and the resampled
/// luminance grid (one sample per glyph cell).
///
/// # Example
/// ```
/// use gc_core::frame::LumaFrame;
/// let grid = LumaFrame::filled(4, 3, 200);
/// assert_eq!(grid.get(3, 2), 200);
/// assert_eq!(grid.row(1).len(), 4);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LumaFrame {
    /// Samples, row-major.
    pub data: Vec<u8>,
    /// Width in samples (columns).
    pub width: u32,
    /// Height in samples (rows).
    pub height: u32,
}

impl LumaFrame {
    /// Black frame of the given size.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, 0)
    }

    /// Uniform frame of the given size.
    #[must_use]
    pub fn filled(width: u32, height: u32, value: u8) -> Self {
        Self {
            data: vec![value; width as usize * height as usize],
            width,
            height,
        }
    }

    /// Wrap an existing sample buffer.
    ///
    /// # Errors
    /// Returns [`CoreError::BufferSize`] if `data.len() != width × height`.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self, CoreError> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(CoreError::BufferSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// True when the frame has no sample.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Sample at (x, y).
    #[inline(always)]
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.data[y as usize * self.width as usize + x as usize]
    }

    /// Row `y` as a slice.
    #[inline]
    #[must_use]
    pub fn row(&self, y: u32) -> &[u8] {
        let w = self.width as usize;
        let start = y as usize * w;
        &self.data[start..start + w]
    }

    /// Resize the backing storage to `width × height` (contents unspecified).
    pub fn reshape(&mut self, width: u32, height: u32) {
        if self.width != width || self.height != height {
            self.data.resize(width as usize * height as usize, 0);
            self.width = width;
            self.height = height;
        }
    }
}

/// Grille de glyphes, une par cellule de la grille de luminance.
///
/// # Example
/// ```
/// use gc_core::frame::GlyphFrame;
/// let mut frame = GlyphFrame::new(3, 2);
/// frame.set(2, 1, '@');
/// assert_eq!(frame.get(2, 1), '@');
/// assert_eq!(frame.lines(), vec!["   ".to_string(), "  @".to_string()]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GlyphFrame {
    /// Flat array of glyphs, row-major.
    pub cells: Vec<char>,
    /// Width in glyphs.
    pub cols: u32,
    /// Height in glyphs.
    pub rows: u32,
}

impl GlyphFrame {
    /// Grille remplie d'espaces.
    #[must_use]
    pub fn new(cols: u32, rows: u32) -> Self {
        Self {
            cells: vec![' '; cols as usize * rows as usize],
            cols,
            rows,
        }
    }

    /// True for a frame with zero rows or zero columns ("nothing to render").
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cols == 0 || self.rows == 0
    }

    /// Glyph at column `col`, row `row`.
    #[inline(always)]
    #[must_use]
    pub fn get(&self, col: u32, row: u32) -> char {
        self.cells[row as usize * self.cols as usize + col as usize]
    }

    /// Set the glyph at column `col`, row `row`.
    #[inline(always)]
    pub fn set(&mut self, col: u32, row: u32, ch: char) {
        self.cells[row as usize * self.cols as usize + col as usize] = ch;
    }

    /// Row `row` as a slice.
    #[inline]
    #[must_use]
    pub fn row(&self, row: u32) -> &[char] {
        let w = self.cols as usize;
        let start = row as usize * w;
        &self.cells[start..start + w]
    }

    /// One `String` per row, top to bottom.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        if self.cols == 0 {
            return vec![String::new(); self.rows as usize];
        }
        self.cells
            .chunks_exact(self.cols as usize)
            .map(|row| row.iter().collect())
            .collect()
    }

    /// Resize the backing storage to `cols × rows` (contents unspecified).
    pub fn reshape(&mut self, cols: u32, rows: u32) {
        if self.cols != cols || self.rows != rows {
            self.cells.resize(cols as usize * rows as usize, ' ');
            self.cols = cols;
            self.rows = rows;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_checks_length() {
        assert!(FrameBuffer::from_raw(2, 2, vec![0; 12]).is_ok());
        assert_eq!(
            FrameBuffer::from_raw(2, 2, vec![0; 11]),
            Err(CoreError::BufferSize {
                expected: 12,
                actual: 11
            })
        );
        assert!(LumaFrame::from_raw(3, 1, vec![0; 2]).is_err());
    }

    #[test]
    fn grayscale_uses_bt601_weights() {
        let fb = FrameBuffer::from_raw(3, 1, vec![255, 0, 0, 0, 255, 0, 0, 0, 255]).unwrap();
        let luma = fb.to_luma();
        assert_eq!(luma.data, vec![76, 150, 29]);
        assert_eq!(FrameBuffer::filled(1, 1, [0, 0, 0]).to_luma().data, vec![0]);
        assert_eq!(FrameBuffer::filled(1, 1, [255, 255, 255]).to_luma().data, vec![255]);
    }

    #[test]
    fn mirror_odd_width_keeps_center() {
        let mut fb = FrameBuffer::from_raw(3, 1, vec![1, 1, 1, 5, 5, 5, 9, 9, 9]).unwrap();
        fb.mirror_horizontal();
        assert_eq!(fb.data, vec![9, 9, 9, 5, 5, 5, 1, 1, 1]);
        let mut empty = FrameBuffer::new(0, 4);
        empty.mirror_horizontal();
        assert!(empty.is_empty());
    }

    #[test]
    fn put_pixel_out_of_bounds_is_ignored() {
        let mut fb = FrameBuffer::new(2, 2);
        fb.put_pixel(5, 0, [255, 255, 255]);
        fb.put_pixel(1, 1, [7, 8, 9]);
        assert_eq!(fb.pixel(1, 1), [7, 8, 9]);
        assert_eq!(fb.data.iter().filter(|&&b| b != 0).count(), 3);
    }

    #[test]
    fn to_luma_into_reuses_and_reshapes() {
        let mut luma = LumaFrame::new(1, 1);
        FrameBuffer::filled(4, 2, [10, 10, 10]).to_luma_into(&mut luma);
        assert_eq!((luma.width, luma.height), (4, 2));
        assert!(luma.data.iter().all(|&v| v == 10));
    }

    #[test]
    fn glyph_frame_lines_and_empty() {
        let frame = GlyphFrame::new(0, 0);
        assert!(frame.is_empty());
        assert!(frame.lines().is_empty());
        let mut frame = GlyphFrame::new(2, 2);
        frame.set(0, 0, '#');
        assert_eq!(frame.row(0), &['#', ' ']);
        assert_eq!(frame.lines(), vec!["# ".to_string(), "  ".to_string()]);
    }
}
