//! Police bitmap 8×8 intégrée (ASCII imprimable, 0x20..=0x7E).
//!
//! Chaque glyphe est 8 lignes de 8 bits, MSB = pixel de gauche. La ligne 7
//! est réservée aux descendantes : la ligne de base passe entre 6 et 7.

/// Hauteur de corps de référence : `scale = 1.0` donne 30 px.
pub use gc_core::config::FONT_EM_PX as EM_PX;

/// Ligne du bitmap qui porte les descendantes.
const DESCENDER_ROW: usize = 7;

/// Glyphes 0x20..=0x7E.
const GLYPHS: [[u8; 8]; 95] = [
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00], // ' '
    [0x18, 0x3C, 0x3C, 0x18, 0x18, 0x00, 0x18, 0x00], // '!'
    [0x6C, 0x6C, 0x24, 0x00, 0x00, 0x00, 0x00, 0x00], // '"'
    [0x6C, 0x6C, 0xFE, 0x6C, 0xFE, 0x6C, 0x6C, 0x00], // '#'
    [0x18, 0x3E, 0x60, 0x3C, 0x06, 0x7C, 0x18, 0x00], // '$'
    [0x00, 0xC6, 0xCC, 0x18, 0x30, 0x66, 0xC6, 0x00], // '%'
    [0x38, 0x6C, 0x38, 0x76, 0xDC, 0xCC, 0x76, 0x00], // '&'
    [0x18, 0x18, 0x30, 0x00, 0x00, 0x00, 0x00, 0x00], // '\''
    [0x0C, 0x18, 0x30, 0x30, 0x30, 0x18, 0x0C, 0x00], // '('
    [0x30, 0x18, 0x0C, 0x0C, 0x0C, 0x18, 0x30, 0x00], // ')'
    [0x00, 0x66, 0x3C, 0xFF, 0x3C, 0x66, 0x00, 0x00], // '*'
    [0x00, 0x18, 0x18, 0x7E, 0x18, 0x18, 0x00, 0x00], // '+'
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x18, 0x18, 0x30], // ','
    [0x00, 0x00, 0x00, 0x7E, 0x00, 0x00, 0x00, 0x00], // '-'
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x18, 0x18, 0x00], // '.'
    [0x06, 0x0C, 0x18, 0x30, 0x60, 0xC0, 0x80, 0x00], // '/'
    [0x3C, 0x66, 0x6E, 0x76, 0x66, 0x66, 0x3C, 0x00], // '0'
    [0x18, 0x38, 0x18, 0x18, 0x18, 0x18, 0x7E, 0x00], // '1'
    [0x3C, 0x66, 0x06, 0x0C, 0x18, 0x30, 0x7E, 0x00], // '2'
    [0x3C, 0x66, 0x06, 0x1C, 0x06, 0x66, 0x3C, 0x00], // '3'
    [0x0C, 0x1C, 0x3C, 0x6C, 0x7E, 0x0C, 0x0C, 0x00], // '4'
    [0x7E, 0x60, 0x7C, 0x06, 0x06, 0x66, 0x3C, 0x00], // '5'
    [0x1C, 0x30, 0x60, 0x7C, 0x66, 0x66, 0x3C, 0x00], // '6'
    [0x7E, 0x06, 0x0C, 0x18, 0x30, 0x30, 0x30, 0x00], // '7'
    [0x3C, 0x66, 0x66, 0x3C, 0x66, 0x66, 0x3C, 0x00], // '8'
    [0x3C, 0x66, 0x66, 0x3E, 0x06, 0x0C, 0x38, 0x00], // '9'
    [0x00, 0x18, 0x18, 0x00, 0x18, 0x18, 0x00, 0x00], // ':'
    [0x00, 0x18, 0x18, 0x00, 0x18, 0x18, 0x30, 0x00], // ';'
    [0x0C, 0x18, 0x30, 0x60, 0x30, 0x18, 0x0C, 0x00], // '<'
    [0x00, 0x00, 0x7E, 0x00, 0x7E, 0x00, 0x00, 0x00], // '='
    [0x30, 0x18, 0x0C, 0x06, 0x0C, 0x18, 0x30, 0x00], // '>'
    [0x3C, 0x66, 0x0C, 0x18, 0x18, 0x00, 0x18, 0x00], // '?'
    [0x3C, 0x66, 0x6E, 0x6E, 0x60, 0x62, 0x3C, 0x00], // '@'
    [0x3C, 0x66, 0x66, 0x7E, 0x66, 0x66, 0x66, 0x00], // 'A'
    [0x7C, 0x66, 0x66, 0x7C, 0x66, 0x66, 0x7C, 0x00], // 'B'
    [0x3C, 0x66, 0x60, 0x60, 0x60, 0x66, 0x3C, 0x00], // 'C'
    [0x78, 0x6C, 0x66, 0x66, 0x66, 0x6C, 0x78, 0x00], // 'D'
    [0x7E, 0x60, 0x60, 0x7C, 0x60, 0x60, 0x7E, 0x00], // 'E'
    [0x7E, 0x60, 0x60, 0x7C, 0x60, 0x60, 0x60, 0x00], // 'F'
    [0x3C, 0x66, 0x60, 0x6E, 0x66, 0x66, 0x3C, 0x00], // 'G'
    [0x66, 0x66, 0x66, 0x7E, 0x66, 0x66, 0x66, 0x00], // 'H'
    [0x7E, 0x18, 0x18, 0x18, 0x18, 0x18, 0x7E, 0x00], // 'I'
    [0x1E, 0x0C, 0x0C, 0x0C, 0x0C, 0x6C, 0x38, 0x00], // 'J'
    [0x66, 0x6C, 0x78, 0x70, 0x78, 0x6C, 0x66, 0x00], // 'K'
    [0x60, 0x60, 0x60, 0x60, 0x60, 0x60, 0x7E, 0x00], // 'L'
    [0x63, 0x77, 0x7F, 0x6B, 0x63, 0x63, 0x63, 0x00], // 'M'
    [0x66, 0x76, 0x7E, 0x7E, 0x6E, 0x66, 0x66, 0x00], // 'N'
    [0x3C, 0x66, 0x66, 0x66, 0x66, 0x66, 0x3C, 0x00], // 'O'
    [0x7C, 0x66, 0x66, 0x7C, 0x60, 0x60, 0x60, 0x00], // 'P'
    [0x3C, 0x66, 0x66, 0x66, 0x6A, 0x6C, 0x36, 0x00], // 'Q'
    [0x7C, 0x66, 0x66, 0x7C, 0x6C, 0x66, 0x66, 0x00], // 'R'
    [0x3C, 0x66, 0x60, 0x3C, 0x06, 0x66, 0x3C, 0x00], // 'S'
    [0x7E, 0x18, 0x18, 0x18, 0x18, 0x18, 0x18, 0x00], // 'T'
    [0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x3C, 0x00], // 'U'
    [0x66, 0x66, 0x66, 0x66, 0x66, 0x3C, 0x18, 0x00], // 'V'
    [0x63, 0x63, 0x63, 0x6B, 0x7F, 0x77, 0x63, 0x00], // 'W'
    [0x66, 0x66, 0x3C, 0x18, 0x3C, 0x66, 0x66, 0x00], // 'X'
    [0x66, 0x66, 0x66, 0x3C, 0x18, 0x18, 0x18, 0x00], // 'Y'
    [0x7E, 0x06, 0x0C, 0x18, 0x30, 0x60, 0x7E, 0x00], // 'Z'
    [0x3C, 0x30, 0x30, 0x30, 0x30, 0x30, 0x3C, 0x00], // '['
    [0xC0, 0x60, 0x30, 0x18, 0x0C, 0x06, 0x02, 0x00], // '\\'
    [0x3C, 0x0C, 0x0C, 0x0C, 0x0C, 0x0C, 0x3C, 0x00], // ']'
    [0x10, 0x38, 0x6C, 0xC6, 0x00, 0x00, 0x00, 0x00], // '^'
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF], // '_'
    [0x30, 0x18, 0x0C, 0x00, 0x00, 0x00, 0x00, 0x00], // '`'
    [0x00, 0x00, 0x3C, 0x06, 0x3E, 0x66, 0x3E, 0x00], // 'a'
    [0x60, 0x60, 0x7C, 0x66, 0x66, 0x66, 0x7C, 0x00], // 'b'
    [0x00, 0x00, 0x3C, 0x66, 0x60, 0x66, 0x3C, 0x00], // 'c'
    [0x06, 0x06, 0x3E, 0x66, 0x66, 0x66, 0x3E, 0x00], // 'd'
    [0x00, 0x00, 0x3C, 0x66, 0x7E, 0x60, 0x3C, 0x00], // 'e'
    [0x1C, 0x30, 0x30, 0x7C, 0x30, 0x30, 0x30, 0x00], // 'f'
    [0x00, 0x00, 0x3E, 0x66, 0x66, 0x3E, 0x06, 0x3C], // 'g'
    [0x60, 0x60, 0x7C, 0x66, 0x66, 0x66, 0x66, 0x00], // 'h'
    [0x18, 0x00, 0x38, 0x18, 0x18, 0x18, 0x3C, 0x00], // 'i'
    [0x0C, 0x00, 0x1C, 0x0C, 0x0C, 0x0C, 0x6C, 0x38], // 'j'
    [0x60, 0x60, 0x66, 0x6C, 0x78, 0x6C, 0x66, 0x00], // 'k'
    [0x38, 0x18, 0x18, 0x18, 0x18, 0x18, 0x3C, 0x00], // 'l'
    [0x00, 0x00, 0x76, 0x7F, 0x6B, 0x6B, 0x63, 0x00], // 'm'
    [0x00, 0x00, 0x7C, 0x66, 0x66, 0x66, 0x66, 0x00], // 'n'
    [0x00, 0x00, 0x3C, 0x66, 0x66, 0x66, 0x3C, 0x00], // 'o'
    [0x00, 0x00, 0x7C, 0x66, 0x66, 0x7C, 0x60, 0x60], // 'p'
    [0x00, 0x00, 0x3E, 0x66, 0x66, 0x3E, 0x06, 0x06], // 'q'
    [0x00, 0x00, 0x6E, 0x70, 0x60, 0x60, 0x60, 0x00], // 'r'
    [0x00, 0x00, 0x3E, 0x60, 0x3C, 0x06, 0x7C, 0x00], // 's'
    [0x30, 0x30, 0x7C, 0x30, 0x30, 0x30, 0x1C, 0x00], // 't'
    [0x00, 0x00, 0x66, 0x66, 0x66, 0x66, 0x3E, 0x00], // 'u'
    [0x00, 0x00, 0x66, 0x66, 0x66, 0x3C, 0x18, 0x00], // 'v'
    [0x00, 0x00, 0x63, 0x6B, 0x6B, 0x7F, 0x36, 0x00], // 'w'
    [0x00, 0x00, 0x66, 0x3C, 0x18, 0x3C, 0x66, 0x00], // 'x'
    [0x00, 0x00, 0x66, 0x66, 0x66, 0x3E, 0x06, 0x3C], // 'y'
    [0x00, 0x00, 0x7E, 0x0C, 0x18, 0x30, 0x7E, 0x00], // 'z'
    [0x0E, 0x18, 0x18, 0x70, 0x18, 0x18, 0x0E, 0x00], // '{'
    [0x18, 0x18, 0x18, 0x00, 0x18, 0x18, 0x18, 0x00], // '|'
    [0x70, 0x18, 0x18, 0x0E, 0x18, 0x18, 0x70, 0x00], // '}'
    [0x76, 0xDC, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00], // '~'
];

/// Bitmap rows of `ch`, `None` outside printable ASCII.
///
/// # Example
/// ```
/// use gc_raster::bitmap::glyph_rows;
/// assert_eq!(glyph_rows(' '), Some([0; 8]));
/// assert!(glyph_rows('é').is_none());
/// ```
#[must_use]
pub fn glyph_rows(ch: char) -> Option<[u8; 8]> {
    let code = u32::from(ch);
    if (0x20..=0x7E).contains(&code) {
        Some(GLYPHS[(code - 0x20) as usize])
    } else {
        None
    }
}

/// Couverture uniforme des caractères de trame.
#[must_use]
pub fn shade_coverage(ch: char) -> Option<u8> {
    match ch {
        '░' => Some(64),
        '▒' => Some(128),
        '▓' => Some(191),
        '█' => Some(255),
        _ => None,
    }
}

/// Pixel size of the built-in glyph box at a given scale.
///
/// The 8×8 bitmap is sampled at pixel centres (nearest neighbour).
/// `ascent` counts the pixel rows above the baseline, `descent` those below.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BitmapMetrics {
    pub width: u32,
    pub height: u32,
    pub ascent: u32,
    pub descent: u32,
}

impl BitmapMetrics {
    /// Metrics for `scale` (`height = round(scale × 30)`, `width = round(height × 2/3)`).
    ///
    /// # Example
    /// ```
    /// use gc_raster::bitmap::BitmapMetrics;
    /// let m = BitmapMetrics::for_scale(0.3);
    /// assert_eq!((m.width, m.height, m.ascent, m.descent), (6, 9, 8, 1));
    /// ```
    #[must_use]
    pub fn for_scale(scale: f32) -> Self {
        let height = ((scale * EM_PX).round() as u32).max(1);
        let width = ((height as f32 * 2.0 / 3.0).round() as u32).max(1);
        let ascent = (0..height)
            .filter(|&gy| source_row(gy, height) < DESCENDER_ROW)
            .count() as u32;
        Self {
            width,
            height,
            ascent,
            descent: height - ascent,
        }
    }
}

/// Ligne du bitmap échantillonnée par la ligne de pixels `gy`.
#[inline]
fn source_row(gy: u32, height: u32) -> usize {
    ((2 * gy + 1) * 8 / (2 * height)) as usize
}

#[inline]
fn source_col(gx: u32, width: u32) -> u32 {
    (2 * gx + 1) * 8 / (2 * width)
}

/// Draw `ch` into a `stride`-wide alpha mask with the glyph box top-left at
/// (`left`, `top`). Pixels falling outside the mask are dropped.
///
/// Returns `false` when the font has no shape for `ch` (nothing drawn).
pub fn draw_glyph(
    ch: char,
    metrics: &BitmapMetrics,
    mask: &mut [u8],
    stride: u32,
    left: u32,
    top: u32,
) -> bool {
    let rows_in_mask = if stride == 0 { 0 } else { mask.len() as u32 / stride };
    let mut plot = |gx: u32, gy: u32, alpha: u8| {
        let (x, y) = (left + gx, top + gy);
        if x < stride && y < rows_in_mask {
            let idx = (y * stride + x) as usize;
            mask[idx] = mask[idx].max(alpha);
        }
    };

    if let Some(alpha) = shade_coverage(ch) {
        for gy in 0..metrics.height {
            for gx in 0..metrics.width {
                plot(gx, gy, alpha);
            }
        }
        return true;
    }

    let Some(rows) = glyph_rows(ch) else {
        return false;
    };
    for gy in 0..metrics.height {
        let bits = rows[source_row(gy, metrics.height)];
        for gx in 0..metrics.width {
            if bits & (0x80 >> source_col(gx, metrics.width)) != 0 {
                plot(gx, gy, 255);
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_covers_printable_ascii() {
        for code in 0x20u8..=0x7E {
            assert!(glyph_rows(char::from(code)).is_some());
        }
        assert!(glyph_rows('\u{7f}').is_none());
        assert_eq!(glyph_rows('_').map(|r| r[7]), Some(0xFF));
    }

    #[test]
    fn metrics_scale_with_font_size() {
        let unit = BitmapMetrics::for_scale(8.0 / EM_PX);
        assert_eq!((unit.width, unit.height, unit.ascent, unit.descent), (5, 8, 7, 1));
        let big = BitmapMetrics::for_scale(1.0);
        assert_eq!((big.width, big.height), (20, 30));
        assert_eq!(big.ascent + big.descent, 30);
        assert!(big.descent >= 3);
        let tiny = BitmapMetrics::for_scale(0.01);
        assert_eq!((tiny.width, tiny.height), (1, 1));
    }

    #[test]
    fn identity_scale_reproduces_bitmap() {
        let metrics = BitmapMetrics {
            width: 8,
            height: 8,
            ascent: 7,
            descent: 1,
        };
        let mut mask = vec![0u8; 64];
        assert!(draw_glyph('+', &metrics, &mut mask, 8, 0, 0));
        let rows = glyph_rows('+').unwrap_or_default();
        for y in 0..8 {
            for x in 0..8 {
                let on = rows[y] & (0x80 >> x) != 0;
                assert_eq!(mask[y * 8 + x] == 255, on, "({x}, {y})");
            }
        }
    }

    #[test]
    fn shades_are_uniform() {
        let metrics = BitmapMetrics::for_scale(0.3);
        let mut mask = vec![0u8; 6 * 10];
        assert!(draw_glyph('▒', &metrics, &mut mask, 6, 0, 0));
        assert!(mask[..6 * 9].iter().all(|&a| a == 128));
        assert!(mask[6 * 9..].iter().all(|&a| a == 0));
    }

    #[test]
    fn unknown_glyph_draws_nothing() {
        let metrics = BitmapMetrics::for_scale(0.3);
        let mut mask = vec![0u8; 60];
        assert!(!draw_glyph('λ', &metrics, &mut mask, 6, 0, 0));
        assert!(mask.iter().all(|&a| a == 0));
    }

    #[test]
    fn drawing_is_clipped_to_the_mask() {
        let metrics = BitmapMetrics::for_scale(1.0);
        let mut mask = vec![0u8; 4 * 4];
        assert!(draw_glyph('█', &metrics, &mut mask, 4, 2, 2));
        assert_eq!(mask.iter().filter(|&&a| a == 255).count(), 4);
    }
}
