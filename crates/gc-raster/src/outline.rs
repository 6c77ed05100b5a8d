use std::path::Path;

use ab_glyph::{Font, FontVec, PxScale, ScaleFont, point};
use anyhow::{Context, Result};

use crate::bitmap::EM_PX;

/// Police TrueType/OpenType chargée depuis le disque, rendue via ab_glyph.
pub struct OutlineFont {
    font: FontVec,
    scale: PxScale,
}

impl OutlineFont {
    /// Load `path` at `scale` (`scale × 30` px per em).
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not a valid font.
    pub fn load(path: &Path, scale: f32) -> Result<Self> {
        let data = std::fs::read(path)
            .with_context(|| format!("Impossible de lire la police {}", path.display()))?;
        let font = FontVec::try_from_vec(data)
            .with_context(|| format!("Police invalide : {}", path.display()))?;
        log::info!("Police chargée : {} ({} glyphes)", path.display(), font.glyph_count());
        Ok(Self {
            font,
            scale: PxScale::from(scale * EM_PX),
        })
    }

    /// True when the font has a real glyph (not `.notdef`) for `ch`.
    #[must_use]
    pub fn has_glyph(&self, ch: char) -> bool {
        ch == ' ' || self.font.glyph_id(ch).0 != 0
    }

    /// `(ascent, descent)` in pixels, both positive.
    #[must_use]
    pub fn vertical_metrics(&self) -> (f32, f32) {
        let scaled = self.font.as_scaled(self.scale);
        (scaled.ascent(), -scaled.descent())
    }

    /// Draw `ch` with its origin at (`origin_x`, `baseline`) into a
    /// `stride`-wide alpha mask.
    ///
    /// Returns the number of covered pixels that fell outside the mask,
    /// `None` if the font has no glyph for `ch`.
    pub fn draw_glyph(
        &self,
        ch: char,
        mask: &mut [u8],
        stride: u32,
        origin_x: f32,
        baseline: f32,
    ) -> Option<usize> {
        if !self.has_glyph(ch) {
            return None;
        }
        let rows = if stride == 0 { 0 } else { mask.len() as u32 / stride };
        let glyph = self
            .font
            .glyph_id(ch)
            .with_scale_and_position(self.scale, point(origin_x, baseline));
        let Some(outline) = self.font.outline_glyph(glyph) else {
            // espace et glyphes sans contour
            return Some(0);
        };
        let bounds = outline.px_bounds();
        let mut clipped = 0usize;
        #[allow(clippy::cast_possible_wrap)]
        outline.draw(|x, y, v| {
            let alpha = (v.clamp(0.0, 1.0) * 255.0).round() as u8;
            if alpha == 0 {
                return;
            }
            let px = x as i32 + bounds.min.x as i32;
            let py = y as i32 + bounds.min.y as i32;
            if px < 0 || py < 0 || px as u32 >= stride || py as u32 >= rows {
                clipped += 1;
                return;
            }
            let idx = (py as u32 * stride + px as u32) as usize;
            mask[idx] = mask[idx].max(alpha);
        });
        Some(clipped)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn missing_font_file_is_an_error() {
        assert!(OutlineFont::load(Path::new("/nonexistent/font.ttf"), 0.3).is_err());
    }

    #[test]
    fn garbage_bytes_are_not_a_font() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"definitely not a truetype file").unwrap();
        assert!(OutlineFont::load(file.path(), 0.3).is_err());
    }
}
