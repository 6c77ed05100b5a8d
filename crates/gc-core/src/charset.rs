use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// 70 caractères, rampe de Paul Bourke, résolution maximale (clair → dense).
pub const RAMP_DETAILED: &str =
    " .'`^\",:;Il!i><~+_-?][}{1)(|\\/tfjrxnuvczXYUJCLQ0OZmwqpdbkhao*#MW&8%B@$";

/// 69 caractères : même rampe sans la barre oblique inverse.
pub const RAMP_STANDARD: &str =
    " .'`^\",:;Il!i><~+_-?][}{1)(|/tfjrxnuvczXYUJCLQ0OZmwqpdbkhao*#MW&8%B@$";

/// 10 caractères, compact, bon contraste.
pub const RAMP_SIMPLE: &str = " .:-=+*#%@";

/// Blocs Unicode de densité croissante.
pub const RAMP_BLOCKS: &str = " ░▒▓█";

/// Names accepted by [`preset`].
pub const PRESET_NAMES: &[&str] = &["detailed", "standard", "simple", "blocks"];

/// Look up a built-in ramp by name.
///
/// # Example
/// ```
/// use gc_core::charset::{preset, RAMP_SIMPLE};
/// assert_eq!(preset("simple"), Some(RAMP_SIMPLE));
/// assert_eq!(preset("nope"), None);
/// ```
#[must_use]
pub fn preset(name: &str) -> Option<&'static str> {
    match name.to_ascii_lowercase().as_str() {
        "detailed" => Some(RAMP_DETAILED),
        "standard" => Some(RAMP_STANDARD),
        "simple" => Some(RAMP_SIMPLE),
        "blocks" => Some(RAMP_BLOCKS),
        _ => None,
    }
}

/// Direction in which the literal ramp string runs.
///
/// Après construction, l'index 0 d'une [`GlyphRamp`] est TOUJOURS le glyphe
/// le plus clairsemé. With white glyphs on black, sparse reads as dark, so
/// luminance 0 maps to the sparsest glyph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RampOrder {
    /// First character is the sparsest (e.g. `" .:-=+*#%@"`).
    #[default]
    SparseToDense,
    /// First character is the densest (e.g. `"@%#*+=-:. "`); reversed on load.
    DenseToSparse,
}

/// Ordered, validated sequence of distinct printable glyphs.
///
/// Immutable once built; shared read-only by every frame.
///
/// # Example
/// ```
/// use gc_core::charset::{GlyphRamp, RampOrder};
/// let ramp = GlyphRamp::new("@#. ", RampOrder::DenseToSparse).unwrap();
/// assert_eq!(ramp.sparsest(), ' ');
/// assert_eq!(ramp.densest(), '@');
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlyphRamp {
    glyphs: Vec<char>,
}

impl GlyphRamp {
    /// Validate `glyphs` and normalise it to sparse → dense order.
    ///
    /// # Errors
    /// - [`CoreError::RampTooShort`] with fewer than 2 glyphs.
    /// - [`CoreError::NonPrintableGlyph`] for control characters.
    /// - [`CoreError::DuplicateGlyph`] when a glyph appears twice.
    pub fn new(glyphs: &str, order: RampOrder) -> Result<Self, CoreError> {
        let mut chars: Vec<char> = glyphs.chars().collect();
        if chars.len() < 2 {
            return Err(CoreError::RampTooShort { len: chars.len() });
        }
        for (i, &ch) in chars.iter().enumerate() {
            if ch.is_control() {
                return Err(CoreError::NonPrintableGlyph {
                    code: u32::from(ch),
                });
            }
            if chars[..i].contains(&ch) {
                return Err(CoreError::DuplicateGlyph { ch });
            }
        }
        if order == RampOrder::DenseToSparse {
            chars.reverse();
        }
        Ok(Self { glyphs: chars })
    }

    /// Number of glyphs (always ≥ 2).
    #[allow(clippy::len_without_is_empty)]
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Glyph at `index`, sparse → dense.
    ///
    /// # Panics
    /// Panics if `index >= self.len()`.
    #[inline]
    #[must_use]
    pub fn glyph(&self, index: usize) -> char {
        self.glyphs[index]
    }

    /// All glyphs, sparse → dense.
    #[must_use]
    pub fn glyphs(&self) -> &[char] {
        &self.glyphs
    }

    /// Index of `ch` in the ramp, if present.
    #[must_use]
    pub fn index_of(&self, ch: char) -> Option<usize> {
        self.glyphs.iter().position(|&g| g == ch)
    }

    /// Glyph used for luminance 0.
    #[must_use]
    pub fn sparsest(&self) -> char {
        self.glyphs[0]
    }

    /// Glyph used for luminance 255.
    #[must_use]
    pub fn densest(&self) -> char {
        self.glyphs[self.glyphs.len() - 1]
    }
}

/// Map one luminance sample to a glyph.
///
/// `index = floor(sample / 255 × (N − 1))`, computed in integers so that
/// 255 lands exactly on `N − 1`; the result is clamped all the same.
///
/// # Example
/// ```
/// use gc_core::charset::{quantize, GlyphRamp, RampOrder};
/// let ramp = GlyphRamp::new(" .:#@", RampOrder::SparseToDense).unwrap();
/// assert_eq!(quantize(0, &ramp), ' ');
/// assert_eq!(quantize(128, &ramp), ':');
/// assert_eq!(quantize(255, &ramp), '@');
/// ```
#[inline(always)]
#[must_use]
pub fn quantize(sample: u8, ramp: &GlyphRamp) -> char {
    let last = ramp.glyphs.len() - 1;
    let index = usize::from(sample) * last / 255;
    ramp.glyphs[index.min(last)]
}

/// Lookup table mapping luminance [0..255] → glyph.
///
/// Pre-computed at startup from [`quantize`] for O(1) per-cell cost.
///
/// # Example
/// ```
/// use gc_core::charset::{GlyphRamp, LuminanceLut, RampOrder};
/// let ramp = GlyphRamp::new(" .:#@", RampOrder::SparseToDense).unwrap();
/// let lut = LuminanceLut::new(&ramp);
/// assert_eq!(lut.map(0), ' ');
/// assert_eq!(lut.map(255), '@');
/// ```
#[derive(Clone, Debug)]
pub struct LuminanceLut {
    lut: [char; 256],
}

impl LuminanceLut {
    /// Build the table for `ramp`.
    #[must_use]
    pub fn new(ramp: &GlyphRamp) -> Self {
        let mut lut = [' '; 256];
        for (sample, slot) in (0..=u8::MAX).zip(lut.iter_mut()) {
            *slot = quantize(sample, ramp);
        }
        Self { lut }
    }

    /// Map a luminance value [0..255] to a glyph.
    #[inline(always)]
    #[must_use]
    pub fn map(&self, luminance: u8) -> char {
        self.lut[luminance as usize]
    }
}
