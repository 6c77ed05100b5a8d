/// Glyph-grid builder for glyphcast.
///
/// Maps every cell of a resampled luminance grid to a glyph of the ramp.
pub mod builder;

pub use builder::{build, build_glyph_frame, build_into};
