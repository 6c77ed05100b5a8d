/// Glyph rasterizer for glyphcast.
///
/// Renders a glyph frame into an RGB image at a fixed cell pitch, with a
/// built-in 8×8 bitmap font or any TrueType font.
pub mod bitmap;
pub mod outline;
pub mod rasterizer;

pub use rasterizer::Rasterizer;
