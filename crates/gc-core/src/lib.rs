/// Configuration, types, and shared structures for glyphcast.
///
/// This crate contains the glyph ramp and intensity quantizer, the
/// frame-scoped buffers flowing through the pipeline, the configuration
/// logic and the collaborator traits used across the workspace.

pub mod cancel;
pub mod charset;
pub mod config;
pub mod error;
pub mod frame;
pub mod traits;

pub use cancel::CancelToken;
pub use charset::{GlyphRamp, LuminanceLut, RampOrder};
pub use config::GlyphcastConfig;
pub use error::CoreError;
pub use frame::{FrameBuffer, GlyphFrame, LumaFrame};
