/// Frame sources and grid resampling for glyphcast (webcam, video file, image, test patterns).

pub mod ffmpeg;
pub mod image;
pub mod pattern;
pub mod resize;

pub use ffmpeg::{CaptureInput, FfmpegSource};
pub use image::ImageSource;
pub use pattern::{PatternKind, PatternSource};
pub use resize::{GridSize, Resampler};
