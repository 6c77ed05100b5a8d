/// glyphcast application: command line, transform pipeline, session and
/// render loop.
///
/// The pipeline is usable on its own, without a capture device or a
/// display surface.
pub mod app;
pub mod cli;
pub mod pipeline;
pub mod session;

pub use app::{RunOptions, RunStats, run};
pub use pipeline::{AsciiPipeline, FrameOutput};
pub use session::Session;
