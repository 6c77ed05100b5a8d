/// Display surfaces for glyphcast.
///
/// `WindowSurface` shows the rendered image in ffplay windows;
/// `TerminalSurface` draws the glyph frame with ratatui.
pub mod canvas;
pub mod fps;
pub mod halfblock;
pub mod terminal;
pub mod ui;
pub mod window;

pub use fps::FpsCounter;
pub use terminal::TerminalSurface;
pub use window::WindowSurface;
