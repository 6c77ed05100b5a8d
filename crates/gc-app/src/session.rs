use anyhow::Result;
use gc_core::config::{DisplayKind, GlyphcastConfig};
use gc_core::traits::{DisplaySurface, FrameSource};
use gc_render::{TerminalSurface, WindowSurface};
use gc_source::{CaptureInput, FfmpegSource, ImageSource, PatternSource};

use crate::cli::SourceChoice;

/// Ressources ouvertes pour la durée d'une session : une source de frames
/// et une surface d'affichage.
///
/// Passed by reference to the render loop. Both are released when the
/// session is dropped, on every exit path (capture process killed,
/// windows closed, terminal restored). The source is released first.
pub struct Session {
    source: Box<dyn FrameSource>,
    surface: Box<dyn DisplaySurface>,
}

impl Session {
    /// Open the source chosen on the command line, then the configured surface.
    ///
    /// If the surface cannot be opened, the already opened source is
    /// released before the error is returned.
    ///
    /// # Errors
    /// Returns an error if the source or the surface cannot be opened.
    pub fn open(config: &GlyphcastConfig, choice: &SourceChoice) -> Result<Self> {
        let source = open_source(config, choice)?;
        let surface = open_surface(config, source.name())?;
        log::info!("Session ouverte : {} → {}", source.name(), surface.name());
        Ok(Self::new(source, surface))
    }

    /// Assemble a session from already opened collaborators.
    #[must_use]
    pub fn new(source: Box<dyn FrameSource>, surface: Box<dyn DisplaySurface>) -> Self {
        Self { source, surface }
    }

    /// Source de frames.
    pub fn source(&mut self) -> &mut dyn FrameSource {
        self.source.as_mut()
    }

    /// Surface d'affichage.
    pub fn surface(&mut self) -> &mut dyn DisplaySurface {
        self.surface.as_mut()
    }

    /// Both collaborators at once, for a cycle that reads one and writes the other.
    pub fn parts(&mut self) -> (&mut dyn FrameSource, &mut dyn DisplaySurface) {
        (self.source.as_mut(), self.surface.as_mut())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        log::debug!("Session fermée ({})", self.source.name());
    }
}

fn open_source(config: &GlyphcastConfig, choice: &SourceChoice) -> Result<Box<dyn FrameSource>> {
    let s = &config.session;
    let source: Box<dyn FrameSource> = match choice {
        SourceChoice::Webcam(device) => {
            let input = device
                .clone()
                .map_or_else(CaptureInput::default_device, CaptureInput::Device);
            Box::new(FfmpegSource::open(
                input,
                s.capture_width,
                s.capture_height,
                s.capture_fps,
            )?)
        }
        SourceChoice::Video(path) => Box::new(FfmpegSource::open(
            CaptureInput::File(path.clone()),
            s.capture_width,
            s.capture_height,
            s.capture_fps,
        )?),
        SourceChoice::Image(path) => Box::new(ImageSource::open(path)?),
        SourceChoice::Pattern(kind) => Box::new(PatternSource::new(
            *kind,
            s.capture_width,
            s.capture_height,
        )),
    };
    Ok(source)
}

fn open_surface(config: &GlyphcastConfig, source_name: &str) -> Result<Box<dyn DisplaySurface>> {
    let s = &config.session;
    let surface: Box<dyn DisplaySurface> = match s.display {
        DisplayKind::Window => Box::new(WindowSurface::new(
            s.show_source,
            s.fullscreen,
            s.capture_fps,
        )),
        DisplayKind::Terminal => Box::new(TerminalSurface::open(
            source_name,
            s.show_source,
            config.font.color,
        )?),
    };
    Ok(surface)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use gc_source::PatternKind;

    use super::*;

    #[test]
    fn pattern_source_with_window_surface_opens_without_hardware() {
        let mut config = GlyphcastConfig::default();
        config.session.capture_width = 32;
        config.session.capture_height = 24;
        let mut session = Session::open(&config, &SourceChoice::Pattern(PatternKind::Bars)).unwrap();
        assert_eq!(session.source().native_size(), (32, 24));
        assert_eq!(session.source().name(), "bars");
        assert_eq!(session.surface().name(), "window");
    }

    #[test]
    fn missing_image_fails_to_open() {
        let config = GlyphcastConfig::default();
        let choice = SourceChoice::Image(PathBuf::from("/nonexistent/frame.png"));
        assert!(Session::open(&config, &choice).is_err());
    }
}
