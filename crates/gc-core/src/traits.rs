use crate::frame::{FrameBuffer, GlyphFrame};

/// Outcome of one acquisition attempt.
#[derive(Debug)]
pub enum SourceStatus {
    /// A new raw frame, owned by the caller for this cycle.
    Frame(FrameBuffer),
    /// Live source with no frame ready yet; the caller may retry.
    Pending,
    /// Finite source reached its end.
    Exhausted,
}

/// Fournit des frames brutes à la boucle de rendu.
///
/// Implémenté par : `FfmpegSource`, `ImageSource`, `PatternSource`.
/// Acquisition failures are returned as `Err` and end the session; the
/// transform pipeline never retries.
///
/// # Example
/// ```
/// use gc_core::traits::{FrameSource, SourceStatus};
///
/// struct DummySource;
/// impl FrameSource for DummySource {
///     fn next_frame(&mut self) -> anyhow::Result<SourceStatus> { Ok(SourceStatus::Exhausted) }
///     fn native_size(&self) -> (u32, u32) { (0, 0) }
///     fn is_live(&self) -> bool { false }
///     fn name(&self) -> &str { "dummy" }
/// }
/// ```
pub trait FrameSource {
    /// Retourne la prochaine frame, `Pending` si rien n'est prêt.
    ///
    /// # Errors
    /// Returns an error when the upstream collaborator can no longer
    /// supply frames (device lost, decoder crash).
    fn next_frame(&mut self) -> anyhow::Result<SourceStatus>;

    /// Dimensions des frames produites.
    fn native_size(&self) -> (u32, u32);

    /// Capture temps réel (webcam) : la source impose elle-même la cadence.
    fn is_live(&self) -> bool;

    /// Nom lisible pour les logs et la barre d'état.
    fn name(&self) -> &str;
}

/// Everything a display surface may show for one cycle.
#[derive(Clone, Copy, Debug)]
pub struct FrameView<'a> {
    /// Raw (mirrored) frame, for the secondary preview.
    pub source: &'a FrameBuffer,
    /// Glyph frame of this cycle.
    pub glyphs: &'a GlyphFrame,
    /// Rasterized glyph image; `None` means "skip display this cycle".
    pub image: Option<&'a FrameBuffer>,
    /// Sliding-window frame rate of the loop.
    pub fps: f64,
}

/// Consomme les images rendues.
///
/// # Example
/// ```
/// use gc_core::traits::{DisplaySurface, FrameView};
///
/// struct NullSurface;
/// impl DisplaySurface for NullSurface {
///     fn present(&mut self, _view: &FrameView<'_>) -> anyhow::Result<()> { Ok(()) }
///     fn poll_quit(&mut self) -> anyhow::Result<bool> { Ok(false) }
///     fn name(&self) -> &'static str { "null" }
/// }
/// ```
pub trait DisplaySurface {
    /// Affiche une frame.
    ///
    /// # Errors
    /// Returns an error if the surface can no longer display anything.
    fn present(&mut self, view: &FrameView<'_>) -> anyhow::Result<()>;

    /// True once the user asked to quit (key press, window closed).
    ///
    /// # Errors
    /// Returns an error if input events cannot be read.
    fn poll_quit(&mut self) -> anyhow::Result<bool>;

    /// Nom lisible pour le debug.
    fn name(&self) -> &'static str;
}
