use std::path::Path;

use anyhow::{Context, Result};
use gc_core::frame::FrameBuffer;
use gc_core::traits::{FrameSource, SourceStatus};

/// Source d'image statique. Retourne toujours la même frame.
///
/// # Example
/// ```
/// use gc_core::frame::FrameBuffer;
/// use gc_core::traits::{FrameSource, SourceStatus};
/// use gc_source::image::ImageSource;
/// let mut source = ImageSource::from_frame(FrameBuffer::filled(4, 2, [9, 9, 9]), "still");
/// assert!(matches!(source.next_frame().unwrap(), SourceStatus::Frame(f) if f.width == 4));
/// ```
pub struct ImageSource {
    frame: FrameBuffer,
    name: String,
}

impl ImageSource {
    /// Load an image from disk (PNG, JPEG, BMP, GIF) as RGB.
    ///
    /// # Errors
    /// Returns an error if the file is missing or cannot be decoded.
    pub fn open(path: &Path) -> Result<Self> {
        let frame = load_image(path)?;
        log::info!(
            "Image chargée : {}x{} ({})",
            frame.width,
            frame.height,
            path.display()
        );
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        Ok(Self { frame, name })
    }

    /// Wrap an in-memory frame.
    #[must_use]
    pub fn from_frame(frame: FrameBuffer, name: &str) -> Self {
        Self {
            frame,
            name: name.to_string(),
        }
    }
}

impl FrameSource for ImageSource {
    fn next_frame(&mut self) -> Result<SourceStatus> {
        Ok(SourceStatus::Frame(self.frame.clone()))
    }

    fn native_size(&self) -> (u32, u32) {
        (self.frame.width, self.frame.height)
    }

    fn is_live(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Décode une image en [`FrameBuffer`] RGB.
///
/// # Errors
/// Returns an error if the image cannot be loaded.
pub fn load_image(path: &Path) -> Result<FrameBuffer> {
    if !path.exists() {
        return Err(gc_core::CoreError::FileNotFound {
            path: path.display().to_string(),
        }
        .into());
    }
    let img = match image::open(path) {
        Ok(img) => img,
        Err(image::ImageError::Unsupported(e)) => {
            return Err(gc_core::CoreError::UnsupportedFormat {
                format: e.format_hint().to_string(),
            })
            .with_context(|| format!("Impossible de charger {}", path.display()));
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Impossible de charger {}", path.display()));
        }
    };
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    Ok(FrameBuffer::from_raw(width, height, rgb.into_raw())?)
}
