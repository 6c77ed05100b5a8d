use thiserror::Error;

/// Errors originating from the core module.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Invalid configuration value or structure.
    #[error("Configuration invalide : {0}")]
    Config(String),

    /// Glyph ramp with fewer than two glyphs.
    #[error("Ramp too short: {len} glyph(s), at least 2 required")]
    RampTooShort {
        /// Number of glyphs found.
        len: usize,
    },

    /// Same glyph listed twice in a ramp.
    #[error("Duplicate glyph {ch:?} in ramp")]
    DuplicateGlyph {
        /// The repeated glyph.
        ch: char,
    },

    /// Control character in a ramp.
    #[error("Non-printable glyph U+{code:04X} in ramp")]
    NonPrintableGlyph {
        /// Code point of the offending character.
        code: u32,
    },

    /// Invalid width/height dimensions.
    #[error("Dimensions invalides : {width}×{height}")]
    InvalidDimensions {
        /// Width value.
        width: u32,
        /// Height value.
        height: u32,
    },

    /// Raw buffer length does not match its declared dimensions.
    #[error("Buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSize {
        /// Expected length in bytes.
        expected: usize,
        /// Actual length in bytes.
        actual: usize,
    },

    /// Glyph metrics do not fit the configured cell.
    #[error("Cell geometry mismatch: {0}")]
    GeometryMismatch(String),

    /// Referenced file does not exist.
    #[error("Fichier introuvable : {path}")]
    FileNotFound {
        /// Path that was not found.
        path: String,
    },

    /// Unsupported file or data format.
    #[error("Format non supporté : {format}")]
    UnsupportedFormat {
        /// The format string that is unsupported.
        format: String,
    },
}
