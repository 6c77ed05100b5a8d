use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::charset::{self, GlyphRamp, RampOrder};
use crate::error::CoreError;

/// Correction par défaut de la hauteur des cellules (glyphes plus hauts que larges).
pub const DEFAULT_ASPECT_COMPENSATION: f32 = 0.55;

/// Hauteur en pixels d'un glyphe à `font.scale = 1.0`.
pub const FONT_EM_PX: f32 = 30.0;

/// Un glyphe ne dépasse pas 4 hauteurs de cellule.
const MAX_GLYPH_TO_CELL: f32 = 4.0;

/// Configuration complète du pipeline, fixée au démarrage.
///
/// Sérialisable en TOML. Chaque champ a une valeur par défaut saine.
///
/// # Example
/// ```
/// use gc_core::config::GlyphcastConfig;
/// let config = GlyphcastConfig::default();
/// assert_eq!(config.grid.cols, 256);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct GlyphcastConfig {
    /// Couleur de fond de l'image rendue.
    pub background: [u8; 3],
    /// Parallélisation intra-frame.
    pub parallelism: Parallelism,
    /// Taille de la grille de glyphes.
    pub grid: GridConfig,
    /// Rampe de glyphes.
    pub ramp: RampConfig,
    /// Géométrie des cellules, partagée par la compensation et le rasterizer.
    pub cell: CellGeometry,
    /// Style de dessin des glyphes.
    pub font: FontSpec,
    /// Capture et affichage.
    pub session: SessionConfig,
}

/// Keyword value `"auto"` in TOML.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Auto {
    /// Derive the value instead of fixing it.
    Auto,
}

/// Nombre de lignes de la grille : explicite ou dérivé de l'aspect source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Rows {
    /// Exactly this many rows.
    Count(u32),
    /// Aspect-preserving mode: rows follow from columns and source aspect.
    Derived(Auto),
}

impl Rows {
    /// Explicit row count, `None` in aspect-preserving mode.
    #[must_use]
    pub fn explicit(self) -> Option<u32> {
        match self {
            Self::Count(n) => Some(n),
            Self::Derived(_) => None,
        }
    }
}

/// Facteur de compensation d'aspect des cellules.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum AspectCompensation {
    /// Fixed factor (0.55 by default).
    Factor(f32),
    /// `cell.width / cell.height`.
    Derived(Auto),
}

impl AspectCompensation {
    /// Resolve to a numeric factor for `cell`.
    ///
    /// # Example
    /// ```
    /// use gc_core::config::{AspectCompensation, Auto, CellGeometry};
    /// let cell = CellGeometry::default();
    /// assert!((AspectCompensation::Derived(Auto::Auto).resolve(&cell) - 0.6).abs() < 1e-6);
    /// assert!((AspectCompensation::Factor(0.55).resolve(&cell) - 0.55).abs() < 1e-6);
    /// ```
    #[must_use]
    pub fn resolve(self, cell: &CellGeometry) -> f32 {
        match self {
            Self::Factor(f) => f,
            Self::Derived(_) => cell.ratio(),
        }
    }
}

/// Grid sizing.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct GridConfig {
    /// Colonnes de glyphes.
    pub cols: u32,
    /// Lignes de glyphes, ou `"auto"`.
    pub rows: Rows,
    /// Correction appliquée en mode `rows = "auto"`.
    pub aspect_compensation: AspectCompensation,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cols: 256,
            rows: Rows::Count(256),
            aspect_compensation: AspectCompensation::Factor(DEFAULT_ASPECT_COMPENSATION),
        }
    }
}

/// Glyph ramp source.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct RampConfig {
    /// Caractères de la rampe, dans l'ordre indiqué par `order`.
    pub glyphs: String,
    /// Sens de lecture de `glyphs`.
    pub order: RampOrder,
}

impl Default for RampConfig {
    fn default() -> Self {
        Self {
            glyphs: charset::RAMP_DETAILED.to_string(),
            order: RampOrder::SparseToDense,
        }
    }
}

impl RampConfig {
    /// Build the validated ramp.
    ///
    /// # Errors
    /// See [`GlyphRamp::new`].
    pub fn build(&self) -> Result<GlyphRamp, CoreError> {
        GlyphRamp::new(&self.glyphs, self.order)
    }
}

/// Pixel box allotted to one glyph, and its baseline.
///
/// Both the aspect compensation (`"auto"`) and the rasterizer pitch read
/// this single value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct CellGeometry {
    /// Largeur d'une cellule en pixels.
    pub width: u32,
    /// Hauteur d'une cellule en pixels.
    pub height: u32,
    /// Espace sous la ligne de base (descendantes).
    pub baseline_margin: u32,
}

impl Default for CellGeometry {
    fn default() -> Self {
        Self {
            width: 6,
            height: 10,
            baseline_margin: 2,
        }
    }
}

impl CellGeometry {
    /// Baseline row inside a cell, from its top edge.
    #[inline]
    #[must_use]
    pub fn baseline(&self) -> u32 {
        self.height.saturating_sub(self.baseline_margin)
    }

    /// `width / height`.
    #[must_use]
    pub fn ratio(&self) -> f32 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f32 / self.height as f32
    }
}

/// Glyph drawing style.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct FontSpec {
    /// Police TrueType/OpenType. `None` = police bitmap intégrée.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Échelle (1.0 = 30 px de corps).
    pub scale: f32,
    /// Épaisseur du trait en pixels.
    pub thickness: u32,
    /// Couleur des glyphes.
    pub color: [u8; 3],
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            path: None,
            scale: 0.3,
            thickness: 1,
            color: [255, 255, 255],
        }
    }
}

/// Intra-frame parallelism of the builder and rasterizer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Parallelism {
    /// Single thread.
    Sequential,
    /// Row-parallel via rayon.
    Rows,
    /// Row-parallel above a size threshold.
    #[default]
    Auto,
}

/// Au-delà de ce nombre de cellules, `Parallelism::Auto` passe en parallèle par lignes.
pub const PARALLEL_THRESHOLD_CELLS: usize = 16_384;

impl Parallelism {
    /// Whether a frame of `cells` glyph cells should be split across rayon workers.
    ///
    /// # Example
    /// ```
    /// use gc_core::config::Parallelism;
    /// assert!(!Parallelism::Auto.is_parallel(80 * 24));
    /// assert!(Parallelism::Auto.is_parallel(256 * 256));
    /// assert!(Parallelism::Rows.is_parallel(1));
    /// ```
    #[inline]
    #[must_use]
    pub fn is_parallel(self, cells: usize) -> bool {
        match self {
            Self::Sequential => false,
            Self::Rows => true,
            Self::Auto => cells >= PARALLEL_THRESHOLD_CELLS,
        }
    }
}

/// Display surface kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayKind {
    /// ffplay windows fed through a pipe.
    #[default]
    Window,
    /// Full-screen terminal UI.
    Terminal,
}

/// Capture and preview settings owned by the session.
#[allow(clippy::struct_excessive_bools)]
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Miroir horizontal avant affichage et conversion.
    pub mirror: bool,
    /// Surface d'affichage.
    pub display: DisplayKind,
    /// Afficher aussi la frame d'origine.
    pub show_source: bool,
    /// Fenêtre ASCII en plein écran.
    pub fullscreen: bool,
    /// Largeur de capture en pixels.
    pub capture_width: u32,
    /// Hauteur de capture en pixels.
    pub capture_height: u32,
    /// Cadence cible de la boucle.
    pub capture_fps: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mirror: true,
            display: DisplayKind::Window,
            show_source: true,
            fullscreen: true,
            capture_width: 640,
            capture_height: 480,
            capture_fps: 30,
        }
    }
}

impl Default for GlyphcastConfig {
    fn default() -> Self {
        Self {
            background: [0, 0, 0],
            parallelism: Parallelism::Auto,
            grid: GridConfig::default(),
            ramp: RampConfig::default(),
            cell: CellGeometry::default(),
            font: FontSpec::default(),
            session: SessionConfig::default(),
        }
    }
}

impl GlyphcastConfig {
    /// Reject every configuration the per-frame loop cannot run with.
    ///
    /// Glyph metrics are checked against the cell when the rasterizer is
    /// built, since they depend on the font.
    ///
    /// # Errors
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), CoreError> {
        self.ramp.build()?;

        if self.grid.cols == 0 || self.grid.rows == Rows::Count(0) {
            return Err(CoreError::InvalidDimensions {
                width: self.grid.cols,
                height: self.grid.rows.explicit().unwrap_or(0),
            });
        }

        let cell = &self.cell;
        if cell.width == 0 || cell.height == 0 {
            return Err(CoreError::InvalidDimensions {
                width: cell.width,
                height: cell.height,
            });
        }
        // L'image fait cols × cell.width pixels de large : elle doit tenir dans un u32.
        let image_width = self.grid.cols.checked_mul(cell.width);
        let image_height = match self.grid.rows {
            Rows::Count(rows) => rows.checked_mul(cell.height),
            Rows::Derived(_) => Some(cell.height),
        };
        if image_width.is_none() || image_height.is_none() {
            return Err(CoreError::InvalidDimensions {
                width: self.grid.cols,
                height: self.grid.rows.explicit().unwrap_or(0),
            });
        }
        if cell.baseline_margin >= cell.height {
            return Err(CoreError::GeometryMismatch(format!(
                "baseline margin {} must be smaller than cell height {}",
                cell.baseline_margin, cell.height
            )));
        }

        let factor = self.grid.aspect_compensation.resolve(cell);
        if !factor.is_finite() || factor <= 0.0 || factor > 4.0 {
            return Err(CoreError::Config(format!(
                "aspect_compensation {factor} hors de ]0, 4]"
            )));
        }
        let ratio = cell.ratio();
        if (factor - ratio).abs() / ratio > 0.25 {
            log::warn!(
                "aspect_compensation {factor} loin du ratio des cellules {}×{} ({ratio:.2}) : sortie déformée",
                cell.width,
                cell.height
            );
        }

        if !self.font.scale.is_finite() || self.font.scale <= 0.0 {
            return Err(CoreError::Config(format!(
                "font.scale {} doit être > 0",
                self.font.scale
            )));
        }
        #[allow(clippy::cast_precision_loss)]
        let max_glyph_px = cell.height as f32 * MAX_GLYPH_TO_CELL;
        if self.font.scale * FONT_EM_PX > max_glyph_px {
            return Err(CoreError::Config(format!(
                "font.scale {} : glyphe de {} px pour une cellule de {} px",
                self.font.scale,
                self.font.scale * FONT_EM_PX,
                cell.height
            )));
        }
        if self.font.thickness == 0 {
            return Err(CoreError::Config("font.thickness doit être ≥ 1".into()));
        }

        let s = &self.session;
        if s.capture_width == 0 || s.capture_height == 0 {
            return Err(CoreError::InvalidDimensions {
                width: s.capture_width,
                height: s.capture_height,
            });
        }
        if s.capture_fps == 0 {
            return Err(CoreError::Config("session.capture_fps doit être ≥ 1".into()));
        }
        Ok(())
    }
}

/// Structure TOML intermédiaire, toutes les valeurs optionnelles.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    background: Option<[u8; 3]>,
    parallelism: Option<Parallelism>,
    grid: Option<GridSection>,
    ramp: Option<RampSection>,
    cell: Option<CellSection>,
    font: Option<FontSection>,
    session: Option<SessionSection>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct GridSection {
    cols: Option<u32>,
    rows: Option<Rows>,
    aspect_compensation: Option<AspectCompensation>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RampSection {
    preset: Option<String>,
    glyphs: Option<String>,
    order: Option<RampOrder>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CellSection {
    width: Option<u32>,
    height: Option<u32>,
    baseline_margin: Option<u32>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct FontSection {
    path: Option<PathBuf>,
    scale: Option<f32>,
    thickness: Option<u32>,
    color: Option<[u8; 3]>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SessionSection {
    mirror: Option<bool>,
    display: Option<DisplayKind>,
    show_source: Option<bool>,
    fullscreen: Option<bool>,
    capture_width: Option<u32>,
    capture_height: Option<u32>,
    capture_fps: Option<u32>,
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// The result is not validated; call [`GlyphcastConfig::validate`].
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
///
/// # Example
/// ```no_run
/// use gc_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<GlyphcastConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    parse_config(&content)
        .with_context(|| format!("Erreur de parsing TOML dans {}", path.display()))
}

/// Parse TOML text and merge it over the defaults.
///
/// # Errors
/// Returns an error on malformed TOML, unknown keys or an unknown ramp preset.
///
/// # Example
/// ```
/// use gc_core::config::{parse_config, Rows};
/// let config = parse_config("[grid]\ncols = 80\nrows = \"auto\"\n").unwrap();
/// assert_eq!(config.grid.cols, 80);
/// assert_eq!(config.grid.rows, Rows::Derived(gc_core::config::Auto::Auto));
/// ```
pub fn parse_config(content: &str) -> Result<GlyphcastConfig> {
    let file: ConfigFile = toml::from_str(content)?;
    let mut config = GlyphcastConfig::default();

    if let Some(v) = file.background {
        config.background = v;
    }
    if let Some(v) = file.parallelism {
        config.parallelism = v;
    }

    if let Some(g) = file.grid {
        if let Some(v) = g.cols {
            config.grid.cols = v;
        }
        if let Some(v) = g.rows {
            config.grid.rows = v;
        }
        if let Some(v) = g.aspect_compensation {
            config.grid.aspect_compensation = v;
        }
    }

    if let Some(r) = file.ramp {
        if let Some(v) = r.glyphs {
            config.ramp.glyphs = v;
        } else if let Some(name) = r.preset {
            let glyphs = charset::preset(&name).ok_or_else(|| {
                CoreError::Config(format!(
                    "preset de rampe inconnu : {name} (connus : {})",
                    charset::PRESET_NAMES.join(", ")
                ))
            })?;
            config.ramp.glyphs = glyphs.to_string();
        }
        if let Some(v) = r.order {
            config.ramp.order = v;
        }
    }

    if let Some(c) = file.cell {
        if let Some(v) = c.width {
            config.cell.width = v;
        }
        if let Some(v) = c.height {
            config.cell.height = v;
        }
        if let Some(v) = c.baseline_margin {
            config.cell.baseline_margin = v;
        }
    }

    if let Some(f) = file.font {
        if f.path.is_some() {
            config.font.path = f.path;
        }
        if let Some(v) = f.scale {
            config.font.scale = v;
        }
        if let Some(v) = f.thickness {
            config.font.thickness = v;
        }
        if let Some(v) = f.color {
            config.font.color = v;
        }
    }

    if let Some(s) = file.session {
        if let Some(v) = s.mirror {
            config.session.mirror = v;
        }
        if let Some(v) = s.display {
            config.session.display = v;
        }
        if let Some(v) = s.show_source {
            config.session.show_source = v;
        }
        if let Some(v) = s.fullscreen {
            config.session.fullscreen = v;
        }
        if let Some(v) = s.capture_width {
            config.session.capture_width = v;
        }
        if let Some(v) = s.capture_height {
            config.session.capture_height = v;
        }
        if let Some(v) = s.capture_fps {
            config.session.capture_fps = v;
        }
    }

    Ok(config)
}
