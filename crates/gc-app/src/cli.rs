use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use gc_core::charset::{self, RampOrder};
use gc_core::config::{AspectCompensation, Auto, DisplayKind, GlyphcastConfig, Rows};
use gc_core::error::CoreError;
use gc_source::PatternKind;

/// glyphcast : rendu ASCII temps réel d'un flux vidéo.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Webcam (source par défaut). Périphérique optionnel : /dev/video1, 0, "video=…".
    #[arg(long, num_args = 0..=1, value_name = "DEVICE")]
    pub webcam: Option<Option<String>>,

    /// Source visuelle : fichier vidéo (décodé par ffmpeg).
    #[arg(long)]
    pub video: Option<PathBuf>,

    /// Source visuelle : image fixe (PNG, JPEG, BMP, GIF).
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Motif de test synthétique : gradient, rings, bars.
    #[arg(long)]
    pub pattern: Option<String>,

    /// Fichier de configuration TOML. Défaut : config/default.toml.
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Colonnes de la grille de glyphes.
    #[arg(long)]
    pub cols: Option<u32>,

    /// Lignes de la grille, ou "auto" pour préserver l'aspect de la source.
    #[arg(long, value_parser = parse_rows)]
    pub rows: Option<Rows>,

    /// Compensation d'aspect des cellules (ex: 0.55), ou "auto".
    #[arg(long, value_parser = parse_aspect)]
    pub aspect: Option<AspectCompensation>,

    /// Rampe de glyphes littérale, du plus clairsemé au plus dense.
    #[arg(long, conflicts_with = "preset")]
    pub ramp: Option<String>,

    /// Rampe prédéfinie : detailed, standard, simple, blocks.
    #[arg(long)]
    pub preset: Option<String>,

    /// La rampe est écrite du plus dense au plus clairsemé.
    #[arg(long, default_value_t = false)]
    pub dense_first: bool,

    /// Police TrueType/OpenType à la place de la police bitmap intégrée.
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Surface d'affichage : window, terminal.
    #[arg(long, value_parser = parse_display)]
    pub display: Option<DisplayKind>,

    /// Désactiver le miroir horizontal.
    #[arg(long, default_value_t = false)]
    pub no_mirror: bool,

    /// Ne pas afficher la frame source.
    #[arg(long, default_value_t = false)]
    pub no_source: bool,

    /// Fenêtre ASCII non plein écran.
    #[arg(long, default_value_t = false)]
    pub windowed: bool,

    /// FPS de capture cible.
    #[arg(long)]
    pub fps: Option<u32>,

    /// Arrêter après N frames.
    #[arg(long)]
    pub max_frames: Option<u64>,

    /// Afficher la configuration résolue (TOML) et quitter.
    #[arg(long, default_value_t = false)]
    pub print_config: bool,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

/// Visual source selected on the command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceChoice {
    /// Webcam; `None` = platform default device.
    Webcam(Option<String>),
    /// Fichier vidéo.
    Video(PathBuf),
    /// Image fixe.
    Image(PathBuf),
    /// Motif synthétique.
    Pattern(PatternKind),
}

impl Cli {
    /// Validate that at most one visual source is provided.
    ///
    /// Without any source flag the default webcam is used.
    ///
    /// # Errors
    /// Returns an error if more than one source is specified or the
    /// pattern name is unknown.
    pub fn validate_source(&self) -> Result<SourceChoice> {
        let count = usize::from(self.image.is_some())
            + usize::from(self.video.is_some())
            + usize::from(self.webcam.is_some())
            + usize::from(self.pattern.is_some());

        if count > 1 {
            anyhow::bail!(
                "Une seule source visuelle à la fois. Spécifiez --webcam, --video, --image, OU --pattern."
            );
        }
        if let Some(ref path) = self.video {
            return Ok(SourceChoice::Video(path.clone()));
        }
        if let Some(ref path) = self.image {
            return Ok(SourceChoice::Image(path.clone()));
        }
        if let Some(ref name) = self.pattern {
            return Ok(SourceChoice::Pattern(name.parse()?));
        }
        Ok(SourceChoice::Webcam(self.webcam.clone().flatten()))
    }

    /// Apply command-line overrides on top of the file configuration.
    ///
    /// # Errors
    /// Returns an error for an unknown ramp preset.
    pub fn apply_overrides(&self, config: &mut GlyphcastConfig) -> Result<()> {
        if let Some(cols) = self.cols {
            config.grid.cols = cols;
        }
        if let Some(rows) = self.rows {
            config.grid.rows = rows;
        }
        if let Some(aspect) = self.aspect {
            config.grid.aspect_compensation = aspect;
        }
        if let Some(ref glyphs) = self.ramp {
            config.ramp.glyphs.clone_from(glyphs);
        } else if let Some(ref name) = self.preset {
            let glyphs = charset::preset(name).ok_or_else(|| {
                CoreError::Config(format!(
                    "preset de rampe inconnu : {name} (connus : {})",
                    charset::PRESET_NAMES.join(", ")
                ))
            })?;
            config.ramp.glyphs = glyphs.to_string();
        }
        if self.dense_first {
            config.ramp.order = RampOrder::DenseToSparse;
        }
        if self.font.is_some() {
            config.font.path.clone_from(&self.font);
        }
        if let Some(display) = self.display {
            config.session.display = display;
        }
        if self.no_mirror {
            config.session.mirror = false;
        }
        if self.no_source {
            config.session.show_source = false;
        }
        if self.windowed {
            config.session.fullscreen = false;
        }
        if let Some(fps) = self.fps {
            config.session.capture_fps = fps;
        }
        Ok(())
    }
}

fn parse_rows(s: &str) -> Result<Rows, String> {
    if s.eq_ignore_ascii_case("auto") {
        return Ok(Rows::Derived(Auto::Auto));
    }
    s.parse()
        .map(Rows::Count)
        .map_err(|_| format!("« {s} » : attendu un entier ou \"auto\""))
}

fn parse_aspect(s: &str) -> Result<AspectCompensation, String> {
    if s.eq_ignore_ascii_case("auto") {
        return Ok(AspectCompensation::Derived(Auto::Auto));
    }
    s.parse()
        .map(AspectCompensation::Factor)
        .map_err(|_| format!("« {s} » : attendu un nombre ou \"auto\""))
}

fn parse_display(s: &str) -> Result<DisplayKind, String> {
    match s.to_ascii_lowercase().as_str() {
        "window" => Ok(DisplayKind::Window),
        "terminal" | "tui" => Ok(DisplayKind::Terminal),
        _ => Err(format!("surface inconnue : {s} (window, terminal)")),
    }
}
