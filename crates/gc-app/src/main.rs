use anyhow::{Context, Result};
use clap::Parser;
use gc_app::cli::Cli;
use gc_app::{AsciiPipeline, RunOptions, Session};
use gc_core::CancelToken;
use gc_core::config::{self, GlyphcastConfig};

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Valider la source
    let choice = cli.validate_source()?;

    // 4. Charger la config + overrides CLI
    let mut config = resolve_config(&cli)?;
    cli.apply_overrides(&mut config)?;

    if cli.print_config {
        print!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    // 5. Pipeline : toute erreur de configuration est fatale ici, avant la boucle
    let mut pipeline = AsciiPipeline::new(&config)?;

    // 6. Ctrl+C → annulation à la prochaine frontière de cycle
    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || handler_token.cancel())
        .context("Impossible d'installer le handler Ctrl+C")?;

    // 7. Session (source + surface), libérée sur tous les chemins de sortie
    let mut session = Session::open(&config, &choice)?;
    let options = RunOptions::from_config(&config, cli.max_frames);
    let result = gc_app::run(&mut session, &mut pipeline, &cancel, &options);
    drop(session);

    let stats = result?;
    log::info!(
        "Terminé : {} frames ({} vides), {:.1} FPS",
        stats.frames,
        stats.skipped,
        stats.fps
    );
    Ok(())
}

/// Fichier de config s'il existe, sinon les défauts.
fn resolve_config(cli: &Cli) -> Result<GlyphcastConfig> {
    if cli.config.exists() {
        config::load_config(&cli.config)
    } else {
        log::warn!(
            "Config introuvable : {}. Utilisation des défauts.",
            cli.config.display()
        );
        Ok(GlyphcastConfig::default())
    }
}
