use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use gc_core::traits::{DisplaySurface, FrameView};
use ratatui::DefaultTerminal;
use ratatui::style::Color;

use crate::ui::{self, UiOptions};

/// Surface plein écran dans le terminal (ratatui + crossterm).
///
/// Le terminal est restauré au `Drop`, y compris sur les chemins d'erreur.
pub struct TerminalSurface {
    terminal: DefaultTerminal,
    options: UiOptions,
}

impl TerminalSurface {
    /// Passe le terminal en mode alternatif / raw.
    ///
    /// # Errors
    /// Returns an error if the terminal cannot be initialised.
    pub fn open(source_name: &str, show_source: bool, glyph_color: [u8; 3]) -> Result<Self> {
        let terminal = ratatui::try_init().context("Impossible d'initialiser le terminal")?;
        log::info!("Surface terminal ouverte");
        let [r, g, b] = glyph_color;
        Ok(Self {
            terminal,
            options: UiOptions {
                source_name: source_name.to_string(),
                show_source,
                glyph_color: Color::Rgb(r, g, b),
            },
        })
    }
}

/// `q`, `Esc` et `Ctrl+C` (reçu comme touche en mode raw) quittent.
#[must_use]
pub fn is_quit_key(key: &KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    match key.code {
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

impl DisplaySurface for TerminalSurface {
    fn present(&mut self, view: &FrameView<'_>) -> Result<()> {
        let options = &self.options;
        self.terminal.draw(|frame| ui::draw(frame, view, options))?;
        Ok(())
    }

    fn poll_quit(&mut self) -> Result<bool> {
        let mut quit = false;
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                quit |= is_quit_key(&key);
            }
        }
        Ok(quit)
    }

    fn name(&self) -> &'static str {
        "terminal"
    }
}

impl Drop for TerminalSurface {
    fn drop(&mut self) {
        ratatui::restore();
        log::debug!("Terminal restauré");
    }
}
