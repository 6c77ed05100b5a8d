use gc_core::traits::FrameView;
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::{canvas, halfblock};

/// Static part of the terminal layout.
#[derive(Clone, Debug)]
pub struct UiOptions {
    /// Nom de la source, affiché dans la barre d'état.
    pub source_name: String,
    /// Afficher le panneau d'aperçu de la source.
    pub show_source: bool,
    /// Couleur des glyphes.
    pub glyph_color: Color,
}

/// Draw the full UI: glyph canvas, optional source preview, status line.
pub fn draw(frame: &mut Frame, view: &FrameView<'_>, options: &UiOptions) {
    let area = frame.area();
    let [main, status] = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(area);

    let canvas_area = if options.show_source {
        let [canvas_area, preview] =
            Layout::horizontal([Constraint::Percentage(65), Constraint::Percentage(35)]).areas(main);
        draw_preview(frame, preview, view);
        canvas_area
    } else {
        main
    };

    if view.image.is_some() {
        canvas::render_glyphs(frame.buffer_mut(), canvas_area, view.glyphs, options.glyph_color);
    }

    frame.render_widget(Paragraph::new(status_line(view, options)), status);
}

fn draw_preview(frame: &mut Frame, area: Rect, view: &FrameView<'_>) {
    let block = Block::default().borders(Borders::LEFT).title(" Source ");
    let inner = block.inner(area);
    frame.render_widget(block, area);
    halfblock::render_halfblock(frame.buffer_mut(), inner, view.source);
}

fn status_line<'a>(view: &FrameView<'_>, options: &'a UiOptions) -> Line<'a> {
    let key = Style::default().fg(Color::Yellow);
    Line::from(vec![
        Span::styled(" ▶ ", Style::default().fg(Color::Green)),
        Span::raw(options.source_name.as_str()),
        Span::raw(format!(
            " │ {}×{} │ {:.0} FPS │ ",
            view.glyphs.cols, view.glyphs.rows, view.fps
        )),
        Span::styled("q", key),
        Span::raw(" quitter"),
    ])
}
