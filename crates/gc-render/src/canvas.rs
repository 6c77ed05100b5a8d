use gc_core::frame::GlyphFrame;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color;

/// Écrit directement une `GlyphFrame` dans un `ratatui::Buffer`.
///
/// Pas de widget : écriture cellule par cellule, rognée à `area`.
///
/// # Example
/// ```
/// use gc_core::frame::GlyphFrame;
/// use gc_render::canvas::render_glyphs;
/// use ratatui::{buffer::Buffer, layout::Rect, style::Color};
///
/// let mut frame = GlyphFrame::new(2, 1);
/// frame.set(1, 0, '@');
/// let mut buf = Buffer::empty(Rect::new(0, 0, 4, 2));
/// render_glyphs(&mut buf, Rect::new(0, 0, 4, 2), &frame, Color::White);
/// assert_eq!(buf[(1, 0)].symbol(), "@");
/// ```
pub fn render_glyphs(buf: &mut Buffer, area: Rect, glyphs: &GlyphFrame, fg: Color) {
    let cols = glyphs.cols.min(u32::from(area.width));
    let rows = glyphs.rows.min(u32::from(area.height));
    for row in 0..rows {
        for (col, &ch) in glyphs.row(row)[..cols as usize].iter().enumerate() {
            let x = area.x + col as u16;
            let y = area.y + row as u16;
            if let Some(cell) = buf.cell_mut((x, y)) {
                cell.set_char(ch).set_fg(fg);
            }
        }
    }
}
