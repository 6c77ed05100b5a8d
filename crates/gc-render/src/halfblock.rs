use gc_core::frame::FrameBuffer;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color;

/// Sub-rectangle of `area` that shows a `src_w × src_h` image undistorted
/// with two pixels per cell vertically, centred.
#[must_use]
pub fn fit_area(area: Rect, src_w: u32, src_h: u32) -> Rect {
    if src_w == 0 || src_h == 0 || area.is_empty() {
        return Rect::new(area.x, area.y, 0, 0);
    }
    let avail_w = f64::from(area.width);
    let avail_h = f64::from(area.height) * 2.0;
    let scale = (avail_w / f64::from(src_w)).min(avail_h / f64::from(src_h));
    let w = ((f64::from(src_w) * scale).round() as u16).clamp(1, area.width);
    let h = ((f64::from(src_h) * scale / 2.0).round() as u16).clamp(1, area.height);
    Rect::new(
        area.x + (area.width - w) / 2,
        area.y + (area.height - h) / 2,
        w,
        h,
    )
}

/// Aperçu demi-bloc de `frame` : `▄` avec pixel bas en fg, pixel haut en bg.
///
/// # Example
/// ```
/// use gc_core::frame::FrameBuffer;
/// use gc_render::halfblock::render_halfblock;
/// use ratatui::{buffer::Buffer, layout::Rect, style::Color};
///
/// let frame = FrameBuffer::from_raw(1, 2, vec![255, 0, 0, 0, 0, 255]).unwrap();
/// let mut buf = Buffer::empty(Rect::new(0, 0, 1, 1));
/// render_halfblock(&mut buf, Rect::new(0, 0, 1, 1), &frame);
/// assert_eq!(buf[(0, 0)].bg, Color::Rgb(255, 0, 0));
/// assert_eq!(buf[(0, 0)].fg, Color::Rgb(0, 0, 255));
/// ```
pub fn render_halfblock(buf: &mut Buffer, area: Rect, frame: &FrameBuffer) {
    let target = fit_area(area, frame.width, frame.height);
    if target.is_empty() {
        return;
    }
    let px_w = u32::from(target.width);
    let px_h = u32::from(target.height) * 2;
    for cy in 0..target.height {
        let top_y = u32::from(cy) * 2 * frame.height / px_h;
        let bot_y = ((u32::from(cy) * 2 + 1) * frame.height / px_h).min(frame.height - 1);
        for cx in 0..target.width {
            let sx = u32::from(cx) * frame.width / px_w;
            let [tr, tg, tb] = frame.pixel(sx, top_y);
            let [br, bg, bb] = frame.pixel(sx, bot_y);
            if let Some(cell) = buf.cell_mut((target.x + cx, target.y + cy)) {
                cell.set_char('▄')
                    .set_fg(Color::Rgb(br, bg, bb))
                    .set_bg(Color::Rgb(tr, tg, tb));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_preserves_aspect() {
        // 640×480 dans 80×24 : limité par la hauteur (48 px)
        let r = fit_area(Rect::new(0, 0, 80, 24), 640, 480);
        assert_eq!((r.width, r.height), (64, 24));
        assert_eq!(r.x, 8);
        let r = fit_area(Rect::new(0, 0, 10, 40), 100, 100);
        assert_eq!((r.width, r.height), (10, 5));
        assert!(fit_area(Rect::new(0, 0, 10, 10), 0, 5).is_empty());
    }

    #[test]
    fn halfblock_fills_fitted_area_only() {
        let frame = FrameBuffer::filled(4, 4, [9, 9, 9]);
        let area = Rect::new(0, 0, 8, 2);
        let mut buf = Buffer::empty(area);
        render_halfblock(&mut buf, area, &frame);
        // 4×4 → 4 colonnes × 2 lignes, centré (x = 2..6)
        assert_eq!(buf[(0, 0)].symbol(), " ");
        assert_eq!(buf[(2, 0)].symbol(), "▄");
        assert_eq!(buf[(5, 1)].bg, Color::Rgb(9, 9, 9));
        assert_eq!(buf[(6, 1)].symbol(), " ");
    }
}
