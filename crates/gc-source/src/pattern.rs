use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use gc_core::frame::FrameBuffer;
use gc_core::traits::{FrameSource, SourceStatus};

/// Motif synthétique.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatternKind {
    /// Dégradé horizontal noir → blanc qui défile.
    Gradient,
    /// Anneaux concentriques qui s'étendent.
    Rings,
    /// Barres de couleur qui défilent.
    Bars,
}

impl PatternKind {
    /// Every kind, in display order.
    pub const ALL: [Self; 3] = [Self::Gradient, Self::Rings, Self::Bars];

    /// Nom CLI.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Gradient => "gradient",
            Self::Rings => "rings",
            Self::Bars => "bars",
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PatternKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| anyhow::anyhow!("motif inconnu : {s} (gradient, rings, bars)"))
    }
}

/// Barres type mire, 75 %.
const BAR_COLORS: [[u8; 3]; 8] = [
    [191, 191, 191],
    [191, 191, 0],
    [0, 191, 191],
    [0, 191, 0],
    [191, 0, 191],
    [191, 0, 0],
    [0, 0, 191],
    [0, 0, 0],
];

/// Deterministic animated test source; needs no hardware.
///
/// Frame `n` only depends on the kind, the size and `n`.
///
/// # Example
/// ```
/// use gc_core::traits::{FrameSource, SourceStatus};
/// use gc_source::pattern::{PatternKind, PatternSource};
/// let mut source = PatternSource::new(PatternKind::Gradient, 32, 8);
/// let SourceStatus::Frame(frame) = source.next_frame().unwrap() else { unreachable!() };
/// assert!(frame.luminance(0, 0) < frame.luminance(31, 0));
/// ```
pub struct PatternSource {
    kind: PatternKind,
    width: u32,
    height: u32,
    tick: u32,
}

impl PatternSource {
    /// Create a `width × height` source.
    #[must_use]
    pub fn new(kind: PatternKind, width: u32, height: u32) -> Self {
        Self {
            kind,
            width,
            height,
            tick: 0,
        }
    }

    /// Render frame number `tick` without advancing the source.
    #[must_use]
    pub fn render(&self, tick: u32) -> FrameBuffer {
        let mut frame = FrameBuffer::new(self.width, self.height);
        if frame.is_empty() {
            return frame;
        }
        let (w, h) = (self.width, self.height);
        match self.kind {
            PatternKind::Gradient => {
                let shift = tick.wrapping_mul(2);
                for y in 0..h {
                    for x in 0..w {
                        let v = ((u64::from(x) * 256 / u64::from(w)) as u32 + shift) % 256;
                        let v = v as u8;
                        frame.put_pixel(x, y, [v, v, v]);
                    }
                }
            }
            PatternKind::Rings => {
                let (cx, cy) = (w as f32 / 2.0, h as f32 / 2.0);
                let phase = (tick % 64) as f32 / 64.0;
                let period = (w.min(h) as f32 / 6.0).max(2.0);
                for y in 0..h {
                    for x in 0..w {
                        let d = (x as f32 + 0.5 - cx).hypot(y as f32 + 0.5 - cy);
                        let t = (d / period - phase).rem_euclid(1.0);
                        let v = (t * 255.0).round() as u8;
                        frame.put_pixel(x, y, [v, v, v]);
                    }
                }
            }
            PatternKind::Bars => {
                let bars = BAR_COLORS.len() as u64;
                for y in 0..h {
                    for x in 0..w {
                        let pos = (u64::from(x) + u64::from(tick)) % u64::from(w);
                        let idx = (pos * bars / u64::from(w)) as usize;
                        frame.put_pixel(x, y, BAR_COLORS[idx]);
                    }
                }
            }
        }
        frame
    }
}

impl FrameSource for PatternSource {
    fn next_frame(&mut self) -> Result<SourceStatus> {
        let frame = self.render(self.tick);
        self.tick = self.tick.wrapping_add(1);
        Ok(SourceStatus::Frame(frame))
    }

    fn native_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn is_live(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        self.kind.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_kind_names() {
        assert_eq!("RINGS".parse::<PatternKind>().unwrap(), PatternKind::Rings);
        assert!("plasma".parse::<PatternKind>().is_err());
        for kind in PatternKind::ALL {
            assert_eq!(kind.to_string().parse::<PatternKind>().unwrap(), kind);
        }
    }

    #[test]
    fn frames_are_deterministic_and_sized() {
        for kind in PatternKind::ALL {
            let mut a = PatternSource::new(kind, 40, 30);
            let b = PatternSource::new(kind, 40, 30);
            let SourceStatus::Frame(first) = a.next_frame().unwrap() else {
                panic!("motif sans frame");
            };
            assert_eq!(first, b.render(0));
            assert_eq!((first.width, first.height), (40, 30));
            assert_eq!(first.data.len(), 40 * 30 * 3);
        }
    }

    #[test]
    fn gradient_animates() {
        let source = PatternSource::new(PatternKind::Gradient, 16, 4);
        assert_ne!(source.render(0), source.render(5));
        let frame = source.render(0);
        assert_eq!(frame.luminance(0, 0), 0);
        assert!(frame.luminance(15, 3) > 200);
    }

    #[test]
    fn bars_cover_all_colors() {
        let frame = PatternSource::new(PatternKind::Bars, 80, 2).render(0);
        for (i, color) in BAR_COLORS.iter().enumerate() {
            assert_eq!(frame.pixel(i as u32 * 10 + 5, 1), *color);
        }
    }

    #[test]
    fn zero_size_pattern_is_empty() {
        let mut source = PatternSource::new(PatternKind::Rings, 0, 10);
        let SourceStatus::Frame(frame) = source.next_frame().unwrap() else {
            panic!("motif sans frame");
        };
        assert!(frame.is_empty());
    }
}
