use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Compteur FPS par fenêtre glissante. Zéro allocation après init.
///
/// # Example
/// ```
/// use gc_render::fps::FpsCounter;
/// let mut counter = FpsCounter::new(30);
/// counter.tick();
/// assert!(counter.fps() >= 0.0);
/// ```
pub struct FpsCounter {
    /// Instants des dernières frames.
    ticks: VecDeque<Instant>,
    window: usize,
    fps: f64,
    frame_time: Duration,
    total: u64,
}

impl FpsCounter {
    /// Counter averaging over the last `window` frames (at least 2).
    #[must_use]
    pub fn new(window: usize) -> Self {
        let window = window.max(2);
        Self {
            ticks: VecDeque::with_capacity(window + 1),
            window,
            fps: 0.0,
            frame_time: Duration::ZERO,
            total: 0,
        }
    }

    /// Appeler une fois par frame, APRÈS l'affichage.
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    fn tick_at(&mut self, now: Instant) {
        if let Some(&last) = self.ticks.back() {
            self.frame_time = now.saturating_duration_since(last);
        }
        self.ticks.push_back(now);
        if self.ticks.len() > self.window {
            self.ticks.pop_front();
        }
        self.total += 1;
        if let Some(&first) = self.ticks.front() {
            let secs = now.saturating_duration_since(first).as_secs_f64();
            if self.ticks.len() >= 2 && secs > 0.0 {
                self.fps = (self.ticks.len() - 1) as f64 / secs;
            }
        }
    }

    /// FPS moyen sur la fenêtre.
    #[must_use]
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Durée de la dernière frame.
    #[must_use]
    pub fn frame_time(&self) -> Duration {
        self.frame_time
    }

    /// Frames comptées depuis la création.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steady_rate_is_measured() {
        let mut counter = FpsCounter::new(10);
        let start = Instant::now();
        for i in 0..20u64 {
            counter.tick_at(start + Duration::from_millis(i * 40));
        }
        assert!((counter.fps() - 25.0).abs() < 1e-6);
        assert_eq!(counter.frame_time(), Duration::from_millis(40));
        assert_eq!(counter.total(), 20);
    }

    #[test]
    fn single_tick_reports_zero() {
        let mut counter = FpsCounter::new(0);
        counter.tick();
        assert!(counter.fps().abs() < f64::EPSILON);
    }
}
