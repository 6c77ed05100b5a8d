use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use gc_core::cancel::CancelToken;
use gc_core::config::GlyphcastConfig;
use gc_core::traits::{FrameView, SourceStatus};
use gc_render::FpsCounter;

use crate::pipeline::AsciiPipeline;
use crate::session::Session;

/// Réglages de la boucle de rendu.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunOptions {
    /// Miroir horizontal avant l'aperçu et la transformation.
    pub mirror: bool,
    /// Cadence imposée aux sources non temps réel (image, motif, fichier).
    pub frame_interval: Duration,
    /// Arrêt après ce nombre de frames affichées.
    pub max_frames: Option<u64>,
}

impl RunOptions {
    /// Options derived from the session configuration.
    #[must_use]
    pub fn from_config(config: &GlyphcastConfig, max_frames: Option<u64>) -> Self {
        Self {
            mirror: config.session.mirror,
            frame_interval: Duration::from_secs_f64(1.0 / f64::from(config.session.capture_fps.max(1))),
            max_frames,
        }
    }
}

/// Bilan d'une session.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RunStats {
    /// Frames transformées et présentées.
    pub frames: u64,
    /// Frames dont la sortie était vide (rien à afficher).
    pub skipped: u64,
    /// FPS moyen en fin de session.
    pub fps: f64,
}

/// Boucle capture → transformation → affichage.
///
/// `cancel` is checked once per cycle boundary; it is set by the Ctrl+C
/// handler and here when the surface reports a quit request. A source
/// error ends the loop with that error, an exhausted source ends it
/// normally. Sources that are not real-time captures are paced to
/// `options.frame_interval`.
///
/// # Errors
/// Returns the first source, transform or display error.
pub fn run(
    session: &mut Session,
    pipeline: &mut AsciiPipeline,
    cancel: &CancelToken,
    options: &RunOptions,
) -> Result<RunStats> {
    let (source, surface) = session.parts();
    let pace = (!source.is_live()).then_some(options.frame_interval);
    let mut fps = FpsCounter::new(30);
    let mut stats = RunStats::default();
    let mut next_due = Instant::now();

    log::info!(
        "Boucle démarrée : {} ({}x{}) → {}",
        source.name(),
        source.native_size().0,
        source.native_size().1,
        surface.name()
    );

    while !cancel.is_cancelled() {
        if options.max_frames.is_some_and(|max| stats.frames >= max) {
            log::info!("Limite de {} frames atteinte", stats.frames);
            break;
        }

        if let Some(interval) = pace {
            let now = Instant::now();
            if next_due > now {
                thread::sleep(next_due - now);
            }
            next_due = next_due.max(now) + interval;
        }

        let mut frame = match source.next_frame()? {
            SourceStatus::Frame(frame) => frame,
            SourceStatus::Pending => {
                if surface.poll_quit()? {
                    cancel.cancel();
                }
                continue;
            }
            SourceStatus::Exhausted => {
                log::info!("Source épuisée : {}", source.name());
                break;
            }
        };

        if options.mirror {
            frame.mirror_horizontal();
        }

        let started = Instant::now();
        let output = pipeline.process(&frame)?;
        log::trace!("Transformation : {:?}", started.elapsed());
        if output.image.is_none() {
            stats.skipped += 1;
        }

        surface.present(&FrameView {
            source: &frame,
            glyphs: output.glyphs,
            image: output.image,
            fps: fps.fps(),
        })?;
        stats.frames += 1;
        fps.tick();
        if stats.frames % 300 == 0 {
            log::debug!("{} frames, {:.1} FPS, {:?}/frame", stats.frames, fps.fps(), fps.frame_time());
        }

        if surface.poll_quit()? {
            log::info!("Arrêt demandé par {}", surface.name());
            cancel.cancel();
        }
    }

    stats.fps = fps.fps();
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    use gc_core::config::Rows;
    use gc_core::frame::FrameBuffer;
    use gc_core::traits::{DisplaySurface, FrameSource};
    use gc_source::{PatternKind, PatternSource};

    use super::*;

    enum Step {
        Frame(FrameBuffer),
        Pending,
        Fail,
    }

    struct ScriptedSource {
        steps: VecDeque<Step>,
        pulls: Rc<RefCell<usize>>,
    }

    impl FrameSource for ScriptedSource {
        fn next_frame(&mut self) -> Result<SourceStatus> {
            *self.pulls.borrow_mut() += 1;
            match self.steps.pop_front() {
                Some(Step::Frame(f)) => Ok(SourceStatus::Frame(f)),
                Some(Step::Pending) => Ok(SourceStatus::Pending),
                Some(Step::Fail) => anyhow::bail!("périphérique perdu"),
                None => Ok(SourceStatus::Exhausted),
            }
        }

        fn native_size(&self) -> (u32, u32) {
            (8, 8)
        }

        fn is_live(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    #[derive(Default)]
    struct Presented {
        sources: Vec<FrameBuffer>,
        images: Vec<Option<(u32, u32)>>,
    }

    struct RecordingSurface {
        log: Rc<RefCell<Presented>>,
        quit_after: Option<usize>,
    }

    impl DisplaySurface for RecordingSurface {
        fn present(&mut self, view: &FrameView<'_>) -> Result<()> {
            let mut log = self.log.borrow_mut();
            log.sources.push(view.source.clone());
            log.images.push(view.image.map(|i| (i.width, i.height)));
            Ok(())
        }

        fn poll_quit(&mut self) -> Result<bool> {
            Ok(self
                .quit_after
                .is_some_and(|n| self.log.borrow().images.len() >= n))
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    struct Harness {
        session: Session,
        pipeline: AsciiPipeline,
        presented: Rc<RefCell<Presented>>,
        pulls: Rc<RefCell<usize>>,
    }

    fn harness(steps: Vec<Step>, quit_after: Option<usize>) -> Harness {
        let presented = Rc::new(RefCell::new(Presented::default()));
        let pulls = Rc::new(RefCell::new(0));
        let source = ScriptedSource {
            steps: steps.into(),
            pulls: Rc::clone(&pulls),
        };
        let surface = RecordingSurface {
            log: Rc::clone(&presented),
            quit_after,
        };
        let mut config = GlyphcastConfig::default();
        config.grid.cols = 4;
        config.grid.rows = Rows::Count(2);
        Harness {
            session: Session::new(Box::new(source), Box::new(surface)),
            pipeline: AsciiPipeline::new(&config).unwrap(),
            presented,
            pulls,
        }
    }

    fn options(mirror: bool) -> RunOptions {
        RunOptions {
            mirror,
            frame_interval: Duration::ZERO,
            max_frames: None,
        }
    }

    fn gray(v: u8) -> Step {
        Step::Frame(FrameBuffer::filled(8, 8, [v, v, v]))
    }

    #[test]
    fn runs_until_the_source_is_exhausted() {
        let mut h = harness(vec![gray(0), Step::Pending, gray(128), gray(255)], None);
        let stats = run(&mut h.session, &mut h.pipeline, &CancelToken::new(), &options(true)).unwrap();
        assert_eq!(stats.frames, 3);
        assert_eq!(stats.skipped, 0);
        let presented = h.presented.borrow();
        assert_eq!(presented.images, vec![Some((24, 20)); 3]);
        assert_eq!(*h.pulls.borrow(), 5);
    }

    #[test]
    fn cancelled_token_stops_before_any_pull() {
        let mut h = harness(vec![gray(10)], None);
        let cancel = CancelToken::new();
        cancel.cancel();
        let stats = run(&mut h.session, &mut h.pipeline, &cancel, &options(true)).unwrap();
        assert_eq!(stats.frames, 0);
        assert_eq!(*h.pulls.borrow(), 0);
    }

    #[test]
    fn surface_quit_cancels_the_session() {
        let steps = (0..10).map(|_| gray(50)).collect();
        let mut h = harness(steps, Some(2));
        let cancel = CancelToken::new();
        let stats = run(&mut h.session, &mut h.pipeline, &cancel, &options(false)).unwrap();
        assert_eq!(stats.frames, 2);
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn mirror_applies_to_the_forwarded_source() {
        let mut frame = FrameBuffer::new(8, 8);
        frame.put_pixel(0, 0, [255, 255, 255]);
        let mut h = harness(vec![Step::Frame(frame.clone()), Step::Frame(frame)], None);
        run(&mut h.session, &mut h.pipeline, &CancelToken::new(), &options(true)).unwrap();
        let presented = h.presented.borrow();
        assert_eq!(presented.sources[0].pixel(7, 0), [255, 255, 255]);
        assert_eq!(presented.sources[0].pixel(0, 0), [0, 0, 0]);

        let mut frame = FrameBuffer::new(8, 8);
        frame.put_pixel(0, 0, [255, 255, 255]);
        let mut h = harness(vec![Step::Frame(frame)], None);
        run(&mut h.session, &mut h.pipeline, &CancelToken::new(), &options(false)).unwrap();
        assert_eq!(h.presented.borrow().sources[0].pixel(0, 0), [255, 255, 255]);
    }

    #[test]
    fn empty_frames_are_presented_without_image() {
        let mut h = harness(vec![Step::Frame(FrameBuffer::new(0, 0)), gray(200)], None);
        let stats = run(&mut h.session, &mut h.pipeline, &CancelToken::new(), &options(true)).unwrap();
        assert_eq!((stats.frames, stats.skipped), (2, 1));
        assert_eq!(h.presented.borrow().images, vec![None, Some((24, 20))]);
    }

    #[test]
    fn source_failure_ends_the_loop_with_an_error() {
        let mut h = harness(vec![gray(1), Step::Fail, gray(2)], None);
        let err = run(&mut h.session, &mut h.pipeline, &CancelToken::new(), &options(true)).unwrap_err();
        assert!(err.to_string().contains("périphérique perdu"));
        assert_eq!(h.presented.borrow().images.len(), 1);
    }

    #[test]
    fn max_frames_bounds_an_endless_source() {
        let presented = Rc::new(RefCell::new(Presented::default()));
        let surface = RecordingSurface {
            log: Rc::clone(&presented),
            quit_after: None,
        };
        let mut session = Session::new(
            Box::new(PatternSource::new(PatternKind::Gradient, 64, 48)),
            Box::new(surface),
        );
        let mut config = GlyphcastConfig::default();
        config.grid.cols = 32;
        config.grid.rows = Rows::Count(12);
        config.session.capture_fps = 1000;
        let mut pipeline = AsciiPipeline::new(&config).unwrap();
        let options = RunOptions::from_config(&config, Some(5));
        assert_eq!(options.frame_interval, Duration::from_millis(1));
        let stats = run(&mut session, &mut pipeline, &CancelToken::new(), &options).unwrap();
        assert_eq!(stats.frames, 5);
        assert_eq!(presented.borrow().images.len(), 5);
    }
}
