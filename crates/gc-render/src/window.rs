// Fenêtres d'aperçu via ffplay en sous-processus : les frames RGB brutes
// sont écrites sur stdin. Fermer la fenêtre (ou `q`/Esc dedans) termine
// ffplay, ce que `poll_quit` détecte.

use std::io::{ErrorKind, Write};
use std::process::{Child, ChildStdin, Command, Stdio};

use anyhow::{Context, Result};
use gc_core::frame::FrameBuffer;
use gc_core::traits::{DisplaySurface, FrameView};

/// Titre de la fenêtre principale.
pub const ASCII_TITLE: &str = "ASCII Art";
/// Titre de la fenêtre d'aperçu de la source.
pub const SOURCE_TITLE: &str = "Source";

/// Arguments ffplay pour un flux rgb24 `width × height`.
#[must_use]
pub fn ffplay_args(title: &str, width: u32, height: u32, fps: u32, fullscreen: bool) -> Vec<String> {
    let mut args: Vec<String> = [
        "-hide_banner",
        "-loglevel",
        "error",
        "-fflags",
        "nobuffer",
        "-flags",
        "low_delay",
        "-f",
        "rawvideo",
        "-pixel_format",
        "rgb24",
    ]
    .into_iter()
    .map(String::from)
    .collect();
    args.extend([
        "-video_size".into(),
        format!("{width}x{height}"),
        "-framerate".into(),
        fps.max(1).to_string(),
        "-window_title".into(),
        title.to_string(),
    ]);
    if fullscreen {
        args.push("-fs".into());
    }
    args.extend(["-i".into(), "pipe:0".into()]);
    args
}

/// Une fenêtre ffplay alimentée par un pipe.
struct FfplayWindow {
    child: Child,
    stdin: Option<ChildStdin>,
    width: u32,
    height: u32,
    title: &'static str,
}

impl FfplayWindow {
    fn spawn(title: &'static str, width: u32, height: u32, fps: u32, fullscreen: bool) -> Result<Self> {
        let mut child = Command::new("ffplay")
            .args(ffplay_args(title, width, height, fps, fullscreen))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .context("Impossible de lancer ffplay. Vérifiez qu'il est installé et dans le PATH.")?;
        let stdin = child.stdin.take();
        log::info!("Fenêtre « {title} » ouverte ({width}x{height})");
        Ok(Self {
            child,
            stdin,
            width,
            height,
            title,
        })
    }

    /// Écrit une frame. `Ok(false)` si la fenêtre a été fermée.
    fn write_frame(&mut self, frame: &FrameBuffer) -> Result<bool> {
        let Some(stdin) = self.stdin.as_mut() else {
            return Ok(false);
        };
        match stdin.write_all(&frame.data) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                self.stdin = None;
                Ok(false)
            }
            Err(e) => Err(e).with_context(|| format!("écriture vers « {} »", self.title)),
        }
    }

    fn is_closed(&mut self) -> bool {
        self.stdin.is_none() || matches!(self.child.try_wait(), Ok(Some(_)))
    }
}

impl Drop for FfplayWindow {
    fn drop(&mut self) {
        drop(self.stdin.take());
        let _ = self.child.kill();
        let _ = self.child.wait();
        log::debug!("Fenêtre « {} » fermée", self.title);
    }
}

/// Surface à fenêtres : image ASCII (plein écran par défaut) et, en option,
/// frame source dans une seconde fenêtre.
///
/// Une fenêtre est relancée quand la taille des frames change.
pub struct WindowSurface {
    ascii: Option<FfplayWindow>,
    source: Option<FfplayWindow>,
    show_source: bool,
    fullscreen: bool,
    fps: u32,
    ascii_closed: bool,
}

impl WindowSurface {
    /// Fenêtres créées paresseusement à la première frame.
    #[must_use]
    pub fn new(show_source: bool, fullscreen: bool, fps: u32) -> Self {
        Self {
            ascii: None,
            source: None,
            show_source,
            fullscreen,
            fps,
            ascii_closed: false,
        }
    }
}

/// Window matching `frame`, spawning or respawning it when needed.
fn window_for<'w>(
    slot: &'w mut Option<FfplayWindow>,
    title: &'static str,
    frame: &FrameBuffer,
    fps: u32,
    fullscreen: bool,
) -> Result<&'w mut FfplayWindow> {
    let window = match slot.take() {
        Some(w) if w.width == frame.width && w.height == frame.height => w,
        stale => {
            if stale.is_some() {
                log::info!("« {title} » : nouvelle taille {}x{}, relance", frame.width, frame.height);
            }
            drop(stale);
            FfplayWindow::spawn(title, frame.width, frame.height, fps, fullscreen)?
        }
    };
    Ok(slot.insert(window))
}

impl DisplaySurface for WindowSurface {
    fn present(&mut self, view: &FrameView<'_>) -> Result<()> {
        if let Some(image) = view.image
            && !self.ascii_closed
        {
            let window = window_for(&mut self.ascii, ASCII_TITLE, image, self.fps, self.fullscreen)?;
            if !window.write_frame(image)? {
                self.ascii_closed = true;
            }
        }

        if self.show_source && !view.source.is_empty() {
            let window = window_for(&mut self.source, SOURCE_TITLE, view.source, self.fps, false)?;
            if !window.write_frame(view.source)? {
                log::info!("Fenêtre source fermée, aperçu désactivé");
                self.show_source = false;
                self.source = None;
            }
        }
        Ok(())
    }

    fn poll_quit(&mut self) -> Result<bool> {
        if let Some(window) = self.ascii.as_mut()
            && window.is_closed()
        {
            self.ascii_closed = true;
        }
        Ok(self.ascii_closed)
    }

    fn name(&self) -> &'static str {
        "window"
    }
}
