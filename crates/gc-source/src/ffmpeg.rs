// Capture via ffmpeg en sous-processus (std::process::Command).
// Prérequis : `ffmpeg` et `ffprobe` accessibles dans PATH.
//
// Architecture :
//   - `probe_video`     : interroge ffprobe pour width/height/fps d'un fichier
//   - `FfmpegSource`    : lance ffmpeg → flux raw rgb24 sur stdout
//   - thread lecteur    : découpe stdout en frames, canal flume borné (2)
//   - thread stderr     : relaie les messages ffmpeg vers `log`

use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStderr, ChildStdout, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use flume::{Receiver, Sender, TrySendError};
use gc_core::frame::FrameBuffer;
use gc_core::traits::{FrameSource, SourceStatus};

/// Capacité du canal de frames. Les plus récentes gagnent.
const CHANNEL_CAPACITY: usize = 2;

/// Attente maximale d'une frame avant de rendre `Pending`.
const RECV_TIMEOUT: Duration = Duration::from_millis(100);

/// What ffmpeg reads from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptureInput {
    /// Capture device (`/dev/video0`, `0`, `video=Integrated Camera`).
    Device(String),
    /// Video file, decoded in real time.
    File(PathBuf),
}

impl CaptureInput {
    /// Default webcam for the current platform.
    #[must_use]
    pub fn default_device() -> Self {
        let device = if cfg!(target_os = "macos") {
            "0"
        } else if cfg!(target_os = "windows") {
            "video=Integrated Camera"
        } else {
            "/dev/video0"
        };
        Self::Device(device.to_string())
    }
}

/// Métadonnées extraites via ffprobe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    /// Images par seconde (ex: 23.976, 30.0).
    pub fps: f64,
}

/// Interroge `ffprobe` pour obtenir les métadonnées du flux vidéo principal.
///
/// # Errors
/// Retourne une erreur si `ffprobe` est introuvable ou si le fichier
/// ne contient aucun flux vidéo décodable.
pub fn probe_video(path: &Path) -> Result<VideoInfo> {
    let path_str = path.to_str().context("Chemin vidéo invalide (non-UTF8)")?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,r_frame_rate",
            "-of",
            "default=noprint_wrappers=1",
            "-i",
            path_str,
        ])
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .context(
            "Impossible de lancer ffprobe. Vérifiez que ffprobe est installé et dans le PATH.",
        )?;

    let info = parse_probe_output(&String::from_utf8_lossy(&output.stdout));
    if info.width == 0 || info.height == 0 {
        bail!(
            "ffprobe n'a trouvé aucun flux vidéo dans {}",
            path.display()
        );
    }
    log::info!(
        "probe_video: {}x{} @ {:.3}fps — {}",
        info.width,
        info.height,
        info.fps,
        path.display()
    );
    Ok(info)
}

/// Parse `key=value` lines printed by ffprobe. Missing keys give zero size.
fn parse_probe_output(text: &str) -> VideoInfo {
    let mut info = VideoInfo {
        width: 0,
        height: 0,
        fps: 30.0,
    };
    for line in text.lines() {
        if let Some(val) = line.strip_prefix("width=") {
            info.width = val.trim().parse().unwrap_or(0);
        } else if let Some(val) = line.strip_prefix("height=") {
            info.height = val.trim().parse().unwrap_or(0);
        } else if let Some(val) = line.strip_prefix("r_frame_rate=") {
            // "30/1", "30000/1001"
            let mut parts = val.trim().splitn(2, '/');
            let num: f64 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(30.0);
            let den: f64 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(1.0);
            if den > 0.0 && num > 0.0 {
                info.fps = num / den;
            }
        }
    }
    info
}

/// Lit exactement `buf.len()` bytes depuis `reader`.
///
/// # Errors
/// Retourne `Ok(true)` si lu avec succès, `Ok(false)` sur EOF avant complétion,
/// `Err` sur erreur I/O fatale.
///
/// # Example
/// ```
/// use gc_source::ffmpeg::read_exact_or_eof;
/// let mut data: &[u8] = &[1, 2, 3];
/// let mut buf = [0u8; 2];
/// assert!(read_exact_or_eof(&mut data, &mut buf).unwrap());
/// assert!(!read_exact_or_eof(&mut data, &mut buf).unwrap());
/// ```
pub fn read_exact_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<bool> {
    let mut total = 0usize;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => return Ok(false),
            Ok(n) => total += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(true)
}

/// Arguments ffmpeg complets pour `input`, sortie rgb24 `w × h` sur stdout.
fn ffmpeg_args(input: &CaptureInput, w: u32, h: u32, fps: u32) -> Vec<String> {
    let mut args: Vec<String> = ["-hide_banner", "-loglevel", "error", "-nostdin"]
        .into_iter()
        .map(String::from)
        .collect();
    match input {
        CaptureInput::Device(device) => {
            let format = if cfg!(target_os = "macos") {
                "avfoundation"
            } else if cfg!(target_os = "windows") {
                "dshow"
            } else {
                "v4l2"
            };
            args.extend(["-f".into(), format.into()]);
            if cfg!(target_os = "macos") {
                // avfoundation refuse de démarrer sans cadence explicite
                args.extend(["-framerate".into(), fps.to_string()]);
            }
            args.extend(["-i".into(), device.clone()]);
        }
        CaptureInput::File(path) => {
            args.extend([
                "-re".into(),
                "-i".into(),
                path.to_string_lossy().into_owned(),
            ]);
        }
    }
    args.extend([
        "-an".into(),
        "-vf".into(),
        format!("scale={w}:{h}:flags=area"),
        "-r".into(),
        fps.to_string(),
        "-f".into(),
        "rawvideo".into(),
        "-pix_fmt".into(),
        "rgb24".into(),
        "pipe:1".into(),
    ]);
    args
}

/// Source vidéo (webcam ou fichier) décodée par un processus `ffmpeg`.
///
/// Un thread lit les frames rgb24 sur stdout et les pousse dans un canal
/// borné ; quand la boucle de rendu prend du retard, la plus ancienne frame
/// en attente est jetée. `Drop` tue le processus et joint les threads.
pub struct FfmpegSource {
    child: Child,
    frames: Receiver<Result<FrameBuffer>>,
    reader: Option<JoinHandle<()>>,
    stderr_logger: Option<JoinHandle<()>>,
    width: u32,
    height: u32,
    live: bool,
    name: String,
}

impl FfmpegSource {
    /// Start capturing `input` at `width × height`, `fps` frames per second.
    ///
    /// For a file, `height` is recomputed from the probed aspect ratio so
    /// the video is not distorted.
    ///
    /// # Errors
    /// Returns an error if ffmpeg/ffprobe cannot be started, the file has no
    /// video stream, or a size is zero.
    pub fn open(input: CaptureInput, width: u32, height: u32, fps: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(gc_core::CoreError::InvalidDimensions { width, height }.into());
        }
        let fps = fps.max(1);
        let (width, height, live, name) = match &input {
            CaptureInput::Device(device) => (width, height, true, device.clone()),
            CaptureInput::File(path) => {
                if !path.exists() {
                    return Err(gc_core::CoreError::FileNotFound {
                        path: path.display().to_string(),
                    }
                    .into());
                }
                let info = probe_video(path)?;
                let h = (f64::from(width) * f64::from(info.height) / f64::from(info.width))
                    .round()
                    .max(1.0) as u32;
                let name = path
                    .file_name()
                    .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
                (width, h, false, name)
            }
        };

        let args = ffmpeg_args(&input, width, height, fps);
        log::debug!("ffmpeg {}", args.join(" "));
        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .context(
                "Impossible de lancer ffmpeg. Vérifiez que ffmpeg est installé et dans le PATH.",
            )?;

        let stdout = child.stdout.take().context("stdout ffmpeg indisponible")?;
        let stderr = child.stderr.take();

        let (tx, rx) = flume::bounded(CHANNEL_CAPACITY);
        let overflow = rx.clone();
        let reader = thread::Builder::new()
            .name("gc-capture".to_string())
            .spawn(move || capture_loop(stdout, &tx, &overflow, width, height))
            .context("Impossible de spawner le thread de capture")?;
        let stderr_logger = stderr.and_then(|s| {
            thread::Builder::new()
                .name("gc-ffmpeg-log".to_string())
                .spawn(move || log_stderr(s))
                .ok()
        });

        log::info!("Capture ffmpeg démarrée : {name} → {width}x{height} @ {fps}fps");
        Ok(Self {
            child,
            frames: rx,
            reader: Some(reader),
            stderr_logger,
            width,
            height,
            live,
            name,
        })
    }
}

/// Envoie sans bloquer ; si le canal est plein, jette la plus ancienne.
fn push_latest<T>(tx: &Sender<T>, overflow: &Receiver<T>, item: T) -> bool {
    match tx.try_send(item) {
        Ok(()) => true,
        Err(TrySendError::Full(item)) => {
            let _ = overflow.try_recv();
            !matches!(tx.try_send(item), Err(TrySendError::Disconnected(_)))
        }
        Err(TrySendError::Disconnected(_)) => false,
    }
}

/// Boucle du thread lecteur.
fn capture_loop(
    mut stdout: ChildStdout,
    tx: &Sender<Result<FrameBuffer>>,
    overflow: &Receiver<Result<FrameBuffer>>,
    width: u32,
    height: u32,
) {
    let frame_bytes = FrameBuffer::byte_len(width, height);
    let mut count = 0u64;
    loop {
        let mut frame = FrameBuffer::new(width, height);
        match read_exact_or_eof(&mut stdout, &mut frame.data[..frame_bytes]) {
            Ok(true) => {
                count += 1;
                if !push_latest(tx, overflow, Ok(frame)) {
                    break;
                }
            }
            Ok(false) => {
                log::info!("Capture : fin du flux après {count} frames");
                break;
            }
            Err(e) => {
                log::warn!("Capture : erreur lecture pipe : {e}");
                push_latest(tx, overflow, Err(e.context("lecture du flux ffmpeg")));
                break;
            }
        }
    }
}

fn log_stderr(stderr: ChildStderr) {
    for line in BufReader::new(stderr).lines() {
        match line {
            Ok(line) if !line.trim().is_empty() => log::warn!("ffmpeg: {line}"),
            Ok(_) => {}
            Err(_) => break,
        }
    }
}

impl FrameSource for FfmpegSource {
    fn next_frame(&mut self) -> Result<SourceStatus> {
        match self.frames.recv_timeout(RECV_TIMEOUT) {
            Ok(Ok(frame)) => Ok(SourceStatus::Frame(frame)),
            Ok(Err(e)) => Err(e),
            Err(flume::RecvTimeoutError::Timeout) => Ok(SourceStatus::Pending),
            Err(flume::RecvTimeoutError::Disconnected) => {
                if self.live {
                    let status = self.child.try_wait().ok().flatten();
                    bail!(
                        "la capture {} s'est arrêtée (ffmpeg: {})",
                        self.name,
                        status.map_or_else(|| "en cours".to_string(), |s| s.to_string())
                    );
                }
                Ok(SourceStatus::Exhausted)
            }
        }
    }

    fn native_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn is_live(&self) -> bool {
        self.live
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        // Vider le canal : le lecteur ne bloque jamais, mais on libère la mémoire.
        while self.frames.try_recv().is_ok() {}
        if let Some(h) = self.reader.take() {
            let _ = h.join();
        }
        if let Some(h) = self.stderr_logger.take() {
            let _ = h.join();
        }
        log::debug!("Capture {} fermée", self.name);
    }
}
