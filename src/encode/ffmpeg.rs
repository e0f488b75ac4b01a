use std::io::{Read as _, Write as _};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::compositor::raster::FrameRGBA;
use crate::encode::sink::{CaptureSink, EncodeSpec, flatten_to_opaque_rgba8};
use crate::foundation::error::{LectioError, LectioResult};
use crate::model::assets::{Container, VideoHandle};

const READ_CHUNK: usize = 64 * 1024;

pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Arguments for one muxed encode: raw RGBA frames on stdin, captured PCM from a file, the
/// container stream on stdout.
pub fn ffmpeg_args(spec: &EncodeSpec) -> Vec<String> {
    let mut args: Vec<String> = [
        "-y",
        "-loglevel",
        "error",
        "-f",
        "rawvideo",
        "-pix_fmt",
        "rgba",
        "-s",
    ]
    .into_iter()
    .map(String::from)
    .collect();
    args.push(format!("{}x{}", spec.width, spec.height));
    args.push("-r".into());
    args.push(format!("{}/{}", spec.fps.num, spec.fps.den));
    args.extend(["-i".into(), "pipe:0".into()]);

    if let Some(audio) = &spec.audio {
        args.extend([
            "-f".into(),
            "f32le".into(),
            "-ar".into(),
            audio.sample_rate.to_string(),
            "-ac".into(),
            audio.channels.to_string(),
            "-i".into(),
            audio.path.to_string_lossy().into_owned(),
            "-map".into(),
            "0:v".into(),
            "-map".into(),
            "1:a".into(),
        ]);
    }

    args.extend([
        "-c:v".into(),
        spec.format.video_codec.clone(),
        "-pix_fmt".into(),
        "yuv420p".into(),
    ]);
    if spec.audio.is_some() {
        args.extend([
            "-c:a".into(),
            spec.format.audio_codec.clone(),
            "-shortest".into(),
        ]);
    } else {
        args.push("-an".into());
    }

    // stdout is not seekable: mp4 needs a fragmented layout.
    if spec.format.container == Container::Mp4 {
        args.extend(["-movflags".into(), "frag_keyframe+empty_moov".into()]);
    }
    args.extend([
        "-f".into(),
        spec.format.container.muxer().into(),
        "pipe:1".into(),
    ]);
    args
}

struct Running {
    spec: EncodeSpec,
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: JoinHandle<Vec<Vec<u8>>>,
    stderr: JoinHandle<String>,
    frames: u64,
    scratch: Vec<u8>,
}

/// Streams frames into a system `ffmpeg` process and collects the container bytes it writes to
/// stdout.
#[derive(Default)]
pub struct FfmpegSink {
    running: Option<Running>,
}

impl std::fmt::Debug for FfmpegSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FfmpegSink")
            .field("running", &self.running.is_some())
            .finish()
    }
}

impl FfmpegSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CaptureSink for FfmpegSink {
    fn begin(&mut self, spec: &EncodeSpec) -> LectioResult<()> {
        spec.validate()?;
        if self.running.is_some() {
            return Err(LectioError::encode("ffmpeg sink already started"));
        }
        if spec.format.container == Container::Raw {
            return Err(LectioError::encode("ffmpeg sink cannot produce raw output"));
        }
        if !is_ffmpeg_on_path() {
            return Err(LectioError::encode(
                "ffmpeg is required for encoding, but was not found on PATH",
            ));
        }

        let mut child = Command::new("ffmpeg")
            .args(ffmpeg_args(spec))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                LectioError::encode(format!(
                    "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
                ))
            })?;

        let (Some(stdin), Some(mut stdout), Some(mut stderr)) =
            (child.stdin.take(), child.stdout.take(), child.stderr.take())
        else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(LectioError::encode("failed to open ffmpeg pipes (unexpected)"));
        };

        let stdout = std::thread::spawn(move || {
            let mut segments = Vec::new();
            let mut buf = vec![0u8; READ_CHUNK];
            loop {
                match stdout.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => segments.push(buf[..n].to_vec()),
                }
            }
            segments
        });
        let stderr = std::thread::spawn(move || {
            let mut text = String::new();
            let _ = stderr.read_to_string(&mut text);
            text
        });

        tracing::debug!(
            codec = %spec.format.video_codec,
            container = spec.format.container.extension(),
            with_audio = spec.audio.is_some(),
            "ffmpeg encoder started"
        );
        self.running = Some(Running {
            scratch: vec![0u8; spec.frame_bytes()],
            spec: spec.clone(),
            child,
            stdin: Some(stdin),
            stdout,
            stderr,
            frames: 0,
        });
        Ok(())
    }

    fn push_frame(&mut self, frame: &FrameRGBA) -> LectioResult<()> {
        let Some(run) = self.running.as_mut() else {
            return Err(LectioError::encode("ffmpeg sink is not started"));
        };
        run.spec.check_frame(frame)?;
        flatten_to_opaque_rgba8(&mut run.scratch, &frame.data, run.spec.background.to_array())?;

        let Some(stdin) = run.stdin.as_mut() else {
            return Err(LectioError::encode("ffmpeg encoder is already finalized"));
        };
        stdin.write_all(&run.scratch).map_err(|e| {
            LectioError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        run.frames += 1;
        Ok(())
    }

    fn finish(&mut self) -> LectioResult<VideoHandle> {
        let Some(mut run) = self.running.take() else {
            return Err(LectioError::encode("ffmpeg sink is not started"));
        };
        drop(run.stdin.take());

        let status = run
            .child
            .wait()
            .map_err(|e| LectioError::encode(format!("failed to wait for ffmpeg to finish: {e}")))?;
        let segments = run
            .stdout
            .join()
            .map_err(|_| LectioError::encode("ffmpeg stdout reader panicked"))?;
        let stderr = run.stderr.join().unwrap_or_default();

        if !status.success() {
            return Err(LectioError::encode(format!(
                "ffmpeg exited with status {status}: {}",
                stderr.trim()
            )));
        }
        let data: Vec<u8> = segments.concat();
        if data.is_empty() {
            return Err(LectioError::encode("ffmpeg produced no output"));
        }

        tracing::debug!(
            frames = run.frames,
            bytes = data.len(),
            "ffmpeg encoder finished"
        );
        Ok(VideoHandle {
            data: Arc::from(data),
            mime: run.spec.format.mime(),
            container: run.spec.format.container,
            frame_count: run.frames,
            duration: run.spec.duration_of(run.frames),
        })
    }

    fn abort(&mut self) {
        let Some(mut run) = self.running.take() else {
            return;
        };
        drop(run.stdin.take());
        let _ = run.child.kill();
        let _ = run.child.wait();
        let _ = run.stdout.join();
        let _ = run.stderr.join();
        tracing::debug!(frames = run.frames, "ffmpeg encoder aborted");
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        self.abort();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
