use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use crate::foundation::error::{LectioError, LectioResult};
use crate::model::assets::{AudioHandle, MediaSource};

/// Sample rate used when the narration has to be decoded through ffmpeg.
pub const FFMPEG_DECODE_RATE: u32 = 48_000;

/// Interleaved f32 PCM for the whole narration track.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedAudio {
    pub sample_rate: u32,
    pub channels: u16,
    pub interleaved: Arc<[f32]>,
}

impl DecodedAudio {
    pub fn new(sample_rate: u32, channels: u16, interleaved: Vec<f32>) -> LectioResult<Self> {
        if sample_rate == 0 || channels == 0 {
            return Err(LectioError::validation(
                "audio sample_rate/channels must be > 0",
            ));
        }
        if !interleaved.len().is_multiple_of(usize::from(channels)) {
            return Err(LectioError::validation(
                "interleaved sample count is not a multiple of the channel count",
            ));
        }
        Ok(Self {
            sample_rate,
            channels,
            interleaved: Arc::from(interleaved),
        })
    }

    /// Number of sample frames (one sample per channel).
    pub fn frame_len(&self) -> usize {
        self.interleaved.len() / usize::from(self.channels)
    }

    pub fn duration_secs(&self) -> f64 {
        self.frame_len() as f64 / f64::from(self.sample_rate)
    }

    pub fn is_empty(&self) -> bool {
        self.frame_len() == 0
    }

    /// Channel average of sample frame `i`; silence outside the track.
    pub fn mono_at(&self, i: i64) -> f32 {
        if i < 0 || i as usize >= self.frame_len() {
            return 0.0;
        }
        let ch = usize::from(self.channels);
        let start = i as usize * ch;
        let sum: f32 = self.interleaved[start..start + ch].iter().sum();
        sum / ch as f32
    }
}

/// Decode a narration track. WAV goes through `hound`; anything else is handed to ffmpeg.
#[tracing::instrument(skip(audio))]
pub fn decode_audio(audio: &AudioHandle) -> LectioResult<DecodedAudio> {
    let decoded = match &audio.source {
        MediaSource::Memory(bytes) if is_wav(bytes) => decode_wav(bytes)?,
        MediaSource::Path(p) if has_wav_extension(p) => {
            let bytes = audio.source.read_bytes()?;
            decode_wav(&bytes)?
        }
        MediaSource::Path(p) => decode_with_ffmpeg(FfmpegInput::Path(p))?,
        MediaSource::Memory(bytes) => decode_with_ffmpeg(FfmpegInput::Bytes(bytes))?,
    };
    if decoded.is_empty() {
        return Err(LectioError::precondition("narration audio has no samples"));
    }
    tracing::debug!(
        sample_rate = decoded.sample_rate,
        channels = decoded.channels,
        duration_secs = decoded.duration_secs(),
        "decoded narration"
    );
    Ok(decoded)
}

fn is_wav(bytes: &[u8]) -> bool {
    bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE"
}

fn has_wav_extension(p: &Path) -> bool {
    p.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("wav"))
}

/// Decode RIFF/WAVE bytes, normalizing integer PCM to `[-1, 1]`.
pub fn decode_wav(bytes: &[u8]) -> LectioResult<DecodedAudio> {
    let reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| LectioError::validation(format!("invalid wav data: {e}")))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| LectioError::validation(format!("wav decode failed: {e}")))?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()
                .map_err(|e| LectioError::validation(format!("wav decode failed: {e}")))?
        }
    };

    DecodedAudio::new(spec.sample_rate, spec.channels, samples)
}

#[derive(Clone, Copy)]
enum FfmpegInput<'a> {
    Path(&'a Path),
    Bytes(&'a [u8]),
}

fn decode_with_ffmpeg(input: FfmpegInput<'_>) -> LectioResult<DecodedAudio> {
    use std::io::Write as _;
    use std::process::{Command, Stdio};

    let mut cmd = Command::new("ffmpeg");
    cmd.args(["-v", "error", "-i"]);
    match input {
        FfmpegInput::Path(p) => {
            cmd.arg(p).stdin(Stdio::null());
        }
        FfmpegInput::Bytes(_) => {
            cmd.arg("pipe:0").stdin(Stdio::piped());
        }
    }
    cmd.args([
        "-vn",
        "-f",
        "f32le",
        "-acodec",
        "pcm_f32le",
        "-ac",
        "2",
        "-ar",
        &FFMPEG_DECODE_RATE.to_string(),
        "pipe:1",
    ])
    .stdout(Stdio::piped())
    .stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(|e| {
        LectioError::precondition(format!("failed to run ffmpeg for audio decode: {e}"))
    })?;

    let feeder = match (input, child.stdin.take()) {
        (FfmpegInput::Bytes(bytes), Some(mut stdin)) => {
            let owned = bytes.to_vec();
            Some(std::thread::spawn(move || {
                // ffmpeg may stop reading early on malformed input; the exit status reports it
                let _ = stdin.write_all(&owned);
            }))
        }
        _ => None,
    };

    let out = child.wait_with_output().map_err(|e| {
        LectioError::evaluation(format!("failed to wait for ffmpeg audio decode: {e}"))
    })?;
    if let Some(h) = feeder {
        let _ = h.join();
    }

    if !out.status.success() {
        return Err(LectioError::evaluation(format!(
            "ffmpeg audio decode failed: {}",
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    if !out.stdout.len().is_multiple_of(4) {
        return Err(LectioError::evaluation(
            "decoded audio byte length is not aligned to f32 samples",
        ));
    }

    let pcm: Vec<f32> = out
        .stdout
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    DecodedAudio::new(FFMPEG_DECODE_RATE, 2, pcm)
}

/// Write interleaved samples as raw little-endian f32, the format the encoder reads back.
pub fn write_f32le_file(samples: &[f32], out_path: &Path) -> LectioResult<()> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            LectioError::evaluation(format!(
                "failed to create audio capture directory '{}': {e}",
                parent.display()
            ))
        })?;
    }

    let mut bytes = Vec::<u8>::with_capacity(samples.len() * 4);
    for &s in samples {
        bytes.extend_from_slice(&s.to_le_bytes());
    }
    std::fs::write(out_path, bytes).map_err(|e| {
        LectioError::evaluation(format!(
            "failed to write audio capture '{}': {e}",
            out_path.display()
        ))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/audio/decode.rs"]
mod tests;
