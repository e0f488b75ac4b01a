use std::path::{Path, PathBuf};

use crate::audio::analyser::{Analyser, FrequencySnapshot};
use crate::audio::clock::{PlaybackClock, TransportStatus};
use crate::audio::decode::{DecodedAudio, write_f32le_file};
use crate::config::AnalyserConfig;
use crate::foundation::error::LectioResult;

/// Raw PCM the encoder muxes next to the video stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureAudio {
    pub path: PathBuf,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Everything one frame needs from the audio side, read at a single timeline instant.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameSample {
    pub position_secs: f64,
    pub progress: f64,
    pub snapshot: FrequencySnapshot,
}

struct TempFileGuard(Option<PathBuf>);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

/// One decoded source feeding three sinks: the playback transport, the analysis tap and the
/// capture file handed to the encoder.
///
/// Exclusively owned by one render.
pub struct AudioGraph {
    source: DecodedAudio,
    transport: Box<dyn PlaybackClock>,
    analysis: Analyser,
    capture: TempFileGuard,
}

impl std::fmt::Debug for AudioGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioGraph")
            .field("duration_secs", &self.source.duration_secs())
            .field("status", &self.transport.status())
            .field("capture", &self.capture.0)
            .finish()
    }
}

impl AudioGraph {
    pub fn new(
        source: DecodedAudio,
        transport: Box<dyn PlaybackClock>,
        analyser: &AnalyserConfig,
    ) -> LectioResult<Self> {
        Ok(Self {
            analysis: Analyser::new(analyser)?,
            source,
            transport,
            capture: TempFileGuard(None),
        })
    }

    pub fn source(&self) -> &DecodedAudio {
        &self.source
    }

    pub fn duration_secs(&self) -> f64 {
        self.transport.duration_secs()
    }

    pub fn bin_count(&self) -> usize {
        self.analysis.bin_count()
    }

    /// Materialize the capture sink as a raw f32le file under `dir`.
    ///
    /// The file lives until [`AudioGraph::release`] (or drop).
    pub fn open_capture(&mut self, dir: &Path) -> LectioResult<CaptureAudio> {
        if let Some(path) = &self.capture.0 {
            return Ok(self.capture_audio(path.clone()));
        }
        let path = dir.join(format!(
            "lectio_capture_{}_{}.f32le",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or(0)
        ));
        write_f32le_file(&self.source.interleaved, &path)?;
        self.capture.0 = Some(path.clone());
        Ok(self.capture_audio(path))
    }

    fn capture_audio(&self, path: PathBuf) -> CaptureAudio {
        CaptureAudio {
            path,
            sample_rate: self.source.sample_rate,
            channels: self.source.channels,
        }
    }

    /// Start playback; capture consumes frames from this instant on.
    pub fn start(&mut self) {
        self.analysis.reset();
        self.transport.start();
    }

    pub fn pause(&mut self) {
        self.transport.pause();
    }

    pub fn resume(&mut self) {
        self.transport.resume();
    }

    pub fn status(&self) -> TransportStatus {
        self.transport.status()
    }

    pub fn is_playing(&self) -> bool {
        self.transport.status() == TransportStatus::Playing
    }

    /// Read the playback position once and analyse exactly that instant.
    pub fn sample(&mut self) -> LectioResult<FrameSample> {
        let position_secs = self.transport.position_secs();
        let progress = self.transport.progress();
        let snapshot = self.analysis.snapshot(&self.source, position_secs)?;
        Ok(FrameSample {
            position_secs,
            progress,
            snapshot,
        })
    }

    pub fn frame_presented(&mut self) {
        self.transport.frame_presented();
    }

    /// Tear down the graph and delete the capture file.
    pub fn release(self) {
        tracing::debug!(capture = ?self.capture.0, "releasing audio graph");
        drop(self);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/graph.rs"]
mod tests;
