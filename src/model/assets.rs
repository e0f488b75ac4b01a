use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;

use crate::foundation::error::{LectioError, LectioResult};

/// Where a finished medium lives: on disk or in memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MediaSource {
    Path(PathBuf),
    Memory(Arc<[u8]>),
}

impl MediaSource {
    pub fn read_bytes(&self) -> LectioResult<Arc<[u8]>> {
        match self {
            MediaSource::Path(p) => {
                let bytes = std::fs::read(p)
                    .with_context(|| format!("failed to read media '{}'", p.display()))?;
                Ok(Arc::from(bytes))
            }
            MediaSource::Memory(b) => Ok(b.clone()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            MediaSource::Path(p) => Some(p),
            MediaSource::Memory(_) => None,
        }
    }
}

/// A finished background image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageHandle {
    pub source: MediaSource,
}

impl ImageHandle {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            source: MediaSource::Path(path.into()),
        }
    }

    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            source: MediaSource::Memory(bytes.into()),
        }
    }
}

/// A finished narration track.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioHandle {
    pub source: MediaSource,
}

impl AudioHandle {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            source: MediaSource::Path(path.into()),
        }
    }

    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            source: MediaSource::Memory(bytes.into()),
        }
    }
}

/// Container of an encoded deliverable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    Mp4,
    WebM,
    /// Uncompressed RGBA frames (in-memory capture, tests).
    Raw,
}

impl Container {
    pub fn extension(self) -> &'static str {
        match self {
            Container::Mp4 => "mp4",
            Container::WebM => "webm",
            Container::Raw => "rgba",
        }
    }

    /// ffmpeg muxer name.
    pub fn muxer(self) -> &'static str {
        match self {
            Container::Mp4 => "mp4",
            Container::WebM => "webm",
            Container::Raw => "rawvideo",
        }
    }
}

/// The single muxed audio+video object produced by a render.
#[derive(Clone, Debug)]
pub struct VideoHandle {
    pub data: Arc<[u8]>,
    pub mime: String,
    pub container: Container,
    pub frame_count: u64,
    pub duration: Duration,
}

impl VideoHandle {
    pub fn len_bytes(&self) -> usize {
        self.data.len()
    }

    /// Write the deliverable to `path`, creating parent directories.
    pub fn write_to(&self, path: &Path) -> LectioResult<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create output directory '{}'", parent.display())
            })?;
        }
        std::fs::write(path, &self.data)
            .with_context(|| format!("failed to write video '{}'", path.display()))?;
        Ok(())
    }
}

/// Per-item collection of generated media and job flags.
///
/// Mutated by the asset generator (images, audio, flags) and by the renderer (`rendered_video`).
/// Replaced on regeneration, never deleted.
#[derive(Clone, Debug, Default)]
pub struct MediaAssetBundle {
    pub owner_id: String,
    pub images: Vec<ImageHandle>,
    pub audio: Option<AudioHandle>,
    pub rendered_video: Option<VideoHandle>,
    pub image_job_running: bool,
    pub audio_job_running: bool,
    pub video_job_running: bool,
    pub art_direction_prompt: Option<String>,
}

impl MediaAssetBundle {
    /// Empty bundle created when an item is registered.
    pub fn empty(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            ..Self::default()
        }
    }

    pub fn images_ready(&self) -> bool {
        !self.images.is_empty() && !self.image_job_running
    }

    pub fn audio_ready(&self) -> bool {
        self.audio.is_some() && !self.audio_job_running
    }

    /// Both media present: the renderer may be invoked.
    pub fn is_renderable(&self) -> bool {
        self.images_ready() && self.audio_ready()
    }

    /// Render precondition: at least one image and an audio track.
    pub fn check_renderable(&self) -> LectioResult<()> {
        if self.images.is_empty() {
            return Err(LectioError::precondition(format!(
                "bundle '{}' has no images",
                self.owner_id
            )));
        }
        if self.audio.is_none() {
            return Err(LectioError::precondition(format!(
                "bundle '{}' has no audio",
                self.owner_id
            )));
        }
        Ok(())
    }
}
