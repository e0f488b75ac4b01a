use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use anyhow::Context as _;

use crate::config::RenderConfig;
use crate::foundation::error::{LectioError, LectioResult};
use crate::model::assets::{AudioHandle, ImageHandle, MediaAssetBundle, VideoHandle};
use crate::model::content::{ContentItem, liturgical_order};

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Readings for a date. Failure is one descriptive error for the whole date.
pub trait ContentSource: Send + Sync {
    fn items_for(&self, date: &str) -> BoxFuture<LectioResult<Vec<ContentItem>>>;
}

/// Produces the media of one item. Images and audio are requested independently so either may
/// fail without losing the other.
pub trait AssetGenerator: Send + Sync {
    fn images(
        &self,
        item: ContentItem,
        art_direction: Option<String>,
    ) -> BoxFuture<LectioResult<Vec<ImageHandle>>>;

    fn audio(&self, item: ContentItem) -> BoxFuture<LectioResult<AudioHandle>>;
}

pub trait VideoRenderer: Send + Sync {
    fn render(
        &self,
        item: ContentItem,
        bundle: MediaAssetBundle,
    ) -> BoxFuture<LectioResult<VideoHandle>>;
}

/// Content read from a JSON file mapping a date key to its items.
///
/// ```json
/// { "2026-10-18": [ { "id": "...", "category": "gospel", ... } ] }
/// ```
#[derive(Clone, Debug)]
pub struct JsonContentSource {
    days: BTreeMap<String, Vec<ContentItem>>,
}

impl JsonContentSource {
    pub fn from_path(path: &Path) -> LectioResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read content file '{}'", path.display()))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> LectioResult<Self> {
        let days: BTreeMap<String, Vec<ContentItem>> = serde_json::from_str(text)
            .map_err(|e| LectioError::validation(format!("invalid content json: {e}")))?;
        for item in days.values().flatten() {
            item.validate()?;
        }
        Ok(Self { days })
    }

    pub fn dates(&self) -> impl Iterator<Item = &str> {
        self.days.keys().map(String::as_str)
    }
}

impl ContentSource for JsonContentSource {
    fn items_for(&self, date: &str) -> BoxFuture<LectioResult<Vec<ContentItem>>> {
        let found = self.days.get(date).cloned();
        let date = date.to_string();
        Box::pin(async move {
            match found {
                Some(items) if !items.is_empty() => Ok(liturgical_order(items)),
                _ => Err(LectioError::upstream(format!("no readings published for {date}"))),
            }
        })
    }
}

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];
const AUDIO_EXTENSIONS: [&str; 5] = ["wav", "mp3", "m4a", "ogg", "opus"];

/// Pre-generated media on disk: `<root>/<item id>/` holds the images (in file-name order) and one
/// `narration.*` audio file.
#[derive(Clone, Debug)]
pub struct DirectoryAssets {
    root: PathBuf,
}

impl DirectoryAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn item_dir(&self, item: &ContentItem) -> PathBuf {
        self.root.join(&item.id)
    }

    pub fn find_images(&self, item: &ContentItem) -> LectioResult<Vec<ImageHandle>> {
        let dir = self.item_dir(item);
        let mut paths = list_with_extensions(&dir, &IMAGE_EXTENSIONS, |_| true)?;
        paths.sort();
        if paths.is_empty() {
            return Err(LectioError::upstream(format!(
                "no images for '{}' in '{}'",
                item.id,
                dir.display()
            )));
        }
        Ok(paths.into_iter().map(ImageHandle::from_path).collect())
    }

    pub fn find_audio(&self, item: &ContentItem) -> LectioResult<AudioHandle> {
        let dir = self.item_dir(item);
        let mut paths = list_with_extensions(&dir, &AUDIO_EXTENSIONS, |stem| stem == "narration")?;
        paths.sort();
        paths
            .into_iter()
            .next()
            .map(AudioHandle::from_path)
            .ok_or_else(|| {
                LectioError::upstream(format!(
                    "no narration for '{}' in '{}'",
                    item.id,
                    dir.display()
                ))
            })
    }
}

fn list_with_extensions(
    dir: &Path,
    extensions: &[&str],
    stem_ok: impl Fn(&str) -> bool,
) -> LectioResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to list '{}'", dir.display()))?;
    let mut out = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to list '{}'", dir.display()))?
            .path();
        let ext_ok = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)));
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
        if path.is_file() && ext_ok && stem_ok(stem) {
            out.push(path);
        }
    }
    Ok(out)
}

impl AssetGenerator for DirectoryAssets {
    fn images(
        &self,
        item: ContentItem,
        _art_direction: Option<String>,
    ) -> BoxFuture<LectioResult<Vec<ImageHandle>>> {
        let this = self.clone();
        Box::pin(async move {
            tokio::task::spawn_blocking(move || this.find_images(&item))
                .await
                .map_err(|e| LectioError::evaluation(format!("image lookup task failed: {e}")))?
        })
    }

    fn audio(&self, item: ContentItem) -> BoxFuture<LectioResult<AudioHandle>> {
        let this = self.clone();
        Box::pin(async move {
            tokio::task::spawn_blocking(move || this.find_audio(&item))
                .await
                .map_err(|e| LectioError::evaluation(format!("audio lookup task failed: {e}")))?
        })
    }
}

/// The built-in compositor and ffmpeg encoder behind [`VideoRenderer`].
#[derive(Clone, Debug)]
pub struct PipelineRenderer {
    cfg: RenderConfig,
}

impl PipelineRenderer {
    pub fn new(cfg: RenderConfig) -> Self {
        Self { cfg }
    }
}

impl VideoRenderer for PipelineRenderer {
    fn render(
        &self,
        item: ContentItem,
        bundle: MediaAssetBundle,
    ) -> BoxFuture<LectioResult<VideoHandle>> {
        let cfg = self.cfg.clone();
        Box::pin(async move { crate::pipeline::render::render(&item, &bundle, &cfg).await })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/orchestrate/sources.rs"]
mod tests;
