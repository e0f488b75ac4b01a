use rayon::prelude::*;

use crate::audio::analyser::FrequencySnapshot;
use crate::compositor::particles::ParticleField;
use crate::compositor::raster::{SceneImage, decode_scene_image};
use crate::compositor::scroll::ScrollState;
use crate::compositor::template::badge_text;
use crate::config::RenderConfig;
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{LectioError, LectioResult};
use crate::model::assets::MediaAssetBundle;
use crate::model::content::ContentItem;
use crate::text::layout::{WordPositionMap, layout};
use crate::text::metrics::FontMetrics;
use crate::text::wrap::wrap_lines;

/// Immutable per-render state shared by every frame of one render.
#[derive(Clone, Debug)]
pub struct Scene {
    pub item: ContentItem,
    pub badge: String,
    pub title_lines: Vec<String>,
    pub words: WordPositionMap,
    pub images: Vec<SceneImage>,
}

impl Scene {
    /// Lay out captions, pre-wrap the title and decode every background image.
    ///
    /// Images decode in parallel; any undecodable image fails the whole scene.
    pub fn build(
        item: &ContentItem,
        bundle: &MediaAssetBundle,
        cfg: &RenderConfig,
        caption_metrics: &mut dyn FontMetrics,
        title_metrics: &mut dyn FontMetrics,
    ) -> LectioResult<Self> {
        bundle.check_renderable()?;

        let max_w = cfg.canvas.width.saturating_mul(2);
        let max_h = cfg.canvas.height.saturating_mul(2);
        let images = bundle
            .images
            .par_iter()
            .enumerate()
            .map(|(i, h)| {
                let bytes = h.source.read_bytes()?;
                decode_scene_image(&bytes, max_w, max_h).map_err(|e| {
                    LectioError::evaluation(format!("background image {i} is unusable: {e}"))
                })
            })
            .collect::<LectioResult<Vec<_>>>()?;

        let mut scene = Self::layout_only(item, cfg, caption_metrics, title_metrics);
        scene.images = images;
        Ok(scene)
    }

    /// Text-only scene for previews and timing; has no images.
    pub fn layout_only(
        item: &ContentItem,
        cfg: &RenderConfig,
        caption_metrics: &mut dyn FontMetrics,
        title_metrics: &mut dyn FontMetrics,
    ) -> Self {
        let words = layout(
            &item.body_text,
            cfg.caption_max_width,
            f64::from(cfg.canvas.width),
            cfg.line_height,
            caption_metrics,
        );
        let title_lines = wrap_lines(&item.display_title(), cfg.title_max_width, title_metrics);
        Self {
            item: item.clone(),
            badge: badge_text(item.category.label(), &item.display_date),
            title_lines,
            words,
            images: Vec::new(),
        }
    }
}

/// What the frame loop knows about the current instant.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameState {
    pub index: FrameIndex,
    pub progress: f64,
    pub position_secs: f64,
    pub snapshot: FrequencySnapshot,
}

/// Cross-frame smoothing state, owned by the caller and threaded through every paint.
#[derive(Clone, Debug)]
pub struct CarryState {
    pub scroll: ScrollState,
    pub particles: ParticleField,
}

impl CarryState {
    pub fn new(cfg: &RenderConfig) -> Self {
        Self {
            scroll: ScrollState::default(),
            particles: ParticleField::new(cfg.particle_count, cfg.particle_seed, cfg.canvas),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compositor/scene.rs"]
mod tests;
