use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;

use crate::compositor::crop::{ken_burns_window, window_to_canvas};
use crate::compositor::raster::{
    FrameRGBA, SceneImage, affine_to_cpu, color, rect_to_cpu, scrim_image, shape_to_cpu,
};
use crate::compositor::scene::{CarryState, FrameState, Scene};
use crate::compositor::schedule::active_image;
use crate::compositor::scroll::ScrollState;
use crate::compositor::template::Template;
use crate::compositor::visualizer::bar_rects;
use crate::config::RenderConfig;
use crate::foundation::core::{Affine, Rect, Rgba8};
use crate::foundation::error::{LectioError, LectioResult};
use crate::model::assets::MediaAssetBundle;
use crate::model::content::ContentItem;
use crate::text::font::{FontFace, resolve_font_path};
use crate::text::layout::WordState;
use crate::text::metrics::FontMetrics;

/// Fraction of an image slice spent cross-fading from the previous image.
const CROSSFADE: f64 = 0.12;
const OUTLINE_WIDTH: f64 = 3.0;
const SHADOW_OFFSET: (f64, f64) = (3.0, 4.0);

/// Per-frame drawing contract used by the render pipeline.
///
/// `prepare` runs once per render before the frame loop; `paint_frame` runs once per frame and
/// keeps every cross-frame value in the caller's [`CarryState`].
pub trait ScenePainter: Send {
    fn prepare(&mut self, item: &ContentItem, bundle: &MediaAssetBundle) -> LectioResult<Scene>;

    fn paint_frame(
        &mut self,
        scene: &Scene,
        frame: &FrameState,
        carry: &mut CarryState,
    ) -> LectioResult<FrameRGBA>;
}

/// The fixed vertical template rasterized on the CPU.
pub struct Compositor {
    cfg: RenderConfig,
    template: Template,
    caption_font: FontFace,
    title_font: FontFace,
    label_font: FontFace,
    ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
    scrim: vello_cpu::Image,
}

impl std::fmt::Debug for Compositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compositor")
            .field("canvas", &self.cfg.canvas)
            .field("font", &self.caption_font.family())
            .finish()
    }
}

impl Compositor {
    /// Build a compositor using the configured font, or the first system font found.
    pub fn new(cfg: RenderConfig) -> LectioResult<Self> {
        let path = resolve_font_path(cfg.font_path.as_deref())?;
        Self::with_font_file(cfg, &path)
    }

    pub fn with_font_file(cfg: RenderConfig, path: &Path) -> LectioResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read font '{}'", path.display()))?;
        Self::with_font_bytes(cfg, Arc::new(bytes))
    }

    pub fn with_font_bytes(cfg: RenderConfig, font_bytes: Arc<Vec<u8>>) -> LectioResult<Self> {
        cfg.validate()?;
        let width: u16 = cfg
            .canvas
            .width
            .try_into()
            .map_err(|_| LectioError::precondition("canvas width exceeds u16"))?;
        let height: u16 = cfg
            .canvas
            .height
            .try_into()
            .map_err(|_| LectioError::precondition("canvas height exceeds u16"))?;

        let caption_font = FontFace::from_bytes(font_bytes, cfg.caption_font_size)?;
        let title_font = caption_font.resized(cfg.title_font_size)?;
        let label_font = caption_font.resized(cfg.label_font_size)?;
        let template = Template::new(&cfg);
        let scrim = scrim_image(
            cfg.theme.scrim,
            cfg.canvas.height,
            template.scrim_top,
            template.scrim_bottom,
        )?;

        Ok(Self {
            template,
            caption_font,
            title_font,
            label_font,
            ctx: vello_cpu::RenderContext::new(width, height),
            pixmap: vello_cpu::Pixmap::new(width, height),
            scrim,
            cfg,
        })
    }

    pub fn config(&self) -> &RenderConfig {
        &self.cfg
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Caption measurement, for previews that want the exact production layout.
    pub fn caption_metrics(&mut self) -> &mut dyn FontMetrics {
        &mut self.caption_font
    }

    fn draw_background(&mut self, scene: &Scene, frame: &FrameState) {
        let canvas_rect = Rect::new(0.0, 0.0, self.template.width, self.template.height);
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(color(self.cfg.theme.background));
        self.ctx.fill_rect(&rect_to_cpu(canvas_rect));

        let Some(slot) = active_image(frame.progress, scene.images.len()) else {
            return;
        };
        let level = frame.snapshot.average_level;

        if slot.index > 0 && slot.local_progress < CROSSFADE {
            self.draw_image(&scene.images[slot.index - 1], 1.0, level, 1.0);
            let fade = (slot.local_progress / CROSSFADE) as f32;
            self.draw_image(&scene.images[slot.index], slot.local_progress, level, fade);
        } else {
            self.draw_image(&scene.images[slot.index], slot.local_progress, level, 1.0);
        }

        self.ctx.set_transform(affine_to_cpu(Affine::scale_non_uniform(
            self.template.width,
            1.0,
        )));
        self.ctx.set_paint(self.scrim.clone());
        self.ctx
            .fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, 1.0, self.template.height));
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    }

    fn draw_image(&mut self, img: &SceneImage, local: f64, level: f32, opacity: f32) {
        let window = ken_burns_window(
            f64::from(img.width),
            f64::from(img.height),
            self.cfg.canvas,
            local,
            self.cfg.zoom_range,
            self.cfg.pulse_gain,
            level,
        );
        self.ctx
            .set_transform(affine_to_cpu(window_to_canvas(window, self.cfg.canvas)));
        self.ctx.set_paint(img.paint.clone());
        if opacity < 1.0 {
            self.ctx.push_opacity_layer(opacity);
        }
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(img.width),
            f64::from(img.height),
        ));
        if opacity < 1.0 {
            self.ctx.pop_layer();
        }
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    }

    fn draw_particles(&mut self, carry: &CarryState) {
        let base = self.cfg.theme.particle;
        for p in carry.particles.particles() {
            self.ctx.set_paint(color(base.with_opacity(p.alpha)));
            let circle = kurbo::Circle::new((p.x, p.y), p.radius);
            self.ctx.fill_path(&shape_to_cpu(&circle));
        }
    }

    fn draw_header(&mut self, scene: &Scene) {
        let t = &self.template;
        let text_w = f64::from(self.label_font.advance(&scene.badge));
        let pad = t.badge.height() * 0.6;
        let w = (text_w + 2.0 * pad).min(t.width - 40.0);
        let cx = t.badge.center().x;
        let badge = kurbo::RoundedRect::new(
            cx - w / 2.0,
            t.badge.y0,
            cx + w / 2.0,
            t.badge.y1,
            t.badge.height() / 2.0,
        );
        self.ctx.set_paint(color(self.cfg.theme.accent.with_opacity(0.92)));
        self.ctx.fill_path(&shape_to_cpu(&badge));

        let text_y = t.badge.center().y - f64::from(self.label_font.size_px()) * 0.6;
        self.ctx.set_paint(color(self.cfg.theme.background));
        self.label_font
            .draw(&mut self.ctx, &scene.badge, cx - text_w / 2.0, text_y, false);

        let line_h = t.title_line_height;
        let top = t.title_top;
        let max_lines = t.title_max_lines;
        let width = t.width;
        self.ctx.set_paint(color(self.cfg.theme.text));
        for (i, line) in scene.title_lines.iter().take(max_lines).enumerate() {
            let w = f64::from(self.title_font.advance(line));
            let y = top + i as f64 * line_h;
            self.title_font
                .draw(&mut self.ctx, line, (width - w) / 2.0, y, false);
        }
    }

    fn draw_captions(&mut self, scene: &Scene, frame: &FrameState, carry: &mut CarryState) {
        let Some(active) = scene.words.active_word(frame.progress) else {
            return;
        };
        let target = ScrollState::target(self.template.view_center_y, active.y_offset);
        let offset = carry.scroll.advance(target, self.cfg.scroll_smoothing);

        let line_h = scene.words.line_height;
        let glyph_box = f64::from(self.caption_font.size_px()) * 1.2;
        let band = self.template.caption;
        let theme = self.cfg.theme.clone();

        for (i, word) in scene.words.words.iter().enumerate() {
            let line_top = word.y_offset + offset - line_h / 2.0;
            if !band.contains_line(line_top, line_h) {
                continue;
            }
            let opacity = band.edge_opacity(line_top, line_h);
            if opacity <= 0.0 {
                continue;
            }
            let y = line_top + (line_h - glyph_box) / 2.0;
            let x = word.x_offset;

            if opacity < 1.0 {
                self.ctx.push_opacity_layer(opacity);
            }
            match scene.words.word_state(i, frame.progress) {
                WordState::Active => {
                    self.ctx.set_paint(color(theme.shadow));
                    self.caption_font.draw(
                        &mut self.ctx,
                        &word.text,
                        x + SHADOW_OFFSET.0,
                        y + SHADOW_OFFSET.1,
                        false,
                    );
                    self.ctx.set_paint(color(theme.accent));
                    self.caption_font
                        .draw(&mut self.ctx, &word.text, x, y, false);
                }
                WordState::Past => {
                    self.ctx.set_paint(color(theme.past_text));
                    self.caption_font
                        .draw(&mut self.ctx, &word.text, x, y, false);
                }
                WordState::Future => {
                    self.ctx
                        .set_stroke(vello_cpu::kurbo::Stroke::new(OUTLINE_WIDTH));
                    self.ctx.set_paint(color(theme.outline));
                    self.caption_font
                        .draw(&mut self.ctx, &word.text, x, y, true);
                    self.ctx.set_paint(color(theme.future_text));
                    self.caption_font
                        .draw(&mut self.ctx, &word.text, x, y, false);
                }
            }
            if opacity < 1.0 {
                self.ctx.pop_layer();
            }
        }
    }

    fn draw_footer(&mut self, scene: &Scene, frame: &FrameState) {
        let t = self.template.clone();
        let theme = self.cfg.theme.clone();

        let citation = scene.item.citation.trim();
        if !citation.is_empty() {
            let text_w = f64::from(self.label_font.advance(citation));
            let w = (text_w + 2.0 * t.pill_padding_x).min(t.width - 40.0);
            let cx = t.width / 2.0;
            let pill = kurbo::RoundedRect::new(
                cx - w / 2.0,
                t.pill_center_y - t.pill_height / 2.0,
                cx + w / 2.0,
                t.pill_center_y + t.pill_height / 2.0,
                t.pill_height / 2.0,
            );
            self.ctx.set_paint(color(Rgba8::new(255, 255, 255, 40)));
            self.ctx.fill_path(&shape_to_cpu(&pill));
            self.ctx.set_stroke(vello_cpu::kurbo::Stroke::new(2.0));
            self.ctx.set_paint(color(Rgba8::new(255, 255, 255, 140)));
            self.ctx.stroke_path(&shape_to_cpu(&pill));

            self.ctx.set_paint(color(theme.text));
            let y = t.pill_center_y - f64::from(self.label_font.size_px()) * 0.6;
            self.label_font
                .draw(&mut self.ctx, citation, cx - text_w / 2.0, y, false);
        }

        let cta = self.cfg.cta_text.clone();
        if !cta.trim().is_empty() {
            let w = f64::from(self.label_font.advance(&cta));
            let y = t.cta_center_y - f64::from(self.label_font.size_px()) * 0.6;
            self.ctx.set_paint(color(theme.accent));
            self.label_font
                .draw(&mut self.ctx, &cta, (t.width - w) / 2.0, y, false);
        }

        self.ctx.set_paint(color(theme.accent.with_opacity(0.85)));
        for bar in bar_rects(
            &frame.snapshot,
            t.width,
            t.visualizer_center_y,
            t.visualizer_max_height,
        ) {
            self.ctx.fill_rect(&rect_to_cpu(bar));
        }

        self.ctx.set_paint(color(Rgba8::new(255, 255, 255, 48)));
        self.ctx.fill_rect(&rect_to_cpu(t.progress_track));
        self.ctx.set_paint(color(theme.accent));
        self.ctx
            .fill_rect(&rect_to_cpu(t.progress_fill(frame.progress)));
    }
}

impl ScenePainter for Compositor {
    fn prepare(&mut self, item: &ContentItem, bundle: &MediaAssetBundle) -> LectioResult<Scene> {
        Scene::build(
            item,
            bundle,
            &self.cfg,
            &mut self.caption_font,
            &mut self.title_font,
        )
    }

    fn paint_frame(
        &mut self,
        scene: &Scene,
        frame: &FrameState,
        carry: &mut CarryState,
    ) -> LectioResult<FrameRGBA> {
        if scene.images.is_empty() {
            return Err(LectioError::precondition("scene has no background images"));
        }

        self.ctx.reset();
        self.ctx
            .set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

        self.draw_background(scene, frame);
        carry.particles.step();
        self.draw_particles(carry);
        self.draw_header(scene);
        self.draw_captions(scene, frame, carry);
        self.draw_footer(scene, frame);

        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut self.pixmap);

        Ok(FrameRGBA {
            width: self.cfg.canvas.width,
            height: self.cfg.canvas.height,
            data: self.pixmap.data_as_u8_slice().to_vec(),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compositor/paint.rs"]
mod tests;
