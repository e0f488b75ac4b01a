use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;

use crate::foundation::error::{LectioError, LectioResult};
use crate::text::metrics::FontMetrics;

/// Common install locations searched when no font path is configured.
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// First readable font from the configured path or the system candidates.
pub fn resolve_font_path(configured: Option<&Path>) -> LectioResult<PathBuf> {
    if let Some(p) = configured {
        if p.is_file() {
            return Ok(p.to_path_buf());
        }
        return Err(LectioError::precondition(format!(
            "font '{}' does not exist",
            p.display()
        )));
    }
    SYSTEM_FONT_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
        .ok_or_else(|| {
            LectioError::precondition("no usable font found; set font_path in the render config")
        })
}

/// A word shaped once and drawn many times.
#[derive(Clone, Debug)]
pub struct ShapedWord {
    /// Glyphs positioned relative to the top-left of the word box (y on the baseline).
    pub glyphs: Arc<[vello_cpu::Glyph]>,
    pub advance: f32,
}

/// A single font at a single size: measures words for layout and shapes them for drawing.
pub struct FontFace {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<()>,
    family: String,
    font: vello_cpu::peniko::FontData,
    font_bytes: Arc<Vec<u8>>,
    size_px: f32,
    cache: HashMap<String, ShapedWord>,
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFace")
            .field("family", &self.family)
            .field("size_px", &self.size_px)
            .field("cached_words", &self.cache.len())
            .finish()
    }
}

impl FontFace {
    pub fn from_path(path: &Path, size_px: f32) -> LectioResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read font '{}'", path.display()))?;
        Self::from_bytes(Arc::new(bytes), size_px)
    }

    pub fn from_bytes(font_bytes: Arc<Vec<u8>>, size_px: f32) -> LectioResult<Self> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(LectioError::validation("font size must be finite and > 0"));
        }

        // Both blobs borrow the one shared buffer.
        let shared: Arc<dyn AsRef<[u8]> + Send + Sync> = font_bytes.clone();
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::new(shared.clone()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            LectioError::validation("no font families registered from font bytes")
        })?;
        let family = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| LectioError::validation("registered font family has no name"))?
            .to_string();

        let font = vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::new(shared), 0);

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family,
            font,
            font_bytes,
            size_px,
            cache: HashMap::new(),
        })
    }

    /// Same font at another size, sharing the font bytes but nothing mutable with `self`.
    pub fn resized(&self, size_px: f32) -> LectioResult<Self> {
        Self::from_bytes(self.font_bytes.clone(), size_px)
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn size_px(&self) -> f32 {
        self.size_px
    }

    /// Font data in the form the rasterizer expects.
    pub fn font_data(&self) -> &vello_cpu::peniko::FontData {
        &self.font
    }

    /// Shape `text` as a single unbroken run, caching by string.
    pub fn shape(&mut self, text: &str) -> ShapedWord {
        if let Some(w) = self.cache.get(text) {
            return w.clone();
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(self.family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(self.size_px));
        let mut layout: parley::Layout<()> = builder.build(text);
        layout.break_all_lines(None);

        let mut glyphs = Vec::new();
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                glyphs.extend(run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                }));
            }
        }

        let shaped = ShapedWord {
            glyphs: Arc::from(glyphs),
            advance: layout.full_width(),
        };
        self.cache.insert(text.to_string(), shaped.clone());
        shaped
    }

    /// Fill (or stroke) `text` with its top-left corner at `(x, y)` using the current paint.
    pub fn draw(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        text: &str,
        x: f64,
        y: f64,
        stroke: bool,
    ) -> f32 {
        let shaped = self.shape(text);
        ctx.set_transform(vello_cpu::kurbo::Affine::translate((x, y)));
        let glyphs = shaped.glyphs.iter().map(|g| vello_cpu::Glyph {
            id: g.id,
            x: g.x,
            y: g.y,
        });
        let run = ctx.glyph_run(&self.font).font_size(self.size_px);
        if stroke {
            run.stroke_glyphs(glyphs);
        } else {
            run.fill_glyphs(glyphs);
        }
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        shaped.advance
    }
}

impl FontMetrics for FontFace {
    fn advance(&mut self, word: &str) -> f32 {
        self.shape(word).advance
    }
}

#[cfg(test)]
#[path = "../../tests/unit/text/font.rs"]
mod tests;
