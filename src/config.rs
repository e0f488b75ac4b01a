use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::compositor::template::{CAPTION_FLOOR, VISUALIZER_HEADROOM};
use crate::foundation::core::{Canvas, Fps, Rgba8};
use crate::foundation::error::{LectioError, LectioResult};
use crate::model::assets::Container;

/// How the playback transport advances while frames are produced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pacing {
    /// Wall-clock transport; a render takes as long as the narration.
    Realtime,
    /// Transport advances exactly one frame period per produced frame.
    #[default]
    Offline,
}

/// One entry of the codec/container preference list.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OutputFormat {
    pub container: Container,
    pub video_codec: String,
    pub audio_codec: String,
}

impl OutputFormat {
    pub fn new(container: Container, video_codec: &str, audio_codec: &str) -> Self {
        Self {
            container,
            video_codec: video_codec.to_string(),
            audio_codec: audio_codec.to_string(),
        }
    }

    pub fn mime(&self) -> String {
        match self.container {
            Container::Mp4 => "video/mp4".to_string(),
            Container::WebM => "video/webm".to_string(),
            Container::Raw => "application/octet-stream".to_string(),
        }
    }
}

/// Default preference order: H.264/AAC in MP4 first, VP9/Opus WebM as fallback.
pub fn default_formats() -> Vec<OutputFormat> {
    vec![
        OutputFormat::new(Container::Mp4, "libx264", "aac"),
        OutputFormat::new(Container::Mp4, "libopenh264", "aac"),
        OutputFormat::new(Container::WebM, "libvpx-vp9", "libopus"),
        OutputFormat::new(Container::WebM, "libvpx", "libvorbis"),
    ]
}

/// Frequency analysis settings.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AnalyserConfig {
    /// FFT window length in samples; must be a power of two. Bin count is half of it.
    pub fft_size: usize,
    /// Exponential smoothing time constant in `[0, 1)`.
    pub smoothing: f32,
    pub min_db: f32,
    pub max_db: f32,
}

impl Default for AnalyserConfig {
    fn default() -> Self {
        Self {
            fft_size: 64,
            smoothing: 0.8,
            min_db: -100.0,
            max_db: -30.0,
        }
    }
}

impl AnalyserConfig {
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Theme {
    pub background: Rgba8,
    pub accent: Rgba8,
    pub text: Rgba8,
    pub past_text: Rgba8,
    pub future_text: Rgba8,
    pub outline: Rgba8,
    pub shadow: Rgba8,
    pub scrim: Rgba8,
    pub particle: Rgba8,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Rgba8::opaque(8, 10, 18),
            accent: Rgba8::opaque(242, 190, 84),
            text: Rgba8::opaque(255, 255, 255),
            past_text: Rgba8::new(255, 255, 255, 120),
            future_text: Rgba8::new(255, 255, 255, 215),
            outline: Rgba8::new(0, 0, 0, 170),
            shadow: Rgba8::new(0, 0, 0, 150),
            scrim: Rgba8::new(0, 0, 0, 200),
            particle: Rgba8::opaque(255, 236, 190),
        }
    }
}

/// Render settings for the fixed vertical template.
///
/// Every field has a default, so a config file only needs the values it overrides.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub canvas: Canvas,
    pub fps: Fps,
    /// TrueType/OpenType font used for every text element. Searched on the system when unset.
    pub font_path: Option<PathBuf>,
    pub caption_font_size: f32,
    pub title_font_size: f32,
    pub label_font_size: f32,
    /// Constant caption line height in pixels.
    pub line_height: f64,
    pub caption_max_width: f64,
    pub title_max_width: f64,
    /// Screen y the active caption line is scrolled towards.
    ///
    /// This and the caption band, clip margin and visualizer height are in the 1080x1920
    /// authored frame and scale with the canvas height.
    pub view_center_y: f64,
    pub caption_band_top: f64,
    pub caption_band_bottom: f64,
    /// Extra band around the caption clip where words are still drawn.
    pub clip_margin: f64,
    /// Fraction of the remaining scroll distance covered per frame, in `(0, 1]`.
    pub scroll_smoothing: f64,
    pub zoom_range: f64,
    pub pulse_gain: f64,
    pub particle_count: usize,
    pub particle_seed: u64,
    pub analyser: AnalyserConfig,
    pub visualizer_height: f64,
    pub cta_text: String,
    pub theme: Theme,
    pub pacing: Pacing,
    /// Frames buffered between the frame loop and the encoder task.
    pub channel_capacity: usize,
    pub formats: Vec<OutputFormat>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            canvas: Canvas {
                width: 1080,
                height: 1920,
            },
            fps: Fps { num: 30, den: 1 },
            font_path: None,
            caption_font_size: 58.0,
            title_font_size: 64.0,
            label_font_size: 34.0,
            line_height: 86.0,
            caption_max_width: 900.0,
            title_max_width: 940.0,
            view_center_y: 910.0,
            caption_band_top: 520.0,
            caption_band_bottom: 1300.0,
            clip_margin: 90.0,
            scroll_smoothing: 0.15,
            zoom_range: 0.15,
            pulse_gain: 0.08,
            particle_count: 36,
            particle_seed: 0x1ec7_10,
            analyser: AnalyserConfig::default(),
            visualizer_height: 150.0,
            cta_text: "Comparte la Palabra de hoy".to_string(),
            theme: Theme::default(),
            pacing: Pacing::default(),
            channel_capacity: 4,
            formats: default_formats(),
        }
    }
}

impl RenderConfig {
    /// Load a JSON config file and validate it.
    pub fn from_path(path: &Path) -> LectioResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_slice(&bytes).map_err(|e| {
            LectioError::validation(format!("invalid config '{}': {e}", path.display()))
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> LectioResult<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(LectioError::validation("canvas width/height must be > 0"));
        }
        if self.canvas.width > u32::from(u16::MAX) || self.canvas.height > u32::from(u16::MAX) {
            return Err(LectioError::validation("canvas exceeds 65535 pixels"));
        }
        if self.canvas.width % 2 != 0 || self.canvas.height % 2 != 0 {
            return Err(LectioError::validation(
                "canvas width/height must be even for yuv420p output",
            ));
        }
        Fps::new(self.fps.num, self.fps.den)?;

        for (name, v) in [
            ("caption_font_size", self.caption_font_size),
            ("title_font_size", self.title_font_size),
            ("label_font_size", self.label_font_size),
        ] {
            if !v.is_finite() || v <= 0.0 {
                return Err(LectioError::validation(format!(
                    "{name} must be finite and > 0"
                )));
            }
        }
        for (name, v) in [
            ("line_height", self.line_height),
            ("caption_max_width", self.caption_max_width),
            ("title_max_width", self.title_max_width),
        ] {
            if !v.is_finite() || v <= 0.0 {
                return Err(LectioError::validation(format!(
                    "{name} must be finite and > 0"
                )));
            }
        }
        if self.caption_band_top >= self.caption_band_bottom {
            return Err(LectioError::validation(
                "caption_band_top must be above caption_band_bottom",
            ));
        }
        if !self.clip_margin.is_finite() || self.clip_margin < 0.0 {
            return Err(LectioError::validation("clip_margin must be >= 0"));
        }
        if self.caption_band_top - self.clip_margin < 0.0
            || self.caption_band_bottom + self.clip_margin > CAPTION_FLOOR
        {
            return Err(LectioError::validation(format!(
                "caption band plus clip_margin must stay within [0, {CAPTION_FLOOR}] \
                 (the bottom safe area starts at the citation pill)"
            )));
        }
        if !(self.visualizer_height > 0.0 && self.visualizer_height <= VISUALIZER_HEADROOM) {
            return Err(LectioError::validation(format!(
                "visualizer_height must be in (0, {VISUALIZER_HEADROOM}]"
            )));
        }
        if !(self.scroll_smoothing > 0.0 && self.scroll_smoothing <= 1.0) {
            return Err(LectioError::validation("scroll_smoothing must be in (0, 1]"));
        }
        if !self.zoom_range.is_finite() || self.zoom_range < 0.0 {
            return Err(LectioError::validation("zoom_range must be >= 0"));
        }
        if !self.pulse_gain.is_finite() || self.pulse_gain < 0.0 {
            return Err(LectioError::validation("pulse_gain must be >= 0"));
        }

        let a = &self.analyser;
        if a.fft_size < 32 || a.fft_size > 32768 || !a.fft_size.is_power_of_two() {
            return Err(LectioError::validation(
                "analyser.fft_size must be a power of two in [32, 32768]",
            ));
        }
        if !(0.0..1.0).contains(&a.smoothing) {
            return Err(LectioError::validation("analyser.smoothing must be in [0, 1)"));
        }
        if a.min_db >= a.max_db {
            return Err(LectioError::validation(
                "analyser.min_db must be below analyser.max_db",
            ));
        }

        if self.channel_capacity == 0 {
            return Err(LectioError::validation("channel_capacity must be > 0"));
        }
        if self.formats.is_empty() {
            return Err(LectioError::validation(
                "formats must list at least one codec/container pairing",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
