use crate::compositor::scroll::ClipBand;
use crate::config::RenderConfig;
use crate::foundation::core::Rect;

/// Frame size the template geometry is authored against.
pub const AUTHORED_WIDTH: f64 = 1080.0;
pub const AUTHORED_HEIGHT: f64 = 1920.0;

const PILL_CENTER_Y: f64 = 1440.0;
const PILL_HEIGHT: f64 = 76.0;
const CTA_CENTER_Y: f64 = 1540.0;
const VISUALIZER_CENTER_Y: f64 = 1700.0;

/// Lowest authored y a caption may reach, margin included: the top of the citation pill.
pub const CAPTION_FLOOR: f64 = PILL_CENTER_Y - PILL_HEIGHT / 2.0;
/// Tallest authored visualizer that stays clear of the call to action.
pub const VISUALIZER_HEADROOM: f64 = 2.0 * (VISUALIZER_CENTER_Y - CTA_CENTER_Y);

/// Fixed overlay geometry of the vertical template, in output pixels.
///
/// Positions are authored against a 1080x1920 frame and scaled to the configured canvas, the
/// configured caption band, view center and visualizer height included. The top
/// safe area holds the header badge and title; the larger bottom safe area holds the citation
/// pill, call to action, visualizer and progress bar.
#[derive(Clone, Debug, PartialEq)]
pub struct Template {
    pub width: f64,
    pub height: f64,
    pub badge: Rect,
    pub title_top: f64,
    pub title_line_height: f64,
    pub title_max_lines: usize,
    pub caption: ClipBand,
    pub view_center_y: f64,
    pub pill_center_y: f64,
    pub pill_height: f64,
    pub pill_padding_x: f64,
    pub cta_center_y: f64,
    pub visualizer_center_y: f64,
    pub visualizer_max_height: f64,
    pub progress_track: Rect,
    /// Background scrim is darkest above this line and below `scrim_bottom`.
    pub scrim_top: f64,
    pub scrim_bottom: f64,
}

impl Template {
    pub fn new(cfg: &RenderConfig) -> Self {
        let width = f64::from(cfg.canvas.width);
        let height = f64::from(cfg.canvas.height);
        let sx = width / AUTHORED_WIDTH;
        let sy = height / AUTHORED_HEIGHT;
        let badge_w = 560.0 * sx;

        Self {
            width,
            height,
            badge: Rect::new(
                (width - badge_w) / 2.0,
                72.0 * sy,
                (width + badge_w) / 2.0,
                132.0 * sy,
            ),
            title_top: 176.0 * sy,
            title_line_height: f64::from(cfg.title_font_size) * 1.2,
            title_max_lines: 3,
            caption: ClipBand {
                top: cfg.caption_band_top * sy,
                bottom: cfg.caption_band_bottom * sy,
                margin: cfg.clip_margin * sy,
            },
            view_center_y: cfg.view_center_y * sy,
            pill_center_y: PILL_CENTER_Y * sy,
            pill_height: PILL_HEIGHT * sy,
            pill_padding_x: 36.0 * sx,
            cta_center_y: CTA_CENTER_Y * sy,
            visualizer_center_y: VISUALIZER_CENTER_Y * sy,
            visualizer_max_height: cfg.visualizer_height * sy,
            progress_track: Rect::new(0.0, height - 14.0 * sy, width, height),
            scrim_top: 520.0 * sy,
            scrim_bottom: 1300.0 * sy,
        }
    }

    /// Filled part of the progress bar: width `progress * W`.
    pub fn progress_fill(&self, progress: f64) -> Rect {
        let p = progress.clamp(0.0, 1.0);
        let t = self.progress_track;
        Rect::new(t.x0, t.y0, t.x0 + p * t.width(), t.y1)
    }
}

/// Header badge text: category heading and display date.
pub fn badge_text(label: &str, display_date: &str) -> String {
    let date = display_date.trim();
    if date.is_empty() {
        label.to_string()
    } else {
        format!("{label} · {date}")
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compositor/template.rs"]
mod tests;
