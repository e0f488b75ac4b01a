use crate::foundation::core::{Affine, Canvas, Rect};

/// Largest centered sub-rectangle of a `src_w x src_h` image with the canvas aspect ratio.
pub fn cover_crop(src_w: f64, src_h: f64, canvas: Canvas) -> Rect {
    let target = canvas.aspect();
    let src = src_w / src_h;
    if src > target {
        let w = src_h * target;
        let x0 = (src_w - w) / 2.0;
        Rect::new(x0, 0.0, x0 + w, src_h)
    } else {
        let h = src_w / target;
        let y0 = (src_h - h) / 2.0;
        Rect::new(0.0, y0, src_w, y0 + h)
    }
}

/// `1 + local * zoom_range + pulse_gain * average_level`.
pub fn zoom_scale(local_progress: f64, zoom_range: f64, pulse_gain: f64, average_level: f32) -> f64 {
    1.0 + local_progress.clamp(0.0, 1.0) * zoom_range
        + pulse_gain * f64::from(average_level.clamp(0.0, 1.0))
}

/// Shrink `crop` symmetrically around its center by `scale`.
pub fn zoom_window(crop: Rect, scale: f64) -> Rect {
    let s = scale.max(1.0);
    let c = crop.center();
    let hw = crop.width() / (2.0 * s);
    let hh = crop.height() / (2.0 * s);
    Rect::new(c.x - hw, c.y - hh, c.x + hw, c.y + hh)
}

/// Source window for one frame of the Ken-Burns zoom.
pub fn ken_burns_window(
    src_w: f64,
    src_h: f64,
    canvas: Canvas,
    local_progress: f64,
    zoom_range: f64,
    pulse_gain: f64,
    average_level: f32,
) -> Rect {
    let crop = cover_crop(src_w, src_h, canvas);
    zoom_window(
        crop,
        zoom_scale(local_progress, zoom_range, pulse_gain, average_level),
    )
}

/// Transform mapping the source `window` onto the full canvas.
pub fn window_to_canvas(window: Rect, canvas: Canvas) -> Affine {
    let sx = f64::from(canvas.width) / window.width();
    let sy = f64::from(canvas.height) / window.height();
    Affine::scale_non_uniform(sx, sy) * Affine::translate((-window.x0, -window.y0))
}

#[cfg(test)]
#[path = "../../tests/unit/compositor/crop.rs"]
mod tests;
