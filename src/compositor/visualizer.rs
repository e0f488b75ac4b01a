use crate::audio::analyser::FrequencySnapshot;
use crate::foundation::core::Rect;

/// Share of each half-slot covered by its bar; the rest is the gap between bars.
const BAR_FILL: f64 = 0.72;
/// Bars never collapse below this height so the visualizer stays visible in silence.
const MIN_BAR_HEIGHT: f64 = 4.0;

/// Mirrored frequency bars: bin 0 sits at the horizontal center and higher bins move outward.
///
/// Each bin owns a slot of `width / bins`; the left and right bars of a pair take half a slot
/// each. Bars are centered vertically on `center_y` with height proportional to the magnitude.
pub fn bar_rects(
    snapshot: &FrequencySnapshot,
    width: f64,
    center_y: f64,
    max_height: f64,
) -> Vec<Rect> {
    let bins = snapshot.bin_count();
    if bins == 0 {
        return Vec::new();
    }
    let half_slot = width / bins as f64 / 2.0;
    let bar_w = half_slot * BAR_FILL;
    let inset = (half_slot - bar_w) / 2.0;
    let mid_x = width / 2.0;

    let mut out = Vec::with_capacity(bins * 2);
    for (i, &m) in snapshot.magnitudes.iter().enumerate() {
        let h = (f64::from(m) / 255.0 * max_height).max(MIN_BAR_HEIGHT);
        let y0 = center_y - h / 2.0;
        let right_x = mid_x + i as f64 * half_slot + inset;
        let left_x = mid_x - (i + 1) as f64 * half_slot + inset;
        out.push(Rect::new(left_x, y0, left_x + bar_w, y0 + h));
        out.push(Rect::new(right_x, y0, right_x + bar_w, y0 + h));
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/compositor/visualizer.rs"]
mod tests;
