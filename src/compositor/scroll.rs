use crate::foundation::math::lerp;

/// Smoothed caption scroll offset carried between frames.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollState {
    pub offset: f64,
    primed: bool,
}

impl ScrollState {
    /// `view_center_y - active_y`: the offset that puts the active line at the view center.
    pub fn target(view_center_y: f64, active_y: f64) -> f64 {
        view_center_y - active_y
    }

    /// Move towards `target` by `smoothing` of the remaining distance.
    ///
    /// The first call snaps to the target so a render does not open with a sweep.
    pub fn advance(&mut self, target: f64, smoothing: f64) -> f64 {
        if self.primed {
            self.offset = lerp(self.offset, target, smoothing.clamp(0.0, 1.0));
        } else {
            self.offset = target;
            self.primed = true;
        }
        self.offset
    }

    pub fn is_primed(&self) -> bool {
        self.primed
    }
}

/// Vertical band in which caption lines are drawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClipBand {
    pub top: f64,
    pub bottom: f64,
    pub margin: f64,
}

impl ClipBand {
    /// `true` if a line spanning `[y, y + height)` on screen touches the band plus margin.
    pub fn contains_line(&self, y: f64, height: f64) -> bool {
        y + height > self.top - self.margin && y < self.bottom + self.margin
    }

    /// Fade factor for a line: 1 inside the band, ramping to 0 across the margin.
    pub fn edge_opacity(&self, y: f64, height: f64) -> f32 {
        if self.margin <= 0.0 {
            return if self.contains_line(y, height) { 1.0 } else { 0.0 };
        }
        let mid = y + height / 2.0;
        let above = (self.top - mid) / self.margin;
        let below = (mid - self.bottom) / self.margin;
        let outside = above.max(below).max(0.0);
        (1.0 - outside).clamp(0.0, 1.0) as f32
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compositor/scroll.rs"]
mod tests;
