use crate::foundation::math::slot_index;

/// Which background image is on screen and how far into its slice playback is.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImageSlot {
    pub index: usize,
    /// Position inside the slice, renormalized to `[0, 1]`.
    pub local_progress: f64,
}

/// Split `[0, 1]` into `image_count` equal slices and locate `progress`.
///
/// `progress == i / K` maps to image `i`; anything at or past 1 stays on the last image.
pub fn active_image(progress: f64, image_count: usize) -> Option<ImageSlot> {
    if image_count == 0 {
        return None;
    }
    let p = if progress.is_finite() {
        progress.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let index = slot_index(p, image_count);
    let local_progress = (p * image_count as f64 - index as f64).clamp(0.0, 1.0);
    Some(ImageSlot {
        index,
        local_progress,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/compositor/schedule.rs"]
mod tests;
