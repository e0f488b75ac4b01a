use std::time::Duration;

use crate::foundation::error::{LectioError, LectioResult};

pub use kurbo::{Affine, Point, Rect, Vec2};

/// Absolute 0-based index of a produced output frame.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> LectioResult<Self> {
        if den == 0 {
            return Err(LectioError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(LectioError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    /// Duration of one frame, for tick scheduling.
    pub fn frame_period(self) -> Duration {
        Duration::from_secs_f64(self.frame_duration_secs())
    }

    /// Convert frame count to seconds.
    ///
    /// Computed as `(frames * den) / num` so whole-second multiples are exact.
    pub fn frames_to_secs(self, frames: u64) -> f64 {
        let num = u128::from(frames) * u128::from(self.den);
        (num as f64) / f64::from(self.num)
    }

    /// Convert seconds to frame count using floor semantics.
    pub fn secs_to_frames_floor(self, secs: f64) -> u64 {
        (secs * self.as_f64()).floor().max(0.0) as u64
    }

    /// Number of frames needed to cover `secs` (ceil semantics).
    pub fn secs_to_frames_ceil(self, secs: f64) -> u64 {
        (secs * self.as_f64()).ceil().max(0.0) as u64
    }

    /// Smallest frame count `n` with `frames_to_secs(n) >= secs`.
    ///
    /// Agrees with the stepped transport's end condition, so a stream padded to this length ends
    /// where offline rendering would.
    pub fn frames_to_cover(self, secs: f64) -> u64 {
        if secs.is_nan() || secs <= 0.0 {
            return 0;
        }
        let mut n = self.secs_to_frames_ceil(secs);
        while n > 0 && self.frames_to_secs(n - 1) >= secs {
            n -= 1;
        }
        while self.frames_to_secs(n) < secs {
            n += 1;
        }
        n
    }
}

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Width over height.
    pub fn aspect(self) -> f64 {
        f64::from(self.width) / f64::from(self.height.max(1))
    }

    /// `true` for portrait (vertical) output.
    pub fn is_vertical(self) -> bool {
        self.height > self.width
    }
}

/// Straight-alpha RGBA8 color, as written in configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Same color with alpha scaled by `opacity` in `[0, 1]`.
    pub fn with_opacity(self, opacity: f32) -> Self {
        let a = (f32::from(self.a) * opacity.clamp(0.0, 1.0)).round() as u8;
        Self { a, ..self }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Premultiplied RGBA8 bytes.
    pub fn to_premul_array(self) -> [u8; 4] {
        let a = u16::from(self.a);
        let premul = |c: u8| -> u8 { (((u16::from(c) * a) + 127) / 255) as u8 };
        [premul(self.r), premul(self.g), premul(self.b), self.a]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
