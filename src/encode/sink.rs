use std::sync::Arc;
use std::time::Duration;

use crate::audio::graph::CaptureAudio;
use crate::compositor::raster::FrameRGBA;
use crate::config::OutputFormat;
use crate::foundation::core::{Fps, Rgba8};
use crate::foundation::error::{LectioError, LectioResult};
use crate::foundation::math::mul_div255_u16;
use crate::model::assets::{Container, VideoHandle};

/// Everything an encoder needs to know before the first frame arrives.
#[derive(Clone, Debug)]
pub struct EncodeSpec {
    pub width: u32,
    pub height: u32,
    pub fps: Fps,
    pub format: OutputFormat,
    /// Captured narration to mux next to the video stream. `None` produces a silent video.
    pub audio: Option<CaptureAudio>,
    /// Frames are flattened over this color before encoding.
    pub background: Rgba8,
}

impl EncodeSpec {
    pub fn validate(&self) -> LectioResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(LectioError::validation("encode width/height must be non-zero"));
        }
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            return Err(LectioError::validation(
                "encode width/height must be even (yuv420p output)",
            ));
        }
        if self.fps.num == 0 || self.fps.den == 0 {
            return Err(LectioError::validation("encode fps must be non-zero"));
        }
        Ok(())
    }

    pub fn frame_bytes(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }

    pub(crate) fn check_frame(&self, frame: &FrameRGBA) -> LectioResult<()> {
        if frame.width != self.width || frame.height != self.height {
            return Err(LectioError::encode(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, self.width, self.height
            )));
        }
        if frame.data.len() != self.frame_bytes() {
            return Err(LectioError::encode(
                "frame data size mismatch with width*height*4",
            ));
        }
        Ok(())
    }

    pub(crate) fn duration_of(&self, frames: u64) -> Duration {
        Duration::from_secs_f64(self.fps.frames_to_secs(frames))
    }
}

/// Destination for rendered frames.
///
/// The encoder task owns its sink for the duration of one render: `begin` once, `push_frame` per
/// frame in order, then exactly one of `finish` or `abort`. A failed or aborted sink yields no
/// artifact.
pub trait CaptureSink: Send {
    fn begin(&mut self, spec: &EncodeSpec) -> LectioResult<()>;

    fn push_frame(&mut self, frame: &FrameRGBA) -> LectioResult<()>;

    /// Close the stream and concatenate every encoded segment into one deliverable.
    fn finish(&mut self) -> LectioResult<VideoHandle>;

    /// Drop everything produced so far.
    fn abort(&mut self);
}

/// Keeps flattened raw frames in memory, one segment per frame.
#[derive(Debug, Default)]
pub struct InMemorySink {
    spec: Option<EncodeSpec>,
    segments: Vec<Vec<u8>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_pushed(&self) -> usize {
        self.segments.len()
    }
}

impl CaptureSink for InMemorySink {
    fn begin(&mut self, spec: &EncodeSpec) -> LectioResult<()> {
        spec.validate()?;
        if self.spec.is_some() {
            return Err(LectioError::encode("capture sink already started"));
        }
        self.spec = Some(spec.clone());
        self.segments.clear();
        Ok(())
    }

    fn push_frame(&mut self, frame: &FrameRGBA) -> LectioResult<()> {
        let Some(spec) = self.spec.as_ref() else {
            return Err(LectioError::encode("capture sink is not started"));
        };
        spec.check_frame(frame)?;
        let mut out = vec![0u8; frame.data.len()];
        flatten_to_opaque_rgba8(&mut out, &frame.data, spec.background.to_array())?;
        self.segments.push(out);
        Ok(())
    }

    fn finish(&mut self) -> LectioResult<VideoHandle> {
        let Some(spec) = self.spec.take() else {
            return Err(LectioError::encode("capture sink is not started"));
        };
        let frame_count = self.segments.len() as u64;
        let data: Vec<u8> = std::mem::take(&mut self.segments).concat();
        Ok(VideoHandle {
            data: Arc::from(data),
            mime: "application/octet-stream".to_string(),
            container: Container::Raw,
            frame_count,
            duration: spec.duration_of(frame_count),
        })
    }

    fn abort(&mut self) {
        self.spec = None;
        self.segments.clear();
    }
}

/// Composite premultiplied RGBA8 over an opaque background; encoders take straight opaque pixels.
pub(crate) fn flatten_to_opaque_rgba8(
    dst: &mut [u8],
    src: &[u8],
    bg_rgba: [u8; 4],
) -> LectioResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(LectioError::validation(
            "flatten_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }

    let [bg_r, bg_g, bg_b, _] = bg_rgba.map(u16::from);
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }
        let inv = 255 - a;
        d[0] = (u16::from(s[0]) + mul_div255_u16(bg_r, inv)).min(255) as u8;
        d[1] = (u16::from(s[1]) + mul_div255_u16(bg_g, inv)).min(255) as u8;
        d[2] = (u16::from(s[2]) + mul_div255_u16(bg_b, inv)).min(255) as u8;
        d[3] = 255;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
