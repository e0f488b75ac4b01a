//! Lectio renders narrated scripture readings into vertical videos.
//!
//! A reading ([`ContentItem`]) plus its generated media ([`MediaAssetBundle`]) becomes one muxed
//! video: captions laid out by [`layout`] and highlighted word by word against the narration
//! clock, Ken-Burns background images, and an audio-reactive visualizer.
//!
//! - [`render`] drives a single item end to end (requires `ffmpeg` on PATH)
//! - [`render_with`] takes any [`ScenePainter`] and [`CaptureSink`]
//! - [`Scheduler`] runs many items through generation and rendering, one job per slot
#![forbid(unsafe_code)]

mod foundation;

pub mod audio;
pub mod compositor;
pub mod config;
pub mod encode;
pub mod model;
pub mod orchestrate;
pub mod pipeline;
pub mod retry;
pub mod text;

pub use crate::foundation::core::{Affine, Canvas, Fps, FrameIndex, Point, Rect, Rgba8, Vec2};
pub use crate::foundation::error::{LectioError, LectioResult};

pub use crate::compositor::{Compositor, FrameRGBA, ScenePainter};
pub use crate::config::{OutputFormat, Pacing, RenderConfig};
pub use crate::encode::{CaptureSink, EncodeSpec, FfmpegSink, InMemorySink};
pub use crate::model::assets::{
    AudioHandle, Container, ImageHandle, MediaAssetBundle, MediaSource, VideoHandle,
};
pub use crate::model::content::{Category, ContentItem, liturgical_order};
pub use crate::orchestrate::{ItemState, Scheduler};
pub use crate::pipeline::{render, render_still, render_with};
pub use crate::retry::{RetryPolicy, with_retry};
pub use crate::text::{FixedAdvanceMetrics, FontMetrics, WordPositionMap, layout};
