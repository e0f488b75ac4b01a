//! Capture and encode: the per-item frame loop from decoded narration to a muxed video.

pub mod render;

pub use render::{render, render_still, render_with};
