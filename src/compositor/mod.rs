//! Frame composition for the vertical reading template.
//!
//! Pure geometry (image schedule, Ken-Burns crop, caption scroll, particles, visualizer) lives in
//! small modules; [`paint::Compositor`] rasterizes a full frame from them on the CPU.

pub mod crop;
pub mod paint;
pub mod particles;
pub mod raster;
pub mod scene;
pub mod schedule;
pub mod scroll;
pub mod template;
pub mod visualizer;

pub use crop::{cover_crop, ken_burns_window, zoom_scale};
pub use paint::{Compositor, ScenePainter};
pub use particles::{Particle, ParticleField};
pub use raster::{FrameRGBA, SceneImage};
pub use scene::{CarryState, FrameState, Scene};
pub use schedule::{ImageSlot, active_image};
pub use scroll::{ClipBand, ScrollState};
pub use template::Template;
pub use visualizer::bar_rects;
