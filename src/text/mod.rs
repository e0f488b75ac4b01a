//! Caption layout: greedy centered line fill, word timing lookups and font shaping.

pub mod font;
pub mod layout;
pub mod metrics;
pub mod wrap;

pub use font::{FontFace, ShapedWord, resolve_font_path};
pub use layout::{WordPosition, WordPositionMap, WordState, layout};
pub use metrics::{FixedAdvanceMetrics, FontMetrics};
pub use wrap::wrap_lines;
