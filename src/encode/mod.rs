//! Frame sinks and output format negotiation.

pub mod ffmpeg;
pub mod negotiate;
pub mod sink;

pub use ffmpeg::{FfmpegSink, is_ffmpeg_on_path};
pub use negotiate::{EncoderCaps, negotiate_format, query_encoders};
pub use sink::{CaptureSink, EncodeSpec, InMemorySink};
