//! Narration decode, playback transport and frequency analysis.

pub mod analyser;
pub mod clock;
pub mod decode;
pub mod graph;

pub use analyser::{Analyser, FrequencySnapshot};
pub use clock::{PlaybackClock, RealtimeClock, SteppedClock, TransportStatus};
pub use decode::{DecodedAudio, decode_audio};
pub use graph::{AudioGraph, CaptureAudio, FrameSample};
