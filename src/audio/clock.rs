use tokio::time::Instant;

use crate::foundation::core::Fps;

/// Transport state of the narration playback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportStatus {
    /// Created but not started.
    Idle,
    Playing,
    Paused,
    Ended,
}

/// The monitor end of the audio graph: tells the frame loop where playback is.
pub trait PlaybackClock: Send {
    fn start(&mut self);
    fn pause(&mut self);
    fn resume(&mut self);
    /// Playback position in seconds, clamped to the track duration.
    fn position_secs(&self) -> f64;
    fn duration_secs(&self) -> f64;
    fn status(&self) -> TransportStatus;
    /// Called once after each frame has been handed to the encoder.
    fn frame_presented(&mut self) {}

    /// `position / duration` in `[0, 1]`.
    fn progress(&self) -> f64 {
        let d = self.duration_secs();
        if d <= 0.0 {
            return 1.0;
        }
        (self.position_secs() / d).clamp(0.0, 1.0)
    }
}

/// Wall-clock transport, as heard on a live speaker.
///
/// Uses tokio's clock so paused-time tests drive it deterministically.
#[derive(Debug)]
pub struct RealtimeClock {
    duration_secs: f64,
    started_at: Option<Instant>,
    /// Position accumulated before the current play segment.
    banked_secs: f64,
    paused: bool,
}

impl RealtimeClock {
    pub fn new(duration_secs: f64) -> Self {
        Self {
            duration_secs,
            started_at: None,
            banked_secs: 0.0,
            paused: false,
        }
    }

    fn raw_position(&self) -> f64 {
        let live = self
            .started_at
            .filter(|_| !self.paused)
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        self.banked_secs + live
    }
}

impl PlaybackClock for RealtimeClock {
    fn start(&mut self) {
        self.started_at = Some(Instant::now());
        self.banked_secs = 0.0;
        self.paused = false;
    }

    fn pause(&mut self) {
        if self.started_at.is_some() && !self.paused {
            self.banked_secs = self.raw_position();
            self.paused = true;
        }
    }

    fn resume(&mut self) {
        if self.paused {
            self.started_at = Some(Instant::now());
            self.paused = false;
        }
    }

    fn position_secs(&self) -> f64 {
        self.raw_position().min(self.duration_secs)
    }

    fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    fn status(&self) -> TransportStatus {
        if self.started_at.is_none() {
            TransportStatus::Idle
        } else if self.raw_position() >= self.duration_secs {
            TransportStatus::Ended
        } else if self.paused {
            TransportStatus::Paused
        } else {
            TransportStatus::Playing
        }
    }
}

/// Offline transport: advances exactly one frame period per presented frame.
///
/// A track of `d` seconds yields `ceil(d * fps)` frames regardless of how long painting takes.
#[derive(Debug)]
pub struct SteppedClock {
    fps: Fps,
    duration_secs: f64,
    frames: u64,
    started: bool,
    paused: bool,
}

impl SteppedClock {
    pub fn new(fps: Fps, duration_secs: f64) -> Self {
        Self {
            fps,
            duration_secs,
            frames: 0,
            started: false,
            paused: false,
        }
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames
    }

    fn raw_position(&self) -> f64 {
        self.fps.frames_to_secs(self.frames)
    }
}

impl PlaybackClock for SteppedClock {
    fn start(&mut self) {
        self.started = true;
        self.paused = false;
        self.frames = 0;
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn resume(&mut self) {
        self.paused = false;
    }

    fn position_secs(&self) -> f64 {
        self.raw_position().min(self.duration_secs)
    }

    fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    fn status(&self) -> TransportStatus {
        if !self.started {
            TransportStatus::Idle
        } else if self.raw_position() >= self.duration_secs {
            TransportStatus::Ended
        } else if self.paused {
            TransportStatus::Paused
        } else {
            TransportStatus::Playing
        }
    }

    fn frame_presented(&mut self) {
        if self.started && !self.paused {
            self.frames += 1;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/clock.rs"]
mod tests;
