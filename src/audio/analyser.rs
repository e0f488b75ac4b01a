use std::sync::Arc;

use realfft::num_complex::Complex;
use realfft::{RealFftPlanner, RealToComplex};

use crate::audio::decode::DecodedAudio;
use crate::config::AnalyserConfig;
use crate::foundation::error::{LectioError, LectioResult};

/// Per-frame frequency sample: one byte per bin plus the normalized mean.
#[derive(Clone, Debug, PartialEq)]
pub struct FrequencySnapshot {
    pub magnitudes: Vec<u8>,
    /// Mean of `magnitudes` divided by 255, in `[0, 1]`.
    pub average_level: f32,
}

impl FrequencySnapshot {
    pub fn silent(bins: usize) -> Self {
        Self {
            magnitudes: vec![0; bins],
            average_level: 0.0,
        }
    }

    pub fn from_magnitudes(magnitudes: Vec<u8>) -> Self {
        let average_level = if magnitudes.is_empty() {
            0.0
        } else {
            let sum: u32 = magnitudes.iter().map(|&m| u32::from(m)).sum();
            sum as f32 / magnitudes.len() as f32 / 255.0
        };
        Self {
            magnitudes,
            average_level,
        }
    }

    pub fn bin_count(&self) -> usize {
        self.magnitudes.len()
    }
}

/// Analysis tap over the decoded narration.
///
/// Reads the `fft_size` samples ending at the playback position, so the snapshot always reflects
/// the same timeline instant the frame is painted for. Coarse on purpose: 64 samples give 32 bins.
pub struct Analyser {
    fft: Arc<dyn RealToComplex<f32>>,
    window: Vec<f32>,
    input: Vec<f32>,
    spectrum: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    cfg: AnalyserConfig,
}

impl std::fmt::Debug for Analyser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyser").field("cfg", &self.cfg).finish()
    }
}

impl Analyser {
    pub fn new(cfg: &AnalyserConfig) -> LectioResult<Self> {
        let n = cfg.fft_size;
        if n < 2 || !n.is_power_of_two() {
            return Err(LectioError::validation(
                "analyser fft_size must be a power of two >= 2",
            ));
        }

        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(n);
        let spectrum = fft.make_output_vec();
        let scratch = fft.make_scratch_vec();

        Ok(Self {
            window: blackman_window(n),
            input: fft.make_input_vec(),
            spectrum,
            scratch,
            smoothed: vec![0.0; n / 2],
            fft,
            cfg: cfg.clone(),
        })
    }

    pub fn bin_count(&self) -> usize {
        self.cfg.fft_size / 2
    }

    /// Drop smoothing history, e.g. after a seek.
    pub fn reset(&mut self) {
        self.smoothed.iter_mut().for_each(|v| *v = 0.0);
    }

    /// Analyse the window ending at `position_secs`.
    pub fn snapshot(
        &mut self,
        audio: &DecodedAudio,
        position_secs: f64,
    ) -> LectioResult<FrequencySnapshot> {
        let n = self.cfg.fft_size;
        let end = (position_secs.max(0.0) * f64::from(audio.sample_rate)).floor() as i64;
        let start = end - n as i64;
        for (i, slot) in self.input.iter_mut().enumerate() {
            *slot = audio.mono_at(start + i as i64) * self.window[i];
        }

        self.fft
            .process_with_scratch(&mut self.input, &mut self.spectrum, &mut self.scratch)
            .map_err(|e| LectioError::evaluation(format!("FFT failed: {e:?}")))?;

        let tau = self.cfg.smoothing;
        let range_db = self.cfg.max_db - self.cfg.min_db;
        let inv_n = 1.0 / n as f32;
        let mut magnitudes = Vec::with_capacity(self.smoothed.len());
        for (k, s) in self.smoothed.iter_mut().enumerate() {
            let mag = self.spectrum[k].norm() * inv_n;
            *s = tau * *s + (1.0 - tau) * mag;
            magnitudes.push(db_to_byte(*s, self.cfg.min_db, range_db));
        }

        Ok(FrequencySnapshot::from_magnitudes(magnitudes))
    }
}

fn blackman_window(n: usize) -> Vec<f32> {
    const A0: f32 = 0.42;
    const A1: f32 = 0.5;
    const A2: f32 = 0.08;
    (0..n)
        .map(|i| {
            let x = std::f32::consts::TAU * i as f32 / n as f32;
            A0 - A1 * x.cos() + A2 * (2.0 * x).cos()
        })
        .collect()
}

fn db_to_byte(linear: f32, min_db: f32, range_db: f32) -> u8 {
    if linear <= 0.0 {
        return 0;
    }
    let db = 20.0 * linear.log10();
    let scaled = 255.0 * (db - min_db) / range_db;
    scaled.clamp(0.0, 255.0) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/audio/analyser.rs"]
mod tests;
