use std::panic::{self, AssertUnwindSafe};

use getset::Getters;
use ndarray::prelude::*;
use pyin::{Framing, PadMode, PYINExecutor};
use tracing::{debug, error, warn};

use crate::config::AnalyzerConfig;
use crate::error::{AnalysisError, Result};
use crate::wav::AudioBuffer;

/// f0 contour with the timestamp of each frame.
///
/// Unvoiced frames have a frequency of `0`.
#[derive(Getters, Debug, Clone)]
pub struct F0Series {
    /// timestamp of each frame in seconds.
    #[getset(get = "pub")]
    time: Array1<f64>,

    /// estimated f0 of each frame in Hz.
    #[getset(get = "pub")]
    f0: Array1<f64>,
}

impl F0Series {
    pub fn new(time: Array1<f64>, f0: Array1<f64>) -> Self {
        assert_eq!(time.len(), f0.len());
        Self { time, f0 }
    }

    pub fn n_frames(&self) -> usize {
        self.f0.len()
    }

    pub fn n_voiced(&self) -> usize {
        self.f0.iter().filter(|&&x| x != 0.).count()
    }
}

/// Number of frames an extractor yields for `length` samples at `sr` Hz.
pub fn frame_count(sr: u32, length: usize, frame_period_ms: f64) -> usize {
    let hop_length = AnalyzerConfig::ms_to_samples(sr, frame_period_ms).max(1);
    length / hop_length + 1
}

/// Estimates an f0 contour from audio.
pub trait F0Extractor {
    fn extract(&mut self, audio: &AudioBuffer) -> Result<F0Series>;
}

/// [`F0Extractor`] backed by the pYIN algorithm.
#[derive(Debug, Clone)]
pub struct PyinExtractor {
    config: AnalyzerConfig,
}

/// pYIN parameters in samples for one sampling rate.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PyinParams {
    fmin: f64,
    fmax: f64,
    frame_length: usize,
    hop_length: usize,
}

impl PyinExtractor {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    /// Checks every condition `PYINExecutor::new` asserts, so that it never panics.
    fn params(&self, sr: u32) -> Result<PyinParams> {
        let invalid = |msg: String| Err(AnalysisError::UnsupportedFormat(msg));
        if sr == 0 {
            return invalid("sampling rate is 0".into());
        }
        let nyquist = sr as f64 / 2.;
        let fmin = self.config.f0_floor;
        let fmax = self.config.f0_ceil.min(nyquist);
        if !(0. < fmin && fmin < fmax) {
            return invalid(format!(
                "sampling rate {sr} Hz is too low for f0_floor {fmin} Hz"
            ));
        }

        // frame_length is kept even so that centered framing yields `frame_count()` frames.
        let frame_length = AnalyzerConfig::ms_to_samples(sr, self.config.frame_length_ms) / 2 * 2;
        let win_length = frame_length / 2;
        let hop_length = AnalyzerConfig::ms_to_samples(sr, self.config.frame_period_ms);
        if win_length == 0 || hop_length == 0 {
            return invalid(format!("sampling rate {sr} Hz is too low for the frame setup"));
        }

        let min_period = ((sr as f64 / fmax).floor() as usize).max(1);
        let max_period = ((sr as f64 / fmin).ceil() as usize)
            .min((frame_length - win_length).saturating_sub(1));
        if max_period < min_period + 2 {
            return invalid(format!(
                "period range [{min_period}, {max_period}] is too narrow at {sr} Hz"
            ));
        }

        let n_bins_per_semitone = (1.0 / self.config.resolution).ceil() as usize;
        let n_pitch_bins =
            (12.0 * n_bins_per_semitone as f64 * (fmax / fmin).log2()).floor() as usize + 1;
        let max_semitones_per_frame =
            (35.92 * 12.0 * hop_length as f64 / sr as f64).round() as usize;
        let transition_width = max_semitones_per_frame * n_bins_per_semitone + 1;
        if n_pitch_bins < 2 || n_pitch_bins < transition_width {
            return invalid(format!(
                "{n_pitch_bins} pitch bins cannot hold a transition of width {transition_width}"
            ));
        }

        Ok(PyinParams {
            fmin,
            fmax,
            frame_length,
            hop_length,
        })
    }
}

impl F0Extractor for PyinExtractor {
    fn extract(&mut self, audio: &AudioBuffer) -> Result<F0Series> {
        let sr = audio.sample_rate();
        let params = self.params(sr)?;
        debug!(?params, sr, length = audio.len(), "extracting f0");

        let estimated = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut executor = PYINExecutor::<f64>::new(
                params.fmin,
                params.fmax,
                sr,
                params.frame_length,
                None,
                Some(params.hop_length),
                Some(self.config.resolution),
            );
            executor.pyin(audio.samples(), 0., Framing::Center(PadMode::Constant(0.)))
        }));
        let (timestamp, f0, _voiced_flag, _voiced_prob) = estimated.map_err(|e| {
            let reason = e
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| e.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "f0 estimator panicked".into());
            error!(%reason, "f0 extraction failed");
            AnalysisError::NoSpeech(reason)
        })?;

        let series = F0Series::new(Array1::from(timestamp), Array1::from(f0));
        let expected = frame_count(sr, audio.len(), self.config.frame_period_ms);
        if series.n_frames() != expected {
            warn!(
                n_frames = series.n_frames(),
                expected,
                "f0 estimator returned an unexpected number of frames"
            );
        }
        debug!(
            n_frames = series.n_frames(),
            n_voiced = series.n_voiced(),
            "f0 extracted"
        );
        Ok(series)
    }
}
