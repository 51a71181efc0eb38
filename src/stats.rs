//! Scalar descriptors of an f0 contour.
//!
//! All four reductions take the whole contour, voiced and unvoiced frames alike.
//! Their denominators are part of the reported values and must not be changed:
//! * [`voiced_mean`] divides the sum of voiced frames by the total frame count.
//! * [`halves_delta`] divides both halves by `n / 2`, even when `n` is odd.
//! * [`tail_contrast`] keeps only the last of the final five frames.

use ndarray::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::error::{AnalysisError, Result};

/// Frames at the end of the contour used by [`tail_contrast`].
pub const TAIL_FRAMES: usize = 5;

/// The four descriptors of one analysis.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct PitchSummary {
    pub pitch1: f64,
    pub pitch2: f64,
    pub pitch3: f64,
    pub pitch4: f64,
}

/// Pitch1: sum of voiced frames over the total number of frames.
pub fn voiced_mean(f0: ArrayView1<f64>) -> Result<f64> {
    if f0.is_empty() {
        return Err(AnalysisError::pitch(1, "no frames"));
    }
    let sum: f64 = f0.iter().filter(|&&x| x != 0.).sum();
    Ok(sum / f0.len() as f64)
}

/// Pitch2: population standard deviation over all frames.
pub fn std_dev(f0: ArrayView1<f64>) -> Result<f64> {
    if f0.is_empty() {
        return Err(AnalysisError::pitch(2, "no frames"));
    }
    let n = f0.len() as f64;
    let mean = f0.sum() / n;
    let sq_dev = f0.fold(0., |acc, &x| acc + (x - mean).powi(2));
    Ok((sq_dev / n).sqrt())
}

/// Pitch3: average of the second half minus average of the first half.
pub fn halves_delta(f0: ArrayView1<f64>) -> Result<f64> {
    let half = f0.len() / 2;
    if half == 0 {
        return Err(AnalysisError::pitch(3, "fewer than 2 frames"));
    }
    let first = f0.slice(s![..half]).sum() / half as f64;
    let second = f0.slice(s![half..]).sum() / half as f64;
    Ok(second - first)
}

/// Pitch4: average of all but the last five frames minus one fifth of the last frame.
///
/// The sign is head minus tail; do not flip it to tail minus head.
pub fn tail_contrast(f0: ArrayView1<f64>) -> Result<f64> {
    let n = f0.len();
    if n <= TAIL_FRAMES {
        return Err(AnalysisError::pitch(
            4,
            format!("more than {TAIL_FRAMES} frames needed, got {n}"),
        ));
    }
    let head = f0.slice(s![..n - TAIL_FRAMES]).sum() / (n - TAIL_FRAMES) as f64;
    let tail = f0[n - 1] / TAIL_FRAMES as f64;
    Ok(head - tail)
}

/// Computes the four descriptors concurrently.
///
/// Every task runs to completion before the first error (in pitch order) is returned.
pub fn summarize(f0: ArrayView1<f64>) -> Result<PitchSummary> {
    let ((pitch1, pitch2), (pitch3, pitch4)) = rayon::join(
        || rayon::join(|| voiced_mean(f0), || std_dev(f0)),
        || rayon::join(|| halves_delta(f0), || tail_contrast(f0)),
    );
    let summary = PitchSummary {
        pitch1: pitch1?,
        pitch2: pitch2?,
        pitch3: pitch3?,
        pitch4: pitch4?,
    };
    debug!(?summary, "pitch statistics");
    Ok(summary)
}
