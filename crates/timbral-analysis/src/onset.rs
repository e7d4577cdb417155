//! Complex-domain onset detection.
//!
//! For each bin the next frame's value is predicted by keeping its magnitude
//! and extrapolating its phase linearly from the two previous frames. The
//! onset function is the total distance between each frame and its
//! prediction:
//!
//! ```text
//! φ̂_n(k) = princarg(φ_{n-1}(k) + (φ_{n-1}(k) - φ_{n-2}(k)))
//! E(n)   = (1/F) Σ_k |X_n(k) - |X_n(k)|·e^{iφ̂_n(k)}|
//! ```
//!
//! Reference: Bello et al., "On the use of phase and energy for musical
//! onset detection in the complex domain", IEEE SPL 11(6), 2004.

use std::f32::consts::PI;

use crate::error::{AnalysisError, Result};
use crate::fft::{Complex, TransformEngine};

/// Wrap a phase into `[-π, π)`.
pub fn princarg(phase: f32) -> f32 {
    (phase + PI).rem_euclid(2.0 * PI) - PI
}

/// Onset detection function, one value per non-overlapping frame.
///
/// A partial trailing frame is zero-padded. The first frame has no
/// prediction and scores zero.
pub fn onset_detection(samples: &[f32], frame_size: usize) -> Result<Vec<f32>> {
    if frame_size == 0 {
        return Err(AnalysisError::invalid("frame_size", "must be at least 1"));
    }
    let bins = frame_size / 2 + 1;
    let mut engine = TransformEngine::new();

    let frames: Vec<Vec<Complex<f32>>> = samples
        .chunks(frame_size)
        .map(|chunk| {
            let mut buffer = vec![Complex::new(0.0f32, 0.0); frame_size];
            for (slot, &x) in buffer.iter_mut().zip(chunk) {
                *slot = Complex::new(x, 0.0);
            }
            engine.forward_complex(&mut buffer);
            buffer.truncate(bins);
            buffer
        })
        .collect();

    let mut onset = vec![0.0f32; frames.len()];
    let Some(first) = frames.first() else {
        return Ok(onset);
    };

    // phase history per bin, with an implicit zero phase before the first frame
    let mut phase_prev: Vec<f32> = first.iter().map(|x| x.arg()).collect();
    let mut phase_delta = phase_prev.clone();

    for (n, frame) in frames.iter().enumerate().skip(1) {
        let mut total = 0.0;
        for (k, x) in frame.iter().enumerate() {
            let predicted = princarg(phase_prev[k] + phase_delta[k]);
            total += (x - Complex::from_polar(x.norm(), predicted)).norm();

            let phase_now = x.arg();
            phase_delta[k] = phase_now - phase_prev[k];
            phase_prev[k] = phase_now;
        }
        onset[n] = total / frame_size as f32;
    }

    Ok(onset)
}
