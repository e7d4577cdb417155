//! YIN cumulative mean normalized difference.
//!
//! ```text
//! d(τ)  = Σ_t (x[t] - x[t+τ])²
//! d'(τ) = d(τ) / ((1/τ) · Σ_{j=1}^{τ} d(j))
//! ```
//!
//! Reference: de Cheveigné & Kawahara, "YIN, a fundamental frequency
//! estimator for speech and music", JASA 111(4), 2002.

/// Cumulative mean normalized difference curve, one value per lag.
///
/// Lag 0 is defined as `1.0`. A lag whose running sum is still zero also
/// reads `1.0`.
pub fn yin_difference(samples: &[f32]) -> Vec<f32> {
    let n = samples.len();
    let mut curve = vec![1.0f32; n];
    let mut running = 0.0f32;

    for tau in 1..n {
        let d: f32 = samples
            .iter()
            .zip(&samples[tau..])
            .map(|(a, b)| (a - b) * (a - b))
            .sum();
        running += d;
        if running > 0.0 {
            curve[tau] = d * tau as f32 / running;
        }
    }
    curve
}

/// Pick a pitch from a [`yin_difference`] curve.
///
/// Takes the first lag `τ ≥ 2` below `threshold`, follows the dip down to its
/// local minimum, and refines the lag with a parabola through the
/// neighbouring points. `None` if the curve never crosses the threshold.
pub fn yin_pitch(curve: &[f32], sample_rate: f32, threshold: f32) -> Option<f32> {
    let mut tau = (2..curve.len()).find(|&t| curve[t] < threshold)?;
    while tau + 1 < curve.len() && curve[tau + 1] < curve[tau] {
        tau += 1;
    }

    let mut period = tau as f32;
    if tau + 1 < curve.len() {
        let (s0, s1, s2) = (curve[tau - 1], curve[tau], curve[tau + 1]);
        let denom = s0 - 2.0 * s1 + s2;
        if denom.abs() > f32::EPSILON {
            period += 0.5 * (s0 - s2) / denom;
        }
    }

    (period > 0.0).then(|| sample_rate / period)
}
