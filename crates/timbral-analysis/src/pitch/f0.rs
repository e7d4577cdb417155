//! Centre-clipped difference-function pitch estimate.

/// Peak clipping level as a fraction of the frame maximum.
const PEAK_CLIP: f32 = 0.8;
/// Dead-zone half width as a fraction of the frame maximum.
const CENTRE_CLIP: f32 = 0.3;

/// Estimate f0 from the first lag whose difference error drops below the
/// lag-1 baseline.
///
/// The frame is clipped to `±0.8·max`, then centre-clipped: samples below
/// `0.3·max` become zero and the rest are shifted down by `0.3·max`. For the
/// first half of the frame the error `e(τ) = Σ|x[n] - x[n+τ]|` is compared to
/// `e(1)`. The first `τ ≥ 2` with `e(τ) < e(1)` gives
/// `sample_rate / (τ + e(τ)/e(1))`.
///
/// Returns `None` for silence, a non-positive maximum, or when no lag in the
/// window beats the baseline.
pub fn f0_autocorrelation(samples: &[f32], sample_rate: f32) -> Option<f32> {
    let max = samples.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if max <= 0.0 {
        return None;
    }

    let peak = PEAK_CLIP * max;
    let centre = CENTRE_CLIP * max;
    let clipped: Vec<f32> = samples
        .iter()
        .map(|&s| {
            let s = s.clamp(-peak, peak);
            if s < centre { 0.0 } else { s - centre }
        })
        .collect();

    let half = clipped.len() / 2;
    let error = |tau: usize| -> f32 {
        (1..half)
            .map(|n| (clipped[n] - clipped[n + tau]).abs())
            .sum()
    };

    let baseline = error(1);
    if baseline <= 0.0 {
        return None;
    }

    (2..half).find_map(|tau| {
        let e = error(tau);
        (e < baseline).then(|| sample_rate / (tau as f32 + e / baseline))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_sine_440() {
        let sr = 44100.0;
        let x: Vec<f32> = (0..2048)
            .map(|i| (2.0 * PI * 440.0 * i as f32 / sr).sin())
            .collect();
        let f = f0_autocorrelation(&x, sr).unwrap();
        assert!((f - 440.0).abs() / 440.0 < 0.03, "estimated {f}");
    }

    #[test]
    fn test_silence_is_none() {
        assert_eq!(f0_autocorrelation(&[0.0; 512], 44100.0), None);
        assert_eq!(f0_autocorrelation(&[-0.5; 64], 44100.0), None);
        assert_eq!(f0_autocorrelation(&[], 44100.0), None);
    }
}
