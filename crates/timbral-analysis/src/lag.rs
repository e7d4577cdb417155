//! Time-domain lag functions: autocorrelation, average magnitude difference
//! (AMDF), and average squared difference (ASDF).
//!
//! Each function evaluates a similarity or dissimilarity measure between a
//! signal and a copy of itself shifted by `τ` samples. Periodic signals show
//! a peak (autocorrelation) or a dip (AMDF, ASDF) at multiples of their
//! period, which makes these vectors the raw material for linear prediction
//! and for time-domain pitch estimation.
//!
//! # Definitions
//!
//! For a frame `x` of length `N`, every lag `τ` in `0..N` is normalized by
//! the full frame length rather than by the number of overlapping terms:
//!
//! ```text
//! r(τ)    = (1/N) Σ_{n=0}^{N-1-τ} x[n] · x[n+τ]
//! amdf(τ) = (1/N) Σ_{n=0}^{N-1-τ} |x[n] - x[n+τ]|
//! asdf(τ) = (1/N) Σ_{n=0}^{N-1-τ} (x[n] - x[n+τ])²
//! ```
//!
//! The `1/N` normalization is the biased estimator; it keeps the
//! autocorrelation sequence positive semi-definite, which the Levinson
//! recursion in [`crate::lpc`] relies on.
//!
//! # References
//!
//! - Rabiner & Schafer, "Digital Processing of Speech Signals" (1978), ch. 4.
//! - Ross et al., "Average magnitude difference function pitch extractor",
//!   IEEE Trans. ASSP 22(5), 1974.

fn lag_sum(samples: &[f32], max_lag: usize, term: impl Fn(f32, f32) -> f32) -> Vec<f32> {
    let n = samples.len();
    let scale = 1.0 / n as f32;
    (0..max_lag.min(n))
        .map(|lag| {
            samples
                .iter()
                .zip(&samples[lag..])
                .map(|(&a, &b)| term(a, b))
                .sum::<f32>()
                * scale
        })
        .collect()
}

/// Biased autocorrelation at every lag `0..N`.
pub fn autocorrelation(samples: &[f32]) -> Vec<f32> {
    autocorrelation_lags(samples, samples.len())
}

/// Biased autocorrelation at lags `0..max_lag` (clamped to the frame length).
///
/// Linear prediction of order `p` only needs `p + 1` lags; this avoids the
/// `O(N²)` cost of the full vector.
pub fn autocorrelation_lags(samples: &[f32], max_lag: usize) -> Vec<f32> {
    lag_sum(samples, max_lag, |a, b| a * b)
}

/// Average magnitude difference at every lag `0..N`.
pub fn amdf(samples: &[f32]) -> Vec<f32> {
    lag_sum(samples, samples.len(), |a, b| (a - b).abs())
}

/// Average squared difference at every lag `0..N`.
pub fn asdf(samples: &[f32]) -> Vec<f32> {
    lag_sum(samples, samples.len(), |a, b| (a - b) * (a - b))
}
