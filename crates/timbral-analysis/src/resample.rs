//! Rational resampling by P/Q with a frequency-sampled lowpass and block
//! overlap-add filtering.
//!
//! # Theory
//!
//! Resampling by P/Q changes the sample count from `N` to `K = floor(N·P/Q)`.
//! The time axis is remapped with second-order (three-point) Lagrange
//! interpolation, and a lowpass at `min(P, Q) / max(P, Q) / 2` cycles per
//! sample keeps the content below the lower of the two Nyquist limits:
//!
//! - upsampling interpolates first, then removes spectral images;
//! - downsampling filters first (anti-aliasing), then interpolates down.
//!
//! The lowpass is designed in the frequency domain: an ideal boxcar
//! passband is inverse transformed, rotated so the impulse sits at the
//! centre of the kernel, and tapered with a Blackman-Harris window:
//!
//! ```text
//! h[i] = IDFT(boxcar)[(i + M/2) mod M] / M · w_bh[i]
//! w_bh[i] = 0.35875 - 0.48829·cos(2πi/M) + 0.14128·cos(4πi/M) - 0.01168·cos(6πi/M)
//! ```
//!
//! The kernel is normalized to unity DC gain. Filtering runs block by block:
//! each block of `M` samples is zero-padded to `2M`, multiplied by the
//! kernel's transform, and the trailing half of each result is carried into
//! the next block. The `M/2` sample group delay is removed so the output
//! lines up with the input.
//!
//! Reference: J. O. Smith, *Spectral Audio Signal Processing*, 2011,
//! "Overlap-Add (OLA) STFT Processing".
//!
//! # Example
//!
//! ```rust
//! use timbral_analysis::resample::resample;
//!
//! let sr = 8000.0_f32;
//! let signal: Vec<f32> = (0..800)
//!     .map(|i| (2.0 * std::f32::consts::PI * 200.0 * i as f32 / sr).sin())
//!     .collect();
//!
//! // 8 kHz -> 12 kHz
//! let up = resample(&signal, 3, 2, 128).unwrap();
//! assert_eq!(up.len(), 1200);
//! ```

use crate::error::{AnalysisError, Result};
use crate::fft::{self, Complex, TransformEngine, Window};

/// Default lowpass kernel length.
pub const DEFAULT_FILTER_ORDER: usize = 512;

/// Resampler settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResampleConfig {
    /// Lowpass kernel length (at least 2).
    pub filter_order: usize,
}

impl Default for ResampleConfig {
    fn default() -> Self {
        Self {
            filter_order: DEFAULT_FILTER_ORDER,
        }
    }
}

/// A windowed lowpass kernel and its zero-padded transform.
///
/// Building the filter costs one inverse and one forward transform, so
/// callers converting many buffers at the same ratio can design it once and
/// use [`resample_with_filter`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResampleFilter {
    order: usize,
    cutoff: f32,
    coefficients: Vec<f32>,
    spectrum: Vec<Complex<f32>>,
}

impl ResampleFilter {
    /// Design a lowpass of `order` taps with `cutoff` in cycles per sample.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::InvalidParameter`] if `order < 2`, if `cutoff` lies
    /// outside `(0, 0.5]`, or if the passband rounds to zero bins.
    pub fn design(order: usize, cutoff: f32) -> Result<Self> {
        if order < 2 {
            return Err(AnalysisError::invalid(
                "filter_order",
                format!("must be at least 2, got {order}"),
            ));
        }
        if !(cutoff > 0.0 && cutoff <= 0.5) {
            return Err(AnalysisError::invalid(
                "cutoff",
                format!("must lie in (0, 0.5], got {cutoff}"),
            ));
        }
        let passband = (cutoff * order as f32).floor() as usize;
        if passband == 0 {
            return Err(AnalysisError::invalid(
                "filter_order",
                format!("{order} taps leave no passband bins at cutoff {cutoff}"),
            ));
        }

        let mut real = vec![0.0f32; order];
        let mut imag = vec![0.0f32; order];
        real[..passband].fill(1.0);
        if order > passband + 1 {
            real[order - passband + 1..].fill(1.0);
        }
        fft::inverse_transform(&mut real, &mut imag)?;

        let window = Window::BlackmanHarris.coefficients(order);
        let mut coefficients: Vec<f32> = (0..order)
            .map(|i| real[(i + order / 2) % order] / order as f32 * window[i])
            .collect();

        let dc: f32 = coefficients.iter().sum();
        if dc != 0.0 {
            for c in &mut coefficients {
                *c /= dc;
            }
        }

        let mut spectrum: Vec<Complex<f32>> = coefficients
            .iter()
            .map(|&c| Complex::new(c, 0.0))
            .chain(std::iter::repeat_n(Complex::new(0.0, 0.0), order))
            .collect();
        fft::transform_complex(&mut spectrum);

        Ok(Self {
            order,
            cutoff,
            coefficients,
            spectrum,
        })
    }

    /// Kernel length.
    pub fn order(&self) -> usize {
        self.order
    }

    /// Cutoff in cycles per sample.
    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    /// Kernel taps, centred on index `order / 2`.
    pub fn coefficients(&self) -> &[f32] {
        &self.coefficients
    }

    /// Filter `signal` by block overlap-add.
    ///
    /// The output has the input's length and is aligned with it.
    pub fn apply(&self, signal: &[f32]) -> Vec<f32> {
        if signal.is_empty() {
            return Vec::new();
        }
        let m = self.order;
        let blocks = signal.len().div_ceil(m);
        let mut full = vec![0.0f32; (blocks + 1) * m];
        let mut engine = TransformEngine::new();
        let mut buffer = vec![Complex::new(0.0f32, 0.0); 2 * m];
        let scale = 1.0 / (2 * m) as f32;

        for (b, block) in signal.chunks(m).enumerate() {
            for (slot, &x) in buffer.iter_mut().zip(block) {
                *slot = Complex::new(x, 0.0);
            }
            buffer[block.len()..].fill(Complex::new(0.0, 0.0));

            engine.forward_complex(&mut buffer);
            for (x, h) in buffer.iter_mut().zip(&self.spectrum) {
                *x *= *h;
            }
            engine.inverse_complex(&mut buffer);

            // leading half lands on this block, trailing half carries into the next
            let offset = b * m;
            for (i, y) in buffer.iter().enumerate() {
                full[offset + i] += y.re * scale;
            }
        }

        let delay = m / 2;
        full[delay..delay + signal.len()].to_vec()
    }
}

/// Second-order Lagrange interpolation of `data` onto `target_len` evenly
/// spaced points.
///
/// Output sample `k` is evaluated at `t = k·N/K` through `x[n-1]`, `x[n]`
/// and `x[n+1]` with `n = floor(t)`; samples outside the buffer are zero.
pub fn interpolate_three_point(data: &[f32], target_len: usize) -> Vec<f32> {
    let n_len = data.len();
    if n_len == 0 || target_len == 0 {
        return vec![0.0; target_len];
    }
    let at = |i: isize| -> f32 {
        usize::try_from(i)
            .ok()
            .and_then(|i| data.get(i).copied())
            .unwrap_or(0.0)
    };
    let step = n_len as f64 / target_len as f64;

    (0..target_len)
        .map(|k| {
            let t = k as f64 * step;
            let n = t.floor();
            let u = (t - n) as f32;
            let n = n as isize;
            if u == 0.0 {
                return at(n);
            }
            0.5 * u * (u - 1.0) * at(n - 1) + (1.0 - u * u) * at(n) + 0.5 * u * (u + 1.0) * at(n + 1)
        })
        .collect()
}

fn check_ratio(p: usize, q: usize) -> Result<()> {
    if p == 0 {
        return Err(AnalysisError::invalid("p", "must be at least 1"));
    }
    if q == 0 {
        return Err(AnalysisError::invalid("q", "must be at least 1"));
    }
    Ok(())
}

/// Lowpass cutoff for a P/Q conversion, in cycles per sample.
pub fn cutoff_for_ratio(p: usize, q: usize) -> f32 {
    p.min(q) as f32 / p.max(q) as f32 / 2.0
}

/// Shortest kernel that keeps at least one passband bin at `cutoff`.
pub fn min_filter_order(cutoff: f32) -> usize {
    (1.0 / cutoff).ceil() as usize + 1
}

/// Resample `signal` by `p / q` using a freshly designed filter.
///
/// `p == q` returns the input unchanged. For extreme ratios the kernel is
/// lengthened to [`min_filter_order`] of the cutoff when `filter_order` is
/// too short to leave a passband.
///
/// # Errors
///
/// [`AnalysisError::InvalidParameter`] if `p` or `q` is zero or the filter
/// cannot be designed (see [`ResampleFilter::design`]).
pub fn resample(signal: &[f32], p: usize, q: usize, filter_order: usize) -> Result<Vec<f32>> {
    check_ratio(p, q)?;
    if filter_order < 2 {
        return Err(AnalysisError::invalid(
            "filter_order",
            format!("must be at least 2, got {filter_order}"),
        ));
    }
    if p == q {
        return Ok(signal.to_vec());
    }
    let cutoff = cutoff_for_ratio(p, q);
    let order = filter_order.max(min_filter_order(cutoff));
    #[cfg(feature = "tracing")]
    if order != filter_order {
        tracing::debug!(requested = filter_order, order, "lengthened resampling kernel");
    }
    let filter = ResampleFilter::design(order, cutoff)?;
    resample_with_filter(signal, p, q, &filter)
}

/// Resample `signal` by `p / q` with a caller-supplied filter.
pub fn resample_with_filter(
    signal: &[f32],
    p: usize,
    q: usize,
    filter: &ResampleFilter,
) -> Result<Vec<f32>> {
    check_ratio(p, q)?;
    if p == q {
        return Ok(signal.to_vec());
    }
    let target_len = signal.len() * p / q;

    #[cfg(feature = "tracing")]
    tracing::debug!(
        input = signal.len(),
        output = target_len,
        order = filter.order(),
        "resampling"
    );

    if p > q {
        let expanded = interpolate_three_point(signal, target_len);
        Ok(filter.apply(&expanded))
    } else {
        let filtered = filter.apply(signal);
        Ok(interpolate_three_point(&filtered, target_len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    /// Generate a sine wave at `frequency` Hz, sampled at `sample_rate` Hz.
    fn sine_wave(frequency: f32, sample_rate: f32, num_samples: usize) -> Vec<f32> {
        (0..num_samples)
            .map(|i| (2.0 * PI * frequency * i as f32 / sample_rate).sin())
            .collect()
    }

    fn energy(x: &[f32]) -> f32 {
        x.iter().map(|v| v * v).sum::<f32>() / x.len() as f32
    }

    #[test]
    fn test_filter_unity_dc_and_symmetry() {
        let filter = ResampleFilter::design(64, 0.25).unwrap();
        let coeffs = filter.coefficients();
        let sum: f32 = coeffs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5, "DC gain {sum}");

        // even-length kernel centred on index 32: h[32 - i] == h[32 + i]
        for i in 1..32 {
            assert!(
                (coeffs[32 - i] - coeffs[32 + i]).abs() < 1e-5,
                "asymmetric at offset {i}"
            );
        }
        let peak = coeffs
            .iter()
            .enumerate()
            .fold((0, f32::MIN), |best, (i, &c)| if c > best.1 { (i, c) } else { best });
        assert_eq!(peak.0, 32);
    }

    #[test]
    fn test_filter_design_rejects() {
        assert!(ResampleFilter::design(1, 0.25).is_err());
        assert!(ResampleFilter::design(64, 0.0).is_err());
        assert!(ResampleFilter::design(64, 0.75).is_err());
        assert!(ResampleFilter::design(4, 0.1).is_err());
    }

    #[test]
    fn test_apply_passes_dc() {
        let filter = ResampleFilter::design(32, 0.25).unwrap();
        let out = filter.apply(&vec![1.0; 256]);
        assert_eq!(out.len(), 256);
        for &v in &out[32..224] {
            assert!((v - 1.0).abs() < 1e-3, "dc gain {v}");
        }
    }

    #[test]
    fn test_apply_is_plain_linear_convolution() {
        let filter = ResampleFilter::design(16, 0.25).unwrap();
        let h = filter.coefficients();
        // spans several blocks with a partial tail
        let x: Vec<f32> = (0..53).map(|i| ((i * 7 % 11) as f32 - 5.0) / 5.0).collect();
        let out = filter.apply(&x);

        let delay = 8;
        for (n, &y) in out.iter().enumerate() {
            let t = n + delay;
            let direct: f32 = h
                .iter()
                .enumerate()
                .filter(|&(j, _)| j <= t && t - j < x.len())
                .map(|(j, &c)| c * x[t - j])
                .sum();
            assert!((y - direct).abs() < 1e-4, "sample {n}: {y} vs {direct}");
        }
    }

    #[test]
    fn test_apply_rejects_high_band() {
        let filter = ResampleFilter::design(128, 0.1).unwrap();
        let high = sine_wave(3500.0, 8000.0, 1024);
        let out = filter.apply(&high);
        assert!(energy(&out[128..896]) < 1e-4 * energy(&high));
    }

    #[test]
    fn test_interpolate_identity_grid() {
        let data = [1.0, 2.0, 4.0, 8.0];
        assert_eq!(interpolate_three_point(&data, 4), data.to_vec());
        // quadratic through (0,1) (1,2) (2,4) at t = 1.5
        let up = interpolate_three_point(&data, 8);
        assert!((up[3] - 2.875).abs() < 1e-6, "{}", up[3]);
        assert!(interpolate_three_point(&[], 3).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_identity_ratio() {
        let x = sine_wave(440.0, 8000.0, 333);
        assert_eq!(resample(&x, 5, 5, 64).unwrap(), x);
        assert_eq!(resample(&x, 1, 1, 2).unwrap(), x);
    }

    #[test]
    fn test_invalid_ratio() {
        assert!(resample(&[1.0], 0, 2, 64).is_err());
        assert!(resample(&[1.0], 2, 0, 64).is_err());
        assert!(resample(&[1.0], 2, 3, 1).is_err());
    }

    #[test]
    fn test_extreme_ratio_lengthens_kernel() {
        assert_eq!(min_filter_order(0.25), 5);
        assert!(ResampleFilter::design(512, cutoff_for_ratio(1, 300)).is_err());

        let x = vec![1.0f32; 6000];
        let down = resample(&x, 1, 300, 512).unwrap();
        assert_eq!(down.len(), 20);
        assert!((down[10] - 1.0).abs() < 1e-2, "dc gain {}", down[10]);
    }

    #[test]
    fn test_up_then_down_roundtrip() {
        let sr = 8000.0;
        let x = sine_wave(200.0, sr, 1000);
        let up = resample(&x, 3, 2, 128).unwrap();
        assert_eq!(up.len(), 1500);
        let back = resample(&up, 2, 3, 128).unwrap();
        assert!(back.len().abs_diff(x.len()) <= 1);

        let e_in = energy(&x[200..800]);
        let e_out = energy(&back[200..800]);
        assert!(
            (e_out - e_in).abs() / e_in < 0.1,
            "energy {e_in} -> {e_out}"
        );
    }

    #[test]
    fn test_downsample_keeps_tone() {
        let x = sine_wave(500.0, 16000.0, 4000);
        let down = resample(&x, 1, 2, 256).unwrap();
        assert_eq!(down.len(), 2000);
        let e = energy(&down[400..1600]);
        assert!((e - 0.5).abs() < 0.05, "energy {e}");
    }
}
