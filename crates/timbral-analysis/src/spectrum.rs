//! Amplitude spectra, peak picking, and harmonic filtering.
//!
//! A [`Spectrum`] pairs one amplitude with one centre frequency per bin.
//! The flat layout used by interchange formats places all amplitudes first
//! and all frequencies second; see [`Spectrum::from_flat`] and
//! [`Spectrum::to_flat`].

use crate::error::{AnalysisError, Result};
use crate::fft::{self, Complex};

/// Amplitude/frequency pairs for a run of transform bins, ascending in frequency.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Spectrum {
    amplitudes: Vec<f32>,
    frequencies: Vec<f32>,
}

impl Spectrum {
    /// Pair amplitudes with frequencies.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::LengthMismatch`] if the halves differ in length.
    pub fn new(amplitudes: Vec<f32>, frequencies: Vec<f32>) -> Result<Self> {
        AnalysisError::check_len(amplitudes.len(), frequencies.len())?;
        Ok(Self {
            amplitudes,
            frequencies,
        })
    }

    /// Split a flat `[amplitudes.., frequencies..]` buffer.
    pub fn from_flat(flat: &[f32]) -> Result<Self> {
        if flat.len() % 2 != 0 {
            return Err(AnalysisError::invalid(
                "spectrum",
                format!("flat layout needs an even length, got {}", flat.len()),
            ));
        }
        let (amplitudes, frequencies) = flat.split_at(flat.len() / 2);
        Self::new(amplitudes.to_vec(), frequencies.to_vec())
    }

    /// Flat `[amplitudes.., frequencies..]` layout.
    pub fn to_flat(&self) -> Vec<f32> {
        let mut flat = Vec::with_capacity(self.amplitudes.len() * 2);
        flat.extend_from_slice(&self.amplitudes);
        flat.extend_from_slice(&self.frequencies);
        flat
    }

    /// Amplitude half.
    pub fn amplitudes(&self) -> &[f32] {
        &self.amplitudes
    }

    /// Frequency half, in Hz.
    pub fn frequencies(&self) -> &[f32] {
        &self.frequencies
    }

    /// Consume into `(amplitudes, frequencies)`.
    pub fn into_parts(self) -> (Vec<f32>, Vec<f32>) {
        (self.amplitudes, self.frequencies)
    }

    /// Number of bins.
    pub fn len(&self) -> usize {
        self.amplitudes.len()
    }

    /// True if there are no bins.
    pub fn is_empty(&self) -> bool {
        self.amplitudes.is_empty()
    }

    /// Spacing between the first two bin frequencies.
    ///
    /// Only meaningful for a full spectrum; peak spectra zero the
    /// frequencies of discarded bins.
    pub fn bin_width(&self) -> Option<f32> {
        match self.frequencies.as_slice() {
            [a, b, ..] => Some(b - a),
            _ => None,
        }
    }

    /// Largest amplitude, or 0 for an empty spectrum.
    pub fn max_amplitude(&self) -> f32 {
        self.amplitudes.iter().copied().fold(0.0, f32::max)
    }

    /// `(frequency, amplitude)` for every bin with non-zero amplitude.
    pub fn peaks(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.frequencies
            .iter()
            .zip(&self.amplitudes)
            .filter(|&(_, &a)| a != 0.0)
            .map(|(&f, &a)| (f, a))
    }

    /// The surviving bin with the largest amplitude.
    ///
    /// `None` means no qualifying spectral peak.
    pub fn strongest_peak(&self) -> Option<(f32, f32)> {
        self.peaks()
            .fold(None, |best: Option<(f32, f32)>, (f, a)| match best {
                Some((_, best_a)) if best_a >= a => best,
                _ => Some((f, a)),
            })
    }

    /// Number of bins with non-zero amplitude.
    pub fn nonzero_count(&self) -> usize {
        self.amplitudes.iter().filter(|&&a| a != 0.0).count()
    }
}

/// Raw transform bins with their centre frequencies.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComplexSpectrum {
    /// Unnormalized transform output, one value per bin.
    pub bins: Vec<Complex<f32>>,
    /// Centre frequency of each bin, in Hz.
    pub frequencies: Vec<f32>,
}

/// Options for [`spectrum`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpectrumOptions {
    /// Keep bin 0. With DC the spectrum covers bins `0..=N/2`, without it `1..=N/2`.
    pub include_dc: bool,
    /// Scale amplitudes so the largest is 1.
    pub normalize: bool,
}

fn bin_range(n: usize, include_dc: bool) -> std::ops::RangeInclusive<usize> {
    if include_dc { 0..=n / 2 } else { 1..=n / 2 }
}

fn forward(samples: &[f32], sample_rate: f32) -> Result<(Vec<f32>, Vec<f32>)> {
    if samples.is_empty() {
        return Err(AnalysisError::EmptyInput("samples"));
    }
    AnalysisError::check_sample_rate(sample_rate)?;
    let mut real = samples.to_vec();
    let mut imag = vec![0.0; samples.len()];
    fft::transform(&mut real, &mut imag)?;
    Ok((real, imag))
}

/// Amplitude spectrum of a frame.
///
/// Amplitude of bin `k` is `|X[k]| / N`; its frequency is `k * sample_rate / N`.
pub fn spectrum(samples: &[f32], sample_rate: f32, options: SpectrumOptions) -> Result<Spectrum> {
    let (real, imag) = forward(samples, sample_rate)?;
    let n = samples.len();
    let scale = 1.0 / n as f32;

    let range = bin_range(n, options.include_dc);
    let mut amplitudes: Vec<f32> = range
        .clone()
        .map(|k| real[k].hypot(imag[k]) * scale)
        .collect();
    let frequencies = range.map(|k| k as f32 * sample_rate / n as f32).collect();

    if options.normalize {
        let max = amplitudes.iter().copied().fold(0.0, f32::max);
        if max > 0.0 {
            for a in &mut amplitudes {
                *a /= max;
            }
        }
    }

    Spectrum::new(amplitudes, frequencies)
}

/// Complex transform bins over the same range as [`spectrum`], unnormalized.
pub fn complex_spectrum(
    samples: &[f32],
    sample_rate: f32,
    include_dc: bool,
) -> Result<ComplexSpectrum> {
    let (real, imag) = forward(samples, sample_rate)?;
    let n = samples.len();
    let range = bin_range(n, include_dc);
    Ok(ComplexSpectrum {
        bins: range
            .clone()
            .map(|k| Complex::new(real[k], imag[k]))
            .collect(),
        frequencies: range.map(|k| k as f32 * sample_rate / n as f32).collect(),
    })
}

/// Keep only interpolated local maxima at or above a relative threshold.
///
/// `spectrum` must exclude the DC bin: index `n` is treated as bin `n + 1`
/// when computing the refined frequency `bin_width * (n + 1 + p)`. A
/// `threshold_percent` outside `[0, 100]` is replaced by 0.
pub fn peak_spectrum(spectrum: &Spectrum, bin_width: f32, threshold_percent: f32) -> Result<Spectrum> {
    if !(bin_width.is_finite() && bin_width > 0.0) {
        return Err(AnalysisError::invalid(
            "bin_width",
            format!("must be finite and positive, got {bin_width}"),
        ));
    }

    let threshold_percent = if (0.0..=100.0).contains(&threshold_percent) {
        threshold_percent
    } else {
        #[cfg(feature = "tracing")]
        tracing::warn!(
            threshold_percent,
            "peak threshold outside [0, 100], using 0"
        );
        0.0
    };

    let amps = spectrum.amplitudes();
    let n = amps.len();
    let threshold = threshold_percent / 100.0 * spectrum.max_amplitude();

    let mut amplitudes = vec![0.0; n];
    let mut frequencies = vec![0.0; n];

    for i in 1..n.saturating_sub(1) {
        let (y1, y2, y3) = (amps[i - 1], amps[i], amps[i + 1]);
        if y2 > y1 && y2 > y3 && y2 >= threshold {
            let denom = y1 - 2.0 * (y2 + y3);
            let p = if denom == 0.0 {
                0.0
            } else {
                0.5 * (y1 - y3) / denom
            };
            frequencies[i] = bin_width * (i as f32 + 1.0 + p);
            amplitudes[i] = y2 - 0.25 * (y1 - y3) * p;
        }
    }

    Spectrum::new(amplitudes, frequencies)
}

/// Keep only peaks lying close to an integer multiple of `f0`.
///
/// `tolerance` is the largest allowed distance between `frequency / f0` and
/// its nearest integer, as a fraction in `[0, 0.5]`.
pub fn harmonic_spectrum(peaks: &Spectrum, f0: f32, tolerance: f32) -> Result<Spectrum> {
    if !(f0.is_finite() && f0 > 0.0) {
        return Err(AnalysisError::invalid(
            "f0",
            format!("must be finite and positive, got {f0}"),
        ));
    }
    if !(0.0..=0.5).contains(&tolerance) {
        return Err(AnalysisError::invalid(
            "tolerance",
            format!("must be a fraction in [0, 0.5], got {tolerance}"),
        ));
    }

    let (amplitudes, frequencies): (Vec<f32>, Vec<f32>) = peaks
        .frequencies()
        .iter()
        .zip(peaks.amplitudes())
        .map(|(&f, &a)| {
            if a == 0.0 {
                return (0.0, 0.0);
            }
            let ratio = f / f0;
            if (ratio.round() - ratio).abs() <= tolerance {
                (a, f)
            } else {
                (0.0, 0.0)
            }
        })
        .unzip();

    Spectrum::new(amplitudes, frequencies)
}
