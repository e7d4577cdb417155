//! Scalar and vector descriptors of spectral shape.
//!
//! Every function reads the amplitude and frequency halves of a
//! [`Spectrum`]. Descriptors whose denominator vanishes (silence, empty
//! peak sets) return `0.0` rather than NaN.
//!
//! Filterbank-based descriptors consume injected tables: [`Filterbank`] for
//! MFCC, [`BarkLimits`] for bark band sums and [`PitchClassMap`] for the
//! pitch class profile. Building the first two is left to the caller.

use std::f32::consts::PI;

use crate::error::{AnalysisError, Result};
use crate::spectrum::Spectrum;

/// Floor applied to filter outputs before the logarithm in [`mfcc`].
pub const MFCC_FLOOR: f32 = 2e-42;

fn check_f0(f0: f32) -> Result<()> {
    if f0.is_finite() && f0 > 0.0 {
        Ok(())
    } else {
        Err(AnalysisError::invalid(
            "f0",
            format!("must be finite and positive, got {f0}"),
        ))
    }
}

/// Index of the harmonic nearest to `freq`, counting the fundamental as 1.
fn harmonic_number(freq: f32, f0: f32) -> i64 {
    (freq / f0 + 0.5).floor() as i64
}

/// Amplitude-weighted mean frequency, `Σ f·a / Σ a`.
pub fn spectral_centroid(spectrum: &Spectrum) -> f32 {
    let total: f32 = spectrum.amplitudes().iter().sum();
    if total == 0.0 {
        return 0.0;
    }
    let weighted: f32 = spectrum
        .frequencies()
        .iter()
        .zip(spectrum.amplitudes())
        .map(|(f, a)| f * a)
        .sum();
    weighted / total
}

/// Amplitude-weighted variance of frequency about the centroid.
pub fn spectral_spread(spectrum: &Spectrum) -> f32 {
    let total: f32 = spectrum.amplitudes().iter().sum();
    if total == 0.0 {
        return 0.0;
    }
    let centroid = spectral_centroid(spectrum);
    let weighted: f32 = spectrum
        .frequencies()
        .iter()
        .zip(spectrum.amplitudes())
        .map(|(f, a)| (f - centroid).powi(2) * a)
        .sum();
    weighted / total
}

/// Ratio of geometric to arithmetic mean amplitude.
///
/// Zero bins are skipped in the product but both means are taken over all
/// bins. The geometric mean is accumulated in the log domain.
pub fn spectral_flatness(spectrum: &Spectrum) -> f32 {
    let amps = spectrum.amplitudes();
    let k = amps.len() as f32;
    let mut log_sum = 0.0f64;
    let mut sum = 0.0f32;
    let mut count = 0usize;

    for &a in amps.iter().filter(|&&a| a != 0.0) {
        log_sum += f64::from(a).ln();
        sum += a;
        count += 1;
    }

    if count == 0 || sum == 0.0 {
        return 0.0;
    }
    let geometric = (log_sum / f64::from(k)).exp() as f32;
    geometric / (sum / k)
}

/// Flatness in decibels, `10·log10(flatness)`. `None` for zero flatness.
pub fn flatness_db(flatness: f32) -> Option<f32> {
    (flatness > 0.0).then(|| 10.0 * flatness.log10())
}

/// Tonality coefficient, `min(flatness_db / -60, 1)`.
///
/// A zero flatness (no measurable noise floor) is fully tonal.
pub fn tonality(flatness_db: Option<f32>) -> f32 {
    flatness_db.map_or(1.0, |db| (db / -60.0).min(1.0))
}

/// Frequency of the bin at which the running amplitude sum first reaches
/// `percent` of the total.
pub fn spectral_rolloff(spectrum: &Spectrum, percent: f32) -> Result<f32> {
    if !(percent > 0.0 && percent <= 100.0) {
        return Err(AnalysisError::invalid(
            "percent",
            format!("must lie in (0, 100], got {percent}"),
        ));
    }
    let amps = spectrum.amplitudes();
    let total: f32 = amps.iter().sum();
    if total == 0.0 {
        return Ok(0.0);
    }

    let pivot = total * percent / 100.0;
    let mut running = 0.0;
    for (i, &a) in amps.iter().enumerate() {
        running += a;
        if running >= pivot {
            return Ok(spectrum.frequencies()[i]);
        }
    }
    // float rounding can leave the running sum a hair under the pivot
    Ok(spectrum.frequencies().last().copied().unwrap_or(0.0))
}

/// Least-squares slope of amplitude against frequency, divided by total amplitude.
pub fn spectral_slope(spectrum: &Spectrum) -> f32 {
    let m = spectrum.len() as f32;
    let mut f_sum = 0.0;
    let mut a_sum = 0.0;
    let mut fa_sum = 0.0;
    let mut f_sq_sum = 0.0;
    for (&f, &a) in spectrum.frequencies().iter().zip(spectrum.amplitudes()) {
        f_sum += f;
        a_sum += a;
        fa_sum += f * a;
        f_sq_sum += f * f;
    }
    let denom = m * f_sq_sum - f_sum * f_sum;
    if a_sum == 0.0 || denom == 0.0 {
        return 0.0;
    }
    (m * fa_sum - f_sum * a_sum) / denom / a_sum
}

/// Krimphoff irregularity: deviation of each amplitude from its three-bin mean.
pub fn irregularity_k(spectrum: &Spectrum) -> f32 {
    spectrum
        .amplitudes()
        .windows(3)
        .map(|w| (w[1] - (w[0] + w[1] + w[2]) / 3.0).abs())
        .sum()
}

/// Jensen irregularity: squared successive differences over energy.
pub fn irregularity_j(spectrum: &Spectrum) -> f32 {
    let amps = spectrum.amplitudes();
    if amps.len() < 2 {
        return 0.0;
    }
    let num: f32 = amps.windows(2).map(|w| (w[0] - w[1]).powi(2)).sum();
    let den: f32 = amps[..amps.len() - 1].iter().map(|a| a * a).sum();
    if den == 0.0 { 0.0 } else { num / den }
}

/// McAdams spectral smoothness over log amplitudes.
///
/// Non-positive amplitudes are floored at `1e-5` before the logarithm.
pub fn smoothness(spectrum: &Spectrum) -> f32 {
    let level = |a: f32| {
        let a = if a <= 0.0 { 1e-5f32 } else { a };
        20.0 * a.ln()
    };
    spectrum
        .amplitudes()
        .windows(3)
        .map(|w| {
            let (prev, cur, next) = (level(w[0]), level(w[1]), level(w[2]));
            (cur - (prev + cur + next) / 3.0).abs()
        })
        .sum()
}

/// Share of amplitude in harmonic 1, harmonics 2 to 4, and harmonics 5 and up.
pub fn tristimulus(spectrum: &Spectrum, f0: f32) -> Result<[f32; 3]> {
    check_f0(f0)?;
    let mut bands = [0.0f32; 3];
    let mut total = 0.0;
    for (f, a) in spectrum.peaks() {
        total += a;
        match harmonic_number(f, f0) {
            1 => bands[0] += a,
            2..=4 => bands[1] += a,
            h if h >= 5 => bands[2] += a,
            _ => {}
        }
    }
    if total == 0.0 {
        return Ok([0.0; 3]);
    }
    Ok(bands.map(|b| b / total))
}

/// Odd to even harmonic amplitude ratio. Zero if either side is empty.
pub fn odd_even_ratio(harmonics: &Spectrum, f0: f32) -> Result<f32> {
    check_f0(f0)?;
    let (mut odd, mut even) = (0.0, 0.0);
    for (f, a) in harmonics.peaks() {
        if harmonic_number(f, f0) % 2 != 0 {
            odd += a;
        } else {
            even += a;
        }
    }
    if odd == 0.0 || even == 0.0 {
        Ok(0.0)
    } else {
        Ok(odd / even)
    }
}

/// Energy-weighted deviation of peaks from exact harmonic positions,
/// `2·Σ|f - h·f0|·a² / (f0·Σa²)`.
pub fn spectral_inharmonicity(peaks: &Spectrum, f0: f32) -> Result<f32> {
    check_f0(f0)?;
    let (mut num, mut den) = (0.0, 0.0);
    for (f, a) in peaks.peaks() {
        let h = harmonic_number(f, f0) as f32;
        let energy = a * a;
        num += (f - h * f0).abs() * energy;
        den += energy;
    }
    if den == 0.0 {
        Ok(0.0)
    } else {
        Ok(2.0 * num / (f0 * den))
    }
}

/// Fraction of spectral peaks that are not harmonics, `(p - h) / p`.
pub fn noisiness(harmonic_count: usize, peak_count: usize) -> f32 {
    if peak_count == 0 {
        return 0.0;
    }
    (peak_count as f32 - harmonic_count as f32) / peak_count as f32
}

/// DCT-II, `X[n] = Σ x[m]·cos(π·n·(m + 0.5) / N)`.
pub fn dct(values: &[f32]) -> Vec<f32> {
    let n_len = values.len() as f32;
    (0..values.len())
        .map(|n| {
            let scale = PI * n as f32 / n_len;
            values
                .iter()
                .enumerate()
                .map(|(m, &x)| x * (scale * (m as f32 + 0.5)).cos())
                .sum()
        })
        .collect()
}

/// A bank of spectral weighting filters, one row per filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Filterbank {
    filters: Vec<Vec<f32>>,
}

impl Filterbank {
    /// Wrap precomputed filter rows. All rows must share one non-zero length.
    pub fn new(filters: Vec<Vec<f32>>) -> Result<Self> {
        let Some(first) = filters.first() else {
            return Err(AnalysisError::EmptyInput("filterbank"));
        };
        let bins = first.len();
        if bins == 0 {
            return Err(AnalysisError::EmptyInput("filterbank row"));
        }
        for row in &filters {
            AnalysisError::check_len(bins, row.len())?;
        }
        Ok(Self { filters })
    }

    /// Filter rows.
    pub fn filters(&self) -> &[Vec<f32>] {
        &self.filters
    }

    /// Number of filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Always false; construction rejects empty banks.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Spectrum bins each filter covers.
    pub fn bins(&self) -> usize {
        self.filters.first().map_or(0, Vec::len)
    }
}

/// Mel-frequency cepstral coefficients from an injected filterbank.
///
/// Each filter output is floored at [`MFCC_FLOOR`], log-compressed, and
/// the result is passed through [`dct`].
pub fn mfcc(spectrum: &Spectrum, filterbank: &Filterbank) -> Result<Vec<f32>> {
    if filterbank.bins() != spectrum.len() {
        return Err(AnalysisError::FilterbankShape {
            expected: filterbank.bins(),
            actual: spectrum.len(),
        });
    }
    let energies: Vec<f32> = filterbank
        .filters()
        .iter()
        .map(|filter| {
            let sum: f32 = filter
                .iter()
                .zip(spectrum.amplitudes())
                .map(|(w, a)| w * a)
                .sum();
            sum.max(MFCC_FLOOR).ln()
        })
        .collect();
    Ok(dct(&energies))
}

/// Ascending bin indices delimiting bark bands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarkLimits(Vec<usize>);

impl BarkLimits {
    /// Validate band edges: at least two, non-decreasing.
    pub fn new(limits: Vec<usize>) -> Result<Self> {
        if limits.len() < 2 {
            return Err(AnalysisError::invalid(
                "bark_limits",
                format!("need at least 2 edges, got {}", limits.len()),
            ));
        }
        if limits.windows(2).any(|w| w[1] < w[0]) {
            return Err(AnalysisError::invalid(
                "bark_limits",
                "edges must be non-decreasing",
            ));
        }
        Ok(Self(limits))
    }

    /// Band edges.
    pub fn limits(&self) -> &[usize] {
        &self.0
    }

    /// Number of bands (one fewer than edges).
    pub fn bands(&self) -> usize {
        self.0.len() - 1
    }
}

/// Amplitude sum of each band between consecutive bark limits.
pub fn bark_coefficients(spectrum: &Spectrum, limits: &BarkLimits) -> Result<Vec<f32>> {
    let edges = limits.limits();
    let last = edges[edges.len() - 1];
    if last > spectrum.len() {
        return Err(AnalysisError::FilterbankShape {
            expected: last,
            actual: spectrum.len(),
        });
    }
    let amps = spectrum.amplitudes();
    Ok(edges
        .windows(2)
        .map(|w| amps[w[0]..w[1]].iter().sum())
        .collect())
}

/// Total loudness over bark bands, `Σ b^0.23`.
pub fn loudness(bark_bands: &[f32]) -> f32 {
    bark_bands.iter().map(|b| b.powf(0.23)).sum()
}

/// Zwicker sharpness over bark bands.
pub fn sharpness(bark_bands: &[f32]) -> f32 {
    if bark_bands.is_empty() {
        return 0.0;
    }
    let weighted: f32 = bark_bands
        .iter()
        .enumerate()
        .map(|(n, b)| {
            let g = if n < 15 {
                1.0
            } else {
                0.066 * (0.171 * n as f32).exp()
            };
            n as f32 * g * b.powf(0.23)
        })
        .sum();
    0.11 * weighted / bark_bands.len() as f32
}

/// Frequency of pitch class 0 in [`PitchClassMap::from_frequencies`] (G1).
pub const PITCH_CLASS_REFERENCE: f32 = 48.999_43;

/// Pitch class (`0..12`) of every spectrum bin; `None` leaves a bin out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PitchClassMap(Vec<Option<u8>>);

impl PitchClassMap {
    /// Validate that every class lies in `0..12`.
    pub fn new(classes: Vec<Option<u8>>) -> Result<Self> {
        if let Some(bad) = classes.iter().flatten().find(|&&c| c >= 12) {
            return Err(AnalysisError::invalid(
                "pitch_classes",
                format!("classes must lie in 0..12, got {bad}"),
            ));
        }
        Ok(Self(classes))
    }

    /// Nearest equal-tempered class of each frequency, counted in semitones
    /// from `reference` modulo 12. Non-positive frequencies map to `None`.
    pub fn from_frequencies(frequencies: &[f32], reference: f32) -> Result<Self> {
        if !(reference.is_finite() && reference > 0.0) {
            return Err(AnalysisError::invalid(
                "reference",
                format!("must be finite and positive, got {reference}"),
            ));
        }
        Ok(Self(
            frequencies
                .iter()
                .map(|&f| {
                    (f > 0.0 && f.is_finite()).then(|| {
                        (12.0 * (f / reference).log2()).round().rem_euclid(12.0) as u8 % 12
                    })
                })
                .collect(),
        ))
    }

    /// Class of each bin.
    pub fn classes(&self) -> &[Option<u8>] {
        &self.0
    }

    /// Number of bins covered.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the map covers no bins.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Squared amplitude summed per pitch class.
///
/// # Errors
///
/// [`AnalysisError::LengthMismatch`] unless the map has one entry per bin.
pub fn pitch_class_profile(spectrum: &Spectrum, map: &PitchClassMap) -> Result<[f32; 12]> {
    AnalysisError::check_len(spectrum.len(), map.len())?;
    let mut profile = [0.0f32; 12];
    for (&a, class) in spectrum.amplitudes().iter().zip(map.classes()) {
        if let Some(c) = class {
            profile[usize::from(*c)] += a * a;
        }
    }
    Ok(profile)
}
