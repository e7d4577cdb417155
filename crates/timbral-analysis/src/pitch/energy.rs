//! Pitch-band energies from a bank of per-semitone IIR filters.
//!
//! The input is brought to 22050 Hz and decimated by 5 twice, giving three
//! stages. Every MIDI pitch is filtered at the stage whose rate suits its
//! band:
//!
//! | Pitches  | Stage rate |
//! |----------|------------|
//! | 21..=59  | 882 Hz     |
//! | 60..=95  | 4410 Hz    |
//! | 96..=120 | 22050 Hz   |
//!
//! Each band runs forward and backward (zero phase), and its energy is the
//! sum of squares over the first half of the analysis window, scaled back to
//! the 22050 Hz time base.
//!
//! The filter coefficients are not built in; callers supply a
//! [`PitchFilterbank`] holding one [`IirFilter`] per pitch for each
//! [`FilterbankShift`] they intend to use.
//!
//! Reference: M. Müller and S. Ewert, "Chroma Toolbox: MATLAB
//! implementations for extracting variants of chroma-based audio features",
//! ISMIR 2011.

use std::collections::BTreeMap;

use crate::error::{AnalysisError, Result};
use crate::resample::{DEFAULT_FILTER_ORDER, resample};

/// Number of MIDI pitches covered by the energy vector.
pub const PITCH_COUNT: usize = 120;

/// Rate of the first filtering stage.
pub const BASE_RATE: u32 = 22050;

/// Decimation factor between stages.
const STAGE_FACTOR: usize = 5;

/// Rates of the three filtering stages, highest first.
pub const STAGE_RATES: [u32; 3] = [22050, 4410, 882];

/// Stage index a MIDI pitch is filtered at, or `None` outside `21..=120`.
pub fn stage_for_pitch(pitch: u8) -> Option<usize> {
    match pitch {
        21..=59 => Some(2),
        60..=95 => Some(1),
        96..=120 => Some(0),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// IIR filter
// ---------------------------------------------------------------------------

/// Direct-form IIR filter `y[n] = (Σ b[i]·x[n-i] - Σ_{i≥1} a[i]·y[n-i]) / a[0]`.
#[derive(Debug, Clone, PartialEq)]
pub struct IirFilter {
    b: Vec<f64>,
    a: Vec<f64>,
}

impl IirFilter {
    /// Build a filter from feedforward `b` and feedback `a` coefficients.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::InvalidParameter`] if either list is empty or `a[0]`
    /// is zero or not finite.
    pub fn new(b: Vec<f64>, a: Vec<f64>) -> Result<Self> {
        if b.is_empty() {
            return Err(AnalysisError::invalid("b", "needs at least one coefficient"));
        }
        match a.first() {
            None => Err(AnalysisError::invalid("a", "needs at least one coefficient")),
            Some(&a0) if a0 == 0.0 || !a0.is_finite() => Err(AnalysisError::invalid(
                "a",
                format!("leading coefficient must be finite and non-zero, got {a0}"),
            )),
            Some(_) => Ok(Self { b, a }),
        }
    }

    /// Feedforward coefficients.
    pub fn b(&self) -> &[f64] {
        &self.b
    }

    /// Feedback coefficients, `a[0]` first.
    pub fn a(&self) -> &[f64] {
        &self.a
    }

    /// Zeros placed on each side of the signal before zero-phase filtering.
    pub fn padding(&self) -> usize {
        (3 * (self.b.len().max(self.a.len()) - 1)).max(1)
    }

    /// Run the difference equation over `x` from a zero state.
    pub fn filter(&self, x: &[f64]) -> Vec<f64> {
        let a0 = self.a[0];
        let mut y = vec![0.0f64; x.len()];
        for n in 0..x.len() {
            let mut acc = 0.0;
            for (i, &b) in self.b.iter().enumerate().take(n + 1) {
                acc += b * x[n - i];
            }
            for (i, &a) in self.a.iter().enumerate().take(n + 1).skip(1) {
                acc -= a * y[n - i];
            }
            y[n] = acc / a0;
        }
        y
    }

    /// Forward-backward filtering with [`padding`](Self::padding) zeros on
    /// both ends; each pass starts from a zero state.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::InvalidParameter`] if `x` is shorter than the padding.
    pub fn filtfilt(&self, x: &[f64]) -> Result<Vec<f64>> {
        let pad = self.padding();
        if x.len() < pad {
            return Err(AnalysisError::invalid(
                "signal",
                format!("needs at least {pad} samples for this filter, got {}", x.len()),
            ));
        }
        let mut padded = vec![0.0f64; x.len() + 2 * pad];
        padded[pad..pad + x.len()].copy_from_slice(x);

        let mut forward = self.filter(&padded);
        forward.reverse();
        let mut backward = self.filter(&forward);
        backward.reverse();
        backward.truncate(pad + x.len());
        backward.drain(..pad);
        Ok(backward)
    }
}

// ---------------------------------------------------------------------------
// Filterbank
// ---------------------------------------------------------------------------

/// Fractional-semitone detuning of a pitch filterbank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum FilterbankShift {
    /// Bands centred on the equal-tempered pitches.
    #[default]
    Normal,
    /// A quarter semitone flat.
    MinusQuarter,
    /// A third of a semitone flat.
    MinusThird,
    /// Half a semitone flat.
    MinusHalf,
    /// Two thirds of a semitone flat.
    MinusTwoThirds,
    /// Three quarters of a semitone flat.
    MinusThreeQuarters,
}

impl FilterbankShift {
    /// Every shift, undetuned first.
    pub const ALL: [FilterbankShift; 6] = [
        Self::Normal,
        Self::MinusQuarter,
        Self::MinusThird,
        Self::MinusHalf,
        Self::MinusTwoThirds,
        Self::MinusThreeQuarters,
    ];

    /// Name used in profiles and filterbank files.
    pub fn name(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::MinusQuarter => "minus_quarter",
            Self::MinusThird => "minus_third",
            Self::MinusHalf => "minus_half",
            Self::MinusTwoThirds => "minus_two_thirds",
            Self::MinusThreeQuarters => "minus_three_quarters",
        }
    }

    /// Look up a shift by [`name`](Self::name).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|shift| shift.name() == name)
    }
}

/// Per-pitch band filters, keyed by shift and MIDI pitch (`1..=120`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PitchFilterbank {
    bands: BTreeMap<(FilterbankShift, u8), IirFilter>,
}

impl PitchFilterbank {
    /// An empty bank.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the band filter for `pitch` under `shift`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::InvalidParameter`] if `pitch` is outside `1..=120`.
    pub fn insert(&mut self, shift: FilterbankShift, pitch: u8, filter: IirFilter) -> Result<()> {
        check_pitch("pitch", pitch)?;
        self.bands.insert((shift, pitch), filter);
        Ok(())
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_band(mut self, shift: FilterbankShift, pitch: u8, filter: IirFilter) -> Result<Self> {
        self.insert(shift, pitch, filter)?;
        Ok(self)
    }

    /// Band filter for `pitch` under `shift`.
    pub fn band(&self, shift: FilterbankShift, pitch: u8) -> Option<&IirFilter> {
        self.bands.get(&(shift, pitch))
    }

    /// Number of bands across all shifts.
    pub fn len(&self) -> usize {
        self.bands.len()
    }

    /// True when no band is set.
    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Energy
// ---------------------------------------------------------------------------

/// Settings for [`pitch_filterbank_energy`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchEnergyOptions {
    /// Which detuned bank to read bands from.
    pub shift: FilterbankShift,
    /// Lowest MIDI pitch analysed.
    pub midi_low: u8,
    /// Highest MIDI pitch analysed (inclusive).
    pub midi_high: u8,
    /// Analysis window length in input samples; the whole input when `None`.
    pub window_len: Option<usize>,
    /// Kernel length for the stage resamplers.
    pub filter_order: usize,
}

impl Default for PitchEnergyOptions {
    fn default() -> Self {
        Self {
            shift: FilterbankShift::Normal,
            midi_low: 21,
            midi_high: 108,
            window_len: None,
            filter_order: DEFAULT_FILTER_ORDER,
        }
    }
}

/// Energy per MIDI pitch, indexed `pitch - 1` over [`PITCH_COUNT`] slots.
///
/// Pitches outside the requested range, or without a band in the bank for
/// the chosen shift, stay zero.
///
/// # Errors
///
/// - [`AnalysisError::EmptyInput`] for an empty signal
/// - [`AnalysisError::InvalidParameter`] for a sample rate that is not a
///   positive whole number, a pitch range outside `1..=120` or reversed, or
///   a stage too short for one of its band filters
pub fn pitch_filterbank_energy(
    samples: &[f32],
    sample_rate: f32,
    bank: &PitchFilterbank,
    options: &PitchEnergyOptions,
) -> Result<Vec<f32>> {
    if samples.is_empty() {
        return Err(AnalysisError::EmptyInput("samples"));
    }
    if !(sample_rate.is_finite() && sample_rate >= 1.0 && sample_rate.fract() == 0.0) {
        return Err(AnalysisError::invalid(
            "sample_rate",
            format!("must be a positive whole number of Hz, got {sample_rate}"),
        ));
    }
    check_pitch("midi_low", options.midi_low)?;
    check_pitch("midi_high", options.midi_high)?;
    if options.midi_low > options.midi_high {
        return Err(AnalysisError::invalid(
            "midi_low",
            format!("{} is above midi_high {}", options.midi_low, options.midi_high),
        ));
    }

    let rate = sample_rate as usize;
    let base = BASE_RATE as usize;
    let divisor = gcd(base, rate);
    let mut stages = Vec::with_capacity(STAGE_RATES.len());
    stages.push(resample(samples, base / divisor, rate / divisor, options.filter_order)?);
    for i in 1..STAGE_RATES.len() {
        let next = resample(&stages[i - 1], 1, STAGE_FACTOR, options.filter_order)?;
        stages.push(next);
    }
    let stages: Vec<Vec<f64>> = stages
        .into_iter()
        .map(|stage| stage.into_iter().map(f64::from).collect())
        .collect();

    #[cfg(feature = "tracing")]
    tracing::debug!(
        input = samples.len(),
        stages = ?stages.iter().map(Vec::len).collect::<Vec<_>>(),
        shift = options.shift.name(),
        "pitch filterbank stages"
    );

    let window_len = options.window_len.unwrap_or(samples.len());
    let seg_stop = ((window_len as f64 / 2.0).round() as usize).min(samples.len());

    let mut energy = vec![0.0f32; PITCH_COUNT];
    for pitch in options.midi_low..=options.midi_high {
        let (Some(stage), Some(filter)) =
            (stage_for_pitch(pitch), bank.band(options.shift, pitch))
        else {
            continue;
        };
        let stage_rate = f64::from(STAGE_RATES[stage]);
        let scale = f64::from(BASE_RATE) / stage_rate;
        let signal = &stages[stage];

        let filtered = filter.filtfilt(signal)?;
        let start = (stage_rate / f64::from(BASE_RATE)).ceil() as usize;
        let stop = ((seg_stop as f64 * stage_rate / f64::from(BASE_RATE)).floor() as usize)
            .min(filtered.len());
        let sum: f64 = filtered
            .get(start..stop)
            .unwrap_or_default()
            .iter()
            .map(|v| v * v)
            .sum();
        energy[usize::from(pitch) - 1] = (sum * scale) as f32;
    }
    Ok(energy)
}

fn check_pitch(name: &'static str, pitch: u8) -> Result<()> {
    if (1..=PITCH_COUNT).contains(&usize::from(pitch)) {
        Ok(())
    } else {
        Err(AnalysisError::invalid(
            name,
            format!("MIDI pitch must lie in 1..={PITCH_COUNT}, got {pitch}"),
        ))
    }
}

fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    /// Constant-peak-gain bandpass biquad centred on `f0`.
    fn bandpass(f0: f64, fs: f64, q: f64) -> IirFilter {
        let w0 = 2.0 * PI * f0 / fs;
        let alpha = w0.sin() / (2.0 * q);
        IirFilter::new(
            vec![alpha, 0.0, -alpha],
            vec![1.0 + alpha, -2.0 * w0.cos(), 1.0 - alpha],
        )
        .unwrap()
    }

    fn two_band_bank() -> PitchFilterbank {
        PitchFilterbank::new()
            .with_band(FilterbankShift::Normal, 69, bandpass(440.0, 4410.0, 20.0))
            .unwrap()
            .with_band(FilterbankShift::Normal, 81, bandpass(880.0, 4410.0, 20.0))
            .unwrap()
    }

    fn sine(freq: f32, sample_rate: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn test_stage_assignment() {
        assert_eq!(stage_for_pitch(20), None);
        assert_eq!(stage_for_pitch(21), Some(2));
        assert_eq!(stage_for_pitch(59), Some(2));
        assert_eq!(stage_for_pitch(60), Some(1));
        assert_eq!(stage_for_pitch(95), Some(1));
        assert_eq!(stage_for_pitch(96), Some(0));
        assert_eq!(stage_for_pitch(120), Some(0));
        assert_eq!(stage_for_pitch(121), None);
    }

    #[test]
    fn test_iir_one_pole_impulse() {
        let filter = IirFilter::new(vec![1.0], vec![1.0, -0.5]).unwrap();
        let y = filter.filter(&[1.0, 0.0, 0.0]);
        assert_eq!(y, vec![1.0, 0.5, 0.25]);
    }

    #[test]
    fn test_iir_rejects_bad_leading_coefficient() {
        assert!(IirFilter::new(vec![1.0], vec![0.0, 1.0]).is_err());
        assert!(IirFilter::new(vec![1.0], vec![f64::NAN]).is_err());
        assert!(IirFilter::new(vec![], vec![1.0]).is_err());
        assert!(IirFilter::new(vec![1.0], vec![]).is_err());
    }

    #[test]
    fn test_filtfilt_is_zero_phase() {
        let filter = IirFilter::new(vec![0.5], vec![1.0, -0.5]).unwrap();
        let mut x = vec![0.0f64; 41];
        x[20] = 1.0;
        let y = filter.filtfilt(&x).unwrap();
        assert_eq!(y.len(), 41);
        for i in 0..20 {
            assert!((y[20 - i] - y[20 + i]).abs() < 1e-6, "asymmetric at offset {i}");
        }
        assert!(y[20] > y[19]);
    }

    #[test]
    fn test_filtfilt_needs_padding_length() {
        let filter = bandpass(440.0, 4410.0, 20.0);
        assert_eq!(filter.padding(), 6);
        assert!(filter.filtfilt(&[0.0; 5]).is_err());
        assert!(filter.filtfilt(&[0.0; 6]).is_ok());
    }

    #[test]
    fn test_shift_names_roundtrip() {
        for shift in FilterbankShift::ALL {
            assert_eq!(FilterbankShift::from_name(shift.name()), Some(shift));
        }
        assert_eq!(FilterbankShift::from_name("plus_half"), None);
    }

    #[test]
    fn test_bank_rejects_out_of_range_pitch() {
        let mut bank = PitchFilterbank::new();
        let filter = bandpass(440.0, 4410.0, 20.0);
        assert!(bank.insert(FilterbankShift::Normal, 0, filter.clone()).is_err());
        assert!(bank.insert(FilterbankShift::Normal, 121, filter.clone()).is_err());
        bank.insert(FilterbankShift::MinusHalf, 69, filter).unwrap();
        assert_eq!(bank.len(), 1);
        assert!(bank.band(FilterbankShift::Normal, 69).is_none());
    }

    #[test]
    fn test_energy_concentrates_in_matching_band() {
        let signal = sine(440.0, 22050.0, 22050);
        let energy = pitch_filterbank_energy(
            &signal,
            22050.0,
            &two_band_bank(),
            &PitchEnergyOptions::default(),
        )
        .unwrap();
        assert_eq!(energy.len(), PITCH_COUNT);

        // half-second window at 4410 Hz, rescaled to the 22050 Hz time base
        let expected = 0.5 * 2204.0 * 5.0;
        assert!(
            (energy[68] - expected).abs() < 0.2 * expected,
            "A4 energy {} vs {expected}",
            energy[68]
        );
        assert!(energy[68] > 20.0 * energy[80], "{} vs {}", energy[68], energy[80]);
        for (i, &e) in energy.iter().enumerate() {
            if i != 68 && i != 80 {
                assert_eq!(e, 0.0, "pitch {} has no band", i + 1);
            }
        }
    }

    #[test]
    fn test_energy_from_higher_rate() {
        let signal = sine(440.0, 44100.0, 44100);
        let energy = pitch_filterbank_energy(
            &signal,
            44100.0,
            &two_band_bank(),
            &PitchEnergyOptions::default(),
        )
        .unwrap();
        assert!(energy[68] > 20.0 * energy[80]);
        assert!(energy[68] > 1000.0);
    }

    #[test]
    fn test_energy_respects_shift_and_range() {
        let signal = sine(440.0, 22050.0, 22050);
        let bank = two_band_bank();

        let shifted = PitchEnergyOptions {
            shift: FilterbankShift::MinusQuarter,
            ..PitchEnergyOptions::default()
        };
        let energy = pitch_filterbank_energy(&signal, 22050.0, &bank, &shifted).unwrap();
        assert!(energy.iter().all(|&e| e == 0.0));

        let narrow = PitchEnergyOptions {
            midi_low: 70,
            midi_high: 90,
            ..PitchEnergyOptions::default()
        };
        let energy = pitch_filterbank_energy(&signal, 22050.0, &bank, &narrow).unwrap();
        assert_eq!(energy[68], 0.0);
        assert!(energy[80] > 0.0);
    }

    #[test]
    fn test_energy_rejects_bad_arguments() {
        let bank = two_band_bank();
        let signal = sine(440.0, 22050.0, 4096);
        let options = PitchEnergyOptions::default();

        assert!(matches!(
            pitch_filterbank_energy(&[], 22050.0, &bank, &options),
            Err(AnalysisError::EmptyInput(_))
        ));
        for rate in [0.0, -8000.0, 22050.5, f32::NAN] {
            assert!(pitch_filterbank_energy(&signal, rate, &bank, &options).is_err());
        }
        let reversed = PitchEnergyOptions {
            midi_low: 90,
            midi_high: 60,
            ..options
        };
        assert!(pitch_filterbank_energy(&signal, 22050.0, &bank, &reversed).is_err());
        let beyond = PitchEnergyOptions {
            midi_high: 121,
            ..options
        };
        assert!(pitch_filterbank_energy(&signal, 22050.0, &bank, &beyond).is_err());
    }
}
