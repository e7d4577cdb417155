//! Harmonic product spectrum and MIDI cent conversion.

use crate::spectrum::Spectrum;

/// Harmonic product spectrum pitch.
///
/// Multiplies the amplitudes at bins `i`, `2i` and `3i` for every `i` in the
/// lower third of the spectrum and takes the bin with the largest product.
/// If the strongest other bin sits between 0.4 and 0.6 of that index and
/// carries more than a tenth of its amplitude, the estimate drops an octave
/// to it.
///
/// Harmonic bins only line up when the spectrum starts at DC.
pub fn hps_pitch(spectrum: &Spectrum) -> Option<f32> {
    let amps = spectrum.amplitudes();
    let k = amps.len();
    let m = k.div_ceil(3);
    if m <= 1 {
        return None;
    }

    let mut peak = 0.0f32;
    let mut peak_index = None;
    for i in 0..m {
        let product = amps[i] * amps[2 * i] * amps[3 * i];
        if product > peak {
            peak = product;
            peak_index = Some(i);
        }
    }
    let mut peak_index = peak_index?;

    let mut second = 0.0f32;
    let mut second_index = 0;
    for (i, &a) in amps.iter().enumerate() {
        if a > second && i != peak_index {
            second = a;
            second_index = i;
        }
    }

    let ratio = amps[second_index] / amps[peak_index];
    let lower = peak_index as f32 * 0.4;
    let upper = peak_index as f32 * 0.6;
    if (second_index as f32) > lower && (second_index as f32) < upper && ratio > 0.1 {
        peak_index = second_index;
    }

    Some(spectrum.frequencies()[peak_index])
}

/// Pitch in MIDI cents, `round(0.5 + 100·(69 + 12·log2(f0/440)))`.
///
/// `None` for a non-positive or non-finite frequency.
pub fn midicent(f0: f32) -> Option<i32> {
    if !(f0.is_finite() && f0 > 0.0) {
        return None;
    }
    let note = 69.0 + 12.0 * (f0 / 440.0).log2();
    Some((0.5 + 100.0 * note).round() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn harmonic_spectrum(f0_bin: usize, bins: usize, bin_width: f32) -> Spectrum {
        let mut amps = vec![0.01; bins];
        for h in 1..=5 {
            if f0_bin * h < bins {
                amps[f0_bin * h] = 1.0 / h as f32;
            }
        }
        let freqs = (0..bins).map(|k| k as f32 * bin_width).collect();
        Spectrum::new(amps, freqs).unwrap()
    }

    #[test]
    fn test_hps_finds_fundamental() {
        let spec = harmonic_spectrum(10, 64, 20.0);
        assert_eq!(hps_pitch(&spec), Some(200.0));
    }

    #[test]
    fn test_hps_short_or_silent() {
        let short = Spectrum::new(vec![1.0; 3], vec![0.0, 1.0, 2.0]).unwrap();
        assert_eq!(hps_pitch(&short), None);
        let silent = Spectrum::new(vec![0.0; 32], vec![0.0; 32]).unwrap();
        assert_eq!(hps_pitch(&silent), None);
    }

    #[test]
    fn test_midicent() {
        assert_eq!(midicent(440.0), Some(6901));
        assert_eq!(midicent(880.0), Some(8101));
        assert_eq!(midicent(0.0), None);
        assert_eq!(midicent(-5.0), None);
    }
}
