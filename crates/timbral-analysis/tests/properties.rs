//! Property-based tests for timbral-analysis transforms and descriptors.
//!
//! The transform engine is checked against rustfft for arbitrary lengths,
//! power-of-two and otherwise. Descriptor and pitch-tracker properties use
//! randomized spectra and estimate sequences.

use proptest::prelude::*;
use rustfft::FftPlanner;
use timbral_analysis::descriptors::{spectral_centroid, spectral_flatness, spectral_rolloff};
use timbral_analysis::{
    Complex, PitchTrackerState, Spectrum, TransformEngine, convolve_real, inverse_transform,
    peak_spectrum, transform,
};

/// Reference DFT computed by rustfft in f64.
fn reference_dft(real: &[f32], imag: &[f32]) -> Vec<Complex<f64>> {
    let mut buffer: Vec<Complex<f64>> = real
        .iter()
        .zip(imag)
        .map(|(&r, &i)| Complex::new(f64::from(r), f64::from(i)))
        .collect();
    let mut planner = FftPlanner::new();
    planner.plan_fft_forward(buffer.len()).process(&mut buffer);
    buffer
}

/// Tolerance scaled with transform size and input magnitude.
fn tolerance(len: usize, input: &[f32]) -> f64 {
    let peak = input.iter().fold(1.0f32, |m, v| m.max(v.abs()));
    1e-4 * len as f64 * f64::from(peak)
}

fn signal(max_len: usize) -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(-1.0f32..=1.0f32, 1..=max_len)
}

fn spectrum_from(amps: Vec<f32>) -> Spectrum {
    let freqs = (1..=amps.len()).map(|k| k as f32 * 10.0).collect();
    Spectrum::new(amps, freqs).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Forward transform matches rustfft for any length 1..=300.
    #[test]
    fn transform_matches_reference(
        real in signal(300),
        seed in any::<u64>(),
    ) {
        let imag: Vec<f32> = real
            .iter()
            .enumerate()
            .map(|(i, _)| (((seed >> (i % 64)) & 1) as f32) - 0.5)
            .collect();
        let expected = reference_dft(&real, &imag);

        let (mut re, mut im) = (real.clone(), imag.clone());
        transform(&mut re, &mut im).unwrap();

        let tol = tolerance(real.len(), &real);
        for (k, want) in expected.iter().enumerate() {
            prop_assert!(
                (f64::from(re[k]) - want.re).abs() < tol
                    && (f64::from(im[k]) - want.im).abs() < tol,
                "len {} bin {}: ({}, {}) vs {}", real.len(), k, re[k], im[k], want
            );
        }
    }

    /// Inverse after forward returns the input scaled by `n`.
    #[test]
    fn inverse_undoes_forward(real in signal(257)) {
        let n = real.len();
        let (mut re, mut im) = (real.clone(), vec![0.0f32; n]);
        transform(&mut re, &mut im).unwrap();
        inverse_transform(&mut re, &mut im).unwrap();

        let tol = 1e-4 * n as f32;
        for i in 0..n {
            prop_assert!((re[i] / n as f32 - real[i]).abs() < tol);
            prop_assert!((im[i] / n as f32).abs() < tol);
        }
    }

    /// A cached engine produces the same bins as the free function.
    #[test]
    fn engine_agrees_with_free_function(real in signal(200)) {
        let n = real.len();
        let (mut a_re, mut a_im) = (real.clone(), vec![0.0f32; n]);
        let (mut b_re, mut b_im) = (real.clone(), vec![0.0f32; n]);
        transform(&mut a_re, &mut a_im).unwrap();

        let mut engine = TransformEngine::new();
        engine.transform(&mut b_re, &mut b_im).unwrap();
        // a second call reuses the cached plan
        let (mut c_re, mut c_im) = (real, vec![0.0f32; n]);
        engine.transform(&mut c_re, &mut c_im).unwrap();

        prop_assert_eq!(&a_re, &b_re);
        prop_assert_eq!(&a_im, &b_im);
        prop_assert_eq!(&b_re, &c_re);
    }

    /// Circular convolution with a unit impulse at `shift` rotates the input.
    #[test]
    fn convolution_with_shifted_impulse_rotates(
        x in signal(64),
        shift_seed in any::<usize>(),
    ) {
        let n = x.len();
        let shift = shift_seed % n;
        let mut impulse = vec![0.0f32; n];
        impulse[shift] = 1.0;

        let y = convolve_real(&x, &impulse).unwrap();
        for i in 0..n {
            let want = x[(i + n - shift) % n];
            prop_assert!((y[i] - want).abs() < 1e-4, "i {}: {} vs {}", i, y[i], want);
        }
    }

    /// The centroid of a non-silent spectrum lies within its frequency range.
    #[test]
    fn centroid_within_range(amps in prop::collection::vec(0.0f32..1.0, 2..128)) {
        prop_assume!(amps.iter().any(|&a| a > 0.0));
        let spec = spectrum_from(amps);
        let c = spectral_centroid(&spec);
        let freqs = spec.frequencies();
        prop_assert!(c >= freqs[0] - 1e-3 && c <= freqs[freqs.len() - 1] + 1e-3);
    }

    /// Flatness stays in [0, 1] and rolloff lands on a bin frequency.
    #[test]
    fn flatness_and_rolloff_bounds(
        amps in prop::collection::vec(0.01f32..1.0, 2..128),
        percent in 1.0f32..=100.0,
    ) {
        let spec = spectrum_from(amps);
        let flatness = spectral_flatness(&spec);
        prop_assert!((0.0..=1.0 + 1e-5).contains(&flatness), "flatness {}", flatness);

        let rolloff = spectral_rolloff(&spec, percent).unwrap();
        prop_assert!(spec.frequencies().contains(&rolloff));
    }

    /// Peak picking never keeps more than every other interior bin.
    #[test]
    fn peaks_are_isolated(amps in prop::collection::vec(0.0f32..1.0, 3..256)) {
        let spec = spectrum_from(amps);
        let peaks = peak_spectrum(&spec, 10.0, 0.0).unwrap();
        prop_assert!(peaks.nonzero_count() <= spec.len() / 2);
        prop_assert_eq!(peaks.amplitudes()[0], 0.0);
        prop_assert_eq!(peaks.amplitudes()[spec.len() - 1], 0.0);
    }

    /// Tracker confidence never exceeds its cap, and output implies confidence.
    #[test]
    fn tracker_confidence_bounded(
        estimates in prop::collection::vec(prop::option::of(50.0f32..2000.0), 1..64),
    ) {
        let mut state = PitchTrackerState::new();
        for raw in estimates {
            let (next, out) = state.advance(raw);
            prop_assert!(next.confidence <= timbral_analysis::pitch::MAX_CONFIDENCE);
            if out.is_some() {
                prop_assert!(next.confidence >= 1);
                prop_assert_eq!(out, next.previous_pitch);
            }
            state = next;
        }
    }
}
