//! Built-in features and their capabilities.

use timbral_analysis::descriptors::{
    bark_coefficients, flatness_db, irregularity_j, irregularity_k, loudness, mfcc,
    noisiness, odd_even_ratio, pitch_class_profile, sharpness, smoothness, spectral_centroid, spectral_flatness,
    spectral_inharmonicity, spectral_rolloff, spectral_slope, spectral_spread, tonality,
    tristimulus,
};
use timbral_analysis::{
    Spectrum, SpectrumOptions, WaveletPitch, Window, amdf, asdf, autocorrelation, f0_autocorrelation,
    harmonic_spectrum, hps_pitch, lpc_from_signal, lpcc, midicent, peak_spectrum,
    pitch_filterbank_energy, spectrum, yin_difference, yin_pitch,
};

use crate::error::{ExtractError, Result};
use crate::extractor::{Capability, FeatureArgs};
use crate::{
    FeatureCategory, FeatureDescriptor, FeatureId, FeatureInput, FeatureRegistry, FeatureValue,
};

type Output = Result<Option<FeatureValue>>;

const FRAME: &[FeatureInput] = &[FeatureInput::Frame];
const SPECTRUM: &[FeatureInput] = &[FeatureInput::Feature(FeatureId::Spectrum)];
const BARK: &[FeatureInput] = &[FeatureInput::Feature(FeatureId::BarkCoefficients)];
const HARMONICS_AND_F0: &[FeatureInput] = &[
    FeatureInput::Feature(FeatureId::HarmonicSpectrum),
    FeatureInput::Feature(FeatureId::F0),
];

fn scalar(v: f32) -> Output {
    Ok(Some(FeatureValue::Scalar(v)))
}

fn vector(v: Vec<f32>) -> Output {
    Ok(Some(FeatureValue::Vector(v)))
}

fn pitch(p: Option<f32>) -> Output {
    Ok(Some(FeatureValue::Pitch(p)))
}

/// Run a scalar descriptor over the shared amplitude spectrum.
fn over_spectrum(args: &FeatureArgs<'_>, f: impl FnOnce(&Spectrum) -> f32) -> Output {
    match args.spectrum(FeatureId::Spectrum)? {
        Some(spec) => scalar(f(spec)),
        None => Ok(None),
    }
}

/// The frame as transforms see it: windowed by the context window.
fn windowed<'a>(args: &FeatureArgs<'a>) -> std::borrow::Cow<'a, [f32]> {
    if args.context.window == Window::Rectangular {
        std::borrow::Cow::Borrowed(args.frame)
    } else {
        let mut frame = args.frame.to_vec();
        args.context.window.apply(&mut frame);
        std::borrow::Cow::Owned(frame)
    }
}

fn without_dc(spec: &Spectrum) -> Result<Spectrum> {
    let (amps, freqs) = (spec.amplitudes(), spec.frequencies());
    Ok(Spectrum::new(amps[1..].to_vec(), freqs[1..].to_vec())?)
}

// ---------------------------------------------------------------------------
// Spectral
// ---------------------------------------------------------------------------

fn compute_spectrum(args: &mut FeatureArgs<'_>) -> Output {
    let spec = spectrum(&windowed(args), args.context.sample_rate, args.context.spectrum)?;
    Ok(Some(FeatureValue::Spectrum(spec)))
}

fn compute_peak_spectrum(args: &mut FeatureArgs<'_>) -> Output {
    let Some(spec) = args.spectrum(FeatureId::Spectrum)? else {
        return Ok(None);
    };
    let bin_width = args.context.bin_width(args.frame.len());
    let peaks = if args.context.spectrum.include_dc && !spec.is_empty() {
        peak_spectrum(&without_dc(spec)?, bin_width, args.context.peak_threshold)?
    } else {
        peak_spectrum(spec, bin_width, args.context.peak_threshold)?
    };
    Ok(Some(FeatureValue::Spectrum(peaks)))
}

fn compute_harmonic_spectrum(args: &mut FeatureArgs<'_>) -> Output {
    let (Some(peaks), Some(f0)) = (
        args.spectrum(FeatureId::PeakSpectrum)?,
        args.pitch(FeatureId::F0)?,
    ) else {
        return Ok(None);
    };
    let harmonics = harmonic_spectrum(peaks, f0, args.context.harmonic_tolerance)?;
    Ok(Some(FeatureValue::Spectrum(harmonics)))
}

fn compute_centroid(args: &mut FeatureArgs<'_>) -> Output {
    over_spectrum(args, spectral_centroid)
}

fn compute_spread(args: &mut FeatureArgs<'_>) -> Output {
    over_spectrum(args, spectral_spread)
}

fn compute_flatness(args: &mut FeatureArgs<'_>) -> Output {
    over_spectrum(args, spectral_flatness)
}

fn compute_flatness_db(args: &mut FeatureArgs<'_>) -> Output {
    match args.scalar(FeatureId::SpectralFlatness)? {
        Some(flatness) => Ok(flatness_db(flatness).map(FeatureValue::Scalar)),
        None => Ok(None),
    }
}

fn compute_tonality(args: &mut FeatureArgs<'_>) -> Output {
    scalar(tonality(args.scalar(FeatureId::FlatnessDb)?))
}

fn compute_rolloff(args: &mut FeatureArgs<'_>) -> Output {
    match args.spectrum(FeatureId::Spectrum)? {
        Some(spec) => scalar(spectral_rolloff(spec, args.context.rolloff_percent)?),
        None => Ok(None),
    }
}

fn compute_slope(args: &mut FeatureArgs<'_>) -> Output {
    over_spectrum(args, spectral_slope)
}

fn compute_irregularity_k(args: &mut FeatureArgs<'_>) -> Output {
    over_spectrum(args, irregularity_k)
}

fn compute_irregularity_j(args: &mut FeatureArgs<'_>) -> Output {
    over_spectrum(args, irregularity_j)
}

fn compute_smoothness(args: &mut FeatureArgs<'_>) -> Output {
    over_spectrum(args, smoothness)
}

fn compute_mfcc(args: &mut FeatureArgs<'_>) -> Output {
    let filterbank = args.context.filterbank.ok_or(ExtractError::MissingArgument {
        feature: args.feature(),
        argument: "filterbank",
    })?;
    match args.spectrum(FeatureId::Spectrum)? {
        Some(spec) => vector(mfcc(spec, filterbank)?),
        None => Ok(None),
    }
}

fn compute_bark(args: &mut FeatureArgs<'_>) -> Output {
    let limits = args.context.bark_limits.ok_or(ExtractError::MissingArgument {
        feature: args.feature(),
        argument: "bark_limits",
    })?;
    match args.spectrum(FeatureId::Spectrum)? {
        Some(spec) => vector(bark_coefficients(spec, limits)?),
        None => Ok(None),
    }
}

fn compute_loudness(args: &mut FeatureArgs<'_>) -> Output {
    match args.vector(FeatureId::BarkCoefficients)? {
        Some(bands) => scalar(loudness(bands)),
        None => Ok(None),
    }
}

fn compute_sharpness(args: &mut FeatureArgs<'_>) -> Output {
    match args.vector(FeatureId::BarkCoefficients)? {
        Some(bands) => scalar(sharpness(bands)),
        None => Ok(None),
    }
}

fn compute_pitch_class_profile(args: &mut FeatureArgs<'_>) -> Output {
    let map = args.context.pitch_classes.ok_or(ExtractError::MissingArgument {
        feature: args.feature(),
        argument: "pitch_classes",
    })?;
    match args.spectrum(FeatureId::Spectrum)? {
        Some(spec) => vector(pitch_class_profile(spec, map)?.to_vec()),
        None => Ok(None),
    }
}

// ---------------------------------------------------------------------------
// Harmonic
// ---------------------------------------------------------------------------

fn compute_tristimulus(args: &mut FeatureArgs<'_>) -> Output {
    let (Some(harmonics), Some(f0)) = (
        args.spectrum(FeatureId::HarmonicSpectrum)?,
        args.pitch(FeatureId::F0)?,
    ) else {
        return Ok(None);
    };
    vector(tristimulus(harmonics, f0)?.to_vec())
}

fn compute_odd_even(args: &mut FeatureArgs<'_>) -> Output {
    let (Some(harmonics), Some(f0)) = (
        args.spectrum(FeatureId::HarmonicSpectrum)?,
        args.pitch(FeatureId::F0)?,
    ) else {
        return Ok(None);
    };
    scalar(odd_even_ratio(harmonics, f0)?)
}

fn compute_inharmonicity(args: &mut FeatureArgs<'_>) -> Output {
    let (Some(peaks), Some(f0)) = (
        args.spectrum(FeatureId::PeakSpectrum)?,
        args.pitch(FeatureId::F0)?,
    ) else {
        return Ok(None);
    };
    scalar(spectral_inharmonicity(peaks, f0)?)
}

fn compute_noisiness(args: &mut FeatureArgs<'_>) -> Output {
    let (Some(harmonics), Some(peaks)) = (
        args.spectrum(FeatureId::HarmonicSpectrum)?,
        args.spectrum(FeatureId::PeakSpectrum)?,
    ) else {
        return Ok(None);
    };
    scalar(noisiness(harmonics.nonzero_count(), peaks.nonzero_count()))
}

// ---------------------------------------------------------------------------
// Pitch
// ---------------------------------------------------------------------------

fn compute_f0(args: &mut FeatureArgs<'_>) -> Output {
    match args.context.f0 {
        Some(f0) => pitch(Some(f0)),
        None => pitch(f0_autocorrelation(args.frame, args.context.sample_rate)),
    }
}

fn compute_yin(args: &mut FeatureArgs<'_>) -> Output {
    let curve = yin_difference(args.frame);
    pitch(yin_pitch(
        &curve,
        args.context.sample_rate,
        args.context.yin_threshold,
    ))
}

fn compute_wavelet(args: &mut FeatureArgs<'_>) -> Output {
    let tracker = WaveletPitch::new(args.context.wavelet);
    let (next, smoothed) = tracker.track(*args.tracker, args.frame, args.context.sample_rate);
    *args.tracker = next;
    pitch(smoothed)
}

fn compute_hps(args: &mut FeatureArgs<'_>) -> Output {
    // bins must line up with their harmonics, so this spectrum keeps DC
    let options = SpectrumOptions {
        include_dc: true,
        normalize: false,
    };
    let spec = spectrum(&windowed(args), args.context.sample_rate, options)?;
    pitch(hps_pitch(&spec))
}

fn compute_midicent(args: &mut FeatureArgs<'_>) -> Output {
    Ok(args
        .pitch(FeatureId::F0)?
        .and_then(midicent)
        .map(FeatureValue::Integer))
}

// ---------------------------------------------------------------------------
// Temporal and cepstral
// ---------------------------------------------------------------------------

fn compute_autocorrelation(args: &mut FeatureArgs<'_>) -> Output {
    vector(autocorrelation(args.frame))
}

fn compute_amdf(args: &mut FeatureArgs<'_>) -> Output {
    vector(amdf(args.frame))
}

fn compute_asdf(args: &mut FeatureArgs<'_>) -> Output {
    vector(asdf(args.frame))
}

fn compute_pitch_energy(args: &mut FeatureArgs<'_>) -> Output {
    let bank = args.context.pitch_filterbank.ok_or(ExtractError::MissingArgument {
        feature: args.feature(),
        argument: "pitch_filterbank",
    })?;
    vector(pitch_filterbank_energy(
        args.frame,
        args.context.sample_rate,
        bank,
        &args.context.pitch_energy,
    )?)
}

fn compute_lpc(args: &mut FeatureArgs<'_>) -> Output {
    let result = lpc_from_signal(args.frame, args.context.lpc_order)?;
    vector(result.coefficients)
}

fn compute_lpcc(args: &mut FeatureArgs<'_>) -> Output {
    match args.vector(FeatureId::Lpc)? {
        Some(coefficients) => vector(lpcc(coefficients, args.context.cepstral_order)?),
        None => Ok(None),
    }
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

fn add(
    registry: &mut FeatureRegistry,
    id: FeatureId,
    category: FeatureCategory,
    description: &'static str,
    inputs: &'static [FeatureInput],
    capability: Capability,
) {
    registry.register(
        FeatureDescriptor {
            id,
            name: id.name(),
            description,
            category,
            inputs,
        },
        capability,
    );
}

/// Register every built-in feature.
pub(crate) fn register_all(registry: &mut FeatureRegistry) {
    use FeatureCategory::{Cepstral, Harmonic, Pitch, Spectral, Temporal};
    use FeatureId as F;

    // Spectral
    add(
        registry,
        F::Spectrum,
        Spectral,
        "Amplitude spectrum of the frame",
        FRAME,
        compute_spectrum,
    );
    add(
        registry,
        F::PeakSpectrum,
        Spectral,
        "Interpolated local maxima above the peak threshold",
        SPECTRUM,
        compute_peak_spectrum,
    );
    add(
        registry,
        F::HarmonicSpectrum,
        Spectral,
        "Peaks within tolerance of a multiple of f0",
        &[
            FeatureInput::Feature(FeatureId::PeakSpectrum),
            FeatureInput::Feature(FeatureId::F0),
        ],
        compute_harmonic_spectrum,
    );
    add(
        registry,
        F::SpectralCentroid,
        Spectral,
        "Amplitude-weighted mean frequency",
        SPECTRUM,
        compute_centroid,
    );
    add(
        registry,
        F::SpectralSpread,
        Spectral,
        "Amplitude-weighted variance about the centroid",
        SPECTRUM,
        compute_spread,
    );
    add(
        registry,
        F::SpectralFlatness,
        Spectral,
        "Geometric over arithmetic mean amplitude",
        SPECTRUM,
        compute_flatness,
    );
    add(
        registry,
        F::FlatnessDb,
        Spectral,
        "Spectral flatness in decibels",
        &[FeatureInput::Feature(FeatureId::SpectralFlatness)],
        compute_flatness_db,
    );
    add(
        registry,
        F::Tonality,
        Spectral,
        "Tonality coefficient from flatness in decibels",
        &[FeatureInput::Feature(FeatureId::FlatnessDb)],
        compute_tonality,
    );
    add(
        registry,
        F::SpectralRolloff,
        Spectral,
        "Frequency below which the rolloff share of amplitude lies",
        SPECTRUM,
        compute_rolloff,
    );
    add(
        registry,
        F::SpectralSlope,
        Spectral,
        "Regression slope of amplitude against frequency",
        SPECTRUM,
        compute_slope,
    );
    add(
        registry,
        F::IrregularityK,
        Spectral,
        "Krimphoff spectral irregularity",
        SPECTRUM,
        compute_irregularity_k,
    );
    add(
        registry,
        F::IrregularityJ,
        Spectral,
        "Jensen spectral irregularity",
        SPECTRUM,
        compute_irregularity_j,
    );
    add(
        registry,
        F::Smoothness,
        Spectral,
        "McAdams spectral smoothness",
        SPECTRUM,
        compute_smoothness,
    );
    add(
        registry,
        F::Mfcc,
        Spectral,
        "Mel-frequency cepstral coefficients from an injected filterbank",
        &[FeatureInput::Feature(FeatureId::Spectrum), FeatureInput::Filterbank],
        compute_mfcc,
    );
    add(
        registry,
        F::BarkCoefficients,
        Spectral,
        "Amplitude sums between injected bark band edges",
        &[FeatureInput::Feature(FeatureId::Spectrum), FeatureInput::BarkLimits],
        compute_bark,
    );
    add(registry, F::Loudness, Spectral, "Total loudness over bark bands", BARK, compute_loudness);
    add(
        registry,
        F::Sharpness,
        Spectral,
        "Zwicker sharpness over bark bands",
        BARK,
        compute_sharpness,
    );
    add(
        registry,
        F::PitchClassProfile,
        Spectral,
        "Squared amplitude per pitch class from an injected bin map",
        &[FeatureInput::Feature(FeatureId::Spectrum), FeatureInput::PitchClasses],
        compute_pitch_class_profile,
    );

    // Harmonic
    add(
        registry,
        F::Tristimulus,
        Harmonic,
        "Amplitude share of harmonics 1, 2-4 and 5+",
        HARMONICS_AND_F0,
        compute_tristimulus,
    );
    add(
        registry,
        F::OddEvenRatio,
        Harmonic,
        "Odd over even harmonic amplitude",
        HARMONICS_AND_F0,
        compute_odd_even,
    );
    add(
        registry,
        F::Inharmonicity,
        Harmonic,
        "Energy-weighted deviation of peaks from harmonic positions",
        &[
            FeatureInput::Feature(FeatureId::PeakSpectrum),
            FeatureInput::Feature(FeatureId::F0),
        ],
        compute_inharmonicity,
    );
    add(
        registry,
        F::Noisiness,
        Harmonic,
        "Fraction of peaks that are not harmonics",
        &[
            FeatureInput::Feature(FeatureId::HarmonicSpectrum),
            FeatureInput::Feature(FeatureId::PeakSpectrum),
        ],
        compute_noisiness,
    );

    // Pitch
    add(
        registry,
        F::F0,
        Pitch,
        "Fundamental from the clipped difference function, or the override",
        FRAME,
        compute_f0,
    );
    add(registry, F::YinPitch, Pitch, "YIN cumulative-mean difference pitch", FRAME, compute_yin);
    add(
        registry,
        F::WaveletPitch,
        Pitch,
        "Smoothed wavelet pitch tracked across frames",
        FRAME,
        compute_wavelet,
    );
    add(registry, F::HpsPitch, Pitch, "Harmonic product spectrum pitch", FRAME, compute_hps);
    add(
        registry,
        F::Midicent,
        Pitch,
        "Fundamental in MIDI cents",
        &[FeatureInput::Feature(FeatureId::F0)],
        compute_midicent,
    );
    add(
        registry,
        F::PitchEnergy,
        Pitch,
        "Zero-phase band energy per MIDI pitch from an injected IIR bank",
        &[FeatureInput::Frame, FeatureInput::PitchFilterbank],
        compute_pitch_energy,
    );

    // Temporal
    add(
        registry,
        F::Autocorrelation,
        Temporal,
        "Biased autocorrelation at every lag",
        FRAME,
        compute_autocorrelation,
    );
    add(
        registry,
        F::Amdf,
        Temporal,
        "Average magnitude difference at every lag",
        FRAME,
        compute_amdf,
    );
    add(
        registry,
        F::Asdf,
        Temporal,
        "Average squared difference at every lag",
        FRAME,
        compute_asdf,
    );

    // Cepstral
    add(registry, F::Lpc, Cepstral, "Levinson-Durbin prediction coefficients", FRAME, compute_lpc);
    add(
        registry,
        F::Lpcc,
        Cepstral,
        "Cepstrum of the all-pole model",
        &[FeatureInput::Feature(FeatureId::Lpc)],
        compute_lpcc,
    );

    debug_assert_eq!(registry.len(), FeatureId::ALL.len());
}
