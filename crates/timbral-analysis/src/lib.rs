//! Timbral Analysis - descriptor extraction for sampled audio
//!
//! This crate turns buffers of samples into numeric descriptors of spectral
//! shape, pitch, and linear-prediction structure:
//!
//! - [`fft`] - radix-2 / Bluestein transform engine, circular convolution, windows
//! - [`spectrum`] - amplitude spectra, peak picking, harmonic filtering
//! - [`descriptors`] - centroid, flatness, rolloff, tristimulus, MFCC and friends
//! - [`lag`] - autocorrelation, AMDF and ASDF lag vectors
//! - [`pitch`] - difference-function f0, YIN, wavelet tracker, harmonic product spectrum,
//!   pitch filterbank energies
//! - [`lpc`] - Levinson-Durbin linear prediction and LPC cepstrum
//! - [`resample`] - rational P/Q resampling with overlap-add filtering
//! - [`onset`] - complex-domain onset detection
//!
//! All operations are synchronous and allocate their own outputs. Nothing is
//! cached between calls except inside an explicit [`TransformEngine`], and
//! the only cross-frame state is the caller-owned [`PitchTrackerState`].
//!
//! ## Example Workflow
//!
//! ```rust
//! use timbral_analysis::{SpectrumOptions, spectrum, peak_spectrum, descriptors};
//!
//! let sr = 8000.0;
//! let frame: Vec<f32> = (0..512)
//!     .map(|i| (2.0 * std::f32::consts::PI * 1000.0 * i as f32 / sr).sin())
//!     .collect();
//!
//! let spec = spectrum(&frame, sr, SpectrumOptions::default()).unwrap();
//! let centroid = descriptors::spectral_centroid(&spec);
//! assert!((centroid - 1000.0).abs() < 50.0);
//!
//! let peaks = peak_spectrum(&spec, sr / 512.0, 10.0).unwrap();
//! let (freq, _amp) = peaks.strongest_peak().unwrap();
//! assert!((freq - 1000.0).abs() < 20.0);
//! ```
//!
//! ## Pitch Tracking
//!
//! ```rust,ignore
//! use timbral_analysis::pitch::{PitchTrackerState, WaveletPitch};
//!
//! let tracker = WaveletPitch::default();
//! let mut state = PitchTrackerState::new();
//! for frame in signal.chunks(2048) {
//!     let (next, pitch) = tracker.track(state, frame, 44100.0);
//!     state = next;
//!     println!("{pitch:?}");
//! }
//! ```

pub mod descriptors;
pub mod error;
pub mod fft;
pub mod lag;
pub mod lpc;
pub mod onset;
pub mod pitch;
pub mod resample;
pub mod spectrum;

pub use descriptors::{BarkLimits, Filterbank, PitchClassMap};
pub use error::{AnalysisError, Result};
pub use fft::{
    Complex, Radix2Plan, TransformEngine, Window, convolve_complex, convolve_real,
    inverse_transform, inverse_transform_complex, transform, transform_complex,
};
pub use lag::{amdf, asdf, autocorrelation, autocorrelation_lags};
pub use lpc::{LpcResult, lpc, lpc_from_signal, lpcc};
pub use onset::onset_detection;
pub use pitch::{
    FilterbankShift, IirFilter, PitchEnergyOptions, PitchFilterbank, PitchTrackerState,
    WaveletPitch, WaveletPitchConfig, f0_autocorrelation, hps_pitch, midicent,
    pitch_filterbank_energy, yin_difference, yin_pitch,
};
pub use resample::{
    ResampleConfig, ResampleFilter, interpolate_three_point, min_filter_order, resample,
    resample_with_filter,
};
pub use spectrum::{
    ComplexSpectrum, Spectrum, SpectrumOptions, complex_spectrum, harmonic_spectrum,
    peak_spectrum, spectrum,
};
