//! Fundamental frequency estimation.
//!
//! Every estimator returns `Option<f32>` in Hz: `None` is the "no pitch"
//! outcome and is never an error.
//!
//! - [`f0`] - centre-clipped average magnitude difference
//! - [`yin`] - cumulative mean normalized difference curve (YIN)
//! - [`wavelet`] - multi-resolution wavelet estimator with a stateful tracker
//! - [`hps`] - harmonic product spectrum over an amplitude spectrum
//! - [`energy`] - per-pitch band energies from an injected IIR filterbank

pub mod energy;
pub mod f0;
pub mod hps;
pub mod tracker;
pub mod wavelet;
pub mod yin;

pub use energy::{
    FilterbankShift, IirFilter, PITCH_COUNT, PitchEnergyOptions, PitchFilterbank,
    pitch_filterbank_energy,
};
pub use f0::f0_autocorrelation;
pub use hps::{hps_pitch, midicent};
pub use tracker::{ACCEPTED_ERROR, MAX_CONFIDENCE, PitchTrackerState};
pub use wavelet::{WaveletPitch, WaveletPitchConfig};
pub use yin::{yin_difference, yin_pitch};
