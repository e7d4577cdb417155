//! Per-frame extraction parameters.

use timbral_analysis::{
    BarkLimits, Filterbank, PitchClassMap, PitchEnergyOptions, PitchFilterbank, SpectrumOptions,
    WaveletPitchConfig, Window,
};

/// Default relative peak threshold, in percent of the largest amplitude.
pub const DEFAULT_PEAK_THRESHOLD: f32 = 10.0;
/// Default harmonic tolerance, as a fraction of a harmonic number.
pub const DEFAULT_HARMONIC_TOLERANCE: f32 = 0.1;
/// Default rolloff percentage.
pub const DEFAULT_ROLLOFF_PERCENT: f32 = 85.0;
/// Default YIN absolute threshold.
pub const DEFAULT_YIN_THRESHOLD: f32 = 0.1;
/// Default linear prediction order.
pub const DEFAULT_LPC_ORDER: usize = 12;

/// Everything a feature may read besides the frame itself.
///
/// Filterbank tables are borrowed, never owned: the caller loads them once
/// and shares them across every frame of a run.
#[derive(Debug, Clone, Copy)]
pub struct FrameContext<'a> {
    /// Sample rate of the frame, in Hz.
    pub sample_rate: f32,
    /// Spectrum layout for the shared `spectrum` feature.
    pub spectrum: SpectrumOptions,
    /// Window applied to a copy of the frame before any transform. Time-domain
    /// features see the raw frame.
    pub window: Window,
    /// Relative threshold for peak picking, in percent.
    pub peak_threshold: f32,
    /// Harmonic tolerance as a fraction in `[0, 0.5]`.
    pub harmonic_tolerance: f32,
    /// Percentage for spectral rolloff.
    pub rolloff_percent: f32,
    /// Fundamental override. When set, the `f0` feature reports it instead of
    /// estimating.
    pub f0: Option<f32>,
    /// YIN absolute threshold.
    pub yin_threshold: f32,
    /// Wavelet tracker tuning.
    pub wavelet: WaveletPitchConfig,
    /// Linear prediction order.
    pub lpc_order: usize,
    /// Cepstral order for LPCC; defaults to the LPC order.
    pub cepstral_order: Option<usize>,
    /// Shift, pitch range and resampling for `pitch_energy`.
    pub pitch_energy: PitchEnergyOptions,
    /// Injected mel filterbank for MFCC.
    pub filterbank: Option<&'a Filterbank>,
    /// Injected bark band edges.
    pub bark_limits: Option<&'a BarkLimits>,
    /// Injected per-pitch IIR bank for `pitch_energy`.
    pub pitch_filterbank: Option<&'a PitchFilterbank>,
    /// Injected bin-to-pitch-class map for `pitch_class_profile`.
    pub pitch_classes: Option<&'a PitchClassMap>,
}

impl FrameContext<'_> {
    /// Context with default parameters and no injected tables.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            spectrum: SpectrumOptions::default(),
            window: Window::Rectangular,
            peak_threshold: DEFAULT_PEAK_THRESHOLD,
            harmonic_tolerance: DEFAULT_HARMONIC_TOLERANCE,
            rolloff_percent: DEFAULT_ROLLOFF_PERCENT,
            f0: None,
            yin_threshold: DEFAULT_YIN_THRESHOLD,
            wavelet: WaveletPitchConfig::default(),
            lpc_order: DEFAULT_LPC_ORDER,
            cepstral_order: None,
            pitch_energy: PitchEnergyOptions::default(),
            filterbank: None,
            bark_limits: None,
            pitch_filterbank: None,
            pitch_classes: None,
        }
    }
}

impl<'a> FrameContext<'a> {
    /// Attach a mel filterbank.
    pub fn with_filterbank(mut self, filterbank: &'a Filterbank) -> Self {
        self.filterbank = Some(filterbank);
        self
    }

    /// Attach bark band edges.
    pub fn with_bark_limits(mut self, limits: &'a BarkLimits) -> Self {
        self.bark_limits = Some(limits);
        self
    }

    /// Attach a per-pitch IIR bank.
    pub fn with_pitch_filterbank(mut self, bank: &'a PitchFilterbank) -> Self {
        self.pitch_filterbank = Some(bank);
        self
    }

    /// Attach a bin-to-pitch-class map.
    pub fn with_pitch_classes(mut self, map: &'a PitchClassMap) -> Self {
        self.pitch_classes = Some(map);
        self
    }

    /// Bin spacing of a frame of `frame_len` samples.
    pub fn bin_width(&self, frame_len: usize) -> f32 {
        self.sample_rate / frame_len as f32
    }
}
